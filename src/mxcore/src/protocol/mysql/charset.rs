//! MySQL/MariaDB collation id table.
//!
//! Only the subset of collations actually exercised by the handshake and
//! the server's initial-handshake packet is listed; unknown collation ids
//! fall back to [`DEFAULT_COLLATION_ID`].

use hashbrown::HashMap;
use std::sync::OnceLock;

/// `utf8_general_ci`, the collation MariaDB servers advertise by default in
/// the initial handshake packet.
pub const DEFAULT_COLLATION_ID: u8 = 33;

/// `utf8mb4_general_ci`, used when re-handshaking a connection via
/// `COM_CHANGE_USER` with the modern default character set.
pub const UTF8_MB4_GENERAL_CI: u8 = 45;

pub fn collation_names() -> &'static HashMap<&'static str, u8> {
    static NAMES: OnceLock<HashMap<&'static str, u8>> = OnceLock::new();
    NAMES.get_or_init(|| {
        let mut m = HashMap::new();
        m.insert("big5_chinese_ci", 1);
        m.insert("latin1_swedish_ci", 8);
        m.insert("ascii_general_ci", 11);
        m.insert("utf8_general_ci", 33);
        m.insert("binary", 63);
        m.insert("utf8mb4_general_ci", 45);
        m.insert("utf8mb4_unicode_ci", 224);
        m.insert("utf8mb4_0900_ai_ci", 255);
        m
    })
}

pub fn collation_name_for_id(id: u8) -> Option<&'static str> {
    collation_names()
        .iter()
        .find(|(_, &v)| v == id)
        .map(|(&k, _)| k)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_collation_round_trips() {
        assert_eq!(
            *collation_names().get("utf8_general_ci").unwrap(),
            DEFAULT_COLLATION_ID
        );
        assert_eq!(
            collation_name_for_id(DEFAULT_COLLATION_ID),
            Some("utf8_general_ci")
        );
    }
}
