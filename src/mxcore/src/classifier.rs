//! A lightweight, token-scanning SQL statement classifier.
//!
//! This does not parse SQL into an AST; it tokenizes just far enough to set
//! the type-mask bits the router needs to decide where a statement goes and
//! whether it must be replicated to every backend holding session state.

use winnow::ascii::{multispace0, Caseless};
use winnow::combinator::opt;
use winnow::prelude::*;
use winnow::token::take_while;

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Default)]
    pub struct TypeMask: u32 {
        const READ                 = 1 << 0;
        const WRITE                = 1 << 1;
        const SESSION_WRITE        = 1 << 2;
        const USER_VAR_WRITE       = 1 << 3;
        const USER_VAR_READ        = 1 << 4;
        const SYSVAR_WRITE         = 1 << 5;
        const SYSVAR_READ          = 1 << 6;
        const GSYSVAR_WRITE        = 1 << 7;
        const GSYSVAR_READ         = 1 << 8;
        const BEGIN_TRX            = 1 << 9;
        const COMMIT               = 1 << 10;
        const ROLLBACK             = 1 << 11;
        const READ_TMP_TABLE       = 1 << 12;
        const CREATE_TMP_TABLE     = 1 << 13;
        const PREPARE_NAMED_STMT   = 1 << 14;
        const EXEC_STMT            = 1 << 15;
        const DEALLOC_PREPARE      = 1 << 16;
        const SHOW                 = 1 << 17;
    }
}

impl TypeMask {
    pub fn is_write(&self) -> bool {
        self.intersects(
            TypeMask::WRITE
                | TypeMask::SESSION_WRITE
                | TypeMask::SYSVAR_WRITE
                | TypeMask::GSYSVAR_WRITE
                | TypeMask::BEGIN_TRX
                | TypeMask::COMMIT
                | TypeMask::ROLLBACK,
        )
    }

    /// Statements that must be replayed against every backend holding
    /// session state, not just the one that originally executed them.
    pub fn must_replicate_session_wide(&self) -> bool {
        self.intersects(
            TypeMask::SESSION_WRITE
                | TypeMask::USER_VAR_WRITE
                | TypeMask::SYSVAR_WRITE
                | TypeMask::PREPARE_NAMED_STMT
                | TypeMask::DEALLOC_PREPARE,
        )
    }
}

fn word<'a>(i: &mut &'a [u8]) -> PResult<&'a [u8]> {
    take_while(1.., |c: u8| c.is_ascii_alphanumeric() || c == b'_').parse_next(i)
}

fn skip_ws<'a>(i: &mut &'a [u8]) -> PResult<()> {
    multispace0.void().parse_next(i)
}

/// Classify a single top-level SQL statement. `query` is the raw bytes of
/// `COM_QUERY`'s text payload (not the MySQL command byte).
pub fn classify(query: &[u8]) -> TypeMask {
    let mut i = query;
    let _ = skip_ws(&mut i);
    let first = match word(&mut i) {
        Ok(w) => w.to_ascii_uppercase(),
        Err(_) => return TypeMask::READ,
    };

    let mut mask = match first.as_slice() {
        b"SELECT" => TypeMask::READ,
        b"INSERT" | b"UPDATE" | b"DELETE" | b"REPLACE" => TypeMask::WRITE,
        b"CREATE" | b"ALTER" | b"DROP" | b"TRUNCATE" | b"RENAME" => {
            let mut mask = TypeMask::WRITE;
            let _ = skip_ws(&mut i);
            if opt(Caseless("TEMPORARY")).parse_next(&mut i).unwrap_or(None).is_some() {
                mask |= TypeMask::CREATE_TMP_TABLE;
            }
            mask
        }
        b"SET" => classify_set(&mut i),
        b"BEGIN" | b"START" => TypeMask::BEGIN_TRX,
        b"COMMIT" => TypeMask::COMMIT,
        b"ROLLBACK" => TypeMask::ROLLBACK,
        b"PREPARE" => TypeMask::PREPARE_NAMED_STMT,
        b"EXECUTE" => TypeMask::EXEC_STMT,
        b"DEALLOCATE" => TypeMask::DEALLOC_PREPARE,
        b"SHOW" => TypeMask::SHOW | TypeMask::READ,
        b"USE" => TypeMask::SESSION_WRITE,
        _ => TypeMask::READ,
    };

    if is_selecting_from_tmp_table(query) {
        mask |= TypeMask::READ_TMP_TABLE;
    }
    mask
}

fn classify_set(i: &mut &[u8]) -> TypeMask {
    let _ = skip_ws(i);
    let lowered: Vec<u8> = i.to_ascii_uppercase();
    if lowered.starts_with(b"GLOBAL") {
        return TypeMask::GSYSVAR_WRITE;
    }
    if lowered.starts_with(b"SESSION") || lowered.starts_with(b"@@SESSION") {
        return TypeMask::SYSVAR_WRITE;
    }
    if lowered.starts_with(b"@@") {
        return TypeMask::SYSVAR_WRITE;
    }
    if lowered.starts_with(b"@") {
        return TypeMask::USER_VAR_WRITE;
    }
    TypeMask::SESSION_WRITE
}

fn is_selecting_from_tmp_table(query: &[u8]) -> bool {
    let upper = query.to_ascii_uppercase();
    upper.windows(11).any(|w| w == b"TEMPORARY T")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_is_read() {
        assert_eq!(classify(b"SELECT * FROM t"), TypeMask::READ);
    }

    #[test]
    fn insert_is_write() {
        assert!(classify(b"INSERT INTO t VALUES (1)").is_write());
    }

    #[test]
    fn begin_is_a_transaction_boundary() {
        assert_eq!(classify(b"BEGIN"), TypeMask::BEGIN_TRX);
        assert_eq!(classify(b"START TRANSACTION"), TypeMask::BEGIN_TRX);
        assert_eq!(classify(b"COMMIT"), TypeMask::COMMIT);
        assert_eq!(classify(b"ROLLBACK"), TypeMask::ROLLBACK);
    }

    #[test]
    fn set_session_must_replicate() {
        let mask = classify(b"SET SESSION sql_mode = 'STRICT_ALL_TABLES'");
        assert!(mask.must_replicate_session_wide());
    }

    #[test]
    fn set_user_var_must_replicate() {
        let mask = classify(b"SET @x = 1");
        assert!(mask.contains(TypeMask::USER_VAR_WRITE));
        assert!(mask.must_replicate_session_wide());
    }

    #[test]
    fn use_statement_is_session_write() {
        assert_eq!(classify(b"USE some_db"), TypeMask::SESSION_WRITE);
    }
}
