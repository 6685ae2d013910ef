//! MySQL/MariaDB-compatible error numbers and SQLSTATEs for the subset of
//! conditions this proxy itself raises (as opposed to relaying a backend's
//! own ERR packet verbatim).

#![allow(non_camel_case_types)]

#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ER_ACCESS_DENIED_ERROR = 1045,
    ER_ACCESS_DENIED_NO_PASSWORD_ERROR = 1698,
    ER_DBACCESS_DENIED_ERROR = 1044,
    ER_BAD_DB_ERROR = 1049,
    ER_UNKNOWN_COM_ERROR = 1047,
    ER_CON_COUNT_ERROR = 1040,
    ER_OUT_OF_RESOURCES = 1041,
    ER_OPTION_PREVENTS_STATEMENT = 1290,
    CR_SERVER_LOST = 2013,
    CR_CONN_HOST_ERROR = 2003,
}

impl ErrorKind {
    /// The 5-byte SQLSTATE code that follows the `#` marker in an ERR
    /// packet.
    pub fn sqlstate(&self) -> &'static [u8] {
        match self {
            ErrorKind::ER_ACCESS_DENIED_ERROR => b"28000",
            ErrorKind::ER_ACCESS_DENIED_NO_PASSWORD_ERROR => b"28000",
            ErrorKind::ER_DBACCESS_DENIED_ERROR => b"42000",
            ErrorKind::ER_BAD_DB_ERROR => b"42000",
            ErrorKind::ER_UNKNOWN_COM_ERROR => b"08S01",
            ErrorKind::ER_CON_COUNT_ERROR => b"08004",
            ErrorKind::ER_OUT_OF_RESOURCES => b"HY001",
            ErrorKind::ER_OPTION_PREVENTS_STATEMENT => b"HY000",
            ErrorKind::CR_SERVER_LOST => b"08S01",
            ErrorKind::CR_CONN_HOST_ERROR => b"08S01",
        }
    }
}
