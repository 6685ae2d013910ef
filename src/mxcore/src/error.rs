//! Error taxonomy for the proxy core.
//!
//! Every variant carries enough information to be turned directly into a
//! MariaDB ERR packet: a MySQL-compatible error number and a SQLSTATE. The
//! `Internal` variant uses the reserved 2800+ code range for conditions that
//! have no natural MySQL error number of their own.

use thiserror::Error as ThisError;

/// Base of the internal error-code range reserved for conditions that do not
/// map onto an existing MySQL/MariaDB server error.
pub const INTERNAL_ERROR_BASE: u16 = 2800;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("authentication failed for user '{user}': {reason}")]
    Authentication { user: String, reason: String },

    #[error("backend '{backend}' unavailable: {reason}")]
    BackendUnavailable { backend: String, reason: String },

    #[error("connection pool for '{backend}' exhausted")]
    PoolExhausted { backend: String },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("transaction replay failed: {0}")]
    ReplayFailed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("internal error {code}: {message}")]
    Internal { code: u16, message: String },
}

impl Error {
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            code: INTERNAL_ERROR_BASE,
            message: message.into(),
        }
    }

    /// The numeric error code to embed in the client-facing ERR packet.
    pub fn mysql_errno(&self) -> u16 {
        match self {
            Error::Protocol(_) => 1047,             // ER_UNKNOWN_COM_ERROR
            Error::Authentication { .. } => 1045,   // ER_ACCESS_DENIED_ERROR
            Error::BackendUnavailable { .. } => 2003, // CR_CONN_HOST_ERROR
            Error::PoolExhausted { .. } => 1040,     // ER_CON_COUNT_ERROR
            Error::Configuration(_) => INTERNAL_ERROR_BASE + 1,
            Error::ResourceExhausted(_) => 1041,     // ER_OUT_OF_RESOURCES
            Error::ReplayFailed(_) => INTERNAL_ERROR_BASE + 2,
            Error::Io(_) => 2013,                    // CR_SERVER_LOST
            Error::Internal { code, .. } => *code,
        }
    }

    /// The 5-character SQLSTATE to embed in the client-facing ERR packet.
    pub fn sqlstate(&self) -> &'static str {
        match self {
            Error::Protocol(_) => "08S01",
            Error::Authentication { .. } => "28000",
            Error::BackendUnavailable { .. } => "08S01",
            Error::PoolExhausted { .. } => "08004",
            Error::Configuration(_) => "HY000",
            Error::ResourceExhausted(_) => "HY001",
            Error::ReplayFailed(_) => "40001",
            Error::Io(_) => "08S01",
            Error::Internal { .. } => "HY000",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
