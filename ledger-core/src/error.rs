//! Error types for the ledger

use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Referenced member or ledger does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Attempt to create a member that already exists
    #[error("Already exists: {0}")]
    Conflict(String),

    /// Input rejected before any mutation (e.g. paying more than is due)
    #[error("Business rule violated: {0}")]
    BusinessRule(String),

    /// Internal data-integrity signal, flagged for operator follow-up
    #[error("Integrity violation: {0}")]
    Integrity(String),

    /// Storage error (RocksDB)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<member_network::Error> for Error {
    fn from(err: member_network::Error) -> Self {
        match err {
            member_network::Error::NotFound(id) => Error::NotFound(id),
            member_network::Error::Conflict(id) => Error::Conflict(id),
        }
    }
}

impl From<prometheus::Error> for Error {
    fn from(err: prometheus::Error) -> Self {
        Error::Other(err.to_string())
    }
}
