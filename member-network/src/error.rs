//! Error types for the member network

use thiserror::Error;

/// Result type for network operations
pub type Result<T> = std::result::Result<T, Error>;

/// Member network errors
#[derive(Error, Debug)]
pub enum Error {
    /// Member not found
    #[error("Member not found: {0}")]
    NotFound(String),

    /// Member already exists
    #[error("Member already exists: {0}")]
    Conflict(String),
}
