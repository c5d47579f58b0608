//! Error types for the event bus

use thiserror::Error;

/// Event bus error
#[derive(Debug, Error)]
pub enum Error {
    /// Handler failed while processing an event
    #[error("Handler error: {0}")]
    Handler(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
