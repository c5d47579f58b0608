//! Error types for onboarding

use thiserror::Error;

/// Result type for onboarding operations
pub type Result<T> = std::result::Result<T, Error>;

/// Onboarding errors
#[derive(Error, Debug)]
pub enum Error {
    /// Ledger-side failure while creating the member pair
    #[error("Ledger error: {0}")]
    Ledger(#[from] ledger_core::Error),

    /// Invitation references an inviter with no member record
    #[error("Integrity violation: {0}")]
    Integrity(String),
}
