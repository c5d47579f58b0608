//! Prometheus metrics for onboarding

use lazy_static::lazy_static;
use prometheus::{register_counter_vec, register_int_counter, CounterVec, IntCounter};

lazy_static! {
    /// Account-created events by handling outcome
    pub static ref ONBOARDING_EVENTS_TOTAL: CounterVec = register_counter_vec!(
        "onboarding_events_total",
        "Account-created events by handling outcome",
        &["outcome"]
    )
    .unwrap();

    /// Invitations whose inviter has no member record
    pub static ref ONBOARDING_INTEGRITY_FLAGS_TOTAL: IntCounter = register_int_counter!(
        "onboarding_integrity_flags_total",
        "Invitations whose inviter has no member record"
    )
    .unwrap();
}

/// Outcome labels for `onboarding_events_total`
pub mod outcome {
    /// Member and ledger created
    pub const CREATED: &str = "created";
    /// No pending invitation for the mobile number
    pub const NO_INVITATION: &str = "no_invitation";
    /// Re-delivery of an already-processed event
    pub const DUPLICATE: &str = "duplicate";
    /// Inviter had no member record
    pub const INTEGRITY: &str = "integrity";
    /// Ledger-side failure
    pub const ERROR: &str = "error";
}
