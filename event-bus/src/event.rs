//! Event envelope and payload types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of event, used for subscription routing and metrics labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// A new account was created by the accounts collaborator
    AccountCreated,
    /// A member was linked under their inviter
    ConnectionAdded,
    /// A contribution entered the pledged state
    ContributionPledged,
    /// A pledged contribution was paid
    ContributionPaid,
    /// A paid contribution was confirmed by a trusted party
    ContributionConfirmed,
}

impl EventKind {
    /// Dotted subject string for logging and metrics
    pub fn subject(&self) -> &'static str {
        match self {
            EventKind::AccountCreated => "uplift.account.created",
            EventKind::ConnectionAdded => "uplift.connection.added",
            EventKind::ContributionPledged => "uplift.contribution.pledged",
            EventKind::ContributionPaid => "uplift.contribution.paid",
            EventKind::ContributionConfirmed => "uplift.contribution.confirmed",
        }
    }
}

/// Typed event payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    /// Inbound: the accounts collaborator created an account
    AccountCreated {
        /// Account id (same identity space as member ids)
        account_id: String,
        /// Mobile number used to look up a pending invitation
        mobile_number: String,
    },

    /// Outbound: a member was created under their inviter
    ConnectionAdded {
        /// The new member
        member_id: String,
        /// The inviting member
        parent_id: String,
    },

    /// A contribution was pledged
    ContributionPledged {
        /// Pledging member
        member_id: String,
        /// Contribution identity
        contribution_id: Uuid,
        /// Pledged amount
        amount: Decimal,
    },

    /// A pledged contribution was paid
    ContributionPaid {
        /// Paying member
        member_id: String,
        /// Contribution identity
        contribution_id: Uuid,
        /// Paid amount
        amount: Decimal,
    },

    /// A paid contribution was confirmed (bookkeeping only)
    ContributionConfirmed {
        /// Member whose contribution was confirmed
        member_id: String,
        /// Contribution identity
        contribution_id: Uuid,
    },
}

impl EventPayload {
    /// Kind of this payload
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::AccountCreated { .. } => EventKind::AccountCreated,
            EventPayload::ConnectionAdded { .. } => EventKind::ConnectionAdded,
            EventPayload::ContributionPledged { .. } => EventKind::ContributionPledged,
            EventPayload::ContributionPaid { .. } => EventKind::ContributionPaid,
            EventPayload::ContributionConfirmed { .. } => EventKind::ContributionConfirmed,
        }
    }
}

/// Event envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Event ID (UUIDv7 for ordering)
    pub id: Uuid,

    /// Typed payload
    pub payload: EventPayload,

    /// Publish timestamp
    pub timestamp: DateTime<Utc>,

    /// Correlation ID (for tracing)
    pub correlation_id: Option<String>,
}

impl Event {
    /// Create new event
    pub fn new(payload: EventPayload) -> Self {
        Self {
            id: Uuid::now_v7(),
            payload,
            timestamp: Utc::now(),
            correlation_id: None,
        }
    }

    /// Set correlation ID
    pub fn with_correlation_id(mut self, correlation_id: String) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Kind of the carried payload
    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> crate::Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserialize from bytes
    pub fn from_bytes(bytes: &[u8]) -> crate::Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
