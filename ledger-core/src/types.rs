//! Core types for the ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Exact arithmetic (Decimal for money)
//! - Append-only transaction history

use crate::{Error, Result};
use member_network::MemberId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum TransactionType {
    /// Raises the member's `due_amount` (a pledge)
    Credit = 1,
    /// Lowers the member's `due_amount` (a payment)
    Debit = 2,
}

/// Immutable ledger entry
///
/// The transaction log is the audit trail and the basis for rebuilding
/// `due_amount` independent of the cached aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction ID (UUIDv7 for time-ordering)
    pub id: Uuid,

    /// Owning member
    pub member_id: MemberId,

    /// Credit or debit
    pub tx_type: TransactionType,

    /// Amount (always positive)
    pub amount: Decimal,

    /// The contribution that originated this entry
    pub contribution_id: Uuid,

    /// Entry timestamp (nanoseconds since Unix epoch)
    pub timestamp_nanos: i64,
}

impl Transaction {
    /// Create a new entry with the current timestamp
    pub fn new(
        member_id: MemberId,
        tx_type: TransactionType,
        amount: Decimal,
        contribution_id: Uuid,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            member_id,
            tx_type,
            amount,
            contribution_id,
            timestamp_nanos: chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0),
        }
    }

    /// Signed effect of this entry on `due_amount`
    pub fn signed_amount(&self) -> Decimal {
        match self.tx_type {
            TransactionType::Credit => self.amount,
            TransactionType::Debit => -self.amount,
        }
    }
}

/// Contribution lifecycle state
///
/// Owned by the contribution collaborator; transitions are monotonic
/// with no back-transitions. `Pledged` and `Paid` drive ledger
/// mutations, `Confirmed` is a terminal bookkeeping marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ContributionStatus {
    /// Contribution pledged, amount now due
    Pledged = 1,
    /// Pledge paid, amount surfaced
    Paid = 2,
    /// Payment validated by a trusted party (terminal)
    Confirmed = 3,
}

impl ContributionStatus {
    /// Whether a transition to `next` is allowed
    pub fn can_transition_to(&self, next: ContributionStatus) -> bool {
        matches!(
            (self, next),
            (ContributionStatus::Pledged, ContributionStatus::Paid)
                | (ContributionStatus::Paid, ContributionStatus::Confirmed)
        )
    }

    /// Whether this state is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, ContributionStatus::Confirmed)
    }
}

/// Per-member financial aggregate (1:1 with a member)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    /// Owning member
    pub member_id: MemberId,

    /// Amount this member currently owes to their direct inviter
    pub due_amount: Decimal,

    /// Amount expected to surface from the entire downward subtree
    pub due_network_amount: Decimal,

    /// Bumped on every mutation
    pub version: u64,
}

impl Ledger {
    /// Create a zero-balance ledger
    pub fn new(member_id: MemberId) -> Self {
        Self {
            member_id,
            due_amount: Decimal::ZERO,
            due_network_amount: Decimal::ZERO,
            version: 0,
        }
    }

    /// Apply a credit: `due_amount += amount`
    pub fn credit(&mut self, amount: Decimal) {
        self.due_amount += amount;
        self.version += 1;
    }

    /// Apply a debit: `due_amount -= amount`
    ///
    /// Checked before mutation; paying more than is due is a
    /// [`Error::BusinessRule`] and leaves the ledger untouched.
    pub fn debit(&mut self, amount: Decimal) -> Result<()> {
        if amount > self.due_amount {
            return Err(Error::BusinessRule(format!(
                "cannot pay {} when {} is due for member {}",
                amount, self.due_amount, self.member_id
            )));
        }
        self.due_amount -= amount;
        self.version += 1;
        Ok(())
    }

    /// Apply a propagated delta to `due_network_amount`
    ///
    /// A negative result means the aggregate invariant was already
    /// broken upstream and surfaces as [`Error::Integrity`].
    pub fn apply_network_delta(&mut self, delta: Decimal) -> Result<()> {
        let next = self.due_network_amount + delta;
        if next < Decimal::ZERO {
            return Err(Error::Integrity(format!(
                "network balance for member {} would go negative ({} + {})",
                self.member_id, self.due_network_amount, delta
            )));
        }
        self.due_network_amount = next;
        self.version += 1;
        Ok(())
    }

    /// Overwrite `due_network_amount` (reconciliation only)
    pub fn set_network_amount(&mut self, amount: Decimal) {
        self.due_network_amount = amount;
        self.version += 1;
    }
}

/// A direct child and what it currently owes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildDue {
    /// Child member
    pub member_id: MemberId,

    /// The child's own `due_amount`
    pub due_amount: Decimal,
}

/// Rendered view of a member's ledger
///
/// Backs the "what I owe" and "what my network owes me" views; children
/// are sorted by descending due amount, ties broken by insertion order
/// of the child relation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSummary {
    /// The member being summarized
    pub member_id: MemberId,

    /// Owed upward to the direct inviter
    pub due_amount: Decimal,

    /// Expected from the downward subtree
    pub due_network_amount: Decimal,

    /// Direct children with their own due amounts
    pub children: Vec<ChildDue>,
}
