//! Uplift Ledger Core
//!
//! Per-member donation ledgers over the invite forest, with an
//! append-only transaction log and incrementally maintained aggregates.
//!
//! # Architecture
//!
//! - **Two aggregates per member**: `due_amount` (owed upward to the
//!   inviter) and `due_network_amount` (expected to surface from the
//!   entire downward subtree)
//! - **Incremental propagation**: every pledge/pay applies its delta to
//!   each ancestor ledger, O(depth) per event instead of O(subtree)
//! - **Per-member locking**: no global lock; the ancestor walk locks
//!   member-by-member and releases as it moves up
//! - **Durable repair queue**: interrupted propagations are recorded and
//!   replayed as a reconciliation pass from the transaction-backed
//!   `due_amount`s
//!
//! # Invariants
//!
//! - Balances never negative: `due_amount >= 0`, `due_network_amount >= 0`
//! - Aggregate consistency: `due_network_amount(m)` equals the sum of
//!   `due_amount(d)` over all descendants `d` of `m`, once all
//!   propagations complete
//! - Append-only: transactions are never modified or deleted

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod metrics;
pub mod propagation;
pub mod storage;
pub mod store;
pub mod types;

// Re-exports
pub use config::Config;
pub use error::{Error, Result};
pub use member_network::{Member, MemberId, MemberNetwork};
pub use storage::Storage;
pub use store::LedgerStore;
pub use types::{
    ChildDue, ContributionStatus, Ledger, LedgerSummary, Transaction, TransactionType,
};
