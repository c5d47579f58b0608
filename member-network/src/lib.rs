//! Uplift Member Network
//!
//! The invite forest: every member joined under an inviter, forming a
//! tree per root member. The network answers the ancestry queries used
//! for authorization and for propagating ledger deltas up a member's
//! invite chain.
//!
//! # Invariants
//!
//! - The parent graph is acyclic and forms a forest
//! - `ancestors(m)` always equals `[parent(m)] ++ ancestors(parent(m))`
//! - Members are created once and never deleted in normal operation

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod error;
pub mod network;
pub mod types;

pub use error::{Error, Result};
pub use network::MemberNetwork;
pub use types::{Member, MemberId};
