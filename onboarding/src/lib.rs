//! Uplift Onboarding
//!
//! Reacts to `AccountCreated` events from the accounts collaborator:
//! when a pending invitation matches the new account's mobile number,
//! the member joins the invite forest under their inviter and gets a
//! zero-balance ledger, and a `ConnectionAdded` notification goes out.
//!
//! Delivery over the in-process bus is best effort; deployments pair
//! this with a periodic job that detects accounts with no member.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod error;
pub mod invitation;
pub mod metrics;
pub mod service;

pub use error::{Error, Result};
pub use invitation::{InMemoryInvitations, Invitation, InvitationDirectory};
pub use service::MembershipService;
