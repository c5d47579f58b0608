//! In-process event bus
//!
//! Provides synchronous pub/sub between the core modules:
//! - Account creation → membership onboarding
//! - Contribution lifecycle → notification collaborators
//!
//! Delivery is in-process, at-most-once per publish call. There is no
//! retry and no durable queue; a failing handler never blocks the
//! remaining handlers. Consumers that need stronger guarantees pair the
//! bus with a periodic reconciliation job.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod bus;
pub mod error;
pub mod event;
pub mod metrics;

pub use bus::{EventBus, Handler};
pub use error::{Error, Result};
pub use event::{Event, EventKind, EventPayload};
