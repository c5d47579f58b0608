//! Synchronous in-process dispatcher
//!
//! The bus is a constructed instance handed to the components that
//! publish or subscribe, not a process-global registry. Handlers are
//! registered once at startup; there is no unsubscribe at steady state.

use crate::{
    event::{Event, EventKind},
    metrics::{EVENT_HANDLER_FAILURES_TOTAL, EVENT_PUBLISH_TOTAL},
    Result,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, error};

/// Event handler callback
pub type Handler = Box<dyn Fn(&Event) -> Result<()> + Send + Sync>;

/// In-process publish/subscribe dispatcher
#[derive(Default)]
pub struct EventBus {
    handlers: RwLock<HashMap<EventKind, Vec<Handler>>>,
}

impl EventBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for an event kind
    ///
    /// Handlers run in registration order and must not depend on their
    /// ordering relative to each other.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F)
    where
        F: Fn(&Event) -> Result<()> + Send + Sync + 'static,
    {
        self.handlers
            .write()
            .entry(kind)
            .or_default()
            .push(Box::new(handler));
    }

    /// Publish an event to all subscribers of its kind
    ///
    /// Delivery is synchronous and at-most-once. A handler returning an
    /// error is logged and counted, and the remaining handlers still run.
    pub fn publish(&self, event: &Event) {
        let kind = event.kind();
        EVENT_PUBLISH_TOTAL.with_label_values(&[kind.subject()]).inc();

        // Handlers may publish follow-up events from inside a dispatch;
        // a recursive read keeps that from deadlocking behind a blocked
        // writer.
        let handlers = self.handlers.read_recursive();
        let Some(subscribers) = handlers.get(&kind) else {
            debug!(subject = kind.subject(), "No subscribers for event");
            return;
        };

        for handler in subscribers {
            if let Err(e) = handler(event) {
                EVENT_HANDLER_FAILURES_TOTAL
                    .with_label_values(&[kind.subject()])
                    .inc();
                error!(
                    subject = kind.subject(),
                    event_id = %event.id,
                    "Event handler failed: {}",
                    e
                );
            }
        }
    }

    /// Number of registered handlers for a kind
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.handlers.read().get(&kind).map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("kinds", &self.handlers.read().len())
            .finish()
    }
}
