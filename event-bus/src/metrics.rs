//! Prometheus metrics for the event bus

use lazy_static::lazy_static;
use prometheus::{register_counter_vec, CounterVec};

lazy_static! {
    /// Total events published
    pub static ref EVENT_PUBLISH_TOTAL: CounterVec = register_counter_vec!(
        "event_bus_publish_total",
        "Total events published",
        &["kind"]
    )
    .unwrap();

    /// Total handler failures
    pub static ref EVENT_HANDLER_FAILURES_TOTAL: CounterVec = register_counter_vec!(
        "event_bus_handler_failures_total",
        "Total handler failures while dispatching events",
        &["kind"]
    )
    .unwrap();
}
