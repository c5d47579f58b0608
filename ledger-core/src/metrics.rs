//! Metrics collection for observability
//!
//! # Metrics
//!
//! - `ledger_transactions_total` - Total ledger entries appended
//! - `ledger_propagation_depth` - Histogram of ancestors touched per event
//! - `ledger_propagation_failures_total` - Propagations that left a repair record
//! - `ledger_reconciliations_total` - Aggregates rewritten by reconciliation
//! - `ledger_integrity_flags_total` - Anomalies flagged for operator follow-up

use prometheus::{Histogram, HistogramOpts, IntCounter, Opts, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Total entries appended
    pub transactions_total: IntCounter,

    /// Ancestors touched per propagation
    pub propagation_depth: Histogram,

    /// Propagations that did not reach the root
    pub propagation_failures_total: IntCounter,

    /// Aggregates rewritten by reconciliation
    pub reconciliations_total: IntCounter,

    /// Anomalies flagged for operator follow-up
    pub integrity_flags_total: IntCounter,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let transactions_total = IntCounter::with_opts(Opts::new(
            "ledger_transactions_total",
            "Total ledger entries appended",
        ))?;
        registry.register(Box::new(transactions_total.clone()))?;

        let propagation_depth = Histogram::with_opts(
            HistogramOpts::new(
                "ledger_propagation_depth",
                "Number of ancestors touched per propagated event",
            )
            .buckets(vec![0.0, 1.0, 2.0, 3.0, 5.0, 8.0, 13.0, 21.0]),
        )?;
        registry.register(Box::new(propagation_depth.clone()))?;

        let propagation_failures_total = IntCounter::with_opts(Opts::new(
            "ledger_propagation_failures_total",
            "Propagations that left a repair record",
        ))?;
        registry.register(Box::new(propagation_failures_total.clone()))?;

        let reconciliations_total = IntCounter::with_opts(Opts::new(
            "ledger_reconciliations_total",
            "Aggregates rewritten by reconciliation",
        ))?;
        registry.register(Box::new(reconciliations_total.clone()))?;

        let integrity_flags_total = IntCounter::with_opts(Opts::new(
            "ledger_integrity_flags_total",
            "Anomalies flagged for operator follow-up",
        ))?;
        registry.register(Box::new(integrity_flags_total.clone()))?;

        Ok(Self {
            transactions_total,
            propagation_depth,
            propagation_failures_total,
            reconciliations_total,
            integrity_flags_total,
            registry,
        })
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish()
    }
}
