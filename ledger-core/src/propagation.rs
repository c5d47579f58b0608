//! Propagation engine and reconciliation
//!
//! Every pledge or payment by a member changes what the network above
//! them should still expect, so the same delta walks the ancestor chain
//! nearest-first up to the root. The walk locks one member at a time
//! and releases before moving up; concurrent events on disjoint
//! subtrees never contend, and events sharing an ancestor serialize
//! only at that ancestor.
//!
//! A walk can be interrupted (crash, storage error). Each entry keeps
//! its own durable repair marker until its walk completes, and
//! [`LedgerStore::run_repairs`] restores interrupted chains by
//! recomputing each affected ancestor's `due_network_amount` from the
//! persisted `due_amount`s of its descendants. Reconciliation is
//! idempotent and runs at startup or from an operator-driven job while
//! the affected subtree is quiescent.

use crate::{store::LedgerStore, Error, Result};
use member_network::MemberId;
use rust_decimal::Decimal;
use std::collections::VecDeque;
use tracing::{error, info, warn};

impl LedgerStore {
    /// Apply `delta` to `due_network_amount` of every ancestor,
    /// nearest first
    pub(crate) fn propagate(
        &self,
        origin: &MemberId,
        ancestors: &[MemberId],
        delta: Decimal,
    ) -> Result<()> {
        for ancestor in ancestors {
            if let Err(e) = self.apply_network_delta(ancestor, delta) {
                self.metrics.propagation_failures_total.inc();
                warn!(
                    %origin,
                    %ancestor,
                    %delta,
                    "Propagation stopped mid-chain, repair record kept: {}",
                    e
                );
                return Err(e);
            }
        }

        self.metrics.propagation_depth.observe(ancestors.len() as f64);
        Ok(())
    }

    fn apply_network_delta(&self, member_id: &MemberId, delta: Decimal) -> Result<()> {
        let lock = self.lock_for(member_id);
        let _guard = lock.lock();

        let mut ledger = self
            .storage
            .get_ledger(member_id)?
            .ok_or_else(|| Error::Integrity(format!("ancestor {} has no ledger", member_id)))?;

        ledger.apply_network_delta(delta)?;
        self.storage.put_ledger(&ledger)
    }

    /// Recompute a member's `due_network_amount` from the persisted
    /// `due_amount` of every descendant
    ///
    /// Idempotent; returns whether the stored aggregate was rewritten.
    pub fn reconcile(&self, member_id: &MemberId) -> Result<bool> {
        let expected = self.descendants_due_sum(member_id)?;

        let lock = self.lock_for(member_id);
        let _guard = lock.lock();

        let mut ledger = self
            .storage
            .get_ledger(member_id)?
            .ok_or_else(|| Error::NotFound(format!("ledger for {}", member_id)))?;

        if ledger.due_network_amount == expected {
            return Ok(false);
        }

        info!(
            %member_id,
            stored = %ledger.due_network_amount,
            %expected,
            "Reconciling network balance"
        );
        ledger.set_network_amount(expected);
        self.storage.put_ledger(&ledger)?;
        self.metrics.reconciliations_total.inc();
        Ok(true)
    }

    /// Drain the repair queue
    ///
    /// For every entry whose propagation may not have reached the root,
    /// reconcile each of the originating member's ancestors, then clear
    /// that entry's marker. A marker for an unknown member is logged and
    /// kept for operator follow-up; it never fails the drain. Returns
    /// the number of markers cleared.
    pub fn run_repairs(&self) -> Result<usize> {
        let mut cleared = 0;

        for (tx_id, origin) in self.storage.pending_repairs()? {
            // Unknown origin means the member record itself was lost,
            // which reconciliation cannot repair
            let ancestors = match self.network.ancestors_of(&origin) {
                Ok(ancestors) => ancestors,
                Err(_) => {
                    self.metrics.integrity_flags_total.inc();
                    error!(
                        %origin,
                        %tx_id,
                        "Repair marker references an unknown member, keeping it"
                    );
                    continue;
                }
            };

            for ancestor in &ancestors {
                self.reconcile(ancestor)?;
            }
            self.storage.clear_repair(&tx_id)?;
            cleared += 1;
        }

        Ok(cleared)
    }

    /// Σ `due_amount(d)` over all descendants of `member_id` (BFS)
    pub fn descendants_due_sum(&self, member_id: &MemberId) -> Result<Decimal> {
        let mut total = Decimal::ZERO;
        let mut queue: VecDeque<MemberId> = self.network.children_of(member_id)?.into();

        while let Some(id) = queue.pop_front() {
            if let Some(ledger) = self.storage.get_ledger(&id)? {
                total += ledger.due_amount;
            }
            queue.extend(self.network.children_of(&id)?);
        }

        Ok(total)
    }

    /// Check the aggregate consistency law for one member:
    /// `due_network_amount == Σ due_amount(descendants)`
    pub fn check_aggregate_consistency(&self, member_id: &MemberId) -> Result<bool> {
        let expected = self.descendants_due_sum(member_id)?;
        let stored = self
            .storage
            .get_ledger(member_id)?
            .map_or(Decimal::ZERO, |l| l.due_network_amount);
        Ok(stored == expected)
    }
}
