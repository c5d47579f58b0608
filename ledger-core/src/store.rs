//! Ledger store
//!
//! High-level API tying together the member network, storage, the
//! propagation engine, and the event bus. One logical ledger per
//! member; all read-then-write sequences against a single ledger are
//! serialized by a per-member lock.

use crate::{
    metrics::Metrics,
    types::{ChildDue, Ledger, LedgerSummary, Transaction, TransactionType},
    Config, Error, Result, Storage,
};
use dashmap::DashMap;
use event_bus::{Event, EventBus, EventPayload};
use member_network::{Member, MemberId, MemberNetwork};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Main ledger interface
pub struct LedgerStore {
    /// Durable storage
    pub(crate) storage: Arc<Storage>,

    /// The invite forest
    pub(crate) network: Arc<MemberNetwork>,

    /// Outbound notifications
    bus: Arc<EventBus>,

    /// Per-member mutation locks
    locks: DashMap<MemberId, Arc<Mutex<()>>>,

    /// Metrics
    pub(crate) metrics: Metrics,
}

impl LedgerStore {
    /// Open the store, rebuild the member arena from storage, and replay
    /// any propagation interrupted by a previous crash.
    pub fn open(config: Config, bus: Arc<EventBus>) -> Result<Self> {
        let storage = Arc::new(Storage::open(&config)?);

        let network = Arc::new(MemberNetwork::new());
        for member in storage.load_members()? {
            network.insert_loaded(member);
        }

        let store = Self {
            storage,
            network,
            bus,
            locks: DashMap::new(),
            metrics: Metrics::new()?,
        };

        let repaired = store.run_repairs()?;
        if repaired > 0 {
            info!(repaired, "Replayed interrupted propagations on startup");
        }

        info!(members = store.network.len(), "Ledger store opened");
        Ok(store)
    }

    /// The invite forest backing this store
    pub fn network(&self) -> Arc<MemberNetwork> {
        self.network.clone()
    }

    /// Metrics registry for scraping
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub(crate) fn lock_for(&self, id: &MemberId) -> Arc<Mutex<()>> {
        self.locks.entry(id.clone()).or_default().clone()
    }

    // Membership

    /// Create a member and its zero-balance ledger, both or neither
    ///
    /// Fails with [`Error::Conflict`] for an existing id and
    /// [`Error::NotFound`] for an unknown inviter.
    pub fn create_member(&self, inviter: Option<&MemberId>, id: MemberId) -> Result<Member> {
        // Sibling creates race on the parent's child list; serialize
        // them so a stale parent snapshot never overwrites a newer one
        // on disk.
        let parent_lock = inviter.map(|parent_id| self.lock_for(parent_id));
        let _guard = parent_lock.as_ref().map(|lock| lock.lock());

        let member = self.network.create_member(inviter, id)?;
        let ledger = Ledger::new(member.id.clone());

        // Re-read the parent so the persisted record carries the new child
        let parent = match &member.parent {
            Some(parent_id) => self.network.get(parent_id),
            None => None,
        };

        self.storage
            .create_member_atomic(&member, &ledger, parent.as_ref())?;

        Ok(member)
    }

    // Contribution lifecycle triggers

    /// A contribution entered `Pledged` with the given amount
    ///
    /// Appends a CREDIT to the member's ledger, then raises every
    /// ancestor's `due_network_amount` by the same amount.
    pub fn on_pledge(
        &self,
        member_id: &MemberId,
        contribution_id: Uuid,
        amount: Decimal,
    ) -> Result<()> {
        self.apply(member_id, contribution_id, TransactionType::Credit, amount)?;

        self.bus.publish(&Event::new(EventPayload::ContributionPledged {
            member_id: member_id.to_string(),
            contribution_id,
            amount,
        }));
        Ok(())
    }

    /// A contribution transitioned `Pledged → Paid`
    ///
    /// Appends a DEBIT to the member's ledger, then lowers every
    /// ancestor's `due_network_amount`: once paid, the amount is no
    /// longer expected from the network below them.
    pub fn on_pay(
        &self,
        member_id: &MemberId,
        contribution_id: Uuid,
        amount: Decimal,
    ) -> Result<()> {
        self.apply(member_id, contribution_id, TransactionType::Debit, amount)?;

        self.bus.publish(&Event::new(EventPayload::ContributionPaid {
            member_id: member_id.to_string(),
            contribution_id,
            amount,
        }));
        Ok(())
    }

    /// A contribution transitioned `Paid → Confirmed`
    ///
    /// Bookkeeping only: the payment was already recorded, confirmation
    /// does not change any balance.
    pub fn on_confirm(&self, member_id: &MemberId, contribution_id: Uuid) -> Result<()> {
        if !self.network.contains(member_id) {
            return Err(Error::NotFound(member_id.to_string()));
        }

        debug!(%member_id, %contribution_id, "Contribution confirmed");
        self.bus.publish(&Event::new(EventPayload::ContributionConfirmed {
            member_id: member_id.to_string(),
            contribution_id,
        }));
        Ok(())
    }

    /// Validate, append, and propagate one ledger entry
    fn apply(
        &self,
        member_id: &MemberId,
        contribution_id: Uuid,
        tx_type: TransactionType,
        amount: Decimal,
    ) -> Result<()> {
        // Fail closed, before any mutation
        if amount <= Decimal::ZERO {
            return Err(Error::BusinessRule(format!(
                "amount must be positive, got {}",
                amount
            )));
        }
        let ancestors = self.network.ancestors_of(member_id)?;

        let tx_id;
        {
            let lock = self.lock_for(member_id);
            let _guard = lock.lock();

            let mut ledger = self
                .storage
                .get_ledger(member_id)?
                .ok_or_else(|| Error::NotFound(format!("ledger for {}", member_id)))?;

            match tx_type {
                TransactionType::Credit => ledger.credit(amount),
                TransactionType::Debit => ledger.debit(amount)?,
            }

            let tx = Transaction::new(member_id.clone(), tx_type, amount, contribution_id);
            tx_id = tx.id;
            // The repair marker lands in the same batch as the entry, so
            // a crash before the walk completes is always detectable.
            self.storage.apply_entry(&tx, &ledger, !ancestors.is_empty())?;
        }

        self.metrics.transactions_total.inc();

        let delta = match tx_type {
            TransactionType::Credit => amount,
            TransactionType::Debit => -amount,
        };
        self.propagate(member_id, &ancestors, delta)?;

        // Markers are per entry; clearing ours leaves any concurrent
        // walk by the same member still covered.
        if !ancestors.is_empty() {
            self.storage.clear_repair(&tx_id)?;
        }
        Ok(())
    }

    // Reads

    /// Get a member's ledger; `None` means zero-balance, never pledged
    pub fn ledger(&self, member_id: &MemberId) -> Result<Option<Ledger>> {
        self.storage.get_ledger(member_id)
    }

    /// Ordered transaction log for a member (audit trail)
    pub fn transactions(&self, member_id: &MemberId) -> Result<Vec<Transaction>> {
        self.storage.transactions_for(member_id)
    }

    /// Summary for the "what I owe / what my network owes me" views
    ///
    /// Children are sorted by descending due amount; ties keep the
    /// insertion order of the child relation.
    pub fn summarize(&self, member_id: &MemberId) -> Result<LedgerSummary> {
        let member = self
            .network
            .get(member_id)
            .ok_or_else(|| Error::NotFound(member_id.to_string()))?;

        let ledger = self
            .storage
            .get_ledger(member_id)?
            .unwrap_or_else(|| Ledger::new(member_id.clone()));

        let mut children = Vec::with_capacity(member.children.len());
        for child_id in &member.children {
            let due_amount = self
                .storage
                .get_ledger(child_id)?
                .map_or(Decimal::ZERO, |l| l.due_amount);
            children.push(ChildDue {
                member_id: child_id.clone(),
                due_amount,
            });
        }
        // Stable sort keeps insertion order within equal amounts
        children.sort_by(|a, b| b.due_amount.cmp(&a.due_amount));

        Ok(LedgerSummary {
            member_id: member.id,
            due_amount: ledger.due_amount,
            due_network_amount: ledger.due_network_amount,
            children,
        })
    }

    /// Rebuild `due_amount` from the transaction log
    ///
    /// Independent of the cached aggregate; used by consistency checks.
    pub fn rebuild_due_amount(&self, member_id: &MemberId) -> Result<Decimal> {
        let total = self
            .storage
            .transactions_for(member_id)?
            .iter()
            .map(Transaction::signed_amount)
            .sum();
        Ok(total)
    }
}

impl std::fmt::Debug for LedgerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerStore")
            .field("members", &self.network.len())
            .finish()
    }
}
