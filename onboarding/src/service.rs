//! Event-driven membership creation

use crate::{
    invitation::InvitationDirectory,
    metrics::{outcome, ONBOARDING_EVENTS_TOTAL, ONBOARDING_INTEGRITY_FLAGS_TOTAL},
    Result,
};
use event_bus::{Event, EventBus, EventKind, EventPayload};
use ledger_core::{Error as LedgerError, LedgerStore, MemberId};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Creates Member + Ledger pairs in response to account creation
pub struct MembershipService {
    store: Arc<LedgerStore>,
    invitations: Arc<dyn InvitationDirectory>,
    bus: Arc<EventBus>,
}

impl MembershipService {
    /// Create the service
    pub fn new(
        store: Arc<LedgerStore>,
        invitations: Arc<dyn InvitationDirectory>,
        bus: Arc<EventBus>,
    ) -> Self {
        Self {
            store,
            invitations,
            bus,
        }
    }

    /// Subscribe the `AccountCreated` handler on the bus (startup wiring)
    pub fn register(self: Arc<Self>) {
        let bus = self.bus.clone();
        bus.subscribe(EventKind::AccountCreated, move |event| {
            if let EventPayload::AccountCreated {
                account_id,
                mobile_number,
            } = &event.payload
            {
                self.handle_account_created(account_id, mobile_number)
                    .map_err(|e| event_bus::Error::Handler(e.to_string()))?;
            }
            Ok(())
        });
    }

    /// React to a new account, or explain why nothing happened
    ///
    /// No invitation is a legitimate no-op (admin-seeded accounts);
    /// an invitation whose inviter has no member record is flagged for
    /// operator follow-up without failing the triggering flow; a
    /// duplicate delivery is swallowed so re-processing never creates a
    /// second member, ledger, or notification.
    pub fn handle_account_created(&self, account_id: &str, mobile_number: &str) -> Result<()> {
        let Some(invitation) = self.invitations.find_by_mobile(mobile_number) else {
            debug!(account_id, "No pending invitation, skipping membership");
            ONBOARDING_EVENTS_TOTAL
                .with_label_values(&[outcome::NO_INVITATION])
                .inc();
            return Ok(());
        };

        if !self.store.network().contains(&invitation.inviter_id) {
            error!(
                account_id,
                inviter_id = %invitation.inviter_id,
                "Invitation references an inviter with no member record"
            );
            ONBOARDING_INTEGRITY_FLAGS_TOTAL.inc();
            ONBOARDING_EVENTS_TOTAL
                .with_label_values(&[outcome::INTEGRITY])
                .inc();
            return Ok(());
        }

        let member_id = MemberId::new(account_id);
        match self
            .store
            .create_member(Some(&invitation.inviter_id), member_id)
        {
            Ok(member) => {
                info!(
                    member_id = %member.id,
                    parent_id = %invitation.inviter_id,
                    "Member joined the network"
                );
                ONBOARDING_EVENTS_TOTAL
                    .with_label_values(&[outcome::CREATED])
                    .inc();
                self.bus.publish(&Event::new(EventPayload::ConnectionAdded {
                    member_id: member.id.to_string(),
                    parent_id: invitation.inviter_id.to_string(),
                }));
                Ok(())
            }
            Err(LedgerError::Conflict(_)) => {
                // Re-delivered event; the first delivery already won
                debug!(account_id, "Member already exists, duplicate delivery");
                ONBOARDING_EVENTS_TOTAL
                    .with_label_values(&[outcome::DUPLICATE])
                    .inc();
                Ok(())
            }
            Err(e) => {
                ONBOARDING_EVENTS_TOTAL
                    .with_label_values(&[outcome::ERROR])
                    .inc();
                Err(e.into())
            }
        }
    }
}

impl std::fmt::Debug for MembershipService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MembershipService").finish()
    }
}
