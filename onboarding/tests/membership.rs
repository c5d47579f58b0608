//! End-to-end onboarding scenarios
//!
//! Drives `AccountCreated` events through the bus and verifies the
//! member/ledger pair, the `ConnectionAdded` notification, and the
//! idempotency guarantees.

use event_bus::{Event, EventBus, EventKind, EventPayload};
use ledger_core::{Config, LedgerStore, MemberId};
use onboarding::{InMemoryInvitations, Invitation, MembershipService};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

struct Fixture {
    store: Arc<LedgerStore>,
    invitations: Arc<InMemoryInvitations>,
    bus: Arc<EventBus>,
    connections: Arc<AtomicUsize>,
    _temp: TempDir,
}

fn fixture() -> Fixture {
    let temp = TempDir::new().unwrap();
    let bus = Arc::new(EventBus::new());
    let mut config = Config::default();
    config.data_dir = temp.path().to_path_buf();

    let store = Arc::new(LedgerStore::open(config, bus.clone()).unwrap());
    let invitations = Arc::new(InMemoryInvitations::new());

    let service = Arc::new(MembershipService::new(
        store.clone(),
        invitations.clone(),
        bus.clone(),
    ));
    service.register();

    let connections = Arc::new(AtomicUsize::new(0));
    let connections2 = connections.clone();
    bus.subscribe(EventKind::ConnectionAdded, move |_| {
        connections2.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    Fixture {
        store,
        invitations,
        bus,
        connections,
        _temp: temp,
    }
}

fn account_created(account_id: &str, mobile: &str) -> Event {
    Event::new(EventPayload::AccountCreated {
        account_id: account_id.to_string(),
        mobile_number: mobile.to_string(),
    })
}

#[test]
fn test_invited_account_becomes_member_with_ledger() {
    let f = fixture();
    f.store.create_member(None, MemberId::new("inviter")).unwrap();
    f.invitations.add(Invitation {
        invited_mobile_number: "+15550100".to_string(),
        inviter_id: MemberId::new("inviter"),
    });

    f.bus.publish(&account_created("acc-1", "+15550100"));

    let network = f.store.network();
    assert!(network.contains(&MemberId::new("acc-1")));
    assert!(network.is_ancestor_of(&MemberId::new("inviter"), &MemberId::new("acc-1")));

    let ledger = f.store.ledger(&MemberId::new("acc-1")).unwrap().unwrap();
    assert_eq!(ledger.due_amount, Decimal::ZERO);
    assert_eq!(ledger.due_network_amount, Decimal::ZERO);

    assert_eq!(f.connections.load(Ordering::SeqCst), 1);
}

#[test]
fn test_account_without_invitation_is_noop() {
    let f = fixture();

    f.bus.publish(&account_created("acc-1", "+15550100"));

    assert!(!f.store.network().contains(&MemberId::new("acc-1")));
    assert_eq!(f.connections.load(Ordering::SeqCst), 0);
}

#[test]
fn test_invitation_with_missing_inviter_is_flagged_noop() {
    let f = fixture();
    f.invitations.add(Invitation {
        invited_mobile_number: "+15550100".to_string(),
        inviter_id: MemberId::new("ghost"),
    });

    // Must not crash the flow and must not create anything
    f.bus.publish(&account_created("acc-1", "+15550100"));

    assert!(!f.store.network().contains(&MemberId::new("acc-1")));
    assert_eq!(f.connections.load(Ordering::SeqCst), 0);
}

#[test]
fn test_duplicate_delivery_is_idempotent() {
    let f = fixture();
    f.store.create_member(None, MemberId::new("inviter")).unwrap();
    f.invitations.add(Invitation {
        invited_mobile_number: "+15550100".to_string(),
        inviter_id: MemberId::new("inviter"),
    });

    f.bus.publish(&account_created("acc-1", "+15550100"));
    f.bus.publish(&account_created("acc-1", "+15550100"));

    // Exactly one member, one ledger, one notification
    let network = f.store.network();
    assert_eq!(
        network.children_of(&MemberId::new("inviter")).unwrap(),
        vec![MemberId::new("acc-1")]
    );
    assert_eq!(f.connections.load(Ordering::SeqCst), 1);

    // And balances are untouched by the re-delivery
    let ledger = f.store.ledger(&MemberId::new("acc-1")).unwrap().unwrap();
    assert_eq!(ledger.due_amount, Decimal::ZERO);
}

#[test]
fn test_onboarded_member_participates_in_propagation() {
    let f = fixture();
    f.store.create_member(None, MemberId::new("inviter")).unwrap();
    f.invitations.add(Invitation {
        invited_mobile_number: "+15550100".to_string(),
        inviter_id: MemberId::new("inviter"),
    });
    f.bus.publish(&account_created("acc-1", "+15550100"));

    f.store
        .on_pledge(&MemberId::new("acc-1"), Uuid::new_v4(), Decimal::from(75))
        .unwrap();

    let inviter = f.store.ledger(&MemberId::new("inviter")).unwrap().unwrap();
    assert_eq!(inviter.due_network_amount, Decimal::from(75));
}
