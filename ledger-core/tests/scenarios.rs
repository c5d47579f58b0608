//! End-to-end ledger scenarios
//!
//! Exercises the full pledge/pay lifecycle against a real RocksDB
//! directory, including concurrent contributions and restart recovery.

use event_bus::{EventBus, EventKind};
use ledger_core::{Config, Error, LedgerStore, MemberId};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

fn id(s: &str) -> MemberId {
    MemberId::new(s)
}

fn open_store() -> (Arc<LedgerStore>, Arc<EventBus>, TempDir) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let temp_dir = TempDir::new().unwrap();
    let bus = Arc::new(EventBus::new());
    let mut config = Config::default();
    config.data_dir = temp_dir.path().to_path_buf();
    let store = Arc::new(LedgerStore::open(config, bus.clone()).unwrap());
    (store, bus, temp_dir)
}

/// Root R invites M1 invites M2
fn invite_chain(store: &LedgerStore) {
    store.create_member(None, id("r")).unwrap();
    store.create_member(Some(&id("r")), id("m1")).unwrap();
    store.create_member(Some(&id("m1")), id("m2")).unwrap();
}

fn due(store: &LedgerStore, member: &str) -> Decimal {
    store.ledger(&id(member)).unwrap().unwrap().due_amount
}

fn network_due(store: &LedgerStore, member: &str) -> Decimal {
    store.ledger(&id(member)).unwrap().unwrap().due_network_amount
}

#[test]
fn test_pledge_propagates_to_every_ancestor() {
    let (store, _bus, _temp) = open_store();
    invite_chain(&store);

    store.on_pledge(&id("m2"), Uuid::new_v4(), Decimal::from(100)).unwrap();

    assert_eq!(due(&store, "m2"), Decimal::from(100));
    assert_eq!(due(&store, "m1"), Decimal::ZERO);
    assert_eq!(network_due(&store, "m1"), Decimal::from(100));
    assert_eq!(network_due(&store, "r"), Decimal::from(100));
    // A leaf expects nothing from below
    assert_eq!(network_due(&store, "m2"), Decimal::ZERO);
}

#[test]
fn test_payment_cancels_network_expectation() {
    let (store, _bus, _temp) = open_store();
    invite_chain(&store);

    let contribution = Uuid::new_v4();
    store.on_pledge(&id("m2"), contribution, Decimal::from(100)).unwrap();
    store.on_pay(&id("m2"), contribution, Decimal::from(100)).unwrap();

    assert_eq!(due(&store, "m2"), Decimal::ZERO);
    assert_eq!(network_due(&store, "m1"), Decimal::ZERO);
    assert_eq!(network_due(&store, "r"), Decimal::ZERO);
}

#[test]
fn test_concurrent_pledges_share_an_ancestor_without_lost_updates() {
    let (store, _bus, _temp) = open_store();
    store.create_member(None, id("p")).unwrap();
    store.create_member(Some(&id("p")), id("c1")).unwrap();
    store.create_member(Some(&id("p")), id("c2")).unwrap();

    let handles: Vec<_> = ["c1", "c2"]
        .into_iter()
        .map(|child| {
            let store = store.clone();
            let child = id(child);
            std::thread::spawn(move || {
                store.on_pledge(&child, Uuid::new_v4(), Decimal::from(50)).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(network_due(&store, "p"), Decimal::from(100));
    assert!(store.check_aggregate_consistency(&id("p")).unwrap());
}

#[test]
fn test_concurrent_pledges_on_same_member_serialize() {
    let (store, _bus, _temp) = open_store();
    store.create_member(None, id("r")).unwrap();
    store.create_member(Some(&id("r")), id("m")).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            std::thread::spawn(move || {
                store.on_pledge(&id("m"), Uuid::new_v4(), Decimal::from(10)).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(due(&store, "m"), Decimal::from(80));
    assert_eq!(network_due(&store, "r"), Decimal::from(80));
    assert_eq!(store.transactions(&id("m")).unwrap().len(), 8);
}

#[test]
fn test_overpay_is_rejected_without_any_mutation() {
    let (store, _bus, _temp) = open_store();
    invite_chain(&store);

    let contribution = Uuid::new_v4();
    store.on_pledge(&id("m2"), contribution, Decimal::from(100)).unwrap();

    let err = store.on_pay(&id("m2"), contribution, Decimal::from(150)).unwrap_err();
    assert!(matches!(err, Error::BusinessRule(_)));

    assert_eq!(due(&store, "m2"), Decimal::from(100));
    assert_eq!(network_due(&store, "m1"), Decimal::from(100));
    assert_eq!(network_due(&store, "r"), Decimal::from(100));
    // Only the original CREDIT is on the log
    assert_eq!(store.transactions(&id("m2")).unwrap().len(), 1);
}

#[test]
fn test_amounts_must_be_positive() {
    let (store, _bus, _temp) = open_store();
    invite_chain(&store);

    let err = store.on_pledge(&id("m2"), Uuid::new_v4(), Decimal::ZERO).unwrap_err();
    assert!(matches!(err, Error::BusinessRule(_)));

    let err = store.on_pay(&id("m2"), Uuid::new_v4(), Decimal::from(-5)).unwrap_err();
    assert!(matches!(err, Error::BusinessRule(_)));
}

#[test]
fn test_operations_on_unknown_member_fail() {
    let (store, _bus, _temp) = open_store();

    let err = store.on_pledge(&id("ghost"), Uuid::new_v4(), Decimal::from(10)).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    let err = store.summarize(&id("ghost")).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    let err = store.on_confirm(&id("ghost"), Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn test_confirm_is_bookkeeping_only() {
    let (store, bus, _temp) = open_store();
    invite_chain(&store);

    let confirmed = Arc::new(AtomicUsize::new(0));
    let confirmed2 = confirmed.clone();
    bus.subscribe(EventKind::ContributionConfirmed, move |_| {
        confirmed2.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    let contribution = Uuid::new_v4();
    store.on_pledge(&id("m2"), contribution, Decimal::from(100)).unwrap();
    store.on_pay(&id("m2"), contribution, Decimal::from(100)).unwrap();
    store.on_confirm(&id("m2"), contribution).unwrap();

    assert_eq!(confirmed.load(Ordering::SeqCst), 1);
    assert_eq!(due(&store, "m2"), Decimal::ZERO);
    assert_eq!(store.transactions(&id("m2")).unwrap().len(), 2);
}

#[test]
fn test_summary_sorts_children_by_due_descending() {
    let (store, _bus, _temp) = open_store();
    store.create_member(None, id("p")).unwrap();
    for child in ["c1", "c2", "c3", "c4"] {
        store.create_member(Some(&id("p")), id(child)).unwrap();
    }

    store.on_pledge(&id("c2"), Uuid::new_v4(), Decimal::from(30)).unwrap();
    store.on_pledge(&id("c3"), Uuid::new_v4(), Decimal::from(70)).unwrap();
    // c1 and c4 stay at zero; ties keep insertion order

    let summary = store.summarize(&id("p")).unwrap();
    assert_eq!(summary.due_network_amount, Decimal::from(100));

    let order: Vec<&str> = summary.children.iter().map(|c| c.member_id.as_str()).collect();
    assert_eq!(order, vec!["c3", "c2", "c1", "c4"]);
}

#[test]
fn test_due_amount_rebuilds_from_transaction_log() {
    let (store, _bus, _temp) = open_store();
    invite_chain(&store);

    let contribution = Uuid::new_v4();
    store.on_pledge(&id("m2"), contribution, Decimal::from(100)).unwrap();
    store.on_pledge(&id("m2"), Uuid::new_v4(), Decimal::from(40)).unwrap();
    store.on_pay(&id("m2"), contribution, Decimal::from(60)).unwrap();

    let cached = due(&store, "m2");
    assert_eq!(cached, Decimal::from(80));
    assert_eq!(store.rebuild_due_amount(&id("m2")).unwrap(), cached);
}

#[test]
fn test_concurrent_invites_persist_every_child() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.data_dir = temp_dir.path().to_path_buf();

    {
        let store = Arc::new(LedgerStore::open(config.clone(), Arc::new(EventBus::new())).unwrap());
        store.create_member(None, id("p")).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|n| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store
                        .create_member(Some(&id("p")), MemberId::new(format!("c{}", n)))
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }

    // The rebuilt arena only knows the children the parent record kept
    let store = LedgerStore::open(config, Arc::new(EventBus::new())).unwrap();
    let children = store.network().children_of(&id("p")).unwrap();
    assert_eq!(children.len(), 8);
    for n in 0..8 {
        assert!(children.contains(&MemberId::new(format!("c{}", n))));
    }

    // Every persisted child participates in aggregation
    for n in 0..8 {
        store
            .on_pledge(&MemberId::new(format!("c{}", n)), Uuid::new_v4(), Decimal::from(10))
            .unwrap();
    }
    assert_eq!(network_due(&store, "p"), Decimal::from(80));
    assert!(store.check_aggregate_consistency(&id("p")).unwrap());
}

#[test]
fn test_restart_preserves_members_and_balances() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.data_dir = temp_dir.path().to_path_buf();

    {
        let store = LedgerStore::open(config.clone(), Arc::new(EventBus::new())).unwrap();
        invite_chain(&store);
        store.on_pledge(&id("m2"), Uuid::new_v4(), Decimal::from(100)).unwrap();
    }

    let store = LedgerStore::open(config, Arc::new(EventBus::new())).unwrap();
    assert!(store.network().contains(&id("m2")));
    assert_eq!(network_due(&store, "r"), Decimal::from(100));
    assert!(store.check_aggregate_consistency(&id("r")).unwrap());

    // The reopened store keeps serving mutations
    store.on_pay(&id("m2"), Uuid::new_v4(), Decimal::from(100)).unwrap();
    assert_eq!(network_due(&store, "r"), Decimal::ZERO);
}

#[test]
fn test_pledge_publishes_contribution_event() {
    let (store, bus, _temp) = open_store();
    invite_chain(&store);

    let pledged = Arc::new(AtomicUsize::new(0));
    let pledged2 = pledged.clone();
    bus.subscribe(EventKind::ContributionPledged, move |_| {
        pledged2.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    store.on_pledge(&id("m2"), Uuid::new_v4(), Decimal::from(100)).unwrap();
    assert_eq!(pledged.load(Ordering::SeqCst), 1);
}
