mod common;

use std::collections::HashSet;

use common::{ids, item, loaded, t0, ScriptedLookup};
use compare_core::persistence::MemoryStore;
use compare_core::store::CompareSetStore;
use compare_core::{CompareError, ErrorKind, ItemId, ManualClock, Toggled};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Toggle(&'static str),
    Remove(&'static str),
    Clear,
}

const POOL: [&str; 5] = ["a", "b", "c", "d", "e"];

fn pool_id() -> impl Strategy<Value = &'static str> {
    prop::sample::select(POOL.to_vec())
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => pool_id().prop_map(Op::Toggle),
        3 => pool_id().prop_map(Op::Remove),
        1 => Just(Op::Clear),
    ]
}

fn apply(store: &mut CompareSetStore, op: &Op) {
    match op {
        Op::Toggle(id) => {
            let _ = store.toggle(item(id));
        }
        Op::Remove(id) => {
            let _ = store.remove(&ItemId::from(*id));
        }
        Op::Clear => store.clear(),
    }
}

proptest! {
    #[test]
    fn invariant_capacity_and_uniqueness_hold_for_any_sequence(
        ops in prop::collection::vec(op(), 0..200),
    ) {
        let mut store = CompareSetStore::new(3);
        for op in &ops {
            apply(&mut store, op);

            prop_assert!(store.len() <= 3, "size {} exceeds capacity", store.len());
            let unique: HashSet<_> = store.items().iter().map(|i| i.id.clone()).collect();
            prop_assert_eq!(unique.len(), store.len());
            if store.is_empty() {
                prop_assert!(store.refresh_timestamp().is_none());
            }
        }
    }

    #[test]
    fn invariant_newly_added_item_is_last(
        ops in prop::collection::vec(op(), 0..50),
        id in pool_id(),
    ) {
        let mut store = CompareSetStore::new(3);
        for op in &ops {
            apply(&mut store, op);
        }

        if let Ok(Toggled::Added) = store.toggle(item(id)) {
            prop_assert_eq!(store.items().last().map(|i| i.id.as_str()), Some(id));
        }
    }

    #[test]
    fn invariant_double_toggle_restores_set(
        ops in prop::collection::vec(op(), 0..50),
        id in pool_id(),
        stamped in any::<bool>(),
    ) {
        let mut store = CompareSetStore::new(3);
        for op in &ops {
            apply(&mut store, op);
        }
        if stamped {
            store.adopt_timestamp(t0());
        }
        prop_assume!(!store.contains(&ItemId::from(id)) && store.len() < 3);
        let before = store.clone();

        prop_assert_eq!(store.toggle(item(id)).unwrap(), Toggled::Added);
        prop_assert_eq!(store.toggle(item(id)).unwrap(), Toggled::Removed);

        prop_assert_eq!(store.items(), before.items());
        prop_assert_eq!(store.refresh_timestamp(), before.refresh_timestamp());
    }

    #[test]
    fn invariant_persisted_set_survives_reload(
        ops in prop::collection::vec(op(), 0..40),
    ) {
        let storage = MemoryStore::new();
        let clock = ManualClock::new(t0());
        let writer = loaded(storage.clone(), ScriptedLookup::new(), clock.clone());
        for op in &ops {
            match op {
                Op::Toggle(id) => {
                    let _ = writer.toggle(item(id));
                }
                Op::Remove(id) => {
                    let _ = writer.remove(&ItemId::from(*id));
                }
                Op::Clear => writer.clear(),
            }
        }

        let reader = loaded(storage, ScriptedLookup::new(), clock);
        let (written, restored) = (writer.state(), reader.state());
        prop_assert_eq!(written.items, restored.items);
        prop_assert_eq!(written.refresh_timestamp, restored.refresh_timestamp);
    }
}

#[test]
fn invariant_double_toggle_keeps_existing_stamp() {
    let mut store = CompareSetStore::new(3);
    store.toggle(item("a")).unwrap();
    store.toggle(item("b")).unwrap();
    store.adopt_timestamp(t0());
    let before: Vec<_> = store.items().to_vec();

    assert_eq!(store.toggle(item("c")).unwrap(), Toggled::Added);
    assert_eq!(store.toggle(item("c")).unwrap(), Toggled::Removed);

    assert_eq!(store.items(), before.as_slice());
    assert_eq!(store.refresh_timestamp(), Some(t0()));
}

#[test]
fn invariant_toggle_on_full_set_is_rejected() {
    let mut store = CompareSetStore::new(3);
    for id in ["a", "b", "c"] {
        store.toggle(item(id)).unwrap();
    }

    let err = store.toggle(item("d")).unwrap_err();
    assert!(matches!(err, CompareError::CapacityExceeded { max: 3, .. }));
    assert_eq!(ids(store.items()), vec!["a", "b", "c"]);

    // Removing from a full set is still allowed
    assert_eq!(store.toggle(item("b")).unwrap(), Toggled::Removed);
    assert_eq!(ids(store.items()), vec!["a", "c"]);
}

#[test]
fn invariant_empty_ids_never_mutate() {
    let mut store = CompareSetStore::new(3);
    store.toggle(item("a")).unwrap();

    assert!(matches!(store.toggle(item("")), Err(CompareError::InvalidItem)));
    assert!(matches!(store.remove(&ItemId::from("")), Err(CompareError::InvalidItem)));
    assert_eq!(ids(store.items()), vec!["a"]);
}

#[test]
fn whitespace_id_is_a_valid_id() {
    let mut store = CompareSetStore::new(3);
    assert_eq!(store.toggle(item(" ")).unwrap(), Toggled::Added);
    assert!(store.contains(&ItemId::from(" ")));
}

#[test]
fn invariant_removing_last_item_clears_timestamp() {
    let mut store = CompareSetStore::new(3);
    store.toggle(item("a")).unwrap();
    store.toggle(item("b")).unwrap();
    store.adopt_timestamp(t0());

    assert!(store.remove(&ItemId::from("a")).unwrap());
    assert_eq!(store.refresh_timestamp(), Some(t0()));

    assert!(!store.remove(&ItemId::from("missing")).unwrap());
    assert!(store.remove(&ItemId::from("b")).unwrap());
    assert!(store.refresh_timestamp().is_none());
}

#[test]
fn invariant_clear_resets_timestamp() {
    let mut store = CompareSetStore::new(3);
    store.toggle(item("a")).unwrap();
    store.adopt_timestamp(t0());

    store.clear();
    assert!(store.is_empty());
    assert!(store.refresh_timestamp().is_none());
}

#[test]
fn capacity_rejection_becomes_current_error() {
    let clock = ManualClock::new(t0());
    let comparison = loaded(MemoryStore::new(), ScriptedLookup::new(), clock);
    for id in ["a", "b", "c"] {
        comparison.toggle(item(id)).unwrap();
    }

    assert!(comparison.toggle(item("d")).is_err());

    let state = comparison.state();
    assert_eq!(ids(&state.items), vec!["a", "b", "c"]);
    let error = state.last_error.expect("capacity error should be held");
    assert_eq!(error.kind, ErrorKind::CapacityExceeded);
    assert!(!error.recoverable);
    assert_eq!(error.message, "You can compare up to 3 items at a time.");

    comparison.clear_error();
    assert!(comparison.state().last_error.is_none());
}

#[test]
fn is_compared_tracks_membership() {
    let clock = ManualClock::new(t0());
    let comparison = loaded(MemoryStore::new(), ScriptedLookup::new(), clock);
    let a = ItemId::from("a");

    assert!(!comparison.is_compared(&a));
    comparison.toggle(item("a")).unwrap();
    assert!(comparison.is_compared(&a));
    assert!(!comparison.state().is_active());

    comparison.toggle(item("b")).unwrap();
    assert!(comparison.state().is_active());
}
