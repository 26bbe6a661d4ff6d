//! Integration Tests for the Atom Store
//!
//! These tests drive the public API only: atoms are read, written and
//! observed through a `Store`, and the assertions are on values and on how
//! often read functions and listeners run.

use std::cell::{Cell, OnceCell, RefCell};
use std::rc::Rc;

use nucleus_core::{default_store, Atom, Store, StoreConfig, StoreError, Subscription};

/// Route store logs to the test harness. Safe to call from every test.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("nucleus_core=trace")
        .with_test_writer()
        .try_init();
}

fn counter() -> (Rc<Cell<u32>>, impl Fn() + 'static) {
    let calls = Rc::new(Cell::new(0));
    let inner = calls.clone();
    (calls, move || inner.set(inner.get() + 1))
}

fn doubled(count: &Atom<i32>) -> Atom<i32> {
    let count = count.clone();
    Atom::derived(move |get| Ok(get.get(&count)? * 2)).with_label("double")
}

/// Subscribe a listener that records the atom's value each time it runs.
fn record(store: &Store, atom: &Atom<i32>) -> (Rc<RefCell<Vec<i32>>>, Subscription) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let subscription = {
        let (reader, target, seen) = (store.clone(), atom.clone(), seen.clone());
        store
            .subscribe(atom, move || seen.borrow_mut().push(reader.get(&target).unwrap()))
            .unwrap()
    };
    (seen, subscription)
}

// ----------------------------------------------------------------------------
// Reads and writes
// ----------------------------------------------------------------------------

/// Test that reading twice without a write returns the same value.
#[test]
fn read_is_idempotent() {
    init_tracing();
    let store = Store::new();
    let count = Atom::new(3);
    let double = doubled(&count);

    assert_eq!(store.get(&double).unwrap(), store.get(&double).unwrap());
    assert_eq!(store.get(&count).unwrap(), 3);
}

/// Test that a write is visible to the next read.
#[test]
fn write_is_visible() {
    init_tracing();
    let store = Store::new();
    let count = Atom::new(0);

    store.set(&count, 42).unwrap();
    assert_eq!(store.get(&count).unwrap(), 42);
}

/// Test that an empty atom reads `None` until it is set.
#[test]
fn empty_atom_starts_as_none() {
    let store = Store::new();
    let selection: Atom<Option<u32>> = Atom::empty();

    assert_eq!(store.get(&selection).unwrap(), None);
    store.set(&selection, Some(7)).unwrap();
    assert_eq!(store.get(&selection).unwrap(), Some(7));
}

/// Test that writing an equal value notifies nobody.
#[test]
fn equal_write_is_suppressed() {
    init_tracing();
    let store = Store::new();
    let count = Atom::new(5);
    let double = doubled(&count);
    let (count_calls, count_listener) = counter();
    let (double_calls, double_listener) = counter();

    let _a = store.subscribe(&count, count_listener).unwrap();
    let _b = store.subscribe(&double, double_listener).unwrap();

    store.set(&count, 5).unwrap();
    assert_eq!(count_calls.get(), 0);
    assert_eq!(double_calls.get(), 0);
}

/// Test that change detection follows `PartialEq`, including for floats.
#[test]
fn change_detection_uses_partial_eq() {
    init_tracing();
    let store = Store::new();

    // NaN != NaN, so every NaN write is a change.
    let ratio = Atom::new(f64::NAN);
    let (ratio_calls, ratio_listener) = counter();
    let _ratio = store.subscribe(&ratio, ratio_listener).unwrap();
    store.set(&ratio, f64::NAN).unwrap();
    store.set(&ratio, f64::NAN).unwrap();
    assert_eq!(ratio_calls.get(), 2);

    // 0.0 == -0.0, so the sign flip is suppressed.
    let offset = Atom::new(0.0_f64);
    let (offset_calls, offset_listener) = counter();
    let _offset = store.subscribe(&offset, offset_listener).unwrap();
    store.set(&offset, -0.0).unwrap();
    assert_eq!(offset_calls.get(), 0);
    assert!(store.get(&offset).unwrap().is_sign_positive());

    // A freshly built but equal collection is not a change.
    let items = Atom::new(vec![1, 2, 3]);
    let (items_calls, items_listener) = counter();
    let _items = store.subscribe(&items, items_listener).unwrap();
    store.set(&items, vec![1, 2, 3]).unwrap();
    assert_eq!(items_calls.get(), 0);
    store.set(&items, vec![1, 2]).unwrap();
    assert_eq!(items_calls.get(), 1);
}

/// Test that a derived atom always agrees with its source.
#[test]
fn derived_follows_source() {
    init_tracing();
    let store = Store::new();
    let count = Atom::new(0);
    let double = doubled(&count);

    for n in [1, -4, 17, 0] {
        store.set(&count, n).unwrap();
        assert_eq!(store.get(&double).unwrap(), 2 * n);
    }
}

// ----------------------------------------------------------------------------
// Subscriptions
// ----------------------------------------------------------------------------

/// Test that subscribing does not call the listener.
#[test]
fn subscribe_does_not_fire() {
    let store = Store::new();
    let count = Atom::new(0);
    let (calls, listener) = counter();

    let _subscription = store.subscribe(&count, listener).unwrap();
    assert_eq!(calls.get(), 0);
}

/// Test that a listener on a derived atom sees the new value exactly once.
#[test]
fn derived_listener_observes_once() {
    init_tracing();
    let store = Store::new();
    let count = Atom::new(0);
    let double = doubled(&count);
    let (seen, _subscription) = record(&store, &double);

    store.set(&count, 1).unwrap();
    assert_eq!(*seen.borrow(), vec![2]);
}

/// Test that writing through a custom write function reaches the source.
#[test]
fn custom_write_roundtrip() {
    init_tracing();
    let store = Store::new();
    let count = Atom::new(0);
    let double = {
        let (reader, writer) = (count.clone(), count.clone());
        Atom::writable(
            move |get| Ok(get.get(&reader)? * 2),
            move |_get, set, value: i32| set.set(&writer, value / 2),
        )
    };
    let (seen, _subscription) = record(&store, &count);

    store.set(&double, 4).unwrap();
    assert_eq!(*seen.borrow(), vec![2]);
    assert_eq!(store.get(&double).unwrap(), 4);
}

/// Test that an unsubscribed listener is never called again.
#[test]
fn unsubscribed_listener_is_silent() {
    let store = Store::new();
    let count = Atom::new(0);
    let (calls, listener) = counter();

    let subscription = store.subscribe(&count, listener).unwrap();
    store.set(&count, 1).unwrap();
    subscription.unsubscribe();
    store.set(&count, 2).unwrap();

    assert_eq!(calls.get(), 1);
}

/// Test that dropping the last subscription unmounts the whole chain.
#[test]
fn unmount_cascades_upstream() {
    init_tracing();
    let store = Store::new();
    let count = Atom::new(1);
    let reads = Rc::new(Cell::new(0));
    let double = {
        let (count, reads) = (count.clone(), reads.clone());
        Atom::derived(move |get| {
            reads.set(reads.get() + 1);
            Ok(get.get(&count)? * 2)
        })
    };
    let quadruple = doubled(&double);

    let (_, listener) = counter();
    let subscription = store.subscribe(&quadruple, listener).unwrap();
    assert!(store.is_mounted(&count));
    assert!(store.is_mounted(&double));
    assert_eq!(store.mounted_count(), 3);

    drop(subscription);
    assert!(!store.is_mounted(&quadruple));
    assert!(!store.is_mounted(&double));
    assert!(!store.is_mounted(&count));
    assert_eq!(store.mounted_count(), 0);

    // Unmounted atoms are no longer recomputed on write.
    let before = reads.get();
    store.set(&count, 2).unwrap();
    assert_eq!(reads.get(), before);
    assert_eq!(store.get(&quadruple).unwrap(), 8);
    assert_eq!(reads.get(), before + 1);
}

/// Test that a listener unsubscribed by an earlier listener is skipped.
#[test]
fn listener_removed_during_flush_is_skipped() {
    let store = Store::new();
    let count = Atom::new(0);
    let slot: Rc<RefCell<Option<Subscription>>> = Rc::default();
    let (late_calls, late_listener) = counter();

    let _early = {
        let slot = slot.clone();
        store
            .subscribe(&count, move || drop(slot.borrow_mut().take()))
            .unwrap()
    };
    *slot.borrow_mut() = Some(store.subscribe(&count, late_listener).unwrap());

    store.set(&count, 1).unwrap();
    assert_eq!(late_calls.get(), 0);
}

/// Test that a dependency dropped by a branch switch stops notifying.
#[test]
fn conditional_dependency_is_unmounted() {
    init_tracing();
    let store = Store::new();
    let use_left = Atom::new(true);
    let left = Atom::new(1);
    let right = Atom::new(2);
    let pick = {
        let (use_left, left, right) = (use_left.clone(), left.clone(), right.clone());
        Atom::derived(move |get| {
            if get.get(&use_left)? {
                get.get(&left)
            } else {
                get.get(&right)
            }
        })
    };
    let (seen, _subscription) = record(&store, &pick);

    store.set(&use_left, false).unwrap();
    assert!(!store.is_mounted(&left));
    assert!(store.is_mounted(&right));

    store.set(&left, 10).unwrap();
    store.set(&right, 20).unwrap();
    assert_eq!(*seen.borrow(), vec![2, 20]);
}

// ----------------------------------------------------------------------------
// Propagation
// ----------------------------------------------------------------------------

/// Test that a diamond notifies its bottom once per write.
#[test]
fn diamond_notifies_once() {
    init_tracing();
    let store = Store::new();
    let count = Atom::new(1);
    let left = doubled(&count);
    let right = {
        let count = count.clone();
        Atom::derived(move |get| Ok(get.get(&count)? + 100))
    };
    let reads = Rc::new(Cell::new(0));
    let sum = {
        let (left, right, reads) = (left.clone(), right.clone(), reads.clone());
        Atom::derived(move |get| {
            reads.set(reads.get() + 1);
            Ok(get.get(&left)? + get.get(&right)?)
        })
    };
    let (seen, _subscription) = record(&store, &sum);
    let before = reads.get();

    store.set(&count, 2).unwrap();
    assert_eq!(*seen.borrow(), vec![106]);
    assert_eq!(reads.get(), before + 1);
}

/// Test that several writes inside one write function notify once.
#[test]
fn batched_writes_notify_once() {
    init_tracing();
    let store = Store::new();
    let width = Atom::new(1);
    let height = Atom::new(1);
    let area = {
        let (width, height) = (width.clone(), height.clone());
        Atom::derived(move |get| Ok(get.get(&width)? * get.get(&height)?))
    };
    let resize = {
        let (width, height) = (width.clone(), height.clone());
        Atom::writable(
            |_get| Ok(()),
            move |_get, set, (w, h): (i32, i32)| {
                set.set(&width, w)?;
                set.set(&height, h)
            },
        )
    };
    let (seen, _subscription) = record(&store, &area);

    store.set(&resize, (3, 4)).unwrap();
    assert_eq!(*seen.borrow(), vec![12]);
}

/// Test that a listener writing back into the store is flushed in order.
#[test]
fn reentrant_listener_write() {
    init_tracing();
    let store = Store::new();
    let count = Atom::new(0);
    let seen = Rc::new(RefCell::new(Vec::new()));

    // Clamp to 10 from inside the listener.
    let _subscription = {
        let (reader, target, seen) = (store.clone(), count.clone(), seen.clone());
        store
            .subscribe(&count, move || {
                let value = reader.get(&target).unwrap();
                seen.borrow_mut().push(value);
                if value > 10 {
                    reader.set(&target, 10).unwrap();
                }
            })
            .unwrap()
    };

    store.set(&count, 15).unwrap();
    assert_eq!(*seen.borrow(), vec![15, 10]);
    assert_eq!(store.get(&count).unwrap(), 10);
}

/// Test that a failing derived atom recovers once its input is fixed.
#[test]
fn error_recovers_and_notifies() {
    #[derive(Debug, thiserror::Error)]
    #[error("divide by zero")]
    struct DivideByZero;

    init_tracing();
    let store = Store::new();
    let divisor = Atom::new(0);
    let quotient = {
        let divisor = divisor.clone();
        Atom::derived(move |get| match get.get(&divisor)? {
            0 => Err(StoreError::read_failed(divisor.id(), DivideByZero)),
            d => Ok(100 / d),
        })
    };
    let (calls, listener) = counter();
    let _subscription = store.subscribe(&quotient, listener).unwrap();

    assert!(matches!(store.get(&quotient), Err(StoreError::Read { .. })));

    store.set(&divisor, 4).unwrap();
    assert_eq!(store.get(&quotient).unwrap(), 25);
    assert_eq!(calls.get(), 1);
}

// ----------------------------------------------------------------------------
// Errors and configuration
// ----------------------------------------------------------------------------

/// Test that a derived atom reading itself without an initial value fails.
#[test]
fn self_read_without_initial_value_fails() {
    let store = Store::new();
    let cell: Rc<OnceCell<Atom<i32>>> = Rc::new(OnceCell::new());
    let selfish = {
        let cell = cell.clone();
        Atom::derived(move |get| match cell.get() {
            Some(me) => Ok(get.get(me)? + 1),
            None => Ok(0),
        })
    };
    cell.set(selfish.clone()).unwrap();

    let error = store.get(&selfish).unwrap_err();
    assert!(matches!(error, StoreError::InvalidSelfRead(id) if id == selfish.id()));
}

/// Test that writing a read-only atom is rejected.
#[test]
fn read_only_atom_rejects_set() {
    let store = Store::new();
    let count = Atom::new(0);
    let double = doubled(&count);

    assert!(matches!(store.set(&double, 1), Err(StoreError::ReadOnly(_))));
}

/// Test that a named store keeps its configuration.
#[test]
fn named_store_configuration() {
    let config: StoreConfig = serde_json::from_str(r#"{ "name": "editor" }"#).unwrap();
    let store = Store::with_config(config);

    assert_eq!(store.config().name, "editor");
    assert_eq!(default_store().config().name, "default");
}
