//! Flush Notification Tests
//!
//! Waiters fire once per registration, in registration order, and only
//! when the store reaches a consistent state.

use crate::*;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;

/// Flushing an idle store resolves on the next tick
#[tokio::test]
async fn test_flush_on_idle_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_unthrottled(&dir.path().join("s.json"), 1).await;

    store.flushed().await;
    assert!(store.is_quiescent());
    assert_eq!(store.stats().writes_completed, 0);
}

/// A waiter is notified exactly once even though a save cycle has two
/// notification points
#[tokio::test]
async fn test_waiter_fires_exactly_once() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let store = Store::builder(dir.path().join("s.json"))
        .min_save_interval(Duration::from_millis(40))
        .open()
        .await
        .unwrap();
    let count = Arc::new(Mutex::new(0));

    let c = Arc::clone(&count);
    store.set_with("n", json!(1), move || *c.lock() += 1);
    store.close().await;

    assert_eq!(*count.lock(), 1);
}

/// Waiters registered during the cooldown fire when it ends
#[tokio::test]
async fn test_waiter_registered_during_cooldown() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let store = Store::builder(dir.path().join("s.json"))
        .min_save_interval(Duration::from_millis(50))
        .open()
        .await
        .unwrap();

    set_and_flush(&store, "n", json!(1)).await;
    assert!(!store.is_quiescent());

    store.flushed().await;
    assert!(store.is_quiescent());
}

/// Callbacks run in registration order across set and remove
#[tokio::test]
async fn test_callbacks_in_registration_order() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_unthrottled(&dir.path().join("s.json"), 1).await;
    let order = Arc::new(Mutex::new(Vec::new()));

    let o = Arc::clone(&order);
    store.set_with("a", json!(1), move || o.lock().push("set a"));
    let o = Arc::clone(&order);
    store.on_flush(move || o.lock().push("plain"));
    let o = Arc::clone(&order);
    store.remove_with("a", move || o.lock().push("remove a"));
    store.flushed().await;

    assert_eq!(*order.lock(), vec!["set a", "plain", "remove a"]);
}

/// A waiter registered from inside a callback waits for the next flush
#[tokio::test]
async fn test_nested_registration_is_not_in_same_drain() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_unthrottled(&dir.path().join("s.json"), 1).await;
    let fired = Arc::new(Mutex::new(Vec::new()));

    let inner_store = store.clone();
    let f = Arc::clone(&fired);
    store.set_with("n", json!(1), move || {
        f.lock().push("outer");
        let f = Arc::clone(&f);
        inner_store.set_with("n", json!(2), move || f.lock().push("inner"));
    });

    store.flushed().await;
    store.close().await;
    assert_eq!(*fired.lock(), vec!["outer", "inner"]);
    assert!(read(store.path()).unwrap().contains("\"n\": 2"));
}

/// Flush callbacks still fire when nothing needs writing
#[tokio::test]
async fn test_flush_fires_for_skipped_write() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_unthrottled(&dir.path().join("s.json"), 1).await;
    set_and_flush(&store, "n", json!(1)).await;
    store.close().await;

    let fired = Arc::new(Mutex::new(false));
    let f = Arc::clone(&fired);
    store.set_with("n", json!(1), move || *f.lock() = true);
    store.flushed().await;

    assert!(*fired.lock());
    assert_eq!(store.stats().writes_skipped, 1);
}

/// Close drains every queued mutation before returning
#[tokio::test]
async fn test_close_drains_pending_writes() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("s.json");
    let store = Store::builder(&path)
        .min_save_interval(Duration::from_millis(30))
        .open()
        .await
        .unwrap();

    store.set("a", json!(1));
    tokio::task::yield_now().await;
    store.set("b", json!(2));
    store.close().await;

    assert!(store.is_quiescent());
    let on_disk: Value = serde_json::from_str(&read(&path).unwrap()).unwrap();
    assert_eq!(on_disk, json!({"a": 1, "b": 2}));
}
