//! Write Throttling Tests
//!
//! Coalescing of mutation bursts, spacing between writes, and the
//! guarantee that no mutation is lost while a write is in flight.

use crate::*;
use keepfile::SaveState;
use serde_json::json;
use std::time::Instant;

/// Every mutation issued in one tick lands in a single write
#[tokio::test]
async fn test_same_tick_burst_is_one_write() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_unthrottled(&dir.path().join("s.json"), 3).await;

    for i in 0..50 {
        store.set(format!("key{}", i), json!(i));
    }
    store.flushed().await;

    assert_eq!(store.stats().writes_completed, 1);
    assert_eq!(store.len(), 50);
    let on_disk: Value = serde_json::from_str(&read(store.path()).unwrap()).unwrap();
    assert_eq!(on_disk.as_object().unwrap().len(), 50);
}

/// Completed writes are at least `min_save_interval` apart
#[tokio::test]
async fn test_consecutive_writes_respect_interval() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let interval = Duration::from_millis(120);
    let store = Store::builder(dir.path().join("s.json"))
        .min_save_interval(interval)
        .open()
        .await
        .unwrap();

    let mut completed = Vec::new();
    for n in 0..3 {
        store.set("n", json!(n));
        store.flushed().await;
        completed.push(Instant::now());
    }

    assert_eq!(store.stats().writes_completed, 3);
    for pair in completed.windows(2) {
        assert!(
            pair[1] - pair[0] >= interval,
            "writes only {:?} apart",
            pair[1] - pair[0]
        );
    }
}

/// Mutations made during the cooldown collapse into one follow-up write
#[tokio::test]
async fn test_cooldown_coalesces_followup_mutations() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let store = Store::builder(dir.path().join("s.json"))
        .min_save_interval(Duration::from_millis(300))
        .open()
        .await
        .unwrap();

    set_and_flush(&store, "n", json!(0)).await;
    for n in 1..=10 {
        store.set("n", json!(n));
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    assert_eq!(store.state(), SaveState::Writing { dirty: true });

    store.flushed().await;
    store.close().await;
    assert_eq!(store.stats().writes_completed, 2);
    assert!(read(store.path()).unwrap().contains("\"n\": 10"));
}

/// The last mutation always reaches disk
#[tokio::test]
async fn test_no_lost_updates_under_interleaving() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("s.json");
    let store = open_unthrottled(&path, 2).await;

    for n in 0..25 {
        store.set("n", json!(n));
        if n % 3 == 0 {
            tokio::task::yield_now().await;
        }
    }
    store.close().await;

    let reopened = open_unthrottled(&path, 2).await;
    assert_eq!(reopened.get("n", json!(null)), json!(24));
}

/// A write in flight keeps the store out of the quiescent state
#[tokio::test]
async fn test_state_during_cooldown() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let store = Store::builder(dir.path().join("s.json"))
        .min_save_interval(Duration::from_millis(60))
        .open()
        .await
        .unwrap();

    assert!(store.is_quiescent());
    store.set("n", json!(1));
    assert_eq!(store.state(), SaveState::Scheduled);

    store.flushed().await;
    assert_eq!(store.state(), SaveState::Writing { dirty: false });
    assert!(!store.is_quiescent());

    store.close().await;
    assert_eq!(store.state(), SaveState::Idle);
}
