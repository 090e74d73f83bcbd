//! Error Delivery Tests
//!
//! Write failures go to the error sink, never through the mutation call,
//! and never leave the scheduler stuck.

use crate::*;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;

/// Failures reach a custom sink with the failing path
#[tokio::test]
async fn test_custom_sink_receives_write_failure() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("s.json");
    let seen: Arc<Mutex<Vec<(bool, Option<PathBuf>)>>> = Arc::new(Mutex::new(Vec::new()));

    let sink_seen = Arc::clone(&seen);
    let store = Store::builder(&path)
        .min_save_interval(Duration::ZERO)
        .on_error(move |e| {
            sink_seen
                .lock()
                .push((e.is_io(), e.path().map(Path::to_path_buf)));
        })
        .open()
        .await
        .unwrap();

    store.set("n", json!(1));
    store.flushed().await;

    let seen = seen.lock();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].0);
    assert_eq!(seen[0].1, Some(PathBuf::from(format!("{}.tmp", path.display()))));
}

/// The default sink logs and the store keeps working
#[tokio::test]
async fn test_default_sink_keeps_store_usable() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_unthrottled(&dir.path().join("missing").join("s.json"), 1).await;

    store.set("n", json!(1));
    store.flushed().await;
    store.close().await;

    assert!(store.is_quiescent());
    assert_eq!(store.stats().write_failures, 1);
    assert_eq!(store.get("n", json!(null)), json!(1));
}

/// After a failure the same document is written once the path is usable
#[tokio::test]
async fn test_failed_payload_is_retried_by_next_save() {
    let dir = tempfile::tempdir().unwrap();
    let parent = dir.path().join("later");
    let path = parent.join("s.json");
    let store = open_unthrottled(&path, 1).await;

    store.set("n", json!(1));
    store.flushed().await;
    store.close().await;
    assert!(read(&path).is_none());

    std::fs::create_dir(&parent).unwrap();
    store.save();
    store.flushed().await;

    assert_eq!(read(&path).as_deref(), Some("{\n  \"n\": 1\n}"));
}

/// Opening never fails because of unreadable files
#[tokio::test]
async fn test_load_errors_are_not_surfaced() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("s.json");
    std::fs::write(&path, "[]").unwrap();
    std::fs::write(backup_path(&path, 0), "nope").unwrap();
    std::fs::write(backup_path(&path, 1), "{").unwrap();

    let store = open_unthrottled(&path, 2).await;
    assert!(store.is_empty());
    assert_eq!(store.load_source(), keepfile::LoadSource::Default);
}

/// Configuration problems are reported by open
#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let err = Store::open_with(StoreConfig::default()).await.unwrap_err();
    assert!(err.is_config());
}

/// A primary that cannot be replaced is reported and the store recovers
#[tokio::test]
async fn test_promotion_failure_reaches_sink_and_recovers() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("s.json");
    // With no backup slots nothing moves the primary aside, so a non-empty
    // directory there blocks the final rename.
    std::fs::create_dir(&path).unwrap();
    std::fs::write(path.join("occupied"), "x").unwrap();
    let seen: Arc<Mutex<Vec<Option<PathBuf>>>> = Arc::new(Mutex::new(Vec::new()));

    let sink_seen = Arc::clone(&seen);
    let store = Store::builder(&path)
        .min_save_interval(Duration::ZERO)
        .max_backups(0)
        .on_error(move |e| sink_seen.lock().push(e.path().map(Path::to_path_buf)))
        .open()
        .await
        .unwrap();

    store.set("n", json!(1));
    tokio::time::timeout(Duration::from_secs(5), store.close())
        .await
        .expect("store never settled after a failed promotion");

    assert_eq!(store.stats().write_failures, 1);
    assert_eq!(*seen.lock(), vec![Some(path.clone())]);
    assert!(store.is_quiescent());

    std::fs::remove_dir_all(&path).unwrap();
    store.set("n", json!(2));
    store.flushed().await;
    store.close().await;

    assert_eq!(store.stats().writes_completed, 1);
    assert_eq!(read(&path).as_deref(), Some("{\n  \"n\": 2\n}"));
}
