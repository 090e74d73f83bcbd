//! Store: a JSON document persisted with throttled, coalesced writes
//!
//! ## Save Cycle
//!
//! ```text
//! set() ──▶ mark_dirty ──(first mutation only)──▶ spawn save task
//!                                                      │ next tick
//!                                                      ▼
//!                         encode document; unchanged or read-only? ──▶ notify, Idle
//!                                                      │
//!                                                      ▼
//!                         stage .tmp ▶ rotate backups ▶ rename onto primary
//!                                                      │
//!                                   nothing dirty? ──▶ notify waiters
//!                                                      │
//!                                                      ▼
//!                         sleep(min_save_interval)
//!                                                      │
//!                         dirty? ──▶ save again   else ──▶ notify, Idle
//! ```
//!
//! The cooldown is anchored to write completion, so `min_save_interval`
//! bounds write frequency regardless of how long each write takes.
//!
//! Flush waiters and the error sink are user code running on the save task.
//! Panics in either are caught so the save state always reaches `Idle`;
//! a panicking waiter is reported to the sink as [`Error::Callback`].
//!
//! ## Thread Safety
//!
//! `Store` is a cheap `Clone` handle and is `Send + Sync`. In-memory state
//! sits behind `parking_lot` mutexes that are never held across an await.
//! Coalescing of mutations made in one tick is exact on a current-thread
//! runtime; on a multi-thread runtime the save task may start sooner and
//! split a burst into two writes. No mutation is ever lost either way.

use crate::builder::StoreBuilder;
use crate::flush::{FlushBatch, FlushNotifier};
use crate::scheduler::{CooldownOutcome, SaveState};
use crate::stats::{StatsCounters, StoreStats};
use keepfile_core::{encode_document, Document, Error, ErrorSink, Result, StoreConfig};
use keepfile_durability::{load_document, write_through, BackupChain, LoadSource};
use parking_lot::{Mutex, MutexGuard};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{oneshot, Notify};
use tracing::{debug, error, info};

/// Handle to an open store.
///
/// # Example
///
/// ```ignore
/// use keepfile_engine::Store;
///
/// let store = Store::open("settings.json").await?;
/// let launches = store.get("launches", 0.into()).as_u64().unwrap_or(0);
/// store.set("launches", launches + 1);
/// store.flushed().await;
/// ```
#[derive(Clone)]
pub struct Store {
    shared: Arc<Shared>,
}

struct Shared {
    config: StoreConfig,
    chain: BackupChain,
    runtime: Handle,
    load_source: LoadSource,
    error_sink: ErrorSink,
    /// Lock order: `document` before `book`.
    document: Mutex<Document>,
    book: Mutex<Bookkeeping>,
    /// Signalled whenever the store returns to `Idle`.
    settled: Notify,
    stats: StatsCounters,
}

#[derive(Debug, Default)]
struct Bookkeeping {
    state: SaveState,
    /// Encoding of the last payload that reached disk, or the loaded text.
    last_serialized: String,
    waiters: FlushNotifier,
}

enum SaveStart {
    Write { payload: String, previous: String },
    Resolved(FlushBatch),
    NotScheduled,
}

impl Store {
    /// Open the store at `path` with default options.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        StoreBuilder::new(path).open().await
    }

    /// Open a store from a complete configuration.
    pub async fn open_with(config: StoreConfig) -> Result<Self> {
        StoreBuilder::from_config(config).open().await
    }

    /// Builder for a store at `path`.
    pub fn builder(path: impl AsRef<Path>) -> StoreBuilder {
        StoreBuilder::new(path)
    }

    pub(crate) async fn open_configured(config: StoreConfig, error_sink: ErrorSink) -> Result<Self> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|e| Error::Runtime(e.to_string()))?;
        let chain = BackupChain::new(&config.filename, config.max_backups);
        let loaded = load_document(&chain, &config.default_object).await;

        info!(
            "Opened store {} (source={:?}, keys={}, read_only={})",
            chain.primary().display(),
            loaded.source,
            loaded.document.len(),
            config.read_only
        );

        let book = Bookkeeping {
            last_serialized: loaded.raw.unwrap_or_default(),
            ..Default::default()
        };
        Ok(Store {
            shared: Arc::new(Shared {
                config,
                chain,
                runtime,
                load_source: loaded.source,
                error_sink,
                document: Mutex::new(loaded.document),
                book: Mutex::new(book),
                settled: Notify::new(),
                stats: StatsCounters::default(),
            }),
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Value at `key`, or `default` if the key is absent.
    pub fn get(&self, key: &str, default: Value) -> Value {
        self.shared
            .document
            .lock()
            .get(key)
            .cloned()
            .unwrap_or(default)
    }

    /// Value at `key` deserialized as `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let value = self.shared.document.lock().get(key).cloned();
        match value {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.shared.document.lock().contains_key(key)
    }

    /// Number of top-level keys.
    pub fn len(&self) -> usize {
        self.shared.document.lock().len()
    }

    /// True if the document has no keys.
    pub fn is_empty(&self) -> bool {
        self.shared.document.lock().is_empty()
    }

    /// Set `key` to `value` and schedule a save.
    ///
    /// Returns immediately; write failures go to the error sink.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.shared.document.lock().insert(key.into(), value.into());
        self.shared.request_save();
    }

    /// Like [`Store::set`], then call `on_persisted` at the next flush.
    pub fn set_with<F>(&self, key: impl Into<String>, value: impl Into<Value>, on_persisted: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.set(key, value);
        self.on_flush(on_persisted);
    }

    /// Serialize `value` into `key` and schedule a save.
    pub fn set_as<T: Serialize + ?Sized>(&self, key: impl Into<String>, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.set(key, value);
        Ok(())
    }

    /// Remove `key`, scheduling a save if it was present.
    pub fn remove(&self, key: &str) -> Option<Value> {
        let removed = self.shared.document.lock().remove(key);
        if removed.is_some() {
            self.shared.request_save();
        }
        removed
    }

    /// Like [`Store::remove`], then call `on_persisted` at the next flush.
    pub fn remove_with<F>(&self, key: &str, on_persisted: F) -> Option<Value>
    where
        F: FnOnce() + Send + 'static,
    {
        let removed = self.remove(key);
        self.on_flush(on_persisted);
        removed
    }

    /// The live document.
    ///
    /// Changes made through the guard are not saved until [`Store::save`] is
    /// called. Drop the guard before calling any other store method.
    pub fn document(&self) -> MutexGuard<'_, Document> {
        self.shared.document.lock()
    }

    /// Schedule a save of the current document.
    pub fn save(&self) {
        self.shared.request_save();
    }

    // ========================================================================
    // Flush
    // ========================================================================

    /// Call `callback` once the store next becomes consistent on disk.
    ///
    /// If the store is already quiescent the callback runs on the next tick,
    /// never synchronously.
    pub fn on_flush<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut book = self.shared.book.lock();
        if book.state.is_quiescent() {
            drop(book);
            let shared = Arc::clone(&self.shared);
            self.shared.runtime.spawn(async move {
                shared.deliver(FlushBatch::single(Box::new(callback)));
            });
        } else {
            book.waiters.register(Box::new(callback));
        }
    }

    /// Wait for the next flush.
    pub async fn flushed(&self) {
        let (tx, rx) = oneshot::channel();
        self.on_flush(move || {
            let _ = tx.send(());
        });
        let _ = rx.await;
    }

    /// Wait until no write is in flight, no cooldown is running and nothing
    /// is dirty. The store remains usable afterwards.
    pub async fn close(&self) {
        loop {
            let settled = self.shared.settled.notified();
            tokio::pin!(settled);
            settled.as_mut().enable();
            if self.shared.book.lock().state.is_quiescent() {
                return;
            }
            settled.await;
        }
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Current save state.
    pub fn state(&self) -> SaveState {
        self.shared.book.lock().state
    }

    /// No write in flight and nothing dirty.
    pub fn is_quiescent(&self) -> bool {
        self.state().is_quiescent()
    }

    /// Write counters.
    pub fn stats(&self) -> StoreStats {
        self.shared.stats.snapshot()
    }

    /// Which file the document was loaded from.
    pub fn load_source(&self) -> LoadSource {
        self.shared.load_source
    }

    /// Primary file path.
    pub fn path(&self) -> &Path {
        self.shared.chain.primary()
    }

    /// Options the store was opened with.
    pub fn config(&self) -> &StoreConfig {
        &self.shared.config
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.shared.chain.primary())
            .field("state", &self.state())
            .field("load_source", &self.shared.load_source)
            .finish()
    }
}

impl Shared {
    fn request_save(self: &Arc<Self>) {
        let spawn = self.book.lock().state.mark_dirty();
        if spawn {
            let shared = Arc::clone(self);
            self.runtime.spawn(shared.run_save());
        }
    }

    async fn run_save(self: Arc<Self>) {
        loop {
            let (payload, previous) = match self.begin_save() {
                SaveStart::Write { payload, previous } => (payload, previous),
                SaveStart::Resolved(batch) => {
                    self.deliver(batch);
                    self.settled.notify_waiters();
                    return;
                }
                SaveStart::NotScheduled => return,
            };

            debug!(
                "Writing {} bytes to {}",
                payload.len(),
                self.chain.primary().display()
            );
            match write_through(&self.chain, &payload).await {
                Ok(report) => {
                    self.stats.record_completed(report.rotation.failures.len());
                    let batch = {
                        let mut book = self.book.lock();
                        if book.state.is_dirty() || book.waiters.is_empty() {
                            FlushBatch::empty()
                        } else {
                            book.waiters.drain()
                        }
                    };
                    self.deliver(batch);
                }
                Err(e) => {
                    self.stats.record_failed();
                    self.book.lock().last_serialized = previous;
                    self.report(&e);
                }
            }

            tokio::time::sleep(self.config.min_save_interval()).await;

            let settled = {
                let mut book = self.book.lock();
                match book.state.finish_cooldown() {
                    CooldownOutcome::Resave => None,
                    CooldownOutcome::Settled => Some(book.waiters.drain()),
                }
            };
            match settled {
                Some(batch) => {
                    self.deliver(batch);
                    self.settled.notify_waiters();
                    return;
                }
                None => debug!(
                    "Mutations arrived during write of {}, saving again",
                    self.chain.primary().display()
                ),
            }
        }
    }

    /// Run drained waiters and report any that panicked.
    fn deliver(&self, batch: FlushBatch) {
        for message in batch.notify() {
            self.report(&Error::Callback(message));
        }
    }

    /// Hand `e` to the error sink. A panicking sink is logged and ignored.
    fn report(&self, e: &Error) {
        let sink = &self.error_sink;
        if panic::catch_unwind(AssertUnwindSafe(|| sink(e))).is_err() {
            error!(
                "Error sink panicked while reporting failure on {}: {}",
                self.chain.primary().display(),
                e
            );
        }
    }

    fn begin_save(&self) -> SaveStart {
        let document = self.document.lock();
        let mut book = self.book.lock();
        if book.state != SaveState::Scheduled {
            return SaveStart::NotScheduled;
        }

        if self.config.read_only {
            book.state.skip();
            self.stats.record_skipped();
            return SaveStart::Resolved(book.waiters.drain());
        }

        let payload = match encode_document(&document) {
            Ok(payload) => payload,
            Err(e) => {
                book.state.skip();
                let batch = book.waiters.drain();
                drop(book);
                drop(document);
                self.stats.record_failed();
                self.report(&e);
                return SaveStart::Resolved(batch);
            }
        };
        drop(document);

        if payload == book.last_serialized {
            debug!(
                "Skipping write of {}: unchanged",
                self.chain.primary().display()
            );
            book.state.skip();
            self.stats.record_skipped();
            return SaveStart::Resolved(book.waiters.drain());
        }

        book.state.begin_write();
        let previous = mem::replace(&mut book.last_serialized, payload.clone());
        SaveStart::Write { payload, previous }
    }
}
