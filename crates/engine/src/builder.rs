//! Store construction

use crate::store::Store;
use keepfile_core::{Document, Error, ErrorSink, Result, StoreConfig};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::error;

/// Builder for store configuration.
///
/// # Example
///
/// ```ignore
/// // Settings file, saved at most every 250ms, five generations of history
/// let store = Store::builder("settings.json")
///     .min_save_interval(Duration::from_millis(250))
///     .max_backups(5)
///     .default_object(defaults)
///     .on_error(|e| eprintln!("settings not saved: {}", e))
///     .open()
///     .await?;
/// ```
pub struct StoreBuilder {
    config: StoreConfig,
    error_sink: Option<ErrorSink>,
}

impl StoreBuilder {
    /// Default options for a store at `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::from_config(StoreConfig::new(path))
    }

    /// Start from an existing configuration.
    pub fn from_config(config: StoreConfig) -> Self {
        StoreBuilder {
            config,
            error_sink: None,
        }
    }

    /// Minimum gap between the end of one write and the start of the next.
    ///
    /// Sub-millisecond precision is truncated; intervals beyond `u64::MAX`
    /// milliseconds saturate.
    pub fn min_save_interval(mut self, interval: Duration) -> Self {
        self.config.min_save_interval_ms =
            u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Number of `.N.bak` files to keep.
    pub fn max_backups(mut self, max_backups: usize) -> Self {
        self.config.max_backups = max_backups;
        self
    }

    /// Keep every mutation in memory and never write.
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.config.read_only = read_only;
        self
    }

    /// Document to start from when no file loads.
    pub fn default_object(mut self, document: Document) -> Self {
        self.config.default_object = document;
        self
    }

    /// Route background write failures to `sink` instead of the log.
    pub fn on_error<F>(mut self, sink: F) -> Self
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        let sink: ErrorSink = Arc::new(sink);
        self.error_sink = Some(sink);
        self
    }

    /// The configuration built so far.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Load the document and return the ready store.
    ///
    /// Must be called inside a tokio runtime; background writes run on it.
    pub async fn open(self) -> Result<Store> {
        let sink = self.error_sink.unwrap_or_else(log_error_sink);
        Store::open_configured(self.config, sink).await
    }
}

/// Default sink: log the failure and keep running.
pub fn log_error_sink() -> ErrorSink {
    Arc::new(|e: &Error| error!("Background write failed: {}", e))
}
