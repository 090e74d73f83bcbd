//! Write counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of a store's write activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Writes that reached disk
    pub writes_completed: u64,
    /// Saves resolved without writing (unchanged document or read-only)
    pub writes_skipped: u64,
    /// Writes that failed during staging or promotion
    pub write_failures: u64,
    /// Individual backup rotation operations that failed
    pub backup_failures: u64,
}

/// Lock-free counters behind [`StoreStats`].
#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    writes_completed: AtomicU64,
    writes_skipped: AtomicU64,
    write_failures: AtomicU64,
    backup_failures: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn record_completed(&self, backup_failures: usize) {
        self.writes_completed.fetch_add(1, Ordering::Relaxed);
        self.backup_failures
            .fetch_add(backup_failures as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_skipped(&self) {
        self.writes_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> StoreStats {
        StoreStats {
            writes_completed: self.writes_completed.load(Ordering::Relaxed),
            writes_skipped: self.writes_skipped.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            backup_failures: self.backup_failures.load(Ordering::Relaxed),
        }
    }
}
