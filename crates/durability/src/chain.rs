//! Backup chain file naming
//!
//! A store owns one primary file and a bounded chain of older snapshots:
//!
//! ```text
//! position 0   s.json          (live)
//! position 1   s.json.0.bak    (previous)
//! position 2   s.json.1.bak
//! ...
//! position N   s.json.(N-1).bak (oldest retained)
//! ```
//!
//! plus a staging file `s.json.tmp` used for atomic replacement.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Paths of a primary file, its staging file and its backups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupChain {
    primary: PathBuf,
    max_backups: usize,
}

impl BackupChain {
    /// Chain for `primary` retaining at most `max_backups` backups.
    pub fn new(primary: impl AsRef<Path>, max_backups: usize) -> Self {
        BackupChain {
            primary: primary.as_ref().to_path_buf(),
            max_backups,
        }
    }

    /// The live file.
    pub fn primary(&self) -> &Path {
        &self.primary
    }

    /// Number of backup slots.
    pub fn max_backups(&self) -> usize {
        self.max_backups
    }

    /// Staging file written before promotion.
    pub fn temp(&self) -> PathBuf {
        self.with_suffix(".tmp")
    }

    /// Backup file for `slot` (0 is the most recent backup).
    pub fn backup(&self, slot: usize) -> PathBuf {
        self.with_suffix(&format!(".{}.bak", slot))
    }

    /// File at chain `position`: 0 is the primary, `n` is backup slot `n - 1`.
    pub fn position(&self, position: usize) -> PathBuf {
        match position {
            0 => self.primary.clone(),
            n => self.backup(n - 1),
        }
    }

    /// Every backup path, newest first.
    pub fn backups(&self) -> Vec<PathBuf> {
        (0..self.max_backups).map(|slot| self.backup(slot)).collect()
    }

    /// Files to try when loading, in preference order: primary, then backups newest first.
    pub fn load_candidates(&self) -> Vec<PathBuf> {
        let mut candidates = Vec::with_capacity(self.max_backups + 1);
        candidates.push(self.primary.clone());
        candidates.extend(self.backups());
        candidates
    }

    fn with_suffix(&self, suffix: &str) -> PathBuf {
        let mut name: OsString = self.primary.clone().into_os_string();
        name.push(suffix);
        PathBuf::from(name)
    }
}
