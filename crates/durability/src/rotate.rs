//! Backup rotation
//!
//! Runs after the new payload has been staged and before it is promoted.
//! Every file in the occupied run starting at the primary moves one
//! position older; if the run already fills the chain, the oldest backup is
//! deleted first. After rotation the primary position is free for the
//! staged file.
//!
//! ```text
//! before:  s.json=A  .0.bak=B  .1.bak=C        (max_backups = 2)
//! discard: .1.bak (C)
//! shift:   .0.bak -> .1.bak, s.json -> .0.bak
//! after:   .0.bak=A  .1.bak=B
//! ```
//!
//! A missing position ends the run: files past a gap are left where they are.
//! Individual failures are logged and collected but never abort the pass,
//! since promoting the new primary matters more than preserving history.

use crate::chain::BackupChain;
use keepfile_core::Error;
use std::path::Path;
use tokio::fs;
use tracing::{debug, warn};

/// Outcome of one rotation pass.
#[derive(Debug, Default)]
pub struct RotationReport {
    /// Files moved one position older
    pub shifted: usize,
    /// Whether the oldest backup was deleted to make room
    pub discarded: bool,
    /// File operations that failed
    pub failures: Vec<Error>,
}

impl RotationReport {
    /// True if every file operation succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Shift the backup chain one position older.
pub async fn rotate_backups(chain: &BackupChain) -> RotationReport {
    let mut report = RotationReport::default();
    let max = chain.max_backups();
    if max == 0 {
        return report;
    }

    let mut occupied = 0;
    while occupied <= max && exists(&chain.position(occupied)).await {
        occupied += 1;
    }

    if occupied > max {
        let oldest = chain.position(max);
        match fs::remove_file(&oldest).await {
            Ok(()) => report.discarded = true,
            Err(e) => {
                warn!("Failed to discard oldest backup {}: {}", oldest.display(), e);
                report.failures.push(Error::io(&oldest, e));
            }
        }
    }

    for position in (0..occupied.min(max)).rev() {
        let from = chain.position(position);
        let to = chain.position(position + 1);
        match fs::rename(&from, &to).await {
            Ok(()) => report.shifted += 1,
            Err(e) => {
                warn!(
                    "Failed to rotate {} to {}: {}",
                    from.display(),
                    to.display(),
                    e
                );
                report.failures.push(Error::io(&from, e));
            }
        }
    }

    debug!(
        "Rotated backups of {}: shifted={}, discarded={}, failures={}",
        chain.primary().display(),
        report.shifted,
        report.discarded,
        report.failures.len()
    );
    report
}

async fn exists(path: &Path) -> bool {
    match fs::try_exists(path).await {
        Ok(found) => found,
        Err(e) => {
            warn!("Could not check {}: {}", path.display(), e);
            false
        }
    }
}
