//! Atomic document replacement
//!
//! ## Write Sequence
//!
//! ```text
//! 1. write payload to s.json.tmp, fsync
//! 2. rotate_backups()          (failures logged, never fatal)
//! 3. rename s.json.tmp -> s.json
//! ```
//!
//! A crash before step 3 leaves the previous primary (or its backup) intact.
//! An orphaned temp file is never read and is overwritten by the next write.

use crate::chain::BackupChain;
use crate::rotate::{rotate_backups, RotationReport};
use keepfile_core::{Error, Result};
use std::path::Path;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Outcome of a completed write.
#[derive(Debug)]
pub struct WriteReport {
    /// Payload size in bytes
    pub bytes: usize,
    /// What happened to the backup chain
    pub rotation: RotationReport,
}

/// Persist `payload` as the new primary file of `chain`.
///
/// Staging and promotion failures are returned; rotation failures are
/// carried in the report.
pub async fn write_through(chain: &BackupChain, payload: &str) -> Result<WriteReport> {
    let temp = chain.temp();
    write_staged(&temp, payload).await?;

    let rotation = rotate_backups(chain).await;

    fs::rename(&temp, chain.primary())
        .await
        .map_err(|e| Error::io(chain.primary(), e))?;

    debug!(
        "Promoted {} bytes to {}",
        payload.len(),
        chain.primary().display()
    );
    Ok(WriteReport {
        bytes: payload.len(),
        rotation,
    })
}

async fn write_staged(path: &Path, payload: &str) -> Result<()> {
    let mut file = File::create(path).await.map_err(|e| Error::io(path, e))?;
    file.write_all(payload.as_bytes())
        .await
        .map_err(|e| Error::io(path, e))?;
    file.sync_all().await.map_err(|e| Error::io(path, e))?;
    Ok(())
}
