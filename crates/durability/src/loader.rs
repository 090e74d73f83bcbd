//! Startup load with backup fallback
//!
//! Tries the primary file, then each backup from newest to oldest. The first
//! candidate that exists and decodes to a JSON object wins. If none does,
//! the caller's default document is used. Loading never fails.

use crate::chain::BackupChain;
use keepfile_core::{decode_document, Document};
use std::io::ErrorKind;
use tokio::fs;
use tracing::{debug, info, warn};

/// Where the loaded document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// The primary file
    Primary,
    /// Backup slot `n` (`s.json.n.bak`)
    Backup(usize),
    /// No candidate loaded; the default document was used
    Default,
}

/// Result of a load.
#[derive(Debug, Clone)]
pub struct Loaded {
    /// The document to start from
    pub document: Document,
    /// Raw text of the winning file, `None` for the default document
    pub raw: Option<String>,
    /// Which candidate won
    pub source: LoadSource,
}

/// Load the newest readable document in `chain`, falling back to `default`.
pub async fn load_document(chain: &BackupChain, default: &Document) -> Loaded {
    for (position, path) in chain.load_candidates().into_iter().enumerate() {
        let text = match fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No file at {}", path.display());
                continue;
            }
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                continue;
            }
        };

        match decode_document(&text) {
            Ok(document) => {
                let source = match position {
                    0 => LoadSource::Primary,
                    n => LoadSource::Backup(n - 1),
                };
                if source != LoadSource::Primary {
                    warn!("Recovered document from backup {}", path.display());
                } else {
                    info!("Loaded document from {}", path.display());
                }
                return Loaded {
                    document,
                    raw: Some(text),
                    source,
                };
            }
            Err(e) => warn!("Skipping unreadable {}: {}", path.display(), e),
        }
    }

    info!(
        "No loadable file for {}, starting from default document",
        chain.primary().display()
    );
    Loaded {
        document: default.clone(),
        raw: None,
        source: LoadSource::Default,
    }
}
