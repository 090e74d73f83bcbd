//! Store configuration
//!
//! ## Options
//!
//! | Option | Default | Meaning |
//! |--------|---------|---------|
//! | `filename` | (required) | Primary JSON file |
//! | `min_save_interval_ms` | 1000 | Minimum gap between the end of one write and the start of the next |
//! | `max_backups` | 3 | Number of rotated `.N.bak` files to retain |
//! | `read_only` | false | Never write to disk |
//! | `default_object` | `{}` | Document used when no candidate file loads |
//!
//! Configuration can be built in code or read from TOML:
//!
//! ```toml
//! filename = "state/settings.json"
//! min_save_interval_ms = 250
//! max_backups = 5
//!
//! [default_object]
//! theme = "dark"
//! ```

use crate::document::Document;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default minimum interval between physical writes, in milliseconds.
pub const DEFAULT_MIN_SAVE_INTERVAL_MS: u64 = 1000;

/// Default number of rotated backups.
pub const DEFAULT_MAX_BACKUPS: usize = 3;

/// Construction options for a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the primary JSON file
    pub filename: PathBuf,
    /// Minimum gap between consecutive writes (milliseconds)
    pub min_save_interval_ms: u64,
    /// Number of backup files kept beside the primary
    pub max_backups: usize,
    /// When set, mutations stay in memory and nothing is written
    pub read_only: bool,
    /// Initial document when neither the primary nor any backup loads
    pub default_object: Document,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            filename: PathBuf::new(),
            min_save_interval_ms: DEFAULT_MIN_SAVE_INTERVAL_MS,
            max_backups: DEFAULT_MAX_BACKUPS,
            read_only: false,
            default_object: Document::new(),
        }
    }
}

impl StoreConfig {
    /// Default options for the given primary file.
    pub fn new(filename: impl AsRef<Path>) -> Self {
        StoreConfig {
            filename: filename.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    /// Parse options from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: StoreConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse options from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_toml_str(&text)
    }

    /// Render options as TOML text accepted by [`StoreConfig::from_toml_str`].
    ///
    /// Fails if `default_object` holds a value TOML cannot express, such as `null`.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    /// Reject unusable option combinations.
    pub fn validate(&self) -> Result<()> {
        if self.filename.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("filename is required".to_string()));
        }
        if self.filename.file_name().is_none() {
            return Err(Error::InvalidConfig(format!(
                "filename {} does not name a file",
                self.filename.display()
            )));
        }
        Ok(())
    }

    /// Minimum gap between consecutive writes.
    pub fn min_save_interval(&self) -> Duration {
        Duration::from_millis(self.min_save_interval_ms)
    }
}
