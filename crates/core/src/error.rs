//! Error types for keepfile
//!
//! Load failures never surface through this type to callers; they are
//! recovered by falling back along the backup chain. Write failures are
//! delivered to an [`ErrorSink`] because the mutation that triggered them
//! has already returned.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// All keepfile errors.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O failure on a specific file
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File the operation targeted
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Document could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Construction options were rejected
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// No async runtime was available to drive background writes
    #[error("runtime error: {0}")]
    Runtime(String),

    /// A flush callback panicked
    #[error("flush callback panicked: {0}")]
    Callback(String),
}

/// Result type for keepfile operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Process-wide destination for errors raised by background writes.
pub type ErrorSink = Arc<dyn Fn(&Error) + Send + Sync>;

impl Error {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Check if this is an I/O error.
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io { .. })
    }

    /// Check if this is a configuration error.
    pub fn is_config(&self) -> bool {
        matches!(self, Error::InvalidConfig(_))
    }

    /// Path involved in the failure, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Error::Io { path, .. } => Some(path),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::InvalidConfig(e.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
