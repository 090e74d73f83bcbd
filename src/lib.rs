//! # Keepfile
//!
//! Embedded key-value store backed by a single JSON file.
//!
//! Mutations land in memory immediately and are persisted in the
//! background: bursts are coalesced into one write, writes are spaced by a
//! minimum interval, and every write rotates a bounded chain of backups.
//!
//! ## Quick Start
//!
//! ```ignore
//! use keepfile::prelude::*;
//!
//! let store = Store::builder("state.json")
//!     .default_object(json!({"launches": 0}).as_object().cloned().unwrap_or_default())
//!     .open()
//!     .await?;
//!
//! let launches = store.get("launches", json!(0)).as_u64().unwrap_or(0);
//! store.set("launches", launches + 1);
//!
//! // Wait until the change is on disk
//! store.flushed().await;
//! ```
//!
//! ## On-Disk Layout
//!
//! | File | Contents |
//! |------|----------|
//! | `state.json` | Current document, pretty-printed |
//! | `state.json.0.bak` | Previous version |
//! | `state.json.N.bak` | Older versions, up to `max_backups` |
//! | `state.json.tmp` | Staging file, only present mid-write |
//!
//! ## Scope
//!
//! One process owns the file. There is no locking, querying or partial
//! update below whole-document granularity.

#![warn(missing_docs)]

pub mod prelude;

// Re-export main entry points
pub use keepfile_engine::{Store, StoreBuilder};

// Errors and configuration
pub use keepfile_core::{Document, Error, ErrorSink, Result, StoreConfig};

// Introspection types
pub use keepfile_durability::LoadSource;
pub use keepfile_engine::{SaveState, StoreStats};
