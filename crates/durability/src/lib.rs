//! Durability layer for keepfile
//!
//! This crate owns every interaction with the filesystem:
//! - BackupChain: naming of the primary, staging and `.N.bak` files
//! - Rotation: shifting the backup chain one slot older before each write
//! - Writer: stage to `.tmp`, rotate, promote by rename
//! - Loader: startup load falling back through the backup chain

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chain;
pub mod loader;
pub mod rotate;
pub mod writer;

pub use chain::BackupChain;
pub use loader::{load_document, LoadSource, Loaded};
pub use rotate::{rotate_backups, RotationReport};
pub use writer::{write_through, WriteReport};
