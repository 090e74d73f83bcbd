//! Engine for keepfile
//!
//! This crate ties the durability layer to an in-memory document:
//! - SaveState: the write scheduler state machine
//! - FlushNotifier: ordered waiters for the next quiescent point
//! - Store: accessors, save task, flush and close
//! - StoreBuilder: construction and error sink selection

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod flush;
pub mod scheduler;
pub mod stats;
pub mod store;

pub use builder::{log_error_sink, StoreBuilder};
pub use flush::{FlushBatch, FlushCallback, FlushNotifier};
pub use scheduler::{CooldownOutcome, SaveState};
pub use stats::StoreStats;
pub use store::Store;
