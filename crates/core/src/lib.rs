//! Core types for keepfile
//!
//! This crate defines the foundational types shared by every layer:
//! - Error: the crate-wide error enum and `Result` alias
//! - StoreConfig: construction options, loadable from TOML
//! - Document: the in-memory JSON object and its canonical on-disk encoding

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod document;
pub mod error;

pub use config::{StoreConfig, DEFAULT_MAX_BACKUPS, DEFAULT_MIN_SAVE_INTERVAL_MS};
pub use document::{decode_document, encode_document, Document};
pub use error::{Error, ErrorSink, Result};
