//! Convenient imports for keepfile.
//!
//! ```ignore
//! use keepfile::prelude::*;
//!
//! let store = Store::open("state.json").await?;
//! store.set("theme", json!("dark"));
//! ```

// Main entry point
pub use crate::{Store, StoreBuilder};

// Error handling
pub use crate::{Error, Result};

// Configuration and document
pub use crate::{Document, StoreConfig};

// Re-export serde_json for convenience
pub use serde_json::{json, Value};
