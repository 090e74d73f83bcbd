//! The persisted document and its canonical encoding
//!
//! The on-disk form is UTF-8 JSON, pretty-printed with a two-space indent.
//! Byte-for-byte stability matters only for change detection: the engine
//! skips a physical write when the new encoding equals the last one that
//! reached disk.

use crate::error::{Error, Result};
use serde_json::{Map, Value};

/// The in-memory document: always a JSON object at the root.
pub type Document = Map<String, Value>;

/// Encode a document in its canonical on-disk form.
pub fn encode_document(document: &Document) -> Result<String> {
    serde_json::to_string_pretty(document).map_err(Error::from)
}

/// Decode a document from on-disk text.
///
/// Text that parses as JSON but whose root is not an object is rejected.
pub fn decode_document(text: &str) -> Result<Document> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::Serialization(format!(
            "document root must be an object, found {}",
            type_name(&other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
