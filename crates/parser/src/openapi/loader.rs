//! Document loader
//!
//! Reads the input stream once and turns it into an [`OpenApiDocument`].
//! Anything that is not a readable JSON or YAML object is a
//! `MalformedDocument`, regardless of strictness.

use super::document::OpenApiDocument;
use openapi_operations_common::{ParserError, Result};
use serde_json::Value;
use std::io::Read;
use tracing::debug;

/// Read and deserialize a document from `reader`
pub fn load<R: Read>(mut reader: R) -> Result<OpenApiDocument> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).map_err(|e| {
        ParserError::MalformedDocument(format!("Failed to read OpenAPI document: {}", e))
    })?;

    load_slice(&bytes)
}

/// Deserialize a document from bytes already in memory
pub fn load_slice(bytes: &[u8]) -> Result<OpenApiDocument> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let value = if looks_like_json(bytes) {
        serde_json::from_slice::<Value>(bytes).map_err(|e| {
            ParserError::MalformedDocument(format!("Failed to parse OpenAPI JSON: {}", e))
        })?
    } else {
        serde_yaml::from_slice::<Value>(bytes).map_err(|e| {
            ParserError::MalformedDocument(format!("Failed to parse OpenAPI YAML: {}", e))
        })?
    };

    match value {
        Value::Object(root) => {
            let document = OpenApiDocument::new(root);
            debug!(version = %document.version(), "loaded OpenAPI document");
            Ok(document)
        },
        other => Err(ParserError::MalformedDocument(format!(
            "Expected a top-level object, found {}",
            kind_of(&other)
        ))),
    }
}

fn looks_like_json(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'{' || *b == b'[')
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "nothing",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
