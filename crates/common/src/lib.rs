//! Common types and utilities for OpenAPI Operations
//!
//! This crate contains the operation model produced by the parser, the
//! error taxonomy shared by the parser and CLI, and the parser options.

mod operation;
mod options;

pub use operation::{
    extract_headers, HttpMethod, ParameterLocation, ParameterStyle, RestApiOperation,
    RestApiOperationParameter, RestApiOperationPayload, RestApiOperationPayloadProperty,
};
pub use options::ParserOptions;

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Errors that can occur while parsing an OpenAPI document
#[derive(Error, Debug)]
pub enum ParserError {
    /// The input could not be read or is not a structured document.
    /// Always fatal, regardless of strictness.
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// The document violates the structural contract. Only raised in strict mode.
    #[error("Non-compliant document: {0}")]
    NonCompliantDocument(ComplianceViolation),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for parser operations
pub type Result<T> = std::result::Result<T, ParserError>;

/// A single structural contract violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplianceViolation {
    /// JSON pointer to the offending node (e.g. `/paths/~1pets/get`)
    pub pointer: String,

    /// What is wrong with it
    pub message: String,
}

impl ComplianceViolation {
    pub fn new(pointer: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            pointer: pointer.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ComplianceViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pointer.is_empty() {
            write!(f, "{} (at document root)", self.message)
        } else {
            write!(f, "{} (at {})", self.message, self.pointer)
        }
    }
}
