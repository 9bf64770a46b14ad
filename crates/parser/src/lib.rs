//! OpenAPI operation parsing
//!
//! This crate compiles an OpenAPI 3.x document into normalized REST API
//! operation descriptors (`RestApiOperation`) that a caller can invoke
//! without consulting the document again.
//!
//! ## Parsing Strategy
//!
//! The document is held as a `serde_json` tree rather than a typed model so
//! that non-compliant documents can still be walked in lenient mode:
//! - Structural violations are reported once, by the validator
//! - Later stages substitute defaults for anything already reported
//! - `$ref`s are resolved locally, with cycles cut to leaves
//!
//! Parameters are normalized per operation:
//! - path-level and operation-level declarations are merged
//! - `payload` and `content-type` are added for operations with a body
//! - `server-url` is added when the document declares a server

pub mod openapi;
mod type_mapper;

pub use openapi::{parse_document, OpenApiDocumentParser, ParseReport};
pub use openapi_operations_common::{
    extract_headers, ComplianceViolation, HttpMethod, ParameterLocation, ParameterStyle,
    ParserError, ParserOptions, RestApiOperation, RestApiOperationParameter,
    RestApiOperationPayload, RestApiOperationPayloadProperty, Result,
};
pub use type_mapper::TypeMapper;
