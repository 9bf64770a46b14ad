//! OpenAPI 3.x document parser
//!
//! Turns an OpenAPI 3.0/3.1 document (JSON or YAML) into a flat list of
//! [`RestApiOperation`](openapi_operations_common::RestApiOperation)s.
//!
//! ## Pipeline
//! 1. **Load**: read the stream once into an order-preserving JSON tree
//! 2. **Validate**: check the structural contract; strict parses stop at the
//!    first violation, lenient parses record it and continue
//! 3. **Resolve server**: first `servers` entry, resolved once per parse
//! 4. **Extract**: one raw operation per (path, method), in document order
//! 5. **Resolve parameters** and **walk the payload** of each operation
//!
//! ## Usage
//! ```rust,ignore
//! use openapi_operations_parser::openapi::OpenApiDocumentParser;
//! use openapi_operations_common::ParserOptions;
//!
//! let parser = OpenApiDocumentParser::new()
//!     .with_options(ParserOptions::default().with_ignore_non_compliant_errors(true));
//! let report = parser.parse_file("key-vault.json")?;
//! ```

mod context;
mod document;
mod extractor;
mod loader;
mod parameters;
mod parser;
mod payload;
mod server;
mod validator;

pub use context::{JsonPointer, ParseContext};
pub use document::{OpenApiDocument, RefError, SpecVersion};
pub use extractor::{extract_operations, synthesize_operation_id, RawOperation};
pub use loader::{load, load_slice};
pub use parameters::resolve_parameters;
pub use parser::{parse_document, OpenApiDocumentParser, ParseReport};
pub use payload::walk as walk_payload;
pub use server::resolve_server_url;
pub use validator::{validate, ValidatedDocument};
