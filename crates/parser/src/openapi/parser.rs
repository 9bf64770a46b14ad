//! OpenAPI document parser

use super::context::ParseContext;
use super::document::REQUEST_BODY_FIELD;
use super::extractor::{extract_operations, RawOperation};
use super::loader;
use super::parameters::resolve_parameters;
use super::payload;
use super::server::resolve_server_url;
use super::validator::{validate, ValidatedDocument};
use openapi_operations_common::{
    ComplianceViolation, ParserError, ParserOptions, RestApiOperation, Result,
};
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;
use url::Url;

/// Parses OpenAPI 3.x documents into REST API operations
///
/// The parser holds only its options; every call works on its own copy of
/// the document, so one parser can be shared between threads.
#[derive(Debug, Clone, Default)]
pub struct OpenApiDocumentParser {
    options: ParserOptions,
}

/// Operations together with the violations absorbed in lenient mode
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseReport {
    pub operations: Vec<RestApiOperation>,

    /// Always empty for strict parses
    pub violations: Vec<ComplianceViolation>,
}

impl OpenApiDocumentParser {
    /// Strict parser with default options
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, options: ParserOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Parse a document from `reader`
    ///
    /// # Example
    /// ```rust
    /// use openapi_operations_parser::openapi::OpenApiDocumentParser;
    ///
    /// let document = r#"{
    ///     "openapi": "3.0.1",
    ///     "info": {"title": "Pets", "version": "1.0"},
    ///     "servers": [{"url": "https://pets.example.com"}],
    ///     "paths": {
    ///         "/pets": {
    ///             "get": {"operationId": "ListPets", "responses": {"200": {"description": "OK"}}}
    ///         }
    ///     }
    /// }"#;
    ///
    /// let operations = OpenApiDocumentParser::new().parse(document.as_bytes())?;
    /// assert_eq!(operations.len(), 1);
    /// assert_eq!(operations[0].id(), "ListPets");
    /// assert_eq!(operations[0].parameters()[0].name, "server-url");
    /// # Ok::<(), openapi_operations_parser::ParserError>(())
    /// ```
    pub fn parse<R: Read>(&self, reader: R) -> Result<Vec<RestApiOperation>> {
        self.parse_with_report(reader).map(|report| report.operations)
    }

    /// Parse a document from `reader`, keeping the absorbed violations
    pub fn parse_with_report<R: Read>(&self, reader: R) -> Result<ParseReport> {
        let document = loader::load(reader)?;
        let mut ctx = ParseContext::new(self.options.ignore_non_compliant_errors);

        let document = validate(document, &mut ctx)?;
        let server_url = resolve_server_url(&document, &mut ctx)?;

        let mut operations = Vec::new();
        for raw in extract_operations(&document, &mut ctx)? {
            if self.options.is_excluded(&raw.id) {
                debug!(operation_id = %raw.id, "skipping excluded operation");
                continue;
            }

            operations.push(build_operation(&raw, server_url.as_ref(), &document, &mut ctx)?);
        }

        debug!(
            operations = operations.len(),
            violations = ctx.violations().len(),
            "parsed OpenAPI document"
        );

        Ok(ParseReport {
            operations,
            violations: ctx.into_violations(),
        })
    }

    /// Parse the document stored at `path`
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<ParseReport> {
        let file = File::open(path.as_ref()).map_err(|e| {
            ParserError::MalformedDocument(format!(
                "Failed to read OpenAPI file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        self.parse_with_report(file)
    }
}

/// Parse a document with default options apart from strictness
pub fn parse_document<R: Read>(
    reader: R,
    ignore_non_compliant_errors: bool,
) -> Result<Vec<RestApiOperation>> {
    OpenApiDocumentParser::new()
        .with_options(
            ParserOptions::default().with_ignore_non_compliant_errors(ignore_non_compliant_errors),
        )
        .parse(reader)
}

fn build_operation(
    raw: &RawOperation<'_>,
    server_url: Option<&Url>,
    document: &ValidatedDocument,
    ctx: &mut ParseContext,
) -> Result<RestApiOperation> {
    let parameters = resolve_parameters(raw, server_url, document, ctx)?;

    let payload = match raw.request_body {
        Some(body) => payload::walk(
            body,
            &raw.pointer.join(REQUEST_BODY_FIELD),
            document,
            ctx,
        )?,
        None => None,
    };

    Ok(RestApiOperation::new(raw.id.clone(), raw.method, raw.path)
        .with_summary(raw.summary.map(str::to_string))
        .with_description(raw.description.map(str::to_string))
        .with_server_url(server_url.cloned())
        .with_tags(raw.tags.clone())
        .with_parameters(parameters)
        .with_payload(payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use openapi_operations_common::ParameterLocation;

    const MINIMAL: &str = r#"{
        "openapi": "3.0.0",
        "info": {"title": "Test API", "version": "1.0.0"},
        "paths": {
            "/items/{id}": {
                "get": {
                    "operationId": "GetItem",
                    "summary": "Get one item",
                    "parameters": [{"name": "id", "in": "path", "schema": {"type": "string"}}],
                    "responses": {"200": {"description": "OK"}}
                },
                "delete": {
                    "operationId": "DeleteItem",
                    "parameters": [{"name": "id", "in": "path", "schema": {"type": "string"}}],
                    "responses": {"204": {"description": "Deleted"}}
                }
            }
        }
    }"#;

    #[test]
    fn test_parse_minimal_document() {
        let operations = OpenApiDocumentParser::new()
            .parse(MINIMAL.as_bytes())
            .unwrap();

        assert_eq!(operations.len(), 2);

        let get = &operations[0];
        assert_eq!(get.id(), "GetItem");
        assert_eq!(get.path(), "/items/{id}");
        assert_eq!(get.summary(), Some("Get one item"));
        assert!(get.server_url().is_none());
        assert!(get.payload().is_none());
        assert_eq!(get.parameters().len(), 1);
        assert!(get.parameter(ParameterLocation::Path, "id").is_some());
    }

    #[test]
    fn test_excluded_operations_are_skipped() {
        let parser = OpenApiDocumentParser::new()
            .with_options(ParserOptions::default().with_excluded_operations(["DeleteItem"]));

        let operations = parser.parse(MINIMAL.as_bytes()).unwrap();
        let ids: Vec<&str> = operations.iter().map(|o| o.id()).collect();
        assert_eq!(ids, vec!["GetItem"]);
    }

    #[test]
    fn test_strict_report_has_no_violations() {
        let report = OpenApiDocumentParser::new()
            .parse_with_report(MINIMAL.as_bytes())
            .unwrap();
        assert!(report.violations.is_empty());
    }

    #[test]
    fn test_parse_document_lenient_flag() {
        let document = r#"{"openapi": "3.0.0", "paths": {"/a": {"get": {}}}}"#;

        assert!(matches!(
            parse_document(document.as_bytes(), false),
            Err(ParserError::NonCompliantDocument(_))
        ));

        let operations = parse_document(document.as_bytes(), true).unwrap();
        assert_eq!(operations.len(), 1);
        assert_eq!(operations[0].id(), "GET:/a");
    }

    #[test]
    fn test_parse_missing_file() {
        let result = OpenApiDocumentParser::new().parse_file("does/not/exist.json");
        assert!(matches!(result, Err(ParserError::MalformedDocument(_))));
    }

    #[test]
    fn test_parser_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<OpenApiDocumentParser>();
    }
}
