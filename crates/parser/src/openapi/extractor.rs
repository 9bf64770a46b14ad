//! Operation extraction
//!
//! Enumerates every (path, method) pair in document order. Raw operations
//! borrow their parameter and request body nodes from the document; they are
//! turned into owned [`RestApiOperation`](openapi_operations_common::RestApiOperation)s
//! by the parser.

use super::context::{JsonPointer, ParseContext};
use super::document::{
    DESCRIPTION_FIELD, OPERATION_ID_FIELD, PARAMETERS_FIELD, PATHS_FIELD, REQUEST_BODY_FIELD,
};
use super::validator::ValidatedDocument;
use openapi_operations_common::{HttpMethod, Result};
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::debug;

/// One (path, method) pair with its unmerged declarations
#[derive(Debug, Clone)]
pub struct RawOperation<'a> {
    /// Declared operation id, or a synthesized one in lenient mode
    pub id: String,

    pub method: HttpMethod,

    /// Path template as declared
    pub path: &'a str,

    /// Location of the operation object in the document
    pub pointer: JsonPointer,

    pub summary: Option<&'a str>,

    pub description: Option<&'a str>,

    pub tags: Vec<String>,

    /// Parameters declared on the enclosing path item
    pub path_parameters: &'a [Value],

    /// Parameters declared on the operation itself
    pub operation_parameters: &'a [Value],

    pub request_body: Option<&'a Value>,
}

/// Extract every operation of the document
pub fn extract_operations<'a>(
    document: &'a ValidatedDocument,
    ctx: &mut ParseContext,
) -> Result<Vec<RawOperation<'a>>> {
    let Some(Value::Object(paths)) = document.get(PATHS_FIELD) else {
        return Ok(Vec::new());
    };

    let paths_pointer = JsonPointer::root().join(PATHS_FIELD);
    let mut ids = HashSet::new();
    let mut operations = Vec::new();

    for (path, item) in paths {
        let Value::Object(item) = item else {
            continue;
        };

        let path_parameters = parameters_of(item);

        for (key, operation) in item {
            let (Some(method), Value::Object(operation)) = (HttpMethod::from_key(key), operation)
            else {
                continue;
            };

            let pointer = paths_pointer.join(path).join(key);
            let id = operation_id(operation, method, path, &mut ids, ctx);

            debug!(operation_id = %id, %method, path = %path, "extracted operation");

            operations.push(RawOperation {
                id,
                method,
                path,
                pointer,
                summary: str_field_of(operation, "summary"),
                description: str_field_of(operation, DESCRIPTION_FIELD),
                tags: tags_of(operation),
                path_parameters,
                operation_parameters: parameters_of(operation),
                request_body: operation.get(REQUEST_BODY_FIELD),
            });
        }
    }

    Ok(operations)
}

/// Id used when an operation has no usable `operationId`: `GET:/items/{id}`
pub fn synthesize_operation_id(method: HttpMethod, path: &str) -> String {
    format!("{}:{}", method, path)
}

/// Declared id, or a synthesized one if it is missing or already taken
///
/// Missing and duplicate ids were reported by the validator, so this only
/// substitutes.
fn operation_id(
    operation: &Map<String, Value>,
    method: HttpMethod,
    path: &str,
    ids: &mut HashSet<String>,
    ctx: &ParseContext,
) -> String {
    if let Some(id) = operation
        .get(OPERATION_ID_FIELD)
        .and_then(Value::as_str)
        .filter(|id| !id.trim().is_empty())
    {
        if ids.insert(id.to_string()) {
            return id.to_string();
        }
    }

    let base = synthesize_operation_id(method, path);
    let mut candidate = base.clone();
    let mut n = 2;
    while !ids.insert(candidate.clone()) {
        candidate = format!("{}_{}", base, n);
        n += 1;
    }

    debug!(
        operation_id = %candidate,
        lenient = ctx.is_lenient(),
        "synthesized operation id"
    );
    candidate
}

fn parameters_of(node: &Map<String, Value>) -> &[Value] {
    node.get(PARAMETERS_FIELD)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn str_field_of<'a>(node: &'a Map<String, Value>, field: &str) -> Option<&'a str> {
    node.get(field).and_then(Value::as_str)
}

fn tags_of(operation: &Map<String, Value>) -> Vec<String> {
    operation
        .get("tags")
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openapi::document::OpenApiDocument;
    use crate::openapi::validator::validate;
    use serde_json::json;

    fn validated(value: Value, lenient: bool) -> (ValidatedDocument, ParseContext) {
        let Value::Object(map) = value else {
            panic!("test document must be an object");
        };
        let mut ctx = ParseContext::new(lenient);
        let document = validate(OpenApiDocument::new(map), &mut ctx).unwrap();
        (document, ctx)
    }

    #[test]
    fn test_extracts_every_path_and_method_in_order() {
        let (doc, mut ctx) = validated(
            json!({
                "openapi": "3.0.1",
                "info": {"title": "t", "version": "1"},
                "paths": {
                    "/secrets/{secret-name}": {
                        "parameters": [
                            {
                                "name": "secret-name", "in": "path", "required": true,
                                "schema": {"type": "string"}
                            }
                        ],
                        "summary": "shared",
                        "get": {"operationId": "GetSecret", "responses": {}},
                        "put": {
                            "operationId": "SetSecret",
                            "tags": ["secrets"],
                            "requestBody": {"content": {"text/plain": {}}},
                            "responses": {}
                        },
                        "x-internal": true
                    },
                    "/health": {
                        "head": {"operationId": "Ping", "responses": {}}
                    }
                }
            }),
            false,
        );

        let operations = extract_operations(&doc, &mut ctx).unwrap();
        let ids: Vec<&str> = operations.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["GetSecret", "SetSecret", "Ping"]);

        let put = &operations[1];
        assert_eq!(put.method, HttpMethod::Put);
        assert_eq!(put.path, "/secrets/{secret-name}");
        assert_eq!(put.path_parameters.len(), 1);
        assert!(put.operation_parameters.is_empty());
        assert!(put.request_body.is_some());
        assert_eq!(put.tags, vec!["secrets".to_string()]);
        assert_eq!(put.pointer.to_string(), "/paths/~1secrets~1{secret-name}/put");

        assert!(operations[0].request_body.is_none());
    }

    #[test]
    fn test_lenient_ids_are_synthesized() {
        let (doc, mut ctx) = validated(
            json!({
                "openapi": "3.0.1",
                "info": {"title": "t", "version": "1"},
                "paths": {
                    "/items": {
                        "get": {"responses": {}},
                        "post": {"operationId": "  ", "responses": {}}
                    },
                    "/other": {
                        "get": {"operationId": "GET:/items", "responses": {}}
                    }
                }
            }),
            true,
        );

        let operations = extract_operations(&doc, &mut ctx).unwrap();
        let ids: Vec<&str> = operations.iter().map(|o| o.id.as_str()).collect();
        // The declared id collides with the synthesized one from /items
        assert_eq!(ids, vec!["GET:/items", "POST:/items", "GET:/other"]);
    }

    #[test]
    fn test_lenient_duplicate_id_is_replaced() {
        let (doc, mut ctx) = validated(
            json!({
                "openapi": "3.0.1",
                "info": {"title": "t", "version": "1"},
                "paths": {
                    "/a": {"get": {"operationId": "Same", "responses": {}}},
                    "/b": {"get": {"operationId": "Same", "responses": {}}}
                }
            }),
            true,
        );

        let operations = extract_operations(&doc, &mut ctx).unwrap();
        assert_eq!(operations[0].id, "Same");
        assert_eq!(operations[1].id, "GET:/b");
        assert_eq!(ctx.violations().len(), 1);
    }

    #[test]
    fn test_lenient_without_paths() {
        let (doc, mut ctx) = validated(json!({"openapi": "3.0.1"}), true);
        assert!(extract_operations(&doc, &mut ctx).unwrap().is_empty());
    }
}
