//! Compliance validator
//!
//! Checks the minimal structural contract the extractor relies on. Anything
//! reported here is not reported again: the later stages substitute defaults
//! for it. They report only what this pass cannot see, such as unresolvable
//! schema references, uncoercible defaults and malformed server URLs.

use super::context::{JsonPointer, ParseContext};
use super::document::{
    str_field, OpenApiDocument, SpecVersion, CONTENT_FIELD, INFO_FIELD, OPENAPI_FIELD,
    OPERATION_ID_FIELD, PARAMETERS_FIELD, PATHS_FIELD, RESPONSES_FIELD, SCHEMA_FIELD,
};
use openapi_operations_common::{HttpMethod, ParameterLocation, Result};
use serde_json::Value;
use std::collections::HashSet;
use std::ops::Deref;
use tracing::debug;

/// A document that passed validation (or whose violations were recorded)
#[derive(Debug, Clone)]
pub struct ValidatedDocument(OpenApiDocument);

impl Deref for ValidatedDocument {
    type Target = OpenApiDocument;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Validate `document` against the structural contract
pub fn validate(document: OpenApiDocument, ctx: &mut ParseContext) -> Result<ValidatedDocument> {
    let root = JsonPointer::root();

    validate_version(&document, ctx)?;
    validate_info(&document, ctx)?;

    match document.get(PATHS_FIELD) {
        Some(Value::Object(paths)) => {
            let mut operation_ids = HashSet::new();
            let paths_pointer = root.join(PATHS_FIELD);

            for (path, item) in paths {
                let pointer = paths_pointer.join(path);
                validate_path_item(&document, path, item, &pointer, &mut operation_ids, ctx)?;
            }

            debug!(
                paths = paths.len(),
                operations = operation_ids.len(),
                "validated document"
            );
        },
        Some(_) => ctx.report(&root.join(PATHS_FIELD), "paths must be an object")?,
        None => ctx.report(&root.join(PATHS_FIELD), "missing paths object")?,
    }

    Ok(ValidatedDocument(document))
}

fn validate_version(document: &OpenApiDocument, ctx: &mut ParseContext) -> Result<()> {
    let pointer = JsonPointer::root().join(OPENAPI_FIELD);

    let version = document.version();
    if version.is_supported() {
        return Ok(());
    }

    match version {
        SpecVersion::Missing => ctx.report(&pointer, "missing OpenAPI version"),
        other => ctx.report(&pointer, format!("unsupported document version: {}", other)),
    }
}

fn validate_info(document: &OpenApiDocument, ctx: &mut ParseContext) -> Result<()> {
    let pointer = JsonPointer::root().join(INFO_FIELD);

    let Some(info) = document.get(INFO_FIELD) else {
        return ctx.report(&pointer, "missing info object");
    };

    if !info.is_object() {
        return ctx.report(&pointer, "info must be an object");
    }

    for field in ["title", "version"] {
        if str_field(info, field).is_none() {
            ctx.report(&pointer.join(field), format!("info is missing {}", field))?;
        }
    }

    Ok(())
}

fn validate_path_item(
    document: &OpenApiDocument,
    path: &str,
    item: &Value,
    pointer: &JsonPointer,
    operation_ids: &mut HashSet<String>,
    ctx: &mut ParseContext,
) -> Result<()> {
    if !path.starts_with('/') {
        ctx.report(pointer, format!("path {} must begin with '/'", path))?;
    }

    let Value::Object(item) = item else {
        return ctx.report(pointer, "path item must be an object");
    };

    if let Some(parameters) = item.get(PARAMETERS_FIELD) {
        validate_parameters(document, parameters, &pointer.join(PARAMETERS_FIELD), ctx)?;
    }

    for (key, operation) in item {
        if HttpMethod::from_key(key).is_none() {
            continue;
        }

        let pointer = pointer.join(key);
        let Value::Object(fields) = operation else {
            ctx.report(&pointer, "operation must be an object")?;
            continue;
        };

        if !fields.get(RESPONSES_FIELD).is_some_and(Value::is_object) {
            ctx.report(&pointer.join(RESPONSES_FIELD), "operation is missing responses")?;
        }

        match fields.get(OPERATION_ID_FIELD).and_then(Value::as_str) {
            Some(id) if !id.trim().is_empty() => {
                if !operation_ids.insert(id.to_string()) {
                    ctx.report(
                        &pointer.join(OPERATION_ID_FIELD),
                        format!("duplicate operationId {}", id),
                    )?;
                }
            },
            _ => ctx.report(
                &pointer.join(OPERATION_ID_FIELD),
                "operation is missing operationId",
            )?,
        }

        if let Some(parameters) = fields.get(PARAMETERS_FIELD) {
            validate_parameters(document, parameters, &pointer.join(PARAMETERS_FIELD), ctx)?;
        }
    }

    Ok(())
}

fn validate_parameters(
    document: &OpenApiDocument,
    parameters: &Value,
    pointer: &JsonPointer,
    ctx: &mut ParseContext,
) -> Result<()> {
    let Value::Array(parameters) = parameters else {
        return ctx.report(pointer, "parameters must be an array");
    };

    let mut seen: HashSet<(String, String)> = HashSet::new();

    for (index, parameter) in parameters.iter().enumerate() {
        let pointer = pointer.join(index.to_string());

        let parameter = match document.follow_refs(parameter) {
            Ok(followed) => followed.node,
            Err(e) => {
                ctx.report(&pointer, e.to_string())?;
                continue;
            },
        };

        if !parameter.is_object() {
            ctx.report(&pointer, "parameter must be an object")?;
            continue;
        }

        let name = str_field(parameter, "name");
        let location = str_field(parameter, "in");

        let (Some(name), Some(location)) = (name, location) else {
            ctx.report(&pointer, "parameter must declare name and in")?;
            continue;
        };

        if ParameterLocation::from_openapi(location).is_none() {
            ctx.report(
                &pointer.join("in"),
                format!("unsupported location {} for parameter {}", location, name),
            )?;
            continue;
        }

        if !seen.insert((name.to_string(), location.to_string())) {
            ctx.report(
                &pointer,
                format!("parameter {} is declared twice in {}", name, location),
            )?;
        }

        if parameter.get(SCHEMA_FIELD).is_none() && parameter.get(CONTENT_FIELD).is_none() {
            ctx.report(
                &pointer,
                format!("parameter {} has neither schema nor content", name),
            )?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use openapi_operations_common::ParserError;
    use serde_json::json;

    fn document(value: Value) -> OpenApiDocument {
        match value {
            Value::Object(map) => OpenApiDocument::new(map),
            _ => panic!("test document must be an object"),
        }
    }

    fn minimal() -> Value {
        json!({
            "openapi": "3.0.1",
            "info": {"title": "Test", "version": "1.0"},
            "paths": {
                "/items": {
                    "get": {
                        "operationId": "ListItems",
                        "parameters": [
                            {"name": "limit", "in": "query", "schema": {"type": "integer"}}
                        ],
                        "responses": {"200": {"description": "OK"}}
                    }
                }
            }
        })
    }

    fn violation_of(value: Value) -> String {
        let mut ctx = ParseContext::new(false);
        match validate(document(value), &mut ctx) {
            Err(ParserError::NonCompliantDocument(v)) => v.to_string(),
            other => panic!("expected violation, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_minimal_document_is_compliant() {
        let mut ctx = ParseContext::new(false);
        assert!(validate(document(minimal()), &mut ctx).is_ok());
        assert!(ctx.violations().is_empty());
    }

    #[test]
    fn test_missing_paths() {
        let mut doc = minimal();
        doc.as_object_mut().unwrap().remove("paths");
        assert_eq!(violation_of(doc), "missing paths object (at /paths)");
    }

    #[test]
    fn test_missing_responses() {
        let mut doc = minimal();
        doc["paths"]["/items"]["get"]
            .as_object_mut()
            .unwrap()
            .remove("responses");
        assert_eq!(
            violation_of(doc),
            "operation is missing responses (at /paths/~1items/get/responses)"
        );
    }

    #[test]
    fn test_missing_operation_id() {
        let mut doc = minimal();
        doc["paths"]["/items"]["get"]
            .as_object_mut()
            .unwrap()
            .remove("operationId");
        assert!(violation_of(doc).starts_with("operation is missing operationId"));
    }

    #[test]
    fn test_duplicate_operation_id() {
        let mut doc = minimal();
        doc["paths"]["/other"] = json!({
            "get": {"operationId": "ListItems", "responses": {}}
        });
        assert!(violation_of(doc).starts_with("duplicate operationId ListItems"));
    }

    #[test]
    fn test_unsupported_version() {
        let mut doc = minimal();
        doc.as_object_mut().unwrap().remove("openapi");
        doc["swagger"] = json!("2.0");
        assert!(violation_of(doc).contains("Swagger 2.0"));
    }

    #[test]
    fn test_version_gate() {
        let mut doc = minimal();
        doc["openapi"] = json!("3.1.0");
        let mut ctx = ParseContext::new(false);
        assert!(validate(document(doc.clone()), &mut ctx).is_ok());

        doc.as_object_mut().unwrap().remove("openapi");
        assert_eq!(violation_of(doc), "missing OpenAPI version (at /openapi)");
    }

    #[test]
    fn test_cookie_parameter_is_unsupported() {
        let mut doc = minimal();
        doc["paths"]["/items"]["get"]["parameters"] = json!([
            {"name": "session", "in": "cookie", "schema": {"type": "string"}}
        ]);
        assert!(violation_of(doc).starts_with("unsupported location cookie"));
    }

    #[test]
    fn test_unresolvable_parameter_ref() {
        let mut doc = minimal();
        doc["paths"]["/items"]["get"]["parameters"] =
            json!([{"$ref": "#/components/parameters/Missing"}]);
        assert!(violation_of(doc).contains("does not resolve"));
    }

    #[test]
    fn test_lenient_collects_every_violation() {
        let doc = json!({
            "openapi": "3.0.1",
            "paths": {
                "items": {
                    "get": {"parameters": [{"in": "query"}]}
                }
            }
        });

        let mut ctx = ParseContext::new(true);
        let validated = validate(document(doc), &mut ctx).unwrap();
        assert!(validated.get("paths").is_some());

        let pointers: Vec<&str> = ctx
            .violations()
            .iter()
            .map(|v| v.pointer.as_str())
            .collect();
        assert_eq!(
            pointers,
            vec![
                "/info",
                "/paths/items",
                "/paths/items/get/responses",
                "/paths/items/get/operationId",
                "/paths/items/get/parameters/0",
            ]
        );
    }
}
