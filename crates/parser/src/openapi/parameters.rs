//! Parameter resolution
//!
//! Merges path-level and operation-level parameter declarations, normalizes
//! each into a [`RestApiOperationParameter`], and appends the synthesized
//! `payload`, `content-type` and `server-url` parameters.

use super::context::{JsonPointer, ParseContext};
use super::document::{
    str_field, OpenApiDocument, CONTENT_FIELD, DESCRIPTION_FIELD, PARAMETERS_FIELD, PATHS_FIELD,
    SCHEMA_FIELD,
};
use super::extractor::RawOperation;
use super::payload::has_json_media_type;
use crate::type_mapper::{TypeMapper, DEFAULT_TYPE};
use indexmap::IndexMap;
use openapi_operations_common::{
    ParameterLocation, ParameterStyle, RestApiOperationParameter, Result,
};
use serde_json::Value;
use url::Url;

type ParameterKey = (String, ParameterLocation);

/// Resolve the full parameter list of an operation
///
/// Declared parameters come first, in declaration order (path-level, then
/// operation-level). An operation-level parameter with the same name and
/// location as a path-level one replaces it in place. Synthesized parameters
/// follow.
pub fn resolve_parameters(
    raw: &RawOperation<'_>,
    server_url: Option<&Url>,
    document: &OpenApiDocument,
    ctx: &mut ParseContext,
) -> Result<Vec<RestApiOperationParameter>> {
    let mut merged: IndexMap<ParameterKey, RestApiOperationParameter> = IndexMap::new();

    let path_level = JsonPointer::root()
        .join(PATHS_FIELD)
        .join(raw.path)
        .join(PARAMETERS_FIELD);
    let operation_level = raw.pointer.join(PARAMETERS_FIELD);

    for (declarations, pointer) in [
        (raw.path_parameters, path_level),
        (raw.operation_parameters, operation_level),
    ] {
        for (index, declaration) in declarations.iter().enumerate() {
            let pointer = pointer.join(index.to_string());
            if let Some(parameter) = normalize_parameter(declaration, &pointer, document, ctx)? {
                merged.insert((parameter.name.clone(), parameter.location), parameter);
            }
        }
    }

    if let Some(body) = raw.request_body {
        let payload_type = if has_json_media_type(body, document) {
            "object"
        } else {
            "string"
        };
        push_synthesized(&mut merged, payload_parameter(payload_type));
        push_synthesized(&mut merged, content_type_parameter());
    }

    if let Some(url) = server_url {
        push_synthesized(&mut merged, server_url_parameter(url));
    }

    Ok(merged.into_values().collect())
}

/// The required body parameter carrying the raw request payload
///
/// `parameter_type` is `object` for JSON payloads and `string` for the rest.
pub fn payload_parameter(parameter_type: &str) -> RestApiOperationParameter {
    RestApiOperationParameter {
        description: Some(RestApiOperationParameter::PAYLOAD_DESCRIPTION.to_string()),
        ..RestApiOperationParameter::scalar(
            RestApiOperationParameter::PAYLOAD,
            ParameterLocation::Body,
            parameter_type,
            true,
        )
    }
}

/// The optional body parameter carrying the payload's media type
pub fn content_type_parameter() -> RestApiOperationParameter {
    RestApiOperationParameter {
        description: Some(RestApiOperationParameter::CONTENT_TYPE_DESCRIPTION.to_string()),
        ..RestApiOperationParameter::scalar(
            RestApiOperationParameter::CONTENT_TYPE,
            ParameterLocation::Body,
            "string",
            false,
        )
    }
}

/// The optional path parameter that can override the document's server URL
pub fn server_url_parameter(url: &Url) -> RestApiOperationParameter {
    RestApiOperationParameter {
        default_value: Some(Value::String(url.to_string())),
        description: Some(RestApiOperationParameter::SERVER_URL_DESCRIPTION.to_string()),
        ..RestApiOperationParameter::scalar(
            RestApiOperationParameter::SERVER_URL,
            ParameterLocation::Path,
            "string",
            false,
        )
    }
}

/// Synthesized parameters always go last and replace a declared namesake
fn push_synthesized(
    merged: &mut IndexMap<ParameterKey, RestApiOperationParameter>,
    parameter: RestApiOperationParameter,
) {
    let key = (parameter.name.clone(), parameter.location);
    merged.shift_remove(&key);
    merged.insert(key, parameter);
}

/// Normalize one declaration; `None` for declarations the validator rejected
fn normalize_parameter(
    declaration: &Value,
    pointer: &JsonPointer,
    document: &OpenApiDocument,
    ctx: &mut ParseContext,
) -> Result<Option<RestApiOperationParameter>> {
    let Ok(followed) = document.follow_refs(declaration) else {
        return Ok(None);
    };
    let node = followed.node;

    let (Some(name), Some(location)) = (
        str_field(node, "name"),
        str_field(node, "in").and_then(ParameterLocation::from_openapi),
    ) else {
        return Ok(None);
    };

    // Report against the declaration the reference led to
    let pointer = match followed.refs.last() {
        Some(reference) => JsonPointer::from_ref(reference),
        None => pointer.clone(),
    };

    let schema = parameter_schema(node, &pointer, document, ctx)?;
    let parameter_type = schema
        .map(TypeMapper::schema_type)
        .unwrap_or_else(|| DEFAULT_TYPE.to_string());

    let mut parameter = RestApiOperationParameter::scalar(
        name,
        location,
        parameter_type,
        location == ParameterLocation::Path
            || node.get("required").and_then(Value::as_bool).unwrap_or(false),
    );
    parameter.description = str_field(node, DESCRIPTION_FIELD).map(str::to_string);

    if parameter.is_array() {
        parameter.array_item_type = Some(array_item_type(schema, &pointer, document, ctx)?);
        parameter.style = Some(array_style(node, location, &pointer, ctx)?);
    }

    if let Some(default) = schema.and_then(|s| s.get("default")) {
        parameter.default_value = TypeMapper::coerce_default(default, &parameter.parameter_type);

        if parameter.default_value.is_none() && !default.is_null() {
            ctx.report(
                &pointer.join(SCHEMA_FIELD).join("default"),
                format!(
                    "default {} of parameter {} is not a valid {}",
                    default, name, parameter.parameter_type
                ),
            )?;
        }
    }

    Ok(Some(parameter))
}

/// The parameter's schema, taken from `schema` or from the first `content` entry
fn parameter_schema<'a>(
    node: &'a Value,
    pointer: &JsonPointer,
    document: &'a OpenApiDocument,
    ctx: &mut ParseContext,
) -> Result<Option<&'a Value>> {
    let (schema, schema_pointer) = match node.get(SCHEMA_FIELD) {
        Some(schema) => (schema, pointer.join(SCHEMA_FIELD)),
        None => {
            let first = node
                .get(CONTENT_FIELD)
                .and_then(Value::as_object)
                .and_then(|content| content.iter().next());

            match first.and_then(|(media_type, entry)| {
                entry.get(SCHEMA_FIELD).map(|schema| (media_type, schema))
            }) {
                Some((media_type, schema)) => (
                    schema,
                    pointer
                        .join(CONTENT_FIELD)
                        .join(media_type)
                        .join(SCHEMA_FIELD),
                ),
                None => return Ok(None),
            }
        },
    };

    match document.follow_refs(schema) {
        Ok(followed) => Ok(Some(followed.node)),
        Err(e) => {
            ctx.report(&schema_pointer, e.to_string())?;
            Ok(None)
        },
    }
}

fn array_item_type(
    schema: Option<&Value>,
    pointer: &JsonPointer,
    document: &OpenApiDocument,
    ctx: &mut ParseContext,
) -> Result<String> {
    let items_pointer = pointer.join(SCHEMA_FIELD).join("items");

    let Some(items) = schema.and_then(|s| s.get("items")) else {
        ctx.report(&items_pointer, "array parameter does not declare items")?;
        return Ok(DEFAULT_TYPE.to_string());
    };

    match document.follow_refs(items) {
        Ok(followed) => Ok(TypeMapper::schema_type(followed.node)),
        Err(e) => {
            ctx.report(&items_pointer, e.to_string())?;
            Ok(DEFAULT_TYPE.to_string())
        },
    }
}

fn array_style(
    node: &Value,
    location: ParameterLocation,
    pointer: &JsonPointer,
    ctx: &mut ParseContext,
) -> Result<ParameterStyle> {
    let Some(style) = str_field(node, "style") else {
        return Ok(ParameterStyle::default_for(location));
    };

    match ParameterStyle::from_openapi(style) {
        Some(style) => Ok(style),
        None => {
            ctx.report(
                &pointer.join("style"),
                format!("unsupported parameter style {}", style),
            )?;
            Ok(ParameterStyle::default_for(location))
        },
    }
}
