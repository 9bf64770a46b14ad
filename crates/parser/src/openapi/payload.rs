//! Payload schema walker
//!
//! Turns the schema of a request body into a tree of named, typed properties.
//! References are followed; a reference already on the current ancestor chain
//! ends the branch as a leaf.

use super::context::{JsonPointer, ParseContext};
use super::document::{
    str_field, Followed, OpenApiDocument, CONTENT_FIELD, DESCRIPTION_FIELD, SCHEMA_FIELD,
};
use crate::type_mapper::{TypeMapper, DEFAULT_TYPE};
use indexmap::IndexMap;
use openapi_operations_common::{RestApiOperationPayload, RestApiOperationPayloadProperty, Result};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, trace};

const JSON_MEDIA_TYPE: &str = "application/json";

/// Walk a request body declared at `pointer`
///
/// Returns `None` when the body declares no content.
pub fn walk<'a>(
    request_body: &'a Value,
    pointer: &JsonPointer,
    document: &'a OpenApiDocument,
    ctx: &mut ParseContext,
) -> Result<Option<RestApiOperationPayload>> {
    let body = match document.follow_refs(request_body) {
        Ok(followed) => followed,
        Err(e) => {
            ctx.report(pointer, e.to_string())?;
            return Ok(None);
        },
    };
    let body_pointer = resolved_pointer(&body, pointer);
    let body = body.node;

    let Some((media_type, entry)) = select_media_type(body) else {
        debug!(pointer = %body_pointer, "request body declares no content");
        return Ok(None);
    };

    let mut payload = RestApiOperationPayload {
        media_type: media_type.to_string(),
        description: str_field(body, DESCRIPTION_FIELD).map(str::to_string),
        properties: Vec::new(),
    };

    let Some(schema) = entry.get(SCHEMA_FIELD) else {
        return Ok(Some(payload));
    };

    let schema_pointer = body_pointer
        .join(CONTENT_FIELD)
        .join(media_type)
        .join(SCHEMA_FIELD);

    let schema = match document.follow_refs(schema) {
        Ok(followed) => followed,
        Err(e) => {
            ctx.report(&schema_pointer, e.to_string())?;
            return Ok(Some(payload));
        },
    };

    if TypeMapper::is_object(&TypeMapper::schema_type(schema.node)) {
        let pointer = resolved_pointer(&schema, &schema_pointer);
        let mut ancestors = schema.refs.clone();
        payload.properties = walk_properties(schema.node, &pointer, document, &mut ancestors, ctx)?;
    }

    Ok(Some(payload))
}

/// Whether the media type [`walk`] would select for `request_body` is JSON-like
///
/// Bodies that do not resolve or declare no content count as JSON; their
/// problems are reported by [`walk`].
pub(crate) fn has_json_media_type(request_body: &Value, document: &OpenApiDocument) -> bool {
    document
        .follow_refs(request_body)
        .ok()
        .and_then(|body| select_media_type(body.node))
        .map_or(true, |(media_type, _)| is_json(media_type))
}

/// `application/json`, else the first JSON-like media type, else the first one
fn select_media_type(body: &Value) -> Option<(&str, &Value)> {
    let content = body.get(CONTENT_FIELD)?.as_object()?;

    if let Some(entry) = content.get(JSON_MEDIA_TYPE) {
        return Some((JSON_MEDIA_TYPE, entry));
    }

    content
        .iter()
        .find(|(media_type, _)| is_json(media_type))
        .or_else(|| content.iter().next())
        .map(|(media_type, entry)| (media_type.as_str(), entry))
}

fn is_json(media_type: &str) -> bool {
    media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
        .ends_with("json")
}

/// Properties and required names of an object schema, with `allOf` merged in
#[derive(Default)]
struct ObjectMembers<'a> {
    properties: IndexMap<&'a str, (&'a Value, JsonPointer)>,
    required: HashSet<&'a str>,
}

fn walk_properties<'a>(
    schema: &'a Value,
    pointer: &JsonPointer,
    document: &'a OpenApiDocument,
    ancestors: &mut Vec<&'a str>,
    ctx: &mut ParseContext,
) -> Result<Vec<RestApiOperationPayloadProperty>> {
    let mut members = ObjectMembers::default();
    collect_members(schema, pointer, document, ancestors, &mut members, ctx)?;

    let ObjectMembers {
        properties: declared,
        required,
    } = members;

    let mut properties = Vec::with_capacity(declared.len());
    for (name, (schema, pointer)) in declared {
        properties.push(walk_property(
            name,
            schema,
            &pointer,
            required.contains(name),
            document,
            ancestors,
            ctx,
        )?);
    }

    Ok(properties)
}

fn collect_members<'a>(
    schema: &'a Value,
    pointer: &JsonPointer,
    document: &'a OpenApiDocument,
    ancestors: &mut Vec<&'a str>,
    members: &mut ObjectMembers<'a>,
    ctx: &mut ParseContext,
) -> Result<()> {
    if let Some(Value::Array(all_of)) = schema.get("allOf") {
        for (index, member) in all_of.iter().enumerate() {
            let member_pointer = pointer.join("allOf").join(index.to_string());

            let member = match document.follow_refs(member) {
                Ok(followed) => followed,
                Err(e) => {
                    ctx.report(&member_pointer, e.to_string())?;
                    continue;
                },
            };

            if let Some(reference) = member.refs.iter().find(|r| ancestors.contains(*r)) {
                trace!(%reference, pointer = %member_pointer, "cut reference cycle in allOf");
                continue;
            }

            let depth = ancestors.len();
            ancestors.extend(member.refs.iter().copied());
            let member_pointer = resolved_pointer(&member, &member_pointer);
            collect_members(member.node, &member_pointer, document, ancestors, members, ctx)?;
            ancestors.truncate(depth);
        }
    }

    if let Some(Value::Object(properties)) = schema.get("properties") {
        for (name, property) in properties {
            let property_pointer = pointer.join("properties").join(name);
            members
                .properties
                .insert(name.as_str(), (property, property_pointer));
        }
    }

    if let Some(Value::Array(required)) = schema.get("required") {
        members
            .required
            .extend(required.iter().filter_map(Value::as_str));
    }

    Ok(())
}

fn walk_property<'a>(
    name: &str,
    declared: &'a Value,
    pointer: &JsonPointer,
    is_required: bool,
    document: &'a OpenApiDocument,
    ancestors: &mut Vec<&'a str>,
    ctx: &mut ParseContext,
) -> Result<RestApiOperationPayloadProperty> {
    let followed = match document.follow_refs(declared) {
        Ok(followed) => followed,
        Err(e) => {
            ctx.report(pointer, e.to_string())?;
            return Ok(RestApiOperationPayloadProperty {
                name: name.to_string(),
                property_type: DEFAULT_TYPE.to_string(),
                description: str_field(declared, DESCRIPTION_FIELD).map(str::to_string),
                is_required,
                properties: Vec::new(),
            });
        },
    };

    let node = followed.node;

    // A description next to `$ref` overrides the target's
    let mut property = RestApiOperationPayloadProperty {
        name: name.to_string(),
        property_type: TypeMapper::schema_type(node),
        description: str_field(declared, DESCRIPTION_FIELD)
            .or_else(|| str_field(node, DESCRIPTION_FIELD))
            .map(str::to_string),
        is_required,
        properties: Vec::new(),
    };

    if !TypeMapper::is_object(&property.property_type) {
        return Ok(property);
    }

    if let Some(reference) = followed.refs.iter().find(|r| ancestors.contains(*r)) {
        trace!(%reference, property = name, "cut reference cycle");
        return Ok(property);
    }

    let depth = ancestors.len();
    ancestors.extend(followed.refs.iter().copied());
    let node_pointer = resolved_pointer(&followed, pointer);
    property.properties = walk_properties(node, &node_pointer, document, ancestors, ctx)?;
    ancestors.truncate(depth);

    Ok(property)
}

/// Where a followed node actually lives
fn resolved_pointer(followed: &Followed<'_>, declared_at: &JsonPointer) -> JsonPointer {
    match followed.refs.last() {
        Some(reference) => JsonPointer::from_ref(reference),
        None => declared_at.clone(),
    }
}
