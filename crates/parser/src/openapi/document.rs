//! Loaded OpenAPI document tree
//!
//! The document is kept as an owned, order-preserving JSON tree rather than
//! typed structs so that partially broken documents can still be walked in
//! lenient mode.

use serde_json::{Map, Value};
use std::fmt;

/// Field names used across the pipeline
pub(crate) const OPENAPI_FIELD: &str = "openapi";
pub(crate) const SWAGGER_FIELD: &str = "swagger";
pub(crate) const INFO_FIELD: &str = "info";
pub(crate) const PATHS_FIELD: &str = "paths";
pub(crate) const SERVERS_FIELD: &str = "servers";
pub(crate) const PARAMETERS_FIELD: &str = "parameters";
pub(crate) const REQUEST_BODY_FIELD: &str = "requestBody";
pub(crate) const RESPONSES_FIELD: &str = "responses";
pub(crate) const OPERATION_ID_FIELD: &str = "operationId";
pub(crate) const REF_FIELD: &str = "$ref";
pub(crate) const SCHEMA_FIELD: &str = "schema";
pub(crate) const CONTENT_FIELD: &str = "content";
pub(crate) const DESCRIPTION_FIELD: &str = "description";

/// OpenAPI version declared by a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecVersion {
    /// `openapi: 3.0.x`
    V3_0,

    /// `openapi: 3.1.x`
    V3_1,

    /// `swagger: "2.0"`; recognized but not supported
    Swagger2,

    /// A version string that is none of the above
    Unrecognized(String),

    /// No version field at all
    Missing,
}

impl SpecVersion {
    /// Detect the version from the document root
    pub fn detect(root: &Map<String, Value>) -> Self {
        if let Some(version) = root.get(OPENAPI_FIELD) {
            // YAML documents may carry `openapi: 3.0` as a number
            let text = match version {
                Value::String(v) => v.clone(),
                other => other.to_string(),
            };
            return if text.starts_with("3.0") {
                SpecVersion::V3_0
            } else if text.starts_with("3.1") {
                SpecVersion::V3_1
            } else {
                SpecVersion::Unrecognized(text)
            };
        }

        match root.get(SWAGGER_FIELD) {
            Some(_) => SpecVersion::Swagger2,
            None => SpecVersion::Missing,
        }
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, SpecVersion::V3_0 | SpecVersion::V3_1)
    }
}

impl fmt::Display for SpecVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecVersion::V3_0 => write!(f, "OpenAPI 3.0"),
            SpecVersion::V3_1 => write!(f, "OpenAPI 3.1"),
            SpecVersion::Swagger2 => write!(f, "Swagger 2.0"),
            SpecVersion::Unrecognized(v) => write!(f, "unrecognized version {}", v),
            SpecVersion::Missing => write!(f, "no version"),
        }
    }
}

/// A loaded document: the root object plus its detected version
#[derive(Debug, Clone)]
pub struct OpenApiDocument {
    /// Always a `Value::Object`
    root: Value,
    version: SpecVersion,
}

impl OpenApiDocument {
    pub fn new(root: Map<String, Value>) -> Self {
        let version = SpecVersion::detect(&root);
        Self {
            root: Value::Object(root),
            version,
        }
    }

    pub fn version(&self) -> &SpecVersion {
        &self.version
    }

    /// Top-level field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.root.get(field)
    }

    /// Resolve a local reference such as `#/components/schemas/Pet`
    pub fn resolve_ref(&self, reference: &str) -> Result<&Value, RefError> {
        let pointer = reference
            .strip_prefix('#')
            .ok_or_else(|| RefError::External(reference.to_string()))?;

        // "#" alone names the whole document, which is never a schema
        if pointer.is_empty() {
            return Err(RefError::NotFound(reference.to_string()));
        }

        self.root
            .pointer(pointer)
            .ok_or_else(|| RefError::NotFound(reference.to_string()))
    }

    /// Follow `$ref` links from `node` until a non-reference node is reached
    pub fn follow_refs<'a>(&'a self, node: &'a Value) -> Result<Followed<'a>, RefError> {
        let mut current = node;
        let mut refs: Vec<&'a str> = Vec::new();

        while let Some(reference) = ref_of(current) {
            if refs.contains(&reference) {
                return Err(RefError::Loop(reference.to_string()));
            }
            refs.push(reference);
            current = self.resolve_ref(reference)?;
        }

        Ok(Followed {
            node: current,
            refs,
        })
    }
}

/// Result of following a chain of references
#[derive(Debug)]
pub struct Followed<'a> {
    /// The first non-reference node
    pub node: &'a Value,

    /// References passed through, outermost first
    pub refs: Vec<&'a str>,
}

/// Why a reference could not be followed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefError {
    /// Points outside this document
    External(String),

    /// Local pointer with no target
    NotFound(String),

    /// Chain of references that never reaches a node
    Loop(String),
}

impl fmt::Display for RefError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefError::External(r) => write!(f, "external reference {} is not supported", r),
            RefError::NotFound(r) => write!(f, "reference {} does not resolve", r),
            RefError::Loop(r) => write!(f, "reference {} refers to itself", r),
        }
    }
}

/// The `$ref` of a node, if it is a reference object
pub(crate) fn ref_of(node: &Value) -> Option<&str> {
    node.get(REF_FIELD).and_then(Value::as_str)
}

/// String field of an object node
pub(crate) fn str_field<'a>(node: &'a Value, field: &str) -> Option<&'a str> {
    node.get(field).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(value: Value) -> OpenApiDocument {
        match value {
            Value::Object(map) => OpenApiDocument::new(map),
            _ => panic!("test document must be an object"),
        }
    }

    #[test]
    fn test_detect_version() {
        assert_eq!(
            document(json!({"openapi": "3.0.1"})).version(),
            &SpecVersion::V3_0
        );
        assert_eq!(
            document(json!({"openapi": "3.1.0"})).version(),
            &SpecVersion::V3_1
        );
        assert_eq!(
            document(json!({"swagger": "2.0"})).version(),
            &SpecVersion::Swagger2
        );
        assert_eq!(
            document(json!({"openapi": "4.0"})).version(),
            &SpecVersion::Unrecognized("4.0".to_string())
        );
        assert_eq!(
            document(json!({"openapi": 3.0})).version(),
            &SpecVersion::V3_0
        );
        assert_eq!(document(json!({})).version(), &SpecVersion::Missing);
        assert!(!SpecVersion::Swagger2.is_supported());
    }

    #[test]
    fn test_resolve_ref() {
        let doc = document(json!({
            "components": {
                "schemas": {
                    "Pet": {"type": "object"},
                    "a/b": {"type": "string"}
                }
            }
        }));

        assert_eq!(
            doc.resolve_ref("#/components/schemas/Pet").unwrap(),
            &json!({"type": "object"})
        );
        assert_eq!(
            doc.resolve_ref("#/components/schemas/a~1b").unwrap(),
            &json!({"type": "string"})
        );
        assert!(matches!(
            doc.resolve_ref("#/components/schemas/Missing"),
            Err(RefError::NotFound(_))
        ));
        assert!(matches!(
            doc.resolve_ref("other.json#/Pet"),
            Err(RefError::External(_))
        ));
        assert!(matches!(doc.resolve_ref("#"), Err(RefError::NotFound(_))));
        assert!(matches!(
            doc.resolve_ref("#components/schemas/Pet"),
            Err(RefError::NotFound(_))
        ));
    }

    #[test]
    fn test_resolve_ref_into_array() {
        let doc = document(json!({
            "components": {
                "schemas": {
                    "Choice": {"oneOf": [{"type": "string"}, {"type": "integer"}]}
                }
            }
        }));

        assert_eq!(
            doc.resolve_ref("#/components/schemas/Choice/oneOf/1").unwrap(),
            &json!({"type": "integer"})
        );
        assert!(matches!(
            doc.resolve_ref("#/components/schemas/Choice/oneOf/2"),
            Err(RefError::NotFound(_))
        ));
    }

    #[test]
    fn test_follow_refs_chain_and_loop() {
        let doc = document(json!({
            "components": {
                "parameters": {
                    "Alias": {"$ref": "#/components/parameters/Limit"},
                    "Limit": {"name": "limit", "in": "query"},
                    "SelfRef": {"$ref": "#/components/parameters/SelfRef"}
                }
            }
        }));

        let start = json!({"$ref": "#/components/parameters/Alias"});
        let followed = doc.follow_refs(&start).unwrap();
        assert_eq!(followed.node["name"], "limit");
        assert_eq!(
            followed.refs,
            vec![
                "#/components/parameters/Alias",
                "#/components/parameters/Limit"
            ]
        );

        let looping = json!({"$ref": "#/components/parameters/SelfRef"});
        assert!(matches!(doc.follow_refs(&looping), Err(RefError::Loop(_))));
    }
}
