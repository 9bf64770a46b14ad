//! Type mapping from OpenAPI schemas to logical type names
//!
//! Maps schema nodes to the type names carried by parameters and payload
//! properties, and coerces declared defaults to those types.

use serde_json::{Number, Value};

/// Unconstrained scalar type used when a schema gives no type information
pub const DEFAULT_TYPE: &str = "string";

/// Maps OpenAPI schema nodes to logical type names
pub struct TypeMapper;

impl TypeMapper {
    /// Logical type of a schema node
    ///
    /// # Examples
    /// ```
    /// use openapi_operations_parser::TypeMapper;
    /// use serde_json::json;
    ///
    /// assert_eq!(TypeMapper::schema_type(&json!({"type": "integer"})), "integer");
    /// assert_eq!(TypeMapper::schema_type(&json!({"type": ["string", "null"]})), "string");
    /// assert_eq!(TypeMapper::schema_type(&json!({"properties": {}})), "object");
    /// assert_eq!(TypeMapper::schema_type(&json!({})), "string");
    /// ```
    pub fn schema_type(schema: &Value) -> String {
        match schema.get("type") {
            Some(Value::String(t)) => return t.clone(),
            // 3.1 allows a list of types; "null" only marks nullability
            Some(Value::Array(types)) => {
                if let Some(t) = types
                    .iter()
                    .filter_map(Value::as_str)
                    .find(|t| *t != "null")
                {
                    return t.to_string();
                }
            },
            _ => {}
        }

        if schema.get("properties").is_some() || schema.get("allOf").is_some() {
            "object".to_string()
        } else if schema.get("items").is_some() {
            "array".to_string()
        } else {
            DEFAULT_TYPE.to_string()
        }
    }

    /// Check if a type name is the object type
    pub fn is_object(type_name: &str) -> bool {
        type_name == "object"
    }

    /// Coerce a declared default to `type_name`
    ///
    /// Returns `None` if the value cannot represent that type. String forms
    /// of scalars are accepted (`"10"` for an integer).
    pub fn coerce_default(value: &Value, type_name: &str) -> Option<Value> {
        match (type_name, value) {
            (_, Value::Null) => None,
            ("string", Value::String(_)) => Some(value.clone()),
            ("string", Value::Number(n)) => Some(Value::String(n.to_string())),
            ("string", Value::Bool(b)) => Some(Value::String(b.to_string())),
            ("integer", Value::Number(n)) => integer_from_number(n).map(Value::Number),
            ("integer", Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),
            ("number", Value::Number(_)) => Some(value.clone()),
            ("number", Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number),
            ("boolean", Value::Bool(_)) => Some(value.clone()),
            ("boolean", Value::String(s)) => match s.trim() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            ("array", Value::Array(_)) => Some(value.clone()),
            ("object", Value::Object(_)) => Some(value.clone()),
            ("string" | "integer" | "number" | "boolean" | "array" | "object", _) => None,
            // Unknown type names carry the value as declared
            _ => Some(value.clone()),
        }
    }
}

fn integer_from_number(n: &Number) -> Option<Number> {
    if n.is_i64() || n.is_u64() {
        return Some(n.clone());
    }

    n.as_f64()
        .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
        .map(|f| Number::from(f as i64))
}
