//! Normalized REST operation model
//!
//! These types are what the parser hands to callers. They are plain owned
//! snapshots: nothing in them refers back to the source document.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use url::Url;

/// HTTP method of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    /// Map a path item key (e.g. "get") to a method
    pub fn from_key(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "get" => Some(HttpMethod::Get),
            "put" => Some(HttpMethod::Put),
            "post" => Some(HttpMethod::Post),
            "delete" => Some(HttpMethod::Delete),
            "options" => Some(HttpMethod::Options),
            "head" => Some(HttpMethod::Head),
            "patch" => Some(HttpMethod::Patch),
            "trace" => Some(HttpMethod::Trace),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Trace => "TRACE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a parameter value goes in the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Body,
}

impl ParameterLocation {
    /// Map an OpenAPI `in` value. Only the locations a caller can fill are
    /// accepted; `body` is reserved for synthesized parameters.
    pub fn from_openapi(value: &str) -> Option<Self> {
        match value {
            "path" => Some(ParameterLocation::Path),
            "query" => Some(ParameterLocation::Query),
            "header" => Some(ParameterLocation::Header),
            _ => None,
        }
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterLocation::Path => write!(f, "path"),
            ParameterLocation::Query => write!(f, "query"),
            ParameterLocation::Header => write!(f, "header"),
            ParameterLocation::Body => write!(f, "body"),
        }
    }
}

/// Serialization style for array parameter values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterStyle {
    /// Comma-separated values (`a,b,c`)
    Simple,
    Form,
    Label,
    Matrix,
    SpaceDelimited,
    PipeDelimited,
    DeepObject,
}

impl ParameterStyle {
    /// Map an OpenAPI `style` value
    pub fn from_openapi(value: &str) -> Option<Self> {
        match value {
            "simple" => Some(ParameterStyle::Simple),
            "form" => Some(ParameterStyle::Form),
            "label" => Some(ParameterStyle::Label),
            "matrix" => Some(ParameterStyle::Matrix),
            "spaceDelimited" => Some(ParameterStyle::SpaceDelimited),
            "pipeDelimited" => Some(ParameterStyle::PipeDelimited),
            "deepObject" => Some(ParameterStyle::DeepObject),
            _ => None,
        }
    }

    /// Style used when a parameter does not declare one
    ///
    /// Path and header values are comma-joined (`simple`), query values use
    /// `form`. Body parameters are never array-styled and fall back to `simple`.
    pub fn default_for(location: ParameterLocation) -> Self {
        match location {
            ParameterLocation::Query => ParameterStyle::Form,
            ParameterLocation::Path | ParameterLocation::Header | ParameterLocation::Body => {
                ParameterStyle::Simple
            },
        }
    }
}

impl fmt::Display for ParameterStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParameterStyle::Simple => "simple",
            ParameterStyle::Form => "form",
            ParameterStyle::Label => "label",
            ParameterStyle::Matrix => "matrix",
            ParameterStyle::SpaceDelimited => "spaceDelimited",
            ParameterStyle::PipeDelimited => "pipeDelimited",
            ParameterStyle::DeepObject => "deepObject",
        };
        f.write_str(s)
    }
}

/// One named input of an operation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestApiOperationParameter {
    /// Parameter name as declared (or one of the synthesized names)
    pub name: String,

    /// Location of the parameter
    pub location: ParameterLocation,

    /// Logical type: string, integer, number, boolean, array, object
    #[serde(rename = "type")]
    pub parameter_type: String,

    /// Item type, only for arrays
    #[serde(skip_serializing_if = "Option::is_none")]
    pub array_item_type: Option<String>,

    /// Serialization style, only for arrays
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<ParameterStyle>,

    /// Required flag
    pub is_required: bool,

    /// Default value, typed as `parameter_type`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,

    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl RestApiOperationParameter {
    /// Name of the synthesized parameter carrying the server URL
    pub const SERVER_URL: &'static str = "server-url";

    /// Name of the synthesized parameter carrying the raw request body
    pub const PAYLOAD: &'static str = "payload";

    /// Name of the synthesized parameter carrying the body content type
    pub const CONTENT_TYPE: &'static str = "content-type";

    pub const PAYLOAD_DESCRIPTION: &'static str = "REST API request body.";
    pub const CONTENT_TYPE_DESCRIPTION: &'static str = "Content type of REST API request body.";
    pub const SERVER_URL_DESCRIPTION: &'static str = "Override base URL used by the operation.";

    /// Scalar (non-array) parameter
    pub fn scalar(
        name: impl Into<String>,
        location: ParameterLocation,
        parameter_type: impl Into<String>,
        is_required: bool,
    ) -> Self {
        Self {
            name: name.into(),
            location,
            parameter_type: parameter_type.into(),
            array_item_type: None,
            style: None,
            is_required,
            default_value: None,
            description: None,
        }
    }

    /// True if the parameter carries array values
    pub fn is_array(&self) -> bool {
        self.parameter_type == "array"
    }
}

/// One property of a request body schema
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestApiOperationPayloadProperty {
    pub name: String,

    #[serde(rename = "type")]
    pub property_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Whether the enclosing schema lists this property as required
    pub is_required: bool,

    /// Nested properties; empty for leaves
    pub properties: Vec<RestApiOperationPayloadProperty>,
}

/// Request body description
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestApiOperationPayload {
    /// Selected media type (e.g. "application/json")
    pub media_type: String,

    /// Description of the request body itself
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Top-level properties; empty for non-structured media types
    pub properties: Vec<RestApiOperationPayloadProperty>,
}

/// A single invocable (method, path) unit
///
/// Fields are read-only; the header index is built once from the parameter
/// list and always agrees with it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestApiOperation {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    method: HttpMethod,
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    server_url: Option<Url>,
    tags: Vec<String>,
    parameters: Vec<RestApiOperationParameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<RestApiOperationPayload>,
    #[serde(skip)]
    headers: IndexMap<String, RestApiOperationParameter>,
}

impl RestApiOperation {
    /// Start an operation with no parameters, payload or server
    pub fn new(id: impl Into<String>, method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            summary: None,
            description: None,
            method,
            path: path.into(),
            server_url: None,
            tags: Vec::new(),
            parameters: Vec::new(),
            payload: None,
            headers: IndexMap::new(),
        }
    }

    pub fn with_summary(mut self, summary: Option<String>) -> Self {
        self.summary = summary;
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_server_url(mut self, server_url: Option<Url>) -> Self {
        self.server_url = server_url;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Set the parameter list and rebuild the header index from it
    pub fn with_parameters(mut self, parameters: Vec<RestApiOperationParameter>) -> Self {
        self.headers = extract_headers(&parameters);
        self.parameters = parameters;
        self
    }

    pub fn with_payload(mut self, payload: Option<RestApiOperationPayload>) -> Self {
        self.payload = payload;
        self
    }

    /// Operation id, unique within the source document
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Path template, e.g. `/secrets/{secret-name}`
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Server URL shared by every operation of the document
    pub fn server_url(&self) -> Option<&Url> {
        self.server_url.as_ref()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Declared parameters followed by the synthesized ones
    pub fn parameters(&self) -> &[RestApiOperationParameter] {
        &self.parameters
    }

    pub fn payload(&self) -> Option<&RestApiOperationPayload> {
        self.payload.as_ref()
    }

    /// Header parameters keyed by header name
    pub fn headers(&self) -> &IndexMap<String, RestApiOperationParameter> {
        &self.headers
    }

    /// Look up a parameter by location and name
    pub fn parameter(
        &self,
        location: ParameterLocation,
        name: &str,
    ) -> Option<&RestApiOperationParameter> {
        self.parameters
            .iter()
            .find(|p| p.location == location && p.name == name)
    }
}

/// Index header-location parameters by name, in declared order
pub fn extract_headers(
    parameters: &[RestApiOperationParameter],
) -> IndexMap<String, RestApiOperationParameter> {
    parameters
        .iter()
        .filter(|p| p.location == ParameterLocation::Header)
        .map(|p| (p.name.clone(), p.clone()))
        .collect()
}
