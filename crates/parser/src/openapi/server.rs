//! Server URL resolution

use super::context::{JsonPointer, ParseContext};
use super::document::{str_field, OpenApiDocument, SERVERS_FIELD};
use openapi_operations_common::Result;
use serde_json::Value;
use tracing::debug;
use url::{ParseError, Url};

/// Resolve the document's server URL from the first `servers` entry
///
/// No `servers` section, or an empty one, yields `None`. `{variable}`
/// placeholders are replaced with the variable's declared default. A relative
/// URL is valid OpenAPI but has no base to resolve against, so it also yields
/// `None`.
pub fn resolve_server_url(
    document: &OpenApiDocument,
    ctx: &mut ParseContext,
) -> Result<Option<Url>> {
    let Some(server) = document
        .get(SERVERS_FIELD)
        .and_then(Value::as_array)
        .and_then(|servers| servers.first())
    else {
        debug!("document declares no servers");
        return Ok(None);
    };

    let pointer = JsonPointer::root().join(SERVERS_FIELD).join("0");

    let Some(template) = str_field(server, "url") else {
        ctx.report(&pointer.join("url"), "server entry is missing url")?;
        return Ok(None);
    };

    let expanded = expand_variables(template, server.get("variables"));

    match Url::parse(&expanded) {
        Ok(url) => {
            debug!(server_url = %url, "resolved server url");
            Ok(Some(url))
        },
        Err(ParseError::RelativeUrlWithoutBase) => {
            debug!(server_url = %expanded, "server url is relative; no base url resolved");
            Ok(None)
        },
        Err(e) => {
            ctx.report(
                &pointer.join("url"),
                format!("server url {} is not a valid URL: {}", expanded, e),
            )?;
            Ok(None)
        },
    }
}

/// Substitute `{name}` with the default of server variable `name`
///
/// Placeholders without a declared default are left untouched.
fn expand_variables(template: &str, variables: Option<&Value>) -> String {
    let Some(Value::Object(variables)) = variables else {
        return template.to_string();
    };

    variables.iter().fold(template.to_string(), |url, (name, variable)| {
        match str_field(variable, "default") {
            Some(default) => url.replace(&format!("{{{}}}", name), default),
            None => url,
        }
    })
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

    #[test]
    fn test_first_server_wins() {
        let doc = document(json!({
            "servers": [
                {"url": "https://my-key-vault.vault.azure.net"},
                {"url": "https://backup.example.com"}
            ]
        }));
        let mut ctx = ParseContext::new(false);
        let url = resolve_server_url(&doc, &mut ctx).unwrap().unwrap();
        assert_eq!(url.as_str(), "https://my-key-vault.vault.azure.net/");
    }

    #[test]
    fn test_missing_or_empty_servers() {
        let mut ctx = ParseContext::new(false);
        assert!(resolve_server_url(&document(json!({})), &mut ctx)
            .unwrap()
            .is_none());
        assert!(resolve_server_url(&document(json!({"servers": []})), &mut ctx)
            .unwrap()
            .is_none());
        assert!(ctx.violations().is_empty());
    }

    #[test]
    fn test_server_variables_are_expanded() {
        let doc = document(json!({
            "servers": [{
                "url": "https://{region}.api.example.com/{basePath}",
                "variables": {
                    "region": {"default": "eu-west", "enum": ["eu-west", "us-east"]},
                    "basePath": {"default": "v2"}
                }
            }]
        }));
        let mut ctx = ParseContext::new(false);
        let url = resolve_server_url(&doc, &mut ctx).unwrap().unwrap();
        assert_eq!(url.as_str(), "https://eu-west.api.example.com/v2");
    }

    #[test]
    fn test_relative_server_url_is_compliant() {
        let doc = document(json!({"servers": [{"url": "/api/v1"}]}));

        let mut strict = ParseContext::new(false);
        assert!(resolve_server_url(&doc, &mut strict).unwrap().is_none());
        assert!(strict.violations().is_empty());
    }

    #[test]
    fn test_malformed_server_url() {
        let doc = document(json!({"servers": [{"url": "https://example.com:99999"}]}));

        let mut strict = ParseContext::new(false);
        assert!(matches!(
            resolve_server_url(&doc, &mut strict),
            Err(ParserError::NonCompliantDocument(_))
        ));

        let mut lenient = ParseContext::new(true);
        assert!(resolve_server_url(&doc, &mut lenient).unwrap().is_none());
        assert_eq!(lenient.violations()[0].pointer, "/servers/0/url");
    }
}
