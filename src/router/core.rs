//! URI parsing: `scheme://type/id/subtype/subid?query` into [`ParsedUri`].

use crate::error::{GatewayError, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// Separator between the scheme and the resource path
pub const SCHEME_SEPARATOR: &str = "://";

/// Structured view of a resource URI
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedUri {
    pub scheme: String,
    /// First path segment (e.g. `machine`)
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub sub_resource_type: Option<String>,
    pub sub_resource_id: Option<String>,
    /// Every non-empty path segment, including the four above
    pub segments: Vec<String>,
    /// Decoded query parameters; a repeated key keeps its last value
    pub query_params: BTreeMap<String, String>,
}

impl ParsedUri {
    /// The URI without its query string, rebuilt from the parsed segments
    #[must_use]
    pub fn path_uri(&self) -> String {
        format!(
            "{}{}{}",
            self.scheme,
            SCHEME_SEPARATOR,
            self.segments.join("/")
        )
    }

    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }
}

/// Split a URI into its path part and optional raw query string
pub(crate) fn split_query(uri: &str) -> (&str, Option<&str>) {
    match uri.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (uri, None),
    }
}

/// Parse a resource URI
///
/// # Errors
///
/// Returns a validation error when the URI has no `scheme://` separator, an empty
/// scheme, or no resource type.
///
/// # Example
///
/// ```rust
/// use resource_gateway::router::parse;
///
/// let parsed = parse("maas://machine/abc123/interfaces?limit=5").unwrap();
/// assert_eq!(parsed.resource_type, "machine");
/// assert_eq!(parsed.resource_id.as_deref(), Some("abc123"));
/// assert_eq!(parsed.sub_resource_type.as_deref(), Some("interfaces"));
/// assert_eq!(parsed.get_query_param("limit"), Some("5"));
/// ```
pub fn parse(uri: &str) -> Result<ParsedUri> {
    let uri = uri.trim();
    let (scheme, rest) = uri.split_once(SCHEME_SEPARATOR).ok_or_else(|| {
        GatewayError::invalid_field(
            "uri",
            format!("invalid URI format '{uri}': missing scheme separator"),
            "format",
        )
    })?;
    if scheme.is_empty() {
        return Err(GatewayError::invalid_field(
            "uri",
            format!("invalid URI format '{uri}': empty scheme"),
            "format",
        ));
    }

    let (path, query) = split_query(rest);
    let segments: Vec<String> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    let resource_type = segments.first().cloned().ok_or_else(|| {
        GatewayError::invalid_field(
            "uri",
            format!("invalid URI format '{uri}': missing resource type"),
            "format",
        )
    })?;

    let query_params = query
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect()
        })
        .unwrap_or_default();

    Ok(ParsedUri {
        scheme: scheme.to_string(),
        resource_type,
        resource_id: segments.get(1).cloned(),
        sub_resource_type: segments.get(2).cloned(),
        sub_resource_id: segments.get(3).cloned(),
        segments,
        query_params,
    })
}
