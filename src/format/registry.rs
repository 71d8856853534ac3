use super::json::JsonFormatter;
use super::xml::XmlFormatter;
use crate::dispatcher::ResourceResponse;
use crate::error::{GatewayError, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Serializes a JSON value tree into one wire format
pub trait Formatter: Send + Sync {
    /// Content type written into the response header
    fn content_type(&self) -> &str;

    /// Normalized content types this formatter answers for
    fn content_types(&self) -> Vec<String> {
        vec![self.content_type().to_string()]
    }

    /// Serialize `value`; `root` names the document element where the format
    /// needs one
    ///
    /// # Errors
    ///
    /// Returns an internal error when serialization fails.
    fn format(&self, root: &str, value: &Value) -> Result<Vec<u8>>;
}

/// Strip parameters, fold a `+suffix` into the subtype and lower-case
///
/// ```
/// use resource_gateway::format::normalize_content_type;
///
/// assert_eq!(normalize_content_type("Application/JSON; charset=utf-8"), "application/json");
/// assert_eq!(normalize_content_type("application/problem+xml"), "application/xml");
/// ```
#[must_use]
pub fn normalize_content_type(content_type: &str) -> String {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.split_once('/') {
        Some((kind, subtype)) => match subtype.rsplit_once('+') {
            Some((_, suffix)) if !suffix.is_empty() => format!("{kind}/{suffix}"),
            _ => essence,
        },
        None => essence,
    }
}

/// Content type → formatter, JSON by default
#[derive(Clone)]
pub struct FormatterRegistry {
    formatters: HashMap<String, Arc<dyn Formatter>>,
    default: Arc<dyn Formatter>,
}

impl Default for FormatterRegistry {
    fn default() -> Self {
        let mut registry = Self::empty(Arc::new(JsonFormatter::default()));
        registry.register(Arc::new(JsonFormatter::default()));
        registry.register(Arc::new(XmlFormatter::default()));
        registry
    }
}

impl FormatterRegistry {
    /// JSON and XML formatters, JSON as the fallback
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding only the fallback formatter
    #[must_use]
    pub fn empty(default: Arc<dyn Formatter>) -> Self {
        Self {
            formatters: HashMap::new(),
            default,
        }
    }

    /// Register `formatter` under each of its content types, replacing any
    /// previous owner
    pub fn register(&mut self, formatter: Arc<dyn Formatter>) {
        for content_type in formatter.content_types() {
            self.formatters
                .insert(normalize_content_type(&content_type), Arc::clone(&formatter));
        }
    }

    /// Resolve an `Accept` value; returns the formatter and the content type to
    /// answer with
    #[must_use]
    pub fn resolve(&self, accept: &str) -> (Arc<dyn Formatter>, String) {
        for candidate in accept.split(',') {
            let normalized = normalize_content_type(candidate);
            if let Some(formatter) = self.formatters.get(&normalized) {
                return (Arc::clone(formatter), normalized);
            }
        }
        debug!(accept = %accept, "No formatter for accept type, using default");
        (
            Arc::clone(&self.default),
            self.default.content_type().to_string(),
        )
    }

    #[must_use]
    pub fn supports(&self, content_type: &str) -> bool {
        self.formatters
            .contains_key(&normalize_content_type(content_type))
    }

    /// Registered content types, sorted
    #[must_use]
    pub fn content_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.formatters.keys().cloned().collect();
        types.sort();
        types
    }

    /// Serialize a response envelope for `accept`
    ///
    /// # Errors
    ///
    /// Returns an internal error when the formatter fails.
    pub fn format_response(
        &self,
        envelope: &ResourceResponse,
        accept: &str,
    ) -> Result<(Vec<u8>, String)> {
        let value = serde_json::to_value(envelope)?;
        let (formatter, content_type) = self.resolve(accept);
        Ok((formatter.format("response", &value)?, content_type))
    }

    /// Serialize an error envelope for `accept`
    ///
    /// # Errors
    ///
    /// Returns an internal error when the formatter fails.
    pub fn format_error(&self, error: &Value, accept: &str) -> Result<(Vec<u8>, String)> {
        if !error.is_object() {
            return Err(GatewayError::internal("error envelope must be an object"));
        }
        let (formatter, content_type) = self.resolve(accept);
        Ok((formatter.format("error", error)?, content_type))
    }
}

impl std::fmt::Debug for FormatterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatterRegistry")
            .field("content_types", &self.content_types())
            .field("default", &self.default.content_type())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_content_type() {
        assert_eq!(normalize_content_type("application/json"), "application/json");
        assert_eq!(
            normalize_content_type(" application/json ; charset=utf-8"),
            "application/json"
        );
        assert_eq!(normalize_content_type("TEXT/XML"), "text/xml");
        assert_eq!(
            normalize_content_type("application/vnd.maas.machine+json;v=2"),
            "application/json"
        );
        assert_eq!(normalize_content_type("*/*"), "*/*");
        assert_eq!(normalize_content_type(""), "");
    }

    #[test]
    fn test_resolve_accept_lists() {
        let registry = FormatterRegistry::new();
        assert_eq!(registry.resolve("application/xml").1, "application/xml");
        assert_eq!(registry.resolve("text/xml").1, "text/xml");
        assert_eq!(
            registry.resolve("text/html, application/xml;q=0.9, */*").1,
            "application/xml"
        );
        assert_eq!(registry.resolve("text/csv").1, "application/json");
        assert_eq!(registry.resolve("").1, "application/json");
        assert!(registry.supports("Application/XML; charset=utf-8"));
        assert!(!registry.supports("text/csv"));
        assert_eq!(
            registry.content_types(),
            vec!["application/json", "application/xml", "text/xml"]
        );
    }

    #[test]
    fn test_format_response_json_and_xml() {
        let registry = FormatterRegistry::new();
        let envelope = ResourceResponse::new(json!([{"name": "east"}]))
            .with_metadata("handler", "zones");

        let (body, content_type) = registry.format_response(&envelope, "").unwrap();
        assert_eq!(content_type, "application/json");
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["data"][0]["name"], "east");
        assert_eq!(value["metadata"]["handler"], "zones");

        let (body, content_type) = registry
            .format_response(&envelope, "application/xml")
            .unwrap();
        assert_eq!(content_type, "application/xml");
        let xml = String::from_utf8(body).unwrap();
        assert!(xml.contains("<response>"));
        assert!(xml.contains("<data><item><name>east</name></item></data>"));
    }

    #[test]
    fn test_format_error_requires_object() {
        let registry = FormatterRegistry::new();
        assert!(registry.format_error(&json!("oops"), "").is_err());
        let (body, _) = registry
            .format_error(&json!({"type": "not_found", "message": "x"}), "")
            .unwrap();
        assert_eq!(
            serde_json::from_slice::<Value>(&body).unwrap()["type"],
            "not_found"
        );
    }
}
