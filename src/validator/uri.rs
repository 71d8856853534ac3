use super::core::{ValidationResult, Validator};
use crate::dispatcher::{HandlerRegistry, ResourceRequest};
use crate::router::parse;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Checks that the URI is well formed and routable
///
/// * non-empty, with a `scheme://type` prefix
/// * scheme within the allowed set, when one is configured
/// * a registered handler whose patterns match it, when a registry is attached
#[derive(Debug, Clone, Default)]
pub struct UriValidator {
    allowed_schemes: Option<BTreeSet<String>>,
    registry: Option<Arc<HandlerRegistry>>,
}

impl UriValidator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict URIs to these schemes (compared case-insensitively)
    #[must_use]
    pub fn with_schemes<I, S>(mut self, schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let schemes: BTreeSet<String> = schemes
            .into_iter()
            .map(|s| s.as_ref().trim().to_ascii_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        self.allowed_schemes = (!schemes.is_empty()).then_some(schemes);
        self
    }

    #[must_use]
    pub fn with_registry(mut self, registry: Arc<HandlerRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Validate a raw URI outside of a request
    #[must_use]
    pub fn validate_uri(&self, uri: &str) -> ValidationResult {
        let mut result = ValidationResult::ok();
        if uri.trim().is_empty() {
            result.add_error("uri", "URI must not be empty", "required");
            return result;
        }

        let parsed = match parse(uri) {
            Ok(parsed) => parsed,
            Err(e) => {
                result.add_gateway_error("uri", "format", &e);
                return result;
            }
        };

        if let Some(allowed) = &self.allowed_schemes {
            if !allowed.contains(&parsed.scheme.to_ascii_lowercase()) {
                result.add_error(
                    "scheme",
                    format!(
                        "unsupported scheme '{}'; expected one of {}",
                        parsed.scheme,
                        allowed.iter().cloned().collect::<Vec<_>>().join(", ")
                    ),
                    "enum",
                );
            }
        }

        if let Some(registry) = &self.registry {
            if let Err(e) = registry.get_handler(uri) {
                result.add_error("uri", e.to_string(), "not_found");
            }
        }
        result
    }
}

impl Validator for UriValidator {
    fn name(&self) -> &str {
        "uri"
    }

    fn validate(&self, request: &ResourceRequest) -> ValidationResult {
        self.validate_uri(&request.uri)
    }
}
