use super::core::{ValidationResult, Validator};
use crate::dispatcher::ResourceRequest;
use serde_json::Value;

/// Checks the request payload: presence, object shape, required fields
#[derive(Debug, Clone, Default)]
pub struct PayloadValidator {
    required: bool,
    required_fields: Vec<String>,
}

impl PayloadValidator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject requests without a payload
    #[must_use]
    pub fn require_payload(mut self) -> Self {
        self.required = true;
        self
    }

    /// Fields the payload object must carry (non-null)
    #[must_use]
    pub fn with_required_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_fields.extend(fields.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn validate_payload(&self, payload: Option<&Value>) -> ValidationResult {
        let mut result = ValidationResult::ok();
        let Some(payload) = payload else {
            if self.required {
                result.add_error("payload", "request payload is required", "required");
            }
            return result;
        };
        let Some(map) = payload.as_object() else {
            result.add_error("payload", "payload must be a JSON object", "type");
            return result;
        };
        for field in &self.required_fields {
            if map.get(field).map_or(true, Value::is_null) {
                result.add_error(
                    field.as_str(),
                    format!("field '{field}' is required"),
                    "required",
                );
            }
        }
        result
    }
}

impl Validator for PayloadValidator {
    fn name(&self) -> &str {
        "payload"
    }

    fn validate(&self, request: &ResourceRequest) -> ValidationResult {
        self.validate_payload(request.payload.as_ref())
    }
}
