use super::registry::FormatterRegistry;
use crate::error::GatewayError;
use http::StatusCode;
use serde_json::{json, Map, Value};
use std::backtrace::Backtrace;
use std::sync::Arc;
use tracing::error;

/// Body written when an error envelope cannot itself be formatted
pub const FALLBACK_ERROR_BODY: &str =
    r#"{"type":"internal_error","message":"failed to format error response","code":500}"#;

/// A formatted error ready for the transport
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorResponse {
    pub status: StatusCode,
    pub content_type: String,
    pub body: Vec<u8>,
}

/// Classifies errors and writes the error envelope
#[derive(Debug, Clone)]
pub struct ErrorHandler {
    formatters: Arc<FormatterRegistry>,
    debug: bool,
}

impl ErrorHandler {
    #[must_use]
    pub fn new(formatters: Arc<FormatterRegistry>, debug: bool) -> Self {
        Self { formatters, debug }
    }

    #[must_use]
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// The error envelope as a JSON value
    #[must_use]
    pub fn envelope(&self, err: &GatewayError) -> Value {
        let status = err.status();
        let mut envelope = Map::new();
        envelope.insert("type".into(), json!(err.kind().as_str()));
        envelope.insert("message".into(), json!(err.to_string()));
        envelope.insert("code".into(), json!(status.as_u16()));

        let mut details = Map::new();
        if !err.field_errors().is_empty() {
            details.insert("errors".into(), json!(err.field_errors()));
        }
        if let GatewayError::Mapping { resource, .. } = err {
            details.insert("resource".into(), json!(resource));
        }
        if self.debug {
            details.insert(
                "stack_trace".into(),
                json!(Backtrace::force_capture().to_string()),
            );
        }
        if !details.is_empty() {
            envelope.insert("details".into(), Value::Object(details));
        }
        Value::Object(envelope)
    }

    /// Status, content type and body for `err` in the negotiated format
    ///
    /// Never fails: a formatter error yields [`FALLBACK_ERROR_BODY`] with 500.
    #[must_use]
    pub fn handle(&self, err: &GatewayError, accept: &str) -> ErrorResponse {
        let status = err.status();
        match self.formatters.format_error(&self.envelope(err), accept) {
            Ok((body, content_type)) => ErrorResponse {
                status,
                content_type,
                body,
            },
            Err(format_err) => {
                error!(
                    original_error = %err,
                    error = %format_err,
                    accept = %accept,
                    "Failed to format error response"
                );
                ErrorResponse {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    content_type: "application/json".to_string(),
                    body: FALLBACK_ERROR_BODY.as_bytes().to_vec(),
                }
            }
        }
    }
}
