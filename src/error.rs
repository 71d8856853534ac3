//! # Error Module
//!
//! Every stage of the pipeline returns [`GatewayError`]. The variant decides the
//! transport status code (see [`GatewayError::status`]) and the `type` field of the
//! error envelope written by [`crate::format::ErrorHandler`].
//!
//! | Kind | Raised by | Status |
//! |------|-----------|--------|
//! | `Validation` | URI parsing, filter/pagination syntax, validators, mappers | 400 |
//! | `NotFound` | no handler, no mapper, no pattern match, absent resource | 404 |
//! | `Unauthorized` / `Forbidden` | reserved for an external auth layer | 401 / 403 |
//! | `Unsupported` | unsupported request content type | 415 |
//! | `Mapping` | translation between domain models failed | 500 |
//! | `Internal` | anything else, including formatter failures | 500 |

use http::StatusCode;
use serde::Serialize;
use std::fmt;

/// Result alias used throughout the crate
pub type Result<T, E = GatewayError> = std::result::Result<T, E>;

/// A single field-level validation problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Field, parameter or URI component that failed (e.g. `limit`, `uri`)
    pub field: String,
    /// Human-readable message
    pub message: String,
    /// Machine-readable code (e.g. `required`, `pattern`, `format`)
    pub code: String,
}

impl FieldError {
    pub fn new(
        field: impl Into<String>,
        message: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            code: code.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Coarse error classification used for status mapping and the envelope `type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Unauthorized,
    Forbidden,
    Unsupported,
    Mapping,
    Internal,
}

impl ErrorKind {
    /// Stable identifier written into error envelopes
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation_error",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::Unsupported => "unsupported_operation",
            ErrorKind::Mapping => "mapping_error",
            ErrorKind::Internal => "internal_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for every gateway operation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GatewayError {
    /// Bad URI, bad query parameter, bad filter/pagination syntax or failed
    /// structural validation. `errors` keeps every field-level problem.
    #[error("{message}")]
    Validation {
        message: String,
        errors: Vec<FieldError>,
    },
    /// No handler, no mapper, no pattern match or absent resource
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    /// Unsupported content type or operation
    #[error("{0}")]
    Unsupported(String),
    /// Translation between backend and context models failed
    #[error("failed to map {resource}: {message}")]
    Mapping { resource: String, message: String },
    #[error("{0}")]
    Internal(String),
}

impl GatewayError {
    /// Validation error without field detail
    pub fn validation(message: impl Into<String>) -> Self {
        GatewayError::Validation {
            message: message.into(),
            errors: Vec::new(),
        }
    }

    /// Validation error for a single field
    pub fn invalid_field(
        field: impl Into<String>,
        message: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        let error = FieldError::new(field, message, code);
        GatewayError::Validation {
            message: error.to_string(),
            errors: vec![error],
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        GatewayError::NotFound(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        GatewayError::Unsupported(message.into())
    }

    pub fn mapping(resource: impl Into<String>, message: impl Into<String>) -> Self {
        GatewayError::Mapping {
            resource: resource.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        GatewayError::Internal(message.into())
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::Validation { .. } => ErrorKind::Validation,
            GatewayError::NotFound(_) => ErrorKind::NotFound,
            GatewayError::Unauthorized(_) => ErrorKind::Unauthorized,
            GatewayError::Forbidden(_) => ErrorKind::Forbidden,
            GatewayError::Unsupported(_) => ErrorKind::Unsupported,
            GatewayError::Mapping { .. } => ErrorKind::Mapping,
            GatewayError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Transport status code derived from the error kind
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Unsupported => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ErrorKind::Mapping | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Field-level detail for validation errors; empty for every other kind
    #[must_use]
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            GatewayError::Validation { errors, .. } => errors,
            _ => &[],
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Internal(format!("json: {err}"))
    }
}
