use crate::dispatcher::ResourceRequest;
use crate::error::{FieldError, GatewayError, Result};
use serde::Serialize;
use std::sync::Arc;

/// Outcome of one or more validators; errors keep the order they were found in
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<FieldError>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::ok()
    }
}

impl ValidationResult {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    pub fn add_error(
        &mut self,
        field: impl Into<String>,
        message: impl Into<String>,
        code: impl Into<String>,
    ) {
        self.valid = false;
        self.errors.push(FieldError::new(field, message, code));
    }

    /// Append every error of `other`
    pub fn merge(&mut self, other: ValidationResult) {
        if !other.valid {
            self.valid = false;
        }
        self.errors.extend(other.errors);
    }

    /// Record the field errors carried by `err`, or its message when it has none
    pub fn add_gateway_error(&mut self, field: &str, code: &str, err: &GatewayError) {
        if err.field_errors().is_empty() {
            self.add_error(field, err.to_string(), code);
        } else {
            self.valid = false;
            self.errors.extend(err.field_errors().iter().cloned());
        }
    }

    /// A validation error whose message joins every `field: message` pair
    #[must_use]
    pub fn into_error(self) -> GatewayError {
        let message = if self.errors.is_empty() {
            "validation failed".to_string()
        } else {
            self.errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ")
        };
        GatewayError::Validation {
            message,
            errors: self.errors,
        }
    }

    /// # Errors
    ///
    /// Returns [`ValidationResult::into_error`] when invalid.
    pub fn into_result(self) -> Result<()> {
        if self.valid {
            Ok(())
        } else {
            Err(self.into_error())
        }
    }
}

/// A check run against a request before its handler is invoked
pub trait Validator: Send + Sync {
    /// Label used in logs
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn validate(&self, request: &ResourceRequest) -> ValidationResult;
}

/// Runs validators in order and merges every error; it never short-circuits
#[derive(Clone, Default)]
pub struct CompositeValidator {
    validators: Vec<Arc<dyn Validator>>,
}

impl CompositeValidator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn push(&mut self, validator: Arc<dyn Validator>) {
        self.validators.push(validator);
    }

    pub fn extend<I: IntoIterator<Item = Arc<dyn Validator>>>(&mut self, validators: I) {
        self.validators.extend(validators);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

impl Validator for CompositeValidator {
    fn name(&self) -> &str {
        "composite"
    }

    fn validate(&self, request: &ResourceRequest) -> ValidationResult {
        let mut result = ValidationResult::ok();
        for validator in &self.validators {
            let outcome = validator.validate(request);
            if !outcome.valid {
                tracing::debug!(
                    request_id = %request.request_id,
                    validator = validator.name(),
                    errors = outcome.errors.len(),
                    "Validator rejected request"
                );
            }
            result.merge(outcome);
        }
        result
    }
}

impl std::fmt::Debug for CompositeValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.validators.iter().map(|v| v.name()))
            .finish()
    }
}
