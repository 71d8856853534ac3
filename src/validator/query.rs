use super::core::{ValidationResult, Validator};
use crate::dispatcher::ResourceRequest;
use crate::error::{GatewayError, Result};
use crate::filter::parse_filter;
use crate::pagination::{LIMIT_PARAM, OFFSET_PARAM, PAGE_PARAM};
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Custom check returning an error message for a bad value
pub type ParamCheck = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Rules for one query parameter
#[derive(Clone, Default)]
pub struct ParamRule {
    pub required: bool,
    pub pattern: Option<Regex>,
    pub allowed_values: Option<Vec<String>>,
    pub custom: Option<ParamCheck>,
}

impl ParamRule {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Values must fully match `pattern`
    ///
    /// # Errors
    ///
    /// Returns a validation error when `pattern` is not a valid regex.
    pub fn pattern(mut self, pattern: &str) -> Result<Self> {
        let anchored = format!("^(?:{pattern})$");
        let regex = Regex::new(&anchored).map_err(|e| {
            GatewayError::invalid_field("pattern", format!("invalid rule pattern: {e}"), "format")
        })?;
        self.pattern = Some(regex);
        Ok(self)
    }

    #[must_use]
    pub fn allowed<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn check<F>(mut self, check: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.custom = Some(Arc::new(check));
        self
    }

    fn apply(&self, name: &str, value: Option<&str>, result: &mut ValidationResult) {
        let Some(value) = value else {
            if self.required {
                result.add_error(name, format!("query parameter '{name}' is required"), "required");
            }
            return;
        };
        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(value) {
                result.add_error(
                    name,
                    format!("'{value}' does not match the expected format"),
                    "pattern",
                );
                return;
            }
        }
        if let Some(allowed) = &self.allowed_values {
            if !allowed.iter().any(|a| a.eq_ignore_ascii_case(value)) {
                result.add_error(
                    name,
                    format!("'{value}' is not one of: {}", allowed.join(", ")),
                    "enum",
                );
                return;
            }
        }
        if let Some(check) = &self.custom {
            if let Some(message) = check(value) {
                result.add_error(name, message, "invalid");
            }
        }
    }
}

impl fmt::Debug for ParamRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamRule")
            .field("required", &self.required)
            .field("pattern", &self.pattern.as_ref().map(Regex::as_str))
            .field("allowed_values", &self.allowed_values)
            .field("custom", &self.custom.is_some())
            .finish()
    }
}

/// Rule table keyed by query parameter name
///
/// Parameters without a rule pass unless `deny_unknown` is set.
#[derive(Debug, Clone, Default)]
pub struct QueryParamValidator {
    rules: BTreeMap<String, ParamRule>,
    deny_unknown: bool,
}

impl QueryParamValidator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules for the reserved parameters `filter`, `limit`, `offset` and `page`;
    /// `no-cache` takes any value
    #[must_use]
    pub fn standard() -> Self {
        let digits = |name: &'static str| {
            move |v: &str| {
                (v.is_empty() || !v.bytes().all(|b| b.is_ascii_digit()))
                    .then(|| format!("{name} must be a non-negative integer"))
            }
        };
        Self::new()
            .rule(
                "filter",
                ParamRule::new().check(|v| parse_filter(v).err().map(|e| e.to_string())),
            )
            .rule(LIMIT_PARAM, ParamRule::new().check(digits(LIMIT_PARAM)))
            .rule(OFFSET_PARAM, ParamRule::new().check(digits(OFFSET_PARAM)))
            .rule(
                PAGE_PARAM,
                ParamRule::new().check(|v| {
                    match v.parse::<u64>() {
                        Ok(p) if p >= 1 => None,
                        _ => Some("page must be an integer of 1 or greater".to_string()),
                    }
                }),
            )
    }

    #[must_use]
    pub fn rule(mut self, name: impl Into<String>, rule: ParamRule) -> Self {
        self.rules.insert(name.into(), rule);
        self
    }

    /// Reject parameters that have no rule
    #[must_use]
    pub fn deny_unknown(mut self) -> Self {
        self.deny_unknown = true;
        self
    }

    /// Validate a query map outside of a request
    #[must_use]
    pub fn validate_query(&self, query: &BTreeMap<String, String>) -> ValidationResult {
        let mut result = ValidationResult::ok();
        for (name, rule) in &self.rules {
            rule.apply(name, query.get(name).map(String::as_str), &mut result);
        }
        if self.deny_unknown {
            for name in query.keys().filter(|k| !self.rules.contains_key(*k)) {
                result.add_error(
                    name.as_str(),
                    format!("unknown query parameter '{name}'"),
                    "unknown",
                );
            }
        }
        result
    }
}

impl Validator for QueryParamValidator {
    fn name(&self) -> &str {
        "query"
    }

    fn validate(&self, request: &ResourceRequest) -> ValidationResult {
        self.validate_query(&request.query_params)
    }
}
