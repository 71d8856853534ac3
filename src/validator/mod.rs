//! # Validator Module
//!
//! Composable request validation, run by the dispatcher after the URI, filter and
//! pagination parameters are parsed and before the handler is invoked.
//!
//! ## Validators
//!
//! | Validator | Checks |
//! |-----------|--------|
//! | [`UriValidator`] | non-empty, `scheme://type` shape, allowed schemes, routable |
//! | [`QueryParamValidator`] | per-parameter rules: required, regex, allowed values, custom check |
//! | [`PayloadValidator`] | payload presence, object shape, required fields |
//! | [`CompositeValidator`] | runs the others in order and merges every error |
//!
//! A failed [`ValidationResult`] becomes a single validation error through
//! [`ValidationResult::into_error`]; its message joins every `field: message`
//! pair and its field errors are kept for the error envelope.
//!
//! ## Example
//!
//! ```rust
//! use resource_gateway::validator::{ParamRule, QueryParamValidator};
//! use std::collections::BTreeMap;
//!
//! let validator = QueryParamValidator::standard()
//!     .rule("zone", ParamRule::new().allowed(["east", "west"]));
//! let query = BTreeMap::from([
//!     ("zone".to_string(), "north".to_string()),
//!     ("limit".to_string(), "ten".to_string()),
//! ]);
//! let result = validator.validate_query(&query);
//! assert!(!result.valid);
//! assert_eq!(result.errors.len(), 2);
//! ```

mod core;
mod payload;
mod query;
mod uri;

pub use core::{CompositeValidator, ValidationResult, Validator};
pub use payload::PayloadValidator;
pub use query::{ParamCheck, ParamRule, QueryParamValidator};
pub use uri::UriValidator;
