//! # Format Module
//!
//! Content negotiation for success envelopes and error envelopes.
//!
//! ## Overview
//!
//! - [`FormatterRegistry`] resolves an `Accept` value to a [`Formatter`]
//! - [`JsonFormatter`] and [`XmlFormatter`] are registered by default
//! - [`ErrorHandler`] turns a [`GatewayError`](crate::error::GatewayError) into a
//!   status code and a serialized error envelope
//!
//! ## Negotiation
//!
//! Content types are normalized before lookup: parameters after `;` are
//! dropped, a structured-syntax suffix replaces the subtype
//! (`application/problem+json` → `application/json`) and the result is
//! lower-cased. An `Accept` list is tried left to right; the first registered
//! type wins. Anything unknown, including `*/*`, gets JSON.
//!
//! | Normalized type | Formatter |
//! |-----------------|-----------|
//! | `application/json` | [`JsonFormatter`] |
//! | `application/xml`, `text/xml` | [`XmlFormatter`] |
//!
//! ## Error Envelope
//!
//! ```json
//! {
//!   "type": "validation_error",
//!   "message": "limit: must be a positive integer",
//!   "code": 400,
//!   "details": { "errors": [{ "field": "limit", "message": "...", "code": "format" }] }
//! }
//! ```
//!
//! `details` is omitted when there is nothing to report. With `debug` set the
//! handler adds `details.stack_trace`.

mod error_handler;
mod json;
mod registry;
mod xml;

pub use error_handler::{ErrorHandler, ErrorResponse, FALLBACK_ERROR_BODY};
pub use json::JsonFormatter;
pub use registry::{normalize_content_type, Formatter, FormatterRegistry};
pub use xml::XmlFormatter;
