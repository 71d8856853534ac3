//! # Router Module
//!
//! The router module turns resource URIs into structured identifiers and matches them
//! against the URI templates that handlers declare.
//!
//! ## Overview
//!
//! Resource URIs are hierarchical:
//!
//! ```text
//! maas://machine/abc123/power/on?filter=...
//! └─┬─┘  └──┬──┘ └─┬──┘ └─┬─┘ └┬┘
//! scheme  type    id   subtype subid
//! ```
//!
//! A plain split is enough for [`parse`], but handler patterns carry optional and
//! enumerated segments, so patterns are compiled into anchored regexes once at
//! registration time and reused for every request.
//!
//! ## Pattern Syntax
//!
//! | Placeholder | Meaning | Regex |
//! |-------------|---------|-------|
//! | `{name}` | required segment value | `([^/]+)` |
//! | `{name?}` | optional segment value | `(?:/([^/]+))?` |
//! | `{name:on\|off}` | enumerated value | `(on\|off)` |
//!
//! ## Example
//!
//! ```rust
//! use resource_gateway::router::UriPattern;
//!
//! let pattern = UriPattern::compile("maas://machine/{system_id}/power/{action:on|off}").unwrap();
//! let m = pattern.match_uri("maas://machine/abc123/power/on").unwrap();
//! assert_eq!(m.get_param("system_id"), Some("abc123"));
//! assert_eq!(m.get_param("action"), Some("on"));
//! assert!(pattern.match_uri("maas://machine/abc123/power/restart").is_err());
//! ```

mod core;
mod pattern;
#[cfg(test)]
mod tests;

pub use core::{parse, ParsedUri, SCHEME_SEPARATOR};
pub use pattern::{match_uri, validate, PatternParam, ParamVec, UriMatch, UriPattern, MAX_INLINE_PARAMS};
