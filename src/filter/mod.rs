//! # Filter Module
//!
//! A small filter DSL evaluated over any record type that can expose its fields by
//! name.
//!
//! ## Grammar
//!
//! ```text
//! expr    := clause (logical clause)*
//! clause  := field op value
//! op      := eq | ne | gt | gte | lt | lte | contains | startswith | endswith | in | notin
//! logical := and | or
//! value   := bare-word | 'single quoted' | "double quoted"
//! ```
//!
//! `and` binds tighter than `or`: `a eq 1 or b eq 2 and c eq 3` is parsed as
//! `a eq 1 or (b eq 2 and c eq 3)`.
//!
//! ## Field access
//!
//! There is no runtime reflection. A record type implements [`Filterable`], either
//! directly or through a [`FieldTable`] that maps field names and serialization
//! aliases to accessor functions. `serde_json::Value` objects are `Filterable` out
//! of the box, which is what the dispatcher uses for handler results.
//!
//! ## Evaluation policy
//!
//! A condition whose field is missing, or whose value cannot be coerced to the
//! field's type, evaluates to `false`. Incomparable records drop out of the result
//! instead of failing the whole query.
//!
//! ```rust
//! use resource_gateway::filter::{apply_filters, parse_filter};
//! use serde_json::json;
//!
//! let filter = parse_filter("status eq 'active' and count gt 20").unwrap();
//! let records = vec![
//!     json!({"status": "active", "count": 25}),
//!     json!({"status": "active", "count": 5}),
//!     json!({"status": "idle", "count": 50}),
//! ];
//! let matched = apply_filters(&records, &filter);
//! assert_eq!(matched, vec![json!({"status": "active", "count": 25})]);
//! ```

mod eval;
mod field;
mod parse;

pub use eval::{apply_filters, apply_filters_with, filter_json_collection};
pub use field::{FieldTable, FieldValue, Filterable, Tabled};
pub use parse::{
    parse_filter, FilterCondition, FilterGroup, FilterOperator, FilterOptions, LogicalOperator,
};
