//! # Dispatcher Module
//!
//! The dispatcher turns a resource URI into a response envelope. It owns the
//! request pipeline; handlers only produce data.
//!
//! ## Overview
//!
//! - [`HandlerRegistry`] compiles each handler's URI patterns at registration and
//!   indexes them by resource type; patterns with a placeholder resource type
//!   are tried after the typed ones
//! - [`Dispatcher`] resolves the handler, runs the validators over the raw query,
//!   derives filter, pagination and cache options, consults the cache, invokes
//!   the handler, and filters and paginates collection results
//! - [`ResourceHandler`] is the contract a handler implements
//!
//! ## Request Flow
//!
//! 1. Unsupported request content type with a payload → unsupported error
//! 2. URI shape and scheme (when schemes are configured) → validation error
//! 3. Registry lookup by resource type, then by compiled pattern → not-found error
//! 4. URI validator, query rules, added validators, then the handler's own, all
//!    over the raw query; every error is collected into one validation error
//! 5. `filter`, `limit` / `offset` / `page`, `no-cache` parsed into request options
//! 6. Cache lookup when the handler is cacheable and the call carries no payload
//! 7. Handler call; its error reaches the caller unchanged
//! 8. Arrays are filtered, then paginated; pagination links are added
//! 9. Envelope metadata: `handler`, `request_id`, `resource_type`,
//!    `resource_id`, `total_count`, `cache`
//!
//! ## Example
//!
//! ```rust
//! use resource_gateway::dispatcher::{
//!     Dispatcher, DispatcherConfig, HandlerRegistry, RequestContext, ResourceHandler,
//!     ResourceRequest,
//! };
//! use resource_gateway::error::Result;
//! use resource_gateway::mapper::default_registry;
//! use serde_json::{json, Value};
//! use std::sync::Arc;
//!
//! struct Zones;
//!
//! impl ResourceHandler for Zones {
//!     fn name(&self) -> &str {
//!         "zones"
//!     }
//!     fn uri_patterns(&self) -> Vec<String> {
//!         vec!["maas://zone/{name?}".to_string()]
//!     }
//!     fn handle_request(&self, _ctx: &RequestContext, _req: &ResourceRequest) -> Result<Value> {
//!         Ok(json!([{"name": "east"}, {"name": "west"}]))
//!     }
//! }
//!
//! let registry = Arc::new(HandlerRegistry::new());
//! registry.register(Arc::new(Zones)).unwrap();
//! let dispatcher = Dispatcher::new(registry, Arc::new(default_registry()), DispatcherConfig::default());
//!
//! let response = dispatcher
//!     .dispatch("maas://zone?filter=name%20eq%20west", "", "application/json", None)
//!     .unwrap();
//! assert_eq!(response.data, json!([{"name": "west"}]));
//! assert_eq!(response.metadata["total_count"], 1);
//! dispatcher.cache().stop();
//! ```

mod core;
mod handler;
mod registry;

pub use core::{Dispatch, Dispatcher, DispatcherConfig, FILTER_PARAM, SUPPORTED_REQUEST_TYPES};
pub use handler::{
    RequestContext, ResourceHandler, ResourceRequest, ResourceResponse, DEFAULT_CONTENT_TYPE,
};
pub use registry::{HandlerMatch, HandlerRegistry};
