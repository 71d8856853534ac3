//! # Resource Gateway
//!
//! **Resource Gateway** sits between a protocol client and a bare-metal
//! infrastructure API. It accepts URI-addressed resource requests such as
//! `maas://machine/{system_id}/power/on`, routes them to handlers, and then
//! filters, paginates, caches and formats the results.
//!
//! ## Overview
//!
//! Every resource type (machines, interfaces, block devices, tags, and any
//! type a handler adds) gets the same access pattern: one URI syntax, one
//! filter language, one pagination scheme, one error envelope.
//!
//! ## Architecture
//!
//! - **[`router`]** - URI parsing and compiled URI patterns with optional and
//!   enumerated segments
//! - **[`filter`]** - Filter expression parser and evaluator over typed records
//!   or JSON collections
//! - **[`pagination`]** - `limit` / `offset` / `page` parsing, slicing and links
//! - **[`cache`]** - TTL response cache with capacity eviction and a background
//!   sweep
//! - **[`mapper`]** - Backend ↔ context translation for machines, network
//!   interfaces, block devices and tags
//! - **[`validator`]** - Composable request validators
//! - **[`dispatcher`]** - Handler registry and the request pipeline
//! - **[`format`]** - JSON / XML negotiation and the error envelope
//! - **[`gateway`]** - Composition root a transport calls into
//! - **[`runtime_config`]** / **[`logging`]** - Configuration and tracing setup
//! - **[`fixture`]** / **[`cli`]** - Static handlers and the `rgw` tool
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Gateway
//!     participant Registry as HandlerRegistry
//!     participant Validators
//!     participant Cache as ResourceCache
//!     participant Handler
//!     participant Format as FormatterRegistry
//!
//!     Client->>Gateway: handle(uri, content_type, accept, payload)
//!     Gateway->>Registry: get_handler(uri)
//!     Registry-->>Gateway: handler + path parameters
//!     Gateway->>Validators: validate(request)
//!     alt Invalid
//!         Validators-->>Client: 400 error envelope
//!     end
//!     Gateway->>Cache: get(key)
//!     alt Hit
//!         Cache-->>Gateway: envelope
//!     else Miss
//!         Gateway->>Handler: handle_request(ctx, request)
//!         Handler-->>Gateway: JSON value
//!         Gateway->>Gateway: filter, paginate, wrap
//!         Gateway->>Cache: set(key, envelope, ttl)
//!     end
//!     Gateway->>Format: format_response(envelope, accept)
//!     Format-->>Client: status, headers, body
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use resource_gateway::dispatcher::{RequestContext, ResourceHandler, ResourceRequest};
//! use resource_gateway::error::Result;
//! use resource_gateway::gateway::Gateway;
//! use resource_gateway::runtime_config::GatewayConfig;
//! use serde_json::{json, Value};
//! use std::sync::Arc;
//!
//! struct Machines;
//!
//! impl ResourceHandler for Machines {
//!     fn name(&self) -> &str {
//!         "machines"
//!     }
//!     fn uri_patterns(&self) -> Vec<String> {
//!         vec!["maas://machine/{system_id?}".to_string()]
//!     }
//!     fn handle_request(&self, ctx: &RequestContext, _req: &ResourceRequest) -> Result<Value> {
//!         let backend = json!([
//!             {"system_id": "a1", "hostname": "node-1", "status_name": "Deployed"},
//!             {"system_id": "b2", "hostname": "node-2", "status_name": "Ready"},
//!         ]);
//!         ctx.mappers.map_collection_to_context("machine", &backend)
//!     }
//! }
//!
//! let gateway = Gateway::new(GatewayConfig::default());
//! gateway.register_handler(Arc::new(Machines)).unwrap();
//!
//! let response = gateway.handle(
//!     "maas://machine?filter=status%20eq%20Ready",
//!     "",
//!     "application/json",
//!     None,
//! );
//! assert_eq!(response.status.as_u16(), 200);
//! let body = response.json().unwrap();
//! assert_eq!(body["data"][0]["hostname"], "node-2");
//! gateway.shutdown();
//! ```
//!
//! ## Configuration
//!
//! See [`runtime_config`] for the YAML layout and `RGW_*` variables, and
//! [`logging`] for the `RGW_LOG_*` variables.

pub mod cache;
pub mod cli;
pub mod dispatcher;
pub mod error;
pub mod filter;
pub mod fixture;
pub mod format;
pub mod gateway;
pub mod ids;
pub mod logging;
pub mod mapper;
pub mod pagination;
pub mod router;
pub mod runtime_config;
pub mod validator;

pub use dispatcher::{Dispatcher, HandlerRegistry, ResourceHandler, ResourceRequest, ResourceResponse};
pub use error::{ErrorKind, GatewayError, Result};
pub use gateway::{Gateway, GatewayResponse};
pub use router::{parse, ParsedUri, UriMatch, UriPattern};
pub use runtime_config::GatewayConfig;
