//! # Gateway
//!
//! Composition root: owns the handler and mapper registries, the dispatcher
//! with its cache, and the formatters. [`Gateway::handle`] is the single entry
//! point a transport calls; it never fails, every error becomes a formatted
//! error envelope.
//!
//! ```rust
//! use resource_gateway::gateway::Gateway;
//! use resource_gateway::runtime_config::GatewayConfig;
//!
//! let gateway = Gateway::new(GatewayConfig::default());
//! let response = gateway.handle("maas://machine/abc", "", "application/json", None);
//! assert_eq!(response.status.as_u16(), 404);
//! gateway.shutdown();
//! ```

use crate::cache::CacheStats;
use crate::dispatcher::{Dispatcher, HandlerRegistry, ResourceHandler};
use crate::error::Result;
use crate::format::{ErrorHandler, FormatterRegistry};
use crate::ids::RequestId;
use crate::mapper::{default_registry, MapperRegistry, ResourceMapper};
use crate::runtime_config::GatewayConfig;
use crate::validator::Validator;
use http::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// Header carrying the id of the request that produced the response
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// What the transport writes back
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    pub status: StatusCode,
    pub content_type: String,
    /// Extra headers in write order; `Content-Type` is not repeated here
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl GatewayResponse {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body parsed as JSON; `None` for other content types or bad bytes
    #[must_use]
    pub fn json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

pub struct Gateway {
    config: GatewayConfig,
    handlers: Arc<HandlerRegistry>,
    mappers: Arc<MapperRegistry>,
    dispatcher: Dispatcher,
    formatters: Arc<FormatterRegistry>,
    errors: ErrorHandler,
}

impl Gateway {
    /// Build a gateway with the machine, network, storage and tag mappers and
    /// the JSON and XML formatters registered
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        Self::with_parts(
            config,
            Arc::new(default_registry()),
            Arc::new(FormatterRegistry::new()),
        )
    }

    #[must_use]
    pub fn with_parts(
        config: GatewayConfig,
        mappers: Arc<MapperRegistry>,
        formatters: Arc<FormatterRegistry>,
    ) -> Self {
        let handlers = Arc::new(HandlerRegistry::new());
        let dispatcher = Dispatcher::new(
            Arc::clone(&handlers),
            Arc::clone(&mappers),
            config.dispatcher_config(),
        );
        let errors = ErrorHandler::new(Arc::clone(&formatters), config.errors.debug);
        info!(
            schemes = ?config.schemes,
            cache_enabled = config.cache.enabled,
            cache_capacity = config.cache.capacity,
            mappers = ?mappers.names(),
            "Gateway initialized"
        );
        Self {
            config,
            handlers,
            mappers,
            dispatcher,
            formatters,
            errors,
        }
    }

    /// # Errors
    ///
    /// See [`HandlerRegistry::register`].
    pub fn register_handler(&self, handler: Arc<dyn ResourceHandler>) -> Result<()> {
        self.handlers.register(handler)
    }

    /// # Errors
    ///
    /// See [`MapperRegistry::register`].
    pub fn register_mapper(&self, name: &str, mapper: Arc<dyn ResourceMapper>) -> Result<()> {
        self.mappers.register(name, mapper)
    }

    /// Add a validator that runs for every request
    pub fn add_validator(&mut self, validator: Arc<dyn Validator>) {
        self.dispatcher.add_validator(validator);
    }

    /// Dispatch one call and format the outcome for `accept_type`
    pub fn handle(
        &self,
        uri: &str,
        content_type: &str,
        accept_type: &str,
        payload: Option<Value>,
    ) -> GatewayResponse {
        self.handle_with_request_id(None, uri, content_type, accept_type, payload)
    }

    /// Like [`Gateway::handle`], reusing the caller's request id when it is a
    /// valid ULID; error responses carry the id too
    pub fn handle_with_request_id(
        &self,
        request_id: Option<&str>,
        uri: &str,
        content_type: &str,
        accept_type: &str,
        payload: Option<Value>,
    ) -> GatewayResponse {
        let request_id = RequestId::from_caller_or_new(request_id);
        let dispatch = match self
            .dispatcher
            .execute_as(request_id, uri, content_type, accept_type, payload)
        {
            Ok(dispatch) => dispatch,
            Err(err) => {
                warn!(
                    request_id = %request_id,
                    uri = %uri,
                    error_type = err.kind().as_str(),
                    status = err.status().as_u16(),
                    error = %err,
                    "Request failed"
                );
                return self.error_response(&err, accept_type, Some(request_id.to_string()));
            }
        };

        let (body, content_type) = match self
            .formatters
            .format_response(&dispatch.envelope, accept_type)
        {
            Ok(formatted) => formatted,
            Err(err) => {
                return self.error_response(&err, accept_type, Some(dispatch.request_id.to_string()))
            }
        };

        let mut headers: Vec<(String, String)> = dispatch
            .cache
            .headers()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        headers.push((REQUEST_ID_HEADER.to_string(), dispatch.request_id.to_string()));

        GatewayResponse {
            status: StatusCode::OK,
            content_type,
            headers,
            body,
        }
    }

    fn error_response(
        &self,
        err: &crate::error::GatewayError,
        accept_type: &str,
        request_id: Option<String>,
    ) -> GatewayResponse {
        let formatted = self.errors.handle(err, accept_type);
        let mut headers = Vec::new();
        if let Some(id) = request_id {
            headers.push((REQUEST_ID_HEADER.to_string(), id));
        }
        GatewayResponse {
            status: formatted.status,
            content_type: formatted.content_type,
            headers,
            body: formatted.body,
        }
    }

    /// Stop the cache sweep; safe to call more than once
    pub fn shutdown(&self) {
        info!(stats = ?self.dispatcher.cache().stats(), "Gateway shutting down");
        self.dispatcher.cache().stop();
    }

    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    #[must_use]
    pub fn handlers(&self) -> &Arc<HandlerRegistry> {
        &self.handlers
    }

    #[must_use]
    pub fn mappers(&self) -> &Arc<MapperRegistry> {
        &self.mappers
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    #[must_use]
    pub fn formatters(&self) -> &Arc<FormatterRegistry> {
        &self.formatters
    }

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.dispatcher.cache().stats()
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("config", &self.config)
            .field("handlers", &self.handlers)
            .field("mappers", &self.mappers)
            .field("formatters", &self.formatters)
            .finish()
    }
}
