//! Dispatcher core: the per-request pipeline.
//!
//! parse → route → validate → options → cache lookup → handler → filter →
//! paginate → envelope → cache store

use super::handler::{RequestContext, ResourceRequest, ResourceResponse, DEFAULT_CONTENT_TYPE};
use super::registry::{HandlerMatch, HandlerRegistry};
use crate::cache::{generate_key, CacheConfig, CacheOptions, CacheOutcome, ResourceCache};
use crate::error::{GatewayError, Result};
use crate::filter::{filter_json_collection, parse_filter};
use crate::format::normalize_content_type;
use crate::ids::RequestId;
use crate::mapper::MapperRegistry;
use crate::pagination::{apply_pagination, parse_pagination_params, PaginationConfig, PaginationOptions};
use crate::validator::{CompositeValidator, QueryParamValidator, UriValidator, Validator};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Content types a request payload may be sent as
pub const SUPPORTED_REQUEST_TYPES: &[&str] = &["application/json", "application/xml", "text/xml"];

/// Query parameter carrying the filter expression
pub const FILTER_PARAM: &str = "filter";

/// Settings for the request pipeline
#[derive(Debug, Clone, Default)]
pub struct DispatcherConfig {
    /// Accepted URI schemes; empty accepts any
    pub schemes: Vec<String>,
    pub cache: CacheConfig,
    pub pagination: PaginationConfig,
}

/// Result of one dispatch: the envelope and how the cache took part
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub envelope: Arc<ResourceResponse>,
    pub cache: CacheOutcome,
    pub request_id: RequestId,
}

/// Runs the request pipeline against registered handlers
pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
    mappers: Arc<MapperRegistry>,
    cache: Arc<ResourceCache<Arc<ResourceResponse>>>,
    validators: CompositeValidator,
    /// Scheme check, run before routing
    uri_check: Option<UriValidator>,
    config: DispatcherConfig,
}

impl Dispatcher {
    /// Create a dispatcher with the standard query rules and, when schemes are
    /// configured, a scheme check ahead of routing
    #[must_use]
    pub fn new(
        registry: Arc<HandlerRegistry>,
        mappers: Arc<MapperRegistry>,
        config: DispatcherConfig,
    ) -> Self {
        let cache = Arc::new(ResourceCache::new(config.cache));
        Self::with_cache(registry, mappers, cache, config)
    }

    /// Create a dispatcher around an existing cache
    ///
    /// The standard validators are the URI validator, bound to `registry`, followed
    /// by the query rules for `filter`, `limit`, `offset` and `page`.
    #[must_use]
    pub fn with_cache(
        registry: Arc<HandlerRegistry>,
        mappers: Arc<MapperRegistry>,
        cache: Arc<ResourceCache<Arc<ResourceResponse>>>,
        config: DispatcherConfig,
    ) -> Self {
        let uri_validator = UriValidator::new()
            .with_schemes(&config.schemes)
            .with_registry(Arc::clone(&registry));
        let validators = CompositeValidator::new()
            .with(Arc::new(uri_validator))
            .with(Arc::new(QueryParamValidator::standard()));
        let uri_check = (!config.schemes.is_empty())
            .then(|| UriValidator::new().with_schemes(&config.schemes));
        Self {
            registry,
            mappers,
            cache,
            validators,
            uri_check,
            config,
        }
    }

    /// Add a validator that runs for every request, after the built-in ones
    pub fn add_validator(&mut self, validator: Arc<dyn Validator>) {
        self.validators.push(validator);
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn mappers(&self) -> &Arc<MapperRegistry> {
        &self.mappers
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<ResourceCache<Arc<ResourceResponse>>> {
        &self.cache
    }

    #[must_use]
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Dispatch and return an owned envelope
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::execute`].
    pub fn dispatch(
        &self,
        uri: &str,
        content_type: &str,
        accept_type: &str,
        payload: Option<Value>,
    ) -> Result<ResourceResponse> {
        self.execute(uri, content_type, accept_type, payload)
            .map(|d| ResourceResponse::clone(&d.envelope))
    }

    /// Run the full pipeline for one call under a fresh request id
    ///
    /// # Errors
    ///
    /// * unsupported: a payload sent with an unsupported content type
    /// * validation: malformed URI, query parameters or payload
    /// * not-found: no handler matches the URI
    /// * anything the handler returns, unchanged
    pub fn execute(
        &self,
        uri: &str,
        content_type: &str,
        accept_type: &str,
        payload: Option<Value>,
    ) -> Result<Dispatch> {
        self.execute_as(RequestId::new(), uri, content_type, accept_type, payload)
    }

    /// Run the full pipeline under `request_id`
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::execute`].
    pub fn execute_as(
        &self,
        request_id: RequestId,
        uri: &str,
        content_type: &str,
        accept_type: &str,
        payload: Option<Value>,
    ) -> Result<Dispatch> {
        let start = Instant::now();
        let uri = uri.trim();

        info!(
            request_id = %request_id,
            uri = %uri,
            content_type = %content_type,
            accept = %accept_type,
            has_payload = payload.is_some(),
            "Dispatching resource request"
        );

        let content_type = check_content_type(content_type, payload.is_some())?;
        if let Some(check) = &self.uri_check {
            check.validate_uri(uri).into_result()?;
        }
        let route = self.registry.get_handler(uri)?;
        let mut request = self.build_request(request_id, uri, &route, content_type, accept_type, payload);
        let handler_name = route.handler.name().to_string();

        // standard, global then handler validators over the raw query, all errors collected
        let mut validators = self.validators.clone();
        validators.extend(route.handler.validators());
        let result = validators.validate(&request);
        if !result.valid {
            warn!(
                request_id = %request_id,
                handler_name = %handler_name,
                errors = ?result.errors,
                "Request validation failed"
            );
            return Err(result.into_error());
        }
        self.parse_options(&mut request)?;

        let cache_key = request
            .cache
            .enabled
            .then(|| generate_key(uri, &request.query_params));

        // cache lookup
        if let Some(key) = &cache_key {
            if let Some((cached, ttl)) = self.cache.get_with_ttl(key) {
                debug!(request_id = %request_id, handler_name = %handler_name, "Cache hit");
                let mut envelope = ResourceResponse::clone(&cached);
                envelope
                    .metadata
                    .insert("request_id".to_string(), Value::String(request_id.to_string()));
                envelope
                    .metadata
                    .insert("cache".to_string(), Value::String("hit".to_string()));
                return Ok(Dispatch {
                    envelope: Arc::new(envelope),
                    cache: CacheOutcome::Hit { ttl },
                    request_id,
                });
            }
        }

        // handler execution
        let ctx = RequestContext {
            request_id,
            handler_name: handler_name.clone(),
            mappers: Arc::clone(&self.mappers),
        };
        let handler_start = Instant::now();
        let data = route.handler.handle_request(&ctx, &request).map_err(|e| {
            error!(
                request_id = %request_id,
                handler_name = %handler_name,
                uri = %uri,
                error = %e,
                status = e.status().as_u16(),
                "Handler returned an error"
            );
            e
        })?;
        debug!(
            request_id = %request_id,
            handler_name = %handler_name,
            execution_time_ms = handler_start.elapsed().as_millis() as u64,
            "Handler execution complete"
        );

        let ttl = route.handler.cache_ttl().unwrap_or(request.cache.ttl);
        let outcome = match cache_key {
            Some(_) => CacheOutcome::Miss { ttl },
            None => CacheOutcome::Bypass,
        };

        let envelope = Arc::new(build_envelope(&request, &handler_name, data, outcome)?);

        // cache store
        if let Some(key) = cache_key {
            self.cache.set(key, Arc::clone(&envelope), ttl);
        }

        info!(
            request_id = %request_id,
            handler_name = %handler_name,
            cache = outcome.as_str(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Resource request complete"
        );

        Ok(Dispatch {
            envelope,
            cache: outcome,
            request_id,
        })
    }

    /// The routed request with its raw query; filter and pagination are filled in
    /// by [`Dispatcher::parse_options`] once validation passes
    fn build_request(
        &self,
        request_id: RequestId,
        uri: &str,
        route: &HandlerMatch,
        content_type: String,
        accept_type: &str,
        payload: Option<Value>,
    ) -> ResourceRequest {
        let parsed = route.uri_match.parsed.clone();
        let query_params = parsed.query_params.clone();

        let mut cache = CacheOptions::from_query(&query_params, &self.config.cache);
        if !route.handler.cacheable() || payload.is_some() {
            cache = CacheOptions {
                enabled: false,
                ..cache
            };
        }

        let accept_type = if accept_type.trim().is_empty() {
            DEFAULT_CONTENT_TYPE.to_string()
        } else {
            accept_type.trim().to_string()
        };

        ResourceRequest {
            request_id,
            uri: uri.to_string(),
            parsed,
            pattern: Arc::clone(&route.uri_match.pattern),
            path_params: route.uri_match.parameters.clone(),
            query_params,
            filter: None,
            pagination: PaginationOptions::from_offset(self.config.pagination.default_limit, 0),
            cache,
            payload,
            content_type,
            accept_type,
        }
    }

    /// Parse `filter` and the pagination parameters into the request
    fn parse_options(&self, request: &mut ResourceRequest) -> Result<()> {
        request.filter = match request.query_params.get(FILTER_PARAM) {
            Some(expr) if !expr.trim().is_empty() => Some(parse_filter(expr)?),
            _ => None,
        };
        request.pagination =
            parse_pagination_params(&request.query_params, &self.config.pagination)?;
        Ok(())
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("validators", &self.validators)
            .field("uri_check", &self.uri_check)
            .field("config", &self.config)
            .finish()
    }
}

/// Normalize the request content type and reject payloads of unsupported types
fn check_content_type(content_type: &str, has_payload: bool) -> Result<String> {
    if content_type.trim().is_empty() {
        return Ok(DEFAULT_CONTENT_TYPE.to_string());
    }
    let normalized = normalize_content_type(content_type);
    if has_payload && !SUPPORTED_REQUEST_TYPES.contains(&normalized.as_str()) {
        return Err(GatewayError::unsupported(format!(
            "unsupported content type '{content_type}'"
        )));
    }
    Ok(normalized)
}

/// Filter and paginate collections, then wrap the data with metadata and links
fn build_envelope(
    request: &ResourceRequest,
    handler_name: &str,
    data: Value,
    outcome: CacheOutcome,
) -> Result<ResourceResponse> {
    let base_uri = request.parsed.path_uri();

    let mut envelope = match data {
        Value::Array(_) => {
            let filtered = match &request.filter {
                Some(filter) => filter_json_collection(&data, filter)?,
                None => data,
            };
            let items = match filtered {
                Value::Array(items) => items,
                other => vec![other],
            };
            let page = apply_pagination(&items, &request.pagination)?;
            let meta = page.meta();
            let mut envelope = ResourceResponse::new(Value::Array(page.items))
                .with_metadata("total_count", meta.total_count);
            envelope.links = meta.links(&base_uri, &request.query_params);
            envelope.pagination = Some(meta);
            envelope
        }
        other => {
            if request.filter.is_some() {
                debug!(
                    request_id = %request.request_id,
                    "Filter ignored for a single resource"
                );
            }
            ResourceResponse::new(other)
        }
    };

    envelope = envelope
        .with_metadata("handler", handler_name)
        .with_metadata("request_id", request.request_id.to_string())
        .with_metadata("resource_type", request.resource_type())
        .with_metadata("cache", outcome.as_str())
        .with_link("self", request.uri.clone());
    if let Some(id) = request.resource_id() {
        envelope = envelope.with_metadata("resource_id", id);
    }
    Ok(envelope)
}

