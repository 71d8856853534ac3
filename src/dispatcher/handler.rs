use crate::cache::CacheOptions;
use crate::error::Result;
use crate::filter::FilterGroup;
use crate::ids::RequestId;
use crate::mapper::MapperRegistry;
use crate::pagination::{PaginationMeta, PaginationOptions};
use crate::router::{parse, ParamVec, ParsedUri};
use crate::validator::Validator;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Content type assumed when a caller sends none
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Everything the pipeline derived from one inbound call
///
/// Built once by the dispatcher and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ResourceRequest {
    pub request_id: RequestId,
    /// The URI as received, trimmed
    pub uri: String,
    pub parsed: ParsedUri,
    /// Raw pattern of the handler that matched, empty before routing
    pub pattern: Arc<str>,
    /// One entry per declared pattern parameter
    pub path_params: ParamVec,
    pub query_params: BTreeMap<String, String>,
    pub filter: Option<FilterGroup>,
    pub pagination: PaginationOptions,
    pub cache: CacheOptions,
    pub payload: Option<Value>,
    pub content_type: String,
    pub accept_type: String,
}

impl ResourceRequest {
    /// A request for `uri` with no routing information and default options
    ///
    /// # Errors
    ///
    /// Returns a validation error when the URI is malformed.
    pub fn from_uri(uri: &str) -> Result<Self> {
        let parsed = parse(uri)?;
        Ok(Self {
            request_id: RequestId::new(),
            uri: uri.trim().to_string(),
            query_params: parsed.query_params.clone(),
            parsed,
            pattern: Arc::from(""),
            path_params: ParamVec::new(),
            filter: None,
            pagination: PaginationOptions::from_offset(1, 0),
            cache: CacheOptions::disabled(),
            payload: None,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            accept_type: DEFAULT_CONTENT_TYPE.to_string(),
        })
    }

    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Get a path parameter; `None` when absent or empty
    ///
    /// Last write wins when a name repeats.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    }

    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn resource_type(&self) -> &str {
        &self.parsed.resource_type
    }

    #[must_use]
    pub fn resource_id(&self) -> Option<&str> {
        self.parsed.resource_id.as_deref()
    }
}

/// Per-call collaborators handed to a handler
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: RequestId,
    pub handler_name: String,
    pub mappers: Arc<MapperRegistry>,
}

/// Response envelope
///
/// Immutable once built; the cache shares it behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceResponse {
    pub data: Value,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub links: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationMeta>,
    pub created_at: DateTime<Utc>,
}

impl ResourceResponse {
    #[must_use]
    pub fn new(data: Value) -> Self {
        Self {
            data,
            metadata: BTreeMap::new(),
            links: BTreeMap::new(),
            pagination: None,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    #[must_use]
    pub fn with_link(mut self, rel: &str, uri: impl Into<String>) -> Self {
        self.links.insert(rel.to_string(), uri.into());
        self
    }

    #[must_use]
    pub fn get_metadata(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }
}

/// A resource handler bound to one or more URI patterns
///
/// Handlers are shared across threads and called concurrently; they return the
/// resource (an object) or a collection (an array) as JSON. Filtering and
/// pagination of collections happen after the handler returns.
pub trait ResourceHandler: Send + Sync {
    /// Unique registry name
    fn name(&self) -> &str;

    /// Patterns in the router syntax, e.g. `maas://machine/{system_id?}`
    fn uri_patterns(&self) -> Vec<String>;

    /// Final say on a URI that already matched one of the patterns
    fn can_handle(&self, _uri: &str) -> bool {
        true
    }

    /// # Errors
    ///
    /// Any [`GatewayError`](crate::error::GatewayError); it reaches the caller unchanged.
    fn handle_request(&self, ctx: &RequestContext, request: &ResourceRequest) -> Result<Value>;

    /// Extra validators run before [`ResourceHandler::handle_request`]
    fn validators(&self) -> Vec<Arc<dyn Validator>> {
        Vec::new()
    }

    /// Whether responses may be cached
    fn cacheable(&self) -> bool {
        true
    }

    /// TTL override for cached responses; `None` uses the configured default
    fn cache_ttl(&self) -> Option<Duration> {
        None
    }
}
