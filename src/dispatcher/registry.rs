use super::handler::ResourceHandler;
use crate::error::{GatewayError, Result};
use crate::router::{parse, UriMatch, UriPattern};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

struct Registered {
    handler: Arc<dyn ResourceHandler>,
    patterns: Vec<Arc<UriPattern>>,
}

#[derive(Default)]
struct Inner {
    /// Registration order
    handlers: Vec<Registered>,
    by_name: HashMap<String, usize>,
    /// Resource type → indexes into `handlers`, in registration order
    by_type: HashMap<String, Vec<usize>>,
    /// Handlers with a pattern whose resource type is a placeholder; tried
    /// after the typed candidates
    templated: Vec<usize>,
}

/// A resolved route: handler, the pattern that matched and its parameters
#[derive(Clone)]
pub struct HandlerMatch {
    pub handler: Arc<dyn ResourceHandler>,
    pub pattern: Arc<UriPattern>,
    pub uri_match: UriMatch,
}

impl std::fmt::Debug for HandlerMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerMatch")
            .field("handler", &self.handler.name())
            .field("pattern", &self.pattern.raw())
            .field("parameters", &self.uri_match.parameters)
            .finish()
    }
}

/// Name-keyed handler registry with patterns indexed by resource type
///
/// Patterns are compiled once at registration. Lookups take a shared lock, so
/// concurrent requests never block each other.
#[derive(Default)]
pub struct HandlerRegistry {
    inner: RwLock<Inner>,
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler and compile its patterns
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty or duplicate name, a handler with
    /// no patterns, or a pattern that fails to compile.
    pub fn register(&self, handler: Arc<dyn ResourceHandler>) -> Result<()> {
        let name = handler.name().to_string();
        if name.trim().is_empty() {
            return Err(GatewayError::invalid_field(
                "handler",
                "handler name must not be empty",
                "required",
            ));
        }

        let raw_patterns = handler.uri_patterns();
        if raw_patterns.is_empty() {
            return Err(GatewayError::invalid_field(
                "handler",
                format!("handler '{name}' declares no URI patterns"),
                "required",
            ));
        }
        let patterns = raw_patterns
            .iter()
            .map(|p| UriPattern::compile(p).map(Arc::new))
            .collect::<Result<Vec<_>>>()?;

        let mut inner = self.inner.write();
        if inner.by_name.contains_key(&name) {
            return Err(GatewayError::invalid_field(
                "handler",
                format!("handler '{name}' is already registered"),
                "duplicate",
            ));
        }

        let index = inner.handlers.len();
        for pattern in &patterns {
            if pattern.has_templated_type() {
                if !inner.templated.contains(&index) {
                    inner.templated.push(index);
                }
                continue;
            }
            let slots = inner.by_type.entry(pattern.resource_type.clone()).or_default();
            if !slots.contains(&index) {
                slots.push(index);
            }
        }
        inner.by_name.insert(name.clone(), index);
        inner.handlers.push(Registered { handler, patterns });

        info!(
            handler_name = %name,
            patterns = ?raw_patterns,
            total_handlers = inner.handlers.len(),
            "Handler registered successfully"
        );
        Ok(())
    }

    /// Resolve the first registered handler whose pattern matches `uri`
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed URI and a not-found error
    /// when no handler matches.
    pub fn get_handler(&self, uri: &str) -> Result<HandlerMatch> {
        let parsed = parse(uri)?;
        let inner = self.inner.read();

        let candidates = inner
            .by_type
            .get(&parsed.resource_type)
            .map(Vec::as_slice)
            .unwrap_or_default();

        debug!(
            uri = %uri,
            resource_type = %parsed.resource_type,
            candidates = candidates.len(),
            templated = inner.templated.len(),
            "Handler lookup"
        );

        let typed = candidates.iter().map(|&index| (index, false));
        let templated = inner.templated.iter().map(|&index| (index, true));
        for (index, templated_only) in typed.chain(templated) {
            let registered = &inner.handlers[index];
            for pattern in &registered.patterns {
                if templated_only && !pattern.has_templated_type() {
                    continue;
                }
                if !pattern.is_match(uri) {
                    continue;
                }
                let uri_match = pattern.match_uri(uri)?;
                if !registered.handler.can_handle(uri) {
                    debug!(
                        handler_name = %registered.handler.name(),
                        uri = %uri,
                        "Handler declined matching URI"
                    );
                    continue;
                }
                return Ok(HandlerMatch {
                    handler: Arc::clone(&registered.handler),
                    pattern: Arc::clone(pattern),
                    uri_match,
                });
            }
        }

        warn!(
            uri = %uri,
            resource_type = %parsed.resource_type,
            available_handlers = inner.handlers.len(),
            "No handler found for URI"
        );
        Err(GatewayError::not_found(format!(
            "no handler registered for URI '{}'",
            uri.trim()
        )))
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn ResourceHandler>> {
        let inner = self.inner.read();
        inner
            .by_name
            .get(name)
            .map(|&i| Arc::clone(&inner.handlers[i].handler))
    }

    /// Handler names in registration order
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.inner
            .read()
            .handlers
            .iter()
            .map(|r| r.handler.name().to_string())
            .collect()
    }

    /// Every registered pattern with its handler name, in registration order
    #[must_use]
    pub fn patterns(&self) -> Vec<(String, String)> {
        self.inner
            .read()
            .handlers
            .iter()
            .flat_map(|r| {
                r.patterns
                    .iter()
                    .map(|p| (r.handler.name().to_string(), p.raw().to_string()))
            })
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.names())
            .finish()
    }
}
