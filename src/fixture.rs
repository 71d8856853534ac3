//! Static resource handlers loaded from YAML
//!
//! Fixtures stand in for the backend when exercising the pipeline from the
//! CLI or from tests. Each fixture declares its patterns and a list of
//! records; a URI carrying the id parameter selects one record, otherwise the
//! whole list is returned and the dispatcher filters and paginates it.
//!
//! ```yaml
//! handlers:
//!   - name: machines
//!     patterns: ["maas://machine/{system_id?}"]
//!     id_field: system_id        # record field compared with the id
//!     id_param: system_id        # defaults to id_field
//!     mapper: machine            # optional, records are backend objects
//!     cache_ttl_secs: 30         # optional
//!     records:
//!       - { system_id: abc, hostname: node-1, status_name: Deployed }
//! ```

use crate::dispatcher::{HandlerRegistry, RequestContext, ResourceHandler, ResourceRequest};
use crate::error::{GatewayError, Result};
use anyhow::Context;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

fn default_cacheable() -> bool {
    true
}

/// One fixture as written in YAML
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureDef {
    pub name: String,
    pub patterns: Vec<String>,
    pub id_field: String,
    #[serde(default)]
    pub id_param: Option<String>,
    #[serde(default)]
    pub mapper: Option<String>,
    #[serde(default = "default_cacheable")]
    pub cacheable: bool,
    #[serde(default)]
    pub cache_ttl_secs: Option<u64>,
    #[serde(default)]
    pub records: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct FixtureFile {
    #[serde(default)]
    handlers: Vec<FixtureDef>,
}

/// A handler answering from an in-memory record list
#[derive(Debug, Clone)]
pub struct FixtureHandler {
    def: FixtureDef,
}

impl FixtureHandler {
    #[must_use]
    pub fn new(def: FixtureDef) -> Self {
        Self { def }
    }

    #[must_use]
    pub fn records(&self) -> &[Value] {
        &self.def.records
    }

    fn id_param(&self) -> &str {
        self.def.id_param.as_deref().unwrap_or(&self.def.id_field)
    }

    fn find(&self, id: &str) -> Option<&Value> {
        self.def.records.iter().find(|record| {
            match record.get(&self.def.id_field) {
                Some(Value::String(s)) => s == id,
                Some(other) => other.to_string() == id,
                None => false,
            }
        })
    }

    fn present(&self, ctx: &RequestContext, record: &Value) -> Result<Value> {
        match &self.def.mapper {
            Some(mapper) => ctx.mappers.map_to_context(mapper, record),
            None => Ok(record.clone()),
        }
    }
}

impl ResourceHandler for FixtureHandler {
    fn name(&self) -> &str {
        &self.def.name
    }

    fn uri_patterns(&self) -> Vec<String> {
        self.def.patterns.clone()
    }

    fn handle_request(&self, ctx: &RequestContext, request: &ResourceRequest) -> Result<Value> {
        match request.get_path_param(self.id_param()) {
            Some(id) => {
                let record = self.find(id).ok_or_else(|| {
                    GatewayError::not_found(format!("{} '{id}' not found", request.resource_type()))
                })?;
                self.present(ctx, record)
            }
            None => {
                debug!(
                    request_id = %ctx.request_id,
                    handler_name = %self.def.name,
                    records = self.def.records.len(),
                    "Serving fixture collection"
                );
                let all = Value::Array(self.def.records.clone());
                match &self.def.mapper {
                    Some(mapper) => ctx.mappers.map_collection_to_context(mapper, &all),
                    None => Ok(all),
                }
            }
        }
    }

    fn cacheable(&self) -> bool {
        self.def.cacheable
    }

    fn cache_ttl(&self) -> Option<Duration> {
        self.def.cache_ttl_secs.map(Duration::from_secs)
    }
}

/// Parse a fixture document
///
/// # Errors
///
/// Fails on malformed YAML or a fixture without a name, patterns or id field.
pub fn parse_fixtures(text: &str) -> anyhow::Result<Vec<FixtureHandler>> {
    let file: FixtureFile = serde_yaml::from_str(text).context("failed to parse fixtures")?;
    file.handlers
        .into_iter()
        .map(|def| {
            if def.name.trim().is_empty() || def.patterns.is_empty() || def.id_field.is_empty() {
                anyhow::bail!("fixture '{}' needs a name, patterns and an id_field", def.name);
            }
            Ok(FixtureHandler::new(def))
        })
        .collect()
}

/// Read a fixture file
///
/// # Errors
///
/// Fails when the file cannot be read or parsed.
pub fn load_fixtures(path: impl AsRef<Path>) -> anyhow::Result<Vec<FixtureHandler>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read fixtures {}", path.display()))?;
    parse_fixtures(&text).with_context(|| format!("invalid fixtures {}", path.display()))
}

/// Register every fixture; returns how many were registered
///
/// # Errors
///
/// Stops at the first registration error.
pub fn register_fixtures(
    registry: &HandlerRegistry,
    fixtures: Vec<FixtureHandler>,
) -> Result<usize> {
    let count = fixtures.len();
    for fixture in fixtures {
        registry.register(Arc::new(fixture))?;
    }
    Ok(count)
}
