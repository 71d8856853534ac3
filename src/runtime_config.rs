//! # Runtime Configuration Module
//!
//! Gateway settings come from an optional YAML file, then `RGW_*`
//! environment variables override individual values.
//!
//! ## YAML Layout
//!
//! ```yaml
//! schemes: [maas]
//! cache:
//!   enabled: true
//!   default_ttl_secs: 300
//!   capacity: 1000
//!   sweep_interval_secs: 60
//! pagination:
//!   default_limit: 50
//!   max_limit: 1000
//! errors:
//!   debug: false
//! ```
//!
//! Every section and field is optional.
//!
//! ## Environment Variables
//!
//! | Variable | Field |
//! |----------|-------|
//! | `RGW_SCHEMES` | `schemes` (comma-separated) |
//! | `RGW_CACHE_ENABLED` | `cache.enabled` |
//! | `RGW_CACHE_TTL_SECS` | `cache.default_ttl_secs` |
//! | `RGW_CACHE_CAPACITY` | `cache.capacity` |
//! | `RGW_CACHE_SWEEP_SECS` | `cache.sweep_interval_secs` |
//! | `RGW_DEFAULT_LIMIT` | `pagination.default_limit` |
//! | `RGW_MAX_LIMIT` | `pagination.max_limit` |
//! | `RGW_DEBUG_ERRORS` | `errors.debug` |
//!
//! Unparsable values are ignored with a warning and the previous value is kept.
//!
//! ## Usage
//!
//! ```rust
//! use resource_gateway::runtime_config::GatewayConfig;
//!
//! let config = GatewayConfig::from_env();
//! assert!(config.pagination.max_limit >= config.pagination.default_limit);
//! ```

use crate::cache::CacheConfig;
use crate::dispatcher::DispatcherConfig;
use crate::pagination::PaginationConfig;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

/// Error reporting settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorConfig {
    /// Add a stack trace to error envelopes
    pub debug: bool,
}

/// Complete gateway configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Accepted URI schemes; empty accepts any
    pub schemes: Vec<String>,
    pub cache: CacheConfig,
    pub pagination: PaginationConfig,
    pub errors: ErrorConfig,
}

impl GatewayConfig {
    /// Defaults with `RGW_*` overrides applied
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|key| env::var(key).ok());
        config
    }

    /// Load a YAML file, then apply `RGW_*` overrides
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or parsed, or the result is
    /// inconsistent (see [`GatewayConfig::validate`]).
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let mut config = Self::from_yaml_str(&text)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        config.apply_overrides(|key| env::var(key).ok());
        config.validate()?;
        info!(
            path = %path.display(),
            schemes = ?config.schemes,
            cache_enabled = config.cache.enabled,
            "Loaded gateway configuration"
        );
        Ok(config)
    }

    /// Parse YAML without consulting the environment
    ///
    /// # Errors
    ///
    /// Fails on malformed YAML or an inconsistent configuration.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: Self = if text.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(text).context("failed to parse gateway config")?
        };
        config.validate()?;
        Ok(config)
    }

    /// Override fields from a variable source
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(schemes) = lookup("RGW_SCHEMES") {
            self.schemes = schemes
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        override_value(&lookup, "RGW_CACHE_ENABLED", &mut self.cache.enabled);
        override_value(&lookup, "RGW_CACHE_TTL_SECS", &mut self.cache.default_ttl_secs);
        override_value(&lookup, "RGW_CACHE_CAPACITY", &mut self.cache.capacity);
        override_value(&lookup, "RGW_CACHE_SWEEP_SECS", &mut self.cache.sweep_interval_secs);
        override_value(&lookup, "RGW_DEFAULT_LIMIT", &mut self.pagination.default_limit);
        override_value(&lookup, "RGW_MAX_LIMIT", &mut self.pagination.max_limit);
        override_value(&lookup, "RGW_DEBUG_ERRORS", &mut self.errors.debug);
    }

    /// # Errors
    ///
    /// Fails when a pagination limit is zero or the default exceeds the max.
    pub fn validate(&self) -> Result<()> {
        let p = &self.pagination;
        if p.default_limit == 0 || p.max_limit == 0 {
            bail!("pagination limits must be greater than zero");
        }
        if p.default_limit > p.max_limit {
            bail!(
                "pagination.default_limit ({}) exceeds pagination.max_limit ({})",
                p.default_limit,
                p.max_limit
            );
        }
        if self.schemes.iter().any(|s| s.contains("://")) {
            bail!("schemes must be bare names such as 'maas'");
        }
        Ok(())
    }

    /// The subset the dispatcher needs
    #[must_use]
    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            schemes: self.schemes.clone(),
            cache: self.cache,
            pagination: self.pagination,
        }
    }
}

fn override_value<F, T>(lookup: &F, key: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse() {
        Ok(value) => *target = value,
        Err(_) => warn!(variable = %key, value = %raw, "Ignoring unparsable config override"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert!(config.schemes.is_empty());
        assert!(config.cache.enabled);
        assert_eq!(config.cache.default_ttl_secs, 300);
        assert_eq!(config.pagination.default_limit, 50);
        assert_eq!(config.pagination.max_limit, 1000);
        assert!(!config.errors.debug);
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_yaml() {
        let config = GatewayConfig::from_yaml_str(
            "schemes: [maas]\ncache:\n  default_ttl_secs: 30\nerrors:\n  debug: true\n",
        )
        .unwrap();
        assert_eq!(config.schemes, vec!["maas"]);
        assert_eq!(config.cache.default_ttl_secs, 30);
        assert_eq!(config.cache.capacity, 1000);
        assert!(config.errors.debug);
        assert_eq!(GatewayConfig::from_yaml_str("").unwrap(), GatewayConfig::default());
    }

    #[test]
    fn test_invalid_yaml_and_limits() {
        assert!(GatewayConfig::from_yaml_str("cache: [").is_err());
        assert!(GatewayConfig::from_yaml_str("pagination:\n  default_limit: 0\n").is_err());
        assert!(GatewayConfig::from_yaml_str(
            "pagination:\n  default_limit: 100\n  max_limit: 10\n"
        )
        .is_err());
        assert!(GatewayConfig::from_yaml_str("schemes: ['maas://']").is_err());
    }

    #[test]
    fn test_overrides() {
        let mut config = GatewayConfig::default();
        config.apply_overrides(lookup(&[
            ("RGW_SCHEMES", "maas, lxd ,"),
            ("RGW_CACHE_ENABLED", "false"),
            ("RGW_CACHE_CAPACITY", "12"),
            ("RGW_MAX_LIMIT", "not-a-number"),
            ("RGW_DEBUG_ERRORS", "true"),
        ]));
        assert_eq!(config.schemes, vec!["maas", "lxd"]);
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.capacity, 12);
        assert_eq!(config.pagination.max_limit, 1000);
        assert!(config.errors.debug);

        let dispatcher = config.dispatcher_config();
        assert_eq!(dispatcher.schemes, config.schemes);
        assert_eq!(dispatcher.cache, config.cache);
    }
}
