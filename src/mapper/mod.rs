//! # Mapper Module
//!
//! Bidirectional translation between backend objects (as the infrastructure API
//! returns them) and gateway context objects (as clients see them).
//!
//! ## Overview
//!
//! | Name | Backend | Context |
//! |------|---------|---------|
//! | `machine` | [`BackendMachine`] | [`MachineContext`] |
//! | `network` | [`BackendInterface`] | [`NetworkInterfaceContext`] |
//! | `storage` | [`BackendBlockDevice`] | [`BlockDeviceContext`] |
//! | `tag` | [`BackendTag`] | [`TagContext`] |
//!
//! Every mapper first checks the input structurally (identity fields present),
//! then maps field by field and fills defaults for fields absent on one side.
//! A machine delegates its interfaces and block devices to the network and
//! storage mappers; a nested element that fails is logged and skipped, while a
//! failure of the machine itself aborts the call.
//!
//! Handlers reach the registry through
//! [`RequestContext::mappers`](crate::dispatcher::RequestContext).
//!
//! ## Example
//!
//! ```rust
//! use resource_gateway::mapper::default_registry;
//! use serde_json::json;
//!
//! let registry = default_registry();
//! let tag = registry.map_to_context("tag", &json!({"name": "gpu"})).unwrap();
//! assert_eq!(tag["category"], "general");
//! assert_eq!(tag["color"], "#808080");
//! assert!(registry.map_to_context("subnet", &json!({})).is_err());
//! ```

mod machine;
mod models;
mod network;
mod registry;
mod storage;
mod tag;

pub use machine::MachineMapper;
pub use models::*;
pub use network::NetworkMapper;
pub use registry::{require_identity, MapperRegistry, ResourceMapper, TypedMapper};
pub use storage::StorageMapper;
pub use tag::TagMapper;

use std::sync::Arc;
use tracing::error;

/// A registry holding the `machine`, `network`, `storage` and `tag` mappers
#[must_use]
pub fn default_registry() -> MapperRegistry {
    let registry = MapperRegistry::new();
    let builtins: [Arc<dyn ResourceMapper>; 4] = [
        Arc::new(MachineMapper::default()),
        Arc::new(NetworkMapper),
        Arc::new(StorageMapper),
        Arc::new(TagMapper),
    ];
    for mapper in builtins {
        let name = mapper.name().to_string();
        if let Err(e) = registry.register(&name, mapper) {
            error!(mapper = %name, error = %e, "Failed to register built-in mapper");
        }
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::{json, Value};

    struct Passthrough;

    impl ResourceMapper for Passthrough {
        fn name(&self) -> &str {
            "passthrough"
        }
        fn map_to_context(&self, backend: &Value) -> crate::error::Result<Value> {
            Ok(backend.clone())
        }
        fn map_to_backend(&self, context: &Value) -> crate::error::Result<Value> {
            Ok(context.clone())
        }
    }

    #[test]
    fn test_default_registry_names() {
        assert_eq!(
            default_registry().names(),
            vec!["machine", "network", "storage", "tag"]
        );
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let registry = default_registry();
        let err = registry.register("tag", Arc::new(TagMapper)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(registry.register("passthrough", Arc::new(Passthrough)).is_ok());
        assert!(registry.contains("passthrough"));
    }

    #[test]
    fn test_unknown_mapper_is_not_found() {
        let registry = MapperRegistry::new();
        assert_eq!(
            registry.map_to_backend("machine", &json!({})).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_map_collection() {
        let registry = default_registry();
        let out = registry
            .map_collection_to_context("tag", &json!([{"name": "a"}, {"name": "b", "color": "#000000"}]))
            .unwrap();
        assert_eq!(out[1]["color"], "#000000");
        assert!(registry
            .map_collection_to_context("tag", &json!({"name": "a"}))
            .is_err());
    }
}
