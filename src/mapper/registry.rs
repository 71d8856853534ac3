use crate::error::{FieldError, GatewayError, Result};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Translation between a backend object and its gateway context object
///
/// Implementations are pure: they never call the backend.
pub trait ResourceMapper: Send + Sync {
    fn name(&self) -> &str;

    /// # Errors
    ///
    /// Validation error for structurally invalid input, mapping error when
    /// translation fails.
    fn map_to_context(&self, backend: &Value) -> Result<Value>;

    /// # Errors
    ///
    /// See [`ResourceMapper::map_to_context`].
    fn map_to_backend(&self, context: &Value) -> Result<Value>;
}

/// Strongly typed mapper; every implementation is also a [`ResourceMapper`]
///
/// The blanket adapter runs the structural check, deserializes into the typed
/// model, maps, and serializes the result.
pub trait TypedMapper: Send + Sync {
    /// Registry name (e.g. `machine`)
    const NAME: &'static str;
    /// Identity fields the backend object must carry
    const BACKEND_IDENTITY: &'static [&'static str];
    /// Identity fields the context object must carry
    const CONTEXT_IDENTITY: &'static [&'static str];

    type Backend: Serialize + DeserializeOwned;
    type Context: Serialize + DeserializeOwned;

    /// # Errors
    ///
    /// Returns a mapping or validation error when the object cannot be translated.
    fn to_context(&self, backend: Self::Backend) -> Result<Self::Context>;

    /// # Errors
    ///
    /// Returns a mapping or validation error when the object cannot be translated.
    fn to_backend(&self, context: Self::Context) -> Result<Self::Backend>;
}

/// Check that `value` is an object carrying non-null, non-empty identity fields
///
/// # Errors
///
/// Returns a validation error listing every missing field.
pub fn require_identity<'a>(
    resource: &str,
    value: &'a Value,
    fields: &[&str],
) -> Result<&'a Map<String, Value>> {
    let map = value.as_object().ok_or_else(|| {
        GatewayError::invalid_field(resource, format!("{resource} must be a JSON object"), "type")
    })?;
    let errors: Vec<FieldError> = fields
        .iter()
        .filter(|field| match map.get(**field) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(_) => false,
        })
        .map(|field| FieldError::new(*field, format!("{resource} requires '{field}'"), "required"))
        .collect();
    if errors.is_empty() {
        Ok(map)
    } else {
        Err(GatewayError::Validation {
            message: format!("invalid {resource}: missing identity fields"),
            errors,
        })
    }
}

fn decode<T: DeserializeOwned>(resource: &str, value: &Value) -> Result<T> {
    serde_json::from_value(value.clone()).map_err(|e| GatewayError::mapping(resource, e.to_string()))
}

fn encode<T: Serialize>(resource: &str, value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| GatewayError::mapping(resource, e.to_string()))
}

impl<M: TypedMapper> ResourceMapper for M {
    fn name(&self) -> &str {
        M::NAME
    }

    fn map_to_context(&self, backend: &Value) -> Result<Value> {
        require_identity(M::NAME, backend, M::BACKEND_IDENTITY)?;
        let typed: M::Backend = decode(M::NAME, backend)?;
        encode(M::NAME, &self.to_context(typed)?)
    }

    fn map_to_backend(&self, context: &Value) -> Result<Value> {
        require_identity(M::NAME, context, M::CONTEXT_IDENTITY)?;
        let typed: M::Context = decode(M::NAME, context)?;
        encode(M::NAME, &self.to_backend(typed)?)
    }
}

/// Name-keyed mapper registry
///
/// Populated at startup and read concurrently afterwards.
#[derive(Default)]
pub struct MapperRegistry {
    mappers: RwLock<HashMap<String, Arc<dyn ResourceMapper>>>,
}

impl MapperRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `mapper` under `name`
    ///
    /// # Errors
    ///
    /// Returns a validation error when `name` is empty or already registered.
    pub fn register(&self, name: &str, mapper: Arc<dyn ResourceMapper>) -> Result<()> {
        if name.trim().is_empty() {
            return Err(GatewayError::invalid_field(
                "mapper",
                "mapper name must not be empty",
                "required",
            ));
        }
        let mut guard = self.mappers.write();
        if guard.contains_key(name) {
            return Err(GatewayError::invalid_field(
                "mapper",
                format!("mapper '{name}' is already registered"),
                "duplicate",
            ));
        }
        guard.insert(name.to_string(), mapper);
        info!(mapper = %name, total_mappers = guard.len(), "Mapper registered");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns a not-found error when no mapper is registered under `name`.
    pub fn get(&self, name: &str) -> Result<Arc<dyn ResourceMapper>> {
        self.mappers
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| GatewayError::not_found(format!("no mapper registered for '{name}'")))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.mappers.read().contains_key(name)
    }

    /// Registered names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.mappers.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// # Errors
    ///
    /// Not-found for an unknown mapper; otherwise whatever the mapper returns.
    pub fn map_to_context(&self, name: &str, backend: &Value) -> Result<Value> {
        let mapper = self.get(name)?;
        debug!(mapper = %name, "Mapping backend object to context");
        mapper.map_to_context(backend)
    }

    /// # Errors
    ///
    /// Not-found for an unknown mapper; otherwise whatever the mapper returns.
    pub fn map_to_backend(&self, name: &str, context: &Value) -> Result<Value> {
        let mapper = self.get(name)?;
        debug!(mapper = %name, "Mapping context object to backend");
        mapper.map_to_backend(context)
    }

    /// Map every element of a backend collection, failing on the first error
    ///
    /// # Errors
    ///
    /// Validation error when `backend` is not an array; otherwise see
    /// [`MapperRegistry::map_to_context`].
    pub fn map_collection_to_context(&self, name: &str, backend: &Value) -> Result<Value> {
        let items = backend.as_array().ok_or_else(|| {
            GatewayError::invalid_field(name, "expected a collection", "type")
        })?;
        let mapper = self.get(name)?;
        items
            .iter()
            .map(|item| mapper.map_to_context(item))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array)
    }
}

impl std::fmt::Debug for MapperRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapperRegistry")
            .field("mappers", &self.names())
            .finish()
    }
}
