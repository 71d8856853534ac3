use super::models::{
    BackendMachine, MachineContext, NamedRef, DEFAULT_MACHINE_STATUS, DEFAULT_POWER_STATE,
};
use super::network::NetworkMapper;
use super::registry::{require_identity, TypedMapper};
use super::storage::StorageMapper;
use crate::error::{GatewayError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

/// Machines, with interfaces and block devices delegated to their own mappers
#[derive(Debug, Clone, Copy, Default)]
pub struct MachineMapper {
    network: NetworkMapper,
    storage: StorageMapper,
}

/// Map each nested backend element, logging and skipping the ones that fail
fn map_nested<M: TypedMapper>(
    mapper: &M,
    system_id: &str,
    items: Vec<Value>,
) -> Vec<M::Context> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let mapped = require_identity(M::NAME, &item, M::BACKEND_IDENTITY)
                .map(|_| ())
                .and_then(|()| decode::<M::Backend>(M::NAME, item))
                .and_then(|backend| mapper.to_context(backend));
            match mapped {
                Ok(ctx) => Some(ctx),
                Err(e) => {
                    warn!(
                        system_id = %system_id,
                        mapper = M::NAME,
                        index = index,
                        error = %e,
                        "Skipping nested element that failed to map"
                    );
                    None
                }
            }
        })
        .collect()
}

fn decode<T: DeserializeOwned>(resource: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| GatewayError::mapping(resource, e.to_string()))
}

fn encode_all<T: serde::Serialize>(resource: &str, items: Vec<T>) -> Result<Vec<Value>> {
    items
        .iter()
        .map(|item| {
            serde_json::to_value(item).map_err(|e| GatewayError::mapping(resource, e.to_string()))
        })
        .collect()
}

impl TypedMapper for MachineMapper {
    const NAME: &'static str = "machine";
    const BACKEND_IDENTITY: &'static [&'static str] = &["system_id", "hostname"];
    const CONTEXT_IDENTITY: &'static [&'static str] = &["id", "hostname"];

    type Backend = BackendMachine;
    type Context = MachineContext;

    fn to_context(&self, backend: BackendMachine) -> Result<MachineContext> {
        let interfaces = map_nested(&self.network, &backend.system_id, backend.interface_set);
        let block_devices = map_nested(&self.storage, &backend.system_id, backend.blockdevice_set);

        Ok(MachineContext {
            id: backend.system_id,
            hostname: backend.hostname,
            fqdn: backend.fqdn,
            status: backend
                .status_name
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_MACHINE_STATUS.to_string()),
            architecture: backend.architecture,
            power_state: backend
                .power_state
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_POWER_STATE.to_string()),
            power_type: backend.power_type,
            zone: backend.zone.map(|z| z.name),
            pool: backend.pool.map(|p| p.name),
            tags: backend.tag_names,
            cpu_count: backend.cpu_count,
            memory_mb: backend.memory,
            os: backend.osystem,
            distro_series: backend.distro_series,
            ip_addresses: backend.ip_addresses,
            interfaces,
            block_devices,
        })
    }

    fn to_backend(&self, context: MachineContext) -> Result<BackendMachine> {
        let interfaces = context
            .interfaces
            .into_iter()
            .map(|i| self.network.to_backend(i))
            .collect::<Result<Vec<_>>>()?;
        let devices = context
            .block_devices
            .into_iter()
            .map(|d| self.storage.to_backend(d))
            .collect::<Result<Vec<_>>>()?;

        Ok(BackendMachine {
            system_id: context.id,
            hostname: context.hostname,
            fqdn: context.fqdn,
            status_name: Some(context.status),
            architecture: context.architecture,
            power_state: Some(context.power_state),
            power_type: context.power_type,
            zone: context.zone.map(|name| NamedRef { name }),
            pool: context.pool.map(|name| NamedRef { name }),
            tag_names: context.tags,
            cpu_count: context.cpu_count,
            memory: context.memory_mb,
            osystem: context.os,
            distro_series: context.distro_series,
            ip_addresses: context.ip_addresses,
            interface_set: encode_all(NetworkMapper::NAME, interfaces)?,
            blockdevice_set: encode_all(StorageMapper::NAME, devices)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::mapper::ResourceMapper;
    use serde_json::json;

    fn backend() -> Value {
        json!({
            "system_id": "abc123",
            "hostname": "node-1",
            "fqdn": "node-1.maas",
            "status_name": "Deployed",
            "architecture": "amd64/generic",
            "power_state": "on",
            "zone": {"name": "default"},
            "pool": {"name": "prod"},
            "tag_names": ["virtual", "gpu", "gpu"],
            "cpu_count": 8,
            "memory": 16384,
            "osystem": "ubuntu",
            "distro_series": "jammy",
            "interface_set": [
                {"id": 1, "name": "eth0", "vlan": {"vid": 0}},
                {"name": "broken"}
            ],
            "blockdevice_set": [
                {"id": 5, "name": "sda", "size": 1000, "partitions": []},
                {"id": "not-a-number", "name": "sdb"}
            ]
        })
    }

    #[test]
    fn test_machine_to_context() {
        let ctx = MachineMapper::default().map_to_context(&backend()).unwrap();
        assert_eq!(ctx["id"], "abc123");
        assert_eq!(ctx["status"], "Deployed");
        assert_eq!(ctx["zone"], "default");
        assert_eq!(ctx["tags"], json!(["virtual", "gpu", "gpu"]));
        assert_eq!(ctx["memory_mb"], 16384);
    }

    #[test]
    fn test_nested_failures_are_skipped() {
        let ctx = MachineMapper::default().map_to_context(&backend()).unwrap();
        assert_eq!(ctx["interfaces"].as_array().unwrap().len(), 1);
        assert_eq!(ctx["interfaces"][0]["name"], "eth0");
        assert_eq!(ctx["block_devices"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_status_defaults_to_unknown() {
        let ctx = MachineMapper::default()
            .map_to_context(&json!({"system_id": "x", "hostname": "h"}))
            .unwrap();
        assert_eq!(ctx["status"], DEFAULT_MACHINE_STATUS);
        assert_eq!(ctx["power_state"], DEFAULT_POWER_STATE);
    }

    #[test]
    fn test_round_trip_preserves_identity() {
        let mapper = MachineMapper::default();
        let ctx = mapper.map_to_context(&backend()).unwrap();
        let back = mapper.map_to_backend(&ctx).unwrap();
        assert_eq!(back["system_id"], "abc123");
        assert_eq!(back["hostname"], "node-1");
        assert_eq!(back["tag_names"], backend()["tag_names"]);
        assert_eq!(back["zone"]["name"], "default");
        assert_eq!(back["interface_set"][0]["name"], "eth0");
        assert_eq!(back["blockdevice_set"][0]["size"], 1000);
    }

    #[test]
    fn test_top_level_failure_aborts() {
        let err = MachineMapper::default()
            .map_to_context(&json!({"system_id": "x"}))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = MachineMapper::default()
            .map_to_context(&json!({"system_id": "x", "hostname": "h", "cpu_count": "many"}))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Mapping);
    }
}
