//! Backend and context models for the built-in mappers.
//!
//! Backend types mirror the field names of the infrastructure API. Context types
//! are what the gateway hands to clients; serde aliases accept the backend names
//! too, and the filter field tables honour the same aliases.

use crate::filter::{FieldTable, FieldValue, Filterable};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_MACHINE_STATUS: &str = "Unknown";
pub const DEFAULT_POWER_STATE: &str = "unknown";
pub const DEFAULT_TAG_CATEGORY: &str = "general";
pub const DEFAULT_TAG_COLOR: &str = "#808080";

/// `{ "name": ... }` reference used for zones and pools
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
    pub name: String,
}

// ---------------------------------------------------------------------------
// Machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BackendMachine {
    pub system_id: String,
    pub hostname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<NamedRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool: Option<NamedRef>,
    #[serde(default)]
    pub tag_names: Vec<String>,
    #[serde(default)]
    pub cpu_count: u32,
    /// MiB
    #[serde(default)]
    pub memory: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub osystem: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distro_series: Option<String>,
    #[serde(default)]
    pub ip_addresses: Vec<String>,
    /// Kept untyped so one malformed interface does not fail the whole machine
    #[serde(default)]
    pub interface_set: Vec<Value>,
    #[serde(default)]
    pub blockdevice_set: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineContext {
    #[serde(alias = "system_id")]
    pub id: String,
    pub hostname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
    #[serde(default = "default_machine_status", alias = "status_name")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,
    #[serde(default = "default_power_state")]
    pub power_state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool: Option<String>,
    #[serde(default, alias = "tag_names")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub cpu_count: u32,
    #[serde(default, alias = "memory")]
    pub memory_mb: u64,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "osystem")]
    pub os: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distro_series: Option<String>,
    #[serde(default)]
    pub ip_addresses: Vec<String>,
    #[serde(default)]
    pub interfaces: Vec<NetworkInterfaceContext>,
    #[serde(default)]
    pub block_devices: Vec<BlockDeviceContext>,
}

fn default_machine_status() -> String {
    DEFAULT_MACHINE_STATUS.to_string()
}

fn default_power_state() -> String {
    DEFAULT_POWER_STATE.to_string()
}

static MACHINE_FIELDS: Lazy<FieldTable<MachineContext>> = Lazy::new(|| {
    FieldTable::<MachineContext>::new()
        .field("id", &["system_id"], |m| FieldValue::from(&m.id))
        .field("hostname", &["name"], |m| FieldValue::from(&m.hostname))
        .field("fqdn", &[], |m| FieldValue::from(m.fqdn.clone()))
        .field("status", &["status_name"], |m| FieldValue::from(&m.status))
        .field("architecture", &["arch"], |m| {
            FieldValue::from(m.architecture.clone())
        })
        .field("power_state", &[], |m| FieldValue::from(&m.power_state))
        .field("power_type", &[], |m| FieldValue::from(m.power_type.clone()))
        .field("zone", &[], |m| FieldValue::from(m.zone.clone()))
        .field("pool", &[], |m| FieldValue::from(m.pool.clone()))
        .field("tags", &["tag_names"], |m| FieldValue::from(&m.tags))
        .field("cpu_count", &["cpus"], |m| FieldValue::from(m.cpu_count))
        .field("memory_mb", &["memory"], |m| FieldValue::from(m.memory_mb))
        .field("os", &["osystem"], |m| FieldValue::from(m.os.clone()))
        .field("distro_series", &[], |m| {
            FieldValue::from(m.distro_series.clone())
        })
        .field("ip_addresses", &[], |m| FieldValue::from(&m.ip_addresses))
});

impl Filterable for MachineContext {
    fn field_value(&self, name: &str) -> Option<FieldValue> {
        MACHINE_FIELDS.lookup(self, name)
    }
}

// ---------------------------------------------------------------------------
// Network interface
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendVlan {
    pub vid: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fabric: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSubnet {
    pub cidr: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendLink {
    pub mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet: Option<BackendSubnet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendInterface {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type", default = "default_interface_type")]
    pub interface_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlan: Option<BackendVlan>,
    #[serde(default)]
    pub links: Vec<BackendLink>,
}

fn default_interface_type() -> String {
    "physical".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkContext {
    pub mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet_cidr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkInterfaceContext {
    pub id: i64,
    pub name: String,
    #[serde(alias = "type", default = "default_interface_type")]
    pub interface_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlan_id: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlan_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fabric: Option<String>,
    #[serde(default)]
    pub links: Vec<LinkContext>,
}

static INTERFACE_FIELDS: Lazy<FieldTable<NetworkInterfaceContext>> = Lazy::new(|| {
    FieldTable::<NetworkInterfaceContext>::new()
        .field("id", &[], |i| FieldValue::from(i.id))
        .field("name", &[], |i| FieldValue::from(&i.name))
        .field("interface_type", &["type"], |i| {
            FieldValue::from(&i.interface_type)
        })
        .field("mac_address", &["mac"], |i| {
            FieldValue::from(i.mac_address.clone())
        })
        .field("enabled", &[], |i| FieldValue::from(i.enabled))
        .field("vlan_id", &["vid"], |i| {
            FieldValue::from(i.vlan_id.map(u32::from))
        })
        .field("fabric", &[], |i| FieldValue::from(i.fabric.clone()))
});

impl Filterable for NetworkInterfaceContext {
    fn field_value(&self, name: &str) -> Option<FieldValue> {
        INTERFACE_FIELDS.lookup(self, name)
    }
}

// ---------------------------------------------------------------------------
// Block device
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendFilesystem {
    pub fstype: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount_point: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendPartition {
    pub id: i64,
    /// Bytes
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filesystem: Option<BackendFilesystem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendBlockDevice {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type", default = "default_device_type")]
    pub device_type: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub partitions: Vec<BackendPartition>,
}

fn default_device_type() -> String {
    "physical".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionContext {
    pub id: i64,
    pub size_bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fstype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount_point: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDeviceContext {
    pub id: i64,
    pub name: String,
    #[serde(alias = "type", default = "default_device_type")]
    pub device_type: String,
    #[serde(default, alias = "size")]
    pub size_bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub partitions: Vec<PartitionContext>,
}

impl BlockDeviceContext {
    /// Bytes not covered by any partition
    #[must_use]
    pub fn unpartitioned_bytes(&self) -> u64 {
        let used: u64 = self.partitions.iter().map(|p| p.size_bytes).sum();
        self.size_bytes.saturating_sub(used)
    }
}

static BLOCK_DEVICE_FIELDS: Lazy<FieldTable<BlockDeviceContext>> = Lazy::new(|| {
    FieldTable::<BlockDeviceContext>::new()
        .field("id", &[], |d| FieldValue::from(d.id))
        .field("name", &[], |d| FieldValue::from(&d.name))
        .field("device_type", &["type"], |d| FieldValue::from(&d.device_type))
        .field("size_bytes", &["size"], |d| FieldValue::from(d.size_bytes))
        .field("model", &[], |d| FieldValue::from(d.model.clone()))
        .field("serial", &[], |d| FieldValue::from(d.serial.clone()))
        .field("tags", &[], |d| FieldValue::from(&d.tags))
        .field("partition_count", &[], |d| {
            FieldValue::from(d.partitions.len() as u64)
        })
});

impl Filterable for BlockDeviceContext {
    fn field_value(&self, name: &str) -> Option<FieldValue> {
        BLOCK_DEVICE_FIELDS.lookup(self, name)
    }
}

// ---------------------------------------------------------------------------
// Tag
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendTag {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernel_opts: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagContext {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "comment")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernel_opts: Option<String>,
    #[serde(default = "default_tag_category")]
    pub category: String,
    #[serde(default = "default_tag_color", alias = "colour")]
    pub color: String,
}

fn default_tag_category() -> String {
    DEFAULT_TAG_CATEGORY.to_string()
}

fn default_tag_color() -> String {
    DEFAULT_TAG_COLOR.to_string()
}

static TAG_FIELDS: Lazy<FieldTable<TagContext>> = Lazy::new(|| {
    FieldTable::<TagContext>::new()
        .field("name", &[], |t| FieldValue::from(&t.name))
        .field("description", &["comment"], |t| {
            FieldValue::from(t.description.clone())
        })
        .field("definition", &[], |t| FieldValue::from(t.definition.clone()))
        .field("category", &[], |t| FieldValue::from(&t.category))
        .field("color", &["colour"], |t| FieldValue::from(&t.color))
});

impl Filterable for TagContext {
    fn field_value(&self, name: &str) -> Option<FieldValue> {
        TAG_FIELDS.lookup(self, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{apply_filters, parse_filter};
    use serde_json::json;

    #[test]
    fn test_context_accepts_backend_aliases() {
        let machine: MachineContext = serde_json::from_value(json!({
            "system_id": "abc",
            "hostname": "node-1",
            "tag_names": ["gpu"],
            "memory": 4096
        }))
        .unwrap();
        assert_eq!(machine.id, "abc");
        assert_eq!(machine.status, DEFAULT_MACHINE_STATUS);
        assert_eq!(machine.tags, vec!["gpu"]);
        assert_eq!(machine.memory_mb, 4096);
    }

    #[test]
    fn test_typed_records_filter_through_aliases() {
        let tags: Vec<TagContext> = serde_json::from_value(json!([
            {"name": "gpu", "comment": "accelerated"},
            {"name": "virtual", "category": "infra"}
        ]))
        .unwrap();
        let filter = parse_filter("category eq general and COMMENT contains accel").unwrap();
        let matched = apply_filters(&tags, &filter);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].name, "gpu");
    }

    #[test]
    fn test_unpartitioned_bytes() {
        let device: BlockDeviceContext = serde_json::from_value(json!({
            "id": 1, "name": "sda", "size": 1000,
            "partitions": [{"id": 1, "size_bytes": 400}, {"id": 2, "size_bytes": 100}]
        }))
        .unwrap();
        assert_eq!(device.unpartitioned_bytes(), 500);
    }
}
