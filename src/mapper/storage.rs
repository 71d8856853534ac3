use super::models::{
    BackendBlockDevice, BackendFilesystem, BackendPartition, BlockDeviceContext, PartitionContext,
};
use super::registry::TypedMapper;
use crate::error::{GatewayError, Result};

/// Block devices and their partitions
#[derive(Debug, Clone, Copy, Default)]
pub struct StorageMapper;

impl TypedMapper for StorageMapper {
    const NAME: &'static str = "storage";
    const BACKEND_IDENTITY: &'static [&'static str] = &["id", "name"];
    const CONTEXT_IDENTITY: &'static [&'static str] = &["id", "name"];

    type Backend = BackendBlockDevice;
    type Context = BlockDeviceContext;

    fn to_context(&self, backend: BackendBlockDevice) -> Result<BlockDeviceContext> {
        let used: u64 = backend.partitions.iter().map(|p| p.size).sum();
        if backend.size > 0 && used > backend.size {
            return Err(GatewayError::mapping(
                Self::NAME,
                format!(
                    "partitions of '{}' use {used} bytes but the device holds {}",
                    backend.name, backend.size
                ),
            ));
        }
        Ok(BlockDeviceContext {
            id: backend.id,
            name: backend.name,
            device_type: backend.device_type,
            size_bytes: backend.size,
            model: backend.model,
            serial: backend.serial,
            path: backend.path,
            tags: backend.tags,
            partitions: backend
                .partitions
                .into_iter()
                .map(|p| {
                    let (fstype, mount_point, label) = match p.filesystem {
                        Some(fs) => (Some(fs.fstype), fs.mount_point, fs.label),
                        None => (None, None, None),
                    };
                    PartitionContext {
                        id: p.id,
                        size_bytes: p.size,
                        path: p.path,
                        fstype,
                        mount_point,
                        label,
                    }
                })
                .collect(),
        })
    }

    fn to_backend(&self, context: BlockDeviceContext) -> Result<BackendBlockDevice> {
        Ok(BackendBlockDevice {
            id: context.id,
            name: context.name,
            device_type: context.device_type,
            size: context.size_bytes,
            model: context.model,
            serial: context.serial,
            path: context.path,
            tags: context.tags,
            partitions: context
                .partitions
                .into_iter()
                .map(|p| BackendPartition {
                    id: p.id,
                    size: p.size_bytes,
                    path: p.path,
                    // A mount point or label without a filesystem type has nowhere to go
                    filesystem: p.fstype.map(|fstype| BackendFilesystem {
                        fstype,
                        mount_point: p.mount_point,
                        label: p.label,
                    }),
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::mapper::ResourceMapper;
    use serde_json::json;

    fn device() -> serde_json::Value {
        json!({
            "id": 3,
            "name": "sda",
            "type": "physical",
            "size": 1000,
            "model": "QEMU HARDDISK",
            "partitions": [
                {"id": 10, "size": 600, "filesystem": {"fstype": "ext4", "mount_point": "/"}},
                {"id": 11, "size": 200}
            ]
        })
    }

    #[test]
    fn test_block_device_to_context() {
        let ctx = StorageMapper.map_to_context(&device()).unwrap();
        assert_eq!(ctx["size_bytes"], 1000);
        assert_eq!(ctx["partitions"][0]["fstype"], "ext4");
        assert_eq!(ctx["partitions"][0]["mount_point"], "/");
        assert!(ctx["partitions"][1].get("fstype").is_none());
    }

    #[test]
    fn test_round_trip_keeps_partitions() {
        let ctx = StorageMapper.map_to_context(&device()).unwrap();
        let back = StorageMapper.map_to_backend(&ctx).unwrap();
        assert_eq!(back["size"], 1000);
        assert_eq!(back["partitions"][0]["filesystem"]["fstype"], "ext4");
        assert_eq!(back["partitions"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_overcommitted_partitions_fail() {
        let mut bad = device();
        bad["size"] = json!(500);
        assert_eq!(
            StorageMapper.map_to_context(&bad).unwrap_err().kind(),
            ErrorKind::Mapping
        );
    }
}
