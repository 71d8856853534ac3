#![allow(dead_code)]

pub mod temp_files {
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Write `content` to a fresh temporary file with the given extension
    pub fn create_temp(content: &str, ext: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix("rgw_test_")
            .suffix(&format!(".{ext}"))
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    pub fn create_temp_yaml(content: &str) -> NamedTempFile {
        create_temp(content, "yaml")
    }

    pub fn create_temp_json(content: &str) -> NamedTempFile {
        create_temp(content, "json")
    }
}

pub mod handlers {
    use resource_gateway::dispatcher::{RequestContext, ResourceHandler, ResourceRequest};
    use resource_gateway::error::{GatewayError, Result};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Backend machine records as the infrastructure API returns them
    pub fn backend_machines(count: usize) -> Value {
        Value::Array(
            (1..=count)
                .map(|i| {
                    json!({
                        "system_id": format!("m{i:03}"),
                        "hostname": format!("node-{i}"),
                        "status_name": if i % 4 == 0 { "Deployed" } else { "Ready" },
                        "power_state": if i % 2 == 0 { "on" } else { "off" },
                        "cpu_count": i % 32,
                        "memory": 1024 * (i % 8 + 1),
                        "tag_names": if i % 5 == 0 { vec!["gpu", "virtual"] } else { vec!["virtual"] },
                        "zone": { "name": if i % 2 == 0 { "east" } else { "west" } },
                        "interface_set": [{
                            "id": i,
                            "name": "eth0",
                            "type": "physical",
                            "mac_address": format!("AA:BB:CC:00:00:{:02X}", i % 256),
                        }],
                    })
                })
                .collect(),
        )
    }

    /// Machines handler backed by the machine mapper; counts backend calls
    pub struct MachineHandler {
        backend: Value,
        calls: AtomicUsize,
    }

    impl MachineHandler {
        pub fn new(count: usize) -> Arc<Self> {
            Arc::new(Self {
                backend: backend_machines(count),
                calls: AtomicUsize::new(0),
            })
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ResourceHandler for MachineHandler {
        fn name(&self) -> &str {
            "machines"
        }

        fn uri_patterns(&self) -> Vec<String> {
            vec![
                "maas://machine/{system_id?}".to_string(),
                "maas://machine/{system_id}/power/{action:on|off}".to_string(),
            ]
        }

        fn handle_request(&self, ctx: &RequestContext, request: &ResourceRequest) -> Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let records = self.backend.as_array().map(Vec::as_slice).unwrap_or_default();
            match request.get_path_param("system_id") {
                Some(id) => {
                    let record = records
                        .iter()
                        .find(|m| m["system_id"] == id)
                        .ok_or_else(|| GatewayError::not_found(format!("machine '{id}' not found")))?;
                    let mut machine = ctx.mappers.map_to_context("machine", record)?;
                    if let Some(action) = request.get_path_param("action") {
                        machine["power_state"] = json!(action);
                    }
                    Ok(machine)
                }
                None => ctx.mappers.map_collection_to_context("machine", &self.backend),
            }
        }
    }
}

pub mod gateway {
    use resource_gateway::runtime_config::GatewayConfig;
    use resource_gateway::Gateway;

    /// Gateway restricted to the `maas` scheme with the sweep thread disabled
    pub fn test_gateway() -> Gateway {
        let mut config = GatewayConfig {
            schemes: vec!["maas".to_string()],
            ..GatewayConfig::default()
        };
        config.cache.sweep_interval_secs = 0;
        Gateway::new(config)
    }
}
