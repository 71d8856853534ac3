mod common;

use common::handlers::MachineHandler;
use common::temp_files::create_temp_yaml;
use http::StatusCode;
use resource_gateway::runtime_config::GatewayConfig;
use resource_gateway::Gateway;

#[test]
fn test_yaml_file_drives_gateway() {
    let file = create_temp_yaml(
        r#"
schemes: [maas]
cache:
  enabled: false
  sweep_interval_secs: 0
pagination:
  default_limit: 7
  max_limit: 20
errors:
  debug: true
"#,
    );
    let config = GatewayConfig::from_yaml_file(file.path()).unwrap();
    assert_eq!(config.pagination.default_limit, 7);
    assert!(config.errors.debug);

    let gateway = Gateway::new(config);
    let handler = MachineHandler::new(30);
    gateway.register_handler(handler.clone()).unwrap();

    let page = gateway.handle("maas://machine", "", "", None);
    let body = page.json().unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 7);
    assert_eq!(page.header("X-Cache"), Some("BYPASS"));

    gateway.handle("maas://machine", "", "", None);
    assert_eq!(handler.calls(), 2);

    let capped = gateway.handle("maas://machine?limit=500", "", "", None);
    assert_eq!(capped.json().unwrap()["pagination"]["limit"], 20);

    let error = gateway.handle("maas://machine/none", "", "", None);
    assert_eq!(error.status, StatusCode::NOT_FOUND);
    assert!(error.json().unwrap()["details"]["stack_trace"].is_string());
    gateway.shutdown();
}

#[test]
fn test_missing_and_malformed_files() {
    assert!(GatewayConfig::from_yaml_file("/nonexistent/rgw.yaml").is_err());

    let malformed = create_temp_yaml("cache: {enabled: maybe}");
    let err = GatewayConfig::from_yaml_file(malformed.path()).unwrap_err();
    assert!(format!("{err:#}").contains("invalid config file"));
}
