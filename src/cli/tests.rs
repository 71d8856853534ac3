//! Unit tests for CLI commands

use crate::cli::{run, Cli, Commands};
use clap::Parser;
use serde_json::Value;
use std::io::Write;

const FIXTURES: &str = r##"
handlers:
  - name: tags
    patterns: ["maas://tag/{name?}"]
    id_field: name
    mapper: tag
    records:
      - { name: gpu, comment: "GPU nodes" }
      - { name: db, color: "#00FF00" }
"##;

fn run_to_string(args: &[&str]) -> anyhow::Result<String> {
    let cli = Cli::try_parse_from(args)?;
    let mut out = Vec::new();
    run(&cli, &mut out)?;
    Ok(String::from_utf8(out)?)
}

fn fixture_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(FIXTURES.as_bytes()).unwrap();
    file
}

#[test]
fn test_all_commands_parse() {
    let commands = vec![
        vec!["rgw", "match", "--pattern", "maas://a/{id}", "--uri", "maas://a/1"],
        vec!["rgw", "filter", "--expr", "a eq 1", "--input", "in.json"],
        vec!["rgw", "dispatch", "--fixtures", "f.yaml", "--uri", "maas://a"],
        vec!["rgw", "routes", "--fixtures", "f.yaml"],
    ];
    for args in commands {
        let cli = Cli::try_parse_from(&args);
        assert!(cli.is_ok(), "Failed to parse command: {:?}", args);
    }
}

#[test]
fn test_dispatch_defaults() {
    let cli = Cli::try_parse_from(["rgw", "dispatch", "-f", "f.yaml", "-u", "maas://tag"]).unwrap();
    match cli.command {
        Commands::Dispatch {
            accept,
            content_type,
            payload,
            fail_on_error,
            ..
        } => {
            assert_eq!(accept, "application/json");
            assert_eq!(content_type, "application/json");
            assert!(payload.is_none());
            assert!(!fail_on_error);
        }
        other => panic!("Expected Dispatch command, got {other:?}"),
    }
}

#[test]
fn test_match_command() {
    let out = run_to_string(&[
        "rgw",
        "match",
        "--pattern",
        "maas://machine/{system_id}/power/{action:on|off}",
        "--uri",
        "maas://machine/abc123/power/on",
    ])
    .unwrap();
    let report: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(report["parameters"]["system_id"], "abc123");
    assert_eq!(report["parameters"]["action"], "on");
    assert_eq!(report["resource_type"], "machine");

    assert!(run_to_string(&[
        "rgw",
        "match",
        "--pattern",
        "maas://machine/{system_id}/power/{action:on|off}",
        "--uri",
        "maas://machine/abc123/power/restart",
    ])
    .is_err());
}

#[test]
fn test_filter_command() {
    let mut input = tempfile::NamedTempFile::new().unwrap();
    input
        .write_all(br#"[{"status":"active","count":25},{"status":"idle","count":30},{"status":"active","count":5}]"#)
        .unwrap();
    let path = input.path().to_str().unwrap();
    let out = run_to_string(&[
        "rgw",
        "filter",
        "--expr",
        "status eq 'active' and count gt 20",
        "--input",
        path,
    ])
    .unwrap();
    let filtered: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(filtered, serde_json::json!([{"status": "active", "count": 25}]));

    assert!(run_to_string(&["rgw", "filter", "--expr", "status like x", "--input", path]).is_err());
}

#[test]
fn test_dispatch_and_routes_commands() {
    let fixtures = fixture_file();
    let path = fixtures.path().to_str().unwrap();

    let out = run_to_string(&["rgw", "dispatch", "--fixtures", path, "--uri", "maas://tag/gpu"]).unwrap();
    assert!(out.starts_with("status: 200 OK"));
    assert!(out.contains("X-Cache: MISS"));
    assert!(out.contains(r#""description":"GPU nodes""#));

    let xml = run_to_string(&[
        "rgw", "dispatch", "-f", path, "-u", "maas://tag", "-a", "application/xml",
    ])
    .unwrap();
    assert!(xml.contains("content-type: application/xml"));
    assert!(xml.contains("<name>db</name>"));

    let missing = run_to_string(&["rgw", "dispatch", "-f", path, "-u", "maas://tag/none"]).unwrap();
    assert!(missing.starts_with("status: 404 Not Found"));
    assert!(run_to_string(&[
        "rgw",
        "dispatch",
        "-f",
        path,
        "-u",
        "maas://tag/none",
        "--fail-on-error",
    ])
    .is_err());

    let traced = run_to_string(&[
        "rgw",
        "dispatch",
        "-f",
        path,
        "-u",
        "maas://tag/none",
        "--request-id",
        "01ARZ3NDEKTSV4RRFFQ69G5FAV",
    ])
    .unwrap();
    assert!(traced.contains("X-Request-Id: 01ARZ3NDEKTSV4RRFFQ69G5FAV"));

    let routes = run_to_string(&["rgw", "routes", "--fixtures", path]).unwrap();
    assert_eq!(routes.trim(), "tags\tmaas://tag/{name?}");
}
