use crate::filter::{filter_json_collection, parse_filter};
use crate::fixture::{load_fixtures, register_fixtures};
use crate::gateway::Gateway;
use crate::router::UriPattern;
use crate::runtime_config::GatewayConfig;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Map, Value};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Command-line interface for the resource gateway
#[derive(Parser, Debug)]
#[command(name = "rgw")]
#[command(about = "Resource gateway tools", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Match a URI against a pattern and print the extracted parameters
    Match {
        /// Pattern, e.g. `maas://machine/{system_id}/power/{action:on|off}`
        #[arg(short, long)]
        pattern: String,

        #[arg(short, long)]
        uri: String,
    },
    /// Filter a JSON array with a filter expression
    Filter {
        /// Expression, e.g. `status eq 'active' and cpu_count gt 4`
        #[arg(short, long)]
        expr: String,

        /// JSON file holding an array; `-` reads stdin
        #[arg(short, long, default_value = "-")]
        input: PathBuf,
    },
    /// Run a URI through the full pipeline against fixture handlers
    Dispatch {
        /// YAML fixture file
        #[arg(short, long)]
        fixtures: PathBuf,

        #[arg(short, long)]
        uri: String,

        #[arg(short, long, default_value = "application/json")]
        accept: String,

        /// Request content type, used with `--payload`
        #[arg(long, default_value = "application/json")]
        content_type: String,

        /// JSON file sent as the request payload
        #[arg(long)]
        payload: Option<PathBuf>,

        /// Gateway config YAML; `RGW_*` variables apply either way
        #[arg(short, long, env = "RGW_CONFIG")]
        config: Option<PathBuf>,

        /// Request id to reuse (a ULID); a fresh one is minted otherwise
        #[arg(long)]
        request_id: Option<String>,

        /// Exit with an error when the response status is 4xx or 5xx
        #[arg(long, default_value_t = false)]
        fail_on_error: bool,
    },
    /// List the handlers and patterns a fixture file registers
    Routes {
        #[arg(short, long)]
        fixtures: PathBuf,
    },
}

/// Parse the process arguments and run the command, writing to stdout
///
/// # Errors
///
/// See [`run`].
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run(&cli, &mut out)
}

/// Run a parsed command
///
/// # Errors
///
/// Returns an error if:
/// - a pattern, filter expression or input file is invalid
/// - the fixtures or config cannot be loaded
/// - the URI does not match (`match`)
/// - `--fail-on-error` is set and the response status is an error (`dispatch`)
pub fn run(cli: &Cli, out: &mut dyn Write) -> Result<()> {
    match &cli.command {
        Commands::Match { pattern, uri } => {
            let compiled = UriPattern::compile(pattern)?;
            let matched = compiled.match_uri(uri)?;
            let params: Map<String, Value> = matched
                .parameters
                .iter()
                .map(|(k, v)| (k.to_string(), Value::String(v.clone())))
                .collect();
            let report = json!({
                "pattern": compiled.raw(),
                "parameters": params,
                "resource_type": matched.parsed.resource_type,
                "resource_id": matched.parsed.resource_id,
                "query": matched.parsed.query_params,
            });
            writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        }
        Commands::Filter { expr, input } => {
            let collection = read_json(input)?;
            if !collection.is_array() {
                bail!("filter input must be a JSON array");
            }
            let filter = parse_filter(expr)?;
            let filtered = filter_json_collection(&collection, &filter)?;
            writeln!(out, "{}", serde_json::to_string_pretty(&filtered)?)?;
        }
        Commands::Dispatch {
            fixtures,
            uri,
            accept,
            content_type,
            payload,
            config,
            request_id,
            fail_on_error,
        } => {
            let config = match config {
                Some(path) => GatewayConfig::from_yaml_file(path)?,
                None => GatewayConfig::from_env(),
            };
            let gateway = Gateway::new(config);
            register_fixtures(gateway.handlers(), load_fixtures(fixtures)?)?;
            let payload = payload.as_deref().map(read_json).transpose()?;

            let response = gateway.handle_with_request_id(
                request_id.as_deref(),
                uri,
                content_type,
                accept,
                payload,
            );
            gateway.shutdown();

            writeln!(out, "status: {}", response.status)?;
            writeln!(out, "content-type: {}", response.content_type)?;
            for (name, value) in &response.headers {
                writeln!(out, "{name}: {value}")?;
            }
            writeln!(out)?;
            out.write_all(&response.body)?;
            writeln!(out)?;

            if *fail_on_error && (response.status.is_client_error() || response.status.is_server_error()) {
                bail!("request failed with status {}", response.status);
            }
        }
        Commands::Routes { fixtures } => {
            let gateway = Gateway::new(GatewayConfig::from_env());
            register_fixtures(gateway.handlers(), load_fixtures(fixtures)?)?;
            for (handler, pattern) in gateway.handlers().patterns() {
                writeln!(out, "{handler}\t{pattern}")?;
            }
            gateway.shutdown();
        }
    }
    Ok(())
}

fn read_json(path: &Path) -> Result<Value> {
    let text = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?
    };
    serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))
}
