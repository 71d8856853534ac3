use resource_gateway::cli::run_cli;
use resource_gateway::logging::{init_logging_with_config, LogConfig};

fn main() -> anyhow::Result<()> {
    let mut log_config = LogConfig::from_env();
    if std::env::var("RGW_LOG_LEVEL").is_err() {
        log_config.log_level = "warn".to_string();
    }
    let _guard = init_logging_with_config(&log_config)?;
    run_cli()
}
