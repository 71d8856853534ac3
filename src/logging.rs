//! Structured logging setup
//!
//! The library only emits `tracing` events; binaries call
//! [`init_logging_with_config`] once at startup to install a subscriber.
//!
//! | Variable | Values | Default |
//! |----------|--------|---------|
//! | `RGW_LOG_LEVEL` | trace, debug, info, warn, error | `info` |
//! | `RGW_LOG_FORMAT` | json, pretty | `json` |
//! | `RGW_LOG_SAMPLING_MODE` | all, error-only, sampled | `all` |
//! | `RGW_LOG_SAMPLING_RATE` | 0.0 to 1.0 | `1.0` |
//! | `RGW_LOG_ASYNC` | true, false | `true` |
//! | `RGW_LOG_TARGET_FILTER` | comma-separated directives | none |
//! | `RGW_LOG_INCLUDE_LOCATION` | true, false | `false` |
//!
//! `RUST_LOG`, when set, takes precedence over `RGW_LOG_LEVEL`.

use anyhow::{Context, Result};
use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{Level, Metadata, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::{Context as LayerContext, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// JSON for production, pretty-print for development
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

/// Which events below WARN reach the output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingMode {
    All,
    /// WARN and ERROR only
    ErrorOnly,
    /// Every WARN and ERROR plus a fixed fraction of the rest
    Sampled,
}

impl SamplingMode {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "error-only" | "error_only" => SamplingMode::ErrorOnly,
            "sampled" => SamplingMode::Sampled,
            _ => SamplingMode::All,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub log_level: String,
    pub format: LogFormat,
    pub sampling_mode: SamplingMode,
    /// Fraction of sub-WARN events kept in [`SamplingMode::Sampled`]
    pub sampling_rate: f64,
    /// Write through a background thread
    pub async_logging: bool,
    /// Extra `EnvFilter` directives, comma-separated
    pub target_filter: Option<String>,
    pub include_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Json,
            sampling_mode: SamplingMode::All,
            sampling_rate: 1.0,
            async_logging: true,
            target_filter: None,
            include_location: false,
        }
    }
}

impl LogConfig {
    /// Read `RGW_LOG_*` variables; unset or unparsable values keep the defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let flag = |key: &str, default: bool| {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };
        Self {
            log_level: lookup("RGW_LOG_LEVEL").unwrap_or(defaults.log_level),
            format: lookup("RGW_LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or(defaults.format),
            sampling_mode: lookup("RGW_LOG_SAMPLING_MODE")
                .map(|v| SamplingMode::parse(&v))
                .unwrap_or(defaults.sampling_mode),
            sampling_rate: lookup("RGW_LOG_SAMPLING_RATE")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.sampling_rate),
            async_logging: flag("RGW_LOG_ASYNC", defaults.async_logging),
            target_filter: lookup("RGW_LOG_TARGET_FILTER").filter(|v| !v.trim().is_empty()),
            include_location: flag("RGW_LOG_INCLUDE_LOCATION", defaults.include_location),
        }
    }

    /// Pretty, synchronous, debug level with source locations
    pub fn default_dev() -> Self {
        Self {
            log_level: "debug".to_string(),
            format: LogFormat::Pretty,
            async_logging: false,
            include_location: true,
            ..Self::default()
        }
    }

    fn level(&self) -> Level {
        match self.log_level.trim().to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

/// Drops sub-WARN events according to a [`SamplingMode`]
pub struct SamplingLayer {
    mode: SamplingMode,
    /// Keep one event in `interval`; 0 keeps none
    interval: u64,
    counter: AtomicU64,
}

impl SamplingLayer {
    pub fn new(mode: SamplingMode, rate: f64) -> Self {
        let rate = rate.clamp(0.0, 1.0);
        let interval = if rate == 0.0 {
            0
        } else {
            (1.0 / rate).round() as u64
        };
        Self {
            mode,
            interval,
            counter: AtomicU64::new(0),
        }
    }

    fn should_sample(&self, metadata: &Metadata<'_>) -> bool {
        let important = matches!(*metadata.level(), Level::WARN | Level::ERROR);
        match self.mode {
            SamplingMode::All => true,
            SamplingMode::ErrorOnly => important,
            SamplingMode::Sampled => {
                if important {
                    return true;
                }
                if self.interval == 0 {
                    return false;
                }
                self.counter.fetch_add(1, Ordering::Relaxed) % self.interval == 0
            }
        }
    }
}

impl<S> Layer<S> for SamplingLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn enabled(&self, metadata: &Metadata<'_>, _ctx: LayerContext<'_, S>) -> bool {
        !metadata.is_event() || self.should_sample(metadata)
    }
}

fn env_filter(config: &LogConfig) -> EnvFilter {
    let mut filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level().as_str()));
    if let Some(targets) = &config.target_filter {
        for directive in targets.split(',').map(str::trim).filter(|d| !d.is_empty()) {
            match directive.parse() {
                Ok(d) => filter = filter.add_directive(d),
                Err(_) => eprintln!("Warning: invalid log filter directive: {directive}"),
            }
        }
    }
    filter
}

/// Install the global subscriber
///
/// With async logging the returned guard owns the writer thread; keep it alive
/// until exit so buffered lines are flushed.
///
/// # Errors
///
/// Fails when a global subscriber is already installed.
///
/// ```no_run
/// use resource_gateway::logging::{init_logging_with_config, LogConfig};
///
/// let _guard = init_logging_with_config(&LogConfig::from_env())
///     .expect("failed to initialize logging");
/// ```
pub fn init_logging_with_config(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let (writer, guard) = if config.async_logging {
        let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stderr());
        (
            tracing_subscriber::fmt::writer::BoxMakeWriter::new(non_blocking),
            Some(guard),
        )
    } else {
        (
            tracing_subscriber::fmt::writer::BoxMakeWriter::new(std::io::stderr),
            None,
        )
    };

    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(SamplingLayer::new(config.sampling_mode, config.sampling_rate))
        .with(fmt_layer)
        .try_init()
        .context("failed to initialize logging")?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct TestCallsite;
    impl tracing::callsite::Callsite for TestCallsite {
        fn set_interest(&self, _interest: tracing::subscriber::Interest) {}
        fn metadata(&self) -> &tracing::Metadata<'_> {
            unreachable!()
        }
    }
    static CALLSITE: TestCallsite = TestCallsite;

    fn metadata(level: Level) -> Metadata<'static> {
        Metadata::new(
            "test",
            "resource_gateway::test",
            level,
            None,
            None,
            None,
            tracing::field::FieldSet::new(&[], tracing::callsite::Identifier(&CALLSITE)),
            tracing::metadata::Kind::EVENT,
        )
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(LogFormat::parse("PRETTY"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("bogus"), LogFormat::Json);
        assert_eq!(SamplingMode::parse("error_only"), SamplingMode::ErrorOnly);
        assert_eq!(SamplingMode::parse("sampled"), SamplingMode::Sampled);
        assert_eq!(SamplingMode::parse(""), SamplingMode::All);
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("RGW_LOG_LEVEL", "debug"),
            ("RGW_LOG_FORMAT", "pretty"),
            ("RGW_LOG_ASYNC", "false"),
            ("RGW_LOG_TARGET_FILTER", "resource_gateway::cache=trace"),
            ("RGW_LOG_INCLUDE_LOCATION", "nope"),
        ]
        .into_iter()
        .collect();
        let config = LogConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.level(), Level::DEBUG);
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(!config.async_logging);
        assert_eq!(
            config.target_filter.as_deref(),
            Some("resource_gateway::cache=trace")
        );
        assert!(!config.include_location);
        assert_eq!(config.sampling_mode, SamplingMode::All);

        let empty = LogConfig::from_lookup(|_| None);
        assert_eq!(empty.log_level, "info");
        assert!(empty.async_logging);
    }

    #[test]
    fn test_sampling_modes() {
        let info = metadata(Level::INFO);
        let warn = metadata(Level::WARN);

        assert!(SamplingLayer::new(SamplingMode::All, 0.0).should_sample(&info));

        let errors = SamplingLayer::new(SamplingMode::ErrorOnly, 1.0);
        assert!(!errors.should_sample(&info));
        assert!(errors.should_sample(&warn));

        let half = SamplingLayer::new(SamplingMode::Sampled, 0.5);
        let kept = (0..100).filter(|_| half.should_sample(&info)).count();
        assert_eq!(kept, 50);
        assert!(half.should_sample(&warn));

        let none = SamplingLayer::new(SamplingMode::Sampled, -1.0);
        assert!(!none.should_sample(&info));
        assert!(none.should_sample(&warn));
    }
}
