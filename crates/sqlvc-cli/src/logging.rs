//! Logging and tracing setup
//!
//! Console output goes to stderr so command output on stdout stays clean.
//! JSON logs can additionally be written to daily rolling files under the
//! platform data directory, for attaching to bug reports.

use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Directory where JSON log files are written
    pub log_dir: PathBuf,

    /// Whether to write JSON logs to files
    pub enable_json_logs: bool,

    /// Whether to include file/line information in console logs
    pub include_location: bool,

    /// Default log level filter
    pub default_filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: log_directory(),
            enable_json_logs: false,
            include_location: cfg!(debug_assertions),
            default_filter: "info".to_string(),
        }
    }
}

/// Combine the configured filter with `-v`/`-q` flags
///
/// `-q` lowers everything to warnings, each `-v` raises the sqlvc crates one
/// level (debug, then trace).
pub fn effective_filter(base: &str, verbose: u8, quiet: bool) -> String {
    if quiet {
        return "warn".to_string();
    }
    let level = match verbose {
        0 => return base.to_string(),
        1 => "debug",
        _ => "trace",
    };
    let crates = [
        "sqlvc",
        "sqlvc_core",
        "sqlvc_driver_mssql",
        "sqlvc_schema",
        "sqlvc_versioning",
    ];
    let directives: Vec<String> = crates.iter().map(|c| format!("{c}={level}")).collect();
    format!("{},{}", base, directives.join(","))
}

/// Install the global subscriber
///
/// `RUST_LOG` takes precedence over `config.default_filter`. The returned
/// guard flushes the JSON writer and must be held until exit.
pub fn init(config: LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let mut layers = Vec::new();

    let console_layer = fmt::layer()
        .with_target(config.include_location)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_writer(std::io::stderr)
        .compact()
        .with_filter(env_filter(&config.default_filter))
        .boxed();
    layers.push(console_layer);

    let mut guard = None;
    if config.enable_json_logs {
        std::fs::create_dir_all(&config.log_dir)?;

        let file_appender = tracing_appender::rolling::daily(&config.log_dir, "sqlvc.log");
        let (non_blocking, worker_guard) = tracing_appender::non_blocking(file_appender);
        guard = Some(worker_guard);

        let json_layer = fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(non_blocking)
            .with_filter(env_filter(&config.default_filter))
            .boxed();
        layers.push(json_layer);
    }

    tracing_subscriber::registry().with(layers).try_init()?;

    tracing::debug!(
        log_dir = %config.log_dir.display(),
        json_enabled = config.enable_json_logs,
        "logging initialized"
    );

    Ok(guard)
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Directory for JSON log files
pub fn log_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sqlvc")
        .join("logs")
}
