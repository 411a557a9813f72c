// src/logging.rs

//! Logging setup for `dagkube` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the filter:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `DAGKUBE_LOG` environment variable: either a bare level ("debug") or
//!    full filter directives ("dagkube::dag=trace,info")
//! 3. default to `info`
//!
//! Logs are sent to STDERR; stdout is reserved for the run summary.

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

const LOG_ENV: &str = "DAGKUBE_LOG";

/// Initialise global logging subscriber.
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = match cli_level {
        Some(lvl) => EnvFilter::new(level_from_log_level(lvl).as_str()),
        None => filter_from_env(),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}

fn filter_from_env() -> EnvFilter {
    let Ok(raw) = std::env::var(LOG_ENV) else {
        return EnvFilter::new("info");
    };

    if let Some(level) = parse_level_str(&raw) {
        return EnvFilter::new(level.as_str());
    }

    EnvFilter::try_new(raw.trim()).unwrap_or_else(|e| {
        eprintln!("ignoring invalid {LOG_ENV} value {raw:?}: {e}");
        EnvFilter::new("info")
    })
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}
