// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;
use crate::types::StrategyKind;

/// Command-line arguments for `dagkube`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "dagkube",
    version,
    about = "Run a DAG of commands, in parallel where dependencies allow.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Dagkube.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Scheduling strategy; overrides `[run].strategy`.
    #[arg(long, value_enum, value_name = "STRATEGY")]
    pub strategy: Option<CliStrategy>,

    /// Worker count for the pool strategy; overrides `[run].max_workers`.
    #[arg(long, value_name = "N")]
    pub max_workers: Option<usize>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DAGKUBE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the DAG, but don't execute any commands.
    #[arg(long)]
    pub dry_run: bool,
}

/// Strategy as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum CliStrategy {
    Spawn,
    Pool,
}

impl From<CliStrategy> for StrategyKind {
    fn from(s: CliStrategy) -> Self {
        match s {
            CliStrategy::Spawn => StrategyKind::Spawn,
            CliStrategy::Pool => StrategyKind::Pool,
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
