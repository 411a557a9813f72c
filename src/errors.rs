// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Structural problems (bad config, invalid graphs) are reported as
//! [`DagError`]. Task failure reasons are plain `anyhow::Error`s and never
//! surface here; they travel through the outcome stream instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unknown task: {0}")]
    UnknownTask(String),

    #[error("Duplicate task: {0}")]
    DuplicateTask(String),

    #[error("Cycle detected in DAG: {0}")]
    DagCycle(String),

    #[error("Task not reachable from root: {0}")]
    Unreachable(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DagError>;
