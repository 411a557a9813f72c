// src/config/model.rs

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use serde::Deserialize;

use crate::types::{Strategy, StrategyKind};

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [run]
/// root = "root"
/// strategy = "pool"
/// max_workers = 4
///
/// [default]
/// retries = 1
/// retry_delay_ms = 500
///
/// [task.A]
/// cmd = "echo A"
/// after = ["B"]
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub run: RunSection,

    #[serde(default)]
    pub default: DefaultSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// Validated configuration. Only obtainable through
/// `ConfigFile::try_from(RawConfigFile)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub run: RunSection,
    pub default: DefaultSection,
    pub task: BTreeMap<String, TaskConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        run: RunSection,
        default: DefaultSection,
        task: BTreeMap<String, TaskConfig>,
    ) -> Self {
        Self { run, default, task }
    }

    /// Scheduling strategy requested by `[run]`.
    pub fn strategy(&self) -> Strategy {
        Strategy::from_kind(self.run.strategy, self.run.max_workers)
    }

    /// Backoff base delay for a task, falling back to `[default]`.
    pub fn retry_delay_for(&self, task: &TaskConfig) -> Duration {
        Duration::from_millis(
            task.retry_delay_ms
                .unwrap_or(self.default.retry_delay_ms),
        )
    }

    /// Tasks no other task lists in `after`. The root depends on exactly
    /// these.
    pub fn terminal_tasks(&self) -> Vec<&str> {
        let referenced: BTreeSet<&str> = self
            .task
            .values()
            .flat_map(|t| t.after.iter().map(String::as_str))
            .collect();

        self.task
            .keys()
            .map(String::as_str)
            .filter(|name| !referenced.contains(name))
            .collect()
    }
}

/// `[run]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RunSection {
    /// Identifier of the implicit root node. Must not collide with a task.
    #[serde(default = "default_root")]
    pub root: String,

    /// `"spawn"` (default) or `"pool"`.
    #[serde(default)]
    pub strategy: StrategyKind,

    /// Worker count for the pool strategy.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

fn default_root() -> String {
    "root".to_string()
}

fn default_max_workers() -> usize {
    4
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            root: default_root(),
            strategy: StrategyKind::default(),
            max_workers: default_max_workers(),
        }
    }
}

/// `[default]` section: values applied to tasks that don't override them.
#[derive(Debug, Clone, Deserialize)]
pub struct DefaultSection {
    #[serde(default)]
    pub retries: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_retry_delay_ms() -> u64 {
    1000
}

impl Default for DefaultSection {
    fn default() -> Self {
        Self {
            retries: 0,
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// The command to execute.
    pub cmd: String,

    /// Tasks that must succeed before this one runs.
    #[serde(default)]
    pub after: Vec<String>,

    /// Retry count override.
    #[serde(default)]
    pub retries: Option<u32>,

    /// Backoff base delay override.
    #[serde(default)]
    pub retry_delay_ms: Option<u64>,
}
