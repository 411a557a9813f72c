use std::str::FromStr;
use serde::Deserialize;

/// Which scheduling strategy drives a run.
///
/// - `Spawn`: one tokio task per node, spawned the first time the node is
///   claimed. Unbounded parallelism (default).
/// - `Pool`: a fixed number of workers fed from a ready queue built from
///   in-degree counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    #[default]
    Spawn,
    Pool,
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "spawn" => Ok(StrategyKind::Spawn),
            "pool" => Ok(StrategyKind::Pool),
            other => Err(format!(
                "invalid strategy: {other} (expected \"spawn\" or \"pool\")"
            )),
        }
    }
}

/// Fully resolved scheduling strategy handed to the executor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strategy {
    #[default]
    Spawn,
    Pool { workers: usize },
}

impl Strategy {
    /// Combine a strategy kind with a worker count.
    ///
    /// `workers` is clamped to at least 1 and ignored for `Spawn`.
    pub fn from_kind(kind: StrategyKind, workers: usize) -> Self {
        match kind {
            StrategyKind::Spawn => Strategy::Spawn,
            StrategyKind::Pool => Strategy::Pool {
                workers: workers.max(1),
            },
        }
    }
}
