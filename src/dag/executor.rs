// src/dag/executor.rs

use std::sync::Arc;

use anyhow::anyhow;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::dag::graph::Graph;
use crate::dag::outcome::{OutcomeStream, RunReport, outcome_channel};
use crate::dag::pool::execute_pool;
use crate::dag::runner::{RunContext, execute_root};
use crate::dag::task::TaskId;
use crate::errors::{DagError, Result};
use crate::types::Strategy;

/// Validated graph plus the strategy used to run it.
///
/// An `Executor` can be run any number of times; every run gets a fresh
/// visited registry, signal fabric and outcome aggregator.
#[derive(Debug)]
pub struct Executor<I: TaskId> {
    graph: Arc<Graph<I>>,
    strategy: Strategy,
}

impl<I: TaskId> Executor<I> {
    /// Validate `graph` and wrap it. Cycles, dangling prerequisites and
    /// nodes the root cannot reach are rejected here.
    pub fn new(graph: Graph<I>) -> Result<Self> {
        graph.validate()?;
        Ok(Self {
            graph: Arc::new(graph),
            strategy: Strategy::default(),
        })
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn graph(&self) -> &Graph<I> {
        &self.graph
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Begin a run from the root.
    ///
    /// Returns the handle of the running traversal and the stream of
    /// failures. The stream ends once the root has settled, so draining it
    /// to the end always observes every failure of the run.
    pub fn start(&self) -> (RunHandle, OutcomeStream<I>) {
        let (aggregator, stream) = outcome_channel(self.graph.len());
        let aggregator = Arc::new(aggregator);
        let graph = Arc::clone(&self.graph);

        info!(
            root = %graph.root(),
            tasks = graph.len(),
            edges = graph.edge_count(),
            strategy = ?self.strategy,
            "starting DAG run"
        );

        let join = match self.strategy {
            Strategy::Spawn => {
                let ctx = Arc::new(RunContext::new(graph, aggregator));
                tokio::spawn(execute_root(ctx))
            }
            Strategy::Pool { workers } => tokio::spawn(execute_pool(graph, aggregator, workers)),
        };

        (RunHandle { join }, stream)
    }

    /// Run to completion and collect the report.
    pub async fn run(&self) -> Result<RunReport<I>> {
        let (handle, stream) = self.start();
        let root_succeeded = handle.wait().await?;
        let failures = stream.drain().await;

        let report = RunReport {
            root_succeeded,
            failures,
        };

        if report.is_success() {
            info!("DAG run finished successfully");
        } else {
            warn!(
                failed = report.failed().count(),
                skipped = report.skipped().count(),
                "DAG run finished with failures"
            );
        }

        Ok(report)
    }
}

/// Handle to a started run.
#[derive(Debug)]
pub struct RunHandle {
    join: JoinHandle<bool>,
}

impl RunHandle {
    /// Wait for the root to settle. Returns `true` if every prerequisite of
    /// the root succeeded.
    pub async fn wait(self) -> Result<bool> {
        self.join
            .await
            .map_err(|e| DagError::from(anyhow!("DAG run driver terminated abnormally: {e}")))
    }
}
