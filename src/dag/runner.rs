// src/dag/runner.rs

//! Recursive spawn scheduler.
//!
//! `execute(id)` claims the node, spawns `execute` for each prerequisite,
//! waits for one outcome per incoming edge, then runs or skips the node's
//! task and publishes its own outcome on every outgoing edge. Sub-executions
//! are never joined directly; the edge waits at each level do that, and the
//! root's wait is what guarantees the whole graph has settled.

use std::sync::Arc;
use std::time::Instant;

use anyhow::anyhow;
use tracing::{Instrument, debug, info, info_span, trace, warn};

use crate::dag::graph::Graph;
use crate::dag::outcome::{OutcomeAggregator, RunFailure};
use crate::dag::signal::{EdgeOutcome, SignalFabric};
use crate::dag::task::{BoxFuture, TaskId};
use crate::dag::visited::VisitedRegistry;

/// Everything a single run shares between its node executors.
pub(crate) struct RunContext<I: TaskId> {
    pub(crate) graph: Arc<Graph<I>>,
    pub(crate) visited: VisitedRegistry<I>,
    pub(crate) signals: SignalFabric<I>,
    pub(crate) outcomes: Arc<OutcomeAggregator<I>>,
}

impl<I: TaskId> RunContext<I> {
    pub(crate) fn new(graph: Arc<Graph<I>>, outcomes: Arc<OutcomeAggregator<I>>) -> Self {
        let signals = SignalFabric::build(&graph);
        let visited = VisitedRegistry::with_capacity(graph.len() + 1);
        Self {
            graph,
            visited,
            signals,
            outcomes,
        }
    }
}

/// Drive a whole run from the root. Returns `true` if every prerequisite of
/// the root succeeded.
pub(crate) async fn execute_root<I: TaskId>(ctx: Arc<RunContext<I>>) -> bool {
    let root = ctx.graph.root().clone();
    match execute(ctx, root).await {
        Some(outcome) => outcome.is_success(),
        None => {
            // Only possible if something else claimed the root first.
            warn!("root was already claimed; run did not start");
            false
        }
    }
}

/// Execute one node. Returns `None` if another path already claimed it.
pub(crate) fn execute<I: TaskId>(
    ctx: Arc<RunContext<I>>,
    id: I,
) -> BoxFuture<'static, Option<EdgeOutcome>> {
    Box::pin(async move {
        if !ctx.visited.claim(&id) {
            trace!(task = %id, "already claimed; nothing to do");
            return None;
        }

        let signals = ctx.signals.take(&id);

        for prereq in ctx.graph.dependencies_of(&id) {
            tokio::spawn(execute(Arc::clone(&ctx), prereq.clone()));
        }

        let mut failed_prerequisites = Vec::new();
        for wait in signals.waits {
            let prereq = wait.prerequisite().clone();
            if !wait.wait().await.is_success() {
                failed_prerequisites.push(prereq);
            }
        }

        let outcome = if ctx.graph.is_root(&id) {
            if ctx.outcomes.close() {
                debug!(root = %id, "root settled; outcome aggregator closed");
            }
            if failed_prerequisites.is_empty() {
                EdgeOutcome::Succeeded
            } else {
                EdgeOutcome::Skipped
            }
        } else if failed_prerequisites.is_empty() {
            run_task(&ctx.graph, &ctx.outcomes, &id).await
        } else {
            skip_task(&ctx.outcomes, &id, failed_prerequisites)
        };

        for notify in signals.notifies {
            notify.publish(outcome);
        }

        Some(outcome)
    })
}

/// Run the task registered under `id` and record a direct failure if it
/// does not succeed.
///
/// The task runs in its own tokio task so that a panic inside it is reported
/// as a failure of that node rather than tearing down the node's executor.
pub(crate) async fn run_task<I: TaskId>(
    graph: &Graph<I>,
    outcomes: &OutcomeAggregator<I>,
    id: &I,
) -> EdgeOutcome {
    let Some(task) = graph.task(id).map(Arc::clone) else {
        warn!(task = %id, "no task registered for node; failing it");
        outcomes.record(RunFailure::failed(
            id.clone(),
            anyhow!("no task registered under '{}'", id),
        ));
        return EdgeOutcome::Failed;
    };

    let span = info_span!("task", task = %id);
    let started = Instant::now();
    info!(parent: &span, "starting task");

    let handle = tokio::spawn(async move { task.run().await }.instrument(span.clone()));

    let result = match handle.await {
        Ok(result) => result,
        Err(join_err) => Err(anyhow!("task panicked or was aborted: {}", join_err)),
    };
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match result {
        Ok(()) => {
            info!(parent: &span, elapsed_ms, "task succeeded");
            EdgeOutcome::Succeeded
        }
        Err(err) => {
            let reason = format!("{err:#}");
            warn!(parent: &span, elapsed_ms, error = %reason, "task failed");
            outcomes.record(RunFailure::failed(id.clone(), err));
            EdgeOutcome::Failed
        }
    }
}

/// Record a propagated skip for `id`.
pub(crate) fn skip_task<I: TaskId>(
    outcomes: &OutcomeAggregator<I>,
    id: &I,
    failed_prerequisites: Vec<I>,
) -> EdgeOutcome {
    debug!(
        task = %id,
        failed_prerequisites = ?failed_prerequisites,
        "prerequisites did not succeed; skipping task"
    );
    outcomes.record(RunFailure::skipped(id.clone(), failed_prerequisites));
    EdgeOutcome::Skipped
}
