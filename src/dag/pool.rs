// src/dag/pool.rs

//! Bounded worker-pool scheduler.
//!
//! Instead of one tokio task per node, this keeps a ready queue derived from
//! remaining-prerequisite counts (Kahn's algorithm) and never has more than
//! `workers` task runs in flight. Skipped nodes settle inline and never take
//! a worker slot.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::dag::graph::Graph;
use crate::dag::outcome::OutcomeAggregator;
use crate::dag::runner::{run_task, skip_task};
use crate::dag::signal::EdgeOutcome;
use crate::dag::task::TaskId;
use crate::dag::visited::VisitedRegistry;

/// Per-run bookkeeping for the pool.
struct ReadyState<I: TaskId> {
    /// Prerequisites not yet settled, per node.
    remaining: HashMap<I, usize>,
    /// Prerequisite -> dependents.
    dependents: HashMap<I, Vec<I>>,
    /// Prerequisites that did not succeed, per dependent.
    failed_prerequisites: HashMap<I, Vec<I>>,
    ready: VecDeque<I>,
}

impl<I: TaskId> ReadyState<I> {
    fn build(graph: &Graph<I>) -> Self {
        let mut remaining: HashMap<I, usize> = HashMap::new();
        let mut dependents: HashMap<I, Vec<I>> = HashMap::new();

        remaining.insert(graph.root().clone(), 0);
        for id in graph.task_ids() {
            remaining.entry(id.clone()).or_insert(0);
        }
        for (dependent, prereq) in graph.edges() {
            *remaining.entry(dependent.clone()).or_insert(0) += 1;
            dependents
                .entry(prereq.clone())
                .or_default()
                .push(dependent.clone());
        }

        let mut ready: Vec<I> = remaining
            .iter()
            .filter(|(id, count)| **count == 0 && !graph.is_root(id))
            .map(|(id, _)| id.clone())
            .collect();
        ready.sort();

        Self {
            remaining,
            dependents,
            failed_prerequisites: HashMap::new(),
            ready: ready.into(),
        }
    }

    /// Account for `id` having settled with `outcome`. Returns `true` once
    /// the root has no prerequisites left.
    fn settle(&mut self, graph: &Graph<I>, id: &I, outcome: EdgeOutcome) -> bool {
        let mut root_ready = false;
        let Some(dependents) = self.dependents.get(id) else {
            return false;
        };

        for dependent in dependents {
            if !outcome.is_success() {
                self.failed_prerequisites
                    .entry(dependent.clone())
                    .or_default()
                    .push(id.clone());
            }

            let Some(count) = self.remaining.get_mut(dependent) else {
                continue;
            };
            *count -= 1;
            if *count == 0 {
                if graph.is_root(dependent) {
                    root_ready = true;
                } else {
                    self.ready.push_back(dependent.clone());
                }
            }
        }

        root_ready
    }

    fn take_failed(&mut self, id: &I) -> Vec<I> {
        let mut failed = self.failed_prerequisites.remove(id).unwrap_or_default();
        failed.sort();
        failed
    }
}

/// Drive a whole run with at most `workers` concurrent task runs. Returns
/// `true` if every prerequisite of the root succeeded.
pub(crate) async fn execute_pool<I: TaskId>(
    graph: Arc<Graph<I>>,
    outcomes: Arc<OutcomeAggregator<I>>,
    workers: usize,
) -> bool {
    let workers = workers.max(1);
    let visited: VisitedRegistry<I> = VisitedRegistry::with_capacity(graph.len() + 1);
    let mut state = ReadyState::build(&graph);
    let mut running: JoinSet<(I, EdgeOutcome)> = JoinSet::new();

    // A root without prerequisites is ready straight away.
    let mut root_ready = state
        .remaining
        .get(graph.root())
        .is_none_or(|count| *count == 0);

    info!(workers, tasks = graph.len(), "pool scheduler starting");

    while !root_ready {
        while running.len() < workers {
            let Some(id) = state.ready.pop_front() else {
                break;
            };
            if !visited.claim(&id) {
                warn!(task = %id, "node became ready twice; ignoring");
                continue;
            }

            let failed = state.take_failed(&id);
            if !failed.is_empty() {
                let outcome = skip_task(&outcomes, &id, failed);
                root_ready |= state.settle(&graph, &id, outcome);
                continue;
            }

            let graph = Arc::clone(&graph);
            let outcomes = Arc::clone(&outcomes);
            running.spawn(async move {
                let outcome = run_task(&graph, &outcomes, &id).await;
                (id, outcome)
            });
        }

        if root_ready {
            break;
        }

        match running.join_next().await {
            Some(Ok((id, outcome))) => {
                debug!(task = %id, ?outcome, "worker finished");
                root_ready |= state.settle(&graph, &id, outcome);
            }
            Some(Err(join_err)) => {
                // run_task isolates task panics itself, so this only fires if
                // the runtime is shutting down.
                warn!(error = %join_err, "pool worker aborted");
            }
            None => {
                if state.ready.is_empty() {
                    warn!("no runnable tasks left but the root is not ready; stopping");
                    break;
                }
            }
        }
    }

    let root_succeeded = root_ready && state.take_failed(graph.root()).is_empty();

    if outcomes.close() {
        debug!(root = %graph.root(), "root settled; outcome aggregator closed");
    }

    root_succeeded
}
