// src/dag/signal.rs

//! Per-edge completion signals.
//!
//! Every `(dependent, prerequisite)` edge gets its own one-shot channel before
//! the run starts. The prerequisite holds the sending half (its *notify*
//! list), the dependent holds the receiving half (its *wait* list). Because
//! each dependent owns a private slot, a node with many dependents publishes
//! to all of them without ever waiting on any single consumer.

use std::collections::HashMap;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::dag::graph::Graph;
use crate::dag::task::TaskId;

/// What a node tells its dependents once it has settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeOutcome {
    /// The task ran and succeeded (or, for the root, every prerequisite did).
    Succeeded,
    /// The task ran and failed.
    Failed,
    /// The task never ran because a prerequisite did not succeed.
    Skipped,
}

impl EdgeOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, EdgeOutcome::Succeeded)
    }
}

/// Receiving end of one edge, owned by the dependent.
#[derive(Debug)]
pub struct WaitSignal<I: TaskId> {
    prerequisite: I,
    rx: oneshot::Receiver<EdgeOutcome>,
}

impl<I: TaskId> WaitSignal<I> {
    pub fn prerequisite(&self) -> &I {
        &self.prerequisite
    }

    /// Wait for the prerequisite's outcome.
    ///
    /// If the prerequisite went away without publishing (its executor
    /// panicked or was aborted), the edge counts as failed.
    pub async fn wait(self) -> EdgeOutcome {
        match self.rx.await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(
                    prerequisite = %self.prerequisite,
                    "prerequisite dropped its signal without publishing; treating as failed"
                );
                EdgeOutcome::Failed
            }
        }
    }
}

/// Sending end of one edge, owned by the prerequisite.
#[derive(Debug)]
pub struct NotifySignal<I: TaskId> {
    dependent: I,
    tx: oneshot::Sender<EdgeOutcome>,
}

impl<I: TaskId> NotifySignal<I> {
    pub fn dependent(&self) -> &I {
        &self.dependent
    }

    /// Publish the outcome. Never blocks.
    pub fn publish(self, outcome: EdgeOutcome) {
        if self.tx.send(outcome).is_err() {
            debug!(
                dependent = %self.dependent,
                "dependent no longer listening; outcome dropped"
            );
        }
    }
}

/// Wait and notify lists for a single node.
#[derive(Debug)]
pub struct NodeSignals<I: TaskId> {
    pub waits: Vec<WaitSignal<I>>,
    pub notifies: Vec<NotifySignal<I>>,
}

impl<I: TaskId> Default for NodeSignals<I> {
    fn default() -> Self {
        Self {
            waits: Vec::new(),
            notifies: Vec::new(),
        }
    }
}

/// All edge signals of one run, indexed by node.
///
/// Built once from the graph before anything runs. Each node's lists are
/// handed out exactly once through [`SignalFabric::take`], to the executor
/// that claimed the node.
#[derive(Debug)]
pub struct SignalFabric<I: TaskId> {
    nodes: Mutex<HashMap<I, NodeSignals<I>>>,
    edge_count: usize,
}

impl<I: TaskId> SignalFabric<I> {
    pub fn build(graph: &Graph<I>) -> Self {
        let mut nodes: HashMap<I, NodeSignals<I>> = HashMap::new();
        let mut edge_count = 0;

        for (dependent, prerequisite) in graph.edges() {
            let (tx, rx) = oneshot::channel();

            nodes
                .entry(dependent.clone())
                .or_default()
                .waits
                .push(WaitSignal {
                    prerequisite: prerequisite.clone(),
                    rx,
                });
            nodes
                .entry(prerequisite.clone())
                .or_default()
                .notifies
                .push(NotifySignal {
                    dependent: dependent.clone(),
                    tx,
                });
            edge_count += 1;
        }

        debug!(edges = edge_count, nodes = nodes.len(), "signal fabric built");

        Self {
            nodes: Mutex::new(nodes),
            edge_count,
        }
    }

    /// Hand out the wait/notify lists of `id`.
    ///
    /// A node with no edges, or one whose lists were already taken, gets
    /// empty lists.
    pub fn take(&self, id: &I) -> NodeSignals<I> {
        self.nodes.lock().remove(id).unwrap_or_default()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Number of nodes whose lists have not been taken yet.
    pub fn pending_nodes(&self) -> usize {
        self.nodes.lock().len()
    }
}
