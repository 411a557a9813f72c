// src/dag/outcome.rs

//! Collecting what went wrong in a run.
//!
//! Non-root nodes record into the [`OutcomeAggregator`]; the root closes it
//! once its own wait step has completed, at which point every reachable node
//! has already recorded. Callers read entries through the matching
//! [`OutcomeStream`], which ends at closure.

use std::fmt;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::warn;

use crate::dag::task::TaskId;

/// Why a node did not succeed.
#[derive(Debug)]
pub enum FailureKind<I> {
    /// The task ran and reported a failure (or panicked).
    Failed(anyhow::Error),
    /// The task never ran because these prerequisites did not succeed.
    Skipped { failed_prerequisites: Vec<I> },
}

/// One entry of the outcome stream.
#[derive(Debug)]
pub struct RunFailure<I> {
    pub id: I,
    pub kind: FailureKind<I>,
}

impl<I: TaskId> RunFailure<I> {
    pub fn failed(id: I, reason: anyhow::Error) -> Self {
        Self {
            id,
            kind: FailureKind::Failed(reason),
        }
    }

    pub fn skipped(id: I, failed_prerequisites: Vec<I>) -> Self {
        Self {
            id,
            kind: FailureKind::Skipped {
                failed_prerequisites,
            },
        }
    }

    pub fn is_direct(&self) -> bool {
        matches!(self.kind, FailureKind::Failed(_))
    }

    pub fn is_skip(&self) -> bool {
        matches!(self.kind, FailureKind::Skipped { .. })
    }

    /// Failure reason, for direct failures.
    pub fn reason(&self) -> Option<&anyhow::Error> {
        match &self.kind {
            FailureKind::Failed(err) => Some(err),
            FailureKind::Skipped { .. } => None,
        }
    }
}

impl<I: TaskId> fmt::Display for RunFailure<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FailureKind::Failed(err) => write!(f, "task '{}' failed: {:#}", self.id, err),
            FailureKind::Skipped {
                failed_prerequisites,
            } => {
                let names: Vec<String> =
                    failed_prerequisites.iter().map(|p| p.to_string()).collect();
                write!(
                    f,
                    "task '{}' skipped: prerequisites did not succeed ({})",
                    self.id,
                    names.join(", ")
                )
            }
        }
    }
}

/// Write side of the outcome channel, shared by every node of a run.
#[derive(Debug)]
pub struct OutcomeAggregator<I> {
    /// `None` once closed. Only this sender exists, so taking it out closes
    /// the channel for the reader.
    tx: Mutex<Option<mpsc::Sender<RunFailure<I>>>>,
}

/// Create an aggregator able to hold `capacity` entries without blocking.
///
/// Size it to the number of nodes: each node records at most once.
pub fn outcome_channel<I: TaskId>(capacity: usize) -> (OutcomeAggregator<I>, OutcomeStream<I>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        OutcomeAggregator {
            tx: Mutex::new(Some(tx)),
        },
        OutcomeStream { rx },
    )
}

impl<I: TaskId> OutcomeAggregator<I> {
    /// Record a failure. Never blocks; entries recorded after closure, or
    /// beyond capacity, are dropped with a warning.
    pub fn record(&self, failure: RunFailure<I>) {
        let guard = self.tx.lock();
        let Some(tx) = guard.as_ref() else {
            warn!(task = %failure.id, "outcome recorded after aggregator closed; dropping");
            return;
        };

        if let Err(err) = tx.try_send(failure) {
            let failure = match err {
                mpsc::error::TrySendError::Full(f) | mpsc::error::TrySendError::Closed(f) => f,
            };
            warn!(task = %failure.id, "outcome aggregator rejected entry; dropping");
        }
    }

    /// Close the aggregator. Returns `true` only for the call that actually
    /// closed it.
    pub fn close(&self) -> bool {
        self.tx.lock().take().is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.lock().is_none()
    }
}

/// Read side of the outcome channel.
#[derive(Debug)]
pub struct OutcomeStream<I> {
    rx: mpsc::Receiver<RunFailure<I>>,
}

impl<I: TaskId> OutcomeStream<I> {
    /// Next entry, or `None` once the aggregator is closed and empty.
    pub async fn recv(&mut self) -> Option<RunFailure<I>> {
        self.rx.recv().await
    }

    /// Collect every entry until closure.
    pub async fn drain(mut self) -> Vec<RunFailure<I>> {
        let mut failures = Vec::new();
        while let Some(failure) = self.rx.recv().await {
            failures.push(failure);
        }
        failures
    }
}

/// Aggregate result of a finished run.
#[derive(Debug)]
pub struct RunReport<I> {
    /// Whether every prerequisite of the root succeeded.
    pub root_succeeded: bool,
    /// Every recorded failure and skip, in the order they were recorded.
    pub failures: Vec<RunFailure<I>>,
}

impl<I: TaskId> RunReport<I> {
    pub fn is_success(&self) -> bool {
        self.root_succeeded && self.failures.is_empty()
    }

    /// Direct failures only.
    pub fn failed(&self) -> impl Iterator<Item = &RunFailure<I>> {
        self.failures.iter().filter(|f| f.is_direct())
    }

    /// Propagated skips only.
    pub fn skipped(&self) -> impl Iterator<Item = &RunFailure<I>> {
        self.failures.iter().filter(|f| f.is_skip())
    }

    pub fn failed_ids(&self) -> Vec<&I> {
        let mut ids: Vec<&I> = self.failed().map(|f| &f.id).collect();
        ids.sort();
        ids
    }

    pub fn skipped_ids(&self) -> Vec<&I> {
        let mut ids: Vec<&I> = self.skipped().map(|f| &f.id).collect();
        ids.sort();
        ids
    }
}
