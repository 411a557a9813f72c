// src/dag/task.rs

//! The task capability consumed by the scheduler.

use std::fmt::{Debug, Display};
use std::future::Future;
use std::hash::Hash;
use std::pin::Pin;

/// Boxed, sendable future used at the trait-object seams of the crate.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Result of a single task run. The error is the failure reason; the
/// scheduler only looks at success vs failure.
pub type TaskResult = std::result::Result<(), anyhow::Error>;

/// Identifier of a node in the graph.
///
/// Blanket-implemented for anything that is cheap to compare, hash, order and
/// print. `Ord` keeps iteration over dependency sets deterministic.
pub trait TaskId: Clone + Eq + Hash + Ord + Debug + Display + Send + Sync + 'static {}

impl<T> TaskId for T where T: Clone + Eq + Hash + Ord + Debug + Display + Send + Sync + 'static {}

/// A unit of work in the graph.
///
/// Implementations may block for a long time (e.g. waiting for a batch job)
/// and must be safe to run concurrently with unrelated tasks. The scheduler
/// calls `run` at most once per task per run and never retries it.
pub trait Task<I: TaskId>: Send + Sync {
    /// Identifier this task is registered under.
    fn id(&self) -> &I;

    /// Perform the work.
    fn run(&self) -> BoxFuture<'_, TaskResult>;
}
