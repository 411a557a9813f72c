// src/dag/mod.rs

//! Graph definition and concurrent execution.
//!
//! - [`graph`] holds the immutable run definition and its validation.
//! - [`task`] defines the `Task` capability and identifier bounds.
//! - [`visited`] is the per-run claim set.
//! - [`signal`] builds the per-edge completion channels.
//! - [`outcome`] collects failures and skips for the caller.
//! - [`runner`] is the recursive spawn scheduler.
//! - [`pool`] is the bounded worker-pool scheduler.
//! - [`executor`] is the validated entry point tying a run together.

pub mod executor;
pub mod graph;
pub mod outcome;
pub(crate) mod pool;
pub(crate) mod runner;
pub mod signal;
pub mod task;
pub mod visited;

pub use executor::{Executor, RunHandle};
pub use graph::Graph;
pub use outcome::{FailureKind, OutcomeAggregator, OutcomeStream, RunFailure, RunReport};
pub use signal::{EdgeOutcome, NodeSignals, SignalFabric};
pub use task::{BoxFuture, Task, TaskId, TaskResult};
pub use visited::VisitedRegistry;
