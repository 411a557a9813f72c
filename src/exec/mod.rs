// src/exec/mod.rs

//! Concrete task implementations.
//!
//! The scheduler only knows the [`Task`](crate::dag::Task) trait; these are
//! the units of work shipped with the crate.
//!
//! - [`command`] runs a shell command with `tokio::process`, retrying with
//!   exponential backoff.
//! - [`job`] submits a batch job through a pluggable [`JobBackend`] and polls
//!   it until it succeeds or exhausts its retries.

pub mod command;
pub mod job;

pub use command::CommandTask;
pub use job::{JobBackend, JobSpec, JobState, JobStatus, JobTask};
