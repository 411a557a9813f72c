// src/exec/job.rs

//! Batch-job task: submit once, then poll until the job reaches a terminal
//! state.
//!
//! The cluster client is abstracted behind [`JobBackend`] so the task can be
//! driven by a real batch API in production and by a scripted fake in tests.
//!
//! Job tasks are library-only: the crate ships no cluster client, so
//! `Graph::from_config` never builds them. Callers that bring a backend add
//! them with `Graph::add_task`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use tracing::{debug, info, warn};

use crate::dag::{BoxFuture, Task, TaskId, TaskResult};

/// Consecutive status errors tolerated before the job is declared failed.
const MAX_STATUS_ERRORS: u32 = 3;

/// What to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub name: String,
    /// Container image, including tag.
    pub image: String,
    pub args: Vec<String>,
    /// Pod-level retries the backend may attempt before reporting failure.
    pub backoff_limit: u32,
}

/// Snapshot of a submitted job's pod counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobStatus {
    pub active: u32,
    pub succeeded: u32,
    pub failed: u32,
}

/// Terminal interpretation of a [`JobStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn state(&self, backoff_limit: u32) -> JobState {
        if self.succeeded > 0 {
            JobState::Succeeded
        } else if self.failed > backoff_limit {
            JobState::Failed
        } else {
            JobState::Running
        }
    }
}

/// Client for a batch-job API.
pub trait JobBackend: Send + Sync {
    /// Create the job. Returns the backend's name for it.
    fn submit<'a>(&'a self, spec: &'a JobSpec) -> BoxFuture<'a, Result<String>>;

    /// Fetch the current counters for a submitted job.
    fn status<'a>(&'a self, job: &'a str) -> BoxFuture<'a, Result<JobStatus>>;
}

/// Task that runs a [`JobSpec`] on a [`JobBackend`].
pub struct JobTask<I, B> {
    id: I,
    spec: JobSpec,
    backend: Arc<B>,
    poll_interval: Duration,
}

impl<I: TaskId, B: JobBackend> JobTask<I, B> {
    pub fn new(id: I, spec: JobSpec, backend: Arc<B>) -> Self {
        Self {
            id,
            spec,
            backend,
            poll_interval: Duration::from_secs(1),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn spec(&self) -> &JobSpec {
        &self.spec
    }

    async fn submit_and_wait(&self) -> Result<()> {
        let job = self
            .backend
            .submit(&self.spec)
            .await
            .map_err(|e| anyhow!("cannot create job '{}': {e:#}", self.spec.name))?;
        info!(task = %self.id, job = %job, image = %self.spec.image, "created job");

        let mut status_errors = 0;
        loop {
            match self.backend.status(&job).await {
                Ok(status) => {
                    status_errors = 0;
                    debug!(
                        task = %self.id,
                        job = %job,
                        active = status.active,
                        succeeded = status.succeeded,
                        failed = status.failed,
                        "job status"
                    );
                    match status.state(self.spec.backoff_limit) {
                        JobState::Succeeded => {
                            info!(task = %self.id, job = %job, "job finished with success");
                            return Ok(());
                        }
                        JobState::Failed => {
                            warn!(task = %self.id, job = %job, "job finished with error");
                            return Err(anyhow!(
                                "job '{}' failed after {} retries",
                                job,
                                self.spec.backoff_limit
                            ));
                        }
                        JobState::Running => {}
                    }
                }
                Err(err) => {
                    status_errors += 1;
                    warn!(
                        task = %self.id,
                        job = %job,
                        error = %err,
                        attempt = status_errors,
                        "could not read job status"
                    );
                    if status_errors >= MAX_STATUS_ERRORS {
                        return Err(err.context(format!(
                            "giving up on job '{}' after {} status errors",
                            job, status_errors
                        )));
                    }
                }
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

impl<I: TaskId, B: JobBackend + 'static> Task<I> for JobTask<I, B> {
    fn id(&self) -> &I {
        &self.id
    }

    fn run(&self) -> BoxFuture<'_, TaskResult> {
        Box::pin(self.submit_and_wait())
    }
}
