use std::collections::VecDeque;

use anyhow::{Result, anyhow};
use parking_lot::Mutex;

use dagkube::dag::BoxFuture;
use dagkube::exec::{JobBackend, JobSpec, JobStatus};

/// A scripted job backend that:
/// - records every submitted spec
/// - answers status polls from a script, repeating the last entry forever
pub struct FakeJobBackend {
    submitted: Mutex<Vec<JobSpec>>,
    script: Mutex<VecDeque<Option<JobStatus>>>,
    last: Mutex<Option<JobStatus>>,
    polls: Mutex<usize>,
    reject_submit: bool,
}

impl FakeJobBackend {
    /// Backend that reports each status in turn. `None` entries simulate a
    /// failed status request.
    pub fn scripted(script: Vec<Option<JobStatus>>) -> Self {
        Self {
            submitted: Mutex::new(Vec::new()),
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            polls: Mutex::new(0),
            reject_submit: false,
        }
    }

    /// Backend whose `submit` always fails.
    pub fn rejecting() -> Self {
        Self {
            reject_submit: true,
            ..Self::scripted(Vec::new())
        }
    }

    pub fn submitted(&self) -> Vec<JobSpec> {
        self.submitted.lock().clone()
    }

    pub fn polls(&self) -> usize {
        *self.polls.lock()
    }

    fn next_status(&self) -> Option<JobStatus> {
        *self.polls.lock() += 1;
        let mut script = self.script.lock();
        match script.pop_front() {
            Some(entry) => {
                if entry.is_some() {
                    *self.last.lock() = entry;
                }
                entry
            }
            None => *self.last.lock(),
        }
    }
}

impl JobBackend for FakeJobBackend {
    fn submit<'a>(&'a self, spec: &'a JobSpec) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            if self.reject_submit {
                return Err(anyhow!("admission webhook denied the request"));
            }
            self.submitted.lock().push(spec.clone());
            Ok(format!("dagkube-{}", spec.name))
        })
    }

    fn status<'a>(&'a self, job: &'a str) -> BoxFuture<'a, Result<JobStatus>> {
        Box::pin(async move {
            self.next_status()
                .ok_or_else(|| anyhow!("status of job '{}' unavailable", job))
        })
    }
}
