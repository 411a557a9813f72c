// src/exec/command.rs

//! Shell-command task.

use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::dag::{BoxFuture, Task, TaskResult};

/// Runs a shell command; non-zero exit is a failure.
///
/// Retries live here, not in the scheduler: a failing command is re-run up to
/// `retries` more times, waiting `retry_delay * 2^attempt` between attempts.
#[derive(Debug, Clone)]
pub struct CommandTask {
    name: String,
    cmd: String,
    retries: u32,
    retry_delay: Duration,
}

impl CommandTask {
    pub fn new(name: impl Into<String>, cmd: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cmd: cmd.into(),
            retries: 0,
            retry_delay: Duration::from_secs(1),
        }
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    async fn run_with_retries(&self) -> Result<()> {
        let mut attempt: u32 = 0;

        loop {
            let code = self.run_once(attempt.saturating_add(1)).await?;
            if code == 0 {
                return Ok(());
            }

            if attempt >= self.retries {
                return Err(anyhow!(
                    "command `{}` exited with code {} after {} attempt(s)",
                    self.cmd,
                    code,
                    u64::from(attempt) + 1
                ));
            }

            let delay = self.retry_delay.saturating_mul(2u32.saturating_pow(attempt));
            warn!(
                task = %self.name,
                attempt = attempt + 1,
                exit_code = code,
                delay_ms = delay.as_millis() as u64,
                "command failed; retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Run the command once and return its exit code (-1 if killed by a
    /// signal).
    async fn run_once(&self, attempt: u32) -> Result<i32> {
        info!(
            task = %self.name,
            attempt,
            cmd = %self.cmd,
            "starting task process"
        );

        // Build a shell command appropriate for the platform.
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.cmd);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.cmd);
            c
        };

        cmd.stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning process for task '{}'", self.name))?;

        if let Some(stdout) = child.stdout.take() {
            let task_name = self.name.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    info!(task = %task_name, "stdout: {}", line);
                }
            });
        }

        // Always consume stderr so buffers don't fill; log at debug.
        if let Some(stderr) = child.stderr.take() {
            let task_name = self.name.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(task = %task_name, "stderr: {}", line);
                }
            });
        }

        let status = child
            .wait()
            .await
            .with_context(|| format!("waiting for process of task '{}'", self.name))?;

        let code = status.code().unwrap_or(-1);
        info!(
            task = %self.name,
            attempt,
            exit_code = code,
            success = status.success(),
            "task process exited"
        );

        Ok(if status.success() { 0 } else if code == 0 { -1 } else { code })
    }
}

impl Task<String> for CommandTask {
    fn id(&self) -> &String {
        &self.name
    }

    fn run(&self) -> BoxFuture<'_, TaskResult> {
        Box::pin(self.run_with_retries())
    }
}
