#![allow(dead_code)]

use std::collections::BTreeMap;

use dagkube::config::{ConfigFile, DefaultSection, RawConfigFile, RunSection, TaskConfig};
use dagkube::dag::Graph;
use dagkube::types::StrategyKind;

use crate::recording::{Recorder, RecordingTask};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                run: RunSection::default(),
                default: DefaultSection::default(),
                task: BTreeMap::new(),
            },
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn with_root(mut self, root: &str) -> Self {
        self.config.run.root = root.to_string();
        self
    }

    pub fn with_pool(mut self, workers: usize) -> Self {
        self.config.run.strategy = StrategyKind::Pool;
        self.config.run.max_workers = workers;
        self
    }

    pub fn with_default_retries(mut self, retries: u32) -> Self {
        self.config.default.retries = retries;
        self
    }

    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            task: TaskConfig {
                cmd: cmd.to_string(),
                after: vec![],
                retries: None,
                retry_delay_ms: None,
            },
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.task.retries = Some(retries);
        self
    }

    pub fn retry_delay_ms(mut self, ms: u64) -> Self {
        self.task.retry_delay_ms = Some(ms);
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}

/// Builder for graphs of [`RecordingTask`]s sharing one [`Recorder`].
pub struct GraphBuilder {
    graph: Graph<String>,
    recorder: Recorder,
}

impl GraphBuilder {
    pub fn new(root: &str, recorder: &Recorder) -> Self {
        Self {
            graph: Graph::new(root.to_string()),
            recorder: recorder.clone(),
        }
    }

    /// Add a succeeding task with the given prerequisites.
    pub fn task(self, id: &str, after: &[&str]) -> Self {
        let task = self.recorder.task(id);
        self.with_task(task, after)
    }

    /// Add a failing task with the given prerequisites.
    pub fn failing_task(self, id: &str, after: &[&str]) -> Self {
        let task = self.recorder.task(id).failing();
        self.with_task(task, after)
    }

    pub fn with_task(mut self, task: RecordingTask, after: &[&str]) -> Self {
        let id = dagkube::dag::Task::id(&task).clone();
        self.graph.add_task(task).expect("duplicate task in test graph");
        for dep in after {
            self.graph.add_dependency(id.clone(), dep.to_string());
        }
        self
    }

    /// Declare the root's prerequisites.
    pub fn root_after(mut self, deps: &[&str]) -> Self {
        let root = self.graph.root().clone();
        for dep in deps {
            self.graph.add_dependency(root.clone(), dep.to_string());
        }
        self
    }

    pub fn build(self) -> Graph<String> {
        self.graph
    }
}
