// src/dag/graph.rs

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::config::model::ConfigFile;
use crate::dag::task::{Task, TaskId};
use crate::errors::{DagError, Result};
use crate::exec::CommandTask;

/// Immutable run definition: a root, the tasks, and their prerequisites.
///
/// The root is a pure join point. It never runs any work itself, even if a
/// task happens to be registered under its identifier.
pub struct Graph<I: TaskId> {
    root: I,
    tasks: HashMap<I, Arc<dyn Task<I>>>,
    /// Dependent -> prerequisites.
    dependencies: HashMap<I, BTreeSet<I>>,
}

impl<I: TaskId> Graph<I> {
    /// Start an empty graph with the given root identifier.
    pub fn new(root: I) -> Self {
        Self {
            root,
            tasks: HashMap::new(),
            dependencies: HashMap::new(),
        }
    }

    /// Register a task under its own identifier.
    pub fn add_task<T>(&mut self, task: T) -> Result<&mut Self>
    where
        T: Task<I> + 'static,
    {
        self.add_shared_task(Arc::new(task))
    }

    /// Register an already shared task.
    pub fn add_shared_task(&mut self, task: Arc<dyn Task<I>>) -> Result<&mut Self> {
        let id = task.id().clone();
        if self.tasks.contains_key(&id) {
            return Err(DagError::DuplicateTask(id.to_string()));
        }
        self.tasks.insert(id, task);
        Ok(self)
    }

    /// Declare that `dependent` may only run after `prerequisite` succeeded.
    ///
    /// Declaring the same edge twice is a no-op.
    pub fn add_dependency(&mut self, dependent: I, prerequisite: I) -> &mut Self {
        self.dependencies
            .entry(dependent)
            .or_default()
            .insert(prerequisite);
        self
    }

    pub fn root(&self) -> &I {
        &self.root
    }

    pub fn is_root(&self, id: &I) -> bool {
        *id == self.root
    }

    pub fn task(&self, id: &I) -> Option<&Arc<dyn Task<I>>> {
        self.tasks.get(id)
    }

    /// Immediate prerequisites of `id`, in identifier order.
    pub fn dependencies_of<'a>(&'a self, id: &I) -> impl Iterator<Item = &'a I> + use<'a, I> {
        self.dependencies.get(id).into_iter().flatten()
    }

    /// All registered task identifiers (the root only if a task was
    /// registered under it).
    pub fn task_ids(&self) -> impl Iterator<Item = &I> {
        self.tasks.keys()
    }

    /// Every `(dependent, prerequisite)` edge.
    pub fn edges(&self) -> impl Iterator<Item = (&I, &I)> {
        self.dependencies
            .iter()
            .flat_map(|(dependent, prereqs)| prereqs.iter().map(move |p| (dependent, p)))
    }

    pub fn edge_count(&self) -> usize {
        self.dependencies.values().map(BTreeSet::len).sum()
    }

    /// Number of nodes that can report an outcome (every task except one
    /// registered under the root id).
    pub fn len(&self) -> usize {
        self.tasks.len() - usize::from(self.tasks.contains_key(&self.root))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check the structural invariants the schedulers rely on.
    ///
    /// This checks:
    /// - every node that declares or is named as a prerequisite resolves to
    ///   a registered task (or is the root)
    /// - no node depends on itself and there are no cycles
    /// - every task is reachable from the root through prerequisite edges
    pub fn validate(&self) -> Result<()> {
        self.validate_references()?;
        self.validate_acyclic()?;
        self.validate_reachable()?;
        debug!(
            root = %self.root,
            tasks = self.len(),
            edges = self.edge_count(),
            "graph validated"
        );
        Ok(())
    }

    fn is_known(&self, id: &I) -> bool {
        self.is_root(id) || self.tasks.contains_key(id)
    }

    fn validate_references(&self) -> Result<()> {
        for (dependent, prereq) in self.edges() {
            if !self.is_known(dependent) {
                return Err(DagError::UnknownTask(format!(
                    "'{}' declares dependencies but is not a registered task",
                    dependent
                )));
            }
            if !self.is_known(prereq) {
                return Err(DagError::UnknownTask(format!(
                    "task '{}' has unknown prerequisite '{}'",
                    dependent, prereq
                )));
            }
            if self.is_root(prereq) {
                return Err(DagError::DagCycle(format!(
                    "task '{}' depends on the root '{}'",
                    dependent, prereq
                )));
            }
        }
        Ok(())
    }

    fn validate_acyclic(&self) -> Result<()> {
        // Edge direction: prerequisite -> dependent.
        let mut graph: DiGraphMap<&I, ()> = DiGraphMap::new();
        graph.add_node(&self.root);
        for id in self.tasks.keys() {
            graph.add_node(id);
        }
        for (dependent, prereq) in self.edges() {
            if dependent == prereq {
                return Err(DagError::DagCycle(format!(
                    "task '{}' cannot depend on itself",
                    dependent
                )));
            }
            graph.add_edge(prereq, dependent, ());
        }

        toposort(&graph, None).map(|_| ()).map_err(|cycle| {
            DagError::DagCycle(format!(
                "cycle detected in task DAG involving task '{}'",
                cycle.node_id()
            ))
        })
    }

    fn validate_reachable(&self) -> Result<()> {
        let mut seen: HashSet<&I> = HashSet::new();
        let mut queue: VecDeque<&I> = VecDeque::from([&self.root]);

        while let Some(id) = queue.pop_front() {
            if seen.insert(id) {
                queue.extend(self.dependencies_of(id));
            }
        }

        let mut unreachable: Vec<&I> = self
            .tasks
            .keys()
            .filter(|id| !seen.contains(id))
            .collect();
        if unreachable.is_empty() {
            return Ok(());
        }

        unreachable.sort();
        let names: Vec<String> = unreachable.iter().map(|id| id.to_string()).collect();
        Err(DagError::Unreachable(names.join(", ")))
    }
}

impl Graph<String> {
    /// Build a graph of shell-command tasks from a validated [`ConfigFile`].
    ///
    /// The root depends on every task that no other task lists in `after`,
    /// which is enough for it to reach the whole graph. Job tasks need a
    /// backend and are only added through [`Graph::add_task`].
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let mut graph = Graph::new(cfg.run.root.clone());

        for (name, tc) in cfg.task.iter() {
            let task = CommandTask::new(name.clone(), tc.cmd.clone())
                .with_retries(tc.retries.unwrap_or(cfg.default.retries))
                .with_retry_delay(cfg.retry_delay_for(tc));
            graph.add_task(task)?;

            for dep in tc.after.iter() {
                graph.add_dependency(name.clone(), dep.clone());
            }
        }

        for name in cfg.terminal_tasks() {
            graph.add_dependency(cfg.run.root.clone(), name.to_string());
        }

        Ok(graph)
    }
}

impl<I: TaskId> fmt::Debug for Graph<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut task_ids: Vec<&I> = self.tasks.keys().collect();
        task_ids.sort();
        f.debug_struct("Graph")
            .field("root", &self.root)
            .field("tasks", &task_ids)
            .field("dependencies", &self.dependencies)
            .finish()
    }
}
