// src/dag/visited.rs

use std::collections::HashSet;

use parking_lot::Mutex;

use crate::dag::task::TaskId;

/// Per-run claim set over task identifiers.
///
/// `claim` returns `true` exactly once per identifier, for whichever caller
/// gets there first. Claims are never released for the lifetime of the run,
/// which is what makes traversal idempotent when a node is reachable through
/// several parents.
///
/// A single coarse lock is enough for graphs of a few thousand nodes.
#[derive(Debug)]
pub struct VisitedRegistry<I: TaskId> {
    claimed: Mutex<HashSet<I>>,
}

impl<I: TaskId> VisitedRegistry<I> {
    pub fn new() -> Self {
        Self {
            claimed: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            claimed: Mutex::new(HashSet::with_capacity(capacity)),
        }
    }

    /// Claim `id` for execution. Returns `false` if it was already claimed.
    pub fn claim(&self, id: &I) -> bool {
        let mut claimed = self.claimed.lock();
        if claimed.contains(id) {
            return false;
        }
        claimed.insert(id.clone())
    }

    pub fn contains(&self, id: &I) -> bool {
        self.claimed.lock().contains(id)
    }

    pub fn len(&self) -> usize {
        self.claimed.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.lock().is_empty()
    }
}

impl<I: TaskId> Default for VisitedRegistry<I> {
    fn default() -> Self {
        Self::new()
    }
}
