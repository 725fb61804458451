// src/engine/queue.rs

use std::collections::BTreeSet;

use tracing::debug;

use crate::engine::TaskName;

/// Watch triggers that arrived while a build run was active.
///
/// Every triggered task is kept (a task triggered twice is kept once). When
/// the runtime goes idle it drains them into a single merged
/// `parallel(...)` run; the ordered set keeps that run deterministic.
#[derive(Debug, Default)]
pub struct TriggerQueue {
    pending: BTreeSet<TaskName>,
}

impl TriggerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of distinct tasks waiting.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Remember `task` for the run after the current one.
    pub fn record_trigger(&mut self, task: &str) {
        let inserted = self.pending.insert(task.to_string());
        debug!(task, inserted, pending = self.pending.len(), "queued trigger for next run");
    }

    /// Take every queued name, sorted.
    pub fn drain_pending(&mut self) -> Vec<TaskName> {
        let drained = std::mem::take(&mut self.pending);
        debug!(drained = drained.len(), "drained queued triggers");
        drained.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_triggers_coalesce() {
        let mut q = TriggerQueue::new();
        q.record_trigger("style");
        q.record_trigger("js");
        q.record_trigger("style");
        assert_eq!(q.len(), 2);
        assert_eq!(q.drain_pending(), vec!["js", "style"]);
        assert!(q.is_empty());
    }

    #[test]
    fn later_triggers_never_displace_earlier_ones() {
        let mut q = TriggerQueue::new();
        for task in ["style", "js", "html", "img", "fonts"] {
            q.record_trigger(task);
        }
        assert_eq!(
            q.drain_pending(),
            vec!["fonts", "html", "img", "js", "style"]
        );
        assert!(q.drain_pending().is_empty());
    }
}
