// src/dag/scheduler.rs

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::dag::graph::{PlanGraph, StepId};
use crate::engine::{TaskName, TaskOutcome};

/// Per-run state of a plan step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepState {
    /// Waiting on dependencies.
    Pending,
    /// Dispatched to the executor.
    Running,
    DoneSuccess,
    /// The task itself failed, with a short reason.
    DoneFailed(String),
    /// Never started because something upstream failed.
    Skipped,
}

impl StepState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StepState::DoneSuccess | StepState::DoneFailed(_) | StepState::Skipped
        )
    }
}

/// A step the scheduler wants the executor to run now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledStep {
    pub run_id: u64,
    pub step: StepId,
    pub task: TaskName,
}

/// Outcome of one finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub run_id: u64,
    /// Final state of every step, in step order.
    pub steps: Vec<(TaskName, StepState)>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn succeeded(&self) -> bool {
        self.steps
            .iter()
            .all(|(_, state)| *state == StepState::DoneSuccess)
    }

    fn tasks_where(&self, pred: impl Fn(&StepState) -> bool) -> Vec<&str> {
        self.steps
            .iter()
            .filter(|(_, state)| pred(state))
            .map(|(task, _)| task.as_str())
            .collect()
    }

    pub fn succeeded_tasks(&self) -> Vec<&str> {
        self.tasks_where(|s| *s == StepState::DoneSuccess)
    }

    pub fn failed_tasks(&self) -> Vec<&str> {
        self.tasks_where(|s| matches!(s, StepState::DoneFailed(_)))
    }

    pub fn skipped_tasks(&self) -> Vec<&str> {
        self.tasks_where(|s| *s == StepState::Skipped)
    }
}

/// State machine for a single build run over a lowered plan.
///
/// It is responsible for:
/// - deciding which steps are ready (all deps `DoneSuccess`)
/// - recording completions
/// - skipping every transitive dependent of a failed step
///
/// Siblings of a failed step keep running; nothing is ever cancelled.
#[derive(Debug)]
pub struct Scheduler {
    run_id: u64,
    graph: PlanGraph,
    states: Vec<StepState>,
    started: Instant,
}

impl Scheduler {
    pub fn new(run_id: u64, graph: PlanGraph) -> Self {
        let states = vec![StepState::Pending; graph.len()];
        Self {
            run_id,
            graph,
            states,
            started: Instant::now(),
        }
    }

    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    /// Dispatch the root steps.
    pub fn start(&mut self) -> Vec<ScheduledStep> {
        debug!(run_id = self.run_id, steps = self.graph.len(), "scheduler: starting run");
        self.collect_new_ready_steps()
    }

    /// Record the outcome of a running step and return newly ready steps.
    pub fn handle_completion(&mut self, step: StepId, outcome: &TaskOutcome) -> Vec<ScheduledStep> {
        let Some(state) = self.states.get_mut(step) else {
            warn!(run_id = self.run_id, step, "completion for unknown step; ignoring");
            return Vec::new();
        };
        if *state != StepState::Running {
            warn!(run_id = self.run_id, step, ?state, "completion for step that is not running; ignoring");
            return Vec::new();
        }

        match outcome {
            TaskOutcome::Success => {
                *state = StepState::DoneSuccess;
                debug!(run_id = self.run_id, step, "step completed successfully");
            }
            TaskOutcome::Failed(reason) => {
                *state = StepState::DoneFailed(reason.clone());
                self.skip_dependents(step);
            }
        }

        let ready = self.collect_new_ready_steps();
        if self.is_finished() {
            info!(
                run_id = self.run_id,
                elapsed_ms = self.started.elapsed().as_millis() as u64,
                "scheduler: all steps terminal; run finished"
            );
        }
        ready
    }

    /// True once every step is terminal. An empty plan is finished at once.
    pub fn is_finished(&self) -> bool {
        self.states.iter().all(StepState::is_terminal)
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            run_id: self.run_id,
            steps: self
                .graph
                .steps()
                .iter()
                .zip(&self.states)
                .map(|(step, state)| (step.task.clone(), state.clone()))
                .collect(),
            elapsed: self.started.elapsed(),
        }
    }

    fn deps_satisfied(&self, step: StepId) -> bool {
        self.graph
            .dependencies_of(step)
            .iter()
            .all(|dep| self.states[*dep] == StepState::DoneSuccess)
    }

    fn collect_new_ready_steps(&mut self) -> Vec<ScheduledStep> {
        let candidates: Vec<StepId> = (0..self.states.len())
            .filter(|id| self.states[*id] == StepState::Pending && self.deps_satisfied(*id))
            .collect();

        candidates
            .into_iter()
            .map(|id| {
                self.states[id] = StepState::Running;
                let task = self.graph.steps()[id].task.clone();
                debug!(run_id = self.run_id, step = id, task = %task, "dependencies satisfied; marking Running");
                ScheduledStep {
                    run_id: self.run_id,
                    step: id,
                    task,
                }
            })
            .collect()
    }

    fn skip_dependents(&mut self, failed: StepId) {
        let mut stack: Vec<StepId> = self.graph.dependents_of(failed).to_vec();

        while let Some(id) = stack.pop() {
            if self.states[id] == StepState::Pending {
                self.states[id] = StepState::Skipped;
                debug!(
                    run_id = self.run_id,
                    step = id,
                    task = %self.graph.steps()[id].task,
                    "skipping step due to upstream failure"
                );
                stack.extend_from_slice(self.graph.dependents_of(id));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::plan::Plan;

    fn scheduler(plan: Plan) -> Scheduler {
        Scheduler::new(1, PlanGraph::lower(&plan))
    }

    fn names(steps: &[ScheduledStep]) -> Vec<&str> {
        steps.iter().map(|s| s.task.as_str()).collect()
    }

    fn failed() -> TaskOutcome {
        TaskOutcome::Failed("boom".into())
    }

    #[test]
    fn series_runs_one_after_another() {
        let mut s = scheduler(Plan::Series(vec![Plan::task("a"), Plan::task("b")]));
        let first = s.start();
        assert_eq!(names(&first), vec!["a"]);

        let next = s.handle_completion(first[0].step, &TaskOutcome::Success);
        assert_eq!(names(&next), vec!["b"]);
        assert!(!s.is_finished());

        assert!(s.handle_completion(next[0].step, &TaskOutcome::Success).is_empty());
        assert!(s.is_finished());
        assert!(s.summary().succeeded());
    }

    #[test]
    fn failure_skips_transitive_dependents_only() {
        // series(parallel(a, b), c, d)
        let mut s = scheduler(Plan::Series(vec![
            Plan::Parallel(vec![Plan::task("a"), Plan::task("b")]),
            Plan::task("c"),
            Plan::task("d"),
        ]));
        let roots = s.start();
        assert_eq!(names(&roots), vec!["a", "b"]);

        assert!(s.handle_completion(roots[0].step, &failed()).is_empty());
        assert!(!s.is_finished(), "b is still running");

        assert!(s.handle_completion(roots[1].step, &TaskOutcome::Success).is_empty());
        assert!(s.is_finished());

        let summary = s.summary();
        assert!(!summary.succeeded());
        assert_eq!(summary.failed_tasks(), vec!["a"]);
        assert_eq!(summary.succeeded_tasks(), vec!["b"]);
        assert_eq!(summary.skipped_tasks(), vec!["c", "d"]);
    }

    #[test]
    fn empty_plan_is_finished_immediately() {
        let mut s = scheduler(Plan::Parallel(vec![]));
        assert!(s.start().is_empty());
        assert!(s.is_finished());
        assert!(s.summary().succeeded());
    }

    #[test]
    fn duplicate_or_unknown_completions_are_ignored() {
        let mut s = scheduler(Plan::task("a"));
        let roots = s.start();
        s.handle_completion(roots[0].step, &TaskOutcome::Success);
        assert!(s.handle_completion(roots[0].step, &failed()).is_empty());
        assert!(s.handle_completion(42, &TaskOutcome::Success).is_empty());
        assert!(s.summary().succeeded());
    }
}
