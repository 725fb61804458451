// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::Runtime`) is responsible for reading
//! events from channels, handing steps to the executor, broadcasting reload
//! signals and keeping the latest run summary.

use std::collections::HashSet;

use crate::dag::PlanCatalog;
use crate::engine::event_handlers::{
    handle_run_request, handle_step_completion, handle_task_trigger, CoreStep, RunSlot,
};
use crate::engine::queue::TriggerQueue;
use crate::engine::{RuntimeEvent, RuntimeOptions, TaskName};

/// Pure core runtime state.
///
/// It has no channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    catalog: PlanCatalog,
    reload_tasks: HashSet<TaskName>,
    slot: RunSlot,
    queue: TriggerQueue,
    options: RuntimeOptions,
}

impl CoreRuntime {
    pub fn new(
        catalog: PlanCatalog,
        reload_tasks: impl IntoIterator<Item = TaskName>,
        options: RuntimeOptions,
    ) -> Self {
        Self {
            catalog,
            reload_tasks: reload_tasks.into_iter().collect(),
            slot: RunSlot::default(),
            queue: TriggerQueue::new(),
            options,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.slot.is_idle()
    }

    pub fn queue_is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Handle a single runtime event, returning the commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::RunRequested { plan, reason } => handle_run_request(
                &mut self.slot,
                &mut self.queue,
                &self.catalog,
                &self.options,
                plan,
                reason,
            ),
            RuntimeEvent::TaskTriggered { task, reason: _ } => handle_task_trigger(
                &mut self.slot,
                &mut self.queue,
                &self.catalog,
                &self.options,
                task,
            ),
            RuntimeEvent::StepCompleted {
                run_id,
                step,
                task,
                outcome,
            } => handle_step_completion(
                &mut self.slot,
                &mut self.queue,
                &self.catalog,
                &self.reload_tasks,
                &self.options,
                run_id,
                step,
                task,
                outcome,
            ),
            RuntimeEvent::ShutdownRequested => CoreStep {
                commands: Vec::new(),
                keep_running: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_str;
    use crate::dag::{Plan, ScheduledStep};
    use crate::engine::event_handlers::CoreCommand;
    use crate::engine::{TaskOutcome, TriggerReason};

    const CFG: &str = r#"
[task.html]
src = ["src/*.html"]
dest = "build"
reload = true

[task.js]
src = ["src/js/*.js"]
dest = "build/js"
reload = true

[task.fonts]
src = ["src/fonts/*"]
dest = "build/fonts"
"#;

    fn core(exit_when_idle: bool) -> CoreRuntime {
        let cfg = parse_str(CFG).unwrap();
        CoreRuntime::new(
            PlanCatalog::from_config(&cfg),
            ["html".to_string(), "js".to_string()],
            RuntimeOptions { exit_when_idle },
        )
    }

    fn dispatched(commands: &[CoreCommand]) -> Vec<ScheduledStep> {
        commands
            .iter()
            .filter_map(|c| match c {
                CoreCommand::DispatchSteps(steps) => Some(steps.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    fn complete(step: &ScheduledStep, outcome: TaskOutcome) -> RuntimeEvent {
        RuntimeEvent::StepCompleted {
            run_id: step.run_id,
            step: step.step,
            task: step.task.clone(),
            outcome,
        }
    }

    #[test]
    fn one_shot_run_exits_when_done() {
        let mut core = core(true);
        let plan = Plan::Series(vec![Plan::task("clean"), Plan::task("fonts")]);
        let out = core.step(RuntimeEvent::RunRequested {
            plan,
            reason: TriggerReason::Manual,
        });
        assert!(out.keep_running);
        let clean = dispatched(&out.commands);
        assert_eq!(clean[0].task, "clean");

        let out = core.step(complete(&clean[0], TaskOutcome::Success));
        let fonts = dispatched(&out.commands);
        assert_eq!(fonts[0].task, "fonts");

        let out = core.step(complete(&fonts[0], TaskOutcome::Success));
        assert!(!out.keep_running);
        assert!(matches!(&out.commands[0], CoreCommand::RunFinished(s) if s.succeeded()));
        assert_eq!(out.commands.last(), Some(&CoreCommand::RequestExit));
    }

    #[test]
    fn reload_only_for_successful_reload_tasks() {
        let mut core = core(false);
        let out = core.step(RuntimeEvent::RunRequested {
            plan: Plan::parallel_tasks(["html", "fonts", "js"]),
            reason: TriggerReason::Manual,
        });
        let steps = dispatched(&out.commands);
        assert_eq!(steps.len(), 3);

        let html = core.step(complete(&steps[0], TaskOutcome::Success));
        assert!(html.commands.contains(&CoreCommand::NotifyReload { task: "html".into() }));

        let fonts = core.step(complete(&steps[1], TaskOutcome::Success));
        assert!(!fonts
            .commands
            .iter()
            .any(|c| matches!(c, CoreCommand::NotifyReload { .. })));

        let js = core.step(complete(&steps[2], TaskOutcome::Failed("syntax".into())));
        assert!(!js
            .commands
            .iter()
            .any(|c| matches!(c, CoreCommand::NotifyReload { .. })));
        assert!(js.keep_running);
        assert!(core.is_idle());
    }

    #[test]
    fn triggers_during_a_run_start_one_merged_run_afterwards() {
        let mut core = core(false);
        let out = core.step(RuntimeEvent::TaskTriggered {
            task: "html".into(),
            reason: TriggerReason::FileWatch,
        });
        let first = dispatched(&out.commands);
        assert_eq!(first.len(), 1);

        for task in ["js", "fonts", "js"] {
            let out = core.step(RuntimeEvent::TaskTriggered {
                task: task.into(),
                reason: TriggerReason::FileWatch,
            });
            assert!(dispatched(&out.commands).is_empty());
        }
        assert!(!core.queue_is_empty());

        let out = core.step(complete(&first[0], TaskOutcome::Success));
        let next = dispatched(&out.commands);
        let mut names: Vec<_> = next.iter().map(|s| s.task.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["fonts", "js"]);
        assert_eq!(next[0].run_id, first[0].run_id + 1);
    }

    #[test]
    fn stale_completions_and_unknown_triggers_are_ignored() {
        let mut core = core(false);
        let out = core.step(RuntimeEvent::TaskTriggered {
            task: "nope".into(),
            reason: TriggerReason::FileWatch,
        });
        assert!(out.commands.is_empty());

        let out = core.step(RuntimeEvent::StepCompleted {
            run_id: 99,
            step: 0,
            task: "html".into(),
            outcome: TaskOutcome::Success,
        });
        assert!(out.commands.is_empty());
        assert!(core.is_idle());
    }
}
