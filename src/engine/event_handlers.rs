// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use std::collections::HashSet;

use tracing::{error, info, warn};

use crate::dag::{Plan, PlanCatalog, PlanGraph, RunSummary, ScheduledStep, Scheduler, StepId};
use crate::engine::queue::TriggerQueue;
use crate::engine::{RuntimeOptions, TaskName, TaskOutcome, TriggerReason};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Send these steps to the executor.
    DispatchSteps(Vec<ScheduledStep>),
    /// A `reload = true` task just succeeded.
    NotifyReload { task: TaskName },
    /// Every step of a run is terminal.
    RunFinished(RunSummary),
    /// Nothing is running or queued and the runtime was asked to exit then.
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

/// The active run (if any) and the id counter.
#[derive(Debug, Default)]
pub struct RunSlot {
    active: Option<Scheduler>,
    run_counter: u64,
}

impl RunSlot {
    pub fn is_idle(&self) -> bool {
        self.active.is_none()
    }

    pub fn active_run_id(&self) -> Option<u64> {
        self.active.as_ref().map(Scheduler::run_id)
    }

    /// Lower `plan`, start it and return the initial commands. A plan with
    /// nothing to do finishes on the spot.
    fn start_run(&mut self, plan: &Plan, reason: TriggerReason) -> Vec<CoreCommand> {
        self.run_counter += 1;
        let run_id = self.run_counter;
        info!(run_id, plan = %plan, ?reason, "starting build run");

        let mut scheduler = Scheduler::new(run_id, PlanGraph::lower(plan));
        let ready = scheduler.start();

        let mut commands = Vec::new();
        if !ready.is_empty() {
            commands.push(CoreCommand::DispatchSteps(ready));
        }
        if scheduler.is_finished() {
            commands.push(CoreCommand::RunFinished(scheduler.summary()));
        } else {
            self.active = Some(scheduler);
        }
        commands
    }
}

/// Start `plan` now, or queue its tasks if a run is already active.
pub fn handle_run_request(
    slot: &mut RunSlot,
    queue: &mut TriggerQueue,
    catalog: &PlanCatalog,
    options: &RuntimeOptions,
    plan: Plan,
    reason: TriggerReason,
) -> CoreStep {
    let mut commands = Vec::new();

    if slot.is_idle() {
        commands.extend(slot.start_run(&plan, reason));
    } else {
        warn!(plan = %plan, "run requested while another run is active; queueing its tasks");
        for task in plan.task_names() {
            queue.record_trigger(task);
        }
    }

    let keep_running = settle(slot, queue, catalog, options, &mut commands);
    CoreStep {
        commands,
        keep_running,
    }
}

/// A watch binding fired for `task` (a task or plan name).
///
/// Triggers always go through the queue: when idle the queue is drained
/// immediately into a new `parallel(...)` run, otherwise they wait for the
/// active run to finish.
pub fn handle_task_trigger(
    slot: &mut RunSlot,
    queue: &mut TriggerQueue,
    catalog: &PlanCatalog,
    options: &RuntimeOptions,
    task: TaskName,
) -> CoreStep {
    let mut commands = Vec::new();

    if catalog.is_known(&task) {
        queue.record_trigger(&task);
        if let Some(run_id) = slot.active_run_id() {
            info!(task = %task, run_id, "build run in progress; trigger queued");
        }
    } else {
        warn!(task = %task, "trigger for unknown task; ignoring");
    }

    let keep_running = settle(slot, queue, catalog, options, &mut commands);
    CoreStep {
        commands,
        keep_running,
    }
}

/// Record a finished step, dispatch what became ready, and close the run
/// when everything is terminal.
#[allow(clippy::too_many_arguments)]
pub fn handle_step_completion(
    slot: &mut RunSlot,
    queue: &mut TriggerQueue,
    catalog: &PlanCatalog,
    reload_tasks: &HashSet<TaskName>,
    options: &RuntimeOptions,
    run_id: u64,
    step: StepId,
    task: TaskName,
    outcome: TaskOutcome,
) -> CoreStep {
    let mut commands = Vec::new();

    match slot.active.as_mut() {
        Some(scheduler) if scheduler.run_id() == run_id => {
            match &outcome {
                TaskOutcome::Success => {
                    info!(run_id, task = %task, "task finished");
                    if reload_tasks.contains(&task) {
                        commands.push(CoreCommand::NotifyReload { task: task.clone() });
                    }
                }
                TaskOutcome::Failed(reason) => {
                    error!(run_id, task = %task, reason = %reason, "task failed; skipping its dependents");
                }
            }

            let ready = scheduler.handle_completion(step, &outcome);
            if !ready.is_empty() {
                commands.push(CoreCommand::DispatchSteps(ready));
            }
            if scheduler.is_finished() {
                commands.push(CoreCommand::RunFinished(scheduler.summary()));
                slot.active = None;
            }
        }
        _ => {
            warn!(run_id, task = %task, "completion for a run that is not active; ignoring");
        }
    }

    let keep_running = settle(slot, queue, catalog, options, &mut commands);
    CoreStep {
        commands,
        keep_running,
    }
}

/// Start queued runs while idle, then decide whether to keep running.
fn settle(
    slot: &mut RunSlot,
    queue: &mut TriggerQueue,
    catalog: &PlanCatalog,
    options: &RuntimeOptions,
    commands: &mut Vec<CoreCommand>,
) -> bool {
    while slot.is_idle() && !queue.is_empty() {
        let names = queue.drain_pending();
        match catalog.parallel_of(&names) {
            Ok(plan) => commands.extend(slot.start_run(&plan, TriggerReason::FileWatch)),
            Err(err) => warn!(?names, error = %err, "could not resolve queued triggers; dropping"),
        }
    }

    if options.exit_when_idle && slot.is_idle() && queue.is_empty() {
        commands.push(CoreCommand::RequestExit);
        return false;
    }
    true
}
