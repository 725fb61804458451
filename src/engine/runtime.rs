// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::context::ReloadHub;
use crate::dag::{RunSummary, ScheduledStep};
use crate::errors::Result;
use crate::exec::ExecutorBackend;

use super::core::CoreRuntime;
use super::{CoreCommand, RuntimeEvent};

/// Async shell around [`CoreRuntime`].
///
/// Reads `RuntimeEvent`s, feeds them to the core, hands ready steps to an
/// [`ExecutorBackend`] and broadcasts reload signals. Only the most recent
/// run summary is kept, so a long watch session does not grow.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
    reload: Option<ReloadHub>,
    finished_runs: u64,
    last_summary: Option<RunSummary>,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("finished_runs", &self.finished_runs)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, executor: E) -> Self {
        Self {
            core,
            event_rx,
            executor,
            reload: None,
            finished_runs: 0,
            last_summary: None,
        }
    }

    /// Broadcast reload signals through `hub`.
    pub fn with_reload(mut self, hub: ReloadHub) -> Self {
        self.reload = Some(hub);
        self
    }

    /// Main event loop. Returns the summary of the last run that finished.
    pub async fn run(mut self) -> Result<Option<RunSummary>> {
        debug!("runtime started");

        loop {
            let Some(event) = self.event_rx.recv().await else {
                info!("runtime event channel closed; exiting");
                break;
            };

            debug!(?event, "runtime received event");
            let step = self.core.step(event);

            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                debug!("core requested exit; stopping runtime");
                break;
            }
        }

        debug!(runs = self.finished_runs, "runtime stopped");
        Ok(self.last_summary)
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::DispatchSteps(steps) => self.spawn_ready(steps).await?,
            CoreCommand::NotifyReload { task } => {
                if let Some(hub) = &self.reload {
                    let receivers = hub.notify();
                    debug!(task = %task, receivers, "reload signal sent");
                }
            }
            CoreCommand::RunFinished(summary) => {
                log_summary(&summary);
                self.finished_runs += 1;
                self.last_summary = Some(summary);
            }
            CoreCommand::RequestExit => debug!("core issued RequestExit"),
        }
        Ok(())
    }

    async fn spawn_ready(&mut self, steps: Vec<ScheduledStep>) -> Result<()> {
        if steps.is_empty() {
            return Ok(());
        }
        let names: Vec<_> = steps.iter().map(|s| s.task.as_str()).collect();
        debug!(?names, "dispatching ready steps");
        self.executor.spawn_ready_steps(steps).await
    }
}

fn log_summary(summary: &RunSummary) {
    let elapsed_ms = summary.elapsed.as_millis() as u64;
    if summary.succeeded() {
        info!(
            run_id = summary.run_id,
            tasks = summary.steps.len(),
            elapsed_ms,
            "build run finished"
        );
    } else {
        warn!(
            run_id = summary.run_id,
            failed = ?summary.failed_tasks(),
            skipped = ?summary.skipped_tasks(),
            elapsed_ms,
            "build run finished with failures"
        );
    }
}
