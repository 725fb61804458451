// src/exec/backend.rs

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::context::BuildContext;
use crate::dag::ScheduledStep;
use crate::engine::RuntimeEvent;
use crate::errors::Result;

use super::task_runner::run_step;

/// Seam between the runtime and whatever actually executes plan steps.
///
/// Implementations must eventually send exactly one
/// `RuntimeEvent::StepCompleted` per dispatched step.
pub trait ExecutorBackend: Send {
    fn spawn_ready_steps(
        &mut self,
        steps: Vec<ScheduledStep>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Runs every step as its own tokio task against a [`BuildContext`].
#[derive(Debug, Clone)]
pub struct RealExecutorBackend {
    ctx: BuildContext,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
}

impl RealExecutorBackend {
    pub fn new(ctx: BuildContext, runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        Self { ctx, runtime_tx }
    }
}

impl ExecutorBackend for RealExecutorBackend {
    fn spawn_ready_steps(
        &mut self,
        steps: Vec<ScheduledStep>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            for scheduled in steps {
                let ctx = self.ctx.clone();
                let tx = self.runtime_tx.clone();

                tokio::spawn(async move {
                    debug!(run_id = scheduled.run_id, task = %scheduled.task, "step started");
                    let outcome = run_step(&ctx, &scheduled.task).await;

                    let event = RuntimeEvent::StepCompleted {
                        run_id: scheduled.run_id,
                        step: scheduled.step,
                        task: scheduled.task,
                        outcome,
                    };
                    if let Err(err) = tx.send(event).await {
                        warn!("failed to send StepCompleted to runtime: {err}");
                    }
                });
            }
            Ok(())
        })
    }
}
