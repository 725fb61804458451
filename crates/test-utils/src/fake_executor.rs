use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use assetdag::dag::ScheduledStep;
use assetdag::engine::{RuntimeEvent, TaskOutcome};
use assetdag::errors::{AssetdagError, Result};
use assetdag::exec::ExecutorBackend;
use tokio::sync::mpsc;

/// A fake executor that:
/// - records which tasks were "run", in dispatch order
/// - immediately reports StepCompleted for each step: `Failed` for tasks in
///   the failing set, `Success` otherwise.
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    executed: Arc<Mutex<Vec<String>>>,
    failing: HashSet<String>,
}

impl FakeExecutor {
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>, executed: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            runtime_tx,
            executed,
            failing: HashSet::new(),
        }
    }

    pub fn failing(mut self, task: &str) -> Self {
        self.failing.insert(task.to_string());
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn spawn_ready_steps(
        &mut self,
        steps: Vec<ScheduledStep>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let executed = Arc::clone(&self.executed);

        Box::pin(async move {
            for step in steps {
                {
                    let mut guard = executed.lock().unwrap();
                    guard.push(step.task.clone());
                }

                let outcome = if self.failing.contains(&step.task) {
                    TaskOutcome::Failed(format!("{} failed on purpose", step.task))
                } else {
                    TaskOutcome::Success
                };

                tx.send(RuntimeEvent::StepCompleted {
                    run_id: step.run_id,
                    step: step.step,
                    task: step.task,
                    outcome,
                })
                .await
                .map_err(|e| AssetdagError::Other(anyhow::Error::from(e)))?;
            }
            Ok(())
        })
    }
}
