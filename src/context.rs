// src/context.rs

//! Explicitly constructed orchestrator context.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::model::ConfigFile;
use crate::errors::Result;
use crate::pipeline::{TaskTable, TransformRegistry};

/// Fan-out of live-reload signals to every connected browser.
///
/// Lagging receivers drop old signals; the sender never blocks.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    tx: broadcast::Sender<()>,
}

impl ReloadHub {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(16);
        Self { tx }
    }

    /// Send one reload signal; returns how many subscribers received it.
    pub fn notify(&self) -> usize {
        self.tx.send(()).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything a task run needs, handed to the executor and server instead of
/// living in globals.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub tasks: Arc<TaskTable>,
    pub registry: Arc<TransformRegistry>,
    pub reload: ReloadHub,
    /// Disable the incremental filter for this invocation.
    pub force: bool,
}

impl BuildContext {
    pub fn new(tasks: TaskTable, registry: TransformRegistry, force: bool) -> Self {
        Self {
            tasks: Arc::new(tasks),
            registry: Arc::new(registry),
            reload: ReloadHub::new(),
            force,
        }
    }

    /// Build the task table for `cfg` with the built-in processors.
    pub fn from_config(cfg: &ConfigFile, root: impl Into<PathBuf>, force: bool) -> Result<Self> {
        let tasks = TaskTable::from_config(cfg, root)?;
        Ok(Self::new(tasks, TransformRegistry::builtin(), force))
    }

    pub fn root(&self) -> &Path {
        self.tasks.root()
    }

    pub fn build_dir(&self) -> &Path {
        self.tasks.build_dir()
    }
}
