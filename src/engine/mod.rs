// src/engine/mod.rs

//! Orchestration engine for assetdag.
//!
//! This module ties together:
//! - the per-run plan scheduler
//! - the trigger queue (what happens when watch triggers arrive while a run
//!   is active)
//! - the main runtime event loop that reacts to:
//!   - run requests (the initial `build` / `develop` plan)
//!   - file-watch triggers
//!   - step completion events
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use crate::dag::{Plan, StepId};

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// Outcome of one task run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    /// At least one file failed, or the task could not run at all.
    Failed(String),
}

/// Why a run or task was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// Requested from the command line.
    Manual,
    /// Triggered due to a filesystem event.
    FileWatch,
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    /// If true, exit the runtime once no run is active and nothing is
    /// queued (`build`, `run`, and the first phase of `develop`).
    pub exit_when_idle: bool,
}

/// Events flowing into the runtime from the CLI, watcher and executor.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// Run a whole plan.
    RunRequested { plan: Plan, reason: TriggerReason },
    /// A task (or plan) name should run because something it watches changed.
    TaskTriggered {
        task: TaskName,
        reason: TriggerReason,
    },
    /// A dispatched step finished.
    StepCompleted {
        run_id: u64,
        step: StepId,
        task: TaskName,
        outcome: TaskOutcome,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod queue;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use queue::TriggerQueue;
pub use runtime::Runtime;
