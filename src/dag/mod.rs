// src/dag/mod.rs

//! Plan lowering and scheduling.
//!
//! - [`plan`] resolves `series` / `parallel` expressions from config into a
//!   tree of task names.
//! - [`graph`] lowers a plan into a dependency graph of plan steps.
//! - [`scheduler`] contains the per-run state machine that decides which
//!   steps are ready, and which are skipped after a failure.

pub mod graph;
pub mod plan;
pub mod scheduler;

pub use graph::{PlanGraph, PlanStep, StepId};
pub use plan::{Plan, PlanCatalog};
pub use scheduler::{RunSummary, ScheduledStep, Scheduler, StepState};

/// Built-in task that removes the build directory.
pub const CLEAN_TASK: &str = "clean";
