// src/exec/mod.rs

//! Step execution layer.
//!
//! - [`backend`] is the seam the runtime dispatches through; the real
//!   backend spawns one tokio task per step and reports back with
//!   `RuntimeEvent::StepCompleted`.
//! - [`task_runner`] does the work of a single task: source expansion,
//!   the incremental filter, the transform chain and writing outputs.

pub mod backend;
pub mod task_runner;

pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use task_runner::{clean_build_dir, run_step, run_task, TaskReport};
