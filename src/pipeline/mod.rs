// src/pipeline/mod.rs

//! Per-file processing.
//!
//! - [`registry`] maps processor names to implementations and folds a step
//!   list over an asset.
//! - [`processors`] holds the built-in processors.
//! - [`sources`] expands a task's globs into input files.
//! - [`incremental`] decides which inputs can be skipped.
//! - [`task`] is the immutable task table built from config.

pub mod asset;
pub mod incremental;
pub mod processors;
pub mod registry;
pub mod sources;
pub mod task;

pub use asset::{Asset, StepOptions};
pub use incremental::IncrementalFilter;
pub use registry::{Processor, StepSpec, TransformRegistry};
pub use sources::{SourceFile, SourceSet};
pub use task::{Task, TaskTable};
