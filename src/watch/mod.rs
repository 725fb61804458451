// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling `[[watch]]` bindings into glob sets.
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - Debouncing bursts of changes per binding.
//!
//! It does **not** know about plans or the scheduler; it only turns
//! filesystem changes into task-level triggers.

pub mod debounce;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use debounce::Debouncer;
pub use patterns::{WatchBinding, WatchBindings};
pub use watcher::{run_trigger_loop, spawn_watcher, WatcherHandle};
