// src/config/mod.rs

//! Configuration loading and validation for assetdag.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate references, plan cycles and processor names (`validate.rs`).
//! - Provide the starter config written by `assetdag init` (`defaults.rs`).

pub mod defaults;
pub mod loader;
pub mod model;
pub mod validate;

pub use defaults::DEFAULT_CONFIG;
pub use loader::{config_root_dir, load_and_validate, load_from_path, parse_str};
pub use model::{
    ConfigFile, ConfigSection, PathsSection, PlanSpec, ServerSection, StepConfig, TaskConfig,
    WatchConfig,
};
pub use validate::{is_known_name, validate_config};
