// src/errors.rs

//! Crate-wide error types.

use std::path::PathBuf;

use thiserror::Error;

/// A single file failed one processing step.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{step} failed for {path:?}: {message}")]
pub struct TransformError {
    pub path: PathBuf,
    pub step: String,
    pub message: String,
}

impl TransformError {
    pub fn new(path: impl Into<PathBuf>, step: impl Into<String>, message: impl ToString) -> Self {
        Self {
            path: path.into(),
            step: step.into(),
            message: message.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AssetdagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("IO error at {path:?}: {source}")]
    PathIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Cycle detected in plans: {0}")]
    PlanCycle(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AssetdagError {
    pub fn path_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AssetdagError::PathIo {
            path: path.into(),
            source,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, AssetdagError>;
