// src/watch/patterns.rs

use std::fmt;

use globset::GlobSet;

use crate::config::WatchConfig;
use crate::engine::TaskName;
use crate::errors::{AssetdagError, Result};
use crate::pipeline::sources::build_globset;

/// Compiled `[[watch]]` entry.
///
/// Patterns are relative to the project root; the watcher passes relative,
/// forward-slashed paths (e.g. `"src/js/app.js"`) into `matches`.
#[derive(Clone)]
pub struct WatchBinding {
    task: TaskName,
    watch_set: GlobSet,
    exclude_set: Option<GlobSet>,
}

impl fmt::Debug for WatchBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchBinding")
            .field("task", &self.task)
            .finish_non_exhaustive()
    }
}

impl WatchBinding {
    /// Task (or plan) this binding triggers.
    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.watch_set.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude_set {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

/// All watch bindings of a config, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct WatchBindings {
    bindings: Vec<WatchBinding>,
}

impl WatchBindings {
    pub fn compile(configs: &[WatchConfig]) -> Result<Self> {
        let mut bindings = Vec::with_capacity(configs.len());

        for (idx, cfg) in configs.iter().enumerate() {
            let watch_set = build_globset(&cfg.glob).map_err(|e| {
                AssetdagError::ConfigError(format!("watch binding #{idx} ({}): {e}", cfg.task))
            })?;
            let exclude_set = if cfg.exclude.is_empty() {
                None
            } else {
                Some(build_globset(&cfg.exclude).map_err(|e| {
                    AssetdagError::ConfigError(format!("watch binding #{idx} ({}): {e}", cfg.task))
                })?)
            };

            bindings.push(WatchBinding {
                task: cfg.task.clone(),
                watch_set,
                exclude_set,
            });
        }

        Ok(Self { bindings })
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&WatchBinding> {
        self.bindings.get(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WatchBinding> {
        self.bindings.iter()
    }

    /// Indices of every binding interested in `rel_path`.
    pub fn matching(&self, rel_path: &str) -> Vec<usize> {
        self.bindings
            .iter()
            .enumerate()
            .filter(|(_, b)| b.matches(rel_path))
            .map(|(idx, _)| idx)
            .collect()
    }
}
