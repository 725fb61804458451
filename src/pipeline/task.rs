// src/pipeline/task.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::config::model::{ConfigFile, TaskConfig};
use crate::errors::Result;
use crate::pipeline::asset::StepOptions;
use crate::pipeline::incremental::IncrementalFilter;
use crate::pipeline::registry::StepSpec;
use crate::pipeline::sources::SourceSet;

/// A configured task, with paths resolved against the project root.
#[derive(Debug)]
pub struct Task {
    pub name: String,
    pub src: Vec<String>,
    pub sources: SourceSet,
    /// Absolute output directory.
    pub dest: PathBuf,
    pub steps: Vec<StepSpec>,
    pub reload: bool,
    pub incremental: Option<IncrementalFilter>,
}

impl Task {
    pub fn from_config(name: &str, cfg: &TaskConfig, root: &Path) -> Result<Self> {
        let dest = root.join(&cfg.dest);
        let steps = cfg
            .steps
            .iter()
            .map(|s| StepSpec::new(s.processor.clone(), StepOptions::new(s.options.clone())))
            .collect();
        let incremental = cfg
            .incremental
            .then(|| IncrementalFilter::new(&dest, cfg.incremental_ext.as_deref()));

        Ok(Self {
            name: name.to_string(),
            src: cfg.src.clone(),
            sources: SourceSet::compile(&cfg.src)?,
            dest,
            steps,
            reload: cfg.reload,
            incremental,
        })
    }
}

/// Immutable name -> task mapping, built once at startup.
#[derive(Debug)]
pub struct TaskTable {
    root: PathBuf,
    build_dir: PathBuf,
    tasks: BTreeMap<String, Arc<Task>>,
}

impl TaskTable {
    pub fn from_config(cfg: &ConfigFile, root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let mut tasks = BTreeMap::new();

        for (name, task_cfg) in &cfg.task {
            let task = Task::from_config(name, task_cfg, &root)?;
            debug!(task = %name, dest = ?task.dest, steps = task.steps.len(), "registered task");
            tasks.insert(name.clone(), Arc::new(task));
        }

        Ok(Self {
            build_dir: root.join(&cfg.paths.build),
            root,
            tasks,
        })
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Task>> {
        self.tasks.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Task>> {
        self.tasks.values()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Project root every relative path was resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute `paths.build`, the directory removed by `clean`.
    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Names of tasks with `reload = true`.
    pub fn reload_tasks(&self) -> impl Iterator<Item = &str> {
        self.tasks
            .values()
            .filter(|t| t.reload)
            .map(|t| t.name.as_str())
    }
}
