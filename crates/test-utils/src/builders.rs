use std::collections::BTreeMap;

use assetdag::config::{
    ConfigFile, ConfigSection, PathsSection, PlanSpec, ServerSection, StepConfig, TaskConfig,
    validate_config,
};
use assetdag::pipeline::TransformRegistry;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: ConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: ConfigFile {
                config: ConfigSection::default(),
                paths: PathsSection::default(),
                server: ServerSection::default(),
                task: BTreeMap::new(),
                plan: BTreeMap::new(),
                watch: Vec::new(),
            },
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn with_plan(mut self, name: &str, plan: PlanSpec) -> Self {
        self.config.plan.insert(name.to_string(), plan);
        self
    }

    pub fn build(self) -> ConfigFile {
        validate_config(&self.config, &TransformRegistry::builtin())
            .expect("Failed to build valid config from builder");
        self.config
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(src: &str, dest: &str) -> Self {
        Self {
            task: TaskConfig {
                src: vec![src.to_string()],
                dest: dest.to_string(),
                steps: Vec::new(),
                reload: false,
                incremental: false,
                incremental_ext: None,
            },
        }
    }

    pub fn step(self, processor: &str) -> Self {
        self.step_with(processor, "")
    }

    /// `options` is an inline TOML table body, e.g. `"suffix = \".min\""`.
    pub fn step_with(mut self, processor: &str, options: &str) -> Self {
        let options: toml::Table = toml::from_str(options).expect("step options must be TOML");
        self.task.steps.push(StepConfig {
            processor: processor.to_string(),
            options,
        });
        self
    }

    pub fn incremental(mut self, ext: Option<&str>) -> Self {
        self.task.incremental = true;
        self.task.incremental_ext = ext.map(str::to_string);
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}

/// `series(...)` of plain names.
pub fn series(names: &[&str]) -> PlanSpec {
    PlanSpec::Series {
        series: names.iter().map(|n| PlanSpec::Name(n.to_string())).collect(),
    }
}

