// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

/// Top-level configuration as read from an `Assetdag.toml` file.
///
/// ```toml
/// [paths]
/// build = "build"
///
/// [task.html]
/// src = ["src/*.html"]
/// dest = "build"
/// reload = true
/// incremental = true
/// steps = [{ use = "htmlmin", options = { collapse_whitespace = true } }]
///
/// [plan]
/// build = { series = ["clean", { parallel = ["html", "style"] }] }
///
/// [[watch]]
/// glob = ["src/*.html"]
/// task = "html"
/// ```
///
/// All sections except `[task.*]` are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    /// Global behaviour config from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// Output locations from `[paths]`.
    #[serde(default)]
    pub paths: PathsSection,

    /// Dev server settings from `[server]`.
    #[serde(default)]
    pub server: ServerSection,

    /// All tasks from `[task.<name>]`.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,

    /// Named plans from `[plan]`, e.g. `build`, `develop`.
    #[serde(default)]
    pub plan: BTreeMap<String, PlanSpec>,

    /// Watch bindings from `[[watch]]`.
    #[serde(default)]
    pub watch: Vec<WatchConfig>,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Quiet period after the last change before a binding fires.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    100
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// `[paths]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsSection {
    /// Output tree removed by `clean` and served by the dev server.
    #[serde(default = "default_build_dir")]
    pub build: String,
}

fn default_build_dir() -> String {
    "build".to_string()
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            build: default_build_dir(),
        }
    }
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory to serve; defaults to `[paths].build`.
    #[serde(default)]
    pub root: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            root: None,
        }
    }
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// Input globs, relative to the project root. Entries starting with `!`
    /// exclude matches.
    pub src: Vec<String>,

    /// Output directory, relative to the project root.
    pub dest: String,

    /// Transform steps applied in order to every matched file.
    #[serde(default)]
    pub steps: Vec<StepConfig>,

    /// Send a live-reload signal after each successful run.
    #[serde(default)]
    pub reload: bool,

    /// Skip inputs whose output is not older than the input.
    #[serde(default)]
    pub incremental: bool,

    /// Extension (e.g. `".css"`) substituted when locating the output file
    /// for the incremental check.
    #[serde(default)]
    pub incremental_ext: Option<String>,
}

/// One `{ use = "...", options = { ... } }` entry of `steps`.
#[derive(Debug, Clone, Deserialize)]
pub struct StepConfig {
    /// Processor name in the transform registry.
    #[serde(rename = "use")]
    pub processor: String,

    /// Processor-specific options, passed through untouched.
    #[serde(default)]
    pub options: toml::Table,
}

/// A plan expression: a task/plan name or a nested combinator.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PlanSpec {
    Name(String),
    Series { series: Vec<PlanSpec> },
    Parallel { parallel: Vec<PlanSpec> },
}

/// `[[watch]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    /// Globs (relative to the project root) that re-trigger `task`.
    pub glob: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,

    /// Task (or plan) to run on change.
    pub task: String,
}
