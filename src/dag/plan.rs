// src/dag/plan.rs

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::config::model::{ConfigFile, PlanSpec};
use crate::dag::CLEAN_TASK;
use crate::engine::TaskName;
use crate::errors::{AssetdagError, Result};
use crate::types::BuildMode;

/// A resolved plan: plan references are inlined, leaves are task names
/// (including the built-in `clean`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    Task(TaskName),
    Series(Vec<Plan>),
    Parallel(Vec<Plan>),
}

impl Plan {
    pub fn task(name: impl Into<TaskName>) -> Self {
        Plan::Task(name.into())
    }

    /// `parallel(names...)`.
    pub fn parallel_tasks<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        Plan::Parallel(names.into_iter().map(|n| Plan::Task(n.into())).collect())
    }

    /// Whether the first thing this plan runs is `clean`.
    pub fn starts_with_clean(&self) -> bool {
        match self {
            Plan::Task(name) => name == CLEAN_TASK,
            Plan::Series(children) => children.first().is_some_and(Plan::starts_with_clean),
            Plan::Parallel(_) => false,
        }
    }

    /// `series(clean, self)` unless the plan already begins with `clean`.
    pub fn with_leading_clean(self) -> Self {
        if self.starts_with_clean() {
            self
        } else {
            Plan::Series(vec![Plan::task(CLEAN_TASK), self])
        }
    }

    /// Leaf task names in declaration order. A task listed twice appears twice.
    pub fn task_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_names(&mut out);
        out
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Plan::Task(name) => out.push(name),
            Plan::Series(children) | Plan::Parallel(children) => {
                for child in children {
                    child.collect_names(out);
                }
            }
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (label, children) = match self {
            Plan::Task(name) => return f.write_str(name),
            Plan::Series(children) => ("series", children),
            Plan::Parallel(children) => ("parallel", children),
        };
        write!(f, "{label}(")?;
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{child}")?;
        }
        f.write_str(")")
    }
}

/// Every name a plan expression may refer to: tasks, named plans and `clean`.
#[derive(Debug, Clone, Default)]
pub struct PlanCatalog {
    tasks: BTreeSet<TaskName>,
    plans: BTreeMap<String, PlanSpec>,
}

impl PlanCatalog {
    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self {
            tasks: cfg.task.keys().cloned().collect(),
            plans: cfg.plan.clone(),
        }
    }

    pub fn is_known(&self, name: &str) -> bool {
        name == CLEAN_TASK || self.tasks.contains(name) || self.plans.contains_key(name)
    }

    /// Resolve a task or plan name.
    pub fn resolve_name(&self, name: &str) -> Result<Plan> {
        self.resolve_name_inner(name, &mut Vec::new())
    }

    /// `parallel(names...)` with each name resolved.
    pub fn parallel_of<S: AsRef<str>>(&self, names: &[S]) -> Result<Plan> {
        names
            .iter()
            .map(|n| self.resolve_name(n.as_ref()))
            .collect::<Result<Vec<_>>>()
            .map(Plan::Parallel)
    }

    /// The top-level plan for `build` / `develop`, always starting with `clean`.
    ///
    /// Without a configured plan of that name, every task runs in parallel.
    pub fn for_mode(&self, mode: BuildMode) -> Result<Plan> {
        let plan = if self.plans.contains_key(mode.plan_name()) {
            self.resolve_name(mode.plan_name())?
        } else {
            Plan::parallel_tasks(self.tasks.iter().cloned())
        };
        Ok(plan.with_leading_clean())
    }

    fn resolve_name_inner(&self, name: &str, stack: &mut Vec<String>) -> Result<Plan> {
        if name == CLEAN_TASK || self.tasks.contains(name) {
            return Ok(Plan::task(name));
        }

        let Some(spec) = self.plans.get(name) else {
            return Err(AssetdagError::TaskNotFound(name.to_string()));
        };

        if stack.iter().any(|s| s == name) {
            stack.push(name.to_string());
            return Err(AssetdagError::PlanCycle(stack.join(" -> ")));
        }

        stack.push(name.to_string());
        let plan = self.resolve_spec_inner(spec, stack)?;
        stack.pop();
        Ok(plan)
    }

    fn resolve_spec_inner(&self, spec: &PlanSpec, stack: &mut Vec<String>) -> Result<Plan> {
        match spec {
            PlanSpec::Name(name) => self.resolve_name_inner(name, stack),
            PlanSpec::Series { series } => series
                .iter()
                .map(|s| self.resolve_spec_inner(s, stack))
                .collect::<Result<Vec<_>>>()
                .map(Plan::Series),
            PlanSpec::Parallel { parallel } => parallel
                .iter()
                .map(|s| self.resolve_spec_inner(s, stack))
                .collect::<Result<Vec<_>>>()
                .map(Plan::Parallel),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{parse_str, DEFAULT_CONFIG};

    const CFG: &str = r#"
[task.a]
src = ["a/*"]
dest = "out"

[task.b]
src = ["b/*"]
dest = "out"

[task.c]
src = ["c/*"]
dest = "out"

[plan]
inner = { parallel = ["b", "c"] }
build = { series = ["a", "inner"] }
"#;

    fn catalog(toml: &str) -> PlanCatalog {
        PlanCatalog::from_config(&parse_str(toml).unwrap())
    }

    #[test]
    fn named_plans_are_inlined() {
        let plan = catalog(CFG).resolve_name("build").unwrap();
        assert_eq!(plan.to_string(), "series(a, parallel(b, c))");
    }

    #[test]
    fn build_plan_gets_leading_clean() {
        let plan = catalog(CFG).for_mode(BuildMode::Build).unwrap();
        assert_eq!(plan.to_string(), "series(clean, series(a, parallel(b, c)))");
    }

    #[test]
    fn plans_already_starting_with_clean_are_kept() {
        let cfg = parse_str(DEFAULT_CONFIG).unwrap();
        let plan = PlanCatalog::from_config(&cfg).for_mode(BuildMode::Build).unwrap();
        assert_eq!(
            plan.to_string(),
            "series(clean, parallel(html, style_build, js, image_build, svg_build, fonts))"
        );
    }

    #[test]
    fn missing_mode_plan_defaults_to_all_tasks_in_parallel() {
        let plan = catalog(CFG).for_mode(BuildMode::Develop).unwrap();
        assert_eq!(plan.to_string(), "series(clean, parallel(a, b, c))");
    }

    #[test]
    fn unknown_names_and_cycles_are_errors() {
        let cat = catalog(CFG);
        assert!(matches!(
            cat.resolve_name("nope"),
            Err(AssetdagError::TaskNotFound(name)) if name == "nope"
        ));

        let cyclic = catalog(
            "[task.a]\nsrc = [\"a\"]\ndest = \"o\"\n[plan]\nx = { series = [\"a\", \"y\"] }\ny = { parallel = [\"x\"] }\n",
        );
        assert!(matches!(
            cyclic.resolve_name("x"),
            Err(AssetdagError::PlanCycle(path)) if path == "x -> y -> x"
        ));
    }

    #[test]
    fn parallel_of_resolves_each_name() {
        let plan = catalog(CFG).parallel_of(&["a", "inner"]).unwrap();
        assert_eq!(plan.to_string(), "parallel(a, parallel(b, c))");
        assert_eq!(plan.task_names(), vec!["a", "b", "c"]);
    }
}
