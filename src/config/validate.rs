// src/config/validate.rs

use globset::Glob;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, PlanSpec};
use crate::dag::CLEAN_TASK;
use crate::errors::{AssetdagError, Result};
use crate::pipeline::TransformRegistry;

/// Run semantic validation against a loaded configuration.
///
/// This checks:
/// - there is at least one task
/// - task and plan names don't collide and don't shadow `clean`
/// - every task has inputs, a destination and known processors
/// - all globs compile
/// - every name used in a plan or watch binding exists
/// - plans don't reference each other in a cycle
///
/// Processor options are not inspected; they belong to the processors.
pub fn validate_config(cfg: &ConfigFile, registry: &TransformRegistry) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_global_config(cfg)?;
    validate_names(cfg)?;
    validate_tasks(cfg, registry)?;
    validate_plan_references(cfg)?;
    validate_watch_bindings(cfg)?;
    validate_plan_cycles(cfg)?;
    Ok(())
}

/// True if `name` can be referenced from a plan or a watch binding.
pub fn is_known_name(cfg: &ConfigFile, name: &str) -> bool {
    name == CLEAN_TASK || cfg.task.contains_key(name) || cfg.plan.contains_key(name)
}

fn config_error(msg: impl Into<String>) -> AssetdagError {
    AssetdagError::ConfigError(msg.into())
}

fn ensure_has_tasks(cfg: &ConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(config_error(
            "config must contain at least one [task.<name>] section",
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &ConfigFile) -> Result<()> {
    if cfg.paths.build.trim().is_empty() {
        return Err(config_error("[paths].build must not be empty"));
    }
    Ok(())
}

fn validate_names(cfg: &ConfigFile) -> Result<()> {
    if cfg.task.contains_key(CLEAN_TASK) || cfg.plan.contains_key(CLEAN_TASK) {
        return Err(config_error(format!(
            "'{CLEAN_TASK}' is a built-in task and cannot be redefined"
        )));
    }
    for name in cfg.plan.keys() {
        if cfg.task.contains_key(name) {
            return Err(config_error(format!(
                "'{name}' is defined both as a task and as a plan"
            )));
        }
    }
    Ok(())
}

fn validate_tasks(cfg: &ConfigFile, registry: &TransformRegistry) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if task.src.is_empty() {
            return Err(config_error(format!("task '{name}' has an empty `src` list")));
        }
        if task.dest.trim().is_empty() {
            return Err(config_error(format!("task '{name}' has an empty `dest`")));
        }
        for pattern in task.src.iter() {
            let pattern = pattern.strip_prefix('!').unwrap_or(pattern);
            check_glob(pattern, &format!("task '{name}' src"))?;
        }
        for step in task.steps.iter() {
            if !registry.contains(&step.processor) {
                return Err(config_error(format!(
                    "task '{}' uses unknown processor '{}' (known: {})",
                    name,
                    step.processor,
                    registry.names().collect::<Vec<_>>().join(", ")
                )));
            }
        }
    }
    Ok(())
}

fn validate_plan_references(cfg: &ConfigFile) -> Result<()> {
    for (plan_name, spec) in cfg.plan.iter() {
        let mut names = Vec::new();
        collect_names(spec, &mut names);
        for name in names {
            if !is_known_name(cfg, name) {
                return Err(config_error(format!(
                    "plan '{plan_name}' references unknown task or plan '{name}'"
                )));
            }
        }
    }
    Ok(())
}

fn validate_watch_bindings(cfg: &ConfigFile) -> Result<()> {
    for (idx, binding) in cfg.watch.iter().enumerate() {
        if binding.task == CLEAN_TASK {
            return Err(config_error(format!(
                "watch binding #{idx} cannot trigger '{CLEAN_TASK}'"
            )));
        }
        if !is_known_name(cfg, &binding.task) {
            return Err(config_error(format!(
                "watch binding #{idx} references unknown task '{}'",
                binding.task
            )));
        }
        if binding.glob.is_empty() {
            return Err(config_error(format!(
                "watch binding #{idx} for '{}' has no globs",
                binding.task
            )));
        }
        for pattern in binding.glob.iter().chain(binding.exclude.iter()) {
            check_glob(pattern, &format!("watch binding #{idx}"))?;
        }
    }
    Ok(())
}

fn validate_plan_cycles(cfg: &ConfigFile) -> Result<()> {
    // Edge direction: plan -> plan it references. Tasks are leaves and can
    // never close a cycle, so they are left out of the graph.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.plan.keys() {
        graph.add_node(name.as_str());
    }

    for (plan_name, spec) in cfg.plan.iter() {
        let mut names = Vec::new();
        collect_names(spec, &mut names);
        for name in names {
            if name == plan_name {
                return Err(AssetdagError::PlanCycle(format!(
                    "cycle detected: plan '{plan_name}' references itself"
                )));
            }
            if let Some((key, _)) = cfg.plan.get_key_value(name) {
                graph.add_edge(plan_name.as_str(), key.as_str(), ());
            }
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(AssetdagError::PlanCycle(format!(
            "cycle detected in plans involving '{}'",
            cycle.node_id()
        ))),
    }
}

fn check_glob(pattern: &str, owner: &str) -> Result<()> {
    Glob::new(pattern)
        .map(|_| ())
        .map_err(|e| config_error(format!("{owner}: invalid glob '{pattern}': {e}")))
}

/// Every name referenced anywhere inside a plan expression.
pub(crate) fn collect_names<'a>(spec: &'a PlanSpec, out: &mut Vec<&'a str>) {
    match spec {
        PlanSpec::Name(name) => out.push(name.as_str()),
        PlanSpec::Series { series: items } | PlanSpec::Parallel { parallel: items } => {
            for item in items {
                collect_names(item, out);
            }
        }
    }
}
