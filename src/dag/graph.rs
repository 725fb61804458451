// src/dag/graph.rs

use crate::dag::plan::Plan;
use crate::engine::TaskName;

/// Index of a step inside its [`PlanGraph`].
pub type StepId = usize;

/// One occurrence of a task inside a lowered plan.
///
/// The same task listed twice in a plan yields two steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanStep {
    pub id: StepId,
    pub task: TaskName,
    /// Steps that must finish successfully before this one starts.
    pub deps: Vec<StepId>,
    /// Steps that list this one in their `deps`.
    pub dependents: Vec<StepId>,
}

/// Dependency graph produced by lowering a [`Plan`].
///
/// - `series(a, b)`: every entry step of `b` depends on every exit step of `a`.
/// - `parallel(a, b)`: `a` and `b` share the enclosing predecessors; the exits
///   of the combinator are the union of both.
///
/// Steps are created in an order where dependencies always have a lower id,
/// so the graph is acyclic by construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanGraph {
    steps: Vec<PlanStep>,
}

impl PlanGraph {
    pub fn lower(plan: &Plan) -> Self {
        let mut steps = Vec::new();
        lower_into(plan, Vec::new(), &mut steps);

        // Second pass: populate dependents from deps.
        for id in 0..steps.len() {
            let deps = steps[id].deps.clone();
            for dep in deps {
                steps[dep].dependents.push(id);
            }
        }

        Self { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn step(&self, id: StepId) -> Option<&PlanStep> {
        self.steps.get(id)
    }

    pub fn dependencies_of(&self, id: StepId) -> &[StepId] {
        self.steps.get(id).map(|s| s.deps.as_slice()).unwrap_or(&[])
    }

    pub fn dependents_of(&self, id: StepId) -> &[StepId] {
        self.steps
            .get(id)
            .map(|s| s.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// Steps with no dependencies.
    pub fn roots(&self) -> impl Iterator<Item = &PlanStep> {
        self.steps.iter().filter(|s| s.deps.is_empty())
    }
}

/// Lower `plan` after `preds`, returning its exit steps.
fn lower_into(plan: &Plan, preds: Vec<StepId>, steps: &mut Vec<PlanStep>) -> Vec<StepId> {
    match plan {
        Plan::Task(name) => {
            let id = steps.len();
            steps.push(PlanStep {
                id,
                task: name.clone(),
                deps: preds,
                dependents: Vec::new(),
            });
            vec![id]
        }
        Plan::Series(children) => children
            .iter()
            .fold(preds, |current, child| lower_into(child, current, steps)),
        Plan::Parallel(children) => {
            if children.is_empty() {
                return preds;
            }
            let mut exits = Vec::new();
            for child in children {
                for exit in lower_into(child, preds.clone(), steps) {
                    if !exits.contains(&exit) {
                        exits.push(exit);
                    }
                }
            }
            exits
        }
    }
}
