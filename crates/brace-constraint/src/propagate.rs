//! Runtime propagation of a change along a resolution plan.

use brace_core::{Epsilon, Scheme, Value};
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use crate::constraint::{Constraint, ConstraintId};
use crate::resolve::ResolutionPlan;
use crate::variable::{VarId, Variable};

/// A constraint left unsatisfied after propagation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Violation {
    pub constraint: ConstraintId,
    pub residual: f64,
}

/// What happened while propagating one change.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PropagationReport {
    pub source: VarId,
    pub scheme: Scheme,
    /// Constraints that were solved, in plan order.
    pub evaluated: Vec<ConstraintId>,
    /// Variables whose value changed, the source first.
    pub changed: Vec<VarId>,
    /// Constraints whose solve had no answer; their targets kept their value.
    pub degenerate: Vec<ConstraintId>,
    /// Empty unless residual checking is enabled.
    pub violations: Vec<Violation>,
}

impl PropagationReport {
    pub(crate) fn new(source: VarId, scheme: Scheme) -> Self {
        Self {
            source,
            scheme,
            evaluated: Vec::new(),
            changed: Vec::new(),
            degenerate: Vec::new(),
            violations: Vec::new(),
        }
    }

    /// No degenerate solves and no violated constraints.
    pub fn is_clean(&self) -> bool {
        self.degenerate.is_empty() && self.violations.is_empty()
    }
}

/// Walk `plan` once, recomputing every step that depends on a changed value.
///
/// The source is taken as already updated. A step runs only when one of the
/// variables it reads is dirty; its target becomes dirty when its value moves.
pub(crate) fn propagate(
    plan: &ResolutionPlan,
    variables: &mut [Variable],
    constraints: &[Constraint],
    eps: Epsilon,
) -> PropagationReport {
    let mut report = PropagationReport::new(plan.source(), plan.scheme());
    let mut dirty = vec![false; variables.len()];
    dirty[plan.source().0] = true;
    report.changed.push(plan.source());

    for step in plan.steps() {
        let constraint = &constraints[step.constraint.0];
        let stale = constraint
            .vars
            .iter()
            .enumerate()
            .any(|(slot, v)| slot != step.target && dirty[v.0]);
        if !stale {
            continue;
        }

        let values: SmallVec<[Value; 4]> =
            constraint.vars.iter().map(|v| variables[v.0].value).collect();
        report.evaluated.push(step.constraint);

        let Some(value) = constraint.solve(step.target, &values, eps) else {
            debug!(
                constraint = %constraint.name,
                variable = %variables[step.variable.0].name,
                "degenerate solve, keeping previous value"
            );
            report.degenerate.push(step.constraint);
            continue;
        };

        let target = &mut variables[step.variable.0];
        if target.value != value {
            trace!(constraint = %constraint.name, variable = %target.name, %value, "solved");
            target.value = value;
            dirty[step.variable.0] = true;
            report.changed.push(step.variable);
        }
    }

    report
}

/// Residual of every constraint that is not below `eps`. NaN counts as a
/// violation.
pub(crate) fn check_residuals(
    variables: &[Variable],
    constraints: &[Constraint],
    eps: Epsilon,
) -> Vec<Violation> {
    let mut violations = Vec::new();
    for (index, constraint) in constraints.iter().enumerate() {
        let values: SmallVec<[Value; 4]> =
            constraint.vars.iter().map(|v| variables[v.0].value).collect();
        let residual = constraint.residual(&values);
        // A residual of exactly epsilon is already a violation.
        if !eps.is_zero(residual) {
            warn!(constraint = %constraint.name, residual, epsilon = eps.value(), "constraint violated");
            violations.push(Violation {
                constraint: ConstraintId(index),
                residual,
            });
        }
    }
    violations
}
