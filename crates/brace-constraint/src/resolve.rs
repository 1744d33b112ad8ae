//! Build-time resolution planning.
//!
//! For one source variable and one scheme, [`resolve`] walks the graph
//! breadth-first from the source. Each visited variable offers its
//! constraints in priority order; a constraint that names a different,
//! not-yet-solved variable for this trigger becomes a plan step. The result
//! is a forward-only list of assignments, so a drag never needs more than
//! one pass over it.

use std::collections::VecDeque;

use brace_core::{Priority, Scheme, WiringError};
use tracing::{debug, trace};

use crate::constraint::{Constraint, ConstraintId};
use crate::variable::{ConstraintRef, VarId, Variable};

/// One assignment in a resolution plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlanStep {
    pub constraint: ConstraintId,
    /// Slot of the solved variable within the constraint.
    pub target: usize,
    /// The solved variable.
    pub variable: VarId,
}

/// The validated order in which constraints are solved after `source`
/// changes under `scheme`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResolutionPlan {
    source: VarId,
    scheme: Scheme,
    steps: Vec<PlanStep>,
}

impl ResolutionPlan {
    pub fn source(&self) -> VarId {
        self.source
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Whether some step solves `var`.
    pub fn solves(&self, var: VarId) -> bool {
        self.steps.iter().any(|s| s.variable == var)
    }

    /// Position of the step driven by `constraint`, if it takes part.
    pub fn position(&self, constraint: ConstraintId) -> Option<usize> {
        self.steps.iter().position(|s| s.constraint == constraint)
    }
}

/// The slot `cref`'s constraint would solve, unless it already fired or is
/// passive for this trigger.
fn claim(
    cref: &ConstraintRef,
    scheme: Scheme,
    constraints: &[Constraint],
    fired: &[bool],
) -> Option<usize> {
    if fired[cref.constraint.0] {
        return None;
    }
    let target = constraints[cref.constraint.0].choice(scheme, cref.slot);
    (target != cref.slot).then_some(target)
}

/// Build and validate the plan for `source` under `scheme`.
///
/// Variables must already be ordered. Fails when two constraints of equal
/// priority claim the same variable anywhere in the plan, or when a step
/// reads a variable that a later step writes.
pub(crate) fn resolve(
    source: VarId,
    scheme: Scheme,
    variables: &[Variable],
    constraints: &[Constraint],
) -> Result<ResolutionPlan, WiringError> {
    let mut determined = vec![false; variables.len()];
    // Winning claim on each solved variable: its priority and constraint.
    let mut winners: Vec<Option<(Priority, ConstraintId)>> = vec![None; variables.len()];
    let mut fired = vec![false; constraints.len()];
    let mut queue = VecDeque::new();
    let mut steps = Vec::new();

    determined[source.0] = true;
    queue.push_back(source);

    while let Some(var) = queue.pop_front() {
        for cref in variables[var.0].constraints() {
            let Some(target) = claim(cref, scheme, constraints, &fired) else {
                continue;
            };
            let constraint = &constraints[cref.constraint.0];
            let solved = constraint.vars[target];
            let priority = constraint.priority(cref.slot);

            if determined[solved.0] {
                // Equal priorities on one variable have no tie-break, even
                // when the claims come from different triggers.
                if let Some((won, winner)) = winners[solved.0] {
                    if won == priority {
                        return Err(WiringError::AmbiguousPriority {
                            first: constraints[winner.0].name.clone(),
                            second: constraint.name.clone(),
                            variable: variables[solved.0].name.clone(),
                            priority,
                            source_var: variables[source.0].name.clone(),
                            scheme,
                        });
                    }
                }
                trace!(
                    constraint = %constraint.name,
                    variable = %variables[solved.0].name,
                    "shadowed by an earlier claim"
                );
                continue;
            }

            determined[solved.0] = true;
            winners[solved.0] = Some((priority, cref.constraint));
            fired[cref.constraint.0] = true;
            steps.push(PlanStep {
                constraint: cref.constraint,
                target,
                variable: solved,
            });
            queue.push_back(solved);
        }
    }

    check_forward_only(source, scheme, &steps, variables, constraints)?;

    debug!(
        source = %variables[source.0].name,
        %scheme,
        steps = steps.len(),
        "resolution plan built"
    );
    Ok(ResolutionPlan {
        source,
        scheme,
        steps,
    })
}

/// Every operand a step reads must be settled before the step runs.
fn check_forward_only(
    source: VarId,
    scheme: Scheme,
    steps: &[PlanStep],
    variables: &[Variable],
    constraints: &[Constraint],
) -> Result<(), WiringError> {
    let mut written = vec![None; variables.len()];
    for (k, step) in steps.iter().enumerate() {
        written[step.variable.0] = Some(k);
    }

    for (k, step) in steps.iter().enumerate() {
        let constraint = &constraints[step.constraint.0];
        for (slot, var) in constraint.vars.iter().enumerate() {
            if slot == step.target {
                continue;
            }
            if matches!(written[var.0], Some(later) if later > k) {
                return Err(WiringError::Cycle {
                    source_var: variables[source.0].name.clone(),
                    scheme,
                    constraint: constraint.name.clone(),
                    variable: variables[var.0].name.clone(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{ConstraintGraphBuilder, ConstraintKind, Priority, Scheme, WiringError};
    use glam::DVec3;

    /// Two distances from A both able to solve D.
    fn twin_distances(first: [Priority; 3]) -> Result<crate::ConstraintGraph, WiringError> {
        let mut b = ConstraintGraphBuilder::new(1);
        let a = b.point("A", Scheme::Scheme1, DVec3::ZERO);
        let p = b.point("B", Scheme::Scheme1, DVec3::X);
        let c = b.point("C", Scheme::Scheme1, DVec3::Y);
        let d = b.scalar("D", Scheme::Scheme1, 1.0);
        b.constraint("DistAB", ConstraintKind::Distance, &[a, p, d])
            .var_choices(Scheme::Scheme1, [2, 2, 1]);
        b.constraint("DistAC", ConstraintKind::Distance, &[a, c, d])
            .var_choices(Scheme::Scheme1, [2, 2, 1])
            .priorities(first);
        b.build()
    }

    #[test]
    fn test_equal_priority_claims_are_ambiguous() {
        let err = twin_distances([Priority::Default; 3]).unwrap_err();
        assert_eq!(
            err,
            WiringError::AmbiguousPriority {
                first: "DistAB".into(),
                second: "DistAC".into(),
                variable: "D".into(),
                priority: Priority::Default,
                source_var: "A".into(),
                scheme: Scheme::Scheme1,
            }
        );
    }

    #[test]
    fn test_higher_priority_shadows_rival() {
        let g = twin_distances([Priority::High, Priority::Default, Priority::Default]).unwrap();
        let a = g.find("A").unwrap();
        let d = g.find("D").unwrap();
        let ac = g.find_constraint("DistAC").unwrap();
        let ab = g.find_constraint("DistAB").unwrap();

        let plan = g.plan(a, Scheme::Scheme1).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.steps()[0].constraint, ac);
        assert_eq!(plan.steps()[0].variable, d);
        // D then pulls B back to the new distance.
        assert_eq!(plan.steps()[1].constraint, ab);
        assert_eq!(plan.steps()[1].variable, g.find("B").unwrap());
    }

    #[test]
    fn test_step_reading_a_later_write_is_a_cycle() {
        let mut b = ConstraintGraphBuilder::new(1);
        let s = b.scalar("S", Scheme::Scheme1, 1.0);
        let p = b.scalar("P", Scheme::Scheme1, 1.0);
        let q = b.scalar("Q", Scheme::Scheme1, 1.0);
        let u = b.scalar("U", Scheme::Scheme1, 1.0);
        // S changes -> P = S / Q, then P changes -> Q = P / U.
        b.constraint("First", ConstraintKind::Ratio, &[s, p, q])
            .var_choices(Scheme::Scheme1, [1, 1, 2]);
        b.constraint("Second", ConstraintKind::Ratio, &[p, q, u])
            .var_choices(Scheme::Scheme1, [1, 1, 2]);

        assert_eq!(
            b.build().unwrap_err(),
            WiringError::Cycle {
                source_var: "S".into(),
                scheme: Scheme::Scheme1,
                constraint: "First".into(),
                variable: "Q".into(),
            }
        );
    }

    /// A drives X and Y; both then solve Z, the claim from Y at `from_y`.
    fn converging(from_y: Priority) -> Result<crate::ConstraintGraph, WiringError> {
        let mut b = ConstraintGraphBuilder::new(1);
        let a = b.scalar("A", Scheme::Scheme1, 1.0);
        let x = b.scalar("X", Scheme::Scheme1, 1.0);
        let y = b.scalar("Y", Scheme::Scheme1, 1.0);
        let z = b.scalar("Z", Scheme::Scheme1, 1.0);
        b.constraint("AX", ConstraintKind::Pythagorean, &[a, x])
            .var_choices(Scheme::Scheme1, [1, 1]);
        b.constraint("AY", ConstraintKind::Pythagorean, &[a, y])
            .var_choices(Scheme::Scheme1, [1, 1]);
        b.constraint("XZ", ConstraintKind::Pythagorean, &[x, z])
            .var_choices(Scheme::Scheme1, [1, 1]);
        b.constraint("YZ", ConstraintKind::Pythagorean, &[y, z])
            .var_choices(Scheme::Scheme1, [1, 1])
            .priorities([from_y, Priority::Default]);
        b.build()
    }

    #[test]
    fn test_equal_claims_from_different_triggers_are_ambiguous() {
        let err = converging(Priority::Default).unwrap_err();
        assert_eq!(
            err,
            WiringError::AmbiguousPriority {
                first: "XZ".into(),
                second: "YZ".into(),
                variable: "Z".into(),
                priority: Priority::Default,
                source_var: "A".into(),
                scheme: Scheme::Scheme1,
            }
        );
    }

    #[test]
    fn test_lower_claim_from_later_trigger_is_shadowed() {
        let g = converging(Priority::LowMedium).unwrap();
        let a = g.find("A").unwrap();
        let plan = g.plan(a, Scheme::Scheme1).unwrap();
        let names: Vec<_> = plan
            .steps()
            .iter()
            .map(|s| g.constraint(s.constraint).unwrap().name())
            .collect();
        assert_eq!(names, vec!["AX", "AY", "XZ"]);
    }

    #[test]
    fn test_plan_is_breadth_first() {
        let mut b = ConstraintGraphBuilder::new(1);
        let a = b.scalar("A", Scheme::Scheme1, 1.0);
        let x = b.scalar("X", Scheme::Scheme1, 1.0);
        let y = b.scalar("Y", Scheme::Scheme1, 1.0);
        let z = b.scalar("Z", Scheme::Scheme1, 1.0);
        b.constraint("AX", ConstraintKind::Pythagorean, &[a, x])
            .var_choices(Scheme::Scheme1, [1, 1]);
        b.constraint("XZ", ConstraintKind::Pythagorean, &[x, z])
            .var_choices(Scheme::Scheme1, [1, 1]);
        b.constraint("AY", ConstraintKind::Pythagorean, &[a, y])
            .var_choices(Scheme::Scheme1, [1, 1]);
        let g = b.build().unwrap();

        let plan = g.plan(a, Scheme::Scheme1).unwrap();
        let solved: Vec<_> = plan.steps().iter().map(|s| s.variable).collect();
        assert_eq!(solved, vec![x, y, z]);
        assert!(plan.solves(z));
        assert!(!plan.solves(a));
        assert_eq!(plan.position(g.find_constraint("XZ").unwrap()), Some(2));
    }
}
