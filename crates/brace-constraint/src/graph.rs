//! The built constraint graph and its runtime API.

use brace_core::{Epsilon, GraphError, Point, Scheme, Value, Vector};
use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::debug;

use crate::constraint::{Constraint, ConstraintId};
use crate::options::SolverOptions;
use crate::propagate::{check_residuals, propagate, PropagationReport, Violation};
use crate::resolve::ResolutionPlan;
use crate::variable::{VarId, Variable};

/// A validated set of variables and constraints with precomputed plans.
///
/// Handles passed to a graph must come from the builder that produced it;
/// a foreign [`VarId`] or [`ConstraintId`] panics on lookup.
#[derive(Debug, Clone)]
pub struct ConstraintGraph {
    pub(crate) variables: Vec<Variable>,
    pub(crate) constraints: Vec<Constraint>,
    /// Aligned with each variable's `schemes`.
    pub(crate) plans: Vec<SmallVec<[ResolutionPlan; 1]>>,
    pub(crate) names: IndexMap<String, VarId>,
    pub(crate) constraint_names: IndexMap<String, ConstraintId>,
    pub(crate) schemes: usize,
    pub(crate) epsilon: Epsilon,
    pub(crate) scale: f64,
    pub(crate) options: SolverOptions,
}

impl ConstraintGraph {
    // ------------------------------------------------------------------
    // Driving
    // ------------------------------------------------------------------

    /// Offset `var` by `delta` and propagate under its default scheme.
    ///
    /// Scalars move by `delta.x`.
    pub fn set_delta(&mut self, var: VarId, delta: Vector) -> PropagationReport {
        let value = self.variables[var.0].value.offset(delta);
        self.variables[var.0].value = value;
        self.run(var, 0)
    }

    /// Offset `var` by `delta` and propagate under `scheme`.
    pub fn set_delta_in(
        &mut self,
        var: VarId,
        scheme: Scheme,
        delta: Vector,
    ) -> Result<PropagationReport, GraphError> {
        let plan = self.plan_index(var, scheme)?;
        let value = self.variables[var.0].value.offset(delta);
        self.variables[var.0].value = value;
        Ok(self.run(var, plan))
    }

    /// Assign `value` to `var` and propagate under its default scheme.
    pub fn set(&mut self, var: VarId, value: impl Into<Value>) -> Result<PropagationReport, GraphError> {
        let scheme = self.variables[var.0].scheme();
        self.set_in(var, scheme, value)
    }

    /// Assign `value` to `var` and propagate under `scheme`.
    pub fn set_in(
        &mut self,
        var: VarId,
        scheme: Scheme,
        value: impl Into<Value>,
    ) -> Result<PropagationReport, GraphError> {
        let value = value.into();
        let variable = &self.variables[var.0];
        if value.kind() != variable.kind() {
            return Err(GraphError::KindMismatch {
                variable: variable.name.clone(),
                expected: variable.kind(),
                found: value.kind(),
            });
        }
        let plan = self.plan_index(var, scheme)?;
        self.variables[var.0].value = value;
        Ok(self.run(var, plan))
    }

    /// Translate the point variables in `vars` without resolving anything.
    pub fn move_delta(&mut self, vars: &[VarId], delta: Vector) {
        for var in vars {
            let variable = &mut self.variables[var.0];
            variable.value = variable.value.translated(delta);
        }
    }

    /// Translate every point variable of the graph.
    pub fn translate(&mut self, delta: Vector) {
        for variable in &mut self.variables {
            variable.value = variable.value.translated(delta);
        }
    }

    fn plan_index(&self, var: VarId, scheme: Scheme) -> Result<usize, GraphError> {
        let variable = &self.variables[var.0];
        variable
            .schemes
            .iter()
            .position(|s| *s == scheme)
            .ok_or_else(|| GraphError::UndrivenScheme {
                variable: variable.name.clone(),
                scheme,
            })
    }

    fn run(&mut self, var: VarId, plan: usize) -> PropagationReport {
        let plan = &self.plans[var.0][plan];
        let mut report = propagate(plan, &mut self.variables, &self.constraints, self.epsilon);
        if self.options.check_residuals {
            report.violations = check_residuals(&self.variables, &self.constraints, self.epsilon);
        }
        debug!(
            source = %self.variables[var.0].name,
            scheme = %report.scheme,
            evaluated = report.evaluated.len(),
            changed = report.changed.len(),
            "propagated"
        );
        report
    }

    // ------------------------------------------------------------------
    // Values
    // ------------------------------------------------------------------

    pub fn get(&self, var: VarId) -> Option<Value> {
        self.variables.get(var.0).map(|v| v.value)
    }

    pub fn point(&self, var: VarId) -> Option<Point> {
        self.get(var).and_then(|v| v.as_point())
    }

    pub fn scalar(&self, var: VarId) -> Option<f64> {
        self.get(var).and_then(|v| v.as_scalar())
    }

    // ------------------------------------------------------------------
    // Consistency
    // ------------------------------------------------------------------

    /// The plan used when `var` is driven under `scheme`.
    pub fn plan(&self, var: VarId, scheme: Scheme) -> Option<&ResolutionPlan> {
        let index = self.plan_index(var, scheme).ok()?;
        self.plans.get(var.0)?.get(index)
    }

    /// How far `constraint` currently is from being satisfied.
    pub fn residual(&self, constraint: ConstraintId) -> f64 {
        let constraint = &self.constraints[constraint.0];
        let values: SmallVec<[Value; 4]> = constraint
            .vars
            .iter()
            .map(|v| self.variables[v.0].value)
            .collect();
        constraint.residual(&values)
    }

    /// Every constraint whose residual exceeds epsilon.
    pub fn violations(&self) -> Vec<Violation> {
        check_residuals(&self.variables, &self.constraints, self.epsilon)
    }

    pub fn max_residual(&self) -> f64 {
        (0..self.constraints.len())
            .map(|i| self.residual(ConstraintId(i)))
            .fold(0.0, f64::max)
    }

    pub fn is_consistent(&self) -> bool {
        self.violations().is_empty()
    }

    // ------------------------------------------------------------------
    // Tolerance
    // ------------------------------------------------------------------

    pub fn epsilon(&self) -> Epsilon {
        self.epsilon
    }

    /// Override epsilon directly, independent of the scale.
    pub fn set_epsilon(&mut self, value: f64) -> Result<(), GraphError> {
        self.epsilon = Epsilon::new(value).ok_or(GraphError::InvalidEpsilon { value })?;
        Ok(())
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Change the widget scale; epsilon follows it.
    pub fn set_scale(&mut self, scale: f64) -> Result<(), GraphError> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(GraphError::InvalidScale { scale });
        }
        self.epsilon = self
            .options
            .epsilon_for(scale)
            .ok_or(GraphError::InvalidScale { scale })?;
        self.scale = scale;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    pub fn find(&self, name: &str) -> Option<VarId> {
        self.names.get(name).copied()
    }

    pub fn find_constraint(&self, name: &str) -> Option<ConstraintId> {
        self.constraint_names.get(name).copied()
    }

    pub fn variable(&self, var: VarId) -> Option<&Variable> {
        self.variables.get(var.0)
    }

    pub fn constraint(&self, constraint: ConstraintId) -> Option<&Constraint> {
        self.constraints.get(constraint.0)
    }

    pub fn variables(&self) -> impl Iterator<Item = (VarId, &Variable)> {
        self.variables.iter().enumerate().map(|(i, v)| (VarId(i), v))
    }

    pub fn constraints(&self) -> impl Iterator<Item = (ConstraintId, &Constraint)> {
        self.constraints
            .iter()
            .enumerate()
            .map(|(i, c)| (ConstraintId(i), c))
    }

    pub fn num_schemes(&self) -> usize {
        self.schemes
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }
}
