//! Constraints: named relations over a fixed set of variables.

use std::fmt;

use brace_core::{Epsilon, Priority, Scheme, Value};
use smallvec::SmallVec;

use crate::kinds::ConstraintKind;
use crate::variable::VarId;

/// Handle to a constraint owned by a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConstraintId(pub(crate) usize);

impl ConstraintId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ConstraintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// A relation over 2-4 variables, with per-scheme choices of which variable
/// is solved when another one changes.
#[derive(Debug, Clone)]
pub struct Constraint {
    pub(crate) name: String,
    pub(crate) kind: ConstraintKind,
    pub(crate) vars: SmallVec<[VarId; 4]>,
    /// `choices[scheme][trigger]` is the slot solved when `trigger` changes.
    pub(crate) choices: Vec<SmallVec<[usize; 4]>>,
    pub(crate) priorities: SmallVec<[Priority; 4]>,
}

impl Constraint {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ConstraintKind {
        self.kind
    }

    pub fn vars(&self) -> &[VarId] {
        &self.vars
    }

    pub fn arity(&self) -> usize {
        self.vars.len()
    }

    pub fn priorities(&self) -> &[Priority] {
        &self.priorities
    }

    /// Priority of this constraint for the variable in `slot`.
    pub fn priority(&self, slot: usize) -> Priority {
        self.priorities[slot]
    }

    /// The slot solved when the variable in `trigger` changes under `scheme`.
    /// Returns `trigger` itself when the constraint is passive for it.
    pub fn choice(&self, scheme: Scheme, trigger: usize) -> usize {
        self.choices[scheme.index()][trigger]
    }

    /// Whether the constraint writes nothing when `trigger` changes.
    pub fn is_passive(&self, scheme: Scheme, trigger: usize) -> bool {
        self.choice(scheme, trigger) == trigger
    }

    /// Slot of `var` in this constraint.
    pub fn slot_of(&self, var: VarId) -> Option<usize> {
        self.vars.iter().position(|v| *v == var)
    }

    pub(crate) fn solve(&self, target: usize, values: &[Value], eps: Epsilon) -> Option<Value> {
        self.kind.solve(target, values, eps)
    }

    pub(crate) fn residual(&self, values: &[Value]) -> f64 {
        self.kind.residual(values)
    }
}
