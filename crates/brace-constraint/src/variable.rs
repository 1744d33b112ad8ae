//! Variables: named points or scalars shared between constraints.

use std::fmt;

use brace_core::{Point, Scheme, Value, VarKind};
use smallvec::SmallVec;

use crate::constraint::{Constraint, ConstraintId};

/// Handle to a variable owned by a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VarId(pub(crate) usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A constraint touching a variable, and the slot the variable occupies in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstraintRef {
    pub constraint: ConstraintId,
    pub slot: usize,
}

/// A named value and the constraints that reference it.
#[derive(Debug, Clone)]
pub struct Variable {
    pub(crate) name: String,
    pub(crate) value: Value,
    /// Schemes this variable can be driven in; the first is its default.
    pub(crate) schemes: SmallVec<[Scheme; 2]>,
    /// Sorted by `order` once all constraints are wired.
    pub(crate) constraints: SmallVec<[ConstraintRef; 4]>,
}

impl Variable {
    pub(crate) fn new(name: String, scheme: Scheme, value: Value) -> Self {
        let mut schemes = SmallVec::new();
        schemes.push(scheme);
        Self {
            name,
            value,
            schemes,
            constraints: SmallVec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The scheme used when this variable is dragged directly.
    pub fn scheme(&self) -> Scheme {
        self.schemes[0]
    }

    /// Every scheme this variable has a resolution plan for.
    pub fn schemes(&self) -> &[Scheme] {
        &self.schemes
    }

    pub fn kind(&self) -> VarKind {
        self.value.kind()
    }

    pub fn get(&self) -> Value {
        self.value
    }

    pub fn point(&self) -> Option<Point> {
        self.value.as_point()
    }

    pub fn scalar(&self) -> Option<f64> {
        self.value.as_scalar()
    }

    /// Constraints referencing this variable, in resolution order.
    pub fn constraints(&self) -> &[ConstraintRef] {
        &self.constraints
    }

    /// Sort this variable's constraints so that the one with the highest
    /// priority for this variable's slot is visited first. Ties keep
    /// declaration order.
    pub(crate) fn order(&mut self, constraints: &[Constraint]) {
        self.constraints.sort_by(|a, b| {
            let pa = constraints[a.constraint.0].priority(a.slot);
            let pb = constraints[b.constraint.0].priority(b.slot);
            pb.cmp(&pa).then(a.constraint.cmp(&b.constraint))
        });
    }
}
