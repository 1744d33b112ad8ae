//! Priority-ordered constraint resolution for interactive widgets.
//!
//! A widget wires its points and scalars into a [`ConstraintGraph`] through a
//! [`ConstraintGraphBuilder`]. Each constraint states, per scheme, which of
//! its variables is recomputed when another one changes, and each variable
//! orders its constraints by priority. Building the graph turns this into a
//! fixed [`ResolutionPlan`] per drivable variable, so a drag is a single
//! forward pass with no iteration.
//!
//! Plans are checked when the graph is built: two constraints of equal
//! priority solving the same variable, or a step reading a variable that a
//! later step writes, fail the build.

pub mod builder;
pub mod constraint;
pub mod graph;
pub mod kinds;
pub mod options;
pub mod propagate;
pub mod resolve;
pub mod variable;

pub use builder::{ConstraintEntry, ConstraintGraphBuilder};
pub use constraint::{Constraint, ConstraintId};
pub use graph::ConstraintGraph;
pub use kinds::ConstraintKind;
pub use options::SolverOptions;
pub use propagate::{PropagationReport, Violation};
pub use resolve::{PlanStep, ResolutionPlan};
pub use variable::{ConstraintRef, VarId, Variable};

pub use brace_core::{Epsilon, GraphError, Point, Priority, Scheme, Value, VarKind, Vector, WiringError};
