//! Pick bindings: what a drag on each widget part does to the graph.

use std::fmt::Debug;
use std::hash::Hash;

use brace_constraint::kinds::closest_on_segment;
use brace_constraint::{ConstraintGraph, PropagationReport, VarId};
use brace_core::{GraphError, Point, VarKind, Vector, WidgetError};
use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::{debug, trace};

/// How a picked widget part turns a drag into graph updates.
#[derive(Debug, Clone, PartialEq)]
pub enum PickBinding {
    /// Drag the variable freely.
    Handle(VarId),
    /// Drag `var` along the axis from `origin` through it.
    Axis { var: VarId, origin: VarId },
    /// Slide `var` along the segment from `start` to `end`, clamped to it.
    Slider { var: VarId, start: VarId, end: VarId },
    /// Two axis drags from one pointer motion, applied in order.
    Corner { axes: [(VarId, VarId); 2] },
    /// Translate the listed points without resolving anything.
    Body(SmallVec<[VarId; 8]>),
}

/// Result of dispatching one drag.
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    /// Constraints were resolved; one report per propagated change.
    Resolved(Vec<PropagationReport>),
    /// Points were translated rigidly.
    Moved { count: usize },
    /// The pick has no binding.
    Ignored,
}

impl DragOutcome {
    /// Whether every propagation finished without degenerate solves or
    /// violated constraints.
    pub fn is_clean(&self) -> bool {
        match self {
            DragOutcome::Resolved(reports) => reports.iter().all(PropagationReport::is_clean),
            _ => true,
        }
    }
}

/// Maps a widget's pick enum to its bindings.
#[derive(Debug, Clone)]
pub struct PickTable<P> {
    bindings: IndexMap<P, PickBinding>,
}

impl<P: Copy + Eq + Hash + Debug> PickTable<P> {
    pub fn new() -> Self {
        Self {
            bindings: IndexMap::new(),
        }
    }

    pub fn bind(mut self, pick: P, binding: PickBinding) -> Self {
        self.bindings.insert(pick, binding);
        self
    }

    pub fn get(&self, pick: P) -> Option<&PickBinding> {
        self.bindings.get(&pick)
    }

    /// Picks in binding order.
    pub fn picks(&self) -> impl Iterator<Item = P> + '_ {
        self.bindings.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl<P: Copy + Eq + Hash + Debug> Default for PickTable<P> {
    fn default() -> Self {
        Self::new()
    }
}

fn point_of(graph: &ConstraintGraph, var: VarId) -> Result<Point, GraphError> {
    let variable = graph
        .variable(var)
        .ok_or(GraphError::UnknownVariable { index: var.index() })?;
    variable.point().ok_or_else(|| GraphError::KindMismatch {
        variable: variable.name().to_string(),
        expected: VarKind::Point,
        found: variable.kind(),
    })
}

/// The part of `delta` along the axis from `origin` to `var`. A collapsed
/// axis passes the drag through unchanged.
fn along_axis(
    graph: &ConstraintGraph,
    var: VarId,
    origin: VarId,
    delta: Vector,
) -> Result<Vector, GraphError> {
    let axis = point_of(graph, var)? - point_of(graph, origin)?;
    if graph.epsilon().is_zero(axis.length()) {
        return Ok(delta);
    }
    let dir = axis.normalize();
    Ok(dir * delta.dot(dir))
}

/// Apply a drag of `delta` through `binding`.
pub fn dispatch(
    graph: &mut ConstraintGraph,
    binding: &PickBinding,
    delta: Vector,
) -> Result<DragOutcome, WidgetError> {
    trace!(?binding, ?delta, "dispatching drag");
    let outcome = match binding {
        PickBinding::Handle(var) => DragOutcome::Resolved(vec![graph.set_delta(*var, delta)]),
        PickBinding::Axis { var, origin } => {
            let step = along_axis(graph, *var, *origin, delta)?;
            DragOutcome::Resolved(vec![graph.set_delta(*var, step)])
        }
        PickBinding::Slider { var, start, end } => {
            let target = closest_on_segment(
                point_of(graph, *start)?,
                point_of(graph, *end)?,
                point_of(graph, *var)? + delta,
            );
            DragOutcome::Resolved(vec![graph.set(*var, target)?])
        }
        PickBinding::Corner { axes } => {
            let mut reports = Vec::with_capacity(axes.len());
            for &(var, origin) in axes {
                let step = along_axis(graph, var, origin, delta)?;
                reports.push(graph.set_delta(var, step));
            }
            DragOutcome::Resolved(reports)
        }
        PickBinding::Body(vars) => {
            graph.move_delta(vars, delta);
            DragOutcome::Moved { count: vars.len() }
        }
    };
    if !outcome.is_clean() {
        debug!(?binding, "drag left the widget inconsistent");
    }
    Ok(outcome)
}
