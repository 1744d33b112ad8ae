use std::fmt::Debug;
use std::hash::Hash;

use brace_constraint::ConstraintGraph;
use brace_core::{Vector, WidgetError};
use tracing::debug;

use crate::pick::{dispatch, DragOutcome, PickTable};

/// An interactive widget backed by a constraint graph.
pub trait Widget {
    /// The parts of the widget a pointer can grab.
    type Pick: Copy + Eq + Hash + Debug;

    fn name(&self) -> &'static str;

    fn graph(&self) -> &ConstraintGraph;

    fn graph_mut(&mut self) -> &mut ConstraintGraph;

    fn picks(&self) -> &PickTable<Self::Pick>;

    /// Drag the grabbed part by `delta`.
    fn drag(&mut self, pick: Self::Pick, delta: Vector) -> Result<DragOutcome, WidgetError> {
        let Some(binding) = self.picks().get(pick).cloned() else {
            debug!(widget = self.name(), ?pick, "unbound pick");
            return Ok(DragOutcome::Ignored);
        };
        dispatch(self.graph_mut(), &binding, delta)
    }

    /// Move the whole widget rigidly.
    fn translate(&mut self, delta: Vector) {
        self.graph_mut().translate(delta);
    }

    fn set_scale(&mut self, scale: f64) -> Result<(), WidgetError> {
        self.graph_mut().set_scale(scale)?;
        Ok(())
    }

    fn is_consistent(&self) -> bool {
        self.graph().is_consistent()
    }
}
