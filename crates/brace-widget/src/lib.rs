//! Interactive widgets wired on the brace constraint engine.
//!
//! Each widget owns a [`ConstraintGraph`](brace_constraint::ConstraintGraph)
//! and a [`PickTable`] mapping its grabbable parts to [`PickBinding`]s.
//! Dragging a part goes through [`Widget::drag`].

pub mod frame;
pub mod gauge;
pub mod pick;
pub mod widget;

pub use frame::{FrameKind, FramePick, FrameVars, FrameWidget};
pub use gauge::{GaugePick, GaugeVars, GaugeWidget};
pub use pick::{dispatch, DragOutcome, PickBinding, PickTable};
pub use widget::Widget;
