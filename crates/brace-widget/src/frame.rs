//! Resizable rectangular and square frames.
//!
//! A frame is wired around its center `C`, the midpoints of its right and
//! bottom edges (`R`, `D`) and the bottom-right corner `DR`, which closes the
//! parallelogram `C-R-DR-D`. The other three corners hang off `DR` through
//! midpoint constraints. Half sizes are distances from the center; a square
//! ties them together through a unit aspect ratio.

use brace_constraint::{
    ConstraintGraph, ConstraintGraphBuilder, ConstraintKind, PropagationReport, SolverOptions,
    VarId,
};
use brace_core::{Epsilon, GraphError, Point, Priority, Scheme, Vector, WidgetError};
use smallvec::smallvec;
use tracing::debug;

use crate::pick::{PickBinding, PickTable};
use crate::widget::Widget;

const NUM_SCHEMES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    Rectangle,
    Square,
}

/// Grabbable parts of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramePick {
    Body,
    ResizeRight,
    ResizeDown,
    ResizeCorner,
}

/// Handles to the frame's variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameVars {
    pub center: VarId,
    pub right: VarId,
    pub down: VarId,
    pub down_right: VarId,
    pub up_right: VarId,
    pub up_left: VarId,
    pub down_left: VarId,
    pub half_width: VarId,
    pub half_height: VarId,
    pub half_diagonal: VarId,
    /// Square frames only.
    pub aspect: Option<VarId>,
}

#[derive(Debug, Clone)]
pub struct FrameWidget {
    kind: FrameKind,
    graph: ConstraintGraph,
    vars: FrameVars,
    picks: PickTable<FramePick>,
}

/// Unit edge directions, the second made orthogonal to the first.
fn frame_axes(right: Vector, down: Vector, eps: Epsilon) -> Result<(Vector, Vector), WidgetError> {
    let degenerate = |reason: &str| WidgetError::DegenerateGeometry {
        widget: "frame",
        reason: reason.to_string(),
    };
    if eps.is_zero(right.length()) {
        return Err(degenerate("right axis has no length"));
    }
    let right = right.normalize();
    let down = down - right * down.dot(right);
    if eps.is_zero(down.length()) {
        return Err(degenerate("down axis is parallel to the right axis"));
    }
    Ok((right, down.normalize()))
}

impl FrameWidget {
    /// A `width` by `height` rectangle centered on `center`.
    pub fn rectangle(
        center: Point,
        right_axis: Vector,
        down_axis: Vector,
        width: f64,
        height: f64,
        scale: f64,
    ) -> Result<Self, WidgetError> {
        Self::build(FrameKind::Rectangle, center, right_axis, down_axis, width, height, scale)
    }

    /// A square with sides of `size` centered on `center`.
    pub fn square(
        center: Point,
        right_axis: Vector,
        down_axis: Vector,
        size: f64,
        scale: f64,
    ) -> Result<Self, WidgetError> {
        Self::build(FrameKind::Square, center, right_axis, down_axis, size, size, scale)
    }

    fn build(
        kind: FrameKind,
        center: Point,
        right_axis: Vector,
        down_axis: Vector,
        width: f64,
        height: f64,
        scale: f64,
    ) -> Result<Self, WidgetError> {
        let eps = Epsilon::from_scale(scale).ok_or(GraphError::InvalidScale { scale })?;
        let (ex, ey) = frame_axes(right_axis, down_axis, eps)?;
        for size in [width, height] {
            if !(size.is_finite() && size > eps.value()) {
                return Err(WidgetError::DegenerateGeometry {
                    widget: "frame",
                    reason: format!("size {size} too small"),
                });
            }
        }

        let (hw, hh) = (width * 0.5, height * 0.5);
        let right = center + ex * hw;
        let down = center + ey * hh;
        let down_right = right + down - center;

        let mut b = ConstraintGraphBuilder::new(NUM_SCHEMES)
            .with_options(SolverOptions::with_scale(scale));
        let c = b.point("Center", Scheme::Scheme1, center);
        let r = b.point("Right", Scheme::Scheme1, right);
        let d = b.point("Down", Scheme::Scheme2, down);
        let dr = b.point("DownRight", Scheme::Scheme1, down_right);
        let ur = b.point("UpRight", Scheme::Scheme1, right * 2.0 - down_right);
        let ul = b.point("UpLeft", Scheme::Scheme1, center * 2.0 - down_right);
        let dl = b.point("DownLeft", Scheme::Scheme1, down * 2.0 - down_right);
        let size_r = b.scalar("HalfWidth", Scheme::Scheme1, hw);
        let size_d = b.scalar("HalfHeight", Scheme::Scheme2, hh);
        let diag = b.scalar("HalfDiagonal", Scheme::Scheme1, hw.hypot(hh));
        let aspect = match kind {
            FrameKind::Rectangle => None,
            FrameKind::Square => Some(b.scalar("Aspect", Scheme::Scheme1, 1.0)),
        };

        b.constraint("ConstRight", ConstraintKind::Distance, &[c, r, size_r])
            .var_choices_all([0, 2, 1]);
        b.constraint("ConstDown", ConstraintKind::Distance, &[c, d, size_d])
            .var_choices_all([0, 2, 1]);
        let plane = b
            .constraint("ConstPlane", ConstraintKind::Plane, &[c, r, dr, d])
            .priorities([Priority::Default, Priority::High, Priority::Default, Priority::High]);
        match aspect {
            // Each edge handle reaches the corner through its own plane choice.
            None => plane.var_choices_all([0, 2, 2, 2]),
            // Only the driven edge closes the corner; the other edge follows
            // the aspect ratio first.
            Some(_) => plane
                .var_choices(Scheme::Scheme1, [0, 1, 2, 2])
                .var_choices(Scheme::Scheme2, [0, 2, 2, 3]),
        };
        b.constraint("ConstUpRight", ConstraintKind::Midpoint, &[ur, dr, r])
            .var_choices_all([0, 0, 2]);
        b.constraint("ConstDownLeft", ConstraintKind::Midpoint, &[dl, dr, d])
            .var_choices_all([0, 0, 2]);
        b.constraint("ConstUpLeft", ConstraintKind::Midpoint, &[ul, dr, c])
            .var_choices_all([0, 0, 2]);
        match aspect {
            None => {
                b.constraint("ConstDiagonal", ConstraintKind::Hypotenuse, &[size_r, size_d, diag])
                    .var_choices_all([2, 2, 2]);
            }
            Some(aspect) => {
                b.constraint("ConstAspect", ConstraintKind::Ratio, &[size_d, size_r, aspect])
                    .var_choices(Scheme::Scheme1, [0, 0, 0])
                    .var_choices(Scheme::Scheme2, [1, 1, 1]);
                b.constraint("ConstDiagonal", ConstraintKind::Pythagorean, &[size_r, diag])
                    .var_choices_all([1, 1]);
            }
        }

        let graph = b.build()?;
        let vars = FrameVars {
            center: c,
            right: r,
            down: d,
            down_right: dr,
            up_right: ur,
            up_left: ul,
            down_left: dl,
            half_width: size_r,
            half_height: size_d,
            half_diagonal: diag,
            aspect,
        };
        let picks = PickTable::new()
            .bind(FramePick::Body, PickBinding::Body(smallvec![c, r, d, dr, ur, ul, dl]))
            .bind(FramePick::ResizeRight, PickBinding::Axis { var: r, origin: c })
            .bind(FramePick::ResizeDown, PickBinding::Axis { var: d, origin: c })
            .bind(
                FramePick::ResizeCorner,
                PickBinding::Corner {
                    axes: [(r, c), (d, c)],
                },
            );

        debug!(?kind, %center, width, height, scale, "frame built");
        Ok(Self {
            kind,
            graph,
            vars,
            picks,
        })
    }

    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    pub fn vars(&self) -> FrameVars {
        self.vars
    }

    pub fn center(&self) -> Point {
        self.point(self.vars.center)
    }

    /// Corners clockwise from the top left.
    pub fn corners(&self) -> [Point; 4] {
        [
            self.point(self.vars.up_left),
            self.point(self.vars.up_right),
            self.point(self.vars.down_right),
            self.point(self.vars.down_left),
        ]
    }

    pub fn width(&self) -> f64 {
        2.0 * self.scalar(self.vars.half_width)
    }

    pub fn height(&self) -> f64 {
        2.0 * self.scalar(self.vars.half_height)
    }

    pub fn half_diagonal(&self) -> f64 {
        self.scalar(self.vars.half_diagonal)
    }

    /// Resize horizontally about the center. A square resizes both ways.
    pub fn set_width(&mut self, width: f64) -> Result<PropagationReport, WidgetError> {
        self.check_size(width)?;
        Ok(self.graph.set(self.vars.half_width, width * 0.5)?)
    }

    /// Resize vertically about the center. A square resizes both ways.
    pub fn set_height(&mut self, height: f64) -> Result<PropagationReport, WidgetError> {
        self.check_size(height)?;
        Ok(self.graph.set(self.vars.half_height, height * 0.5)?)
    }

    fn check_size(&self, size: f64) -> Result<(), WidgetError> {
        if size.is_finite() && size > self.graph.epsilon().value() {
            Ok(())
        } else {
            Err(WidgetError::DegenerateGeometry {
                widget: "frame",
                reason: format!("size {size} too small"),
            })
        }
    }

    fn point(&self, var: VarId) -> Point {
        self.graph.point(var).unwrap_or_default()
    }

    fn scalar(&self, var: VarId) -> f64 {
        self.graph.scalar(var).unwrap_or_default()
    }
}

impl Widget for FrameWidget {
    type Pick = FramePick;

    fn name(&self) -> &'static str {
        match self.kind {
            FrameKind::Rectangle => "rectangle frame",
            FrameKind::Square => "square frame",
        }
    }

    fn graph(&self) -> &ConstraintGraph {
        &self.graph
    }

    fn graph_mut(&mut self) -> &mut ConstraintGraph {
        &mut self.graph
    }

    fn picks(&self) -> &PickTable<FramePick> {
        &self.picks
    }
}
