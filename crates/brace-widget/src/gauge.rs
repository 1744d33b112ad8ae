//! A gauge: a shaft between two ends with a slider that reads out a ratio.
//!
//! Dragging either end stretches the shaft and keeps the slider on it. The
//! slider itself only moves along the shaft. The ratio is the slider's
//! distance from the left end over the shaft length.

use brace_constraint::{
    ConstraintGraph, ConstraintGraphBuilder, ConstraintKind, PropagationReport, SolverOptions,
    VarId,
};
use brace_core::{Epsilon, GraphError, Point, Priority, Scheme, WidgetError};
use smallvec::smallvec;
use tracing::debug;

use crate::pick::{PickBinding, PickTable};
use crate::widget::Widget;

const NUM_SCHEMES: usize = 4;

/// Grabbable parts of a gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GaugePick {
    EndLeft,
    EndRight,
    Slider,
    Shaft,
}

/// Handles to the gauge's variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GaugeVars {
    pub left: VarId,
    pub right: VarId,
    pub slider: VarId,
    pub length: VarId,
    pub slider_dist: VarId,
    pub ratio: VarId,
}

#[derive(Debug, Clone)]
pub struct GaugeWidget {
    graph: ConstraintGraph,
    vars: GaugeVars,
    picks: PickTable<GaugePick>,
}

impl GaugeWidget {
    /// A gauge from `left` to `right` with the slider at `ratio` along it.
    pub fn new(left: Point, right: Point, ratio: f64, scale: f64) -> Result<Self, WidgetError> {
        let eps = Epsilon::from_scale(scale).ok_or(GraphError::InvalidScale { scale })?;
        if eps.coincident(left, right) {
            return Err(WidgetError::DegenerateGeometry {
                widget: "gauge",
                reason: format!("ends coincide at {left}"),
            });
        }
        if !(0.0..=1.0).contains(&ratio) {
            return Err(WidgetError::DegenerateGeometry {
                widget: "gauge",
                reason: format!("slider ratio {ratio} outside [0, 1]"),
            });
        }

        let length = left.distance(right);
        let slider = left.lerp(right, ratio);

        let mut b = ConstraintGraphBuilder::new(NUM_SCHEMES)
            .with_options(SolverOptions::with_scale(scale));
        let vars = GaugeVars {
            left: b.point("Left", Scheme::Scheme1, left),
            right: b.point("Right", Scheme::Scheme2, right),
            slider: b.point("Slider", Scheme::Scheme3, slider),
            length: b.scalar("Length", Scheme::Scheme4, length),
            slider_dist: b.scalar("SliderDist", Scheme::Scheme3, length * ratio),
            ratio: b.scalar("Ratio", Scheme::Scheme4, ratio),
        };
        let GaugeVars {
            left: l,
            right: r,
            slider: s,
            length: dist,
            slider_dist: sdist,
            ratio: rat,
        } = vars;

        b.constraint("ConstLength", ConstraintKind::Distance, &[l, r, dist])
            .var_choices_all([2, 2, 1])
            .priorities([Priority::Highest, Priority::Highest, Priority::Default]);
        b.constraint("ConstSliderDist", ConstraintKind::Distance, &[l, s, sdist])
            .var_choices_all([2, 2, 1]);
        // Moving an end or the slider re-reads the ratio; setting the ratio
        // or length moves the slider instead.
        b.constraint("ConstRatio", ConstraintKind::Ratio, &[sdist, dist, rat])
            .var_choices(Scheme::Scheme1, [2, 1, 0])
            .var_choices(Scheme::Scheme2, [2, 1, 0])
            .var_choices(Scheme::Scheme3, [2, 1, 0])
            .var_choices(Scheme::Scheme4, [2, 0, 0]);
        b.constraint("ConstRail", ConstraintKind::Segment, &[l, r, s])
            .var_choices(Scheme::Scheme1, [2, 2, 2])
            .var_choices(Scheme::Scheme2, [2, 2, 2])
            .var_choices(Scheme::Scheme3, [2, 2, 2])
            .var_choices(Scheme::Scheme4, [2, 1, 2])
            .priorities([Priority::High, Priority::High, Priority::Default]);

        let graph = b.build()?;
        let picks = PickTable::new()
            .bind(GaugePick::EndLeft, PickBinding::Handle(l))
            .bind(GaugePick::EndRight, PickBinding::Handle(r))
            .bind(
                GaugePick::Slider,
                PickBinding::Slider {
                    var: s,
                    start: l,
                    end: r,
                },
            )
            .bind(GaugePick::Shaft, PickBinding::Body(smallvec![l, r, s]));

        debug!(%left, %right, ratio, scale, "gauge built");
        Ok(Self { graph, vars, picks })
    }

    pub fn vars(&self) -> GaugeVars {
        self.vars
    }

    pub fn left(&self) -> Point {
        self.point(self.vars.left)
    }

    pub fn right(&self) -> Point {
        self.point(self.vars.right)
    }

    pub fn slider(&self) -> Point {
        self.point(self.vars.slider)
    }

    pub fn length(&self) -> f64 {
        self.scalar(self.vars.length)
    }

    pub fn ratio(&self) -> f64 {
        self.scalar(self.vars.ratio)
    }

    /// Place the slider at `ratio` along the shaft.
    ///
    /// Prefer this to driving the `Ratio` variable. That plan moves the slider
    /// along its current offset from the left end, so it stalls while the
    /// slider sits on that end and reports `ConstSliderDist` as degenerate.
    pub fn set_ratio(&mut self, ratio: f64) -> Result<PropagationReport, WidgetError> {
        if !(0.0..=1.0).contains(&ratio) {
            return Err(WidgetError::DegenerateGeometry {
                widget: "gauge",
                reason: format!("slider ratio {ratio} outside [0, 1]"),
            });
        }
        let target = self.left().lerp(self.right(), ratio);
        Ok(self.graph.set(self.vars.slider, target)?)
    }

    /// Stretch the shaft to `length`, keeping the left end and the ratio.
    pub fn set_length(&mut self, length: f64) -> Result<PropagationReport, WidgetError> {
        if !(length.is_finite() && length > self.graph.epsilon().value()) {
            return Err(WidgetError::DegenerateGeometry {
                widget: "gauge",
                reason: format!("shaft length {length} too small"),
            });
        }
        Ok(self.graph.set(self.vars.length, length)?)
    }

    // Kinds are fixed by construction.
    fn point(&self, var: VarId) -> Point {
        self.graph.point(var).unwrap_or_default()
    }

    fn scalar(&self, var: VarId) -> f64 {
        self.graph.scalar(var).unwrap_or_default()
    }
}

impl Widget for GaugeWidget {
    type Pick = GaugePick;

    fn name(&self) -> &'static str {
        "gauge"
    }

    fn graph(&self) -> &ConstraintGraph {
        &self.graph
    }

    fn graph_mut(&mut self) -> &mut ConstraintGraph {
        &mut self.graph
    }

    fn picks(&self) -> &PickTable<GaugePick> {
        &self.picks
    }
}
