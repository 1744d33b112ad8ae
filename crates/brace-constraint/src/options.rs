//! Solver configuration.

use brace_core::{Epsilon, EPSILON_FACTOR};

/// Options for building and driving a constraint graph.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolverOptions {
    /// Multiplier applied to the widget scale to obtain epsilon
    pub epsilon_factor: f64,
    /// Initial widget scale
    pub scale: f64,
    /// Compare every constraint's residual with epsilon after each pass
    pub check_residuals: bool,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            epsilon_factor: EPSILON_FACTOR,
            scale: 1.0,
            check_residuals: true,
        }
    }
}

impl SolverOptions {
    /// Options for a widget of the given scale.
    pub fn with_scale(scale: f64) -> Self {
        Self {
            scale,
            ..Self::default()
        }
    }

    /// Epsilon for a widget of `scale` under these options.
    pub fn epsilon_for(&self, scale: f64) -> Option<Epsilon> {
        Epsilon::new(scale.abs() * self.epsilon_factor)
    }

    /// Epsilon for the initial scale.
    pub fn epsilon(&self) -> Option<Epsilon> {
        self.epsilon_for(self.scale)
    }
}
