//! Core value types for the constraint engine.

use std::fmt;

use glam::DVec3;

/// A position in 3-space.
pub type Point = DVec3;

/// A displacement in 3-space.
pub type Vector = DVec3;

/// Multiplier applied to a widget's scale to obtain its epsilon.
pub const EPSILON_FACTOR: f64 = 1e-4;

/// Whether a variable holds a position or a scalar quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VarKind {
    /// A point in 3-space
    Point,
    /// A distance, ratio or other 1-space quantity
    Scalar,
}

impl fmt::Display for VarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarKind::Point => write!(f, "point"),
            VarKind::Scalar => write!(f, "scalar"),
        }
    }
}

/// The current value of a variable.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Point(Point),
    Scalar(f64),
}

impl Value {
    pub fn kind(&self) -> VarKind {
        match self {
            Value::Point(_) => VarKind::Point,
            Value::Scalar(_) => VarKind::Scalar,
        }
    }

    pub fn as_point(&self) -> Option<Point> {
        match self {
            Value::Point(p) => Some(*p),
            Value::Scalar(_) => None,
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Value::Scalar(s) => Some(*s),
            Value::Point(_) => None,
        }
    }

    /// Apply a drag delta. Scalars take the x component.
    pub fn offset(self, delta: Vector) -> Self {
        match self {
            Value::Point(p) => Value::Point(p + delta),
            Value::Scalar(s) => Value::Scalar(s + delta.x),
        }
    }

    /// Rigidly translate. Scalar quantities are translation-invariant.
    pub fn translated(self, delta: Vector) -> Self {
        match self {
            Value::Point(p) => Value::Point(p + delta),
            scalar @ Value::Scalar(_) => scalar,
        }
    }

    /// The delta that `offset` needs to reach `target`, if the kinds agree.
    pub fn delta_to(&self, target: &Value) -> Option<Vector> {
        match (self, target) {
            (Value::Point(a), Value::Point(b)) => Some(*b - *a),
            (Value::Scalar(a), Value::Scalar(b)) => Some(DVec3::new(b - a, 0.0, 0.0)),
            _ => None,
        }
    }

    /// Euclidean distance between two values of the same kind.
    /// Values of different kinds are infinitely far apart.
    pub fn distance(&self, other: &Value) -> f64 {
        match (self, other) {
            (Value::Point(a), Value::Point(b)) => a.distance(*b),
            (Value::Scalar(a), Value::Scalar(b)) => (a - b).abs(),
            _ => f64::INFINITY,
        }
    }

    pub fn is_finite(&self) -> bool {
        match self {
            Value::Point(p) => p.is_finite(),
            Value::Scalar(s) => s.is_finite(),
        }
    }
}

impl From<Point> for Value {
    fn from(p: Point) -> Self {
        Value::Point(p)
    }
}

impl From<f64> for Value {
    fn from(s: f64) -> Self {
        Value::Scalar(s)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Point(p) => write!(f, "({}, {}, {})", p.x, p.y, p.z),
            Value::Scalar(s) => write!(f, "{}", s),
        }
    }
}

/// A resolution scheme: one alternative assignment of which variable each
/// constraint solves for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Scheme {
    Scheme1,
    Scheme2,
    Scheme3,
    Scheme4,
    Scheme5,
    Scheme6,
}

impl Scheme {
    /// Maximum number of schemes a graph may declare.
    pub const COUNT: usize = 6;

    pub const ALL: [Scheme; Scheme::COUNT] = [
        Scheme::Scheme1,
        Scheme::Scheme2,
        Scheme::Scheme3,
        Scheme::Scheme4,
        Scheme::Scheme5,
        Scheme::Scheme6,
    ];

    /// Zero-based index of this scheme.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scheme{}", self.index() + 1)
    }
}

/// Rank of a constraint for one of its variables, used to order resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Priority {
    Lowest = 0,
    LowMedium = 1,
    Default = 2,
    HighMedium = 3,
    High = 4,
    Highest = 5,
}

impl Default for Priority {
    fn default() -> Self {
        Self::Default
    }
}

/// Numeric tolerance below which two values are considered equal.
///
/// Epsilon is proportional to the widget's geometric size, so it has to be
/// recomputed whenever the widget is rescaled.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Epsilon(f64);

impl Epsilon {
    /// Create an epsilon from an absolute tolerance.
    pub fn new(value: f64) -> Option<Self> {
        if value.is_finite() && value > 0.0 {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Epsilon for a widget of the given scale.
    pub fn from_scale(scale: f64) -> Option<Self> {
        Self::new(scale.abs() * EPSILON_FACTOR)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn is_zero(self, x: f64) -> bool {
        x.abs() < self.0
    }

    pub fn approx_eq(self, a: f64, b: f64) -> bool {
        (a - b).abs() < self.0
    }

    /// Two points closer than epsilon coincide.
    pub fn coincident(self, a: Point, b: Point) -> bool {
        a.distance(b) < self.0
    }
}

impl Default for Epsilon {
    fn default() -> Self {
        Self(EPSILON_FACTOR)
    }
}

impl fmt::Display for Epsilon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:e}", self.0)
    }
}
