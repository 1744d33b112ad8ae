//! Error types for the brace engine.

use crate::types::{Priority, Scheme, VarKind};
use thiserror::Error;

/// Top-level error type for the brace engine.
#[derive(Debug, Error)]
pub enum BraceError {
    #[error(transparent)]
    Wiring(#[from] WiringError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Widget(#[from] WidgetError),
}

/// Malformed constraint wiring, detected while building a graph.
///
/// These are programming mistakes in a widget's constraint table, never bad
/// user input: a graph that fails to build must not be used.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WiringError {
    #[error("Graph must declare between 1 and {max} schemes, got {found}")]
    SchemeCount { found: usize, max: usize },

    #[error("Invalid tolerance: scale {scale} with epsilon factor {factor}")]
    InvalidTolerance { scale: f64, factor: f64 },

    #[error("Duplicate variable name: {name}")]
    DuplicateVariable { name: String },

    #[error("Duplicate constraint name: {name}")]
    DuplicateConstraint { name: String },

    #[error("Constraint {constraint} expects {expected} variables, got {found}")]
    ArityMismatch {
        constraint: String,
        expected: usize,
        found: usize,
    },

    #[error("Constraint {constraint} references unknown variable #{index}")]
    UnknownVariable { constraint: String, index: usize },

    #[error("Constraint {constraint} lists variable {variable} more than once")]
    RepeatedVariable { constraint: String, variable: String },

    #[error("Constraint {constraint} slot {slot} needs a {expected} variable, but {variable} is a {found}")]
    KindMismatch {
        constraint: String,
        slot: usize,
        variable: String,
        expected: VarKind,
        found: VarKind,
    },

    #[error("{scheme} is out of range for a graph with {schemes} schemes (in {context})")]
    SchemeOutOfRange {
        scheme: Scheme,
        schemes: usize,
        context: String,
    },

    #[error("Constraint {constraint} has no variable choices for {scheme}")]
    MissingChoices { constraint: String, scheme: Scheme },

    #[error("Constraint {constraint} gives {found} variable choices for {scheme}, expected {expected}")]
    ChoiceCountMismatch {
        constraint: String,
        scheme: Scheme,
        expected: usize,
        found: usize,
    },

    #[error("Constraint {constraint} chooses index {index} in {scheme}, but has only {arity} variables")]
    ChoiceOutOfRange {
        constraint: String,
        scheme: Scheme,
        index: usize,
        arity: usize,
    },

    #[error("Constraint {constraint} gives {found} priorities, expected {expected}")]
    PriorityCountMismatch {
        constraint: String,
        expected: usize,
        found: usize,
    },

    #[error("Constraints {first} and {second} both solve {variable} at {priority:?} priority when {source_var} changes in {scheme}")]
    AmbiguousPriority {
        first: String,
        second: String,
        variable: String,
        priority: Priority,
        source_var: String,
        scheme: Scheme,
    },

    #[error("Resolution cycle in {scheme} from {source_var}: {constraint} reads {variable} before it is solved")]
    Cycle {
        source_var: String,
        scheme: Scheme,
        constraint: String,
        variable: String,
    },
}

/// Misuse of a built graph at runtime.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("Unknown variable #{index}")]
    UnknownVariable { index: usize },

    #[error("Variable {variable} is a {found} variable, expected {expected}")]
    KindMismatch {
        variable: String,
        expected: VarKind,
        found: VarKind,
    },

    #[error("Variable {variable} has no resolution plan for {scheme}")]
    UndrivenScheme { variable: String, scheme: Scheme },

    #[error("Epsilon must be finite and positive, got {value}")]
    InvalidEpsilon { value: f64 },

    #[error("Widget scale must be finite and positive, got {scale}")]
    InvalidScale { scale: f64 },
}

/// Errors while constructing or driving a widget.
#[derive(Debug, Error)]
pub enum WidgetError {
    #[error(transparent)]
    Wiring(#[from] WiringError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Degenerate {widget} geometry: {reason}")]
    DegenerateGeometry { widget: &'static str, reason: String },
}
