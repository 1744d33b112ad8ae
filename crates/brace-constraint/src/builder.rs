//! Declarative constraint wiring.
//!
//! A [`ConstraintGraphBuilder`] collects every variable and constraint of a
//! widget. [`ConstraintGraphBuilder::build`] then orders each variable's
//! constraints and resolves a plan for every drivable (variable, scheme)
//! pair in one step, so a graph either exists fully validated or not at all.
//!
//! # Example
//!
//! ```
//! use brace_constraint::{ConstraintGraphBuilder, ConstraintKind, Priority, Scheme};
//! use glam::DVec3;
//!
//! let mut b = ConstraintGraphBuilder::new(1);
//! let a = b.point("A", Scheme::Scheme1, DVec3::ZERO);
//! let p = b.point("B", Scheme::Scheme1, DVec3::X);
//! let d = b.scalar("Dist", Scheme::Scheme1, 1.0);
//! b.constraint("ConstDist", ConstraintKind::Distance, &[a, p, d])
//!     .var_choices(Scheme::Scheme1, [2, 2, 1])
//!     .priorities([Priority::Highest, Priority::Highest, Priority::Default]);
//!
//! let mut graph = b.build().unwrap();
//! graph.set_delta(a, DVec3::new(-1.0, 0.0, 0.0));
//! assert!((graph.scalar(d).unwrap() - 2.0).abs() < 1e-9);
//! ```

use brace_core::{Point, Priority, Scheme, Value, WiringError};
use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::constraint::{Constraint, ConstraintId};
use crate::graph::ConstraintGraph;
use crate::kinds::ConstraintKind;
use crate::options::SolverOptions;
use crate::resolve::resolve;
use crate::variable::{ConstraintRef, VarId, Variable};

/// A constraint as declared, before validation.
#[derive(Debug, Clone)]
struct ConstraintDecl {
    name: String,
    kind: ConstraintKind,
    vars: SmallVec<[VarId; 4]>,
    choices: Vec<(Scheme, SmallVec<[usize; 4]>)>,
    priorities: Option<SmallVec<[Priority; 4]>>,
}

impl ConstraintDecl {
    fn validate(self, schemes: usize, variables: &[Variable]) -> Result<Constraint, WiringError> {
        let arity = self.kind.arity();
        if self.vars.len() != arity {
            return Err(WiringError::ArityMismatch {
                constraint: self.name,
                expected: arity,
                found: self.vars.len(),
            });
        }

        for (slot, var) in self.vars.iter().enumerate() {
            let Some(variable) = variables.get(var.0) else {
                return Err(WiringError::UnknownVariable {
                    constraint: self.name,
                    index: var.0,
                });
            };
            if self.vars[..slot].contains(var) {
                return Err(WiringError::RepeatedVariable {
                    constraint: self.name,
                    variable: variable.name.clone(),
                });
            }
            let expected = self.kind.slots()[slot];
            if variable.kind() != expected {
                return Err(WiringError::KindMismatch {
                    constraint: self.name,
                    slot,
                    variable: variable.name.clone(),
                    expected,
                    found: variable.kind(),
                });
            }
        }

        let priorities = match self.priorities {
            None => SmallVec::from_elem(Priority::Default, arity),
            Some(p) if p.len() == arity => p,
            Some(p) => {
                return Err(WiringError::PriorityCountMismatch {
                    constraint: self.name,
                    expected: arity,
                    found: p.len(),
                })
            }
        };

        let mut per_scheme: Vec<Option<SmallVec<[usize; 4]>>> = vec![None; schemes];
        for (scheme, list) in self.choices {
            if scheme.index() >= schemes {
                return Err(WiringError::SchemeOutOfRange {
                    scheme,
                    schemes,
                    context: format!("constraint {}", self.name),
                });
            }
            if list.len() != arity {
                return Err(WiringError::ChoiceCountMismatch {
                    constraint: self.name,
                    scheme,
                    expected: arity,
                    found: list.len(),
                });
            }
            if let Some(&index) = list.iter().find(|&&i| i >= arity) {
                return Err(WiringError::ChoiceOutOfRange {
                    constraint: self.name,
                    scheme,
                    index,
                    arity,
                });
            }
            per_scheme[scheme.index()] = Some(list);
        }

        let mut choices = Vec::with_capacity(schemes);
        for (index, list) in per_scheme.into_iter().enumerate() {
            match list {
                Some(list) => choices.push(list),
                None => {
                    return Err(WiringError::MissingChoices {
                        constraint: self.name,
                        scheme: Scheme::ALL[index],
                    })
                }
            }
        }

        Ok(Constraint {
            name: self.name,
            kind: self.kind,
            vars: self.vars,
            choices,
            priorities,
        })
    }
}

/// Collects variables and constraints, then builds a validated graph.
#[derive(Debug)]
pub struct ConstraintGraphBuilder {
    schemes: usize,
    options: SolverOptions,
    variables: Vec<Variable>,
    names: IndexMap<String, VarId>,
    constraints: Vec<ConstraintDecl>,
    constraint_names: IndexMap<String, ConstraintId>,
    /// Problems found while declaring, reported by `build`.
    deferred: Vec<WiringError>,
}

impl ConstraintGraphBuilder {
    /// Start a graph whose constraints declare choices for `schemes` schemes.
    pub fn new(schemes: usize) -> Self {
        Self {
            schemes,
            options: SolverOptions::default(),
            variables: Vec::new(),
            names: IndexMap::new(),
            constraints: Vec::new(),
            constraint_names: IndexMap::new(),
            deferred: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: SolverOptions) -> Self {
        self.options = options;
        self
    }

    /// Declare a variable with its default scheme.
    pub fn variable(&mut self, name: impl Into<String>, scheme: Scheme, value: Value) -> VarId {
        let name = name.into();
        let id = VarId(self.variables.len());
        if self.names.insert(name.clone(), id).is_some() {
            self.deferred
                .push(WiringError::DuplicateVariable { name: name.clone() });
        }
        self.variables.push(Variable::new(name, scheme, value));
        id
    }

    pub fn point(&mut self, name: impl Into<String>, scheme: Scheme, value: Point) -> VarId {
        self.variable(name, scheme, Value::Point(value))
    }

    pub fn scalar(&mut self, name: impl Into<String>, scheme: Scheme, value: f64) -> VarId {
        self.variable(name, scheme, Value::Scalar(value))
    }

    /// Also allow `var` to be driven under `scheme`.
    pub fn drive(&mut self, var: VarId, scheme: Scheme) -> &mut Self {
        if let Some(variable) = self.variables.get_mut(var.0) {
            if !variable.schemes.contains(&scheme) {
                variable.schemes.push(scheme);
            }
        }
        self
    }

    /// Declare a constraint over `vars`, in the kind's slot order.
    pub fn constraint(
        &mut self,
        name: impl Into<String>,
        kind: ConstraintKind,
        vars: &[VarId],
    ) -> ConstraintEntry<'_> {
        let name = name.into();
        let id = ConstraintId(self.constraints.len());
        if self.constraint_names.insert(name.clone(), id).is_some() {
            self.deferred
                .push(WiringError::DuplicateConstraint { name: name.clone() });
        }
        self.constraints.push(ConstraintDecl {
            name,
            kind,
            vars: vars.iter().copied().collect(),
            choices: Vec::new(),
            priorities: None,
        });
        ConstraintEntry { builder: self, id }
    }

    /// Order every variable, then resolve every plan.
    pub fn build(self) -> Result<ConstraintGraph, WiringError> {
        if self.schemes == 0 || self.schemes > Scheme::COUNT {
            return Err(WiringError::SchemeCount {
                found: self.schemes,
                max: Scheme::COUNT,
            });
        }
        if let Some(err) = self.deferred.into_iter().next() {
            return Err(err);
        }
        let epsilon = self
            .options
            .epsilon()
            .ok_or(WiringError::InvalidTolerance {
                scale: self.options.scale,
                factor: self.options.epsilon_factor,
            })?;

        let mut variables = self.variables;
        for variable in &variables {
            if let Some(&scheme) = variable.schemes.iter().find(|s| s.index() >= self.schemes) {
                return Err(WiringError::SchemeOutOfRange {
                    scheme,
                    schemes: self.schemes,
                    context: format!("variable {}", variable.name),
                });
            }
        }

        let constraints = self
            .constraints
            .into_iter()
            .map(|decl| decl.validate(self.schemes, &variables))
            .collect::<Result<Vec<_>, _>>()?;

        for (index, constraint) in constraints.iter().enumerate() {
            for (slot, var) in constraint.vars.iter().enumerate() {
                variables[var.0].constraints.push(ConstraintRef {
                    constraint: ConstraintId(index),
                    slot,
                });
            }
        }

        for variable in &mut variables {
            variable.order(&constraints);
        }

        let mut plans = Vec::with_capacity(variables.len());
        for (index, variable) in variables.iter().enumerate() {
            let mut var_plans = SmallVec::new();
            for &scheme in variable.schemes() {
                var_plans.push(resolve(VarId(index), scheme, &variables, &constraints)?);
            }
            plans.push(var_plans);
        }

        Ok(ConstraintGraph {
            variables,
            constraints,
            plans,
            names: self.names,
            constraint_names: self.constraint_names,
            schemes: self.schemes,
            epsilon,
            scale: self.options.scale,
            options: self.options,
        })
    }
}

/// A constraint being declared; configures choices and priorities.
#[derive(Debug)]
pub struct ConstraintEntry<'a> {
    builder: &'a mut ConstraintGraphBuilder,
    id: ConstraintId,
}

impl ConstraintEntry<'_> {
    pub fn id(&self) -> ConstraintId {
        self.id
    }

    fn decl(&mut self) -> &mut ConstraintDecl {
        &mut self.builder.constraints[self.id.0]
    }

    /// For `scheme`, entry `i` names the slot solved when slot `i` changes.
    /// An entry equal to its own index leaves the constraint passive.
    pub fn var_choices(mut self, scheme: Scheme, choices: impl IntoIterator<Item = usize>) -> Self {
        let list = choices.into_iter().collect();
        let decl = self.decl();
        decl.choices.retain(|(s, _)| *s != scheme);
        decl.choices.push((scheme, list));
        self
    }

    /// Use the same choices for every scheme of the graph.
    pub fn var_choices_all(mut self, choices: impl IntoIterator<Item = usize>) -> Self {
        let list: SmallVec<[usize; 4]> = choices.into_iter().collect();
        let schemes = self.builder.schemes.min(Scheme::COUNT);
        let decl = self.decl();
        decl.choices.clear();
        for &scheme in &Scheme::ALL[..schemes] {
            decl.choices.push((scheme, list.clone()));
        }
        self
    }

    /// One priority per slot, used to order each variable's constraints.
    pub fn priorities(mut self, priorities: impl IntoIterator<Item = Priority>) -> Self {
        self.decl().priorities = Some(priorities.into_iter().collect());
        self
    }
}
