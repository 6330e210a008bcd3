//! Models: Satisfying Assignments.

use crate::constraint::Constraint;
use crate::formula::BoolVarId;
use crate::poly::VarId;
use num_rational::BigRational;
use std::collections::BTreeMap;
use std::fmt;

/// Exact assignment to arithmetic and Boolean variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Model {
    arith: BTreeMap<VarId, BigRational>,
    booleans: BTreeMap<BoolVarId, bool>,
}

impl Model {
    /// Create an empty model
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign an arithmetic variable.
    pub fn set_arith(&mut self, var: VarId, value: BigRational) {
        self.arith.insert(var, value);
    }

    /// Assign a Boolean variable.
    pub fn set_bool(&mut self, var: BoolVarId, value: bool) {
        self.booleans.insert(var, value);
    }

    /// Value of an arithmetic variable.
    pub fn arith(&self, var: VarId) -> Option<&BigRational> {
        self.arith.get(&var)
    }

    /// Value of a Boolean variable.
    pub fn boolean(&self, var: BoolVarId) -> Option<bool> {
        self.booleans.get(&var).copied()
    }

    /// Arithmetic assignments in variable order.
    pub fn arith_values(&self) -> impl Iterator<Item = (VarId, &BigRational)> {
        self.arith.iter().map(|(v, q)| (*v, q))
    }

    /// Boolean assignments in variable order.
    pub fn bool_values(&self) -> impl Iterator<Item = (BoolVarId, bool)> + '_ {
        self.booleans.iter().map(|(v, b)| (*v, *b))
    }

    /// Copy every assignment of `other` into `self`, overwriting clashes.
    pub fn merge(&mut self, other: &Model) {
        self.arith
            .extend(other.arith.iter().map(|(v, q)| (*v, q.clone())));
        self.booleans.extend(other.booleans.iter());
    }

    /// Remove all assignments.
    pub fn clear(&mut self) {
        self.arith.clear();
        self.booleans.clear();
    }

    /// Check whether the model is empty.
    pub fn is_empty(&self) -> bool {
        self.arith.is_empty() && self.booleans.is_empty()
    }

    /// Number of assigned variables.
    pub fn len(&self) -> usize {
        self.arith.len() + self.booleans.len()
    }

    /// Truth value of a constraint; `None` if a variable is unassigned.
    pub fn evaluate_constraint(&self, constraint: &Constraint) -> Option<bool> {
        constraint.evaluate(|v| self.arith.get(&v).cloned())
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "(model")?;
        for (var, value) in &self.arith {
            writeln!(f, "  ({var} {value})")?;
        }
        for (var, value) in &self.booleans {
            writeln!(f, "  ({var} {value})")?;
        }
        write!(f, ")")
    }
}
