//! Bounds on Tableau Variables.
//!
//! A bound is created once per distinct `(variable, kind, limit)` and then
//! switched on and off by the formulas that imply it. It is *active* while at
//! least one origin is present; origins are a multiset because the same
//! formula may be asserted more than once.

use super::variable::VariableId;
use num_rational::BigRational;
use std::fmt;
use std::sync::Arc;
use strata_core::{Constraint, ConstraintId, Formula, checked_id};
use strata_math::DeltaRational;
use thiserror::Error;

/// Bound handle (index into the tableau's bound arena).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BoundId(u32);

impl BoundId {
    pub(crate) fn new(index: usize) -> Self {
        Self(checked_id(index, "bound"))
    }

    /// Arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Direction of a bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BoundKind {
    /// `var >= limit`
    Lower,
    /// `var <= limit`
    Upper,
}

/// Why a constraint cannot be turned into bounds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoundError {
    /// The left-hand side has a term of degree two or more.
    #[error("constraint {0} is not linear")]
    NonLinear(String),
    /// The left-hand side has no variables.
    #[error("constraint {0} has no variables")]
    Constant(String),
}

/// A limit on one tableau variable.
#[derive(Debug, Clone)]
pub struct Bound {
    var: VariableId,
    kind: BoundKind,
    limit: DeltaRational,
    /// Constraint equivalent to this bound, if any (not for equalities or disequalities).
    constraint: Option<Arc<Constraint>>,
    origins: Vec<Formula>,
    deduced: bool,
    neq_of: Option<ConstraintId>,
}

impl Bound {
    pub(crate) fn new(
        var: VariableId,
        kind: BoundKind,
        limit: DeltaRational,
        constraint: Option<Arc<Constraint>>,
        neq_of: Option<ConstraintId>,
    ) -> Self {
        Self {
            var,
            kind,
            limit,
            constraint,
            origins: Vec::new(),
            deduced: false,
            neq_of,
        }
    }

    /// Bounded variable.
    pub fn var(&self) -> VariableId {
        self.var
    }

    /// Lower or upper.
    pub fn kind(&self) -> BoundKind {
        self.kind
    }

    /// Limit value.
    pub fn limit(&self) -> &DeltaRational {
        &self.limit
    }

    /// Check whether the bound is strict (non-zero infinitesimal part).
    pub fn is_strict(&self) -> bool {
        !self.limit.is_rational()
    }

    /// Equivalent constraint, if one is known.
    pub fn constraint(&self) -> Option<&Arc<Constraint>> {
        self.constraint.as_ref()
    }

    pub(crate) fn set_constraint_if_missing(&mut self, constraint: &Arc<Constraint>) {
        if self.constraint.is_none() {
            self.constraint = Some(Arc::clone(constraint));
        }
    }

    /// Formulas currently implying this bound.
    pub fn origins(&self) -> &[Formula] {
        &self.origins
    }

    /// Representative origin used in explanations.
    pub fn first_origin(&self) -> Option<&Formula> {
        self.origins.first()
    }

    /// Check whether the bound is active.
    pub fn is_active(&self) -> bool {
        !self.origins.is_empty()
    }

    /// Check whether the bound was derived rather than asserted.
    pub fn is_deduced(&self) -> bool {
        self.deduced
    }

    pub(crate) fn mark_deduced(&mut self) {
        self.deduced = true;
    }

    /// Disequality this bound is the virtual representation of.
    pub fn neq_of(&self) -> Option<ConstraintId> {
        self.neq_of
    }

    pub(crate) fn add_origin(&mut self, origin: Formula) {
        self.origins.push(origin);
    }

    /// Remove one occurrence of `origin`; returns whether it was present.
    pub(crate) fn remove_origin(&mut self, origin: &Formula) -> bool {
        match self.origins.iter().position(|o| o == origin) {
            Some(pos) => {
                self.origins.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Check whether `value` satisfies this bound.
    pub fn admits(&self, value: &DeltaRational) -> bool {
        match self.kind {
            BoundKind::Lower => value >= &self.limit,
            BoundKind::Upper => value <= &self.limit,
        }
    }

    /// Check whether this bound is at least as strong as a bound of the same
    /// kind with limit `other`.
    pub fn implies_limit(&self, other: &DeltaRational) -> bool {
        match self.kind {
            BoundKind::Lower => &self.limit >= other,
            BoundKind::Upper => &self.limit <= other,
        }
    }

    /// Standard part of the limit.
    pub fn real_limit(&self) -> &BigRational {
        self.limit.real()
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.kind {
            BoundKind::Lower => ">=",
            BoundKind::Upper => "<=",
        };
        write!(f, "v{} {} {}", self.var.index(), op, self.limit)
    }
}
