//! Arithmetic Constraints.
//!
//! A constraint is `lhs ⋈ 0` for a polynomial `lhs` and a relation `⋈`.
//! Constraints are created and interned by the
//! [`ConstraintPool`](crate::pool::ConstraintPool); two constraints are equal
//! exactly when they carry the same [`ConstraintId`].

use crate::poly::{Polynomial, VarId};
use num_rational::BigRational;
use num_traits::{Signed, Zero};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Relation between a polynomial and zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Relation {
    /// `= 0`
    Eq,
    /// `!= 0`
    Neq,
    /// `< 0`
    Less,
    /// `<= 0`
    Leq,
    /// `> 0`
    Greater,
    /// `>= 0`
    Geq,
}

impl Relation {
    /// Logical negation: `¬(p ⋈ 0)` is `p ⋈' 0`.
    #[must_use]
    pub fn negate(self) -> Self {
        match self {
            Self::Eq => Self::Neq,
            Self::Neq => Self::Eq,
            Self::Less => Self::Geq,
            Self::Leq => Self::Greater,
            Self::Greater => Self::Leq,
            Self::Geq => Self::Less,
        }
    }

    /// The relation obtained by multiplying both sides by `-1`.
    #[must_use]
    pub fn flip(self) -> Self {
        match self {
            Self::Less => Self::Greater,
            Self::Leq => Self::Geq,
            Self::Greater => Self::Less,
            Self::Geq => Self::Leq,
            other => other,
        }
    }

    /// Check whether `value ⋈ 0` holds given the ordering of `value` against zero.
    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Neq => ordering != Ordering::Equal,
            Self::Less => ordering == Ordering::Less,
            Self::Leq => ordering != Ordering::Greater,
            Self::Greater => ordering == Ordering::Greater,
            Self::Geq => ordering != Ordering::Less,
        }
    }

    /// Check whether the relation is strict.
    pub fn is_strict(self) -> bool {
        matches!(self, Self::Less | Self::Greater)
    }

    /// Infix symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Neq => "!=",
            Self::Less => "<",
            Self::Leq => "<=",
            Self::Greater => ">",
            Self::Geq => ">=",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Interned constraint identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConstraintId(u32);

impl ConstraintId {
    /// Create an identifier from its raw index.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw index.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// An interned arithmetic constraint `lhs ⋈ 0`.
#[derive(Debug)]
pub struct Constraint {
    id: ConstraintId,
    lhs: Polynomial,
    relation: Relation,
    /// Every variable is integer-valued.
    all_integer: bool,
    /// Some variable is integer-valued.
    any_integer: bool,
}

impl Constraint {
    pub(crate) fn new(
        id: ConstraintId,
        lhs: Polynomial,
        relation: Relation,
        all_integer: bool,
        any_integer: bool,
    ) -> Self {
        Self {
            id,
            lhs,
            relation,
            all_integer,
            any_integer,
        }
    }

    /// Identifier.
    pub fn id(&self) -> ConstraintId {
        self.id
    }

    /// Left-hand side.
    pub fn lhs(&self) -> &Polynomial {
        &self.lhs
    }

    /// Relation to zero.
    pub fn relation(&self) -> Relation {
        self.relation
    }

    /// Check whether the left-hand side is linear.
    pub fn is_linear(&self) -> bool {
        self.lhs.is_linear()
    }

    /// Variables of the left-hand side.
    pub fn variables(&self) -> BTreeSet<VarId> {
        self.lhs.variables()
    }

    /// Check whether every variable is integer-valued.
    pub fn is_integer(&self) -> bool {
        self.all_integer
    }

    /// Check whether some variable is integer-valued.
    pub fn has_integer(&self) -> bool {
        self.any_integer
    }

    /// Truth value of a variable-free constraint.
    pub fn consistency(&self) -> Option<bool> {
        if self.lhs.is_constant() {
            Some(self.relation.holds(self.lhs.constant_part().cmp(&BigRational::zero())))
        } else {
            None
        }
    }

    /// Evaluate under an assignment; `None` if a variable has no value.
    pub fn evaluate<F>(&self, value_of: F) -> Option<bool>
    where
        F: Fn(VarId) -> Option<BigRational>,
    {
        let value = self.lhs.evaluate(value_of)?;
        let ordering = if value.is_zero() {
            Ordering::Equal
        } else if value.is_positive() {
            Ordering::Greater
        } else {
            Ordering::Less
        };
        Some(self.relation.holds(ordering))
    }
}

impl PartialEq for Constraint {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Constraint {}

impl Hash for Constraint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Constraint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Constraint {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} 0", self.lhs, self.relation)
    }
}
