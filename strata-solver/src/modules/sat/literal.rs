//! Boolean Variables and Literals of the Clause Abstraction.

use std::fmt;
use strata_core::checked_id;

/// A Boolean variable of the abstraction (index into the atom table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Var(u32);

impl Var {
    /// Create a variable from its index.
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self(checked_id(index, "Boolean atom"))
    }

    /// Index into per-variable tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A literal (signed Boolean variable), encoded as `var << 1 | negative`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Lit(u32);

impl Lit {
    /// Literal of `var` with the given polarity.
    #[must_use]
    pub const fn new(var: Var, positive: bool) -> Self {
        Self((var.0 << 1) | (!positive) as u32)
    }

    /// Create a positive literal from a variable.
    #[must_use]
    pub const fn positive(var: Var) -> Self {
        Self::new(var, true)
    }

    /// Create a negative literal from a variable.
    #[must_use]
    pub const fn negative(var: Var) -> Self {
        Self::new(var, false)
    }

    /// Get the variable of this literal.
    #[must_use]
    pub const fn var(self) -> Var {
        Var(self.0 >> 1)
    }

    /// Check if this literal is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        (self.0 & 1) == 0
    }

    /// Get the negation of this literal.
    #[must_use]
    pub const fn negate(self) -> Self {
        Self(self.0 ^ 1)
    }

    /// Truth value of the literal under a variable value.
    #[must_use]
    pub const fn value_under(self, var_value: bool) -> bool {
        var_value == self.is_positive()
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_positive() {
            write!(f, "{}", self.var().0)
        } else {
            write!(f, "-{}", self.var().0)
        }
    }
}
