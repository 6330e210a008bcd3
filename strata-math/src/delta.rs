//! Rationals Extended with an Infinitesimal.
//!
//! A [`DeltaRational`] is a pair `(c, k)` standing for `c + k·δ` where `δ` is a
//! positive infinitesimal. Strict bounds become non-strict ones over this
//! domain:
//!
//! - `x < c` is `x <= c - δ`
//! - `x > c` is `x >= c + δ`
//!
//! Values are compared lexicographically (rational part first, then the
//! coefficient of `δ`), so a single ordered lookup finds the tightest bound of
//! either kind.
//!
//! ## References
//!
//! - Dutertre & de Moura (2006): "A Fast Linear-Arithmetic Solver for DPLL(T)"

use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// A rational number plus a rational multiple of a positive infinitesimal.
///
/// The derived ordering is lexicographic over `(real, delta)`, which is the
/// correct total order for any sufficiently small `δ > 0`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeltaRational {
    /// Standard part.
    real: BigRational,
    /// Coefficient of the infinitesimal.
    delta: BigRational,
}

impl DeltaRational {
    /// Create `real + delta·δ`.
    #[must_use]
    pub fn new(real: BigRational, delta: BigRational) -> Self {
        Self { real, delta }
    }

    /// The value zero.
    #[must_use]
    pub fn zero() -> Self {
        Self::new(BigRational::zero(), BigRational::zero())
    }

    /// Embed a rational with no infinitesimal part.
    #[must_use]
    pub fn from_rational(real: BigRational) -> Self {
        Self::new(real, BigRational::zero())
    }

    /// Limit of a strict upper bound `x < value`, i.e. `value - δ`.
    #[must_use]
    pub fn below(value: BigRational) -> Self {
        Self::new(value, -BigRational::one())
    }

    /// Limit of a strict lower bound `x > value`, i.e. `value + δ`.
    #[must_use]
    pub fn above(value: BigRational) -> Self {
        Self::new(value, BigRational::one())
    }

    /// Standard part.
    pub fn real(&self) -> &BigRational {
        &self.real
    }

    /// Coefficient of `δ`.
    pub fn delta(&self) -> &BigRational {
        &self.delta
    }

    /// Check whether the value is zero.
    pub fn is_zero(&self) -> bool {
        self.real.is_zero() && self.delta.is_zero()
    }

    /// Check whether the infinitesimal part vanishes.
    pub fn is_rational(&self) -> bool {
        self.delta.is_zero()
    }

    /// Check whether the value is an integer (no infinitesimal, integral standard part).
    pub fn is_integer(&self) -> bool {
        self.is_rational() && self.real.is_integer()
    }

    /// Multiply by a rational scalar.
    #[must_use]
    pub fn scale(&self, factor: &BigRational) -> Self {
        Self::new(&self.real * factor, &self.delta * factor)
    }

    /// Divide by a non-zero rational scalar.
    #[must_use]
    pub fn div_scalar(&self, divisor: &BigRational) -> Self {
        debug_assert!(!divisor.is_zero(), "division of a delta-rational by zero");
        Self::new(&self.real / divisor, &self.delta / divisor)
    }

    /// Substitute a concrete positive value for `δ`.
    #[must_use]
    pub fn concretize(&self, delta_value: &BigRational) -> BigRational {
        &self.real + &self.delta * delta_value
    }

    /// Largest admissible `δ` for `self <= other` to survive concretisation.
    ///
    /// Returns `None` when any positive `δ` keeps the inequality (or when it is
    /// already violated in the standard part, which the caller excludes).
    pub fn delta_limit(&self, other: &DeltaRational) -> Option<BigRational> {
        // self.real + self.delta·δ <= other.real + other.delta·δ
        if self.real < other.real && self.delta > other.delta {
            Some((&other.real - &self.real) / (&self.delta - &other.delta))
        } else {
            None
        }
    }
}

impl Default for DeltaRational {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<BigRational> for DeltaRational {
    fn from(value: BigRational) -> Self {
        Self::from_rational(value)
    }
}

impl fmt::Display for DeltaRational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.delta.is_zero() {
            write!(f, "{}", self.real)
        } else if self.delta.is_negative() {
            write!(f, "{} - {}δ", self.real, self.delta.abs())
        } else {
            write!(f, "{} + {}δ", self.real, self.delta)
        }
    }
}

impl Add<&DeltaRational> for &DeltaRational {
    type Output = DeltaRational;

    fn add(self, rhs: &DeltaRational) -> DeltaRational {
        DeltaRational::new(&self.real + &rhs.real, &self.delta + &rhs.delta)
    }
}

impl Add for DeltaRational {
    type Output = DeltaRational;

    fn add(self, rhs: DeltaRational) -> DeltaRational {
        DeltaRational::new(self.real + rhs.real, self.delta + rhs.delta)
    }
}

impl Sub<&DeltaRational> for &DeltaRational {
    type Output = DeltaRational;

    fn sub(self, rhs: &DeltaRational) -> DeltaRational {
        DeltaRational::new(&self.real - &rhs.real, &self.delta - &rhs.delta)
    }
}

impl Sub for DeltaRational {
    type Output = DeltaRational;

    fn sub(self, rhs: DeltaRational) -> DeltaRational {
        DeltaRational::new(self.real - rhs.real, self.delta - rhs.delta)
    }
}

impl Neg for DeltaRational {
    type Output = DeltaRational;

    fn neg(self) -> DeltaRational {
        DeltaRational::new(-self.real, -self.delta)
    }
}

impl Neg for &DeltaRational {
    type Output = DeltaRational;

    fn neg(self) -> DeltaRational {
        DeltaRational::new(-self.real.clone(), -self.delta.clone())
    }
}

impl Mul<&BigRational> for &DeltaRational {
    type Output = DeltaRational;

    fn mul(self, rhs: &BigRational) -> DeltaRational {
        self.scale(rhs)
    }
}

impl AddAssign<&DeltaRational> for DeltaRational {
    fn add_assign(&mut self, rhs: &DeltaRational) {
        self.real += &rhs.real;
        self.delta += &rhs.delta;
    }
}

impl SubAssign<&DeltaRational> for DeltaRational {
    fn sub_assign(&mut self, rhs: &DeltaRational) {
        self.real -= &rhs.real;
        self.delta -= &rhs.delta;
    }
}
