//! Multivariate Polynomials with Exact Rational Coefficients.
//!
//! Polynomials are the left-hand sides of arithmetic constraints. They are
//! kept in a canonical sparse form (ordered map from monomial to non-zero
//! coefficient) so that structural equality and hashing coincide with
//! mathematical equality.

use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use smallvec::SmallVec;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// Arithmetic variable identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(u32);

impl VarId {
    /// Create a variable identifier from its raw index.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw index.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Index usable for vector lookups.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

/// Domain of an arithmetic variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    /// Real-valued.
    Real,
    /// Integer-valued.
    Integer,
}

/// A power product of variables, stored as a sorted multiset.
///
/// The empty monomial is the constant `1`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Monomial(SmallVec<[VarId; 2]>);

impl Monomial {
    /// The constant monomial `1`.
    #[must_use]
    pub fn one() -> Self {
        Self(SmallVec::new())
    }

    /// A single variable.
    #[must_use]
    pub fn var(var: VarId) -> Self {
        let mut vars = SmallVec::new();
        vars.push(var);
        Self(vars)
    }

    /// Total degree.
    pub fn degree(&self) -> usize {
        self.0.len()
    }

    /// Check whether this is the constant monomial.
    pub fn is_one(&self) -> bool {
        self.0.is_empty()
    }

    /// The variable, if this monomial is a single variable of degree one.
    pub fn as_var(&self) -> Option<VarId> {
        if self.0.len() == 1 { Some(self.0[0]) } else { None }
    }

    /// Variables with repetition, in ascending order.
    pub fn vars(&self) -> &[VarId] {
        &self.0
    }

    /// Product of two monomials.
    #[must_use]
    pub fn mul(&self, other: &Monomial) -> Monomial {
        let mut vars: SmallVec<[VarId; 2]> = self.0.iter().chain(other.0.iter()).copied().collect();
        vars.sort_unstable();
        Monomial(vars)
    }
}

impl fmt::Display for Monomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "1");
        }
        for (i, var) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "*")?;
            }
            write!(f, "{var}")?;
        }
        Ok(())
    }
}

/// A polynomial in canonical sparse form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Polynomial {
    /// Monomial -> non-zero coefficient.
    terms: BTreeMap<Monomial, BigRational>,
}

impl Polynomial {
    /// The zero polynomial.
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    /// A constant polynomial.
    #[must_use]
    pub fn constant(value: BigRational) -> Self {
        let mut poly = Self::zero();
        poly.add_term(Monomial::one(), value);
        poly
    }

    /// The polynomial `var`.
    #[must_use]
    pub fn var(var: VarId) -> Self {
        Self::term(BigRational::one(), var)
    }

    /// The polynomial `coeff * var`.
    #[must_use]
    pub fn term(coeff: BigRational, var: VarId) -> Self {
        let mut poly = Self::zero();
        poly.add_term(Monomial::var(var), coeff);
        poly
    }

    /// Build `Σ coeff_i * var_i + constant`.
    #[must_use]
    pub fn linear<I>(terms: I, constant: BigRational) -> Self
    where
        I: IntoIterator<Item = (VarId, BigRational)>,
    {
        let mut poly = Self::constant(constant);
        for (var, coeff) in terms {
            poly.add_term(Monomial::var(var), coeff);
        }
        poly
    }

    /// Add `coeff * mono` in place, keeping the form canonical.
    pub fn add_term(&mut self, mono: Monomial, coeff: BigRational) {
        if coeff.is_zero() {
            return;
        }
        match self.terms.entry(mono) {
            Entry::Vacant(slot) => {
                slot.insert(coeff);
            }
            Entry::Occupied(mut slot) => {
                *slot.get_mut() += coeff;
                if slot.get().is_zero() {
                    slot.remove();
                }
            }
        }
    }

    /// Check whether this is the zero polynomial.
    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// Check whether only a constant term is present.
    pub fn is_constant(&self) -> bool {
        self.terms.keys().all(Monomial::is_one)
    }

    /// Check whether every monomial has degree at most one.
    pub fn is_linear(&self) -> bool {
        self.terms.keys().all(|m| m.degree() <= 1)
    }

    /// Total degree (0 for constants and the zero polynomial).
    pub fn degree(&self) -> usize {
        self.terms.keys().map(Monomial::degree).max().unwrap_or(0)
    }

    /// The constant coefficient.
    pub fn constant_part(&self) -> BigRational {
        self.terms
            .get(&Monomial::one())
            .cloned()
            .unwrap_or_else(BigRational::zero)
    }

    /// Degree-one terms as `(variable, coefficient)` pairs, by ascending variable.
    pub fn linear_terms(&self) -> impl Iterator<Item = (VarId, &BigRational)> {
        self.terms
            .iter()
            .filter_map(|(m, c)| m.as_var().map(|v| (v, c)))
    }

    /// All terms.
    pub fn terms(&self) -> impl Iterator<Item = (&Monomial, &BigRational)> {
        self.terms.iter()
    }

    /// Number of non-zero terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Check whether there are no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Variables occurring in the polynomial.
    pub fn variables(&self) -> BTreeSet<VarId> {
        self.terms
            .keys()
            .flat_map(|m| m.vars().iter().copied())
            .collect()
    }

    /// Multiply by a scalar.
    #[must_use]
    pub fn scale(&self, factor: &BigRational) -> Self {
        if factor.is_zero() {
            return Self::zero();
        }
        Self {
            terms: self
                .terms
                .iter()
                .map(|(m, c)| (m.clone(), c * factor))
                .collect(),
        }
    }

    /// Evaluate under a (possibly partial) assignment.
    ///
    /// Returns `None` when a variable has no value.
    pub fn evaluate<F>(&self, value_of: F) -> Option<BigRational>
    where
        F: Fn(VarId) -> Option<BigRational>,
    {
        let mut sum = BigRational::zero();
        for (mono, coeff) in &self.terms {
            let mut product = coeff.clone();
            for &var in mono.vars() {
                product *= value_of(var)?;
            }
            sum += product;
        }
        Some(sum)
    }
}

impl Add<&Polynomial> for &Polynomial {
    type Output = Polynomial;

    fn add(self, rhs: &Polynomial) -> Polynomial {
        let mut result = self.clone();
        for (mono, coeff) in &rhs.terms {
            result.add_term(mono.clone(), coeff.clone());
        }
        result
    }
}

impl Sub<&Polynomial> for &Polynomial {
    type Output = Polynomial;

    fn sub(self, rhs: &Polynomial) -> Polynomial {
        let mut result = self.clone();
        for (mono, coeff) in &rhs.terms {
            result.add_term(mono.clone(), -coeff.clone());
        }
        result
    }
}

impl Neg for &Polynomial {
    type Output = Polynomial;

    fn neg(self) -> Polynomial {
        self.scale(&-BigRational::one())
    }
}

impl Mul<&Polynomial> for &Polynomial {
    type Output = Polynomial;

    fn mul(self, rhs: &Polynomial) -> Polynomial {
        let mut result = Polynomial::zero();
        for (m1, c1) in &self.terms {
            for (m2, c2) in &rhs.terms {
                result.add_term(m1.mul(m2), c1 * c2);
            }
        }
        result
    }
}

impl fmt::Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "0");
        }
        for (i, (mono, coeff)) in self.terms.iter().rev().enumerate() {
            let magnitude = coeff.abs();
            if i == 0 {
                if coeff.is_negative() {
                    write!(f, "-")?;
                }
            } else if coeff.is_negative() {
                write!(f, " - ")?;
            } else {
                write!(f, " + ")?;
            }
            if mono.is_one() {
                write!(f, "{magnitude}")?;
            } else if magnitude.is_one() {
                write!(f, "{mono}")?;
            } else {
                write!(f, "{magnitude}*{mono}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    fn rat(n: i64) -> BigRational {
        BigRational::from_integer(BigInt::from(n))
    }

    #[test]
    fn test_canonical_form() {
        let x = VarId::new(0);
        let y = VarId::new(1);
        let p = Polynomial::linear([(x, rat(1)), (y, rat(2))], rat(-3));
        let q = Polynomial::linear([(y, rat(2)), (x, rat(1))], rat(-3));
        assert_eq!(p, q);

        let zero = &p - &q;
        assert!(zero.is_zero());
        assert!(zero.is_constant());
    }

    #[test]
    fn test_linearity_and_degree() {
        let x = VarId::new(0);
        let y = VarId::new(1);
        let p = Polynomial::linear([(x, rat(3))], rat(1));
        assert!(p.is_linear());
        assert_eq!(p.degree(), 1);
        assert_eq!(p.constant_part(), rat(1));

        let xy = &Polynomial::var(x) * &Polynomial::var(y);
        assert!(!xy.is_linear());
        assert_eq!(xy.degree(), 2);
        assert_eq!(xy.variables().len(), 2);
    }

    #[test]
    fn test_evaluate() {
        let x = VarId::new(0);
        let y = VarId::new(1);
        let p = &(&Polynomial::var(x) * &Polynomial::var(x)) + &Polynomial::term(rat(-2), y);
        let value = p.evaluate(|v| if v == x { Some(rat(3)) } else { Some(rat(4)) });
        assert_eq!(value, Some(rat(1)));
        assert_eq!(p.evaluate(|v| if v == x { Some(rat(3)) } else { None }), None);
    }

    #[test]
    fn test_display() {
        let x = VarId::new(0);
        let y = VarId::new(1);
        let p = Polynomial::linear([(x, rat(1)), (y, rat(-2))], rat(5));
        assert_eq!(p.to_string(), "-2*x1 + x0 + 5");
    }
}
