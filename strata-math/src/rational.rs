//! Helpers for Exact Rational Arithmetic.

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

/// Fractional part `x - ⌊x⌋`, always in `[0, 1)`.
///
/// Unlike [`BigRational::fract`], this is non-negative for negative inputs.
pub fn fractional_part(value: &BigRational) -> BigRational {
    value - value.floor()
}

/// Distance of `value` to the nearest integer, in `[0, 1/2]`.
pub fn distance_to_integer(value: &BigRational) -> BigRational {
    let frac = fractional_part(value);
    let complement = BigRational::one() - &frac;
    if frac <= complement { frac } else { complement }
}

/// Embed an integer.
pub fn from_int(value: impl Into<BigInt>) -> BigRational {
    BigRational::from_integer(value.into())
}

/// Result of scaling a rational vector to a primitive integer vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegralForm {
    /// Coprime integer coefficients, the first non-zero one positive.
    pub coeffs: Vec<BigInt>,
    /// Factor with `original[i] = factor * coeffs[i]`.
    pub factor: BigRational,
}

/// Scale rational coefficients to coprime integers with a positive leading entry.
///
/// Returns `None` when every coefficient is zero.
pub fn integral_form(coeffs: &[BigRational]) -> Option<IntegralForm> {
    let leading = coeffs.iter().find(|c| !c.is_zero())?;
    let mut denom_lcm = BigInt::one();
    for c in coeffs {
        denom_lcm = denom_lcm.lcm(c.denom());
    }
    let scaled: Vec<BigInt> = coeffs
        .iter()
        .map(|c| (c * BigRational::from_integer(denom_lcm.clone())).to_integer())
        .collect();
    let mut numer_gcd = BigInt::zero();
    for n in &scaled {
        numer_gcd = numer_gcd.gcd(n);
    }
    if leading.is_negative() {
        numer_gcd = -numer_gcd;
    }
    let ints = scaled.iter().map(|n| n / &numer_gcd).collect();
    Some(IntegralForm {
        coeffs: ints,
        factor: BigRational::new(numer_gcd, denom_lcm),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(n: i64, d: i64) -> BigRational {
        BigRational::new(BigInt::from(n), BigInt::from(d))
    }

    #[test]
    fn test_fractional_part_negative() {
        assert_eq!(fractional_part(&q(7, 3)), q(1, 3));
        assert_eq!(fractional_part(&q(-7, 3)), q(2, 3));
        assert_eq!(fractional_part(&q(4, 1)), q(0, 1));
    }

    #[test]
    fn test_distance_to_integer() {
        assert_eq!(distance_to_integer(&q(7, 2)), q(1, 2));
        assert_eq!(distance_to_integer(&q(9, 4)), q(1, 4));
        assert_eq!(distance_to_integer(&q(11, 4)), q(1, 4));
    }

    #[test]
    fn test_integral_form() {
        let form = integral_form(&[q(-1, 2), q(3, 4)]).unwrap();
        assert_eq!(form.coeffs, vec![BigInt::from(2), BigInt::from(-3)]);
        assert_eq!(form.factor, q(-1, 4));

        let form = integral_form(&[q(0, 1), q(6, 1), q(4, 1)]).unwrap();
        assert_eq!(
            form.coeffs,
            vec![BigInt::from(0), BigInt::from(3), BigInt::from(2)]
        );
        assert_eq!(form.factor, q(2, 1));

        assert!(integral_form(&[q(0, 1)]).is_none());
    }
}
