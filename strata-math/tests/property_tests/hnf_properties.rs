//! Property-based tests for integer normal forms
//!
//! Tests:
//! - extended Euclid satisfies Bezout's identity
//! - primitive integer forms are coprime and rescale to the input
//! - `H⁻¹·(A·x)` is integral for every integral `x`

use super::*;
use num_integer::Integer;
use num_traits::{Signed, Zero};
use strata_math::{extended_gcd, hermite_normal_form, integral_form, solve_lower_triangular};

fn ints(values: &[i64]) -> Vec<BigInt> {
    values.iter().map(|&v| BigInt::from(v)).collect()
}

#[cfg(test)]
mod gcd_properties {
    use super::*;

    proptest! {
        #[test]
        fn bezout_identity(a in -1000i64..1000, b in -1000i64..1000) {
            let (a, b) = (BigInt::from(a), BigInt::from(b));
            let (g, s, t) = extended_gcd(&a, &b);
            prop_assert!(!g.is_negative());
            prop_assert_eq!(&s * &a + &t * &b, g.clone());
            prop_assert_eq!(g, a.gcd(&b));
        }

        #[test]
        fn integral_form_is_primitive(coeffs in prop::collection::vec(rational(), 1..5)) {
            prop_assume!(coeffs.iter().any(|c| !c.is_zero()));
            let form = integral_form(&coeffs).unwrap();
            let gcd = form.coeffs.iter().fold(BigInt::zero(), |acc, c| acc.gcd(c));
            prop_assert_eq!(gcd, BigInt::from(1));
            let leading = form.coeffs.iter().find(|c| !c.is_zero()).unwrap();
            prop_assert!(leading.is_positive());
            for (original, scaled) in coeffs.iter().zip(&form.coeffs) {
                prop_assert_eq!(original, &(&form.factor * BigRational::from_integer(scaled.clone())));
            }
        }
    }
}

#[cfg(test)]
mod hermite_properties {
    use super::*;

    proptest! {
        #[test]
        fn hnf_is_lower_triangular(rows in prop::collection::vec(prop::collection::vec(-6i64..6, 3), 2)) {
            let matrix: Vec<Vec<BigInt>> = rows.iter().map(|r| ints(r)).collect();
            let Some(h) = hermite_normal_form(&matrix) else {
                return Ok(());
            };
            for (i, row) in h.iter().enumerate() {
                prop_assert!(row[i].is_positive());
                for (k, entry) in row.iter().enumerate() {
                    if k > i {
                        prop_assert!(entry.is_zero());
                    } else if k < i {
                        prop_assert!(!entry.is_negative() && entry < &row[i]);
                    }
                }
            }
        }

        #[test]
        fn integral_points_give_integral_hnf_solutions(
            rows in prop::collection::vec(prop::collection::vec(-6i64..6, 3), 2),
            point in prop::collection::vec(-5i64..5, 3),
        ) {
            let matrix: Vec<Vec<BigInt>> = rows.iter().map(|r| ints(r)).collect();
            let Some(h) = hermite_normal_form(&matrix) else {
                return Ok(());
            };
            let x = ints(&point);
            let b: Vec<BigRational> = matrix
                .iter()
                .map(|row| {
                    let dot = row.iter().zip(&x).fold(BigInt::zero(), |acc, (a, v)| acc + a * v);
                    BigRational::from_integer(dot)
                })
                .collect();
            for value in solve_lower_triangular(&h, &b) {
                prop_assert!(value.is_integer());
            }
        }
    }
}
