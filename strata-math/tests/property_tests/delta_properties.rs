//! Property-based tests for delta-rationals
//!
//! Tests:
//! - ordering is lexicographic on (real, delta)
//! - strict bounds sit infinitesimally close to their limit
//! - concretisation below the delta limit preserves `<=`

use super::*;
use num_traits::{One, Zero};
use strata_math::DeltaRational;

#[cfg(test)]
mod delta_order_properties {
    use super::*;

    proptest! {
        #[test]
        fn ordering_is_lexicographic(a in rational(), b in rational(), c in rational(), d in rational()) {
            let x = DeltaRational::new(a.clone(), b.clone());
            let y = DeltaRational::new(c.clone(), d.clone());
            prop_assert_eq!(x.cmp(&y), (a, b).cmp(&(c, d)));
        }

        #[test]
        fn strict_bounds_are_infinitesimal(v in rational(), w in rational()) {
            let below = DeltaRational::below(v.clone());
            let exact = DeltaRational::from_rational(v.clone());
            let above = DeltaRational::above(v.clone());
            prop_assert!(below < exact);
            prop_assert!(exact < above);
            // No rational lies strictly between v - δ and v.
            let other = DeltaRational::from_rational(w);
            prop_assert!(!(below < other && other < exact));
        }

        #[test]
        fn concretisation_preserves_order(
            a in rational(), b in rational(), c in rational(), d in rational()
        ) {
            let x = DeltaRational::new(a, b);
            let y = DeltaRational::new(c, d);
            let (lo, hi) = if x <= y { (x, y) } else { (y, x) };
            let delta = match lo.delta_limit(&hi) {
                Some(limit) => limit / BigRational::from_integer(BigInt::from(2)),
                None => BigRational::one(),
            };
            prop_assert!(delta > BigRational::zero());
            prop_assert!(lo.concretize(&delta) <= hi.concretize(&delta));
        }

        #[test]
        fn addition_is_componentwise(a in rational(), b in rational(), c in rational(), d in rational()) {
            let sum = &DeltaRational::new(a.clone(), b.clone()) + &DeltaRational::new(c.clone(), d.clone());
            prop_assert_eq!(sum.real(), &(a + c));
            prop_assert_eq!(sum.delta(), &(b + d));
        }
    }
}
