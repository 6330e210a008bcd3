//! Property-based tests for strata-math
//!
//! Algebraic laws of delta-rationals, primitive integer forms and Hermite
//! normal forms.

mod delta_properties;
mod hnf_properties;

use num_bigint::BigInt;
use num_rational::BigRational;
use proptest::prelude::*;

pub fn rational() -> impl Strategy<Value = BigRational> {
    (-50i64..50, 1i64..8).prop_map(|(n, d)| BigRational::new(BigInt::from(n), BigInt::from(d)))
}
