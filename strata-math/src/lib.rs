//! Strata Math - Exact Arithmetic Support for the Strata SMT Solver
//!
//! This crate provides the numeric building blocks of the arithmetic
//! decision procedures:
//! - [`DeltaRational`]: rationals with an infinitesimal part, used to treat
//!   strict and non-strict bounds uniformly in the Simplex engine
//! - rational helpers (fractional parts, primitive integer forms)
//! - Hermite normal forms for cuts from proofs
//!
//! # Examples
//!
//! ```
//! use num_bigint::BigInt;
//! use num_rational::BigRational;
//! use strata_math::DeltaRational;
//!
//! let five = BigRational::from_integer(BigInt::from(5));
//! // x < 5 is x <= 5 - δ
//! let strict = DeltaRational::below(five.clone());
//! assert!(strict < DeltaRational::from_rational(five));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod delta;
pub mod hnf;
pub mod rational;

pub use delta::DeltaRational;
pub use hnf::{extended_gcd, hermite_normal_form, inverse_row, solve_lower_triangular};
pub use rational::{IntegralForm, distance_to_integer, fractional_part, from_int, integral_form};
