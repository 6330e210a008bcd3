//! Hermite Normal Form over the Integers.
//!
//! Used by the cuts-from-proofs procedure: for an integer matrix `A` of full
//! row rank, column operations with unimodular matrices yield `A·U = [H 0]`
//! with `H` lower triangular. The system `A·x = b` has an integral solution iff
//! `H⁻¹·b` is integral, and any row `r` of `H⁻¹` gives an integral
//! combination `r·A` whose right-hand side `r·b` is fractional when that
//! solution component is fractional.
//!
//! ## References
//!
//! - Dillig, Dillig & Aiken (2009): "Cuts from Proofs: A Complete and
//!   Practical Technique for Solving Linear Inequalities over Integers"
//! - Cohen (1993): "A Course in Computational Algebraic Number Theory", §2.4

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

/// Extended Euclid: returns `(g, s, t)` with `s·a + t·b = g` and `g >= 0`.
pub fn extended_gcd(a: &BigInt, b: &BigInt) -> (BigInt, BigInt, BigInt) {
    let (mut old_r, mut r) = (a.clone(), b.clone());
    let (mut old_s, mut s) = (BigInt::one(), BigInt::zero());
    let (mut old_t, mut t) = (BigInt::zero(), BigInt::one());
    while !r.is_zero() {
        let q = &old_r / &r;
        let next_r = &old_r - &q * &r;
        old_r = std::mem::replace(&mut r, next_r);
        let next_s = &old_s - &q * &s;
        old_s = std::mem::replace(&mut s, next_s);
        let next_t = &old_t - &q * &t;
        old_t = std::mem::replace(&mut t, next_t);
    }
    if old_r.is_negative() {
        (-old_r, -old_s, -old_t)
    } else {
        (old_r, old_s, old_t)
    }
}

/// Compute the lower-triangular Hermite normal form of an `m × n` matrix.
///
/// Returns the leading `m × m` block `H` (positive diagonal, off-diagonal
/// entries reduced modulo the diagonal) or `None` when the matrix is empty,
/// ragged, has more rows than columns, or is not of full row rank.
pub fn hermite_normal_form(matrix: &[Vec<BigInt>]) -> Option<Vec<Vec<BigInt>>> {
    let m = matrix.len();
    let n = matrix.first()?.len();
    if m > n || matrix.iter().any(|row| row.len() != n) {
        return None;
    }

    let mut a = matrix.to_vec();
    for i in 0..m {
        for j in (i + 1)..n {
            if a[i][j].is_zero() {
                continue;
            }
            let (g, s, t) = extended_gcd(&a[i][i], &a[i][j]);
            let u = &a[i][i] / &g;
            let v = &a[i][j] / &g;
            // Unimodular: det [[s, -v], [t, u]] = (s·a_ii + t·a_ij) / g = 1
            for row in a.iter_mut() {
                let ci = row[i].clone();
                let cj = row[j].clone();
                row[i] = &s * &ci + &t * &cj;
                row[j] = &u * &cj - &v * &ci;
            }
        }
        if a[i][i].is_zero() {
            return None;
        }
        if a[i][i].is_negative() {
            for row in a.iter_mut() {
                row[i] = -row[i].clone();
            }
        }
        for k in 0..i {
            let q = a[i][k].div_floor(&a[i][i]);
            if q.is_zero() {
                continue;
            }
            for row in a.iter_mut() {
                let reduced = &row[k] - &q * &row[i];
                row[k] = reduced;
            }
        }
    }

    Some(a.into_iter().map(|row| row[..m].to_vec()).collect())
}

/// Solve `H·x = b` for lower-triangular `H` with non-zero diagonal.
pub fn solve_lower_triangular(h: &[Vec<BigInt>], b: &[BigRational]) -> Vec<BigRational> {
    let mut x: Vec<BigRational> = Vec::with_capacity(b.len());
    for (i, rhs) in b.iter().enumerate() {
        let mut acc = rhs.clone();
        for (k, xk) in x.iter().enumerate() {
            acc -= BigRational::from_integer(h[i][k].clone()) * xk;
        }
        x.push(acc / BigRational::from_integer(h[i][i].clone()));
    }
    x
}

/// Row `i` of `H⁻¹` for lower-triangular `H` with non-zero diagonal.
pub fn inverse_row(h: &[Vec<BigInt>], i: usize) -> Vec<BigRational> {
    let m = h.len();
    // Column j of H⁻¹ solves H·c = e_j; we only keep its i-th entry.
    (0..m)
        .map(|j| {
            let unit: Vec<BigRational> = (0..m)
                .map(|k| {
                    if k == j {
                        BigRational::one()
                    } else {
                        BigRational::zero()
                    }
                })
                .collect();
            solve_lower_triangular(h, &unit).swap_remove(i)
        })
        .collect()
}
