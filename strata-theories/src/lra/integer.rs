//! Integer Reasoning on Top of the Simplex Tableau.
//!
//! Once the relaxation is feasible, integer variables with fractional values
//! are handled by emitting lemmas back to the SAT layer:
//! - branching: `x <= ⌊v⌋ ∨ x >= ⌈v⌉`
//! - Gomory mixed-integer cuts derived from a tableau row, guarded by the
//!   negated origins of the bounds the row sits on
//! - cuts from proofs: a Hermite normal form of the tight integer
//!   constraints exposes a linear combination that cannot be integral
//!
//! ## References
//!
//! - Gomory (1960): "An algorithm for the mixed integer problem"
//! - Dillig, Dillig & Aiken (2009): "Cuts from Proofs: A Complete and
//!   Practical Technique for Solving Linear Inequalities over Integers"

use super::bound::BoundId;
use super::tableau::Tableau;
use super::variable::VariableId;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use rustc_hash::FxHashSet;
use std::collections::{BTreeMap, BTreeSet};
use strata_core::{BranchingStrategy, ConstraintPool, Formula, Polynomial, Relation, Result, VarId};
use strata_math::{distance_to_integer, fractional_part, hermite_normal_form, integral_form, inverse_row, solve_lower_triangular};
use tracing::{debug, trace};

/// An integer variable whose relaxed value is fractional.
#[derive(Debug, Clone)]
pub struct IntegerCandidate {
    /// Input variable.
    pub var: VarId,
    /// Tableau variable.
    pub column: VariableId,
    /// Relaxed value.
    pub value: BigRational,
}

/// Integer variables with a fractional relaxed value, by variable.
pub fn fractional_candidates(tableau: &Tableau, values: &BTreeMap<VarId, BigRational>) -> Vec<IntegerCandidate> {
    values
        .iter()
        .filter(|(_, value)| !value.is_integer())
        .filter_map(|(var, value)| {
            let column = tableau.original(*var)?;
            tableau.variable(column).is_integer().then(|| IntegerCandidate {
                var: *var,
                column,
                value: value.clone(),
            })
        })
        .collect()
}

/// Pick the candidate to branch or cut on.
pub fn select_candidate<'a>(
    tableau: &Tableau,
    candidates: &'a [IntegerCandidate],
    strategy: BranchingStrategy,
) -> Option<&'a IntegerCandidate> {
    match strategy {
        BranchingStrategy::FirstFound => candidates.first(),
        BranchingStrategy::MinPivotCount => candidates
            .iter()
            .min_by_key(|c| tableau.variable(c.column).pivot_count()),
        BranchingStrategy::MostFractional => candidates
            .iter()
            .max_by(|a, b| distance_to_integer(&a.value).cmp(&distance_to_integer(&b.value)).then(b.var.cmp(&a.var))),
        BranchingStrategy::LeastFractional => candidates
            .iter()
            .min_by(|a, b| distance_to_integer(&a.value).cmp(&distance_to_integer(&b.value)).then(a.var.cmp(&b.var))),
    }
}

/// `x <= ⌊v⌋ ∨ x >= ⌈v⌉`.
///
/// # Errors
///
/// Propagates pool errors for undeclared variables.
pub fn branch_lemma(pool: &ConstraintPool, var: VarId, value: &BigRational) -> Result<Formula> {
    let one = BigRational::one();
    let below = pool.linear_rational(&[(var, one.clone())], Relation::Leq, value.floor())?;
    let above = pool.linear_rational(&[(var, one)], Relation::Geq, value.ceil())?;
    trace!(%var, %value, "branch lemma");
    Ok(Formula::mk_or(vec![Formula::from(below), Formula::from(above)]))
}

/// Gomory mixed-integer cut from the row of a basic integer variable.
///
/// Applies when the basic variable has a fractional, infinitesimal-free value
/// and every non-basic variable of its row sits exactly on an active bound
/// without infinitesimal part (integral for integer variables). The returned
/// lemma is `¬o_1 ∨ … ∨ ¬o_k ∨ cut` where `o_i` are the origins of those
/// bounds.
///
/// # Errors
///
/// Propagates pool errors for undeclared variables.
pub fn gomory_cut(tableau: &Tableau, pool: &ConstraintPool, basic: VariableId) -> Result<Option<Formula>> {
    let Some(row) = tableau.row(basic) else {
        return Ok(None);
    };
    let beta = tableau.variable(basic).assignment();
    if !tableau.variable(basic).is_integer() || !beta.is_rational() || beta.is_integer() {
        return Ok(None);
    }
    let f0 = fractional_part(beta.real());
    let one = BigRational::one();

    let mut cut = Polynomial::zero();
    let mut premises: Vec<BoundId> = Vec::with_capacity(row.len());
    for (col, coeff) in row {
        let var = tableau.variable(*col);
        let value = var.assignment();
        let at_lower = tableau
            .inf(*col)
            .filter(|b| tableau.bound(*b).limit() == value);
        let at_upper = tableau
            .sup(*col)
            .filter(|b| tableau.bound(*b).limit() == value);
        let Some((bound, lower)) = at_lower.map(|b| (b, true)).or(at_upper.map(|b| (b, false))) else {
            return Ok(None);
        };
        let limit = tableau.bound(bound).limit();
        if !limit.is_rational() || (var.is_integer() && !limit.is_integer()) {
            return Ok(None);
        }
        // basic = β + Σ c_j y_j, with y_j >= 0 the distance of x_j to its bound
        let c = if lower { coeff.clone() } else { -coeff };
        let a_bar = -c;
        let g = if var.is_integer() {
            let fj = fractional_part(&a_bar);
            if fj <= f0 {
                fj / &f0
            } else {
                (&one - fj) / (&one - &f0)
            }
        } else if !a_bar.is_negative() {
            a_bar / &f0
        } else {
            -a_bar / (&one - &f0)
        };
        premises.push(bound);
        if g.is_zero() {
            continue;
        }
        let x = tableau.variable_poly(*col);
        let y = if lower {
            &x - &Polynomial::constant(limit.real().clone())
        } else {
            &Polynomial::constant(limit.real().clone()) - &x
        };
        cut = &cut + &y.scale(&g);
    }
    cut = &cut - &Polynomial::constant(one);
    if cut.is_constant() {
        return Ok(None);
    }

    let cut = pool.constraint(cut, Relation::Geq)?;
    let mut clause: Vec<Formula> = premises
        .iter()
        .filter_map(|b| tableau.bound(*b).first_origin())
        .map(|o| Formula::mk_not(o.clone()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    debug!(cut = %pool.describe(&cut), premises = premises.len(), "gomory cut");
    clause.push(Formula::from(cut));
    Ok(Some(Formula::mk_or(clause)))
}

/// A tight integer constraint `a · x = b`.
#[derive(Debug, Clone)]
struct DefiningConstraint {
    coeffs: BTreeMap<VarId, BigInt>,
    rhs: BigRational,
}

fn defining_constraints(tableau: &Tableau) -> Vec<DefiningConstraint> {
    let mut defining = Vec::new();
    for id in tableau.variables() {
        let var = tableau.variable(id);
        if !var.is_integer() {
            continue;
        }
        let value = var.assignment();
        let tight = [tableau.inf(id), tableau.sup(id)]
            .into_iter()
            .flatten()
            .map(|b| tableau.bound(b).limit())
            .any(|limit| limit == value && limit.is_rational());
        if !tight {
            continue;
        }
        let coeffs = var
            .as_polynomial()
            .linear_terms()
            .map(|(v, c)| (v, c.to_integer()))
            .collect();
        defining.push(DefiningConstraint {
            coeffs,
            rhs: value.real().clone(),
        });
    }
    defining
}

/// Matrices (with right-hand sides) for which a cut was already attempted.
pub type ProcessedMatrices = FxHashSet<(Vec<Vec<BigInt>>, Vec<BigRational>)>;

/// Cut from proofs over the tight integer constraints.
///
/// Returns `None` if no new proof of non-integrality exists; the caller then
/// falls back to branching.
///
/// # Errors
///
/// Propagates pool errors for undeclared variables.
pub fn cut_from_proofs(
    tableau: &Tableau,
    pool: &ConstraintPool,
    processed: &mut ProcessedMatrices,
) -> Result<Option<Formula>> {
    let defining = defining_constraints(tableau);
    let vars: Vec<VarId> = defining
        .iter()
        .flat_map(|d| d.coeffs.keys().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if vars.is_empty() {
        return Ok(None);
    }

    // Greedily keep a full-row-rank subset.
    let mut matrix: Vec<Vec<BigInt>> = Vec::new();
    let mut rhs: Vec<BigRational> = Vec::new();
    let mut hnf = None;
    for constraint in &defining {
        if matrix.len() == vars.len() {
            break;
        }
        let row: Vec<BigInt> = vars
            .iter()
            .map(|v| constraint.coeffs.get(v).cloned().unwrap_or_else(BigInt::zero))
            .collect();
        matrix.push(row);
        match hermite_normal_form(&matrix) {
            Some(h) => {
                rhs.push(constraint.rhs.clone());
                hnf = Some(h);
            }
            None => {
                matrix.pop();
            }
        }
    }
    let Some(h) = hnf else {
        return Ok(None);
    };
    if !processed.insert((matrix.clone(), rhs.clone())) {
        trace!(rows = matrix.len(), "defining matrix already processed");
        return Ok(None);
    }

    let solution = solve_lower_triangular(&h, &rhs);
    let Some(i) = solution.iter().position(|y| !y.is_integer()) else {
        return Ok(None);
    };
    let r = inverse_row(&h, i);

    // c = r · A is integral, d = r · b = y_i is not.
    let mut c = vec![BigRational::zero(); vars.len()];
    for (rk, row) in r.iter().zip(&matrix) {
        for (cj, a) in c.iter_mut().zip(row) {
            *cj += rk * BigRational::from_integer(a.clone());
        }
    }
    let Some(form) = integral_form(&c) else {
        return Ok(None);
    };
    let d = &solution[i] / &form.factor;
    if d.is_integer() {
        return Ok(None);
    }
    let terms: Vec<(VarId, BigRational)> = vars
        .iter()
        .zip(&form.coeffs)
        .filter(|(_, k)| !k.is_zero())
        .map(|(v, k)| (*v, BigRational::from_integer(k.clone())))
        .collect();
    let below = pool.linear_rational(&terms, Relation::Leq, d.floor())?;
    let above = pool.linear_rational(&terms, Relation::Geq, d.ceil())?;
    debug!(below = %pool.describe(&below), above = %pool.describe(&above), "cut from proofs");
    Ok(Some(Formula::mk_or(vec![Formula::from(below), Formula::from(above)])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lra::tableau::PivotDecision;
    use std::sync::Arc;
    use strata_core::Constraint;

    fn rat(n: i64, d: i64) -> BigRational {
        BigRational::new(BigInt::from(n), BigInt::from(d))
    }

    fn assert_all(tableau: &mut Tableau, constraints: &[&Arc<Constraint>], pool: &ConstraintPool) {
        for c in constraints {
            tableau.new_bound(c, pool).unwrap();
            let origin = Formula::from(Arc::clone(c));
            for bound in tableau.bounds_of(c.id()).to_vec() {
                assert!(tableau.activate_bound(bound, origin.clone()).is_none());
            }
        }
        loop {
            match tableau.next_pivoting_element(false) {
                PivotDecision::Pivot { row, column } => tableau.pivot(row, column),
                PivotDecision::Feasible => break,
                PivotDecision::Conflict { .. } => panic!("unexpected conflict"),
            }
        }
    }

    #[test]
    fn test_branch_lemma() {
        let pool = ConstraintPool::new();
        let x = pool.declare_int("x");
        let lemma = branch_lemma(&pool, x, &rat(7, 2)).unwrap();
        assert_eq!(lemma.atoms().len(), 2);
        let mut model = strata_core::Model::new();
        model.set_arith(x, rat(3, 1));
        assert_eq!(lemma.evaluate(&model), Some(true));
        model.set_arith(x, rat(7, 2));
        assert_eq!(lemma.evaluate(&model), Some(false));
    }

    #[test]
    fn test_candidate_selection() {
        let pool = ConstraintPool::new();
        let x = pool.declare_int("x");
        let y = pool.declare_int("y");
        let mut tableau = Tableau::new();
        tableau.ensure_original(x, true);
        tableau.ensure_original(y, true);
        let values = BTreeMap::from([(x, rat(1, 2)), (y, rat(9, 10))]);
        let candidates = fractional_candidates(&tableau, &values);
        assert_eq!(candidates.len(), 2);
        let most = select_candidate(&tableau, &candidates, BranchingStrategy::MostFractional).unwrap();
        assert_eq!(most.var, x);
        let least = select_candidate(&tableau, &candidates, BranchingStrategy::LeastFractional).unwrap();
        assert_eq!(least.var, y);
        let first = select_candidate(&tableau, &candidates, BranchingStrategy::FirstFound).unwrap();
        assert_eq!(first.var, x);
    }

    #[test]
    fn test_gomory_cut_on_fractional_row() {
        let pool = ConstraintPool::new();
        let x = pool.declare_int("x");
        let z = pool.declare_real("z");
        let mut tableau = Tableau::new();
        // x - z/2 ... with z fixed at 1: x = z/2 relaxed to 1/2
        let link = pool
            .linear_rational(&[(x, rat(1, 1)), (z, rat(-1, 2))], Relation::Leq, rat(0, 1))
            .unwrap();
        let link_low = pool
            .linear_rational(&[(x, rat(1, 1)), (z, rat(-1, 2))], Relation::Geq, rat(0, 1))
            .unwrap();
        let z_low = pool.linear(&[(z, 1)], Relation::Geq, 1).unwrap();
        let z_up = pool.linear(&[(z, 1)], Relation::Leq, 1).unwrap();
        assert_all(&mut tableau, &[&link, &link_low, &z_low, &z_up], &pool);

        let values = tableau.rational_assignment();
        assert_eq!(values[&x], rat(1, 2));
        let column = tableau.original(x).unwrap();
        assert!(tableau.variable(column).is_basic());

        let lemma = gomory_cut(&tableau, &pool, column).unwrap().expect("cut");
        // The relaxed point violates the clause.
        let mut model = strata_core::Model::new();
        model.set_arith(x, rat(1, 2));
        model.set_arith(z, rat(1, 1));
        assert_eq!(lemma.evaluate(&model), Some(false));
    }

    #[test]
    fn test_cut_from_proofs() {
        let pool = ConstraintPool::new();
        let x = pool.declare_int("x");
        let y = pool.declare_int("y");
        let mut tableau = Tableau::new();
        // x + y = 3, x - y = 0 over the reals gives x = y = 3/2
        let sum = pool.linear(&[(x, 1), (y, 1)], Relation::Eq, 3).unwrap();
        let diff = pool.linear(&[(x, 1), (y, -1)], Relation::Eq, 0).unwrap();
        assert_all(&mut tableau, &[&sum, &diff], &pool);

        let mut processed = ProcessedMatrices::default();
        let lemma = cut_from_proofs(&tableau, &pool, &mut processed)
            .unwrap()
            .expect("cut");
        let mut model = strata_core::Model::new();
        model.set_arith(x, rat(3, 2));
        model.set_arith(y, rat(3, 2));
        assert_eq!(lemma.evaluate(&model), Some(false));
        // Same matrix again: no new cut.
        assert!(cut_from_proofs(&tableau, &pool, &mut processed).unwrap().is_none());
    }
}
