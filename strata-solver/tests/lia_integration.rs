//! LIA (Linear Integer Arithmetic) Integration Tests
//!
//! These tests run integer problems through the full pipeline under each
//! integrality strategy: branch-and-bound, Gomory cuts and cuts from proofs.

use num_rational::BigRational;
use std::sync::Arc;
use strata_core::{
    Answer, BranchingStrategy, ConstraintPool, Formula, IntegerStrategy, LraConfig, Relation,
    SolverConfig, VarId,
};
use strata_solver::Manager;

const STRATEGIES: [IntegerStrategy; 3] = [
    IntegerStrategy::BranchAndBound,
    IntegerStrategy::GomoryCuts,
    IntegerStrategy::CutsFromProofs,
];

fn manager(strategy: IntegerStrategy) -> Manager {
    let lra = LraConfig::default().with_integer_strategy(strategy);
    Manager::new(SolverConfig::default().with_lra(lra)).unwrap()
}

fn linear(pool: &ConstraintPool, terms: &[(VarId, i64)], relation: Relation, rhs: i64) -> Formula {
    Formula::from(pool.linear(terms, relation, rhs).unwrap())
}

/// Test GCD-based infeasibility for equality constraints
///
/// For 2x + 2y = 7 the coefficients share the factor 2 while 7 is odd, so no
/// integer solution exists. The rounded bounds of the slack `x + y` already
/// conflict, without any branching.
#[test]
fn test_lia_gcd_infeasibility() {
    for strategy in STRATEGIES {
        let mut manager = manager(strategy);
        let pool = Arc::clone(manager.pool());
        let x = pool.declare_int("x");
        let y = pool.declare_int("y");
        manager.assert(linear(&pool, &[(x, 2), (y, 2)], Relation::Eq, 7));
        manager.assert(linear(&pool, &[(x, 1)], Relation::Geq, 0));
        manager.assert(linear(&pool, &[(y, 1)], Relation::Geq, 0));

        assert_eq!(manager.check(), Answer::Unsat, "{strategy:?}");
        let subset = manager.infeasible_subset().unwrap();
        assert_eq!(subset.len(), 1, "{strategy:?}");
    }
}

/// x + y = 3 and x - y = 0 force x = y = 3/2 over the rationals.
#[test]
fn test_lia_fractional_vertex() {
    for strategy in STRATEGIES {
        let mut manager = manager(strategy);
        let pool = Arc::clone(manager.pool());
        let x = pool.declare_int("x");
        let y = pool.declare_int("y");
        manager.assert(linear(&pool, &[(x, 1), (y, 1)], Relation::Eq, 3));
        manager.assert(linear(&pool, &[(x, 1), (y, -1)], Relation::Eq, 0));

        assert_eq!(manager.check(), Answer::Unsat, "{strategy:?}");
        assert_eq!(manager.infeasible_subset().unwrap().len(), 2, "{strategy:?}");
    }
}

/// 3x + 2y = 7 with 0 <= x, y <= 5 has the integer solution x = 1, y = 2.
#[test]
fn test_lia_finds_integer_point() {
    for strategy in STRATEGIES {
        let mut manager = manager(strategy);
        let pool = Arc::clone(manager.pool());
        let x = pool.declare_int("x");
        let y = pool.declare_int("y");
        manager.assert(linear(&pool, &[(x, 3), (y, 2)], Relation::Eq, 7));
        for v in [x, y] {
            manager.assert(linear(&pool, &[(v, 1)], Relation::Geq, 0));
            manager.assert(linear(&pool, &[(v, 1)], Relation::Leq, 5));
        }

        assert_eq!(manager.check(), Answer::Sat, "{strategy:?}");
        let model = manager.model().unwrap();
        for formula in manager.assertions() {
            assert_eq!(formula.evaluate(model), Some(true), "{strategy:?}");
        }
        assert!(model.arith(x).unwrap().is_integer());
        assert!(model.arith(y).unwrap().is_integer());
    }
}

/// Mixed problem: only `n` is integral, `r` may stay fractional.
#[test]
fn test_lia_mixed_integer() {
    let mut manager = manager(IntegerStrategy::GomoryCuts);
    let pool = Arc::clone(manager.pool());
    let n = pool.declare_int("n");
    let r = pool.declare_real("r");
    // 2n = r, 1 <= r <= 3
    manager.assert(linear(&pool, &[(n, 2), (r, -1)], Relation::Eq, 0));
    manager.assert(linear(&pool, &[(r, 1)], Relation::Geq, 1));
    manager.assert(linear(&pool, &[(r, 1)], Relation::Leq, 3));
    assert_eq!(manager.check(), Answer::Sat);
    let model = manager.model().unwrap();
    assert!(model.arith(n).unwrap().is_integer());
    assert_eq!(model.arith(r).unwrap(), &(model.arith(n).unwrap() * BigRational::from_integer(2.into())));

    // r != 2 removes the only integer choice n = 1
    manager.push();
    manager.assert(linear(&pool, &[(r, 1)], Relation::Neq, 2));
    assert_eq!(manager.check(), Answer::Unsat);
    manager.pop().unwrap();
    assert_eq!(manager.check(), Answer::Sat);
}

/// Every branching heuristic reaches the same verdict on bounded problems.
#[test]
fn test_lia_branching_heuristics() {
    for branching in [
        BranchingStrategy::MinPivotCount,
        BranchingStrategy::MostFractional,
        BranchingStrategy::LeastFractional,
        BranchingStrategy::FirstFound,
    ] {
        let lra = LraConfig::default().with_branching(branching);
        let mut manager = Manager::new(SolverConfig::default().with_lra(lra)).unwrap();
        let pool = Arc::clone(manager.pool());
        let x = pool.declare_int("x");
        let y = pool.declare_int("y");
        for v in [x, y] {
            manager.assert(linear(&pool, &[(v, 1)], Relation::Geq, 0));
            manager.assert(linear(&pool, &[(v, 1)], Relation::Leq, 3));
        }

        // 3x - 2y = 1 has the point x = 1, y = 1
        manager.push();
        manager.assert(linear(&pool, &[(x, 3), (y, -2)], Relation::Eq, 1));
        assert_eq!(manager.check(), Answer::Sat, "{branching:?}");
        let model = manager.model().unwrap();
        assert!(manager.assertions().iter().all(|f| f.evaluate(model) == Some(true)));
        manager.pop().unwrap();

        // 2x + 3y = 1 has none in the box
        manager.assert(linear(&pool, &[(x, 2), (y, 3)], Relation::Eq, 1));
        assert_eq!(manager.check(), Answer::Unsat, "{branching:?}");
        let subset = manager.infeasible_subset().unwrap();
        assert!(subset.iter().all(|f| manager.assertions().contains(f)));
    }
}
