//! Property-based tests for infeasible subsets
//!
//! Tests that every reported subset:
//! - consists of asserted formulas only
//! - is unsatisfiable on its own

use super::*;
use std::sync::Arc;
use strata_core::{Answer, SolverConfig};
use strata_solver::{Manager, default_factories, default_strategy};

#[cfg(test)]
mod subset_soundness_properties {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn subsets_are_unsatisfiable(specs in prop::collection::vec(linear_spec(), 2..6)) {
            let mut manager = Manager::new(SolverConfig::default()).unwrap();
            let pool = Arc::clone(manager.pool());
            let x = pool.declare_real("x");
            let y = pool.declare_real("y");
            for spec in &specs {
                manager.assert(spec.build(&pool, x, y));
            }
            if manager.check() != Answer::Unsat {
                return Ok(());
            }

            let subset = manager.infeasible_subset().unwrap();
            prop_assert!(!subset.is_empty());
            prop_assert!(subset.iter().all(|f| manager.assertions().contains(f)));

            let mut alone = Manager::with_pool(
                Arc::clone(&pool),
                SolverConfig::default(),
                default_strategy().unwrap(),
                default_factories(),
            )
            .unwrap();
            for formula in &subset {
                alone.assert(formula.clone());
            }
            prop_assert_eq!(alone.check(), Answer::Unsat);
        }

        #[test]
        fn contradicting_bounds_form_the_subset(a in -10i64..10, b in -10i64..10) {
            prop_assume!(a > b);
            let mut manager = Manager::new(SolverConfig::default()).unwrap();
            let pool = Arc::clone(manager.pool());
            let x = pool.declare_real("x");
            let y = pool.declare_real("y");
            let lower = Formula::from(pool.linear(&[(x, 1)], Relation::Geq, a).unwrap());
            let upper = Formula::from(pool.linear(&[(x, 1)], Relation::Leq, b).unwrap());
            let other = Formula::from(pool.linear(&[(y, 1)], Relation::Geq, a).unwrap());
            manager.assert(lower.clone());
            manager.assert(other.clone());
            manager.assert(upper.clone());

            prop_assert_eq!(manager.check(), Answer::Unsat);
            let subset = manager.infeasible_subset().unwrap();
            prop_assert!(subset.contains(&lower));
            prop_assert!(subset.contains(&upper));
            prop_assert!(!subset.contains(&other));
        }
    }
}
