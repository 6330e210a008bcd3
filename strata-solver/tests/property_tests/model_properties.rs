//! Property-based tests for model validity
//!
//! Tests that:
//! - real problems are always decided
//! - models satisfy every assertion exactly
//! - integer variables receive integral values

use super::*;
use std::sync::Arc;
use strata_core::{Answer, SolverConfig};
use strata_solver::Manager;

#[cfg(test)]
mod model_validity_properties {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn real_models_satisfy_assertions(specs in prop::collection::vec(linear_spec(), 1..5)) {
            let mut manager = Manager::new(SolverConfig::default()).unwrap();
            let pool = Arc::clone(manager.pool());
            let x = pool.declare_real("x");
            let y = pool.declare_real("y");
            for spec in &specs {
                manager.assert(spec.build(&pool, x, y));
            }

            let answer = manager.check();
            prop_assert_ne!(answer, Answer::Unknown);
            if answer == Answer::Sat {
                let model = manager.model().unwrap();
                for formula in manager.assertions() {
                    prop_assert_eq!(formula.evaluate(model), Some(true));
                }
            }
        }

        #[test]
        fn integer_models_are_integral(
            specs in prop::collection::vec(linear_spec(), 1..3),
            lo in -3i64..=0,
            hi in 0i64..=3,
        ) {
            let mut manager = Manager::new(SolverConfig::integer()).unwrap();
            let pool = Arc::clone(manager.pool());
            let x = pool.declare_int("x");
            let y = pool.declare_int("y");
            for v in [x, y] {
                manager.assert(Formula::from(pool.linear(&[(v, 1)], Relation::Geq, lo).unwrap()));
                manager.assert(Formula::from(pool.linear(&[(v, 1)], Relation::Leq, hi).unwrap()));
            }
            for spec in &specs {
                manager.assert(spec.build(&pool, x, y));
            }

            let answer = manager.check();
            prop_assert_ne!(answer, Answer::Unknown);
            if answer == Answer::Sat {
                let model = manager.model().unwrap();
                prop_assert!(model.arith(x).unwrap().is_integer());
                prop_assert!(model.arith(y).unwrap().is_integer());
                for formula in manager.assertions() {
                    prop_assert_eq!(formula.evaluate(model), Some(true));
                }
            }
        }
    }
}
