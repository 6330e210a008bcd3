//! Property-based tests for push/pop
//!
//! Tests that popping a scope restores the answer of the enclosing scope.

use super::*;
use std::sync::Arc;
use strata_core::{Answer, SolverConfig};
use strata_solver::Manager;

#[cfg(test)]
mod scope_round_trip_properties {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn pop_restores_answer(
            base in prop::collection::vec(linear_spec(), 1..4),
            scoped in prop::collection::vec(linear_spec(), 1..4),
        ) {
            let mut manager = Manager::new(SolverConfig::default()).unwrap();
            let pool = Arc::clone(manager.pool());
            let x = pool.declare_real("x");
            let y = pool.declare_real("y");
            for spec in &base {
                manager.assert(spec.build(&pool, x, y));
            }
            let before = manager.check();

            manager.push();
            for spec in &scoped {
                manager.assert(spec.build(&pool, x, y));
            }
            let inner = manager.check();
            prop_assert_ne!(inner, Answer::Unknown);
            if before == Answer::Unsat {
                prop_assert_eq!(inner, Answer::Unsat);
            }
            manager.pop().unwrap();

            prop_assert_eq!(manager.check(), before);
            prop_assert_eq!(manager.assertions().len(), base.len());
        }
    }
}
