//! Property-based tests for strata-solver
//!
//! Random linear problems are decided through the default pipeline and the
//! answers are checked against their certificates.

mod model_properties;
mod scope_properties;
mod subset_properties;

use proptest::prelude::*;
use strata_core::{ConstraintPool, Formula, Relation, VarId};

/// A random linear constraint over two variables.
#[derive(Debug, Clone)]
pub struct LinearSpec {
    pub coeffs: (i64, i64),
    pub relation: Relation,
    pub rhs: i64,
}

impl LinearSpec {
    pub fn build(&self, pool: &ConstraintPool, x: VarId, y: VarId) -> Formula {
        let terms = [(x, self.coeffs.0), (y, self.coeffs.1)];
        Formula::from(pool.linear(&terms, self.relation, self.rhs).unwrap())
    }
}

pub fn relation() -> impl Strategy<Value = Relation> {
    prop_oneof![
        Just(Relation::Leq),
        Just(Relation::Geq),
        Just(Relation::Less),
        Just(Relation::Greater),
        Just(Relation::Eq),
    ]
}

pub fn linear_spec() -> impl Strategy<Value = LinearSpec> {
    ((-3i64..=3, -3i64..=3), relation(), -6i64..=6)
        .prop_filter("non-constant", |((a, b), _, _)| *a != 0 || *b != 0)
        .prop_map(|(coeffs, relation, rhs)| LinearSpec {
            coeffs,
            relation,
            rhs,
        })
}
