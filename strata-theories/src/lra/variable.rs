//! Tableau Variables: Original Variables and Slacks.

use super::bound::BoundId;
use num_bigint::BigInt;
use num_rational::BigRational;
use std::collections::BTreeSet;
use strata_core::{Polynomial, VarId, checked_id};
use strata_math::DeltaRational;

/// Tableau variable handle (index into the tableau's variable arena).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VariableId(u32);

impl VariableId {
    pub(crate) fn new(index: usize) -> Self {
        Self(checked_id(index, "tableau variable"))
    }

    /// Arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a tableau variable stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableKind {
    /// An arithmetic variable of the input.
    Original(VarId),
    /// `Σ coeff_i · var_i` with coprime integer coefficients, the first one positive.
    Slack(Vec<(VarId, BigInt)>),
}

/// A row or column of the tableau.
#[derive(Debug, Clone)]
pub struct Variable {
    kind: VariableKind,
    integer: bool,
    pub(crate) assignment: DeltaRational,
    pub(crate) stored: Option<DeltaRational>,
    pub(crate) basic: bool,
    pub(crate) pivot_count: usize,
    /// Registered lower bounds ordered by limit.
    pub(crate) lower: BTreeSet<(DeltaRational, BoundId)>,
    /// Registered upper bounds ordered by limit.
    pub(crate) upper: BTreeSet<(DeltaRational, BoundId)>,
}

impl Variable {
    pub(crate) fn new(kind: VariableKind, integer: bool) -> Self {
        Self {
            kind,
            integer,
            assignment: DeltaRational::zero(),
            stored: None,
            basic: false,
            pivot_count: 0,
            lower: BTreeSet::new(),
            upper: BTreeSet::new(),
        }
    }

    /// Original variable or slack form.
    pub fn kind(&self) -> &VariableKind {
        &self.kind
    }

    /// The input variable, for original variables.
    pub fn original(&self) -> Option<VarId> {
        match &self.kind {
            VariableKind::Original(var) => Some(*var),
            VariableKind::Slack(_) => None,
        }
    }

    /// Check whether the variable only takes integer values.
    pub fn is_integer(&self) -> bool {
        self.integer
    }

    /// Current assignment.
    pub fn assignment(&self) -> &DeltaRational {
        &self.assignment
    }

    /// Check whether the variable is basic.
    pub fn is_basic(&self) -> bool {
        self.basic
    }

    /// How often the variable entered or left the basis.
    pub fn pivot_count(&self) -> usize {
        self.pivot_count
    }

    /// Linear form over input variables.
    pub fn as_polynomial(&self) -> Polynomial {
        match &self.kind {
            VariableKind::Original(var) => Polynomial::var(*var),
            VariableKind::Slack(terms) => Polynomial::linear(
                terms
                    .iter()
                    .map(|(v, c)| (*v, BigRational::from_integer(c.clone()))),
                BigRational::from_integer(BigInt::from(0)),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slack_polynomial() {
        let x = VarId::new(0);
        let y = VarId::new(1);
        let slack = Variable::new(
            VariableKind::Slack(vec![(x, BigInt::from(1)), (y, BigInt::from(-2))]),
            true,
        );
        assert!(slack.original().is_none());
        assert_eq!(slack.as_polynomial().to_string(), "-2*x1 + x0");
        assert!(slack.assignment().is_zero());
        assert!(!slack.is_basic());
    }
}
