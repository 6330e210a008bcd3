//! Formulas over Arithmetic Constraints and Boolean Variables.
//!
//! [`Formula`] is an immutable, reference-counted value. Equality, hashing and
//! ordering are structural, so formulas can be used directly as keys of the
//! origin sets that track which assertions justify a derived fact.

use crate::constraint::{Constraint, ConstraintId};
use crate::model::Model;
use rustc_hash::FxHashSet;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Boolean variable identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BoolVarId(u32);

impl BoolVarId {
    /// Create an identifier from its raw index.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw index.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for BoolVarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{}", self.0)
    }
}

/// Formula node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormulaKind {
    /// Constant true
    True,
    /// Constant false
    False,
    /// Boolean variable
    Bool(BoolVarId),
    /// Arithmetic constraint
    Constraint(Arc<Constraint>),
    /// Negation
    Not(Formula),
    /// Conjunction
    And(Vec<Formula>),
    /// Disjunction
    Or(Vec<Formula>),
    /// Implication
    Implies(Formula, Formula),
    /// Equivalence
    Iff(Formula, Formula),
}

/// Immutable, structurally compared formula.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Formula(Arc<FormulaKind>);

/// Ordered set of formulas (origins, infeasible subsets).
pub type FormulaSet = BTreeSet<Formula>;

impl Formula {
    fn from_kind(kind: FormulaKind) -> Self {
        Self(Arc::new(kind))
    }

    /// Constant true.
    #[must_use]
    pub fn mk_true() -> Self {
        Self::from_kind(FormulaKind::True)
    }

    /// Constant false.
    #[must_use]
    pub fn mk_false() -> Self {
        Self::from_kind(FormulaKind::False)
    }

    /// Boolean variable.
    #[must_use]
    pub fn mk_bool(var: BoolVarId) -> Self {
        Self::from_kind(FormulaKind::Bool(var))
    }

    /// Arithmetic constraint atom.
    #[must_use]
    pub fn mk_constraint(constraint: Arc<Constraint>) -> Self {
        Self::from_kind(FormulaKind::Constraint(constraint))
    }

    /// Negation; double negations collapse.
    #[must_use]
    pub fn mk_not(formula: Formula) -> Self {
        match formula.kind() {
            FormulaKind::Not(inner) => inner.clone(),
            FormulaKind::True => Self::mk_false(),
            FormulaKind::False => Self::mk_true(),
            _ => Self::from_kind(FormulaKind::Not(formula)),
        }
    }

    /// Conjunction; empty is true, singleton is its element.
    #[must_use]
    pub fn mk_and(mut args: Vec<Formula>) -> Self {
        match args.len() {
            0 => Self::mk_true(),
            1 => args.swap_remove(0),
            _ => Self::from_kind(FormulaKind::And(args)),
        }
    }

    /// Disjunction; empty is false, singleton is its element.
    #[must_use]
    pub fn mk_or(mut args: Vec<Formula>) -> Self {
        match args.len() {
            0 => Self::mk_false(),
            1 => args.swap_remove(0),
            _ => Self::from_kind(FormulaKind::Or(args)),
        }
    }

    /// Implication.
    #[must_use]
    pub fn mk_implies(lhs: Formula, rhs: Formula) -> Self {
        Self::from_kind(FormulaKind::Implies(lhs, rhs))
    }

    /// Equivalence.
    #[must_use]
    pub fn mk_iff(lhs: Formula, rhs: Formula) -> Self {
        Self::from_kind(FormulaKind::Iff(lhs, rhs))
    }

    /// Node kind.
    pub fn kind(&self) -> &FormulaKind {
        &self.0
    }

    /// The constraint, if this formula is a constraint atom.
    pub fn as_constraint(&self) -> Option<&Arc<Constraint>> {
        match self.kind() {
            FormulaKind::Constraint(c) => Some(c),
            _ => None,
        }
    }

    /// Check whether this formula is a constraint atom.
    pub fn is_constraint(&self) -> bool {
        self.as_constraint().is_some()
    }

    /// Check whether this formula is an atom or a negated atom.
    pub fn is_literal(&self) -> bool {
        match self.kind() {
            FormulaKind::True
            | FormulaKind::False
            | FormulaKind::Bool(_)
            | FormulaKind::Constraint(_) => true,
            FormulaKind::Not(inner) => {
                matches!(inner.kind(), FormulaKind::Bool(_) | FormulaKind::Constraint(_))
            }
            _ => false,
        }
    }

    /// Constraint atoms in order of first occurrence.
    pub fn atoms(&self) -> Vec<Arc<Constraint>> {
        let mut seen: FxHashSet<ConstraintId> = FxHashSet::default();
        let mut out = Vec::new();
        self.collect_atoms(&mut seen, &mut out);
        out
    }

    fn collect_atoms(&self, seen: &mut FxHashSet<ConstraintId>, out: &mut Vec<Arc<Constraint>>) {
        match self.kind() {
            FormulaKind::True | FormulaKind::False | FormulaKind::Bool(_) => {}
            FormulaKind::Constraint(c) => {
                if seen.insert(c.id()) {
                    out.push(Arc::clone(c));
                }
            }
            FormulaKind::Not(inner) => inner.collect_atoms(seen, out),
            FormulaKind::And(args) | FormulaKind::Or(args) => {
                for arg in args {
                    arg.collect_atoms(seen, out);
                }
            }
            FormulaKind::Implies(lhs, rhs) | FormulaKind::Iff(lhs, rhs) => {
                lhs.collect_atoms(seen, out);
                rhs.collect_atoms(seen, out);
            }
        }
    }

    /// Structural properties of this formula.
    pub fn properties(&self) -> FormulaProperties {
        let mut props = FormulaProperties {
            conjunction_of_constraints: self.is_conjunction_of_constraints(),
            is_cnf: self.is_cnf(),
            ..FormulaProperties::default()
        };
        self.collect_properties(&mut props);
        props
    }

    fn is_conjunction_of_constraints(&self) -> bool {
        match self.kind() {
            FormulaKind::Constraint(_) | FormulaKind::True => true,
            FormulaKind::And(args) => args.iter().all(Formula::is_conjunction_of_constraints),
            _ => false,
        }
    }

    fn is_clause(&self) -> bool {
        match self.kind() {
            FormulaKind::Or(args) => args.iter().all(Formula::is_literal),
            _ => self.is_literal(),
        }
    }

    fn is_cnf(&self) -> bool {
        match self.kind() {
            FormulaKind::And(args) => args.iter().all(Formula::is_clause),
            _ => self.is_clause(),
        }
    }

    fn collect_properties(&self, props: &mut FormulaProperties) {
        match self.kind() {
            FormulaKind::True | FormulaKind::False => {}
            FormulaKind::Bool(_) => props.has_boolean = true,
            FormulaKind::Constraint(c) => {
                if c.is_linear() {
                    props.has_linear = true;
                } else {
                    props.has_nonlinear = true;
                }
                if c.has_integer() {
                    props.has_integer = true;
                }
                if !c.is_integer() {
                    props.has_real = true;
                }
            }
            FormulaKind::Not(inner) => {
                props.has_boolean = true;
                inner.collect_properties(props);
            }
            FormulaKind::And(args) => {
                for arg in args {
                    arg.collect_properties(props);
                }
            }
            FormulaKind::Or(args) => {
                props.has_boolean = true;
                for arg in args {
                    arg.collect_properties(props);
                }
            }
            FormulaKind::Implies(lhs, rhs) | FormulaKind::Iff(lhs, rhs) => {
                props.has_boolean = true;
                lhs.collect_properties(props);
                rhs.collect_properties(props);
            }
        }
    }

    /// Truth value under a model; `None` if some variable is unassigned.
    pub fn evaluate(&self, model: &Model) -> Option<bool> {
        match self.kind() {
            FormulaKind::True => Some(true),
            FormulaKind::False => Some(false),
            FormulaKind::Bool(var) => model.boolean(*var),
            FormulaKind::Constraint(c) => model.evaluate_constraint(c),
            FormulaKind::Not(inner) => inner.evaluate(model).map(|v| !v),
            FormulaKind::And(args) => {
                let mut result = Some(true);
                for arg in args {
                    match arg.evaluate(model) {
                        Some(false) => return Some(false),
                        Some(true) => {}
                        None => result = None,
                    }
                }
                result
            }
            FormulaKind::Or(args) => {
                let mut result = Some(false);
                for arg in args {
                    match arg.evaluate(model) {
                        Some(true) => return Some(true),
                        Some(false) => {}
                        None => result = None,
                    }
                }
                result
            }
            FormulaKind::Implies(lhs, rhs) => match (lhs.evaluate(model), rhs.evaluate(model)) {
                (Some(false), _) | (_, Some(true)) => Some(true),
                (Some(true), Some(false)) => Some(false),
                _ => None,
            },
            FormulaKind::Iff(lhs, rhs) => Some(lhs.evaluate(model)? == rhs.evaluate(model)?),
        }
    }
}

impl From<Arc<Constraint>> for Formula {
    fn from(constraint: Arc<Constraint>) -> Self {
        Self::mk_constraint(constraint)
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, op: &str, args: &[Formula]) -> fmt::Result {
    write!(f, "({op}")?;
    for arg in args {
        write!(f, " {arg}")?;
    }
    write!(f, ")")
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            FormulaKind::True => write!(f, "true"),
            FormulaKind::False => write!(f, "false"),
            FormulaKind::Bool(var) => write!(f, "{var}"),
            FormulaKind::Constraint(c) => write!(f, "({c})"),
            FormulaKind::Not(inner) => write!(f, "(not {inner})"),
            FormulaKind::And(args) => write_list(f, "and", args),
            FormulaKind::Or(args) => write_list(f, "or", args),
            FormulaKind::Implies(lhs, rhs) => write!(f, "(=> {lhs} {rhs})"),
            FormulaKind::Iff(lhs, rhs) => write!(f, "(= {lhs} {rhs})"),
        }
    }
}

/// Structural properties used to select backends in the strategy graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormulaProperties {
    /// Only constraint atoms joined by conjunction.
    pub conjunction_of_constraints: bool,
    /// Conjunction of clauses.
    pub is_cnf: bool,
    /// Some linear constraint occurs.
    pub has_linear: bool,
    /// Some nonlinear constraint occurs.
    pub has_nonlinear: bool,
    /// Some constraint mentions an integer variable.
    pub has_integer: bool,
    /// Some constraint mentions a real variable.
    pub has_real: bool,
    /// Boolean variables or connectives other than conjunction occur.
    pub has_boolean: bool,
}

impl Default for FormulaProperties {
    fn default() -> Self {
        Self {
            conjunction_of_constraints: true,
            is_cnf: true,
            has_linear: false,
            has_nonlinear: false,
            has_integer: false,
            has_real: false,
            has_boolean: false,
        }
    }
}

impl FormulaProperties {
    /// Properties of the conjunction of several formulas.
    pub fn of<'a, I>(formulas: I) -> Self
    where
        I: IntoIterator<Item = &'a Formula>,
    {
        formulas
            .into_iter()
            .fold(Self::default(), |acc, f| acc.merge(&f.properties()))
    }

    /// Properties of the conjunction of `self` and `other`.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            conjunction_of_constraints: self.conjunction_of_constraints
                && other.conjunction_of_constraints,
            is_cnf: self.is_cnf && other.is_cnf,
            has_linear: self.has_linear || other.has_linear,
            has_nonlinear: self.has_nonlinear || other.has_nonlinear,
            has_integer: self.has_integer || other.has_integer,
            has_real: self.has_real || other.has_real,
            has_boolean: self.has_boolean || other.has_boolean,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::Relation;
    use crate::pool::ConstraintPool;

    #[test]
    fn test_structural_equality() {
        let pool = ConstraintPool::new();
        let x = pool.declare_real("x");
        let c = pool.linear(&[(x, 1)], Relation::Geq, 1).unwrap();
        let a = Formula::mk_constraint(Arc::clone(&c));
        let b = Formula::mk_constraint(c);
        assert_eq!(a, b);
        assert_eq!(Formula::mk_not(Formula::mk_not(a.clone())), a);
        assert_eq!(Formula::mk_and(vec![a.clone()]), a);
        assert_eq!(Formula::mk_or(vec![]), Formula::mk_false());
    }

    #[test]
    fn test_properties() {
        let pool = ConstraintPool::new();
        let x = pool.declare_int("x");
        let y = pool.declare_real("y");
        let c1 = Formula::from(pool.linear(&[(x, 1)], Relation::Leq, 3).unwrap());
        let c2 = Formula::from(pool.linear(&[(y, 2)], Relation::Greater, 0).unwrap());

        let conj = Formula::mk_and(vec![c1.clone(), c2.clone()]);
        let props = conj.properties();
        assert!(props.conjunction_of_constraints);
        assert!(props.is_cnf);
        assert!(props.has_integer && props.has_real);
        assert!(!props.has_boolean);

        let disj = Formula::mk_or(vec![c1, Formula::mk_not(c2)]);
        let props = disj.properties();
        assert!(!props.conjunction_of_constraints);
        assert!(props.is_cnf);
        assert!(props.has_boolean);

        let imp = Formula::mk_implies(disj.clone(), conj);
        assert!(!imp.properties().is_cnf);
        assert_eq!(imp.atoms().len(), 2);
    }

    #[test]
    fn test_evaluate() {
        let pool = ConstraintPool::new();
        let x = pool.declare_real("x");
        let p = pool.declare_bool("p");
        let c = Formula::from(pool.linear(&[(x, 1)], Relation::Geq, 1).unwrap());
        let f = Formula::mk_or(vec![Formula::mk_bool(p), c]);

        let mut model = Model::new();
        assert_eq!(f.evaluate(&model), None);
        model.set_bool(p, true);
        assert_eq!(f.evaluate(&model), Some(true));
        model.set_bool(p, false);
        model.set_arith(x, num_rational::BigRational::from_integer(0.into()));
        assert_eq!(f.evaluate(&model), Some(false));
    }
}
