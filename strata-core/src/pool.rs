//! Constraint Pool: Variable Declarations and Constraint Interning.
//!
//! The pool is shared explicitly (behind an [`Arc`]) by the manager and every
//! module instance. It hands out:
//! - arithmetic variables with their domain
//! - Boolean variables, including fresh ones for clause encodings
//! - interned constraints in normal form
//!
//! Normal form: `lhs > 0` is stored as `-lhs < 0` and `lhs >= 0` as
//! `-lhs <= 0`, so only `=`, `!=`, `<` and `<=` occur.

use crate::constraint::{Constraint, ConstraintId, Relation};
use crate::error::{Result, StrataError, checked_id};
use crate::formula::BoolVarId;
use crate::poly::{Domain, Polynomial, VarId};
use num_bigint::BigInt;
use num_rational::BigRational;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::trace;

#[derive(Debug)]
struct VarInfo {
    name: String,
    domain: Domain,
}

#[derive(Debug, Default)]
struct PoolInner {
    vars: Vec<VarInfo>,
    var_names: FxHashMap<String, VarId>,
    bools: Vec<String>,
    bool_names: FxHashMap<String, BoolVarId>,
    constraints: Vec<Arc<Constraint>>,
    index: FxHashMap<(Polynomial, Relation), Arc<Constraint>>,
}

/// Thread-safe interning table for variables and constraints.
#[derive(Debug, Default)]
pub struct ConstraintPool {
    inner: RwLock<PoolInner>,
}

impl ConstraintPool {
    /// Create an empty pool
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an arithmetic variable; redeclaring a name returns its variable.
    pub fn declare_var(&self, name: &str, domain: Domain) -> VarId {
        let mut inner = self.inner.write();
        if let Some(&var) = inner.var_names.get(name) {
            return var;
        }
        let var = VarId::new(checked_id(inner.vars.len(), "variable"));
        inner.vars.push(VarInfo {
            name: name.to_string(),
            domain,
        });
        inner.var_names.insert(name.to_string(), var);
        var
    }

    /// Declare a real-valued variable.
    pub fn declare_real(&self, name: &str) -> VarId {
        self.declare_var(name, Domain::Real)
    }

    /// Declare an integer-valued variable.
    pub fn declare_int(&self, name: &str) -> VarId {
        self.declare_var(name, Domain::Integer)
    }

    /// Declare a Boolean variable; redeclaring a name returns its variable.
    pub fn declare_bool(&self, name: &str) -> BoolVarId {
        let mut inner = self.inner.write();
        if let Some(&var) = inner.bool_names.get(name) {
            return var;
        }
        let var = BoolVarId::new(checked_id(inner.bools.len(), "Boolean variable"));
        inner.bools.push(name.to_string());
        inner.bool_names.insert(name.to_string(), var);
        var
    }

    /// Allocate a Boolean variable with a name no user declaration can clash with.
    pub fn fresh_bool(&self, prefix: &str) -> BoolVarId {
        let mut inner = self.inner.write();
        let var = BoolVarId::new(checked_id(inner.bools.len(), "Boolean variable"));
        let name = format!("{prefix}!{}", var.raw());
        inner.bools.push(name.clone());
        inner.bool_names.insert(name, var);
        var
    }

    /// Domain of a variable.
    pub fn domain(&self, var: VarId) -> Option<Domain> {
        self.inner.read().vars.get(var.index()).map(|v| v.domain)
    }

    /// Check whether a variable is integer-valued.
    pub fn is_integer(&self, var: VarId) -> bool {
        self.domain(var) == Some(Domain::Integer)
    }

    /// Name of an arithmetic variable.
    pub fn var_name(&self, var: VarId) -> Option<String> {
        self.inner.read().vars.get(var.index()).map(|v| v.name.clone())
    }

    /// Name of a Boolean variable.
    pub fn bool_name(&self, var: BoolVarId) -> Option<String> {
        self.inner.read().bools.get(var.raw() as usize).cloned()
    }

    /// Look up an arithmetic variable by name.
    pub fn var_by_name(&self, name: &str) -> Option<VarId> {
        self.inner.read().var_names.get(name).copied()
    }

    /// Number of arithmetic variables.
    pub fn num_vars(&self) -> usize {
        self.inner.read().vars.len()
    }

    /// Number of Boolean variables.
    pub fn num_bools(&self) -> usize {
        self.inner.read().bools.len()
    }

    /// Number of interned constraints.
    pub fn num_constraints(&self) -> usize {
        self.inner.read().constraints.len()
    }

    /// Constraint by identifier.
    pub fn get(&self, id: ConstraintId) -> Option<Arc<Constraint>> {
        self.inner.read().constraints.get(id.raw() as usize).cloned()
    }

    /// Intern `lhs ⋈ 0`.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::UnknownVariable`] if `lhs` mentions an
    /// undeclared variable.
    pub fn constraint(&self, lhs: Polynomial, relation: Relation) -> Result<Arc<Constraint>> {
        {
            let inner = self.inner.read();
            if let Some(var) = lhs.variables().into_iter().find(|v| v.index() >= inner.vars.len()) {
                return Err(StrataError::UnknownVariable(var.raw()));
            }
        }
        Ok(self.intern(lhs, relation))
    }

    /// Intern `Σ coeff_i · var_i ⋈ rhs` with integer coefficients.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::UnknownVariable`] for undeclared variables.
    pub fn linear(&self, terms: &[(VarId, i64)], relation: Relation, rhs: i64) -> Result<Arc<Constraint>> {
        let lhs = Polynomial::linear(
            terms
                .iter()
                .map(|&(v, c)| (v, BigRational::from_integer(BigInt::from(c)))),
            BigRational::from_integer(BigInt::from(-rhs)),
        );
        self.constraint(lhs, relation)
    }

    /// Intern `Σ coeff_i · var_i ⋈ rhs` with rational coefficients.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::UnknownVariable`] for undeclared variables.
    pub fn linear_rational(
        &self,
        terms: &[(VarId, BigRational)],
        relation: Relation,
        rhs: BigRational,
    ) -> Result<Arc<Constraint>> {
        let lhs = Polynomial::linear(terms.iter().cloned(), -rhs);
        self.constraint(lhs, relation)
    }

    /// The constraint `¬c`, interned.
    pub fn negation(&self, constraint: &Constraint) -> Arc<Constraint> {
        self.intern(constraint.lhs().clone(), constraint.relation().negate())
    }

    fn intern(&self, lhs: Polynomial, relation: Relation) -> Arc<Constraint> {
        let (lhs, relation) = match relation {
            Relation::Greater | Relation::Geq => (-&lhs, relation.flip()),
            _ => (lhs, relation),
        };
        let key = (lhs, relation);
        if let Some(existing) = self.inner.read().index.get(&key) {
            return Arc::clone(existing);
        }

        let mut inner = self.inner.write();
        // Another thread may have interned it between the two locks.
        if let Some(existing) = inner.index.get(&key) {
            return Arc::clone(existing);
        }
        let vars = key.0.variables();
        let is_int = |v: &VarId| {
            inner
                .vars
                .get(v.index())
                .is_some_and(|info| info.domain == Domain::Integer)
        };
        let all_integer = vars.iter().all(is_int);
        let any_integer = vars.iter().any(is_int);
        let id = ConstraintId::new(checked_id(inner.constraints.len(), "constraint"));
        let constraint = Arc::new(Constraint::new(
            id,
            key.0.clone(),
            key.1,
            all_integer,
            any_integer,
        ));
        trace!(id = id.raw(), constraint = %constraint, "interned constraint");
        inner.constraints.push(Arc::clone(&constraint));
        inner.index.insert(key, Arc::clone(&constraint));
        constraint
    }

    /// Render a constraint with declared variable names.
    pub fn describe(&self, constraint: &Constraint) -> String {
        let inner = self.inner.read();
        let mut text = constraint.to_string();
        // Replace longer indices first so x1 does not clobber x12.
        let mut vars: Vec<VarId> = constraint.variables().into_iter().collect();
        vars.sort_by_key(|v| std::cmp::Reverse(v.raw()));
        for var in vars {
            if let Some(info) = inner.vars.get(var.index()) {
                text = text.replace(&var.to_string(), &info.name);
            }
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interning() {
        let pool = ConstraintPool::new();
        let x = pool.declare_real("x");
        let y = pool.declare_real("y");
        let a = pool.linear(&[(x, 1), (y, 2)], Relation::Leq, 3).unwrap();
        let b = pool.linear(&[(y, 2), (x, 1)], Relation::Leq, 3).unwrap();
        assert_eq!(a.id(), b.id());
        assert_eq!(pool.num_constraints(), 1);
        assert_eq!(pool.declare_real("x"), x);
    }

    #[test]
    fn test_normalization() {
        let pool = ConstraintPool::new();
        let x = pool.declare_real("x");
        let geq = pool.linear(&[(x, 1)], Relation::Geq, 1).unwrap();
        assert_eq!(geq.relation(), Relation::Leq);
        assert_eq!(pool.describe(&geq), "-x + 1 <= 0");

        // -x + 1 <= 0 is the same constraint as 1 - x <= 0
        let leq = pool.linear(&[(x, -1)], Relation::Leq, -1).unwrap();
        assert_eq!(geq.id(), leq.id());
    }

    #[test]
    fn test_negation() {
        let pool = ConstraintPool::new();
        let x = pool.declare_int("x");
        let c = pool.linear(&[(x, 1)], Relation::Less, 3).unwrap();
        let neg = pool.negation(&c);
        assert_eq!(neg.relation(), Relation::Leq);
        assert_eq!(pool.negation(&neg).id(), c.id());
        assert!(c.is_integer());
    }

    #[test]
    fn test_unknown_variable() {
        let pool = ConstraintPool::new();
        let ghost = VarId::new(3);
        let err = pool.linear(&[(ghost, 1)], Relation::Eq, 0).unwrap_err();
        assert_eq!(err, StrataError::UnknownVariable(3));
    }

    #[test]
    fn test_fresh_bools_are_distinct() {
        let pool = ConstraintPool::new();
        let p = pool.declare_bool("p");
        let a = pool.fresh_bool("cnf");
        let b = pool.fresh_bool("cnf");
        assert_ne!(a, b);
        assert_ne!(p, a);
        assert_eq!(pool.bool_name(a).as_deref(), Some("cnf!1"));
        assert_eq!(pool.num_bools(), 3);
    }
}
