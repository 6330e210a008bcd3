//! Conversion of Boolean Structure into Clauses.
//!
//! Every received formula is brought into negation normal form and split into
//! clauses. Disjunctions of non-clausal subformulas get a fresh Boolean
//! variable `t` with the one-sided definition `t → sub` (Plaisted-Greenbaum),
//! which is sound and complete for satisfiability because `t` occurs
//! positively only. Each clause is passed with the received formula it came
//! from as its origin.

use rustc_hash::FxHashMap;
use strata_core::{
    Answer, BoolVarId, CancellationToken, Formula, FormulaKind, FormulaSet, Module, ModuleBase,
};
use tracing::{debug, trace};

/// A clause as a list of literals; empty means false.
type ClauseLits = Vec<Formula>;

/// The CNF conversion module.
#[derive(Debug)]
pub struct CnfModule {
    base: ModuleBase,
    /// Definition variables of already converted subformulas.
    definitions: FxHashMap<Formula, BoolVarId>,
}

impl CnfModule {
    /// Create the module around its base.
    pub fn new(base: ModuleBase) -> Self {
        Self {
            base,
            definitions: FxHashMap::default(),
        }
    }

    /// Clauses equisatisfiable with `formula`.
    pub fn clausify(&mut self, formula: &Formula) -> Vec<Formula> {
        let nnf = to_nnf(formula, true);
        self.clauses(&nnf)
            .into_iter()
            .map(Formula::mk_or)
            .collect()
    }

    fn clauses(&mut self, formula: &Formula) -> Vec<ClauseLits> {
        match formula.kind() {
            FormulaKind::True => Vec::new(),
            FormulaKind::False => vec![Vec::new()],
            FormulaKind::And(args) => args.iter().flat_map(|a| self.clauses(a)).collect(),
            FormulaKind::Or(args) => {
                let mut clause = ClauseLits::new();
                let mut extra = Vec::new();
                for arg in args {
                    match arg.kind() {
                        FormulaKind::True => return Vec::new(),
                        FormulaKind::False => {}
                        FormulaKind::Or(_) => {
                            // Nested disjunctions of literals flatten.
                            let inner = self.clauses(arg);
                            match inner.as_slice() {
                                [] => return Vec::new(),
                                [single] => clause.extend(single.iter().cloned()),
                                _ => {
                                    let t = self.define(arg, inner, &mut extra);
                                    clause.push(t);
                                }
                            }
                        }
                        FormulaKind::And(_) => {
                            let inner = self.clauses(arg);
                            if inner.is_empty() {
                                return Vec::new();
                            }
                            let t = self.define(arg, inner, &mut extra);
                            clause.push(t);
                        }
                        _ => clause.push(arg.clone()),
                    }
                }
                extra.push(clause);
                extra
            }
            _ => vec![vec![formula.clone()]],
        }
    }

    /// Literal `t` standing for `sub`, with `¬t ∨ c` for every clause `c` of `sub`.
    fn define(&mut self, sub: &Formula, clauses: Vec<ClauseLits>, out: &mut Vec<ClauseLits>) -> Formula {
        let var = match self.definitions.get(sub) {
            Some(&var) => var,
            None => {
                let var = self.base.pool().fresh_bool("cnf");
                trace!(%sub, %var, "definition variable");
                self.definitions.insert(sub.clone(), var);
                var
            }
        };
        let t = Formula::mk_bool(var);
        let not_t = Formula::mk_not(t.clone());
        out.extend(clauses.into_iter().map(|mut c| {
            c.insert(0, not_t.clone());
            c
        }));
        t
    }
}

/// Negation normal form; `positive == false` converts the negation of `formula`.
fn to_nnf(formula: &Formula, positive: bool) -> Formula {
    match formula.kind() {
        FormulaKind::True | FormulaKind::False | FormulaKind::Bool(_) | FormulaKind::Constraint(_) => {
            if positive {
                formula.clone()
            } else {
                Formula::mk_not(formula.clone())
            }
        }
        FormulaKind::Not(inner) => to_nnf(inner, !positive),
        FormulaKind::And(args) => {
            let args = args.iter().map(|a| to_nnf(a, positive)).collect();
            if positive {
                Formula::mk_and(args)
            } else {
                Formula::mk_or(args)
            }
        }
        FormulaKind::Or(args) => {
            let args = args.iter().map(|a| to_nnf(a, positive)).collect();
            if positive {
                Formula::mk_or(args)
            } else {
                Formula::mk_and(args)
            }
        }
        FormulaKind::Implies(lhs, rhs) => {
            if positive {
                Formula::mk_or(vec![to_nnf(lhs, false), to_nnf(rhs, true)])
            } else {
                Formula::mk_and(vec![to_nnf(lhs, true), to_nnf(rhs, false)])
            }
        }
        FormulaKind::Iff(lhs, rhs) => {
            // a ↔ b is (¬a ∨ b) ∧ (a ∨ ¬b); ¬(a ↔ b) is (a ∨ b) ∧ (¬a ∨ ¬b)
            let (a, na) = (to_nnf(lhs, true), to_nnf(lhs, false));
            let (b, nb) = (to_nnf(rhs, true), to_nnf(rhs, false));
            if positive {
                Formula::mk_and(vec![Formula::mk_or(vec![na, b]), Formula::mk_or(vec![a, nb])])
            } else {
                Formula::mk_and(vec![Formula::mk_or(vec![a, b]), Formula::mk_or(vec![na, nb])])
            }
        }
    }
}

impl Module for CnfModule {
    fn base(&self) -> &ModuleBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ModuleBase {
        &mut self.base
    }

    fn add_core(&mut self, formula: &Formula) -> bool {
        let clauses = self.clausify(formula);
        let origins = FormulaSet::from([formula.clone()]);
        let mut consistent = true;
        for clause in clauses {
            if clause == Formula::mk_false() {
                consistent = false;
                continue;
            }
            self.base.add_passed(clause, origins.clone());
        }
        if !consistent {
            self.base.add_infeasible_subset(origins);
        }
        debug!(%formula, passed = self.base.passed().len(), "clausified");
        consistent
    }

    fn remove_core(&mut self, _formula: &Formula) {}

    fn check_core(&mut self, full: bool, cancel: &CancellationToken) -> Answer {
        if self.base.has_infeasible_subset() {
            return Answer::Unsat;
        }
        self.base.run_backends(full, cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use strata_core::{
        ConstraintPool, FactoryRegistry, Model, ModuleType, Relation, SolverConfig, SolverContext,
        StrategyGraph,
    };

    fn module() -> CnfModule {
        let mut factories = FactoryRegistry::new();
        factories.register(ModuleType::Cnf, |base| Box::new(CnfModule::new(base)));
        let ctx = SolverContext::new(
            Arc::new(ConstraintPool::new()),
            SolverConfig::default(),
            StrategyGraph::new(ModuleType::Cnf),
            factories,
        )
        .unwrap();
        CnfModule::new(ModuleBase::new(ModuleType::Cnf, StrategyGraph::ROOT, ctx))
    }

    fn is_clause(f: &Formula) -> bool {
        match f.kind() {
            FormulaKind::Or(args) => args.iter().all(Formula::is_literal),
            _ => f.is_literal(),
        }
    }

    #[test]
    fn test_nnf_pushes_negations() {
        let pool = ConstraintPool::new();
        let a = Formula::mk_bool(pool.declare_bool("a"));
        let b = Formula::mk_bool(pool.declare_bool("b"));
        let f = Formula::mk_not(Formula::mk_implies(a.clone(), b.clone()));
        let nnf = to_nnf(&f, true);
        assert_eq!(nnf, Formula::mk_and(vec![a, Formula::mk_not(b)]));
    }

    #[test]
    fn test_clauses_of_nested_structure() {
        let mut cnf = module();
        let pool = Arc::clone(cnf.base().pool());
        let a = Formula::mk_bool(pool.declare_bool("a"));
        let b = Formula::mk_bool(pool.declare_bool("b"));
        let x = pool.declare_real("x");
        let c = Formula::from(pool.linear(&[(x, 1)], Relation::Leq, 0).unwrap());
        // a ∨ (b ∧ c)
        let f = Formula::mk_or(vec![a, Formula::mk_and(vec![b, c])]);
        let clauses = cnf.clausify(&f);
        assert_eq!(clauses.len(), 3);
        assert!(clauses.iter().all(is_clause));

        // Any model of f extends to the clauses by t := b ∧ c.
        let t = pool.bool_name(strata_core::BoolVarId::new(2));
        assert_eq!(t.as_deref(), Some("cnf!2"));
        let mut model = Model::new();
        model.set_bool(strata_core::BoolVarId::new(0), false);
        model.set_bool(strata_core::BoolVarId::new(1), true);
        model.set_bool(strata_core::BoolVarId::new(2), true);
        model.set_arith(x, num_rational::BigRational::from_integer((-1).into()));
        assert!(clauses.iter().all(|cl| cl.evaluate(&model) == Some(true)));
    }

    #[test]
    fn test_iff_and_constants() {
        let mut cnf = module();
        let pool = Arc::clone(cnf.base().pool());
        let a = Formula::mk_bool(pool.declare_bool("a"));
        let b = Formula::mk_bool(pool.declare_bool("b"));
        assert_eq!(cnf.clausify(&Formula::mk_iff(a.clone(), b)).len(), 2);
        assert!(cnf.clausify(&Formula::mk_or(vec![a.clone(), Formula::mk_true()])).is_empty());
        let clauses = cnf.clausify(&Formula::mk_and(vec![a.clone(), Formula::mk_false()]));
        assert_eq!(clauses, vec![a, Formula::mk_false()]);
    }

    #[test]
    fn test_false_assertion_is_infeasible() {
        let mut cnf = module();
        let f = Formula::mk_false();
        assert!(!cnf.add(&f));
        assert_eq!(cnf.check(true, &CancellationToken::new()), Answer::Unsat);
        assert_eq!(cnf.infeasible_subsets()[0], FormulaSet::from([f.clone()]));
        cnf.remove(&f);
        assert!(cnf.base().passed().is_empty());
    }
}
