//! Linear Real and Integer Arithmetic Module.
//!
//! [`LraModule`] decides conjunctions of linear constraints with a
//! general Simplex over delta-rationals:
//! - every informed linear constraint becomes a bound on an original variable
//!   or on a shared slack variable
//! - asserting a constraint activates its bounds; infeasible rows are
//!   explained by the active bounds they sit on
//! - disequalities are checked against the final assignment and split lazily
//! - integer variables are handled by branching, Gomory cuts or cuts from
//!   proofs, all emitted as lemmas
//! - nonlinear constraints are checked by substitution and otherwise handed to
//!   backends together with the linear constraints they are connected to
//!
//! ## References
//!
//! - Dutertre & de Moura (2006): "A Fast Linear-Arithmetic Solver for DPLL(T)"
//! - Dillig, Dillig & Aiken (2009): "Cuts from Proofs"

pub mod bound;
pub mod integer;
pub mod tableau;
pub mod variable;

pub use bound::{Bound, BoundError, BoundId, BoundKind};
pub use tableau::{PivotDecision, Refinement, Tableau};
pub use variable::{Variable, VariableId, VariableKind};

use integer::ProcessedMatrices;
use num_rational::BigRational;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use strata_core::{
    Answer, CancellationToken, ConflictPolicy, Constraint, Formula, FormulaKind, FormulaSet,
    IntegerStrategy, LraConfig, Module, ModuleBase, Relation, VarId,
};
use tracing::{debug, trace, warn};

/// Statistics of an [`LraModule`].
#[derive(Debug, Clone, Default)]
pub struct LraStats {
    /// Calls to `check`.
    pub checks: u64,
    /// Pivot operations.
    pub pivots: u64,
    /// Infeasible subsets produced.
    pub conflicts: u64,
    /// Branch lemmas.
    pub branches: u64,
    /// Gomory cuts.
    pub gomory_cuts: u64,
    /// Cuts from proofs.
    pub proof_cuts: u64,
    /// Learned bound refinements.
    pub refinements: u64,
    /// Disequality splits.
    pub neq_splits: u64,
}

/// The linear arithmetic module.
#[derive(Debug)]
pub struct LraModule {
    base: ModuleBase,
    config: LraConfig,
    tableau: Tableau,
    /// Received nonlinear constraints with the formula they came from.
    nonlinear: Vec<(Formula, Arc<Constraint>)>,
    /// Received disequalities with the formula they came from.
    disequalities: Vec<(Formula, Arc<Constraint>)>,
    /// Received formulas that are not arithmetic literals.
    non_literals: usize,
    processed: ProcessedMatrices,
    gomory_cuts: usize,
    needs_restore: bool,
    simplex_sat: bool,
    values: BTreeMap<VarId, BigRational>,
    stats: LraStats,
}

impl LraModule {
    /// Create the module around its base.
    pub fn new(base: ModuleBase) -> Self {
        let config = base.config().lra.clone();
        Self {
            base,
            config,
            tableau: Tableau::new(),
            nonlinear: Vec::new(),
            disequalities: Vec::new(),
            non_literals: 0,
            processed: ProcessedMatrices::default(),
            gomory_cuts: 0,
            needs_restore: false,
            simplex_sat: false,
            values: BTreeMap::new(),
            stats: LraStats::default(),
        }
    }

    /// Statistics.
    pub fn stats(&self) -> &LraStats {
        &self.stats
    }

    /// The Simplex tableau.
    pub fn tableau(&self) -> &Tableau {
        &self.tableau
    }

    /// The constraint behind an arithmetic literal, informing negations.
    fn literal(&mut self, formula: &Formula) -> Option<Arc<Constraint>> {
        match formula.kind() {
            FormulaKind::Constraint(c) => Some(Arc::clone(c)),
            FormulaKind::Not(inner) => {
                let c = inner.as_constraint()?;
                let negated = self.base.pool().negation(c);
                self.inform(&negated);
                Some(negated)
            }
            _ => None,
        }
    }

    fn origins_of(&self, bounds: &[BoundId]) -> FormulaSet {
        bounds
            .iter()
            .filter_map(|b| self.tableau.bound(*b).first_origin())
            .cloned()
            .collect()
    }

    fn add_conflict(&mut self, bounds: &[BoundId]) {
        let subset = self.origins_of(bounds);
        if subset.is_empty() {
            return;
        }
        trace!(size = subset.len(), "lra infeasible subset");
        self.stats.conflicts += 1;
        self.base.add_infeasible_subset(subset);
    }

    fn learn_refinements(&mut self, basic: VariableId) {
        for refinement in self.tableau.refine_row(basic) {
            let Some(implied) = self.tableau.bound(refinement.bound).constraint().cloned() else {
                continue;
            };
            let mut clause: Vec<Formula> = self
                .origins_of(&refinement.premises)
                .into_iter()
                .map(Formula::mk_not)
                .collect();
            clause.push(Formula::from(implied));
            if self.base.add_deduction(Formula::mk_or(clause)) {
                self.tableau.mark_deduced(refinement.bound);
                self.stats.refinements += 1;
            }
        }
    }

    /// Split violated disequalities; returns whether a lemma was emitted.
    ///
    /// Only `¬(p≠0) ∨ p<0 ∨ p>0` is emitted. The converse clauses
    /// `¬(p<0) ∨ p≠0` and `¬(p>0) ∨ p≠0` need no lemma: asserting `¬(p≠0)`
    /// reaches this module as the equality `p=0`, whose bounds conflict with
    /// `p<0` or `p>0` in the tableau itself.
    fn split_disequalities(&mut self) -> bool {
        let pool = Arc::clone(self.base.pool());
        let mut split = false;
        for (formula, c) in &self.disequalities {
            if c.evaluate(|v| self.values.get(&v).cloned()) != Some(false) {
                continue;
            }
            let (Ok(less), Ok(greater)) = (
                pool.constraint(c.lhs().clone(), Relation::Less),
                pool.constraint(c.lhs().clone(), Relation::Greater),
            ) else {
                continue;
            };
            let lemma = Formula::mk_or(vec![
                Formula::mk_not(formula.clone()),
                Formula::from(less),
                Formula::from(greater),
            ]);
            self.base.add_deduction(lemma);
            self.stats.neq_splits += 1;
            split = true;
        }
        split
    }

    /// Emit a branch or cut for a fractional integer variable; returns
    /// whether a lemma was emitted.
    fn resolve_integers(&mut self) -> bool {
        let candidates = integer::fractional_candidates(&self.tableau, &self.values);
        let Some(candidate) =
            integer::select_candidate(&self.tableau, &candidates, self.config.branching).cloned()
        else {
            return false;
        };
        let pool = Arc::clone(self.base.pool());

        let cut = match self.config.integer_strategy {
            IntegerStrategy::BranchAndBound => Ok(None),
            IntegerStrategy::GomoryCuts if self.gomory_cuts < self.config.max_gomory_cuts => {
                integer::gomory_cut(&self.tableau, &pool, candidate.column)
            }
            IntegerStrategy::GomoryCuts => Ok(None),
            IntegerStrategy::CutsFromProofs => {
                integer::cut_from_proofs(&self.tableau, &pool, &mut self.processed)
            }
        };
        let lemma = match cut {
            Ok(Some(lemma)) => {
                match self.config.integer_strategy {
                    IntegerStrategy::GomoryCuts => {
                        self.gomory_cuts += 1;
                        self.stats.gomory_cuts += 1;
                    }
                    _ => self.stats.proof_cuts += 1,
                }
                lemma
            }
            Ok(None) => match integer::branch_lemma(&pool, candidate.var, &candidate.value) {
                Ok(lemma) => {
                    self.stats.branches += 1;
                    lemma
                }
                Err(err) => {
                    warn!(%err, "cannot build branch lemma");
                    return false;
                }
            },
            Err(err) => {
                warn!(%err, "cannot build cut");
                return false;
            }
        };
        debug!(var = %candidate.var, value = %candidate.value, "integer lemma");
        self.base.add_deduction(lemma);
        true
    }

    /// Received linear literals connected to the nonlinear constraints
    /// through shared variables.
    fn nonlinear_neighbourhood(&mut self) -> Vec<Formula> {
        let mut vars: BTreeSet<VarId> = self
            .nonlinear
            .iter()
            .flat_map(|(_, c)| c.variables())
            .collect();
        let linear: Vec<(Formula, BTreeSet<VarId>)> = self
            .base
            .received()
            .to_vec()
            .into_iter()
            .filter_map(|f| {
                let c = self.literal(&f)?;
                c.is_linear().then(|| (f, c.variables()))
            })
            .collect();
        let mut taken = vec![false; linear.len()];
        loop {
            let mut grew = false;
            for (i, (_, used)) in linear.iter().enumerate() {
                if !taken[i] && !used.is_disjoint(&vars) {
                    taken[i] = true;
                    vars.extend(used.iter().copied());
                    grew = true;
                }
            }
            if !grew {
                break;
            }
        }
        let mut wanted: Vec<Formula> = self.nonlinear.iter().map(|(f, _)| f.clone()).collect();
        wanted.extend(
            linear
                .into_iter()
                .zip(taken)
                .filter(|(_, t)| *t)
                .map(|((f, _), _)| f),
        );
        wanted
    }

    fn sync_passed(&mut self, wanted: &[Formula]) {
        let mut index = self.base.passed().len();
        while index > 0 {
            index -= 1;
            if !wanted.contains(&self.base.passed()[index].formula) {
                self.base.remove_passed(index);
            }
        }
        for formula in wanted {
            if self.base.find_passed(formula).is_none() {
                self.base
                    .add_passed(formula.clone(), FormulaSet::from([formula.clone()]));
            }
        }
    }

    fn on_feasible(&mut self, full: bool, cancel: &CancellationToken) -> Answer {
        if self.config.restore_assignment {
            self.tableau.store_assignment();
        }
        self.values = self.tableau.rational_assignment();

        if self.split_disequalities() {
            return Answer::Unknown;
        }
        if full && self.resolve_integers() {
            return Answer::Unknown;
        }
        let satisfied = self
            .nonlinear
            .iter()
            .all(|(_, c)| c.evaluate(|v| self.values.get(&v).cloned()) == Some(true));
        if satisfied {
            self.simplex_sat = true;
            return Answer::Sat;
        }

        let wanted = self.nonlinear_neighbourhood();
        self.sync_passed(&wanted);
        debug!(passed = wanted.len(), "lra delegates nonlinear constraints");
        self.base.run_backends(full, cancel)
    }
}

impl Module for LraModule {
    fn base(&self) -> &ModuleBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ModuleBase {
        &mut self.base
    }

    fn inform_core(&mut self, constraint: &Arc<Constraint>) -> bool {
        let pool = Arc::clone(self.base.pool());
        match self.tableau.new_bound(constraint, &pool) {
            Ok(_) => true,
            Err(BoundError::NonLinear(_)) => {
                for var in constraint.variables() {
                    self.tableau.ensure_original(var, pool.is_integer(var));
                }
                true
            }
            Err(BoundError::Constant(_)) => constraint.consistency().unwrap_or(true),
        }
    }

    fn add_core(&mut self, formula: &Formula) -> bool {
        let Some(c) = self.literal(formula) else {
            self.non_literals += 1;
            return true;
        };
        if let Some(consistent) = c.consistency() {
            if !consistent {
                self.base
                    .add_infeasible_subset(FormulaSet::from([formula.clone()]));
            }
            return consistent;
        }
        if !c.is_linear() {
            self.nonlinear.push((formula.clone(), c));
            return true;
        }
        if c.relation() == Relation::Neq {
            self.disequalities.push((formula.clone(), c));
            return true;
        }
        let mut consistent = true;
        for bound in self.tableau.bounds_of(c.id()).to_vec() {
            if let Some((lower, upper)) = self.tableau.activate_bound(bound, formula.clone()) {
                self.add_conflict(&[lower, upper]);
                consistent = false;
            }
        }
        consistent
    }

    fn remove_core(&mut self, formula: &Formula) {
        let Some(c) = self.literal(formula) else {
            self.non_literals = self.non_literals.saturating_sub(1);
            return;
        };
        if c.consistency().is_some() {
            return;
        }
        let list = if !c.is_linear() {
            &mut self.nonlinear
        } else if c.relation() == Relation::Neq {
            &mut self.disequalities
        } else {
            for bound in self.tableau.bounds_of(c.id()).to_vec() {
                self.tableau.deactivate_bound(bound, formula);
            }
            self.needs_restore = true;
            return;
        };
        if let Some(pos) = list.iter().position(|(f, _)| f == formula) {
            list.remove(pos);
        }
    }

    fn check_core(&mut self, full: bool, cancel: &CancellationToken) -> Answer {
        self.stats.checks += 1;
        self.simplex_sat = false;
        if self.non_literals > 0 {
            debug!(count = self.non_literals, "lra received non-literal formulas");
            return Answer::Unknown;
        }
        if self.base.has_infeasible_subset() {
            return Answer::Unsat;
        }
        let conflicts = self.tableau.bound_conflicts();
        if !conflicts.is_empty() {
            for (lower, upper) in conflicts {
                self.add_conflict(&[lower, upper]);
            }
            return Answer::Unsat;
        }
        if self.needs_restore {
            if self.config.restore_assignment {
                self.tableau.restore_assignment();
            } else {
                self.tableau.clamp_nonbasics();
            }
            self.needs_restore = false;
        }

        let mut pivots = 0usize;
        loop {
            if cancel.is_cancelled() {
                debug!("lra check cancelled");
                return Answer::Unknown;
            }
            let bland = pivots >= self.config.bland_threshold;
            match self.tableau.next_pivoting_element(bland) {
                PivotDecision::Pivot { row, column } => {
                    self.tableau.pivot(row, column);
                    pivots += 1;
                    self.stats.pivots += 1;
                    if self.config.learn_refinements {
                        self.learn_refinements(column);
                    }
                }
                PivotDecision::Conflict { row } => {
                    let explanations = match self.config.conflict_policy {
                        ConflictPolicy::OneReason => vec![self.tableau.conflict(row)],
                        ConflictPolicy::AllReasons => self.tableau.conflicts_from(row),
                    };
                    for explanation in explanations {
                        self.add_conflict(&explanation);
                    }
                    debug_assert!(self.base.has_infeasible_subset());
                    return Answer::Unsat;
                }
                PivotDecision::Feasible => return self.on_feasible(full, cancel),
            }
        }
    }

    fn update_model(&mut self) {
        if self.simplex_sat {
            self.base.model_mut().clear();
        }
        let model = self.base.model_mut();
        for (var, value) in &self.values {
            if model.arith(*var).is_none() {
                model.set_arith(*var, value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::{
        BranchingStrategy, ConstraintPool, FactoryRegistry, ModuleType, SolverConfig, SolverContext,
        StrategyGraph,
    };

    fn context(lra: LraConfig) -> Arc<SolverContext> {
        let mut factories = FactoryRegistry::new();
        factories.register(ModuleType::Lra, |base| Box::new(LraModule::new(base)));
        SolverContext::new(
            Arc::new(ConstraintPool::new()),
            SolverConfig::default().with_lra(lra),
            StrategyGraph::new(ModuleType::Lra),
            factories,
        )
        .unwrap()
    }

    fn module(context: &Arc<SolverContext>) -> LraModule {
        LraModule::new(ModuleBase::new(
            ModuleType::Lra,
            StrategyGraph::ROOT,
            Arc::clone(context),
        ))
    }

    fn lit(c: Arc<Constraint>) -> Formula {
        Formula::from(c)
    }

    fn rat(n: i64) -> BigRational {
        BigRational::from_integer(n.into())
    }

    #[test]
    fn test_feasible_model_satisfies_constraints() {
        let ctx = context(LraConfig::default());
        let pool = ctx.pool();
        let x = pool.declare_real("x");
        let y = pool.declare_real("y");
        let formulas = [
            lit(pool.linear(&[(x, 1), (y, 1)], Relation::Leq, 3).unwrap()),
            lit(pool.linear(&[(x, 1)], Relation::Geq, 1).unwrap()),
            lit(pool.linear(&[(y, 1)], Relation::Greater, 1).unwrap()),
        ];
        let mut lra = module(&ctx);
        for f in &formulas {
            assert!(lra.add(f));
        }
        assert_eq!(lra.check(true, &CancellationToken::new()), Answer::Sat);
        for f in &formulas {
            assert_eq!(f.evaluate(lra.model()), Some(true), "{f}");
        }
    }

    #[test]
    fn test_unsat_core_from_row() {
        let ctx = context(LraConfig::default());
        let pool = ctx.pool();
        let x = pool.declare_real("x");
        let y = pool.declare_real("y");
        let sum = lit(pool.linear(&[(x, 1), (y, 1)], Relation::Leq, 1).unwrap());
        let lx = lit(pool.linear(&[(x, 1)], Relation::Geq, 2).unwrap());
        let ly = lit(pool.linear(&[(y, 1)], Relation::Geq, 0).unwrap());
        let unrelated = lit(pool.linear(&[(x, 1)], Relation::Leq, 10).unwrap());
        let mut lra = module(&ctx);
        for f in [&sum, &lx, &ly, &unrelated] {
            lra.add(f);
        }
        assert_eq!(lra.check(true, &CancellationToken::new()), Answer::Unsat);
        let subset = &lra.infeasible_subsets()[0];
        assert_eq!(subset, &FormulaSet::from([sum.clone(), lx.clone(), ly.clone()]));

        lra.remove(&lx);
        assert_eq!(lra.check(true, &CancellationToken::new()), Answer::Sat);
        assert!(lra.stats().conflicts >= 1);
    }

    #[test]
    fn test_activation_conflict_is_immediate() {
        let ctx = context(LraConfig::default());
        let pool = ctx.pool();
        let x = pool.declare_real("x");
        let low = lit(pool.linear(&[(x, 1)], Relation::Geq, 1).unwrap());
        let high = lit(pool.linear(&[(x, 1)], Relation::Less, 1).unwrap());
        let mut lra = module(&ctx);
        assert!(lra.add(&low));
        assert!(!lra.add(&high));
        assert_eq!(lra.check(false, &CancellationToken::new()), Answer::Unsat);
        assert_eq!(lra.infeasible_subsets()[0].len(), 2);
    }

    #[test]
    fn test_negated_literal_and_constant() {
        let ctx = context(LraConfig::default());
        let pool = ctx.pool();
        let x = pool.declare_real("x");
        // ¬(x <= 0) is x > 0
        let positive = Formula::mk_not(lit(pool.linear(&[(x, 1)], Relation::Leq, 0).unwrap()));
        let mut lra = module(&ctx);
        lra.add(&positive);
        assert_eq!(lra.check(true, &CancellationToken::new()), Answer::Sat);
        assert!(lra.model().arith(x).is_some_and(|v| *v > rat(0)));

        let falsum = lit(pool
            .constraint(strata_core::Polynomial::constant(rat(1)), Relation::Leq)
            .unwrap());
        assert!(!lra.add(&falsum));
        assert_eq!(lra.check(true, &CancellationToken::new()), Answer::Unsat);
        assert_eq!(lra.infeasible_subsets()[0], FormulaSet::from([falsum]));
    }

    #[test]
    fn test_disequality_split() {
        let ctx = context(LraConfig::default());
        let pool = ctx.pool();
        let x = pool.declare_real("x");
        let zero = lit(pool.linear(&[(x, 1)], Relation::Leq, 0).unwrap());
        let neq = lit(pool.linear(&[(x, 1)], Relation::Neq, 0).unwrap());
        let low = lit(pool.linear(&[(x, 1)], Relation::Geq, 0).unwrap());
        let mut lra = module(&ctx);
        for f in [&zero, &neq, &low] {
            lra.add(f);
        }
        assert_eq!(lra.check(true, &CancellationToken::new()), Answer::Unknown);
        let lemmas = lra.take_deductions();
        assert_eq!(lemmas.len(), 1);
        assert_eq!(lemmas[0].atoms().len(), 3);
        assert_eq!(lra.stats().neq_splits, 1);

        // The converse direction holds without a lemma: ¬(x≠0) is x=0.
        let mut lra = module(&ctx);
        let not_neq = Formula::mk_not(neq.clone());
        let less = lit(pool.linear(&[(x, 1)], Relation::Less, 0).unwrap());
        assert!(lra.add(&less));
        assert!(!lra.add(&not_neq));
        assert_eq!(lra.check(true, &CancellationToken::new()), Answer::Unsat);
        assert_eq!(lra.infeasible_subsets()[0], FormulaSet::from([less, not_neq]));
    }

    #[test]
    fn test_integer_bounds_are_rounded() {
        let ctx = context(LraConfig::default());
        let pool = ctx.pool();
        let x = pool.declare_int("x");
        // 1 <= 2x <= 1 has no integer solution: x >= 1 and x <= 0
        let low = lit(pool.linear(&[(x, 2)], Relation::Geq, 1).unwrap());
        let high = lit(pool.linear(&[(x, 2)], Relation::Leq, 1).unwrap());
        let mut lra = module(&ctx);
        lra.add(&low);
        lra.add(&high);
        assert_eq!(lra.check(true, &CancellationToken::new()), Answer::Unsat);
    }

    #[test]
    fn test_branch_lemma_for_fractional_value() {
        let ctx = context(LraConfig::default().with_branching(BranchingStrategy::FirstFound));
        let pool = ctx.pool();
        let x = pool.declare_int("x");
        let y = pool.declare_int("y");
        let sum = lit(pool.linear(&[(x, 1), (y, 1)], Relation::Eq, 3).unwrap());
        let diff = lit(pool.linear(&[(x, 1), (y, -1)], Relation::Eq, 0).unwrap());
        let mut lra = module(&ctx);
        lra.add(&sum);
        lra.add(&diff);
        // Partial checks accept the relaxation.
        assert_eq!(lra.check(false, &CancellationToken::new()), Answer::Sat);
        assert_eq!(lra.check(true, &CancellationToken::new()), Answer::Unknown);
        let lemmas = lra.take_deductions();
        assert_eq!(lemmas.len(), 1);
        assert_eq!(lra.stats().branches, 1);
    }

    #[test]
    fn test_cuts_from_proofs_lemma() {
        let ctx = context(LraConfig::default().with_integer_strategy(IntegerStrategy::CutsFromProofs));
        let pool = ctx.pool();
        let x = pool.declare_int("x");
        let y = pool.declare_int("y");
        let sum = lit(pool.linear(&[(x, 1), (y, 1)], Relation::Eq, 3).unwrap());
        let diff = lit(pool.linear(&[(x, 1), (y, -1)], Relation::Eq, 0).unwrap());
        let mut lra = module(&ctx);
        lra.add(&sum);
        lra.add(&diff);
        assert_eq!(lra.check(true, &CancellationToken::new()), Answer::Unknown);
        assert_eq!(lra.stats().proof_cuts, 1);
        assert_eq!(lra.take_deductions().len(), 1);
    }

    #[test]
    fn test_non_literal_gives_unknown() {
        let ctx = context(LraConfig::default());
        let pool = ctx.pool();
        let b = pool.declare_bool("b");
        let mut lra = module(&ctx);
        let f = Formula::mk_bool(b);
        lra.add(&f);
        assert_eq!(lra.check(true, &CancellationToken::new()), Answer::Unknown);
        lra.remove(&f);
        assert_eq!(lra.check(true, &CancellationToken::new()), Answer::Sat);
    }

    #[test]
    fn test_cancelled_check_is_unknown() {
        let ctx = context(LraConfig::default());
        let pool = ctx.pool();
        let x = pool.declare_real("x");
        let mut lra = module(&ctx);
        lra.add(&lit(pool.linear(&[(x, 1)], Relation::Geq, 1).unwrap()));
        let flag = Arc::new(std::sync::atomic::AtomicBool::new(true));
        let token = CancellationToken::from_flag(flag);
        assert_eq!(lra.check(true, &token), Answer::Unknown);
    }

    #[test]
    fn test_nonlinear_checked_by_substitution() {
        let ctx = context(LraConfig::default());
        let pool = ctx.pool();
        let x = pool.declare_real("x");
        let y = pool.declare_real("y");
        let fix_x = lit(pool.linear(&[(x, 1)], Relation::Eq, 2).unwrap());
        let fix_y = lit(pool.linear(&[(y, 1)], Relation::Eq, 3).unwrap());
        let xy = &strata_core::Polynomial::var(x) * &strata_core::Polynomial::var(y);
        let product = lit(pool
            .constraint(&xy - &strata_core::Polynomial::constant(rat(6)), Relation::Eq)
            .unwrap());
        let mut lra = module(&ctx);
        for f in [&fix_x, &fix_y, &product] {
            lra.add(f);
        }
        assert_eq!(lra.check(true, &CancellationToken::new()), Answer::Sat);

        // Without a nonlinear backend an unsatisfied product stays undecided.
        let other = lit(pool
            .constraint(&xy - &strata_core::Polynomial::constant(rat(7)), Relation::Eq)
            .unwrap());
        lra.add(&other);
        assert_eq!(lra.check(true, &CancellationToken::new()), Answer::Unknown);
        assert_eq!(lra.base().passed().len(), 4);
    }

    #[test]
    fn test_retraction_without_restore_keeps_bounds() {
        let ctx = context(LraConfig::default().with_restore_assignment(false));
        let pool = ctx.pool();
        let x = pool.declare_real("x");
        let low = lit(pool.linear(&[(x, 1)], Relation::Geq, 1).unwrap());
        let high = lit(pool.linear(&[(x, 1)], Relation::Leq, 0).unwrap());
        let mut lra = module(&ctx);
        assert!(lra.add(&low));
        assert!(!lra.add(&high));
        lra.remove(&low);
        assert_eq!(lra.check(true, &CancellationToken::new()), Answer::Sat);
        assert!(lra.tableau().nonbasics_within_bounds());
        assert_eq!(high.evaluate(lra.model()), Some(true));
    }

    #[test]
    fn test_bland_rule_from_first_pivot() {
        for threshold in [0, 100] {
            let ctx = context(LraConfig::default().with_bland_threshold(threshold));
            let pool = ctx.pool();
            let x = pool.declare_real("x");
            let y = pool.declare_real("y");
            let formulas = [
                lit(pool.linear(&[(x, 1), (y, 1)], Relation::Geq, 4).unwrap()),
                lit(pool.linear(&[(x, 1), (y, -1)], Relation::Geq, 1).unwrap()),
                lit(pool.linear(&[(x, 2), (y, 1)], Relation::Leq, 20).unwrap()),
                lit(pool.linear(&[(x, 1), (y, 3)], Relation::Geq, 6).unwrap()),
            ];
            let mut lra = module(&ctx);
            for f in &formulas {
                lra.add(f);
            }
            assert_eq!(lra.check(true, &CancellationToken::new()), Answer::Sat);
            assert!(lra.stats().pivots >= 1, "threshold {threshold}");
            for f in &formulas {
                assert_eq!(f.evaluate(lra.model()), Some(true), "{f} with threshold {threshold}");
            }
        }
    }

    #[test]
    fn test_one_reason_policy() {
        let mut counts = Vec::new();
        for policy in [ConflictPolicy::OneReason, ConflictPolicy::AllReasons] {
            let ctx = context(LraConfig::default().with_conflict_policy(policy));
            let pool = ctx.pool();
            let vars: Vec<_> = ["x", "y", "z", "w"].iter().map(|n| pool.declare_real(n)).collect();
            let mut lra = module(&ctx);
            for pair in vars.chunks(2) {
                let (a, b) = (pair[0], pair[1]);
                lra.add(&lit(pool.linear(&[(a, 1), (b, 1)], Relation::Leq, 1).unwrap()));
                lra.add(&lit(pool.linear(&[(a, 1)], Relation::Geq, 1).unwrap()));
                lra.add(&lit(pool.linear(&[(b, 1)], Relation::Geq, 1).unwrap()));
            }
            assert_eq!(lra.check(true, &CancellationToken::new()), Answer::Unsat);
            assert!(lra.infeasible_subsets().iter().all(|s| s.len() == 3));
            counts.push(lra.infeasible_subsets().len());
        }
        assert_eq!(counts, vec![1, 2]);
    }

    #[test]
    fn test_refinement_lemma_after_pivot() {
        let ctx = context(LraConfig::default().with_refinements());
        let pool = ctx.pool();
        let x = pool.declare_real("x");
        let y = pool.declare_real("y");
        let implied = pool.linear(&[(x, 1)], Relation::Geq, 2).unwrap();
        let sum = lit(pool.linear(&[(x, 1), (y, 1)], Relation::Geq, 4).unwrap());
        let fix_y = lit(pool.linear(&[(y, 1)], Relation::Eq, 1).unwrap());
        let mut lra = module(&ctx);
        lra.inform(&implied);
        lra.add(&fix_y);
        lra.add(&sum);
        // y is fixed, so the sum row can only pivot on x, whose row x = s - y
        // implies x >= 3.
        assert_eq!(lra.check(true, &CancellationToken::new()), Answer::Sat);
        assert_eq!(lra.stats().refinements, 1);
        let lemmas = lra.take_deductions();
        assert_eq!(lemmas.len(), 1);
        let atoms: Vec<_> = lemmas[0].atoms().iter().map(|c| c.id()).collect();
        assert_eq!(atoms.len(), 3);
        assert!(atoms.contains(&implied.id()));
        assert_eq!(lemmas[0].evaluate(lra.model()), Some(true));
        let bound = lra.tableau().bounds_of(implied.id())[0];
        assert!(lra.tableau().bound(bound).is_deduced());
    }
}
