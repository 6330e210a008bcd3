//! Reference Boolean Backend: DPLL(T) with Chronological Backtracking.
//!
//! The received formula is a conjunction of clauses over Boolean variables and
//! arithmetic atoms. Each constraint and its negation share one abstraction
//! variable with opposite polarities. The search:
//!
//! 1. propagates unit clauses to a fixpoint
//! 2. on conflict, flips the most recent unflipped decision
//! 3. decides the first unassigned literal of the first unsatisfied clause
//! 4. once every clause is satisfied, passes the assigned arithmetic literals
//!    to the backends and learns from their answer
//!
//! Theory deductions become clauses; theory infeasible subsets become
//! blocking clauses. Both are valid in the theory and therefore carry no
//! origins. An unsat core is the union of the origins of every clause used as
//! a conflict or a reason in the final search.
//!
//! ## References
//!
//! - Davis, Logemann & Loveland (1962): "A machine program for theorem-proving"
//! - Nieuwenhuis, Oliveras & Tinelli (2006): "Solving SAT and SAT Modulo
//!   Theories: From an Abstract DPLL Procedure to DPLL(T)"

pub mod literal;

pub use literal::{Lit, Var};

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use std::sync::Arc;
use strata_core::{
    Answer, BoolVarId, CancellationToken, Constraint, ConstraintId, Formula, FormulaKind, FormulaSet,
    Module, ModuleBase, SatConfig,
};
use tracing::{debug, trace, warn};

type Lits = SmallVec<[Lit; 4]>;

/// What an abstraction variable stands for.
#[derive(Debug, Clone)]
enum Atom {
    Bool(BoolVarId),
    Theory {
        positive: Arc<Constraint>,
        negative: Arc<Constraint>,
    },
}

#[derive(Debug, Clone)]
struct Clause {
    lits: Lits,
    origins: FormulaSet,
    learned: bool,
}

#[derive(Debug, Clone, Copy)]
struct TrailEntry {
    lit: Lit,
    /// Clause that propagated the literal; `None` for decisions.
    reason: Option<usize>,
    /// Decision whose other polarity was already refuted.
    flipped: bool,
}

/// Shape of a formula read as a clause.
enum ClauseShape {
    Tautology,
    Clause(Lits),
    NotClausal,
}

/// Shape of a formula read as a literal.
enum LitShape {
    True,
    False,
    Lit(Lit),
}

/// Statistics of a [`SatModule`].
#[derive(Debug, Clone, Default)]
pub struct SatStats {
    /// Calls to `check`.
    pub checks: u64,
    /// Decisions.
    pub decisions: u64,
    /// Unit propagations.
    pub propagations: u64,
    /// Boolean conflicts.
    pub conflicts: u64,
    /// Rounds in which backends were consulted.
    pub theory_calls: u64,
    /// Theory deductions turned into clauses.
    pub lemmas: u64,
    /// Blocking clauses learned from theory conflicts.
    pub blocking_clauses: u64,
}

/// DPLL(T) search over the Boolean abstraction of its clauses.
#[derive(Debug)]
pub struct SatModule {
    base: ModuleBase,
    config: SatConfig,
    atoms: Vec<Atom>,
    bool_vars: FxHashMap<BoolVarId, Var>,
    theory_vars: FxHashMap<ConstraintId, Var>,
    clauses: Vec<Clause>,
    learned_set: FxHashSet<Lits>,
    /// Received formulas that are not clauses.
    non_clausal: Vec<Formula>,
    values: Vec<Option<bool>>,
    reasons: Vec<Option<usize>>,
    trail: Vec<TrailEntry>,
    used: FormulaSet,
    /// Passed arithmetic literals and their abstraction literal.
    passed_literals: FxHashMap<Formula, Lit>,
    stats: SatStats,
}

impl SatModule {
    /// Create the module around its base.
    pub fn new(base: ModuleBase) -> Self {
        let config = base.config().sat.clone();
        Self {
            base,
            config,
            atoms: Vec::new(),
            bool_vars: FxHashMap::default(),
            theory_vars: FxHashMap::default(),
            clauses: Vec::new(),
            learned_set: FxHashSet::default(),
            non_clausal: Vec::new(),
            values: Vec::new(),
            reasons: Vec::new(),
            trail: Vec::new(),
            used: FormulaSet::new(),
            passed_literals: FxHashMap::default(),
            stats: SatStats::default(),
        }
    }

    /// Statistics.
    pub fn stats(&self) -> &SatStats {
        &self.stats
    }

    /// Number of abstraction variables.
    pub fn num_vars(&self) -> usize {
        self.atoms.len()
    }

    /// Number of clauses, learned ones included.
    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    // ----- abstraction -----

    fn new_var(&mut self, atom: Atom) -> Var {
        let var = Var::new(self.atoms.len());
        self.atoms.push(atom);
        var
    }

    fn bool_lit(&mut self, b: BoolVarId) -> Lit {
        let var = match self.bool_vars.get(&b) {
            Some(&var) => var,
            None => {
                let var = self.new_var(Atom::Bool(b));
                self.bool_vars.insert(b, var);
                var
            }
        };
        Lit::positive(var)
    }

    fn theory_lit(&mut self, c: &Arc<Constraint>) -> Lit {
        let negation = self.base.pool().negation(c);
        self.inform(c);
        self.inform(&negation);
        let key = c.id().min(negation.id());
        let var = match self.theory_vars.get(&key) {
            Some(&var) => var,
            None => {
                let (positive, negative) = if c.id() == key {
                    (Arc::clone(c), negation)
                } else {
                    (negation, Arc::clone(c))
                };
                let var = self.new_var(Atom::Theory { positive, negative });
                self.theory_vars.insert(key, var);
                var
            }
        };
        Lit::new(var, c.id() == key)
    }

    fn literal_of(&mut self, formula: &Formula) -> Option<LitShape> {
        match formula.kind() {
            FormulaKind::True => Some(LitShape::True),
            FormulaKind::False => Some(LitShape::False),
            FormulaKind::Bool(b) => Some(LitShape::Lit(self.bool_lit(*b))),
            FormulaKind::Constraint(c) => Some(match c.consistency() {
                Some(true) => LitShape::True,
                Some(false) => LitShape::False,
                None => LitShape::Lit(self.theory_lit(c)),
            }),
            FormulaKind::Not(inner) if inner.is_literal() => match self.literal_of(inner)? {
                LitShape::True => Some(LitShape::False),
                LitShape::False => Some(LitShape::True),
                LitShape::Lit(lit) => Some(LitShape::Lit(lit.negate())),
            },
            _ => None,
        }
    }

    fn clause_of(&mut self, formula: &Formula) -> ClauseShape {
        let disjuncts: Vec<Formula> = match formula.kind() {
            FormulaKind::Or(args) => args.clone(),
            _ => vec![formula.clone()],
        };
        let mut lits = Lits::new();
        for disjunct in &disjuncts {
            match self.literal_of(disjunct) {
                None => return ClauseShape::NotClausal,
                Some(LitShape::True) => return ClauseShape::Tautology,
                Some(LitShape::False) => {}
                Some(LitShape::Lit(lit)) => {
                    if lits.contains(&lit.negate()) {
                        return ClauseShape::Tautology;
                    }
                    if !lits.contains(&lit) {
                        lits.push(lit);
                    }
                }
            }
        }
        ClauseShape::Clause(lits)
    }

    fn add_learned(&mut self, mut lits: Lits) -> bool {
        lits.sort_unstable();
        lits.dedup();
        if lits.is_empty() || !self.learned_set.insert(lits.clone()) {
            return false;
        }
        trace!(size = lits.len(), "learned clause");
        self.clauses.push(Clause {
            lits,
            origins: FormulaSet::new(),
            learned: true,
        });
        true
    }

    // ----- search -----

    fn lit_value(&self, lit: Lit) -> Option<bool> {
        self.values[lit.var().index()].map(|v| lit.value_under(v))
    }

    fn assign(&mut self, lit: Lit, reason: Option<usize>, flipped: bool) {
        self.values[lit.var().index()] = Some(lit.is_positive());
        self.reasons[lit.var().index()] = reason;
        self.trail.push(TrailEntry {
            lit,
            reason,
            flipped,
        });
    }

    /// Unit propagation to a fixpoint; returns a falsified clause.
    fn propagate(&mut self) -> Option<usize> {
        loop {
            let mut changed = false;
            for index in 0..self.clauses.len() {
                let mut unassigned = None;
                let mut open = 0usize;
                let mut satisfied = false;
                for &lit in &self.clauses[index].lits {
                    match self.lit_value(lit) {
                        Some(true) => {
                            satisfied = true;
                            break;
                        }
                        Some(false) => {}
                        None => {
                            open += 1;
                            unassigned = Some(lit);
                        }
                    }
                }
                if satisfied {
                    continue;
                }
                match (open, unassigned) {
                    (0, _) => return Some(index),
                    (1, Some(lit)) => {
                        self.assign(lit, Some(index), false);
                        self.stats.propagations += 1;
                        changed = true;
                    }
                    _ => {}
                }
            }
            if !changed {
                return None;
            }
        }
    }

    /// Record the origins of a conflict clause and of every reason clause
    /// its literals depend on.
    fn explain(&mut self, conflict: usize) {
        let mut seen = FxHashSet::default();
        let mut stack = vec![conflict];
        while let Some(index) = stack.pop() {
            if !seen.insert(index) {
                continue;
            }
            let clause = &self.clauses[index];
            self.used.extend(clause.origins.iter().cloned());
            stack.extend(clause.lits.iter().filter_map(|l| self.reasons[l.var().index()]));
        }
    }

    /// Undo the trail up to the most recent unflipped decision and flip it.
    fn backtrack(&mut self) -> bool {
        while let Some(entry) = self.trail.pop() {
            self.values[entry.lit.var().index()] = None;
            self.reasons[entry.lit.var().index()] = None;
            if entry.reason.is_none() && !entry.flipped {
                self.assign(entry.lit.negate(), None, true);
                return true;
            }
        }
        false
    }

    fn pick_decision(&self) -> Option<Lit> {
        self.clauses.iter().find_map(|clause| {
            if clause.lits.iter().any(|l| self.lit_value(*l) == Some(true)) {
                return None;
            }
            clause
                .lits
                .iter()
                .copied()
                .find(|l| self.lit_value(*l).is_none())
        })
    }

    fn search(&mut self, cancel: &CancellationToken) -> Answer {
        self.values = vec![None; self.atoms.len()];
        self.reasons = vec![None; self.atoms.len()];
        self.trail.clear();
        self.used.clear();
        let mut decisions = 0u64;
        loop {
            if let Some(conflict) = self.propagate() {
                self.stats.conflicts += 1;
                self.explain(conflict);
                if !self.backtrack() {
                    return Answer::Unsat;
                }
                continue;
            }
            if cancel.is_cancelled() {
                debug!("sat search cancelled");
                return Answer::Unknown;
            }
            let Some(lit) = self.pick_decision() else {
                return Answer::Sat;
            };
            if self.config.max_decisions != 0 && decisions >= self.config.max_decisions {
                debug!(decisions, "decision limit reached");
                return Answer::Unknown;
            }
            decisions += 1;
            self.stats.decisions += 1;
            self.assign(lit, None, false);
        }
    }

    // ----- theory interaction -----

    fn theory_literals(&self) -> Vec<(Formula, Lit)> {
        self.trail
            .iter()
            .filter_map(|entry| match &self.atoms[entry.lit.var().index()] {
                Atom::Theory { positive, negative } => {
                    let c = if entry.lit.is_positive() { positive } else { negative };
                    Some((Formula::from(Arc::clone(c)), entry.lit))
                }
                Atom::Bool(_) => None,
            })
            .collect()
    }

    fn sync_passed(&mut self, literals: &[(Formula, Lit)]) {
        self.passed_literals = literals.iter().cloned().collect();
        let mut index = self.base.passed().len();
        while index > 0 {
            index -= 1;
            if !self.passed_literals.contains_key(&self.base.passed()[index].formula) {
                self.base.remove_passed(index);
            }
        }
        for (formula, _) in literals {
            if self.base.find_passed(formula).is_none() {
                self.base.add_passed(formula.clone(), FormulaSet::new());
            }
        }
    }

    /// Turn backend deductions and infeasible subsets into clauses; returns
    /// how many new clauses were learned.
    fn learn_from_backends(&mut self, answer: Answer) -> usize {
        let mut learned = 0;
        for lemma in self.base.take_deductions() {
            match self.clause_of(&lemma) {
                ClauseShape::Clause(lits) => {
                    if self.add_learned(lits) {
                        learned += 1;
                        self.stats.lemmas += 1;
                    }
                }
                ClauseShape::Tautology => {}
                ClauseShape::NotClausal => warn!(%lemma, "ignoring non-clausal deduction"),
            }
        }
        if answer == Answer::Unsat {
            for subset in self.base.backend_infeasible_subsets() {
                let blocking: Option<Lits> = subset
                    .iter()
                    .map(|f| self.passed_literals.get(f).map(|l| l.negate()))
                    .collect();
                match blocking {
                    Some(lits) => {
                        if self.add_learned(lits) {
                            learned += 1;
                            self.stats.blocking_clauses += 1;
                        }
                    }
                    None => warn!(size = subset.len(), "backend subset outside the passed formula"),
                }
            }
        }
        learned
    }
}

impl Module for SatModule {
    fn base(&self) -> &ModuleBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ModuleBase {
        &mut self.base
    }

    fn add_core(&mut self, formula: &Formula) -> bool {
        match self.clause_of(formula) {
            ClauseShape::Tautology => true,
            ClauseShape::NotClausal => {
                self.non_clausal.push(formula.clone());
                true
            }
            ClauseShape::Clause(lits) if lits.is_empty() => {
                self.base
                    .add_infeasible_subset(FormulaSet::from([formula.clone()]));
                false
            }
            ClauseShape::Clause(lits) => {
                self.clauses.push(Clause {
                    lits,
                    origins: FormulaSet::from([formula.clone()]),
                    learned: false,
                });
                true
            }
        }
    }

    fn remove_core(&mut self, formula: &Formula) {
        if let Some(pos) = self.non_clausal.iter().position(|f| f == formula) {
            self.non_clausal.remove(pos);
            return;
        }
        if let Some(pos) = self
            .clauses
            .iter()
            .position(|c| !c.learned && c.origins.contains(formula))
        {
            self.clauses.remove(pos);
        }
    }

    fn check_core(&mut self, full: bool, cancel: &CancellationToken) -> Answer {
        self.stats.checks += 1;
        if !self.non_clausal.is_empty() {
            debug!(count = self.non_clausal.len(), "sat received non-clausal formulas");
            return Answer::Unknown;
        }
        if self.base.has_infeasible_subset() {
            return Answer::Unsat;
        }
        let mut rounds = 0u64;
        loop {
            match self.search(cancel) {
                Answer::Sat => {}
                Answer::Unsat => {
                    let core = if self.used.is_empty() {
                        self.base.received().iter().cloned().collect()
                    } else {
                        self.used.clone()
                    };
                    debug!(size = core.len(), "boolean refutation");
                    self.base.add_infeasible_subset(core);
                    return Answer::Unsat;
                }
                Answer::Unknown => return Answer::Unknown,
            }

            let literals = self.theory_literals();
            self.sync_passed(&literals);
            if literals.is_empty() {
                self.base.model_mut().clear();
                return Answer::Sat;
            }
            rounds += 1;
            self.stats.theory_calls += 1;
            let answer = self.base.run_backends(full, cancel);
            let learned = self.learn_from_backends(answer);
            trace!(%answer, learned, rounds, "theory round");
            match answer {
                Answer::Sat => return Answer::Sat,
                _ if learned == 0 => return Answer::Unknown,
                _ => {}
            }
            if self.config.max_theory_rounds != 0 && rounds >= self.config.max_theory_rounds {
                debug!(rounds, "theory round limit reached");
                return Answer::Unknown;
            }
        }
    }

    fn update_model(&mut self) {
        let assignments: Vec<(BoolVarId, bool)> = self
            .atoms
            .iter()
            .enumerate()
            .filter_map(|(index, atom)| match atom {
                Atom::Bool(b) => Some((*b, self.values.get(index).copied().flatten().unwrap_or(false))),
                Atom::Theory { .. } => None,
            })
            .collect();
        let model = self.base.model_mut();
        for (b, value) in assignments {
            model.set_bool(b, value);
        }
    }
}
