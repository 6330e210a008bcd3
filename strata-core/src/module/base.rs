//! Shared Module State and Backend Orchestration.
//!
//! [`ModuleBase`] carries everything the [`Module`] protocol needs besides the
//! procedure itself:
//! - received formula, passed formula with origins, infeasible subsets, model,
//!   deductions
//! - backend slots, one per strategy branch, created lazily through the
//!   factories of the [`SolverContext`]
//!
//! ## Backend synchronisation
//!
//! Each slot remembers how many passed entries it has received. Additions
//! are pushed on the next [`ModuleBase::run_backends`]; removals are pushed
//! immediately to every slot that already holds the entry.
//!
//! ## Parallel portfolio
//!
//! With `parallel` enabled, sibling backends run on the context's thread pool.
//! The first definite answer raises a shared flag that the other siblings
//! observe through their [`CancellationToken`].

use super::{Answer, Module, ModuleId, ModuleState, ModuleType, SolverContext};
use crate::cancel::CancellationToken;
use crate::config::SolverConfig;
use crate::constraint::{Constraint, ConstraintId};
use crate::formula::{Formula, FormulaProperties, FormulaSet};
use crate::model::Model;
use crate::pool::ConstraintPool;
use crate::strategy::BranchId;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, trace};

/// A formula handed to backends, with the received formulas justifying it.
#[derive(Debug, Clone)]
pub struct PassedEntry {
    /// The passed formula.
    pub formula: Formula,
    /// Received formulas it was derived from.
    pub origins: FormulaSet,
}

struct BackendSlot {
    branch: BranchId,
    module: Box<dyn Module>,
    /// Passed entries `[0, synced)` have been added to the backend.
    synced: usize,
    last_answer: Answer,
}

/// State shared by every module.
pub struct ModuleBase {
    id: ModuleId,
    module_type: ModuleType,
    branch: BranchId,
    context: Arc<SolverContext>,
    informed: Vec<Arc<Constraint>>,
    informed_ids: FxHashSet<ConstraintId>,
    received: Vec<Formula>,
    passed: Vec<PassedEntry>,
    infeasible_subsets: Vec<FormulaSet>,
    model: Model,
    deductions: Vec<Formula>,
    deduction_set: FxHashSet<Formula>,
    backends: Vec<BackendSlot>,
    /// Slot indices consulted by the last `run_backends`, in priority order.
    used_backends: Vec<usize>,
    state: ModuleState,
    answer: Answer,
    last_full: bool,
}

impl std::fmt::Debug for ModuleBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleBase")
            .field("id", &self.id)
            .field("module_type", &self.module_type)
            .field("branch", &self.branch)
            .field("received", &self.received.len())
            .field("passed", &self.passed.len())
            .field("backends", &self.backends.len())
            .field("state", &self.state)
            .finish()
    }
}

impl ModuleBase {
    /// Create the state of a new module instance and register it with the context.
    #[must_use]
    pub fn new(module_type: ModuleType, branch: BranchId, context: Arc<SolverContext>) -> Self {
        let id = context.register_module(module_type, branch);
        Self {
            id,
            module_type,
            branch,
            context,
            informed: Vec::new(),
            informed_ids: FxHashSet::default(),
            received: Vec::new(),
            passed: Vec::new(),
            infeasible_subsets: Vec::new(),
            model: Model::new(),
            deductions: Vec::new(),
            deduction_set: FxHashSet::default(),
            backends: Vec::new(),
            used_backends: Vec::new(),
            state: ModuleState::Idle,
            answer: Answer::Unknown,
            last_full: false,
        }
    }

    /// Instance identifier.
    pub fn id(&self) -> ModuleId {
        self.id
    }

    /// Module type tag.
    pub fn module_type(&self) -> ModuleType {
        self.module_type
    }

    /// Strategy branch this instance sits on.
    pub fn branch(&self) -> BranchId {
        self.branch
    }

    /// Solver context.
    pub fn context(&self) -> &Arc<SolverContext> {
        &self.context
    }

    /// Constraint pool.
    pub fn pool(&self) -> &Arc<ConstraintPool> {
        self.context.pool()
    }

    /// Solver configuration.
    pub fn config(&self) -> &SolverConfig {
        self.context.config()
    }

    /// Lifecycle state.
    pub fn state(&self) -> ModuleState {
        self.state
    }

    /// Last answer.
    pub fn answer(&self) -> Answer {
        self.answer
    }

    // ----- informed constraints -----

    /// Record an announced constraint; returns `false` if it was known.
    pub fn record_informed(&mut self, constraint: &Arc<Constraint>) -> bool {
        if !self.informed_ids.insert(constraint.id()) {
            return false;
        }
        self.informed.push(Arc::clone(constraint));
        if self.state == ModuleState::Idle {
            self.state = ModuleState::Informed;
        }
        true
    }

    /// Constraints announced so far.
    pub fn informed(&self) -> &[Arc<Constraint>] {
        &self.informed
    }

    /// Forward an announcement to every existing backend.
    pub fn inform_backends(&mut self, constraint: &Arc<Constraint>) {
        for slot in &mut self.backends {
            slot.module.inform(constraint);
        }
    }

    // ----- received formula -----

    /// Received formula.
    pub fn received(&self) -> &[Formula] {
        &self.received
    }

    /// Append to the received formula.
    pub fn push_received(&mut self, formula: Formula) {
        self.received.push(formula);
        self.state = ModuleState::Asserting;
    }

    /// Remove one occurrence from the received formula and everything derived from it.
    pub fn remove_received(&mut self, formula: &Formula) {
        match self.received.iter().position(|f| f == formula) {
            Some(pos) => {
                self.received.remove(pos);
            }
            None => {
                debug!(module = %self.module_type, %formula, "removing a formula that was never received");
                return;
            }
        }
        self.infeasible_subsets.retain(|subset| !subset.contains(formula));
        let mut index = self.passed.len();
        while index > 0 {
            index -= 1;
            if self.passed[index].origins.contains(formula) {
                self.remove_passed(index);
            }
        }
        self.state = ModuleState::Asserting;
    }

    // ----- passed formula -----

    /// Passed formula.
    pub fn passed(&self) -> &[PassedEntry] {
        &self.passed
    }

    /// Position of a formula in the passed formula.
    pub fn find_passed(&self, formula: &Formula) -> Option<usize> {
        self.passed.iter().position(|e| &e.formula == formula)
    }

    /// Append to the passed formula; backends receive it on their next run.
    pub fn add_passed(&mut self, formula: Formula, origins: FormulaSet) -> usize {
        self.passed.push(PassedEntry { formula, origins });
        self.passed.len() - 1
    }

    /// Remove a passed entry, notifying backends that already received it.
    pub fn remove_passed(&mut self, index: usize) {
        let entry = self.passed.remove(index);
        for slot in &mut self.backends {
            if index < slot.synced {
                slot.module.remove(&entry.formula);
                slot.synced -= 1;
            }
        }
    }

    /// Remove every passed entry.
    pub fn clear_passed(&mut self) {
        while !self.passed.is_empty() {
            self.remove_passed(self.passed.len() - 1);
        }
    }

    /// Properties of the conjunction of the passed formula.
    pub fn passed_properties(&self) -> FormulaProperties {
        FormulaProperties::of(self.passed.iter().map(|e| &e.formula))
    }

    /// Received formulas justifying a set of passed formulas.
    pub fn collect_origins(&self, subset: &FormulaSet) -> FormulaSet {
        let mut origins = FormulaSet::new();
        for formula in subset {
            match self.passed.iter().find(|e| &e.formula == formula) {
                Some(entry) => origins.extend(entry.origins.iter().cloned()),
                None => trace!(%formula, "backend subset mentions a formula that is no longer passed"),
            }
        }
        origins
    }

    // ----- results -----

    /// Record an infeasible subset of the received formula.
    pub fn add_infeasible_subset(&mut self, subset: FormulaSet) {
        debug_assert!(!subset.is_empty(), "empty infeasible subset");
        if !self.infeasible_subsets.contains(&subset) {
            self.infeasible_subsets.push(subset);
        }
    }

    /// Infeasible subsets.
    pub fn infeasible_subsets(&self) -> &[FormulaSet] {
        &self.infeasible_subsets
    }

    /// Check whether a non-empty infeasible subset exists.
    pub fn has_infeasible_subset(&self) -> bool {
        self.infeasible_subsets.iter().any(|s| !s.is_empty())
    }

    /// Drop all infeasible subsets.
    pub fn clear_infeasible_subsets(&mut self) {
        self.infeasible_subsets.clear();
    }

    /// Model.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Model, mutably.
    pub fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }

    /// Queue a lemma; returns `false` if the same lemma was queued before.
    pub fn add_deduction(&mut self, lemma: Formula) -> bool {
        if !self.deduction_set.insert(lemma.clone()) {
            return false;
        }
        debug!(module = %self.module_type, %lemma, "deduction");
        self.deductions.push(lemma);
        true
    }

    /// Check whether lemmas are queued.
    pub fn has_deductions(&self) -> bool {
        !self.deductions.is_empty()
    }

    /// Drain queued lemmas.
    pub fn take_deductions(&mut self) -> Vec<Formula> {
        std::mem::take(&mut self.deductions)
    }

    // ----- check lifecycle -----

    pub(super) fn cached_answer(&self, full: bool) -> Option<Answer> {
        if self.state != ModuleState::Answered {
            return None;
        }
        match self.answer {
            Answer::Unsat => Some(Answer::Unsat),
            Answer::Sat if self.last_full || !full => Some(Answer::Sat),
            _ => None,
        }
    }

    pub(super) fn begin_check(&mut self) {
        self.state = ModuleState::Checking;
    }

    pub(super) fn finish_check(&mut self, answer: Answer, full: bool) {
        self.answer = answer;
        self.last_full = full;
        self.state = ModuleState::Answered;
    }

    /// Force the next check to run even if nothing was received or removed.
    pub fn invalidate(&mut self) {
        if self.state == ModuleState::Answered {
            self.state = ModuleState::Asserting;
        }
    }

    // ----- backends -----

    /// Number of live backend instances.
    pub fn num_backends(&self) -> usize {
        self.backends.len()
    }

    /// Module types of the live backends, in creation order.
    pub fn backend_types(&self) -> Vec<ModuleType> {
        self.backends.iter().map(|s| s.module.module_type()).collect()
    }

    /// Raw infeasible subsets of the backends that answered unsat in the last run.
    pub fn backend_infeasible_subsets(&self) -> Vec<FormulaSet> {
        self.used_backends
            .iter()
            .map(|&i| &self.backends[i])
            .filter(|slot| slot.last_answer == Answer::Unsat)
            .flat_map(|slot| slot.module.infeasible_subsets().iter().cloned())
            .collect()
    }

    /// Make sure a backend exists for every applicable strategy child and
    /// return their slot indices in priority order.
    fn get_backends(&mut self) -> Vec<usize> {
        let props = self.passed_properties();
        let wanted = self.context.strategy().next_module_types(self.branch, &props);
        let mut slots = Vec::with_capacity(wanted.len());
        for (branch, module_type) in wanted {
            if let Some(index) = self.backends.iter().position(|s| s.branch == branch) {
                slots.push(index);
                continue;
            }
            let mut module = match self.context.create_module(branch) {
                Ok(module) => module,
                Err(err) => {
                    error!(%module_type, %err, "cannot instantiate backend");
                    continue;
                }
            };
            debug!(
                parent = %self.module_type,
                backend = %module_type,
                branch,
                "created backend"
            );
            for constraint in &self.informed {
                module.inform(constraint);
            }
            self.backends.push(BackendSlot {
                branch,
                module,
                synced: 0,
                last_answer: Answer::Unknown,
            });
            slots.push(self.backends.len() - 1);
        }
        slots
    }

    /// Hand the passed formula to the applicable backends and combine their answers.
    ///
    /// Deductions of the consulted backends are lifted into this module. On
    /// `Unsat`, backend infeasible subsets are mapped to received formulas
    /// through passed origins; on `Sat`, the deciding backend's model is
    /// copied.
    pub fn run_backends(&mut self, full: bool, cancel: &CancellationToken) -> Answer {
        self.used_backends = self.get_backends();
        if self.used_backends.is_empty() {
            trace!(module = %self.module_type, "no applicable backend");
            return Answer::Unknown;
        }

        for &index in &self.used_backends {
            let slot = &mut self.backends[index];
            while slot.synced < self.passed.len() {
                slot.module.add(&self.passed[slot.synced].formula);
                slot.synced += 1;
            }
        }

        let parallel = self.context.config().parallel && self.used_backends.len() > 1;
        let answers = if parallel {
            self.check_backends_parallel(full, cancel)
        } else {
            self.check_backends_sequential(full, cancel)
        };

        let mut answer = Answer::Unknown;
        let mut decider = None;
        for (&index, &backend_answer) in self.used_backends.iter().zip(&answers) {
            self.backends[index].last_answer = backend_answer;
            if answer == Answer::Unknown && backend_answer != Answer::Unknown {
                answer = backend_answer;
                decider = Some(index);
            }
        }

        let used = self.used_backends.clone();
        for index in used {
            for lemma in self.backends[index].module.take_deductions() {
                self.add_deduction(lemma);
            }
        }

        match (answer, decider) {
            (Answer::Unsat, _) => {
                for subset in self.backend_infeasible_subsets() {
                    let origins = self.collect_origins(&subset);
                    if !origins.is_empty() {
                        self.add_infeasible_subset(origins);
                    }
                }
            }
            (Answer::Sat, Some(index)) => {
                self.model = self.backends[index].module.model().clone();
            }
            _ => {}
        }
        answer
    }

    fn check_backends_sequential(&mut self, full: bool, cancel: &CancellationToken) -> Vec<Answer> {
        let mut answers = vec![Answer::Unknown; self.used_backends.len()];
        for (slot_answer, &index) in answers.iter_mut().zip(&self.used_backends) {
            if cancel.is_cancelled() {
                break;
            }
            *slot_answer = self.backends[index].module.check(full, cancel);
            if *slot_answer != Answer::Unknown {
                break;
            }
        }
        answers
    }

    fn check_backends_parallel(&mut self, full: bool, cancel: &CancellationToken) -> Vec<Answer> {
        let found = Arc::new(AtomicBool::new(false));
        let token = cancel.with_flag(Arc::clone(&found));
        let order: Vec<BranchId> = self
            .used_backends
            .iter()
            .map(|&i| self.backends[i].branch)
            .collect();
        let used = &self.used_backends;
        let slots: Vec<&mut BackendSlot> = self
            .backends
            .iter_mut()
            .enumerate()
            .filter(|(i, _)| used.contains(i))
            .map(|(_, slot)| slot)
            .collect();
        let check_all = || {
            slots
                .into_par_iter()
                .map(|slot| {
                    let answer = slot.module.check(full, &token);
                    if answer != Answer::Unknown {
                        found.store(true, Ordering::Release);
                    }
                    (slot.branch, answer)
                })
                .collect::<Vec<_>>()
        };
        let results = match self.context.thread_pool() {
            Some(pool) => pool.install(check_all),
            None => check_all(),
        };
        debug!(module = %self.module_type, backends = results.len(), "parallel backends finished");
        // Results follow creation order; report them in priority order.
        order
            .iter()
            .map(|branch| {
                results
                    .iter()
                    .find(|(b, _)| b == branch)
                    .map_or(Answer::Unknown, |(_, a)| *a)
            })
            .collect()
    }
}
