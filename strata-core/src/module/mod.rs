//! Decision Modules and their Incremental Contract.
//!
//! Every decision procedure (CNF conversion, Boolean search, linear
//! arithmetic, ...) is a [`Module`]. Modules share one protocol:
//!
//! ```text
//! inform(constraint)* -> add(formula)* -> check(full) -> remove(formula)* -> ...
//! ```
//!
//! - `inform` announces a constraint before it is ever asserted, so modules can
//!   build static structures (bounds, slack variables) up front
//! - `add`/`remove` maintain the *received formula*, an ordered list of
//!   assertions
//! - `check` decides the received formula: `Sat` with a model, `Unsat` with at
//!   least one infeasible subset, or `Unknown` (possibly with deductions)
//!
//! What a module cannot decide alone it writes into its *passed formula* and
//! hands to backends chosen by the [`StrategyGraph`](crate::strategy::StrategyGraph).
//! The bookkeeping for all of this lives in [`ModuleBase`], which every module
//! embeds.

mod base;
mod context;

pub use base::{ModuleBase, PassedEntry};
pub use context::{FactoryRegistry, ModuleFactory, SolverContext};

use crate::cancel::CancellationToken;
use crate::constraint::Constraint;
use crate::formula::{Formula, FormulaSet};
use crate::model::Model;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Outcome of a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Answer {
    /// The received formula is satisfiable.
    Sat,
    /// The received formula is unsatisfiable.
    Unsat,
    /// Undecided (incomplete procedure, cancellation or pending lemmas).
    Unknown,
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sat => write!(f, "sat"),
            Self::Unsat => write!(f, "unsat"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Tag identifying a kind of module, used to look up factories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModuleType {
    /// Pass-through root module.
    Generic,
    /// Conversion to conjunctive normal form.
    Cnf,
    /// Boolean search over the clause abstraction.
    Sat,
    /// Linear real and integer arithmetic.
    Lra,
    /// Nonlinear real arithmetic.
    Nra,
}

impl ModuleType {
    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Generic => "GenericModule",
            Self::Cnf => "CNFModule",
            Self::Sat => "SATModule",
            Self::Lra => "LRAModule",
            Self::Nra => "NRAModule",
        }
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unique identifier of a module instance within a solver context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleId(u32);

impl ModuleId {
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

/// Lifecycle state of a module instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    /// Nothing received yet.
    Idle,
    /// Constraints announced, none asserted.
    Informed,
    /// Received formula changed since the last check.
    Asserting,
    /// A check is running.
    Checking,
    /// Last answer is valid until the next change.
    Answered,
}

/// Interface every decision procedure implements.
///
/// Implementors provide the `*_core` hooks; the provided methods keep the
/// shared bookkeeping in [`ModuleBase`] consistent around them.
pub trait Module: Send {
    /// Shared state.
    fn base(&self) -> &ModuleBase;

    /// Shared state, mutably.
    fn base_mut(&mut self) -> &mut ModuleBase;

    /// Hook for a newly announced constraint. Returns `false` if the
    /// constraint alone is inconsistent.
    fn inform_core(&mut self, _constraint: &Arc<Constraint>) -> bool {
        true
    }

    /// Hook for a newly received formula. Returns `false` if the received
    /// formula became inconsistent.
    fn add_core(&mut self, formula: &Formula) -> bool;

    /// Hook for a formula leaving the received formula.
    fn remove_core(&mut self, formula: &Formula);

    /// Decide the received formula.
    fn check_core(&mut self, full: bool, cancel: &CancellationToken) -> Answer;

    /// Fill the model after a satisfiable check.
    fn update_model(&mut self) {}

    /// Module type tag.
    fn module_type(&self) -> ModuleType {
        self.base().module_type()
    }

    /// Announce a constraint; repeated announcements are ignored.
    fn inform(&mut self, constraint: &Arc<Constraint>) -> bool {
        if !self.base_mut().record_informed(constraint) {
            return true;
        }
        self.base_mut().inform_backends(constraint);
        self.inform_core(constraint)
    }

    /// Append a formula to the received formula.
    fn add(&mut self, formula: &Formula) -> bool {
        for atom in formula.atoms() {
            self.inform(&atom);
        }
        self.base_mut().push_received(formula.clone());
        self.add_core(formula)
    }

    /// Remove a formula from the received formula.
    fn remove(&mut self, formula: &Formula) {
        self.remove_core(formula);
        self.base_mut().remove_received(formula);
    }

    /// Decide the received formula, reusing the last answer when nothing changed.
    fn check(&mut self, full: bool, cancel: &CancellationToken) -> Answer {
        if let Some(answer) = self.base().cached_answer(full) {
            return answer;
        }
        self.base_mut().begin_check();
        let answer = self.check_core(full, cancel);
        debug_assert!(
            answer != Answer::Unsat || self.base().has_infeasible_subset(),
            "{} answered unsat without an infeasible subset",
            self.module_type()
        );
        if answer == Answer::Sat {
            self.update_model();
        }
        self.base_mut().finish_check(answer, full);
        trace!(module = %self.module_type(), id = self.base().id().raw(), %answer, "check");
        answer
    }

    /// Last answer.
    fn answer(&self) -> Answer {
        self.base().answer()
    }

    /// Model of the last satisfiable check.
    fn model(&self) -> &Model {
        self.base().model()
    }

    /// Infeasible subsets of the last unsatisfiable check.
    fn infeasible_subsets(&self) -> &[FormulaSet] {
        self.base().infeasible_subsets()
    }

    /// Drain the lemmas produced so far.
    fn take_deductions(&mut self) -> Vec<Formula> {
        self.base_mut().take_deductions()
    }
}
