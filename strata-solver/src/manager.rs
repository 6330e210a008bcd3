//! Solver Manager: the Assertion Stack on Top of a Module Pipeline.
//!
//! The [`Manager`] owns the root module of a strategy graph and the stack of
//! asserted formulas. Assertions are forwarded to the root incrementally;
//! `push`/`pop` record the stack height and withdraw assertions on `pop`, so
//! every module below sees plain `add`/`remove` calls.
//!
//! # Example
//!
//! ```
//! use strata_core::{Answer, Formula, Relation, SolverConfig};
//! use strata_solver::Manager;
//!
//! let mut manager = Manager::new(SolverConfig::default()).unwrap();
//! let x = manager.pool().declare_real("x");
//! let c = manager.pool().linear(&[(x, 1)], Relation::Geq, 5).unwrap();
//!
//! manager.push();
//! manager.assert(Formula::from(c));
//! assert_eq!(manager.check(), Answer::Sat);
//! manager.pop().unwrap();
//! ```

use crate::factory::{default_factories, default_strategy};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Instant;
use strata_core::{
    Answer, CancellationToken, ConstraintPool, FactoryRegistry, Formula, FormulaSet, Model, Module,
    Result, SolverConfig, SolverContext, StrataError, StrategyGraph,
};
use tracing::{debug, info, warn};

/// Manager statistics
#[derive(Debug, Clone, Default)]
pub struct ManagerStats {
    /// Number of checks
    pub checks: u64,
    /// Checks answered sat
    pub sat: u64,
    /// Checks answered unsat
    pub unsat: u64,
    /// Checks answered unknown
    pub unknown: u64,
    /// Formulas asserted over the lifetime of the manager
    pub assertions: u64,
    /// Module instances created, the root included
    pub modules: u64,
    /// Total time spent in checks, in microseconds
    pub check_time_us: u64,
}

/// Saved state of one `push`.
#[derive(Debug, Clone, Copy)]
struct ContextState {
    num_assertions: usize,
}

/// Entry point of the solver.
pub struct Manager {
    context: Arc<SolverContext>,
    root: Box<dyn Module>,
    assertions: Vec<Formula>,
    context_stack: Vec<ContextState>,
    cancel: CancellationToken,
    last_answer: Answer,
    stats: ManagerStats,
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("root", &self.root.module_type())
            .field("assertions", &self.assertions.len())
            .field("scopes", &self.context_stack.len())
            .field("last_answer", &self.last_answer)
            .finish()
    }
}

impl Manager {
    /// Manager running the default strategy `Generic -> CNF -> SAT -> LRA`.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::ThreadPool`] if parallel mode is configured and
    /// the worker pool cannot be created.
    pub fn new(config: SolverConfig) -> Result<Self> {
        Self::with_strategy(config, default_strategy()?, default_factories())
    }

    /// Manager running a custom strategy.
    ///
    /// # Errors
    ///
    /// - [`StrataError::MalformedStrategy`] if the graph is not a valid DAG
    /// - [`StrataError::MissingFactory`] if a module type of the graph has no factory
    /// - [`StrataError::ThreadPool`] if the worker pool cannot be created
    pub fn with_strategy(
        config: SolverConfig,
        strategy: StrategyGraph,
        factories: FactoryRegistry,
    ) -> Result<Self> {
        Self::with_pool(Arc::new(ConstraintPool::new()), config, strategy, factories)
    }

    /// Manager over an existing constraint pool.
    ///
    /// # Errors
    ///
    /// See [`Manager::with_strategy`].
    pub fn with_pool(
        pool: Arc<ConstraintPool>,
        config: SolverConfig,
        strategy: StrategyGraph,
        factories: FactoryRegistry,
    ) -> Result<Self> {
        let context = SolverContext::new(pool, config, strategy, factories)?;
        let root = context.create_module(StrategyGraph::ROOT)?;
        debug!(root = %root.module_type(), "manager created");
        Ok(Self {
            context,
            root,
            assertions: Vec::new(),
            context_stack: Vec::new(),
            cancel: CancellationToken::new(),
            last_answer: Answer::Unknown,
            stats: ManagerStats::default(),
        })
    }

    /// Constraint pool for declaring variables and building constraints.
    pub fn pool(&self) -> &Arc<ConstraintPool> {
        self.context.pool()
    }

    /// Shared solver context.
    pub fn context(&self) -> &Arc<SolverContext> {
        &self.context
    }

    /// Configuration.
    pub fn config(&self) -> &SolverConfig {
        self.context.config()
    }

    /// Observe an external stop flag during checks.
    pub fn set_cancel_flag(&mut self, flag: Arc<AtomicBool>) {
        self.cancel = CancellationToken::from_flag(flag);
    }

    /// Assert a formula in the current scope.
    ///
    /// Asserting a formula that is already on the stack only records it; the
    /// root keeps a single copy until the last occurrence is popped.
    pub fn assert(&mut self, formula: Formula) {
        self.stats.assertions += 1;
        if !self.assertions.contains(&formula) {
            debug!(%formula, "assert");
            self.root.add(&formula);
        }
        self.assertions.push(formula);
    }

    /// Assertions on the stack, oldest first.
    pub fn assertions(&self) -> &[Formula] {
        &self.assertions
    }

    /// Decide the conjunction of all assertions.
    pub fn check(&mut self) -> Answer {
        self.stats.checks += 1;
        let start = Instant::now();
        let answer = self.root.check(true, &self.cancel);
        let elapsed_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
        self.stats.check_time_us += elapsed_us;

        let lemmas = self.root.take_deductions();
        if !lemmas.is_empty() {
            // Lemmas reaching the root had no Boolean module to consume them.
            warn!(count = lemmas.len(), "unconsumed deductions at the root");
        }
        match answer {
            Answer::Sat => self.stats.sat += 1,
            Answer::Unsat => self.stats.unsat += 1,
            Answer::Unknown => self.stats.unknown += 1,
        }
        self.last_answer = answer;
        info!(
            %answer,
            assertions = self.assertions.len(),
            modules = self.context.num_generated(),
            elapsed_us,
            "check"
        );
        answer
    }

    /// Answer of the last check.
    pub fn last_answer(&self) -> Answer {
        self.last_answer
    }

    /// Model of the last check, if it was satisfiable.
    pub fn model(&self) -> Option<&Model> {
        (self.last_answer == Answer::Sat && self.config().model).then(|| self.root.model())
    }

    /// Smallest infeasible subset of the last check, if it was unsatisfiable.
    pub fn infeasible_subset(&self) -> Option<FormulaSet> {
        if self.last_answer != Answer::Unsat {
            return None;
        }
        self.root.infeasible_subsets().iter().min_by_key(|s| s.len()).cloned()
    }

    /// Open a new scope.
    pub fn push(&mut self) {
        self.context_stack.push(ContextState {
            num_assertions: self.assertions.len(),
        });
        debug!(depth = self.context_stack.len(), "push");
    }

    /// Close the innermost scope, withdrawing its assertions newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::EmptyScopeStack`] without a matching `push`.
    pub fn pop(&mut self) -> Result<()> {
        let state = self.context_stack.pop().ok_or(StrataError::EmptyScopeStack)?;
        while self.assertions.len() > state.num_assertions {
            let Some(formula) = self.assertions.pop() else {
                break;
            };
            if !self.assertions.contains(&formula) {
                self.root.remove(&formula);
            }
        }
        self.last_answer = Answer::Unknown;
        debug!(depth = self.context_stack.len(), assertions = self.assertions.len(), "pop");
        Ok(())
    }

    /// Number of open scopes.
    pub fn num_scopes(&self) -> usize {
        self.context_stack.len()
    }

    /// Statistics
    pub fn stats(&self) -> ManagerStats {
        ManagerStats {
            modules: self.context.num_generated() as u64,
            ..self.stats.clone()
        }
    }
}
