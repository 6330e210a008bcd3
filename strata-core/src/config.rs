//! Solver Configuration.
//!
//! Settings are plain values handed to the solver context at construction:
//! - [`SolverConfig`]: orchestration (parallel backends, model production)
//! - [`LraConfig`]: Simplex pivoting, conflict reporting and integer handling
//! - [`SatConfig`]: the reference Boolean search

use serde::{Deserialize, Serialize};

/// How many explanations a Simplex conflict reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictPolicy {
    /// Report the explanation of the first infeasible row only.
    OneReason,
    /// Report an explanation for every infeasible row.
    AllReasons,
}

/// Which fractional integer variable to branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BranchingStrategy {
    /// The variable pivoted least often so far.
    MinPivotCount,
    /// The variable whose value is farthest from an integer.
    MostFractional,
    /// The variable whose value is closest to an integer.
    LeastFractional,
    /// The first fractional variable encountered.
    FirstFound,
}

/// How integrality violations are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntegerStrategy {
    /// Plain branch-and-bound splits.
    BranchAndBound,
    /// Gomory mixed-integer cuts, falling back to branching.
    GomoryCuts,
    /// Cuts derived from the Hermite normal form of tight constraints.
    CutsFromProofs,
}

/// Configuration of the linear arithmetic module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LraConfig {
    /// Pivots after which Bland's rule replaces the heuristic choice.
    pub bland_threshold: usize,
    /// Conflict reporting policy.
    pub conflict_policy: ConflictPolicy,
    /// Variable selection for integer splits.
    pub branching: BranchingStrategy,
    /// Integrality strategy.
    pub integer_strategy: IntegerStrategy,
    /// Gomory cuts per module instance before falling back to branching.
    pub max_gomory_cuts: usize,
    /// Emit bound refinements of pivoted rows as lemmas.
    pub learn_refinements: bool,
    /// Restore the last consistent assignment after retracting bounds.
    pub restore_assignment: bool,
}

impl Default for LraConfig {
    fn default() -> Self {
        Self {
            bland_threshold: 100,
            conflict_policy: ConflictPolicy::AllReasons,
            branching: BranchingStrategy::MostFractional,
            integer_strategy: IntegerStrategy::BranchAndBound,
            max_gomory_cuts: 32,
            learn_refinements: false,
            restore_assignment: true,
        }
    }
}

impl LraConfig {
    /// Set the Bland threshold
    #[must_use]
    pub fn with_bland_threshold(mut self, threshold: usize) -> Self {
        self.bland_threshold = threshold;
        self
    }

    /// Set the conflict policy
    #[must_use]
    pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }

    /// Set the branching variable selection
    #[must_use]
    pub fn with_branching(mut self, branching: BranchingStrategy) -> Self {
        self.branching = branching;
        self
    }

    /// Set the integrality strategy
    #[must_use]
    pub fn with_integer_strategy(mut self, strategy: IntegerStrategy) -> Self {
        self.integer_strategy = strategy;
        self
    }

    /// Enable refinement lemmas
    #[must_use]
    pub fn with_refinements(mut self) -> Self {
        self.learn_refinements = true;
        self
    }

    /// Set whether retraction restores the last consistent assignment
    #[must_use]
    pub fn with_restore_assignment(mut self, enabled: bool) -> Self {
        self.restore_assignment = enabled;
        self
    }
}

/// Configuration of the reference Boolean search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SatConfig {
    /// Maximum number of decisions before giving up (0 = unlimited)
    pub max_decisions: u64,
    /// Maximum number of theory rounds before giving up (0 = unlimited)
    pub max_theory_rounds: u64,
}

/// Solver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Run sibling backends concurrently
    pub parallel: bool,
    /// Worker threads for parallel backends
    pub num_threads: usize,
    /// Enable model generation
    pub model: bool,
    /// Linear arithmetic settings
    pub lra: LraConfig,
    /// Boolean search settings
    pub sat: SatConfig,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self::sequential()
    }
}

impl SolverConfig {
    /// Single-threaded configuration (default)
    #[must_use]
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            num_threads: 1,
            model: true,
            lra: LraConfig::default(),
            sat: SatConfig::default(),
        }
    }

    /// Configuration tuned for integer problems
    /// Uses Gomory cuts with branching as fallback
    #[must_use]
    pub fn integer() -> Self {
        Self {
            lra: LraConfig::default().with_integer_strategy(IntegerStrategy::GomoryCuts),
            ..Self::sequential()
        }
    }

    /// Enable parallel backends
    #[must_use]
    pub fn with_parallel(mut self, num_threads: usize) -> Self {
        self.parallel = true;
        self.num_threads = num_threads.max(1);
        self
    }

    /// Set linear arithmetic settings
    #[must_use]
    pub fn with_lra(mut self, lra: LraConfig) -> Self {
        self.lra = lra;
        self
    }

    /// Set Boolean search settings
    #[must_use]
    pub fn with_sat(mut self, sat: SatConfig) -> Self {
        self.sat = sat;
        self
    }

    /// Set maximum number of decisions
    #[must_use]
    pub fn with_max_decisions(mut self, max_decisions: u64) -> Self {
        self.sat.max_decisions = max_decisions;
        self
    }
}
