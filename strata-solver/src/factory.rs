//! Default Strategies and Module Factories.
//!
//! The default pipeline is
//!
//! ```text
//! GenericModule -> CNFModule -> SATModule -> LRAModule
//! ```
//!
//! [`nonlinear_strategy`] additionally routes problems with nonlinear
//! constraints from the arithmetic module to an `NRAModule` slot. No nonlinear
//! procedure ships with the solver, so callers must register one.

use crate::modules::{CnfModule, GenericModule, SatModule};
use strata_core::{BranchId, Condition, FactoryRegistry, ModuleType, Result, StrategyGraph};
use strata_theories::LraModule;

/// Branches of the default pipeline.
#[derive(Debug, Clone, Copy)]
pub struct DefaultBranches {
    /// CNF conversion below the root.
    pub cnf: BranchId,
    /// Boolean search below the CNF module.
    pub sat: BranchId,
    /// Linear arithmetic below the Boolean search.
    pub lra: BranchId,
}

fn default_pipeline() -> Result<(StrategyGraph, DefaultBranches)> {
    let mut graph = StrategyGraph::new(ModuleType::Generic);
    let cnf = graph.add_backend(StrategyGraph::ROOT, ModuleType::Cnf, Condition::Always)?;
    let sat = graph.add_backend(cnf, ModuleType::Sat, Condition::Always)?;
    let lra = graph.add_backend(sat, ModuleType::Lra, Condition::Always)?;
    Ok((graph, DefaultBranches { cnf, sat, lra }))
}

/// Strategy `Generic -> CNF -> SAT -> LRA`.
///
/// # Errors
///
/// Never fails for the built-in graph; the `Result` mirrors
/// [`StrategyGraph::add_backend`].
pub fn default_strategy() -> Result<StrategyGraph> {
    default_pipeline().map(|(graph, _)| graph)
}

/// Default strategy plus the branches of its modules, for callers extending it.
///
/// # Errors
///
/// See [`default_strategy`].
pub fn default_strategy_with_branches() -> Result<(StrategyGraph, DefaultBranches)> {
    default_pipeline()
}

/// Default strategy with an `NRA` backend below `LRA` for nonlinear problems.
///
/// # Errors
///
/// See [`default_strategy`].
pub fn nonlinear_strategy() -> Result<StrategyGraph> {
    let (mut graph, branches) = default_pipeline()?;
    graph.add_backend(branches.lra, ModuleType::Nra, Condition::HasNonlinear)?;
    Ok(graph)
}

/// Factories for every built-in module type.
pub fn default_factories() -> FactoryRegistry {
    let mut factories = FactoryRegistry::new();
    factories.register(ModuleType::Generic, |base| Box::new(GenericModule::new(base)));
    factories.register(ModuleType::Cnf, |base| Box::new(CnfModule::new(base)));
    factories.register(ModuleType::Sat, |base| Box::new(SatModule::new(base)));
    factories.register(ModuleType::Lra, |base| Box::new(LraModule::new(base)));
    factories
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_strategy_is_covered() {
        let graph = default_strategy().unwrap();
        let factories = default_factories();
        assert_eq!(graph.len(), 4);
        assert_eq!(graph.root_type(), ModuleType::Generic);
        assert!(graph.module_types().all(|t| factories.contains(t)));
    }

    #[test]
    fn test_nonlinear_strategy_needs_nra() {
        let graph = nonlinear_strategy().unwrap();
        let factories = default_factories();
        assert!(graph.module_types().any(|t| t == ModuleType::Nra));
        assert!(!factories.contains(ModuleType::Nra));
    }
}
