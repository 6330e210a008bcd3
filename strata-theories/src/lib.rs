//! Strata Theories - Arithmetic Decision Procedures
//!
//! This crate provides the theory modules of the Strata SMT solver:
//! - [`LraModule`]: linear real and integer arithmetic over a Simplex tableau
//!   with delta-rational assignments
//! - integer handling by branch-and-bound, Gomory cuts and cuts from proofs
//! - infeasible subsets built from the origins of active bounds
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use strata_core::{
//!     Answer, CancellationToken, ConstraintPool, FactoryRegistry, Formula, Module, ModuleType,
//!     Relation, SolverConfig, SolverContext, StrategyGraph,
//! };
//! use strata_theories::LraModule;
//!
//! let mut factories = FactoryRegistry::new();
//! factories.register(ModuleType::Lra, |base| Box::new(LraModule::new(base)));
//! let context = SolverContext::new(
//!     Arc::new(ConstraintPool::new()),
//!     SolverConfig::default(),
//!     StrategyGraph::new(ModuleType::Lra),
//!     factories,
//! )
//! .unwrap();
//!
//! let x = context.pool().declare_real("x");
//! let c = context.pool().linear(&[(x, 1)], Relation::Geq, 2).unwrap();
//! let mut lra = context.create_module(StrategyGraph::ROOT).unwrap();
//! lra.add(&Formula::from(c));
//! assert_eq!(lra.check(true, &CancellationToken::new()), Answer::Sat);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod lra;

pub use lra::{LraModule, LraStats};
