//! Strata Core - Formulas, Constraints and the Module Framework
//!
//! This crate provides the foundational types shared by every part of the
//! Strata SMT solver:
//! - Polynomials and interned arithmetic constraints ([`ConstraintPool`])
//! - Immutable, structurally compared [`Formula`] values and models
//! - The [`Module`] trait with its incremental `inform`/`add`/`check`/`remove`
//!   contract and the shared [`ModuleBase`] bookkeeping
//! - The [`StrategyGraph`] deciding which modules serve as backends
//! - Configuration, errors and cooperative cancellation
//!
//! # Examples
//!
//! ```
//! use strata_core::{ConstraintPool, Formula, Relation};
//!
//! let pool = ConstraintPool::new();
//! let x = pool.declare_real("x");
//! let y = pool.declare_real("y");
//!
//! // x + y <= 3
//! let c = pool.linear(&[(x, 1), (y, 1)], Relation::Leq, 3).unwrap();
//! let f = Formula::mk_not(Formula::from(c));
//! assert_eq!(f.atoms().len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod cancel;
pub mod config;
pub mod constraint;
pub mod error;
pub mod formula;
pub mod model;
pub mod module;
pub mod poly;
pub mod pool;
pub mod strategy;

pub use cancel::CancellationToken;
pub use config::{BranchingStrategy, ConflictPolicy, IntegerStrategy, LraConfig, SatConfig, SolverConfig};
pub use constraint::{Constraint, ConstraintId, Relation};
pub use error::{Result, StrataError, checked_id};
pub use formula::{BoolVarId, Formula, FormulaKind, FormulaProperties, FormulaSet};
pub use model::Model;
pub use module::{
    Answer, FactoryRegistry, Module, ModuleBase, ModuleFactory, ModuleId, ModuleState, ModuleType,
    PassedEntry, SolverContext,
};
pub use poly::{Domain, Monomial, Polynomial, VarId};
pub use pool::ConstraintPool;
pub use strategy::{BranchId, Condition, StrategyGraph};
