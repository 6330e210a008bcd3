//! Strata Solver - Module Manager and Boolean Backends
//!
//! This crate assembles the Strata SMT solver:
//! - [`Manager`]: assertion stack with `push`/`pop` on top of a module pipeline
//! - [`factory`]: the default strategy `Generic -> CNF -> SAT -> LRA` and the
//!   factories of the built-in modules
//! - [`modules`]: pass-through root, CNF conversion and the reference Boolean
//!   search that hands arithmetic literals to theory backends
//!
//! # Examples
//!
//! ```
//! use strata_core::{Answer, Formula, Relation, SolverConfig};
//! use strata_solver::Manager;
//!
//! let mut manager = Manager::new(SolverConfig::default()).unwrap();
//! let pool = manager.pool().clone();
//! let x = pool.declare_real("x");
//! let y = pool.declare_real("y");
//!
//! // x + y = 3, x - y = 1
//! manager.assert(Formula::from(pool.linear(&[(x, 1), (y, 1)], Relation::Eq, 3).unwrap()));
//! manager.assert(Formula::from(pool.linear(&[(x, 1), (y, -1)], Relation::Eq, 1).unwrap()));
//! assert_eq!(manager.check(), Answer::Sat);
//!
//! let model = manager.model().unwrap();
//! assert_eq!(model.arith(x).map(ToString::to_string).as_deref(), Some("2"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod factory;
pub mod manager;
pub mod modules;

pub use factory::{default_factories, default_strategy, nonlinear_strategy, DefaultBranches};
pub use manager::{Manager, ManagerStats};
pub use modules::{CnfModule, GenericModule, SatModule, SatStats};
pub use strata_core::{Answer, Formula, FormulaSet, Model, Relation, SolverConfig, StrataError};
