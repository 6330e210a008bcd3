//! Built-in Modules of the Solver.
//!
//! - [`GenericModule`]: pass-through root
//! - [`CnfModule`]: conversion of arbitrary Boolean structure into clauses
//! - [`SatModule`]: Boolean search that hands arithmetic literals to theory
//!   backends
//!
//! The arithmetic module lives in `strata-theories`.

pub mod cnfer;
pub mod generic;
pub mod sat;

pub use cnfer::CnfModule;
pub use generic::GenericModule;
pub use sat::{SatModule, SatStats};
