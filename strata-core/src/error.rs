//! Error Types for the Strata Solver.
//!
//! Only representation and configuration violations are errors. Arithmetic
//! conflicts are ordinary `Unsat` answers and structural mismatches are
//! `Unknown` answers, so neither appears here.

use crate::module::ModuleType;
use thiserror::Error;

/// Errors raised while building constraints, strategies or solvers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrataError {
    /// A constraint mentions a variable the pool never declared.
    #[error("unknown variable: x{0}")]
    UnknownVariable(u32),

    /// A constraint could not be built from the given parts.
    #[error("invalid constraint: {0}")]
    InvalidConstraint(String),

    /// The strategy graph references a module type without a factory.
    #[error("no factory registered for module type {0}")]
    MissingFactory(ModuleType),

    /// The strategy graph is not a well-formed DAG.
    #[error("malformed strategy graph: {0}")]
    MalformedStrategy(String),

    /// `pop` was called without a matching `push`.
    #[error("pop called on an empty scope stack")]
    EmptyScopeStack,

    /// The worker pool for parallel backends could not be created.
    #[error("thread pool error: {0}")]
    ThreadPool(String),

    /// More identifiers of one kind were requested than 32 bits can hold.
    #[error("{0} identifiers exhausted")]
    IdentifierOverflow(&'static str),
}

/// Result type alias for Strata operations.
pub type Result<T> = std::result::Result<T, StrataError>;

/// Identifier for the item stored at `index` of an arena of `kind`s.
///
/// # Panics
///
/// Panics if `index` does not fit into 32 bits. Callers that can fail check
/// [`StrataError::IdentifierOverflow`] first.
pub fn checked_id(index: usize, kind: &'static str) -> u32 {
    match u32::try_from(index) {
        Ok(id) => id,
        Err(_) => panic!("{}", StrataError::IdentifierOverflow(kind)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StrataError::MissingFactory(ModuleType::Nra);
        assert_eq!(err.to_string(), "no factory registered for module type NRAModule");

        let err = StrataError::UnknownVariable(7);
        assert!(err.to_string().contains("x7"));
    }

    #[test]
    fn test_checked_id() {
        assert_eq!(checked_id(41, "module"), 41);
        assert_eq!(checked_id(u32::MAX as usize, "module"), u32::MAX);
        assert_eq!(
            StrataError::IdentifierOverflow("module").to_string(),
            "module identifiers exhausted"
        );
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    #[should_panic(expected = "bound identifiers exhausted")]
    fn test_checked_id_overflow() {
        checked_id(u32::MAX as usize + 1, "bound");
    }
}
