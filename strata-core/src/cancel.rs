//! Cooperative Cancellation.
//!
//! A [`CancellationToken`] is a list of shared flags. Parallel portfolios add a
//! fresh flag for their siblings, so a running module observes both its own
//! portfolio and every enclosing one. Modules poll the token once per pivot or
//! decision; no thread is ever interrupted.

use smallvec::SmallVec;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared stop flags observed by running modules.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flags: SmallVec<[Arc<AtomicBool>; 2]>,
}

impl CancellationToken {
    /// A token that is never cancelled unless a flag is added.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A token observing a single flag.
    #[must_use]
    pub fn from_flag(flag: Arc<AtomicBool>) -> Self {
        Self::new().with_flag(flag)
    }

    /// Extend the token with another flag.
    #[must_use]
    pub fn with_flag(&self, flag: Arc<AtomicBool>) -> Self {
        let mut flags = self.flags.clone();
        flags.push(flag);
        Self { flags }
    }

    /// Check whether any observed flag is raised.
    pub fn is_cancelled(&self) -> bool {
        self.flags.iter().any(|f| f.load(Ordering::Acquire))
    }
}
