//! Pass-Through Root Module.

use strata_core::{Answer, CancellationToken, Formula, FormulaSet, Module, ModuleBase};

/// Module that passes every received formula unchanged to its backends.
///
/// It owns no decision procedure; it is the usual root of a strategy graph so
/// that the first real procedure can be chosen by condition.
#[derive(Debug)]
pub struct GenericModule {
    base: ModuleBase,
}

impl GenericModule {
    /// Create the module around its base.
    pub fn new(base: ModuleBase) -> Self {
        Self { base }
    }
}

impl Module for GenericModule {
    fn base(&self) -> &ModuleBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ModuleBase {
        &mut self.base
    }

    fn add_core(&mut self, formula: &Formula) -> bool {
        self.base
            .add_passed(formula.clone(), FormulaSet::from([formula.clone()]));
        true
    }

    // Passed entries originating from the formula are dropped by the base.
    fn remove_core(&mut self, _formula: &Formula) {}

    fn check_core(&mut self, full: bool, cancel: &CancellationToken) -> Answer {
        self.base.run_backends(full, cancel)
    }
}
