//! Solver Context: Factories, Strategy and Shared Resources.

use super::{Module, ModuleBase, ModuleId, ModuleType};
use crate::config::SolverConfig;
use crate::error::{Result, StrataError, checked_id};
use crate::pool::ConstraintPool;
use crate::strategy::{BranchId, StrategyGraph};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Builds a module around a prepared [`ModuleBase`].
pub type ModuleFactory = Box<dyn Fn(ModuleBase) -> Box<dyn Module> + Send + Sync>;

/// Factories keyed by module type.
#[derive(Default)]
pub struct FactoryRegistry {
    factories: FxHashMap<ModuleType, ModuleFactory>,
}

impl FactoryRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the factory of a module type.
    pub fn register<F>(&mut self, module_type: ModuleType, factory: F)
    where
        F: Fn(ModuleBase) -> Box<dyn Module> + Send + Sync + 'static,
    {
        self.factories.insert(module_type, Box::new(factory));
    }

    /// Check whether a module type has a factory.
    pub fn contains(&self, module_type: ModuleType) -> bool {
        self.factories.contains_key(&module_type)
    }

    /// Registered module types.
    pub fn module_types(&self) -> Vec<ModuleType> {
        let mut types: Vec<ModuleType> = self.factories.keys().copied().collect();
        types.sort_unstable();
        types
    }

    fn create(&self, base: ModuleBase) -> Option<Box<dyn Module>> {
        self.factories
            .get(&base.module_type())
            .map(|factory| factory(base))
    }
}

impl fmt::Debug for FactoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.module_types()).finish()
    }
}

/// Everything module instances share.
///
/// The context is immutable after construction except for the registry of
/// generated modules, which is guarded by a mutex because backends may be
/// instantiated from parallel workers.
pub struct SolverContext {
    pool: Arc<ConstraintPool>,
    config: SolverConfig,
    strategy: StrategyGraph,
    factories: FactoryRegistry,
    thread_pool: Option<rayon::ThreadPool>,
    generated: Mutex<Vec<(ModuleId, ModuleType, BranchId)>>,
}

impl fmt::Debug for SolverContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolverContext")
            .field("config", &self.config)
            .field("strategy", &self.strategy)
            .field("factories", &self.factories)
            .field("generated", &self.generated.lock().len())
            .finish()
    }
}

impl SolverContext {
    /// Validate the strategy against the factories and build the context.
    ///
    /// # Errors
    ///
    /// - [`StrataError::MalformedStrategy`] if the graph is not a valid DAG
    /// - [`StrataError::MissingFactory`] if a referenced module type has no factory
    /// - [`StrataError::ThreadPool`] if the parallel worker pool cannot be built
    pub fn new(
        pool: Arc<ConstraintPool>,
        config: SolverConfig,
        strategy: StrategyGraph,
        factories: FactoryRegistry,
    ) -> Result<Arc<Self>> {
        strategy.validate()?;
        if let Some(missing) = strategy.module_types().find(|t| !factories.contains(*t)) {
            return Err(StrataError::MissingFactory(missing));
        }
        let thread_pool = if config.parallel {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.num_threads)
                .thread_name(|i| format!("strata-backend-{i}"))
                .build()
                .map_err(|e| StrataError::ThreadPool(e.to_string()))?;
            info!(threads = config.num_threads, "parallel backends enabled");
            Some(pool)
        } else {
            None
        };
        Ok(Arc::new(Self {
            pool,
            config,
            strategy,
            factories,
            thread_pool,
            generated: Mutex::new(Vec::new()),
        }))
    }

    /// Constraint pool.
    pub fn pool(&self) -> &Arc<ConstraintPool> {
        &self.pool
    }

    /// Configuration.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Strategy graph.
    pub fn strategy(&self) -> &StrategyGraph {
        &self.strategy
    }

    /// Worker pool for parallel backends.
    pub fn thread_pool(&self) -> Option<&rayon::ThreadPool> {
        self.thread_pool.as_ref()
    }

    /// Instantiate the module of a strategy branch.
    ///
    /// # Errors
    ///
    /// - [`StrataError::MalformedStrategy`] if the branch does not exist
    /// - [`StrataError::MissingFactory`] if its module type has no factory
    /// - [`StrataError::IdentifierOverflow`] if no module identifier is left
    pub fn create_module(self: &Arc<Self>, branch: BranchId) -> Result<Box<dyn Module>> {
        let module_type = self.strategy.module_type(branch).ok_or_else(|| {
            StrataError::MalformedStrategy(format!("branch {branch} does not exist"))
        })?;
        if !self.factories.contains(module_type) {
            return Err(StrataError::MissingFactory(module_type));
        }
        if u32::try_from(self.num_generated()).is_err() {
            return Err(StrataError::IdentifierOverflow("module"));
        }
        let base = ModuleBase::new(module_type, branch, Arc::clone(self));
        self.factories
            .create(base)
            .ok_or(StrataError::MissingFactory(module_type))
    }

    pub(super) fn register_module(&self, module_type: ModuleType, branch: BranchId) -> ModuleId {
        let mut generated = self.generated.lock();
        let id = ModuleId::new(checked_id(generated.len(), "module"));
        generated.push((id, module_type, branch));
        debug!(id = id.raw(), %module_type, branch, "registered module");
        id
    }

    /// Number of module instances created so far.
    pub fn num_generated(&self) -> usize {
        self.generated.lock().len()
    }

    /// Module types of all instances created so far, by identifier.
    pub fn generated_modules(&self) -> Vec<(ModuleId, ModuleType)> {
        self.generated
            .lock()
            .iter()
            .map(|&(id, module_type, _)| (id, module_type))
            .collect()
    }
}
