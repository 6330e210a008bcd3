//! Strategy Graph: Which Modules Serve as Backends for Which.
//!
//! The strategy is a static DAG. Each node (a *branch*) names a module type;
//! each edge carries a [`Condition`] over the requiring module's passed
//! formula. A module sitting on branch `b` asks the graph for the children of
//! `b` whose condition holds and receives one backend per child.
//!
//! Node `0` is the root and is owned by the manager. Edge order is priority
//! order: backends are consulted in the order their edges were added.

use crate::error::{Result, StrataError};
use crate::formula::FormulaProperties;
use crate::module::ModuleType;

/// Node index in a strategy graph.
pub type BranchId = usize;

/// Predicate over the properties of a passed formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Always applicable.
    Always,
    /// Only constraints joined by conjunction.
    IsConjunctionOfConstraints,
    /// Conjunction of clauses.
    IsCnf,
    /// Some nonlinear constraint occurs.
    HasNonlinear,
    /// Every constraint is linear.
    IsLinear,
    /// Some integer variable occurs.
    HasInteger,
    /// Boolean structure occurs.
    HasBoolean,
    /// Negation of a condition.
    Not(Box<Condition>),
    /// All conditions hold.
    All(Vec<Condition>),
    /// Some condition holds.
    Any(Vec<Condition>),
}

impl Condition {
    /// Evaluate against formula properties.
    pub fn holds(&self, props: &FormulaProperties) -> bool {
        match self {
            Self::Always => true,
            Self::IsConjunctionOfConstraints => props.conjunction_of_constraints,
            Self::IsCnf => props.is_cnf,
            Self::HasNonlinear => props.has_nonlinear,
            Self::IsLinear => !props.has_nonlinear,
            Self::HasInteger => props.has_integer,
            Self::HasBoolean => props.has_boolean,
            Self::Not(inner) => !inner.holds(props),
            Self::All(conds) => conds.iter().all(|c| c.holds(props)),
            Self::Any(conds) => conds.iter().any(|c| c.holds(props)),
        }
    }
}

#[derive(Debug, Clone)]
struct StrategyEdge {
    target: BranchId,
    condition: Condition,
}

#[derive(Debug, Clone)]
struct StrategyNode {
    module_type: ModuleType,
    edges: Vec<StrategyEdge>,
}

/// Static DAG of module types.
#[derive(Debug, Clone)]
pub struct StrategyGraph {
    nodes: Vec<StrategyNode>,
}

impl StrategyGraph {
    /// Root branch.
    pub const ROOT: BranchId = 0;

    /// A graph consisting of the root node only.
    #[must_use]
    pub fn new(root: ModuleType) -> Self {
        Self {
            nodes: vec![StrategyNode {
                module_type: root,
                edges: Vec::new(),
            }],
        }
    }

    /// Add a new node below `parent`, reached under `condition`.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::MalformedStrategy`] if `parent` does not exist.
    pub fn add_backend(
        &mut self,
        parent: BranchId,
        module_type: ModuleType,
        condition: Condition,
    ) -> Result<BranchId> {
        if parent >= self.nodes.len() {
            return Err(StrataError::MalformedStrategy(format!(
                "parent branch {parent} does not exist"
            )));
        }
        let branch = self.nodes.len();
        self.nodes.push(StrategyNode {
            module_type,
            edges: Vec::new(),
        });
        self.nodes[parent].edges.push(StrategyEdge {
            target: branch,
            condition,
        });
        Ok(branch)
    }

    /// Add an edge to an existing node, sharing it between parents.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::MalformedStrategy`] if either node does not
    /// exist or the edge closes a cycle.
    pub fn add_edge(&mut self, parent: BranchId, target: BranchId, condition: Condition) -> Result<()> {
        if parent >= self.nodes.len() || target >= self.nodes.len() {
            return Err(StrataError::MalformedStrategy(format!(
                "edge {parent} -> {target} references a missing branch"
            )));
        }
        if parent == target || self.reaches(target, parent) {
            return Err(StrataError::MalformedStrategy(format!(
                "edge {parent} -> {target} closes a cycle"
            )));
        }
        self.nodes[parent].edges.push(StrategyEdge { target, condition });
        Ok(())
    }

    fn reaches(&self, from: BranchId, to: BranchId) -> bool {
        let mut stack = vec![from];
        let mut visited = vec![false; self.nodes.len()];
        while let Some(node) = stack.pop() {
            if node == to {
                return true;
            }
            if std::mem::replace(&mut visited[node], true) {
                continue;
            }
            stack.extend(self.nodes[node].edges.iter().map(|e| e.target));
        }
        false
    }

    /// Module type of a branch.
    pub fn module_type(&self, branch: BranchId) -> Option<ModuleType> {
        self.nodes.get(branch).map(|n| n.module_type)
    }

    /// Module type of the root.
    pub fn root_type(&self) -> ModuleType {
        self.nodes[Self::ROOT].module_type
    }

    /// Number of branches (nodes).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the root exists.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every module type occurring in the graph.
    pub fn module_types(&self) -> impl Iterator<Item = ModuleType> + '_ {
        self.nodes.iter().map(|n| n.module_type)
    }

    /// Backends applicable below `branch`, in priority order.
    pub fn next_module_types(
        &self,
        branch: BranchId,
        props: &FormulaProperties,
    ) -> Vec<(BranchId, ModuleType)> {
        let Some(node) = self.nodes.get(branch) else {
            return Vec::new();
        };
        node.edges
            .iter()
            .filter(|e| e.condition.holds(props))
            .map(|e| (e.target, self.nodes[e.target].module_type))
            .collect()
    }

    /// Check that the graph is a DAG whose edges never point from a module
    /// type to the same type.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::MalformedStrategy`] describing the first defect.
    pub fn validate(&self) -> Result<()> {
        for (index, node) in self.nodes.iter().enumerate() {
            for edge in &node.edges {
                let Some(target) = self.nodes.get(edge.target) else {
                    return Err(StrataError::MalformedStrategy(format!(
                        "branch {index} points to missing branch {}",
                        edge.target
                    )));
                };
                if target.module_type == node.module_type {
                    return Err(StrataError::MalformedStrategy(format!(
                        "branch {index} uses its own module type {} as backend",
                        node.module_type
                    )));
                }
                if self.reaches(edge.target, index) {
                    return Err(StrataError::MalformedStrategy(format!(
                        "branch {index} lies on a cycle"
                    )));
                }
            }
        }
        Ok(())
    }
}
