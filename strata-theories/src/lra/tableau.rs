//! Simplex Tableau with Bound Activation.
//!
//! The tableau keeps every basic variable as a linear combination of
//! non-basic ones (`basic = Σ a_j · x_j`) together with an assignment over
//! delta-rationals. Invariants:
//!
//! - non-basic assignments always lie within their active bounds
//! - every row holds: `Σ a_j · β(x_j) = β(basic)`
//!
//! Feasibility is restored by pivot-and-update. Before the Bland threshold the
//! shortest violated row and the least occupied eligible column are chosen;
//! afterwards the lowest variable handle wins, which guarantees termination.
//!
//! ## References
//!
//! - Dutertre & de Moura (2006): "A Fast Linear-Arithmetic Solver for DPLL(T)"
//! - Bland (1977): "New finite pivoting rules for the simplex method"

use super::bound::{Bound, BoundError, BoundId, BoundKind};
use super::variable::{Variable, VariableId, VariableKind};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use strata_core::{Constraint, ConstraintId, ConstraintPool, Formula, Polynomial, Relation, VarId};
use strata_math::{DeltaRational, integral_form};
use tracing::trace;

/// Sparse row: non-basic variable -> coefficient.
pub type Row = BTreeMap<VariableId, BigRational>;

/// Outcome of the pivot selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PivotDecision {
    /// Exchange `row` (basic) with `column` (non-basic).
    Pivot {
        /// Violated basic variable.
        row: VariableId,
        /// Entering non-basic variable.
        column: VariableId,
    },
    /// Every basic variable satisfies its bounds.
    Feasible,
    /// The row of this basic variable cannot be repaired.
    Conflict {
        /// Infeasible basic variable.
        row: VariableId,
    },
}

/// A bound of a basic variable implied by its row.
#[derive(Debug, Clone)]
pub struct Refinement {
    /// Implied (currently inactive) bound.
    pub bound: BoundId,
    /// Active bounds of the row's non-basic variables implying it.
    pub premises: Vec<BoundId>,
}

/// The Simplex tableau.
#[derive(Debug, Default)]
pub struct Tableau {
    vars: Vec<Variable>,
    bounds: Vec<Bound>,
    originals: FxHashMap<VarId, VariableId>,
    slacks: FxHashMap<Vec<(VarId, BigInt)>, VariableId>,
    bound_index: FxHashMap<(VariableId, BoundKind, DeltaRational), BoundId>,
    constraint_bounds: FxHashMap<ConstraintId, SmallVec<[BoundId; 2]>>,
    rows: BTreeMap<VariableId, Row>,
    /// Non-basic variable -> basic variables whose rows mention it.
    columns: FxHashMap<VariableId, BTreeSet<VariableId>>,
}

impl Tableau {
    /// Create an empty tableau
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ----- arenas -----

    /// Variable by handle.
    pub fn variable(&self, id: VariableId) -> &Variable {
        &self.vars[id.index()]
    }

    /// Bound by handle.
    pub fn bound(&self, id: BoundId) -> &Bound {
        &self.bounds[id.index()]
    }

    /// Number of tableau variables.
    pub fn num_variables(&self) -> usize {
        self.vars.len()
    }

    /// Number of registered bounds.
    pub fn num_bounds(&self) -> usize {
        self.bounds.len()
    }

    /// Number of rows (basic variables).
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Tableau variable of an input variable.
    pub fn original(&self, var: VarId) -> Option<VariableId> {
        self.originals.get(&var).copied()
    }

    /// Row of a basic variable.
    pub fn row(&self, basic: VariableId) -> Option<&Row> {
        self.rows.get(&basic)
    }

    /// Bounds registered for a constraint.
    pub fn bounds_of(&self, constraint: ConstraintId) -> &[BoundId] {
        self.constraint_bounds
            .get(&constraint)
            .map_or(&[], |b| b.as_slice())
    }

    /// Linear form of a tableau variable over input variables.
    pub fn variable_poly(&self, id: VariableId) -> Polynomial {
        self.vars[id.index()].as_polynomial()
    }

    // ----- variables -----

    /// Tableau variable for an input variable, created non-basic at zero.
    pub fn ensure_original(&mut self, var: VarId, integer: bool) -> VariableId {
        if let Some(&id) = self.originals.get(&var) {
            return id;
        }
        let id = VariableId::new(self.vars.len());
        self.vars.push(Variable::new(VariableKind::Original(var), integer));
        self.originals.insert(var, id);
        id
    }

    fn ensure_slack(&mut self, terms: Vec<(VarId, BigInt)>, pool: &ConstraintPool) -> VariableId {
        if let Some(&id) = self.slacks.get(&terms) {
            return id;
        }
        let integer = terms.iter().all(|(v, _)| pool.is_integer(*v));
        let mut row = Row::new();
        let mut value = DeltaRational::zero();
        for (var, coeff) in &terms {
            let original = self.ensure_original(*var, pool.is_integer(*var));
            let coeff = BigRational::from_integer(coeff.clone());
            value += &self.vars[original.index()].assignment.scale(&coeff);
            match self.rows.get(&original) {
                Some(defining) => {
                    for (col, a) in defining {
                        add_coeff(&mut row, *col, &coeff * a);
                    }
                }
                None => add_coeff(&mut row, original, coeff),
            }
        }
        let id = VariableId::new(self.vars.len());
        let mut slack = Variable::new(VariableKind::Slack(terms.clone()), integer);
        slack.basic = true;
        slack.assignment = value;
        self.vars.push(slack);
        for col in row.keys() {
            self.columns.entry(*col).or_default().insert(id);
        }
        self.rows.insert(id, row);
        self.slacks.insert(terms, id);
        trace!(slack = id.index(), "new slack row");
        id
    }

    // ----- bounds -----

    /// Register the bounds implied by a linear constraint.
    ///
    /// Returns `Ok(false)` if the constraint was registered before.
    ///
    /// # Errors
    ///
    /// [`BoundError::NonLinear`] or [`BoundError::Constant`] if the
    /// constraint cannot be expressed as bounds.
    pub fn new_bound(&mut self, constraint: &Arc<Constraint>, pool: &ConstraintPool) -> Result<bool, BoundError> {
        if self.constraint_bounds.contains_key(&constraint.id()) {
            return Ok(false);
        }
        let lhs = constraint.lhs();
        if !lhs.is_linear() {
            return Err(BoundError::NonLinear(constraint.to_string()));
        }
        let terms: Vec<(VarId, BigRational)> = lhs.linear_terms().map(|(v, c)| (v, c.clone())).collect();
        let coeffs: Vec<BigRational> = terms.iter().map(|(_, c)| c.clone()).collect();
        let Some(form) = integral_form(&coeffs) else {
            return Err(BoundError::Constant(constraint.to_string()));
        };

        let var = if terms.len() == 1 && form.coeffs[0].is_one() {
            let v = terms[0].0;
            self.ensure_original(v, pool.is_integer(v))
        } else {
            let key = terms
                .iter()
                .map(|(v, _)| *v)
                .zip(form.coeffs.iter().cloned())
                .collect();
            self.ensure_slack(key, pool)
        };

        // lhs = factor · var + c, so lhs ⋈ 0 iff var ⋈' -c / factor
        let value = -lhs.constant_part() / &form.factor;
        let relation = if form.factor.is_negative() {
            constraint.relation().flip()
        } else {
            constraint.relation()
        };
        let integer = self.vars[var.index()].is_integer();

        let mut ids: SmallVec<[BoundId; 2]> = SmallVec::new();
        match relation {
            Relation::Eq => {
                ids.push(self.register(var, Relation::Leq, &value, integer, None, None));
                ids.push(self.register(var, Relation::Geq, &value, integer, None, None));
            }
            Relation::Neq => {
                let id = Some(constraint.id());
                ids.push(self.register(var, Relation::Less, &value, integer, None, id));
                ids.push(self.register(var, Relation::Greater, &value, integer, None, id));
            }
            rel => ids.push(self.register(var, rel, &value, integer, Some(constraint), None)),
        }
        trace!(constraint = %constraint, bounds = ids.len(), "registered bounds");
        self.constraint_bounds.insert(constraint.id(), ids);
        Ok(true)
    }

    fn register(
        &mut self,
        var: VariableId,
        relation: Relation,
        value: &BigRational,
        integer: bool,
        constraint: Option<&Arc<Constraint>>,
        neq_of: Option<ConstraintId>,
    ) -> BoundId {
        let (kind, limit) = bound_limit(relation, value, integer);
        let key = (var, kind, limit.clone());
        if let Some(&existing) = self.bound_index.get(&key) {
            if let Some(c) = constraint {
                self.bounds[existing.index()].set_constraint_if_missing(c);
            }
            return existing;
        }
        let id = BoundId::new(self.bounds.len());
        self.bounds
            .push(Bound::new(var, kind, limit.clone(), constraint.cloned(), neq_of));
        let entry = (limit, id);
        let variable = &mut self.vars[var.index()];
        match kind {
            BoundKind::Lower => variable.lower.insert(entry),
            BoundKind::Upper => variable.upper.insert(entry),
        };
        self.bound_index.insert(key, id);
        id
    }

    /// Tightest active lower bound.
    pub fn inf(&self, var: VariableId) -> Option<BoundId> {
        self.vars[var.index()]
            .lower
            .iter()
            .rev()
            .map(|(_, id)| *id)
            .find(|id| self.bounds[id.index()].is_active())
    }

    /// Tightest active upper bound.
    pub fn sup(&self, var: VariableId) -> Option<BoundId> {
        self.vars[var.index()]
            .upper
            .iter()
            .map(|(_, id)| *id)
            .find(|id| self.bounds[id.index()].is_active())
    }

    fn inf_limit(&self, var: VariableId) -> Option<&DeltaRational> {
        self.inf(var).map(|b| self.bounds[b.index()].limit())
    }

    fn sup_limit(&self, var: VariableId) -> Option<&DeltaRational> {
        self.sup(var).map(|b| self.bounds[b.index()].limit())
    }

    /// Add an origin to a bound.
    ///
    /// Returns the conflicting `(lower, upper)` pair if the variable's
    /// infimum now exceeds its supremum. Otherwise a non-basic variable is
    /// moved inside its bounds.
    pub fn activate_bound(&mut self, bound: BoundId, origin: Formula) -> Option<(BoundId, BoundId)> {
        self.bounds[bound.index()].add_origin(origin);
        let var = self.bounds[bound.index()].var();
        if let (Some(lower), Some(upper)) = (self.inf(var), self.sup(var))
            && self.bounds[lower.index()].limit() > self.bounds[upper.index()].limit()
        {
            trace!(var = var.index(), "bound conflict on activation");
            return Some((lower, upper));
        }
        if !self.vars[var.index()].basic {
            let current = &self.vars[var.index()].assignment;
            let target = match (self.inf_limit(var), self.sup_limit(var)) {
                (Some(low), _) if current < low => Some(low.clone()),
                (_, Some(up)) if current > up => Some(up.clone()),
                _ => None,
            };
            if let Some(value) = target {
                self.update_nonbasic(var, value);
            }
        }
        None
    }

    /// Remove one occurrence of `origin` from a bound.
    pub fn deactivate_bound(&mut self, bound: BoundId, origin: &Formula) {
        self.bounds[bound.index()].remove_origin(origin);
    }

    /// Mark a bound as derived.
    pub fn mark_deduced(&mut self, bound: BoundId) {
        self.bounds[bound.index()].mark_deduced();
    }

    /// Variables whose infimum exceeds their supremum.
    pub fn bound_conflicts(&self) -> Vec<(BoundId, BoundId)> {
        (0..self.vars.len())
            .map(VariableId::new)
            .filter_map(|var| {
                let lower = self.inf(var)?;
                let upper = self.sup(var)?;
                (self.bounds[lower.index()].limit() > self.bounds[upper.index()].limit())
                    .then_some((lower, upper))
            })
            .collect()
    }

    // ----- assignment -----

    fn update_nonbasic(&mut self, var: VariableId, value: DeltaRational) {
        let delta = &value - &self.vars[var.index()].assignment;
        self.vars[var.index()].assignment = value;
        if let Some(users) = self.columns.get(&var) {
            for basic in users {
                let coeff = &self.rows[basic][&var];
                let shift = delta.scale(coeff);
                self.vars[basic.index()].assignment += &shift;
            }
        }
    }

    fn violation(&self, var: VariableId) -> Option<BoundKind> {
        let value = &self.vars[var.index()].assignment;
        if self.inf_limit(var).is_some_and(|low| value < low) {
            Some(BoundKind::Lower)
        } else if self.sup_limit(var).is_some_and(|up| value > up) {
            Some(BoundKind::Upper)
        } else {
            None
        }
    }

    /// Check whether a non-basic variable can move in the given direction.
    fn can_move(&self, var: VariableId, increase: bool) -> bool {
        let value = &self.vars[var.index()].assignment;
        if increase {
            self.sup_limit(var).is_none_or(|up| value < up)
        } else {
            self.inf_limit(var).is_none_or(|low| value > low)
        }
    }

    fn eligible_columns(&self, basic: VariableId, violated: BoundKind) -> Vec<VariableId> {
        let increase = violated == BoundKind::Lower;
        self.rows[&basic]
            .iter()
            .filter(|(col, coeff)| self.can_move(**col, increase == coeff.is_positive()))
            .map(|(col, _)| *col)
            .collect()
    }

    /// Choose the next pivot, or report feasibility or a conflict.
    pub fn next_pivoting_element(&self, bland: bool) -> PivotDecision {
        let mut best: Option<(usize, VariableId, VariableId)> = None;
        for (&basic, row) in &self.rows {
            let Some(violated) = self.violation(basic) else {
                continue;
            };
            let columns = self.eligible_columns(basic, violated);
            if columns.is_empty() {
                return PivotDecision::Conflict { row: basic };
            }
            if bland {
                // Rows are visited by ascending handle; columns are sorted too.
                return PivotDecision::Pivot {
                    row: basic,
                    column: columns[0],
                };
            }
            if best.as_ref().is_none_or(|(len, _, _)| row.len() < *len) {
                let column = columns
                    .iter()
                    .copied()
                    .min_by_key(|c| (self.columns.get(c).map_or(0, BTreeSet::len), *c))
                    .unwrap_or(columns[0]);
                best = Some((row.len(), basic, column));
            }
        }
        match best {
            Some((_, row, column)) => PivotDecision::Pivot { row, column },
            None => PivotDecision::Feasible,
        }
    }

    /// Pivot-and-update: move `basic` onto its violated bound by changing
    /// `nonbasic`, then exchange the two.
    pub fn pivot(&mut self, basic: VariableId, nonbasic: VariableId) {
        let target = match self.violation(basic) {
            Some(BoundKind::Lower) => self.inf_limit(basic).cloned(),
            Some(BoundKind::Upper) => self.sup_limit(basic).cloned(),
            None => None,
        };
        let Some(coeff) = self.rows.get(&basic).and_then(|r| r.get(&nonbasic)).cloned() else {
            return;
        };
        if let Some(target) = target {
            let theta = (&target - &self.vars[basic.index()].assignment).div_scalar(&coeff);
            let value = &self.vars[nonbasic.index()].assignment + &theta;
            self.update_nonbasic(nonbasic, value);
        }
        self.exchange(basic, nonbasic, &coeff);
        trace!(leaving = basic.index(), entering = nonbasic.index(), "pivot");
    }

    fn exchange(&mut self, basic: VariableId, nonbasic: VariableId, coeff: &BigRational) {
        let Some(mut row) = self.rows.remove(&basic) else {
            return;
        };
        for col in row.keys() {
            if let Some(users) = self.columns.get_mut(col) {
                users.remove(&basic);
            }
        }
        row.remove(&nonbasic);

        // nonbasic = basic / a - Σ (a_j / a) x_j
        let mut entering = Row::new();
        entering.insert(basic, coeff.recip());
        for (col, a) in row {
            entering.insert(col, -a / coeff);
        }

        let users = self.columns.remove(&nonbasic).unwrap_or_default();
        for user in users {
            let Some(user_row) = self.rows.get_mut(&user) else {
                continue;
            };
            let Some(factor) = user_row.remove(&nonbasic) else {
                continue;
            };
            for (col, q) in &entering {
                let before = user_row.contains_key(col);
                add_coeff(user_row, *col, &factor * q);
                let after = user_row.contains_key(col);
                if before != after {
                    let users_of_col = self.columns.entry(*col).or_default();
                    if after {
                        users_of_col.insert(user);
                    } else {
                        users_of_col.remove(&user);
                    }
                }
            }
        }

        for col in entering.keys() {
            self.columns.entry(*col).or_default().insert(nonbasic);
        }
        self.rows.insert(nonbasic, entering);
        self.vars[basic.index()].basic = false;
        self.vars[basic.index()].pivot_count += 1;
        self.vars[nonbasic.index()].basic = true;
        self.vars[nonbasic.index()].pivot_count += 1;
    }

    // ----- explanations -----

    /// Active bounds explaining why the row of `basic` is infeasible.
    pub fn conflict(&self, basic: VariableId) -> Vec<BoundId> {
        let Some(violated) = self.violation(basic) else {
            return Vec::new();
        };
        let Some(row) = self.rows.get(&basic) else {
            return Vec::new();
        };
        let own = match violated {
            BoundKind::Lower => self.inf(basic),
            BoundKind::Upper => self.sup(basic),
        };
        let mut explanation: Vec<BoundId> = own.into_iter().collect();
        for (col, coeff) in row {
            // Too low: positive columns sit at their sup, negative ones at their inf.
            let bound = match (violated, coeff.is_positive()) {
                (BoundKind::Lower, true) | (BoundKind::Upper, false) => self.sup(*col),
                _ => self.inf(*col),
            };
            explanation.extend(bound);
        }
        explanation
    }

    /// Explanations for every infeasible row, starting with `first`.
    pub fn conflicts_from(&self, first: VariableId) -> Vec<Vec<BoundId>> {
        let mut conflicts = vec![self.conflict(first)];
        for &basic in self.rows.keys() {
            if basic == first {
                continue;
            }
            if let Some(violated) = self.violation(basic)
                && self.eligible_columns(basic, violated).is_empty()
            {
                conflicts.push(self.conflict(basic));
            }
        }
        conflicts
    }

    /// Inactive bounds of `basic` implied by the active bounds of its row.
    pub fn refine_row(&self, basic: VariableId) -> Vec<Refinement> {
        let Some(row) = self.rows.get(&basic) else {
            return Vec::new();
        };
        let mut refinements = Vec::new();
        for kind in [BoundKind::Upper, BoundKind::Lower] {
            let mut implied = DeltaRational::zero();
            let mut premises = Vec::with_capacity(row.len());
            let mut complete = true;
            for (col, coeff) in row {
                // Upper bound of the row needs sup of positive and inf of negative columns.
                let bound = match (kind, coeff.is_positive()) {
                    (BoundKind::Upper, true) | (BoundKind::Lower, false) => self.sup(*col),
                    _ => self.inf(*col),
                };
                let Some(bound) = bound else {
                    complete = false;
                    break;
                };
                implied += &self.bounds[bound.index()].limit().scale(coeff);
                premises.push(bound);
            }
            if !complete {
                continue;
            }
            let candidates = match kind {
                BoundKind::Upper => &self.vars[basic.index()].upper,
                BoundKind::Lower => &self.vars[basic.index()].lower,
            };
            // The tightest inactive bound that is still implied.
            let found = match kind {
                BoundKind::Upper => candidates
                    .range((implied.clone(), BoundId::new(0))..)
                    .map(|(_, id)| *id)
                    .find(|id| self.is_refinement_target(*id)),
                BoundKind::Lower => candidates
                    .iter()
                    .rev()
                    .filter(|(limit, _)| *limit <= implied)
                    .map(|(_, id)| *id)
                    .find(|id| self.is_refinement_target(*id)),
            };
            if let Some(bound) = found {
                refinements.push(Refinement { bound, premises });
            }
        }
        refinements
    }

    fn is_refinement_target(&self, bound: BoundId) -> bool {
        let bound = &self.bounds[bound.index()];
        !bound.is_active() && !bound.is_deduced() && bound.constraint().is_some()
    }

    // ----- snapshots and models -----

    /// Remember the current non-basic assignment.
    pub fn store_assignment(&mut self) {
        for var in &mut self.vars {
            var.stored = (!var.basic).then(|| var.assignment.clone());
        }
    }

    /// Return non-basic variables to the stored assignment, clamped to their
    /// current bounds, and recompute every basic variable.
    pub fn restore_assignment(&mut self) {
        self.reset_nonbasics(true);
    }

    /// Clamp non-basic variables into their current bounds and recompute
    /// every basic variable.
    ///
    /// A bound activation that ends in a conflict leaves the assignment
    /// untouched, so retracting the other side of the conflict can leave a
    /// non-basic variable outside its remaining bound.
    pub fn clamp_nonbasics(&mut self) {
        self.reset_nonbasics(false);
    }

    fn reset_nonbasics(&mut self, from_stored: bool) {
        for index in 0..self.vars.len() {
            let id = VariableId::new(index);
            if self.vars[index].basic {
                continue;
            }
            let stored = if from_stored { self.vars[index].stored.clone() } else { None };
            let mut value = stored.unwrap_or_else(|| self.vars[index].assignment.clone());
            if let Some(up) = self.sup_limit(id)
                && &value > up
            {
                value = up.clone();
            }
            if let Some(low) = self.inf_limit(id)
                && &value < low
            {
                value = low.clone();
            }
            self.vars[index].assignment = value;
        }
        self.recompute_basics();
    }

    fn recompute_basics(&mut self) {
        for (basic, row) in &self.rows {
            let mut value = DeltaRational::zero();
            for (col, coeff) in row {
                value += &self.vars[col.index()].assignment.scale(coeff);
            }
            self.vars[basic.index()].assignment = value;
        }
    }

    /// Largest δ (at most 1) for which every active bound survives
    /// concretisation of the assignment.
    pub fn delta_value(&self) -> BigRational {
        let mut delta = BigRational::one();
        for (index, var) in self.vars.iter().enumerate() {
            let id = VariableId::new(index);
            if let Some(low) = self.inf_limit(id)
                && let Some(limit) = low.delta_limit(&var.assignment)
            {
                delta = delta.min(limit);
            }
            if let Some(up) = self.sup_limit(id)
                && let Some(limit) = var.assignment.delta_limit(up)
            {
                delta = delta.min(limit);
            }
        }
        delta
    }

    /// Exact rational values of the input variables.
    pub fn rational_assignment(&self) -> BTreeMap<VarId, BigRational> {
        let delta = self.delta_value();
        self.originals
            .iter()
            .map(|(var, id)| (*var, self.vars[id.index()].assignment.concretize(&delta)))
            .collect()
    }

    /// Check `Σ a_j · β(x_j) = β(basic)` for every row.
    pub fn rows_consistent(&self) -> bool {
        self.rows.iter().all(|(basic, row)| {
            let mut value = DeltaRational::zero();
            for (col, coeff) in row {
                value += &self.vars[col.index()].assignment.scale(coeff);
            }
            value == self.vars[basic.index()].assignment
        })
    }

    /// Check that no non-basic variable violates an active bound.
    pub fn nonbasics_within_bounds(&self) -> bool {
        (0..self.vars.len())
            .map(VariableId::new)
            .filter(|id| !self.vars[id.index()].basic)
            .all(|id| self.violation(id).is_none())
    }

    /// Handles of all tableau variables.
    pub fn variables(&self) -> impl Iterator<Item = VariableId> {
        (0..self.vars.len()).map(VariableId::new)
    }
}

fn add_coeff(row: &mut Row, col: VariableId, value: BigRational) {
    if value.is_zero() {
        return;
    }
    let entry = row.entry(col).or_insert_with(BigRational::zero);
    *entry += value;
    if entry.is_zero() {
        row.remove(&col);
    }
}

/// Kind and limit of `var ⋈ value`, rounding limits of integer variables.
fn bound_limit(relation: Relation, value: &BigRational, integer: bool) -> (BoundKind, DeltaRational) {
    let integral = value.is_integer();
    match relation {
        Relation::Less if integer => {
            let limit = if integral { value - BigRational::one() } else { value.floor() };
            (BoundKind::Upper, DeltaRational::from_rational(limit))
        }
        Relation::Less => (BoundKind::Upper, DeltaRational::below(value.clone())),
        Relation::Leq if integer => (BoundKind::Upper, DeltaRational::from_rational(value.floor())),
        Relation::Greater if integer => {
            let limit = if integral { value + BigRational::one() } else { value.ceil() };
            (BoundKind::Lower, DeltaRational::from_rational(limit))
        }
        Relation::Greater => (BoundKind::Lower, DeltaRational::above(value.clone())),
        Relation::Geq if integer => (BoundKind::Lower, DeltaRational::from_rational(value.ceil())),
        Relation::Geq => (BoundKind::Lower, DeltaRational::from_rational(value.clone())),
        // Leq, and the halves of Eq/Neq requested as Leq/Geq/Less/Greater
        _ => (BoundKind::Upper, DeltaRational::from_rational(value.clone())),
    }
}
