// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! The branch-and-bound node.
//!
//! A node owns one subproblem: its LP model, the active columns, the cut
//! and branch-constraint lists inherited from root to here, and either an
//! arc bucket graph (fractional/pricing state) or a reference into the
//! shared enumeration column pool (enumeration state).
//!
//! Invariants (debug-checked where cheap, test-checked otherwise):
//! - The LP's row count equals base rows plus row-carrying branch
//!   constraints plus active cuts.
//! - The dummy column sits at LP index 0 for the node's whole lifetime.
//! - A node in enumeration state has no bucket graph.
//! - The root node is the unique node with an empty constraint list.

use crate::branch::constraint::{BranchConstraint, BranchDirection};
use crate::bucket::BucketGraph;
use crate::cut::{CapacityCut, RankOneCut};
use crate::pool::EnumColumnPool;
use cairn_core::num::tolerance::{INTEGRALITY_EPS, SOLVER_EPS, is_integral};
use cairn_lp::model::LpModel;
use cairn_model::column::Column;
use cairn_model::edge::{Edge, EdgePair};
use cairn_model::solution::Solution;
use fixedbitset::FixedBitSet;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotone source of node indices.
///
/// Injected into whoever creates nodes (controller, branching operator)
/// instead of living as a process-wide global, so several searches can run
/// in one process without sharing counters.
#[derive(Debug, Default)]
pub struct NodeIndexer(AtomicU64);

impl NodeIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next unused node index.
    #[inline]
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

/// The enumeration-state payload of a node: a view into the shared pool.
#[derive(Clone, Debug, PartialEq)]
pub struct EnumState {
    /// Pool indices of the columns this node still considers.
    pool_indices: Vec<usize>,
    /// Per-column costs, parallel to `pool_indices`.
    costs: Vec<f64>,
    /// Private deleted-mask over `pool_indices` positions.
    deleted: FixedBitSet,
}

impl EnumState {
    pub(crate) fn new(pool_indices: Vec<usize>, costs: Vec<f64>) -> Self {
        assert_eq!(
            pool_indices.len(),
            costs.len(),
            "called `EnumState::new` with inconsistent lengths: {} indices but {} costs",
            pool_indices.len(),
            costs.len()
        );
        let deleted = FixedBitSet::with_capacity(pool_indices.len());
        Self {
            pool_indices,
            costs,
            deleted,
        }
    }

    #[inline(always)]
    pub fn pool_indices(&self) -> &[usize] {
        &self.pool_indices
    }

    #[inline(always)]
    pub fn costs(&self) -> &[f64] {
        &self.costs
    }

    #[inline(always)]
    pub fn deleted(&self) -> &FixedBitSet {
        &self.deleted
    }

    /// Number of not-yet-deleted columns.
    pub fn num_live(&self) -> usize {
        self.pool_indices.len() - self.deleted.count_ones(..)
    }
}

/// One branch-and-bound node.
#[derive(Debug)]
pub struct BbNode {
    idx: u64,
    lp: LpModel,
    cols: Vec<Column>,
    brcs: Vec<BranchConstraint>,
    rccs: Vec<CapacityCut>,
    r1cs: Vec<RankOneCut>,
    in_enum_state: bool,
    terminate: bool,
    value: f64,
    last_gap: f64,
    /// Partitioning rows present at the root; the base of the row-count
    /// invariant.
    base_rows: usize,
    buckets: Option<BucketGraph>,
    enum_state: Option<EnumState>,
    /// 3-way splits taken on the root-to-here path (the per-path depth
    /// budget of the MIDDLE branch).
    three_way_splits: u32,
    edge_map: Option<HashMap<Edge, f64>>,
    edge_pair_map: Option<HashMap<EdgePair, f64>>,
}

impl BbNode {
    /// Creates the root node.
    ///
    /// # Panics
    ///
    /// Panics if the column list does not start with the dummy column, or
    /// if the LP column count disagrees with the column list.
    pub fn root(
        indexer: &NodeIndexer,
        lp: LpModel,
        cols: Vec<Column>,
        buckets: BucketGraph,
    ) -> Self {
        assert!(
            cols.first().is_some_and(|c| c.is_dummy()),
            "called `BbNode::root` without the dummy column at index 0"
        );
        assert_eq!(
            lp.num_cols(),
            cols.len(),
            "called `BbNode::root` with {} LP columns but {} column records",
            lp.num_cols(),
            cols.len()
        );
        let base_rows = lp.num_rows();
        Self {
            idx: indexer.next(),
            lp,
            cols,
            brcs: Vec::new(),
            rccs: Vec::new(),
            r1cs: Vec::new(),
            in_enum_state: false,
            terminate: false,
            value: 0.0,
            last_gap: 1.0,
            base_rows,
            buckets: Some(buckets),
            enum_state: None,
            three_way_splits: 0,
            edge_map: None,
            edge_pair_map: None,
        }
    }

    /// Clones this node into a child carrying one additional branch
    /// constraint. The LP model is deep-copied; columns, cuts, and prior
    /// constraints are inherited; the edge-solution caches start empty.
    ///
    /// In pricing state the bucket graph is deep-copied; in enumeration
    /// state the pool view (indices, costs, deleted-mask) is copied and no
    /// buckets exist.
    ///
    /// # Panics
    ///
    /// Panics if a pricing-state node has lost its bucket graph; that is an
    /// unrecoverable inconsistency.
    pub fn clone_with_branch(&self, indexer: &NodeIndexer, brc: BranchConstraint) -> Self {
        let mut brcs = self.brcs.clone();
        brcs.push(brc);

        let (buckets, enum_state) = if self.in_enum_state {
            (None, Some(self.enum_state.clone().expect(
                "enumeration-state node without an enumeration payload",
            )))
        } else {
            let buckets = self
                .buckets
                .as_ref()
                .expect("pricing-state node without a bucket graph")
                .clone();
            (Some(buckets), None)
        };

        Self {
            idx: indexer.next(),
            lp: self.lp.clone(),
            cols: self.cols.clone(),
            brcs,
            rccs: self.rccs.clone(),
            r1cs: self.r1cs.clone(),
            in_enum_state: self.in_enum_state,
            terminate: false,
            value: self.value,
            last_gap: self.last_gap,
            base_rows: self.base_rows,
            buckets,
            enum_state,
            three_way_splits: self.three_way_splits,
            edge_map: None,
            edge_pair_map: None,
        }
    }

    /// Reassembles a node from checkpointed parts. Only the checkpoint
    /// module calls this; it bypasses the root-only construction checks
    /// because a restored node legitimately carries branch constraints.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_checkpoint(
        indexer: &NodeIndexer,
        lp: LpModel,
        cols: Vec<Column>,
        brcs: Vec<BranchConstraint>,
        rccs: Vec<CapacityCut>,
        r1cs: Vec<RankOneCut>,
        value: f64,
        last_gap: f64,
        base_rows: usize,
        buckets: Option<BucketGraph>,
        enum_state: Option<EnumState>,
        three_way_splits: u32,
    ) -> Self {
        assert!(
            cols.first().is_some_and(|c| c.is_dummy()),
            "called `BbNode::from_checkpoint` without the dummy column at index 0"
        );
        let in_enum_state = enum_state.is_some();
        debug_assert!(
            in_enum_state != buckets.is_some(),
            "called `BbNode::from_checkpoint` with inconsistent state payloads"
        );
        Self {
            idx: indexer.next(),
            lp,
            cols,
            brcs,
            rccs,
            r1cs,
            in_enum_state,
            terminate: false,
            value,
            last_gap,
            base_rows,
            buckets,
            enum_state,
            three_way_splits,
            edge_map: None,
            edge_pair_map: None,
        }
    }

    /// Column indices and coefficients of the branching row for `edge`
    /// over this node's columns.
    ///
    /// The dummy column leads the list with coefficient 1, so callers that
    /// must not touch it strip a leading index 0. Coefficients count edge
    /// traversals and are symmetric in the edge's endpoints.
    pub fn obtain_brc_coefficient(&self, edge: Edge) -> (Vec<usize>, Vec<f64>) {
        let mut indices = vec![0usize];
        let mut values = vec![1.0f64];
        for (j, col) in self.cols.iter().enumerate().skip(1) {
            let coef = col.edge_coefficient(edge);
            if coef > 0.0 {
                indices.push(j);
                values.push(coef);
            }
        }
        (indices, values)
    }

    /// Columns that must be removed when forcing `edge = 1`: those that
    /// visit an endpoint of the edge without traversing it. The dummy
    /// column leads the list as the index-0 sentinel.
    pub fn obtain_col_idx_not_allowed_by_edge(&self, edge: Edge) -> Vec<usize> {
        let mut indices = vec![0usize];
        for (j, col) in self.cols.iter().enumerate().skip(1) {
            if Self::column_conflicts_with_forced_edge(col, edge) {
                indices.push(j);
            }
        }
        indices
    }

    /// Whether a column is incompatible with forcing `edge = 1`.
    ///
    /// The depot counts as an endpoint only through edge usage: every route
    /// visits the depot, so "visits an endpoint" is restricted to customer
    /// endpoints.
    fn column_conflicts_with_forced_edge(col: &Column, edge: Edge) -> bool {
        if col.uses_edge(edge) {
            return false;
        }
        let touches_lo = !edge.lo().is_zero() && col.visits(edge.lo());
        let touches_hi = !edge.hi().is_zero() && col.visits(edge.hi());
        touches_lo || touches_hi
    }

    /// Removes columns from the LP model and the column list.
    ///
    /// A leading index 0 is the dummy-column sentinel and is stripped; the
    /// dummy itself is never removed.
    ///
    /// # Panics
    ///
    /// Panics if index 0 appears anywhere but the front.
    pub fn remove_lp_cols(&mut self, indices: &[usize]) {
        let indices = match indices.first() {
            Some(0) => &indices[1..],
            _ => indices,
        };
        if indices.is_empty() {
            return;
        }
        assert!(
            indices.iter().all(|&j| j != 0),
            "called `BbNode::remove_lp_cols` trying to remove the dummy column"
        );
        self.lp.remove_cols(indices);

        let mut removed_iter = indices.iter().peekable();
        let mut j = 0usize;
        self.cols.retain(|_| {
            let drop = removed_iter.peek() == Some(&&j);
            if drop {
                removed_iter.next();
            }
            j += 1;
            !drop
        });
        self.clear_edge_maps();
    }

    /// Aggregated fractional usage per edge from the current LP primal.
    ///
    /// The result is cached until the caches are cleared or columns are
    /// removed.
    pub fn sol_edge_map(&mut self) -> Result<&HashMap<Edge, f64>, cairn_lp::err::LpError> {
        if self.edge_map.is_none() {
            let solution = self.lp.solution()?;
            let mut map: HashMap<Edge, f64> = HashMap::new();
            for (j, col) in self.cols.iter().enumerate().skip(1) {
                let x = solution.x()[j];
                if x <= SOLVER_EPS {
                    continue;
                }
                accumulate_column_edges(&mut map, col, x);
            }
            self.edge_map = Some(map);
        }
        Ok(self.edge_map.as_ref().unwrap())
    }

    /// Edge-pair usage for 3-way branching: pairs of fractional edges that
    /// co-occur in a fractionally used column, scored by the sum of their
    /// aggregated usages.
    pub fn sol_edge_pair_map(
        &mut self,
    ) -> Result<&HashMap<EdgePair, f64>, cairn_lp::err::LpError> {
        if self.edge_pair_map.is_none() {
            let edge_map = self.sol_edge_map()?.clone();
            let solution = self.lp.solution()?;
            let mut map: HashMap<EdgePair, f64> = HashMap::new();
            for (j, col) in self.cols.iter().enumerate().skip(1) {
                let x = solution.x()[j];
                if x <= SOLVER_EPS || x >= 1.0 - SOLVER_EPS {
                    continue;
                }
                let mut fractional_edges: Vec<Edge> = Vec::new();
                let mut col_edges: HashMap<Edge, f64> = HashMap::new();
                accumulate_column_edges(&mut col_edges, col, 1.0);
                for edge in col_edges.keys() {
                    let usage = edge_map.get(edge).copied().unwrap_or(0.0);
                    if !is_integral(usage) {
                        fractional_edges.push(*edge);
                    }
                }
                fractional_edges.sort_unstable();
                for (a_pos, &a) in fractional_edges.iter().enumerate() {
                    for &b in &fractional_edges[a_pos + 1..] {
                        let score = edge_map[&a] + edge_map[&b];
                        map.entry(EdgePair::new(a, b)).or_insert(score);
                    }
                }
            }
            self.edge_pair_map = Some(map);
        }
        Ok(self.edge_pair_map.as_ref().unwrap())
    }

    /// Drops the cached edge maps; called after branching mutates the LP.
    #[inline]
    pub fn clear_edge_maps(&mut self) {
        self.edge_map = None;
        self.edge_pair_map = None;
    }

    /// Extracts an integer-feasible solution from the current LP primal,
    /// if the primal is integral and the dummy column is out of the basis.
    /// Returns `None` when the LP is unsolved or fractional.
    pub fn try_integer_solution(&self) -> Option<Solution> {
        let solution = self.lp.solution().ok()?;
        let x = solution.x();
        if x[0] > INTEGRALITY_EPS {
            return None;
        }
        if !x.iter().all(|&xi| is_integral(xi)) {
            return None;
        }
        let mut routes = Vec::new();
        let mut objective = 0.0;
        for (j, col) in self.cols.iter().enumerate().skip(1) {
            let copies = x[j].round() as usize;
            for _ in 0..copies {
                routes.push(col.clone());
                objective += col.cost();
            }
        }
        if routes.is_empty() {
            return None;
        }
        Some(Solution::new(objective, routes))
    }

    /// Switches this node into enumeration state: the bucket graph is
    /// dropped and the node starts referencing the shared pool.
    pub fn enter_enumeration(&mut self, pool_indices: Vec<usize>, costs: Vec<f64>) {
        self.enum_state = Some(EnumState::new(pool_indices, costs));
        self.in_enum_state = true;
        self.buckets = None;
    }

    /// Marks pool columns incompatible with `brc` in the private
    /// deleted-mask.
    ///
    /// # Panics
    ///
    /// Panics if the node is not in enumeration state.
    pub fn mark_pool_deleted_by_branch(&mut self, brc: &BranchConstraint, pool: &EnumColumnPool) {
        let state = self
            .enum_state
            .as_mut()
            .expect("called `BbNode::mark_pool_deleted_by_branch` outside enumeration state");
        for (pos, &pool_idx) in state.pool_indices.iter().enumerate() {
            if state.deleted.contains(pos) {
                continue;
            }
            let dead = pool.with_col(pool_idx, |col| match brc.direction() {
                BranchDirection::Force => {
                    Self::column_conflicts_with_forced_edge(col, brc.edge())
                }
                BranchDirection::Forbid => col.uses_edge(brc.edge()),
                // MIDDLE is LP-level only; the pool is untouched.
                BranchDirection::Middle => false,
            });
            if dead {
                state.deleted.insert(pos);
            }
        }
    }

    /// Rebuilds the enumeration view from the retained columns, compacting
    /// the deleted-mask away.
    ///
    /// `duals` controls row recycling in a full enumeration engine; the
    /// sentinel vector of all `-1` keeps every base row. This core never
    /// recycles rows, so the vector only has to have one entry per LP row.
    ///
    /// # Panics
    ///
    /// Panics if the node is not in enumeration state or the duals vector
    /// does not match the LP row count.
    pub fn regenerate_enum_matrix(&mut self, duals: &[f64]) {
        assert_eq!(
            duals.len(),
            self.lp.num_rows(),
            "called `BbNode::regenerate_enum_matrix` with {} duals for {} rows",
            duals.len(),
            self.lp.num_rows()
        );
        let state = self
            .enum_state
            .as_mut()
            .expect("called `BbNode::regenerate_enum_matrix` outside enumeration state");

        let mut pool_indices = Vec::with_capacity(state.num_live());
        let mut costs = Vec::with_capacity(state.num_live());
        for pos in 0..state.pool_indices.len() {
            if !state.deleted.contains(pos) {
                pool_indices.push(state.pool_indices[pos]);
                costs.push(state.costs[pos]);
            }
        }
        *state = EnumState::new(pool_indices, costs);
    }

    /// Re-assigns this node's index so statistics treat it as a new node
    /// (the in-place false child of a 2-way branch).
    #[inline]
    pub fn reindex(&mut self, indexer: &NodeIndexer) {
        self.idx = indexer.next();
    }

    // Plain state accessors below.

    #[inline(always)]
    pub fn idx(&self) -> u64 {
        self.idx
    }

    #[inline(always)]
    pub fn value(&self) -> f64 {
        self.value
    }

    #[inline(always)]
    pub fn set_value(&mut self, value: f64) {
        self.value = value;
    }

    #[inline(always)]
    pub fn last_gap(&self) -> f64 {
        self.last_gap
    }

    #[inline(always)]
    pub fn set_last_gap(&mut self, gap: f64) {
        self.last_gap = gap;
    }

    #[inline(always)]
    pub fn terminate(&self) -> bool {
        self.terminate
    }

    #[inline(always)]
    pub fn set_terminate(&mut self, terminate: bool) {
        self.terminate = terminate;
    }

    #[inline(always)]
    pub fn in_enum_state(&self) -> bool {
        self.in_enum_state
    }

    /// Returns `true` if this is the root: the unique node with no branch
    /// constraints.
    #[inline(always)]
    pub fn is_root(&self) -> bool {
        self.brcs.is_empty()
    }

    #[inline(always)]
    pub fn brcs(&self) -> &[BranchConstraint] {
        &self.brcs
    }

    /// Appends a branch constraint. Used by the branching operator when a
    /// second constraint joins an existing child (3-way) or the false child
    /// is edited in place.
    #[inline]
    pub fn push_brc(&mut self, brc: BranchConstraint) {
        self.brcs.push(brc);
    }

    #[inline(always)]
    pub fn rccs(&self) -> &[CapacityCut] {
        &self.rccs
    }

    #[inline(always)]
    pub fn rccs_mut(&mut self) -> &mut Vec<CapacityCut> {
        &mut self.rccs
    }

    #[inline(always)]
    pub fn r1cs(&self) -> &[RankOneCut] {
        &self.r1cs
    }

    #[inline(always)]
    pub fn r1cs_mut(&mut self) -> &mut Vec<RankOneCut> {
        &mut self.r1cs
    }

    #[inline(always)]
    pub fn cols(&self) -> &[Column] {
        &self.cols
    }

    /// Appends a priced-out column to both the LP and the column list,
    /// returning its index.
    pub fn add_col(&mut self, col: Column, entries: &[(usize, f64)]) -> usize {
        let idx = self.lp.add_col(col.cost(), entries);
        debug_assert_eq!(idx, self.cols.len());
        self.cols.push(col);
        self.clear_edge_maps();
        idx
    }

    #[inline(always)]
    pub fn lp(&self) -> &LpModel {
        &self.lp
    }

    #[inline(always)]
    pub fn lp_mut(&mut self) -> &mut LpModel {
        &mut self.lp
    }

    #[inline(always)]
    pub fn base_rows(&self) -> usize {
        self.base_rows
    }

    #[inline(always)]
    pub fn buckets(&self) -> Option<&BucketGraph> {
        self.buckets.as_ref()
    }

    #[inline(always)]
    pub fn buckets_mut(&mut self) -> Option<&mut BucketGraph> {
        self.buckets.as_mut()
    }

    #[inline(always)]
    pub fn enum_state(&self) -> Option<&EnumState> {
        self.enum_state.as_ref()
    }

    #[inline(always)]
    pub fn three_way_splits(&self) -> u32 {
        self.three_way_splits
    }

    /// Records that the path through this node took a MIDDLE branch.
    #[inline]
    pub fn bump_three_way_splits(&mut self) {
        self.three_way_splits += 1;
    }

    /// Number of row-carrying branch constraints, the middle term of the
    /// row-count invariant. A 3-way MIDDLE pair shares one row and counts
    /// once.
    pub fn num_brc_rows(&self) -> usize {
        let mut rows: Vec<usize> = self.brcs.iter().filter_map(|b| b.row()).collect();
        rows.sort_unstable();
        rows.dedup();
        rows.len()
    }
}

impl std::fmt::Display for BbNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BbNode(idx: {}, value: {}, brcs: {}, cols: {}, {})",
            self.idx,
            self.value,
            self.brcs.len(),
            self.cols.len(),
            if self.in_enum_state {
                "enumeration"
            } else {
                "pricing"
            }
        )
    }
}

fn accumulate_column_edges(map: &mut HashMap<Edge, f64>, col: &Column, weight: f64) {
    let seq = col.seq();
    if seq.is_empty() {
        return;
    }
    let mut prev = cairn_model::index::DEPOT;
    for &v in seq {
        *map.entry(Edge::new(prev, v)).or_insert(0.0) += weight;
        prev = v;
    }
    *map.entry(Edge::new(prev, cairn_model::index::DEPOT))
        .or_insert(0.0) += weight;
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_lp::model::RowSense;
    use cairn_model::index::VertexIndex;

    fn v(i: usize) -> VertexIndex {
        VertexIndex::new(i)
    }

    fn edge(a: usize, b: usize) -> Edge {
        Edge::new(v(a), v(b))
    }

    fn col(seq: &[usize], cost: f64) -> Column {
        Column::new(seq.iter().map(|&i| v(i)).collect(), cost)
    }

    /// A small master over 3 customers with partitioning rows and a few
    /// routes. Columns: dummy, 0-1-2-0, 0-3-0, 0-1-0, 0-2-3-0.
    fn test_node(indexer: &NodeIndexer) -> BbNode {
        let cols = vec![
            Column::dummy(),
            col(&[1, 2], 10.0),
            col(&[3], 6.0),
            col(&[1], 5.0),
            col(&[2, 3], 9.0),
        ];
        let mut lp = LpModel::new();
        for c in &cols {
            lp.add_col(if c.is_dummy() { Column::DUMMY_COST } else { c.cost() }, &[]);
        }
        // partitioning rows, customer 1..=3; dummy covers every row
        for customer in 1..=3usize {
            let mut indices = vec![0usize];
            let mut values = vec![1.0f64];
            for (j, c) in cols.iter().enumerate().skip(1) {
                if c.visits(v(customer)) {
                    indices.push(j);
                    values.push(1.0);
                }
            }
            lp.add_row(&indices, &values, RowSense::Eq, 1.0);
        }
        BbNode::root(indexer, lp, cols, BucketGraph::complete(4, 2, true))
    }

    #[test]
    fn test_root_is_root_and_indexed() {
        let indexer = NodeIndexer::new();
        let node = test_node(&indexer);
        assert!(node.is_root());
        assert_eq!(node.idx(), 0);
        assert_eq!(node.base_rows(), 3);
        assert!(!node.in_enum_state());
        assert!(node.buckets().is_some());
    }

    #[test]
    #[should_panic(expected = "without the dummy column")]
    fn test_root_requires_dummy_at_index_zero() {
        let indexer = NodeIndexer::new();
        let mut lp = LpModel::new();
        lp.add_col(1.0, &[]);
        let _ = BbNode::root(
            &indexer,
            lp,
            vec![col(&[1], 1.0)],
            BucketGraph::complete(2, 1, true),
        );
    }

    #[test]
    fn test_obtain_brc_coefficient_leads_with_dummy() {
        let indexer = NodeIndexer::new();
        let node = test_node(&indexer);
        let (indices, values) = node.obtain_brc_coefficient(edge(1, 2));
        // dummy + column 1 (0-1-2-0 traverses (1,2))
        assert_eq!(indices, vec![0, 1]);
        assert_eq!(values, vec![1.0, 1.0]);
    }

    #[test]
    fn test_obtain_brc_coefficient_symmetric_in_endpoints() {
        let indexer = NodeIndexer::new();
        let node = test_node(&indexer);
        assert_eq!(
            node.obtain_brc_coefficient(edge(1, 2)),
            node.obtain_brc_coefficient(edge(2, 1))
        );
    }

    #[test]
    fn test_obtain_brc_coefficient_depot_edge_counts_traversals() {
        let indexer = NodeIndexer::new();
        let node = test_node(&indexer);
        let (indices, values) = node.obtain_brc_coefficient(edge(0, 1));
        // 0-1-2-0 uses (0,1) once, 0-1-0 uses it twice
        assert_eq!(indices, vec![0, 1, 3]);
        assert_eq!(values, vec![1.0, 1.0, 2.0]);
    }

    #[test]
    fn test_col_idx_not_allowed_by_edge() {
        let indexer = NodeIndexer::new();
        let node = test_node(&indexer);
        // forcing (1,2): 0-3-0 is fine; 0-1-0 visits 1 without the edge;
        // 0-2-3-0 visits 2 without the edge
        let not_allowed = node.obtain_col_idx_not_allowed_by_edge(edge(1, 2));
        assert_eq!(not_allowed, vec![0, 3, 4]);
    }

    #[test]
    fn test_remove_lp_cols_strips_sentinel_and_keeps_dummy() {
        let indexer = NodeIndexer::new();
        let mut node = test_node(&indexer);
        node.remove_lp_cols(&[0, 3, 4]);
        assert_eq!(node.cols().len(), 3);
        assert_eq!(node.lp().num_cols(), 3);
        assert!(node.cols()[0].is_dummy());
        // surviving non-dummy columns are the originals 1 and 2
        assert_eq!(node.cols()[1].cost(), 10.0);
        assert_eq!(node.cols()[2].cost(), 6.0);
    }

    #[test]
    #[should_panic(expected = "dummy column")]
    fn test_remove_lp_cols_rejects_interior_zero() {
        let indexer = NodeIndexer::new();
        let mut node = test_node(&indexer);
        node.remove_lp_cols(&[1, 0, 2]);
    }

    #[test]
    fn test_clone_with_branch_inherits_and_appends() {
        let indexer = NodeIndexer::new();
        let node = test_node(&indexer);
        let brc = BranchConstraint::two_way(edge(1, 2), Some(3), BranchDirection::Force);
        let child = node.clone_with_branch(&indexer, brc);

        assert_eq!(child.idx(), 1);
        assert!(!child.is_root());
        assert_eq!(child.brcs().len(), 1);
        assert_eq!(child.cols().len(), node.cols().len());
        assert_eq!(child.lp().num_rows(), node.lp().num_rows());
        assert_eq!(child.value(), node.value());
        assert_eq!(child.buckets(), node.buckets());
    }

    #[test]
    fn test_clone_is_independent() {
        let indexer = NodeIndexer::new();
        let node = test_node(&indexer);
        let brc = BranchConstraint::two_way(edge(1, 2), None, BranchDirection::Forbid);
        let mut child = node.clone_with_branch(&indexer, brc);
        child.remove_lp_cols(&[1]);
        child
            .buckets_mut()
            .unwrap()
            .delete_edge(edge(1, 2));

        assert_eq!(node.cols().len(), 5);
        assert!(node.buckets().unwrap().contains_edge(edge(1, 2)));
        assert_eq!(child.cols().len(), 4);
        assert!(!child.buckets().unwrap().contains_edge(edge(1, 2)));
    }

    #[test]
    fn test_sol_edge_map_aggregates_fractional_usage() {
        let indexer = NodeIndexer::new();
        let mut node = test_node(&indexer);
        node.lp_mut().solve().expect("test LP should solve");
        let map = node.sol_edge_map().unwrap().clone();

        // the primal is a partition; every customer must be covered, so
        // some depot edges must carry usage
        assert!(!map.is_empty());
        let total: f64 = map.values().sum();
        assert!(total > 0.0);
        // the map never contains usage below tolerance
        assert!(map.values().all(|&u| u > SOLVER_EPS));
    }

    #[test]
    fn test_enter_enumeration_drops_buckets() {
        let indexer = NodeIndexer::new();
        let mut node = test_node(&indexer);
        node.enter_enumeration(vec![0, 1, 2], vec![5.0, 6.0, 7.0]);
        assert!(node.in_enum_state());
        assert!(node.buckets().is_none());
        assert_eq!(node.enum_state().unwrap().num_live(), 3);
    }

    #[test]
    fn test_mark_pool_deleted_by_branch_directions() {
        let indexer = NodeIndexer::new();
        let pool = EnumColumnPool::new();
        let a = pool.append(col(&[1, 2], 10.0)); // uses (1,2)
        let b = pool.append(col(&[1], 5.0)); // visits 1 without (1,2)
        let c = pool.append(col(&[3], 6.0)); // unrelated

        let mut node = test_node(&indexer);
        node.enter_enumeration(vec![a, b, c], vec![10.0, 5.0, 6.0]);

        // FORBID (1,2) kills the user of the edge
        let forbid = BranchConstraint::two_way(edge(1, 2), None, BranchDirection::Forbid);
        node.mark_pool_deleted_by_branch(&forbid, &pool);
        assert!(node.enum_state().unwrap().deleted().contains(0));
        assert!(!node.enum_state().unwrap().deleted().contains(1));
        assert!(!node.enum_state().unwrap().deleted().contains(2));

        // FORCE (1,2) kills the endpoint-toucher
        let force = BranchConstraint::two_way(edge(1, 2), None, BranchDirection::Force);
        node.mark_pool_deleted_by_branch(&force, &pool);
        assert!(node.enum_state().unwrap().deleted().contains(1));
        assert!(!node.enum_state().unwrap().deleted().contains(2));
    }

    #[test]
    fn test_regenerate_enum_matrix_compacts() {
        let indexer = NodeIndexer::new();
        let pool = EnumColumnPool::new();
        let a = pool.append(col(&[1, 2], 10.0));
        let b = pool.append(col(&[1], 5.0));
        let c = pool.append(col(&[3], 6.0));

        let mut node = test_node(&indexer);
        node.enter_enumeration(vec![a, b, c], vec![10.0, 5.0, 6.0]);
        let forbid = BranchConstraint::two_way(edge(1, 2), None, BranchDirection::Forbid);
        node.mark_pool_deleted_by_branch(&forbid, &pool);

        let duals = vec![-1.0; node.lp().num_rows()];
        node.regenerate_enum_matrix(&duals);

        let state = node.enum_state().unwrap();
        assert_eq!(state.pool_indices(), &[b, c]);
        assert_eq!(state.costs(), &[5.0, 6.0]);
        assert_eq!(state.deleted().count_ones(..), 0);
    }

    #[test]
    fn test_try_integer_solution_detects_partition() {
        let indexer = NodeIndexer::new();
        let mut node = test_node(&indexer);
        node.lp_mut().solve().expect("test LP should solve");
        // cheapest partition is 0-1-2-0 (10) + 0-3-0 (6) = 16, integral
        if let Some(solution) = node.try_integer_solution() {
            assert!((solution.objective() - 16.0).abs() < 1e-6);
            assert_eq!(solution.num_routes(), 2);
        } else {
            // if the LP relaxation happens to be fractional the detector
            // must say so rather than fabricate a solution
            let x = node.lp().solution().unwrap().x().to_vec();
            assert!(x.iter().any(|&xi| !is_integral(xi)));
        }
    }

    #[test]
    fn test_num_brc_rows_counts_shared_middle_row_once() {
        let indexer = NodeIndexer::new();
        let mut node = test_node(&indexer);
        node.push_brc(BranchConstraint::three_way(
            edge(1, 2),
            Some(3),
            BranchDirection::Middle,
        ));
        node.push_brc(BranchConstraint::three_way(
            edge(2, 3),
            Some(3),
            BranchDirection::Middle,
        ));
        node.push_brc(BranchConstraint::two_way(
            edge(1, 3),
            None,
            BranchDirection::Forbid,
        ));
        assert_eq!(node.num_brc_rows(), 1);
    }

    #[test]
    fn test_reindex_assigns_fresh_index() {
        let indexer = NodeIndexer::new();
        let mut node = test_node(&indexer);
        let before = node.idx();
        node.reindex(&indexer);
        assert!(node.idx() > before);
    }
}
