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

//! The branching operator.
//!
//! Given a node and a selected candidate, the operator materializes child
//! nodes: it clones solver state, appends branch constraints, installs the
//! enforcing LP rows, and prunes arc structures and enumerated columns.
//!
//! Three operations exist:
//! - [`BranchingOperator::impose`]: the 2-way split on one edge. The true
//!   child (FORCE) is a fresh clone with an `= 1` row; the input node is
//!   edited in place into the false child (FORBID): no row, offending
//!   columns removed, the arc deleted from the bucket graph, and the node
//!   re-indexed.
//! - [`BranchingOperator::impose_three`]: the 3-way split on an edge pair,
//!   producing branches A (both forced), B (both forbidden) and C (MIDDLE,
//!   exactly one; a single shared row). Past the per-path depth budget the
//!   whole split degrades to the two children `(e1=1, e2=0)` and
//!   `(e1=0, e2=1)`.
//! - [`BranchingOperator::impose_in_enumeration`]: the 2-way split for
//!   enumeration-state nodes: no bucket graphs, columns removed from both
//!   the LP and the shared pool view, and the enumeration matrix
//!   regenerated under the all-`-1` duals sentinel.

use crate::branch::constraint::{BranchConstraint, BranchDirection};
use crate::node::{BbNode, NodeIndexer};
use crate::pool::EnumColumnPool;
use cairn_lp::model::{LpModel, RowSense};
use cairn_model::edge::{Edge, EdgePair};

/// Configuration of the branching operator.
#[derive(Clone, Copy, Debug)]
pub struct BranchingConfig {
    /// Also delete the pair's arcs from the bucket graph on the 3-way
    /// both-FORBID branch. The LP rows alone already keep pricing correct
    /// at the next solve; arc pruning merely tightens the subproblem.
    pub prune_arcs_on_forbid_pair: bool,
    /// How many MIDDLE branches one root-to-leaf path may take before the
    /// 3-way split degrades to its 2-way fallback.
    pub three_way_depth_limit: u32,
}

impl Default for BranchingConfig {
    fn default() -> Self {
        Self {
            prune_arcs_on_forbid_pair: false,
            three_way_depth_limit: 10,
        }
    }
}

/// Children produced by one branching step.
///
/// `output` preserves the operator's documented order: `[false, true]` for
/// 2-way splits and `[A, B, C]` for 3-way splits. [`into_push_order`]
/// yields the frontier insertion order instead (true before false; A, B, C
/// unchanged), which is what makes best-first tie-breaking reproducible.
///
/// [`into_push_order`]: BranchChildren::into_push_order
#[derive(Debug)]
pub struct BranchChildren {
    nodes: Vec<BbNode>,
    two_way: bool,
}

impl BranchChildren {
    /// No children; the branched node was already terminated.
    fn none() -> Self {
        Self {
            nodes: Vec::new(),
            two_way: true,
        }
    }

    fn two_way(false_child: BbNode, true_child: Option<BbNode>) -> Self {
        let mut nodes = vec![false_child];
        if let Some(child) = true_child {
            nodes.push(child);
        }
        Self {
            nodes,
            two_way: true,
        }
    }

    fn three_way(nodes: Vec<BbNode>) -> Self {
        Self {
            nodes,
            two_way: false,
        }
    }

    /// Children in the operator's output order.
    #[inline]
    pub fn output(&self) -> &[BbNode] {
        &self.nodes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Consumes the children in frontier push order: the true child
    /// precedes the false child for 2-way splits; 3-way children keep
    /// their A, B, C order.
    pub fn into_push_order(self) -> Vec<BbNode> {
        let mut nodes = self.nodes;
        if self.two_way && nodes.len() == 2 {
            nodes.swap(0, 1);
        }
        nodes
    }
}

/// The branching operator.
#[derive(Clone, Copy, Debug, Default)]
pub struct BranchingOperator {
    config: BranchingConfig,
}

impl BranchingOperator {
    pub fn new(config: BranchingConfig) -> Self {
        Self { config }
    }

    #[inline(always)]
    pub fn config(&self) -> &BranchingConfig {
        &self.config
    }

    /// 2-way branch on `edge` for a pricing-state node.
    ///
    /// # Panics
    ///
    /// Panics if the node is in enumeration state (use
    /// [`impose_in_enumeration`](Self::impose_in_enumeration)) or has lost
    /// its bucket graph.
    pub fn impose(&self, indexer: &NodeIndexer, mut node: BbNode, edge: Edge) -> BranchChildren {
        if node.terminate() {
            return BranchChildren::none();
        }
        assert!(
            !node.in_enum_state(),
            "called `BranchingOperator::impose` on an enumeration-state node"
        );

        // True child: FORCE edge = 1 behind a fresh LP row.
        let row = node.lp().num_rows();
        let brc_true = BranchConstraint::two_way(edge, Some(row), BranchDirection::Force);
        let mut true_child = node.clone_with_branch(indexer, brc_true);
        let (indices, values) = true_child.obtain_brc_coefficient(edge);
        add_branch_row(true_child.lp_mut(), &indices, &values, true);

        // False child: edit the input node in place. No LP row; the edge's
        // columns leave the LP and the arc leaves the bucket graph.
        node.push_brc(BranchConstraint::two_way(edge, None, BranchDirection::Forbid));
        let (indices, _) = node.obtain_brc_coefficient(edge);
        node.remove_lp_cols(&indices);
        node.buckets_mut()
            .expect("pricing-state node without a bucket graph")
            .delete_edge(edge);
        node.reindex(indexer);
        node.clear_edge_maps();

        BranchChildren::two_way(node, Some(true_child))
    }

    /// 3-way branch on an edge pair.
    ///
    /// Inside the depth budget this produces branches A (`e1=1 ∧ e2=1`),
    /// B (`e1=0 ∧ e2=0`) and C (`e1 + e2 = 1`, one shared row, MIDDLE
    /// constraint pair). Each child's constraint list grows by exactly
    /// two. Past the budget the split degrades to the two children
    /// `(e1=1, e2=0)` and `(e1=0, e2=1)`.
    pub fn impose_three(
        &self,
        indexer: &NodeIndexer,
        node: BbNode,
        pair: EdgePair,
    ) -> BranchChildren {
        if node.terminate() {
            return BranchChildren::none();
        }
        let (e1, e2) = (pair.first(), pair.second());

        let mut children = if node.three_way_splits() < self.config.three_way_depth_limit {
            let branch_a = self.force_force_child(indexer, &node, e1, e2);
            let branch_b = self.forbid_forbid_child(indexer, &node, e1, e2);
            let branch_c = self.middle_child(indexer, &node, e1, e2);
            vec![branch_a, branch_b, branch_c]
        } else {
            vec![
                self.force_forbid_child(indexer, &node, e1, e2),
                self.force_forbid_child(indexer, &node, e2, e1),
            ]
        };

        for child in &mut children {
            child.clear_edge_maps();
        }
        BranchChildren::three_way(children)
    }

    /// Branch A: both edges forced, two rows.
    fn force_force_child(
        &self,
        indexer: &NodeIndexer,
        node: &BbNode,
        e1: Edge,
        e2: Edge,
    ) -> BbNode {
        let row1 = node.lp().num_rows();
        let mut child = node.clone_with_branch(
            indexer,
            BranchConstraint::three_way(e1, Some(row1), BranchDirection::Force),
        );
        let (i1, v1) = child.obtain_brc_coefficient(e1);
        add_branch_row(child.lp_mut(), &i1, &v1, true);

        let row2 = child.lp().num_rows();
        child.push_brc(BranchConstraint::three_way(
            e2,
            Some(row2),
            BranchDirection::Force,
        ));
        let (i2, v2) = child.obtain_brc_coefficient(e2);
        add_branch_row(child.lp_mut(), &i2, &v2, true);
        child
    }

    /// Branch B: both edges forbidden, two `= 0` rows. The constraints are
    /// LP-level; arc pruning is an optional tightening.
    fn forbid_forbid_child(
        &self,
        indexer: &NodeIndexer,
        node: &BbNode,
        e1: Edge,
        e2: Edge,
    ) -> BbNode {
        let row1 = node.lp().num_rows();
        let mut child = node.clone_with_branch(
            indexer,
            BranchConstraint::three_way(e1, Some(row1), BranchDirection::Forbid),
        );
        let (i1, v1) = child.obtain_brc_coefficient(e1);
        add_branch_row(child.lp_mut(), &i1, &v1, false);

        let row2 = child.lp().num_rows();
        child.push_brc(BranchConstraint::three_way(
            e2,
            Some(row2),
            BranchDirection::Forbid,
        ));
        let (i2, v2) = child.obtain_brc_coefficient(e2);
        add_branch_row(child.lp_mut(), &i2, &v2, false);

        if self.config.prune_arcs_on_forbid_pair
            && let Some(buckets) = child.buckets_mut()
        {
            buckets.delete_edge(e1);
            buckets.delete_edge(e2);
        }
        child
    }

    /// Branch C: exactly one of the two edges, a single shared row whose
    /// coefficients are the column-wise sum of the per-edge coefficients.
    /// The dummy column keeps coefficient 1.
    fn middle_child(&self, indexer: &NodeIndexer, node: &BbNode, e1: Edge, e2: Edge) -> BbNode {
        let row = node.lp().num_rows();
        let mut child = node.clone_with_branch(
            indexer,
            BranchConstraint::three_way(e1, Some(row), BranchDirection::Middle),
        );
        child.push_brc(BranchConstraint::three_way(
            e2,
            Some(row),
            BranchDirection::Middle,
        ));

        let (i1, v1) = child.obtain_brc_coefficient(e1);
        let (i2, v2) = child.obtain_brc_coefficient(e2);
        let num_cols = child.lp().num_cols();
        let mut merged = vec![0.0f64; num_cols];
        for (k, &j) in i1.iter().enumerate().skip(1) {
            merged[j] += v1[k];
        }
        for (k, &j) in i2.iter().enumerate().skip(1) {
            merged[j] += v2[k];
        }

        let mut indices = vec![0usize];
        let mut values = vec![1.0f64];
        for (j, &coef) in merged.iter().enumerate().skip(1) {
            if coef > 0.0 {
                indices.push(j);
                values.push(coef);
            }
        }
        child.lp_mut().add_row(&indices, &values, RowSense::Eq, 1.0);
        child.bump_three_way_splits();
        child
    }

    /// Depth-budget fallback child: `forced = 1` and `forbidden = 0`.
    fn force_forbid_child(
        &self,
        indexer: &NodeIndexer,
        node: &BbNode,
        forced: Edge,
        forbidden: Edge,
    ) -> BbNode {
        let row1 = node.lp().num_rows();
        let mut child = node.clone_with_branch(
            indexer,
            BranchConstraint::three_way(forced, Some(row1), BranchDirection::Force),
        );
        let (i1, v1) = child.obtain_brc_coefficient(forced);
        add_branch_row(child.lp_mut(), &i1, &v1, true);

        let row2 = child.lp().num_rows();
        child.push_brc(BranchConstraint::three_way(
            forbidden,
            Some(row2),
            BranchDirection::Forbid,
        ));
        let (i2, v2) = child.obtain_brc_coefficient(forbidden);
        add_branch_row(child.lp_mut(), &i2, &v2, false);
        child
    }

    /// 2-way branch for an enumeration-state node.
    ///
    /// Mirrors [`impose`](Self::impose) but touches no bucket graph:
    /// columns are removed from both the LP and the shared pool view (via
    /// the private deleted-mask), and the enumeration matrix is
    /// regenerated with the all-`-1` duals sentinel so no base row is
    /// recycled.
    ///
    /// # Panics
    ///
    /// Panics if the node is not in enumeration state.
    pub fn impose_in_enumeration(
        &self,
        indexer: &NodeIndexer,
        mut node: BbNode,
        edge: Edge,
        pool: &EnumColumnPool,
    ) -> BranchChildren {
        if node.terminate() {
            return BranchChildren::none();
        }
        assert!(
            node.in_enum_state(),
            "called `BranchingOperator::impose_in_enumeration` on a pricing-state node"
        );

        let (ind_use, _) = node.obtain_brc_coefficient(edge);
        let ind_not_allowed = node.obtain_col_idx_not_allowed_by_edge(edge);
        let duals = vec![-1.0f64; node.lp().num_rows()];

        // True child: FORCE, enforced purely by column exclusion.
        let brc_true = BranchConstraint::two_way(edge, None, BranchDirection::Force);
        let mut true_child = node.clone_with_branch(indexer, brc_true);
        true_child.remove_lp_cols(&ind_not_allowed);
        if true_child
            .enum_state()
            .is_some_and(|s| !s.pool_indices().is_empty())
        {
            true_child.mark_pool_deleted_by_branch(&brc_true, pool);
            true_child.regenerate_enum_matrix(&duals);
        }

        // False child in place: FORBID.
        let brc_false = BranchConstraint::two_way(edge, None, BranchDirection::Forbid);
        node.push_brc(brc_false);
        node.remove_lp_cols(&ind_use);
        if node
            .enum_state()
            .is_some_and(|s| !s.pool_indices().is_empty())
        {
            node.mark_pool_deleted_by_branch(&brc_false, pool);
            node.regenerate_enum_matrix(&duals);
        }
        node.reindex(indexer);
        node.clear_edge_maps();

        BranchChildren::two_way(node, Some(true_child))
    }
}

/// Installs a branch row. FORCE rows include the dummy sentinel with
/// coefficient 1 and read `= 1`; FORBID rows must leave the dummy usable,
/// so the sentinel is stripped and the row reads `= 0` over the real
/// columns.
fn add_branch_row(lp: &mut LpModel, indices: &[usize], values: &[f64], force: bool) -> usize {
    debug_assert!(
        indices.first() == Some(&0),
        "called `add_branch_row` without the dummy sentinel in front"
    );
    if force {
        lp.add_row(indices, values, RowSense::Eq, 1.0)
    } else {
        lp.add_row(&indices[1..], &values[1..], RowSense::Eq, 0.0)
    }
}
