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

//! Demo collaborators for the command line.
//!
//! The real pricing, cutting, and enumeration engines are external to the
//! search core. So the binary can run end-to-end on small instances, this
//! module stands in for pricing: it enumerates every feasible route under
//! the node's arc structures and branch constraints, feeds the columns
//! into the node's LP, and offers an LP-re-solve strong-branching test.
//! Enumeration is exponential in the customer count; the binary caps the
//! instance size accordingly.

use cairn_lp::err::LpError;
use cairn_model::column::Column;
use cairn_model::edge::Edge;
use cairn_model::index::{DEPOT, VertexIndex};
use cairn_model::instance::{Instance, VrpKind};
use cairn_search::branch::constraint::BranchDirection;
use cairn_search::bucket::BucketGraph;
use cairn_search::callbacks::CallbackError;
use cairn_search::node::BbNode;
use std::collections::{BTreeMap, HashSet};
use tracing::warn;

/// Hard cap on the routes one enumeration pass may emit.
const MAX_ROUTES: usize = 200_000;

/// Bound increase reported for a branch side whose test LP is infeasible.
const INFEASIBLE_SIDE_DELTA: f64 = 1e7;

/// Route-enumeration pricing for small instances.
#[derive(Debug, Clone, Copy)]
pub struct NaivePricer<'a> {
    instance: &'a Instance,
}

impl<'a> NaivePricer<'a> {
    pub fn new(instance: &'a Instance) -> Self {
        Self { instance }
    }

    /// Pricing-at-begin: refresh the node's column set and re-solve its
    /// LP, recording the bound on the node.
    pub fn price(&self, node: &mut BbNode) -> Result<(), CallbackError> {
        self.mark_window_infeasible_edges(node);
        self.sweep_conflicting_columns(node);
        if !node.in_enum_state() {
            self.generate_columns(node);
        }
        let objective = node.lp_mut().solve().map_err(|err| match err {
            LpError::Infeasible => CallbackError::Infeasible,
            other => CallbackError::Failed(other.to_string()),
        })?;
        node.set_value(objective);
        Ok(())
    }

    /// Deletes customer edges that no time-feasible route can traverse in
    /// either direction. This narrows the pricing graph up front, before
    /// any branching happens, so such edges never become candidates.
    pub fn mark_window_infeasible_edges(&self, node: &mut BbNode) {
        if self.instance.kind() != VrpKind::Vrptw {
            return;
        }
        let dim = self.instance.dim();
        let mut dead = Vec::new();
        for i in 1..dim {
            for j in (i + 1)..dim {
                let (a, b) = (VertexIndex::new(i), VertexIndex::new(j));
                if !self.directed_window_feasible(a, b) && !self.directed_window_feasible(b, a) {
                    dead.push(Edge::new(a, b));
                }
            }
        }
        if let Some(buckets) = node.buckets_mut() {
            for edge in dead {
                buckets.delete_edge(edge);
            }
        }
    }

    /// Whether some route can serve `a` directly before `b` within the
    /// time windows.
    fn directed_window_feasible(&self, a: VertexIndex, b: VertexIndex) -> bool {
        let inst = self.instance;
        let arrive_a = inst.time_window(DEPOT).earliest + inst.cost(DEPOT, a);
        if arrive_a > inst.time_window(a).latest {
            return false;
        }
        let start_a = arrive_a.max(inst.time_window(a).earliest);
        let arrive_b = start_a + inst.service_time(a) + inst.cost(a, b);
        if arrive_b > inst.time_window(b).latest {
            return false;
        }
        let start_b = arrive_b.max(inst.time_window(b).earliest);
        let back = start_b + inst.service_time(b) + inst.cost(b, DEPOT);
        back <= inst.time_window(DEPOT).latest
    }

    /// Removes inherited columns that violate a branch constraint, so
    /// every column of a priced node either respects the forced edges or
    /// is the dummy.
    fn sweep_conflicting_columns(&self, node: &mut BbNode) {
        let dead: Vec<usize> = node
            .cols()
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, col)| conflicts_with_brcs(col, node))
            .map(|(j, _)| j)
            .collect();
        node.remove_lp_cols(&dead);
    }

    /// Adds every enumerable feasible route the node does not know yet.
    fn generate_columns(&self, node: &mut BbNode) {
        let mut known: HashSet<Vec<usize>> = node
            .cols()
            .iter()
            .filter(|col| !col.is_dummy())
            .map(|col| canonical_key(col.seq()))
            .collect();

        let routes = self.enumerate_routes(node.buckets());
        for (seq, cost) in routes {
            let key = canonical_key(&seq);
            if known.contains(&key) {
                continue;
            }
            let col = Column::new(seq, cost);
            if conflicts_with_brcs(&col, node) {
                continue;
            }
            let entries = row_entries(&col, node);
            known.insert(key);
            node.add_col(col, &entries);
        }
    }

    /// Enumerates feasible routes by depth-first extension, respecting
    /// capacity, time windows, and the arc graph.
    fn enumerate_routes(&self, graph: Option<&BucketGraph>) -> Vec<(Vec<VertexIndex>, f64)> {
        let inst = self.instance;
        let mut out = Vec::new();
        let mut truncated = false;
        let mut used = vec![false; inst.dim()];
        let mut seq: Vec<VertexIndex> = Vec::new();

        for first in inst.customers() {
            if !arc_open(graph, DEPOT, first) {
                continue;
            }
            let arrive = inst.time_window(DEPOT).earliest + inst.cost(DEPOT, first);
            if arrive > inst.time_window(first).latest {
                continue;
            }
            used[first.get()] = true;
            seq.push(first);
            self.extend(
                graph,
                &mut seq,
                &mut used,
                inst.demand(first),
                arrive.max(inst.time_window(first).earliest),
                inst.cost(DEPOT, first),
                &mut out,
                &mut truncated,
            );
            seq.pop();
            used[first.get()] = false;
        }

        if truncated {
            warn!(
                cap = MAX_ROUTES,
                "route enumeration truncated; bounds may be weaker than exact pricing"
            );
        }
        out
    }

    #[allow(clippy::too_many_arguments)]
    fn extend(
        &self,
        graph: Option<&BucketGraph>,
        seq: &mut Vec<VertexIndex>,
        used: &mut [bool],
        load: f64,
        time: f64,
        cost: f64,
        out: &mut Vec<(Vec<VertexIndex>, f64)>,
        truncated: &mut bool,
    ) {
        let inst = self.instance;
        let cur = *seq.last().expect("extension starts from a customer");

        if out.len() >= MAX_ROUTES {
            *truncated = true;
            return;
        }

        // close the route back to the depot
        if arc_open(graph, cur, DEPOT) {
            let back = time + inst.service_time(cur) + inst.cost(cur, DEPOT);
            if back <= inst.time_window(DEPOT).latest {
                out.push((seq.clone(), cost + inst.cost(cur, DEPOT)));
            }
        }

        for next in inst.customers() {
            if used[next.get()] || !arc_open(graph, cur, next) {
                continue;
            }
            let new_load = load + inst.demand(next);
            if new_load > inst.capacity() {
                continue;
            }
            let arrive = time + inst.service_time(cur) + inst.cost(cur, next);
            if arrive > inst.time_window(next).latest {
                continue;
            }
            used[next.get()] = true;
            seq.push(next);
            self.extend(
                graph,
                seq,
                used,
                new_load,
                arrive.max(inst.time_window(next).earliest),
                cost + inst.cost(cur, next),
                out,
                truncated,
            );
            seq.pop();
            used[next.get()] = false;
        }
    }

    /// LP-re-solve strong-branching test: solves the node's LP once with
    /// the edge forced and once with it forbidden, returning the bound
    /// increases. Doubles as the heuristic and exact test in the demo
    /// wiring, where no column-generation engine exists.
    pub fn strong_branch_test(&self, node: &mut BbNode, edge: &Edge) -> (f64, f64) {
        let base = node.value();
        let (indices, values) = node.obtain_brc_coefficient(*edge);

        let mut up = node.lp().clone();
        up.add_row(&indices, &values, cairn_lp::model::RowSense::Eq, 1.0);
        let delta_up = match up.solve() {
            Ok(objective) => (objective - base).max(0.0),
            Err(_) => INFEASIBLE_SIDE_DELTA,
        };

        let mut down = node.lp().clone();
        down.add_row(
            &indices[1..],
            &values[1..],
            cairn_lp::model::RowSense::Eq,
            0.0,
        );
        let delta_down = match down.solve() {
            Ok(objective) => (objective - base).max(0.0),
            Err(_) => INFEASIBLE_SIDE_DELTA,
        };

        (delta_up, delta_down)
    }
}

fn arc_open(graph: Option<&BucketGraph>, tail: VertexIndex, head: VertexIndex) -> bool {
    graph.is_none_or(|g| g.contains_arc(tail, head))
}

/// Reversal-invariant dedup key of a customer sequence.
fn canonical_key(seq: &[VertexIndex]) -> Vec<usize> {
    let forward: Vec<usize> = seq.iter().map(|v| v.get()).collect();
    let mut backward = forward.clone();
    backward.reverse();
    forward.min(backward)
}

/// Whether a column violates any branch constraint of the node.
fn conflicts_with_brcs(col: &Column, node: &BbNode) -> bool {
    node.brcs().iter().any(|brc| match brc.direction() {
        BranchDirection::Force => {
            let edge = brc.edge();
            if col.uses_edge(edge) {
                return false;
            }
            let touches_lo = !edge.lo().is_zero() && col.visits(edge.lo());
            let touches_hi = !edge.hi().is_zero() && col.visits(edge.hi());
            touches_lo || touches_hi
        }
        BranchDirection::Forbid => col.uses_edge(brc.edge()),
        // the shared MIDDLE row constrains the LP, not the column set
        BranchDirection::Middle => false,
    })
}

/// LP row entries of a fresh column: the partitioning rows of its
/// customers plus its coefficients on every branch-constraint row.
fn row_entries(col: &Column, node: &BbNode) -> Vec<(usize, f64)> {
    let mut entries: BTreeMap<usize, f64> = BTreeMap::new();
    for &customer in col.seq() {
        *entries.entry(customer.get() - 1).or_insert(0.0) += 1.0;
    }
    for brc in node.brcs() {
        if let Some(row) = brc.row() {
            let coefficient = col.edge_coefficient(brc.edge());
            if coefficient > 0.0 {
                *entries.entry(row).or_insert(0.0) += coefficient;
            }
        }
    }
    entries.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_lp::model::{LpModel, RowSense};
    use cairn_model::instance::InstanceBuilder;
    use cairn_search::node::NodeIndexer;

    fn v(i: usize) -> VertexIndex {
        VertexIndex::new(i)
    }

    /// Depot at origin, customers on a short line, everything fits one
    /// vehicle pairwise but not all at once.
    fn cvrp_instance() -> Instance {
        let mut b = InstanceBuilder::new(4, VrpKind::Cvrp);
        b.capacity(10.0)
            .demand(v(1), 4.0)
            .demand(v(2), 4.0)
            .demand(v(3), 4.0)
            .coord(v(1), 1.0, 0.0)
            .coord(v(2), 2.0, 0.0)
            .coord(v(3), 3.0, 0.0);
        b.build()
    }

    fn empty_root(indexer: &NodeIndexer, instance: &Instance) -> BbNode {
        let mut lp = LpModel::new();
        lp.add_col(Column::DUMMY_COST, &[]);
        for _customer in instance.customers() {
            lp.add_row(&[0], &[1.0], RowSense::Eq, 1.0);
        }
        BbNode::root(
            indexer,
            lp,
            vec![Column::dummy()],
            BucketGraph::complete(instance.dim(), 2, true),
        )
    }

    #[test]
    fn test_enumerates_capacity_feasible_routes_only() {
        let instance = cvrp_instance();
        let pricer = NaivePricer::new(&instance);
        let routes = pricer.enumerate_routes(None);

        // all three at once needs demand 12 > 10
        assert!(routes.iter().all(|(seq, _)| seq.len() <= 2));
        // singles and ordered pairs of distinct customers: 3 + 6
        assert_eq!(routes.len(), 9);
    }

    #[test]
    fn test_pricing_fills_lp_and_sets_value() {
        let instance = cvrp_instance();
        let pricer = NaivePricer::new(&instance);
        let indexer = NodeIndexer::new();
        let mut node = empty_root(&indexer, &instance);

        pricer.price(&mut node).expect("pricing should succeed");

        assert!(node.cols().len() > 1);
        assert!(node.value() > 0.0);
        assert!(node.value() < Column::DUMMY_COST);
        // duplicate columns are not generated twice
        let cols_after_first = node.cols().len();
        pricer.price(&mut node).expect("re-pricing should succeed");
        assert_eq!(node.cols().len(), cols_after_first);
    }

    #[test]
    fn test_forbidden_arc_suppresses_routes() {
        let instance = cvrp_instance();
        let pricer = NaivePricer::new(&instance);
        let indexer = NodeIndexer::new();
        let mut node = empty_root(&indexer, &instance);
        node.buckets_mut()
            .unwrap()
            .delete_edge(Edge::new(v(1), v(2)));

        pricer.price(&mut node).expect("pricing should succeed");
        assert!(
            node.cols()
                .iter()
                .all(|c| !c.uses_edge(Edge::new(v(1), v(2))))
        );
    }

    #[test]
    fn test_window_infeasible_edge_is_deleted_before_branching() {
        // customers 1 and 3 sit on opposite sides of the depot with
        // windows closing right after the direct arrival, so neither
        // serving order can chain them: the edge (1,3) is dead
        let mut b = InstanceBuilder::new(4, VrpKind::Vrptw);
        b.capacity(100.0)
            .demand(v(1), 1.0)
            .demand(v(2), 1.0)
            .demand(v(3), 1.0)
            .coord(v(1), 1.0, 0.0)
            .coord(v(2), 0.0, 1.0)
            .coord(v(3), -1.0, 0.0)
            .time_window(v(1), 0.0, 1.0)
            .time_window(v(2), 0.0, 100.0)
            .time_window(v(3), 0.0, 1.0);
        let instance = b.build();

        let pricer = NaivePricer::new(&instance);
        let indexer = NodeIndexer::new();
        let mut lp = LpModel::new();
        lp.add_col(Column::DUMMY_COST, &[]);
        for _ in instance.customers() {
            lp.add_row(&[0], &[1.0], RowSense::Eq, 1.0);
        }
        let mut node = BbNode::root(
            &indexer,
            lp,
            vec![Column::dummy()],
            BucketGraph::complete(instance.dim(), 2, false),
        );

        pricer.mark_window_infeasible_edges(&mut node);
        assert!(
            !node
                .buckets()
                .unwrap()
                .contains_edge(Edge::new(v(1), v(3)))
        );
        // (2,3) works as 3 before 2
        assert!(node.buckets().unwrap().contains_edge(Edge::new(v(2), v(3))));
    }

    #[test]
    fn test_strong_branch_test_reports_nonnegative_deltas() {
        let instance = cvrp_instance();
        let pricer = NaivePricer::new(&instance);
        let indexer = NodeIndexer::new();
        let mut node = empty_root(&indexer, &instance);
        pricer.price(&mut node).expect("pricing should succeed");

        let (up, down) = pricer.strong_branch_test(&mut node, &Edge::new(v(1), v(2)));
        assert!(up >= 0.0);
        assert!(down >= 0.0);
    }
}
