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

//! The branch-and-bound tree controller.
//!
//! One node at a time: pop the best open node, run pricing and cutting
//! through the injected callbacks, install an incumbent if the LP came out
//! integral, otherwise score candidates and branch. Children go back onto
//! the frontier in the documented push order, the global bounds move, and
//! the loop continues until the frontier drains, the soft deadline fires,
//! or a monitor intervenes.
//!
//! Failure discipline (per node): a pricing or cutting failure at the
//! root ends the search; anywhere else the node's bound degrades to `+∞`
//! and the node is pruned. Branching failures are fatal; no partial
//! child state is ever retained.

use crate::callbacks::{BranchDecision, CallbackError, SearchCallbacks};
use crate::frontier::Frontier;
use crate::incumbent::SharedIncumbent;
use crate::monitor::search_monitor::{PruneReason, SearchCommand, TreeSearchMonitor};
use crate::node::BbNode;
use crate::result::{BbtOutcome, SearchResult, TerminationReason};
use crate::selector::bkf::BkfAdvisor;
use crate::selector::history::BranchingHistory;
use crate::selector::scorer::{CandidateScorer, TestingCallbacks};
use crate::stats::BbtStatistics;
use cairn_model::candidate::BranchCandidate;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Which split the controller asks the scorer for.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum BranchStyle {
    /// One edge, two children.
    #[default]
    TwoWay,
    /// An edge pair, three children.
    ThreeWay,
}

/// Controller configuration.
#[derive(Clone, Copy, Debug)]
pub struct BbtConfig {
    /// Soft deadline; checked every iteration and before every expensive
    /// callback.
    pub time_limit: Duration,
    /// A node whose bound reaches `UB - prune_epsilon` is discarded.
    pub prune_epsilon: f64,
    pub branch_style: BranchStyle,
}

impl Default for BbtConfig {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(3600),
            prune_epsilon: 1e-6,
            branch_style: BranchStyle::TwoWay,
        }
    }
}

/// The branch-and-bound tree controller.
pub struct BbtController<'a, C, M>
where
    C: BranchCandidate,
    M: TreeSearchMonitor,
{
    config: BbtConfig,
    scorer: CandidateScorer,
    testing: TestingCallbacks<'a, C>,
    callbacks: SearchCallbacks<'a, C>,
    history: RwLock<BranchingHistory<C>>,
    advisors: Vec<BkfAdvisor>,
    incumbent: SharedIncumbent,
    monitor: M,
    stats: BbtStatistics,
    lower_bound: f64,
}

impl<'a, C, M> BbtController<'a, C, M>
where
    C: BranchCandidate,
    M: TreeSearchMonitor,
{
    /// Creates a controller. An empty `advisors` vector disables BKF
    /// throttling.
    pub fn new(
        config: BbtConfig,
        scorer: CandidateScorer,
        testing: TestingCallbacks<'a, C>,
        callbacks: SearchCallbacks<'a, C>,
        advisors: Vec<BkfAdvisor>,
        monitor: M,
    ) -> Self {
        Self {
            config,
            scorer,
            testing,
            callbacks,
            history: RwLock::new(BranchingHistory::new()),
            advisors,
            incumbent: SharedIncumbent::new(),
            monitor,
            stats: BbtStatistics::default(),
            lower_bound: f64::NEG_INFINITY,
        }
    }

    /// The shared incumbent; install a warm-start solution here before
    /// calling [`solve`](Self::solve).
    #[inline]
    pub fn incumbent(&self) -> &SharedIncumbent {
        &self.incumbent
    }

    /// The shared branching history.
    #[inline]
    pub fn history(&self) -> &RwLock<BranchingHistory<C>> {
        &self.history
    }

    #[inline]
    pub fn statistics(&self) -> &BbtStatistics {
        &self.stats
    }

    /// Explores the tree from `root` until it is exhausted, the deadline
    /// fires, or a monitor stops the search.
    pub fn solve(&mut self, root: BbNode) -> BbtOutcome {
        let start = Instant::now();
        self.monitor.on_enter_search(&self.stats);
        info!(time_limit = ?self.config.time_limit, "search started");

        let mut frontier = Frontier::new();
        frontier.push(root);

        let reason = loop {
            if frontier.is_empty() {
                break if self.incumbent.snapshot().is_some() {
                    TerminationReason::OptimalityProven
                } else {
                    TerminationReason::InfeasibilityProven
                };
            }
            if start.elapsed() > self.config.time_limit {
                break TerminationReason::TimeLimit;
            }
            if let SearchCommand::Terminate(msg) = self.monitor.search_command(&self.stats) {
                break TerminationReason::Aborted(msg);
            }

            let node = frontier.pop().expect("frontier checked non-empty");
            match self.process_node(node, &mut frontier, start) {
                NodeStep::Continue => {}
                NodeStep::Halt(reason) => break reason,
            }

            if let Some(open_min) = frontier.min_value() {
                self.lower_bound = open_min;
            } else {
                // frontier drained: the tree has converged onto the incumbent
                self.lower_bound = self.incumbent.upper_bound();
            }
            self.monitor
                .on_bounds(self.lower_bound, self.incumbent.upper_bound(), &self.stats);
        };

        // a deadline hit before the root was processed still reports the
        // frontier's bound
        if let Some(open_min) = frontier.min_value() {
            self.lower_bound = open_min;
        }

        self.stats.set_total_time(start.elapsed());
        self.monitor.on_exit_search(&self.stats);
        info!(reason = %reason, lb = self.lower_bound, ub = self.incumbent.upper_bound(), "search finished");
        self.finalize(reason)
    }

    /// Processes one popped node: steps 3-9 of the controller loop.
    fn process_node(
        &mut self,
        mut node: BbNode,
        frontier: &mut Frontier,
        start: Instant,
    ) -> NodeStep {
        let upper_bound = self.incumbent.upper_bound();
        if node.value() >= upper_bound - self.config.prune_epsilon {
            self.stats.on_pruned_bound();
            self.monitor
                .on_prune(&node, PruneReason::BoundDominated, &self.stats);
            return NodeStep::Continue;
        }

        self.stats.on_node_explored();
        self.stats.on_depth(node.brcs().len() as u64);
        self.monitor.on_node_start(&node, &self.stats);
        debug!(idx = node.idx(), value = node.value(), brcs = node.brcs().len(), "node popped");
        let node_start = Instant::now();

        // pricing at begin
        if start.elapsed() > self.config.time_limit {
            frontier.push(node);
            return NodeStep::Halt(TerminationReason::TimeLimit);
        }
        match (self.callbacks.pricing_at_begin)(&mut node) {
            Ok(()) => {}
            Err(err) => return self.collaborator_failed(node, err, "pricing"),
        }
        if node.is_root() {
            self.stats.set_root_lower_bound(node.value());
        }
        if node.terminate() {
            self.stats.on_pruned_bound();
            self.monitor
                .on_prune(&node, PruneReason::BoundDominated, &self.stats);
            return NodeStep::Continue;
        }
        if node.value() >= self.incumbent.upper_bound() - self.config.prune_epsilon {
            self.stats.on_pruned_bound();
            self.monitor
                .on_prune(&node, PruneReason::BoundDominated, &self.stats);
            return NodeStep::Continue;
        }

        // cutting
        if start.elapsed() > self.config.time_limit {
            frontier.push(node);
            return NodeStep::Halt(TerminationReason::TimeLimit);
        }
        match (self.callbacks.cutting)(&mut node) {
            Ok(()) => {}
            Err(err) => return self.collaborator_failed(node, err, "cutting"),
        }
        if node.terminate() {
            self.stats.on_pruned_bound();
            self.monitor
                .on_prune(&node, PruneReason::BoundDominated, &self.stats);
            return NodeStep::Continue;
        }

        // optional checkpoint of the fully processed node
        if let Some(node_out) = &mut self.callbacks.node_out
            && let Err(err) = node_out(&node)
        {
            warn!(idx = node.idx(), error = %err, "node checkpoint failed");
        }

        // integer-feasible nodes update the incumbent and are never branched
        if let Some(solution) = node.try_integer_solution() {
            if self.incumbent.try_install(&solution) {
                self.stats.on_incumbent();
                self.monitor
                    .on_incumbent(solution.objective(), &self.stats);
                info!(objective = solution.objective(), "incumbent installed");
            }
            return NodeStep::Continue;
        }

        // candidate extraction and selection
        let candidate_map = match (self.callbacks.candidate_map)(&mut node) {
            Ok(map) => map,
            Err(err) => return self.collaborator_failed(node, err, "candidate extraction"),
        };
        if candidate_map.is_empty() {
            node.set_terminate(true);
            self.stats.on_pruned_infeasible();
            self.monitor
                .on_prune(&node, PruneReason::Infeasible, &self.stats);
            return NodeStep::Continue;
        }

        if start.elapsed() > self.config.time_limit {
            frontier.push(node);
            return NodeStep::Halt(TerminationReason::TimeLimit);
        }
        let decision = match &mut self.callbacks.external_selection {
            Some(select) => select(&mut node, &candidate_map),
            None => match self.config.branch_style {
                BranchStyle::TwoWay => self
                    .scorer
                    .best_candidate(
                        &mut node,
                        &self.history,
                        &mut self.testing,
                        &candidate_map,
                        &self.advisors,
                    )
                    .map(BranchDecision::Single),
                BranchStyle::ThreeWay => self
                    .scorer
                    .top_two_candidates(&mut node, &self.history, &mut self.testing, &candidate_map)
                    .map(|(first, second)| BranchDecision::Pair(first, second)),
            },
        };
        let Some(decision) = decision else {
            node.set_terminate(true);
            self.stats.on_pruned_infeasible();
            self.monitor
                .on_prune(&node, PruneReason::Infeasible, &self.stats);
            return NodeStep::Continue;
        };

        // branching
        let is_pair = matches!(decision, BranchDecision::Pair(_, _));
        let children = match (self.callbacks.impose_branching)(node, decision) {
            Ok(children) => children,
            // branching never leaves partial state behind; failures end
            // the search
            Err(err) => return NodeStep::Halt(TerminationReason::Aborted(err.to_string())),
        };
        if is_pair {
            self.stats.on_three_way_branch();
        } else {
            self.stats.on_two_way_branch();
        }

        let upper_bound = self.incumbent.upper_bound();
        let mut pushed = 0usize;
        for child in children.into_push_order() {
            if child.terminate() {
                self.stats.on_pruned_infeasible();
                self.monitor
                    .on_prune(&child, PruneReason::Infeasible, &self.stats);
            } else if child.value() >= upper_bound - self.config.prune_epsilon {
                self.stats.on_pruned_bound();
                self.monitor
                    .on_prune(&child, PruneReason::BoundDominated, &self.stats);
            } else {
                frontier.push(child);
                pushed += 1;
            }
        }
        self.stats.on_children_pushed(pushed as u64);
        self.monitor.on_children_pushed(pushed, &self.stats);

        self.scorer
            .update_advisors(node_start.elapsed(), &mut self.advisors);
        NodeStep::Continue
    }

    /// Degradation of pricing/cutting failures: fatal at the root,
    /// bound-to-`+∞`-and-prune anywhere else.
    fn collaborator_failed(&mut self, mut node: BbNode, err: CallbackError, what: &str) -> NodeStep {
        match err {
            CallbackError::Infeasible => {
                if node.is_root() {
                    return NodeStep::Halt(TerminationReason::InfeasibilityProven);
                }
                self.stats.on_pruned_infeasible();
                self.monitor
                    .on_prune(&node, PruneReason::Infeasible, &self.stats);
                NodeStep::Continue
            }
            CallbackError::Failed(msg) => {
                if node.is_root() {
                    return NodeStep::Halt(TerminationReason::Aborted(format!(
                        "{} failed at the root: {}",
                        what, msg
                    )));
                }
                warn!(idx = node.idx(), what, error = %msg, "collaborator failed, pruning node");
                node.set_value(f64::INFINITY);
                self.stats.on_pruned_bound();
                self.monitor
                    .on_prune(&node, PruneReason::BoundDominated, &self.stats);
                NodeStep::Continue
            }
        }
    }

    fn finalize(&self, reason: TerminationReason) -> BbtOutcome {
        let snapshot = self.incumbent.snapshot();
        let (result, lower_bound) = match (&reason, snapshot) {
            (TerminationReason::OptimalityProven, Some(solution)) => {
                let objective = solution.objective();
                (SearchResult::Optimal(solution), objective)
            }
            (TerminationReason::OptimalityProven, None) => {
                // no incumbent means the frontier drained without any
                // feasible solution
                (SearchResult::Infeasible, f64::INFINITY)
            }
            (TerminationReason::InfeasibilityProven, _) => {
                (SearchResult::Infeasible, f64::INFINITY)
            }
            (_, Some(solution)) => (SearchResult::Feasible(solution), self.lower_bound),
            (_, None) => (SearchResult::Unknown, self.lower_bound),
        };
        BbtOutcome::new(result, reason, self.stats.clone(), lower_bound)
    }
}

/// Outcome of processing one node.
enum NodeStep {
    Continue,
    Halt(TerminationReason),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::branch::operator::BranchingOperator;
    use crate::bucket::BucketGraph;
    use crate::node::NodeIndexer;
    use cairn_core::num::tolerance::is_integral;
    use cairn_lp::model::{LpModel, RowSense};
    use cairn_model::column::Column;
    use cairn_model::edge::Edge;
    use cairn_model::index::VertexIndex;
    use std::cell::RefCell;
    use std::collections::HashMap;

    fn v(i: usize) -> VertexIndex {
        VertexIndex::new(i)
    }

    fn edge(a: usize, b: usize) -> Edge {
        Edge::new(v(a), v(b))
    }

    fn col(seq: &[usize], cost: f64) -> Column {
        Column::new(seq.iter().map(|&i| v(i)).collect(), cost)
    }

    /// Builds a root whose master holds the given routes over `dim - 1`
    /// customers, with partitioning rows and the dummy in front.
    fn build_root(indexer: &NodeIndexer, dim: usize, routes: &[(&[usize], f64)]) -> BbNode {
        let mut cols = vec![Column::dummy()];
        for (seq, cost) in routes {
            cols.push(col(seq, *cost));
        }
        let mut lp = LpModel::new();
        for c in &cols {
            lp.add_col(c.cost(), &[]);
        }
        for customer in 1..dim {
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
        BbNode::root(indexer, lp, cols, BucketGraph::complete(dim, 2, true))
    }

    /// Standard collaborator wiring: pricing solves the LP and sets the
    /// node value; cutting does nothing; candidates are the fractional
    /// edges; branching goes through the real operator.
    fn callbacks<'a>(
        indexer: &'a NodeIndexer,
        operator: &'a BranchingOperator,
    ) -> SearchCallbacks<'a, Edge> {
        SearchCallbacks {
            pricing_at_begin: Box::new(|node: &mut BbNode| {
                let objective = node
                    .lp_mut()
                    .solve()
                    .map_err(|e| CallbackError::Failed(e.to_string()))?;
                node.set_value(objective);
                Ok(())
            }),
            cutting: Box::new(|_| Ok(())),
            candidate_map: Box::new(|node: &mut BbNode| {
                let map = node
                    .sol_edge_map()
                    .map_err(|e| CallbackError::Failed(e.to_string()))?;
                Ok(map
                    .iter()
                    .filter(|&(_, &usage)| !is_integral(usage))
                    .map(|(&e, &usage)| (e, usage))
                    .collect::<HashMap<Edge, f64>>())
            }),
            impose_branching: Box::new(move |node, decision| match decision {
                BranchDecision::Single(edge) => Ok(operator.impose(indexer, node, edge)),
                BranchDecision::Pair(first, second) => Ok(operator.impose_three(
                    indexer,
                    node,
                    cairn_model::edge::EdgePair::new(first, second),
                )),
            }),
            external_selection: None,
            node_out: None,
        }
    }

    fn controller<'a>(
        config: BbtConfig,
        callbacks: SearchCallbacks<'a, Edge>,
    ) -> BbtController<'a, Edge, crate::monitor::no_op::NoOperationMonitor> {
        BbtController::new(
            config,
            CandidateScorer::new(10, 0, 0, 0),
            TestingCallbacks::no_op(),
            callbacks,
            Vec::new(),
            crate::monitor::no_op::NoOperationMonitor::new(),
        )
    }

    #[test]
    fn test_integer_root_solves_without_branching() {
        let indexer = NodeIndexer::new();
        let operator = BranchingOperator::default();
        // 0-1-2-0 at cost 10 beats singles at 6 + 8
        let root = build_root(&indexer, 3, &[(&[1, 2], 10.0), (&[1], 6.0), (&[2], 8.0)]);
        let mut controller = controller(BbtConfig::default(), callbacks(&indexer, &operator));

        let outcome = controller.solve(root);

        assert_eq!(outcome.exit_code(), 0);
        assert!(matches!(outcome.result(), SearchResult::Optimal(_)));
        assert!((outcome.upper_bound() - 10.0).abs() < 1e-6);
        assert!((outcome.lower_bound() - 10.0).abs() < 1e-6);
        assert_eq!(outcome.statistics().branches_two_way, 0);
        assert_eq!(outcome.statistics().nodes_explored, 1);
    }

    #[test]
    fn test_fractional_root_branches_on_the_half_edge() {
        let indexer = NodeIndexer::new();
        let operator = BranchingOperator::default();
        // the classic odd cycle: x = 1/2 on all three pair routes
        let root = build_root(
            &indexer,
            4,
            &[(&[1, 2], 2.0), (&[2, 3], 2.0), (&[1, 3], 2.0)],
        );

        let decisions: RefCell<Vec<Edge>> = RefCell::new(Vec::new());
        let children_counts: RefCell<Vec<usize>> = RefCell::new(Vec::new());
        let mut wiring = callbacks(&indexer, &operator);
        let inner = wiring.impose_branching;
        wiring.impose_branching = Box::new({
            let decisions = &decisions;
            let children_counts = &children_counts;
            let mut inner = inner;
            move |node, decision| {
                if let BranchDecision::Single(edge) = decision {
                    decisions.borrow_mut().push(edge);
                }
                let children = inner(node, decision)?;
                children_counts.borrow_mut().push(children.len());
                Ok(children)
            }
        });

        let mut controller = controller(BbtConfig::default(), wiring);
        let outcome = controller.solve(root);

        // the scorer must pick the lexicographically first half-edge
        assert_eq!(decisions.borrow().first(), Some(&edge(1, 2)));
        // a 2-way split always produced exactly two children
        assert!(children_counts.borrow().iter().all(|&n| n == 2));
        // no integer partition exists on pair routes over three customers
        assert_eq!(outcome.exit_code(), 2);
        assert!(outcome.statistics().branches_two_way >= 1);
    }

    #[test]
    fn test_zero_time_limit_reports_root_bound() {
        let indexer = NodeIndexer::new();
        let operator = BranchingOperator::default();
        let mut root = build_root(&indexer, 3, &[(&[1, 2], 10.0)]);
        root.set_value(42.0);

        let config = BbtConfig {
            time_limit: Duration::ZERO,
            ..BbtConfig::default()
        };
        let mut controller = controller(config, callbacks(&indexer, &operator));
        std::thread::sleep(Duration::from_millis(2));
        let outcome = controller.solve(root);

        assert_eq!(outcome.exit_code(), 1);
        assert_eq!(*outcome.reason(), TerminationReason::TimeLimit);
        assert!(outcome.upper_bound().is_infinite());
        assert_eq!(outcome.lower_bound(), 42.0);
    }

    #[test]
    fn test_infeasible_root_exits_with_code_two() {
        let indexer = NodeIndexer::new();
        let operator = BranchingOperator::default();
        let root = build_root(&indexer, 3, &[(&[1, 2], 10.0)]);

        let mut wiring = callbacks(&indexer, &operator);
        wiring.pricing_at_begin = Box::new(|_| Err(CallbackError::Infeasible));
        let mut controller = controller(BbtConfig::default(), wiring);
        let outcome = controller.solve(root);

        assert_eq!(outcome.exit_code(), 2);
        assert!(matches!(outcome.result(), SearchResult::Infeasible));
    }

    #[test]
    fn test_pricing_failure_at_root_aborts() {
        let indexer = NodeIndexer::new();
        let operator = BranchingOperator::default();
        let root = build_root(&indexer, 3, &[(&[1, 2], 10.0)]);

        let mut wiring = callbacks(&indexer, &operator);
        wiring.pricing_at_begin = Box::new(|_| {
            Err(CallbackError::Failed(String::from("oracle crashed")))
        });
        let mut controller = controller(BbtConfig::default(), wiring);
        let outcome = controller.solve(root);

        assert_eq!(outcome.exit_code(), 3);
        assert!(matches!(
            outcome.reason(),
            TerminationReason::Aborted(msg) if msg.contains("oracle crashed")
        ));
    }

    #[test]
    fn test_terminated_node_is_pruned_not_branched() {
        let indexer = NodeIndexer::new();
        let operator = BranchingOperator::default();
        let root = build_root(
            &indexer,
            4,
            &[(&[1, 2], 2.0), (&[2, 3], 2.0), (&[1, 3], 2.0)],
        );

        let mut wiring = callbacks(&indexer, &operator);
        wiring.pricing_at_begin = Box::new(|node: &mut BbNode| {
            let objective = node
                .lp_mut()
                .solve()
                .map_err(|e| CallbackError::Failed(e.to_string()))?;
            node.set_value(objective);
            node.set_terminate(true);
            Ok(())
        });
        let mut controller = controller(BbtConfig::default(), wiring);
        let outcome = controller.solve(root);

        assert_eq!(outcome.statistics().branches_two_way, 0);
        assert_eq!(outcome.statistics().children_pushed, 0);
        assert!(matches!(outcome.result(), SearchResult::Infeasible));
    }

    #[test]
    fn test_warm_start_incumbent_prunes_root() {
        let indexer = NodeIndexer::new();
        let operator = BranchingOperator::default();
        let mut root = build_root(&indexer, 3, &[(&[1, 2], 10.0)]);
        root.set_value(50.0);

        let mut controller = controller(BbtConfig::default(), callbacks(&indexer, &operator));
        let warm = cairn_model::solution::Solution::new(20.0, vec![col(&[1, 2], 20.0)]);
        assert!(controller.incumbent().try_install(&warm));

        let outcome = controller.solve(root);

        // the root bound 50 >= 20: pruned immediately, warm start survives
        assert_eq!(outcome.statistics().nodes_explored, 0);
        assert_eq!(outcome.statistics().nodes_pruned_bound, 1);
        assert!((outcome.upper_bound() - 20.0).abs() < 1e-9);
        assert_eq!(outcome.exit_code(), 0);
    }
}
