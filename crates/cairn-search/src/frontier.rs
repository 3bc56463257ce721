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

//! The open-node frontier.
//!
//! A priority queue over unexplored nodes ordered by
//! [`define_better_node`]: best (lowest) lower bound first, ties broken by
//! insertion order. The insertion tie-break is why the controller's child
//! push order (true before false, A-B-C) makes result traces reproducible.

use crate::node::BbNode;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// The node ordering of the frontier: the better node is the one with the
/// smaller lower bound; equal bounds prefer the earlier-inserted node.
pub fn define_better_node(
    value_a: f64,
    seq_a: u64,
    value_b: f64,
    seq_b: u64,
) -> Ordering {
    value_a
        .partial_cmp(&value_b)
        .unwrap_or(Ordering::Equal)
        .then_with(|| seq_a.cmp(&seq_b))
}

struct FrontierEntry {
    node: BbNode,
    seq: u64,
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrontierEntry {}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse so the best node surfaces.
        define_better_node(self.node.value(), self.seq, other.node.value(), other.seq).reverse()
    }
}

/// The best-bound-first open-node collection.
#[derive(Default)]
pub struct Frontier {
    heap: BinaryHeap<FrontierEntry>,
    next_seq: u64,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes an open node.
    ///
    /// # Panics
    ///
    /// Panics if the node is already terminated; terminated nodes never
    /// enter the frontier.
    pub fn push(&mut self, node: BbNode) {
        assert!(
            !node.terminate(),
            "called `Frontier::push` with a terminated node"
        );
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(FrontierEntry { node, seq });
    }

    /// Pops the best open node.
    pub fn pop(&mut self) -> Option<BbNode> {
        self.heap.pop().map(|entry| entry.node)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// The minimum lower bound over all open nodes, which is the tree's
    /// current global lower bound contribution.
    pub fn min_value(&self) -> Option<f64> {
        self.heap
            .iter()
            .map(|entry| entry.node.value())
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
    }
}

impl std::fmt::Debug for Frontier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Frontier(open: {})", self.heap.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::BucketGraph;
    use crate::node::NodeIndexer;
    use cairn_lp::model::LpModel;
    use cairn_model::column::Column;

    fn node_with_value(indexer: &NodeIndexer, value: f64) -> BbNode {
        let mut lp = LpModel::new();
        lp.add_col(Column::DUMMY_COST, &[]);
        let mut node = BbNode::root(
            indexer,
            lp,
            vec![Column::dummy()],
            BucketGraph::complete(2, 1, true),
        );
        node.set_value(value);
        node
    }

    #[test]
    fn test_pop_returns_lowest_bound_first() {
        let indexer = NodeIndexer::new();
        let mut frontier = Frontier::new();
        frontier.push(node_with_value(&indexer, 30.0));
        frontier.push(node_with_value(&indexer, 10.0));
        frontier.push(node_with_value(&indexer, 20.0));

        assert_eq!(frontier.pop().unwrap().value(), 10.0);
        assert_eq!(frontier.pop().unwrap().value(), 20.0);
        assert_eq!(frontier.pop().unwrap().value(), 30.0);
        assert!(frontier.pop().is_none());
    }

    #[test]
    fn test_ties_break_by_insertion_order() {
        let indexer = NodeIndexer::new();
        let mut frontier = Frontier::new();
        let first = node_with_value(&indexer, 5.0);
        let second = node_with_value(&indexer, 5.0);
        let first_idx = first.idx();
        let second_idx = second.idx();

        frontier.push(first);
        frontier.push(second);

        assert_eq!(frontier.pop().unwrap().idx(), first_idx);
        assert_eq!(frontier.pop().unwrap().idx(), second_idx);
    }

    #[test]
    fn test_min_value_tracks_open_nodes() {
        let indexer = NodeIndexer::new();
        let mut frontier = Frontier::new();
        assert_eq!(frontier.min_value(), None);

        frontier.push(node_with_value(&indexer, 12.0));
        frontier.push(node_with_value(&indexer, 7.0));
        assert_eq!(frontier.min_value(), Some(7.0));
        assert_eq!(frontier.len(), 2);

        let _ = frontier.pop();
        assert_eq!(frontier.min_value(), Some(12.0));
    }

    #[test]
    #[should_panic(expected = "terminated node")]
    fn test_push_rejects_terminated_node() {
        let indexer = NodeIndexer::new();
        let mut frontier = Frontier::new();
        let mut node = node_with_value(&indexer, 1.0);
        node.set_terminate(true);
        frontier.push(node);
    }
}
