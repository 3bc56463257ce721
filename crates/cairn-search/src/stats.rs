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

use std::time::Duration;

/// Statistics collected while the tree controller runs.
#[derive(Debug, Clone, PartialEq)]
pub struct BbtStatistics {
    /// Nodes popped from the frontier and processed.
    pub nodes_explored: u64,
    /// Nodes discarded because their bound reached the incumbent.
    pub nodes_pruned_bound: u64,
    /// Nodes discarded because pricing or cutting proved them infeasible.
    pub nodes_pruned_infeasible: u64,
    /// 2-way branching steps taken.
    pub branches_two_way: u64,
    /// 3-way branching steps taken (including depth-budget fallbacks).
    pub branches_three_way: u64,
    /// Children pushed onto the frontier.
    pub children_pushed: u64,
    /// Improving incumbents installed.
    pub incumbents_found: u64,
    /// Deepest constraint list seen on any processed node.
    pub max_depth: u64,
    /// Total wall-clock time of the search.
    pub time_total: Duration,
    /// The lower bound established at the root.
    pub root_lower_bound: f64,
}

impl Default for BbtStatistics {
    fn default() -> Self {
        Self {
            nodes_explored: 0,
            nodes_pruned_bound: 0,
            nodes_pruned_infeasible: 0,
            branches_two_way: 0,
            branches_three_way: 0,
            children_pushed: 0,
            incumbents_found: 0,
            max_depth: 0,
            time_total: Duration::ZERO,
            root_lower_bound: f64::NEG_INFINITY,
        }
    }
}

impl BbtStatistics {
    #[inline]
    pub fn on_node_explored(&mut self) {
        self.nodes_explored += 1;
    }

    #[inline]
    pub fn on_pruned_bound(&mut self) {
        self.nodes_pruned_bound += 1;
    }

    #[inline]
    pub fn on_pruned_infeasible(&mut self) {
        self.nodes_pruned_infeasible += 1;
    }

    #[inline]
    pub fn on_two_way_branch(&mut self) {
        self.branches_two_way += 1;
    }

    #[inline]
    pub fn on_three_way_branch(&mut self) {
        self.branches_three_way += 1;
    }

    #[inline]
    pub fn on_children_pushed(&mut self, count: u64) {
        self.children_pushed += count;
    }

    #[inline]
    pub fn on_incumbent(&mut self) {
        self.incumbents_found += 1;
    }

    #[inline]
    pub fn on_depth(&mut self, depth: u64) {
        self.max_depth = self.max_depth.max(depth);
    }

    #[inline]
    pub fn set_total_time(&mut self, time: Duration) {
        self.time_total = time;
    }

    #[inline]
    pub fn set_root_lower_bound(&mut self, bound: f64) {
        self.root_lower_bound = bound;
    }
}

impl std::fmt::Display for BbtStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Search statistics")?;
        writeln!(f, "  nodes explored     : {}", self.nodes_explored)?;
        writeln!(f, "  pruned (bound)     : {}", self.nodes_pruned_bound)?;
        writeln!(f, "  pruned (infeasible): {}", self.nodes_pruned_infeasible)?;
        writeln!(f, "  2-way branches     : {}", self.branches_two_way)?;
        writeln!(f, "  3-way branches     : {}", self.branches_three_way)?;
        writeln!(f, "  children pushed    : {}", self.children_pushed)?;
        writeln!(f, "  incumbents found   : {}", self.incumbents_found)?;
        writeln!(f, "  max depth          : {}", self.max_depth)?;
        writeln!(f, "  root lower bound   : {}", self.root_lower_bound)?;
        write!(f, "  total time         : {:.3}s", self.time_total.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let mut stats = BbtStatistics::default();
        stats.on_node_explored();
        stats.on_node_explored();
        stats.on_pruned_bound();
        stats.on_two_way_branch();
        stats.on_children_pushed(2);
        stats.on_incumbent();
        stats.on_depth(3);
        stats.on_depth(1);

        assert_eq!(stats.nodes_explored, 2);
        assert_eq!(stats.nodes_pruned_bound, 1);
        assert_eq!(stats.branches_two_way, 1);
        assert_eq!(stats.children_pushed, 2);
        assert_eq!(stats.incumbents_found, 1);
        assert_eq!(stats.max_depth, 3);
    }

    #[test]
    fn test_display_contains_counters() {
        let mut stats = BbtStatistics::default();
        stats.on_node_explored();
        let text = format!("{}", stats);
        assert!(text.contains("nodes explored     : 1"));
        assert!(text.contains("total time"));
    }
}
