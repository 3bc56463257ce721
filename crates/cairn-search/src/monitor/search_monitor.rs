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

use crate::node::BbNode;
use crate::stats::BbtStatistics;

/// Command returned by the monitor to control the search process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCommand {
    /// Continue the search process.
    Continue,
    /// Stop the search process; the string describes why.
    Terminate(String),
}

impl std::fmt::Display for SearchCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchCommand::Continue => write!(f, "Continue"),
            SearchCommand::Terminate(reason) => write!(f, "Terminate({})", reason),
        }
    }
}

/// Reasons for pruning a node.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PruneReason {
    /// The node's bound reached the incumbent.
    BoundDominated,
    /// Pricing or cutting proved the subproblem infeasible.
    Infeasible,
}

impl std::fmt::Display for PruneReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PruneReason::BoundDominated => write!(f, "BoundDominated"),
            PruneReason::Infeasible => write!(f, "Infeasible"),
        }
    }
}

/// Trait for monitoring and controlling the tree search.
///
/// Methods take `&mut self`; monitors are assumed single-threaded. Keep
/// callbacks lightweight: they run on the controller's hot path.
pub trait TreeSearchMonitor {
    /// Returns the name of the monitor.
    fn name(&self) -> &str;
    /// Called once before the search loop begins.
    fn on_enter_search(&mut self, stats: &BbtStatistics);
    /// Called at the top of every controller iteration; returning
    /// `Terminate` stops the search cleanly.
    fn search_command(&mut self, _stats: &BbtStatistics) -> SearchCommand {
        SearchCommand::Continue
    }
    /// Called when a node is popped for processing.
    fn on_node_start(&mut self, node: &BbNode, stats: &BbtStatistics);
    /// Called when a node is pruned.
    fn on_prune(&mut self, node: &BbNode, reason: PruneReason, stats: &BbtStatistics);
    /// Called after branching, with the number of children pushed.
    fn on_children_pushed(&mut self, count: usize, stats: &BbtStatistics);
    /// Called when an improving incumbent is installed.
    fn on_incumbent(&mut self, objective: f64, stats: &BbtStatistics);
    /// Called whenever the global bounds move.
    fn on_bounds(&mut self, lower_bound: f64, upper_bound: f64, stats: &BbtStatistics);
    /// Called once when the search is finished.
    fn on_exit_search(&mut self, stats: &BbtStatistics);
}

impl std::fmt::Debug for dyn TreeSearchMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SearchMonitor({})", self.name())
    }
}

impl std::fmt::Display for dyn TreeSearchMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SearchMonitor({})", self.name())
    }
}
