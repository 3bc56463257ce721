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

use crate::monitor::search_monitor::{PruneReason, TreeSearchMonitor};
use crate::node::BbNode;
use crate::stats::BbtStatistics;

/// A monitor that observes nothing and never interferes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOperationMonitor;

impl NoOperationMonitor {
    pub fn new() -> Self {
        Self
    }
}

impl TreeSearchMonitor for NoOperationMonitor {
    fn name(&self) -> &str {
        "NoOperationMonitor"
    }

    fn on_enter_search(&mut self, _stats: &BbtStatistics) {}
    fn on_node_start(&mut self, _node: &BbNode, _stats: &BbtStatistics) {}
    fn on_prune(&mut self, _node: &BbNode, _reason: PruneReason, _stats: &BbtStatistics) {}
    fn on_children_pushed(&mut self, _count: usize, _stats: &BbtStatistics) {}
    fn on_incumbent(&mut self, _objective: f64, _stats: &BbtStatistics) {}
    fn on_bounds(&mut self, _lower_bound: f64, _upper_bound: f64, _stats: &BbtStatistics) {}
    fn on_exit_search(&mut self, _stats: &BbtStatistics) {}
}
