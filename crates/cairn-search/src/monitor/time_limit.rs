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

use crate::monitor::search_monitor::{PruneReason, SearchCommand, TreeSearchMonitor};
use crate::node::BbNode;
use crate::stats::BbtStatistics;
use std::time::{Duration, Instant};

/// A monitor that terminates the search after a given duration.
///
/// Node processing in a branch-cut-and-price tree is slow (every node
/// prices and cuts), so the clock is simply checked on every controller
/// iteration; no check-interval throttling is needed here.
#[derive(Debug, Clone)]
pub struct TimeLimitMonitor {
    time_limit: Duration,
    start_time: Option<Instant>,
}

impl TimeLimitMonitor {
    pub fn new(time_limit: Duration) -> Self {
        Self {
            time_limit,
            start_time: None,
        }
    }
}

impl TreeSearchMonitor for TimeLimitMonitor {
    fn name(&self) -> &str {
        "TimeLimitMonitor"
    }

    fn on_enter_search(&mut self, _stats: &BbtStatistics) {
        self.start_time = Some(Instant::now());
    }

    fn search_command(&mut self, _stats: &BbtStatistics) -> SearchCommand {
        if let Some(start) = self.start_time
            && start.elapsed() > self.time_limit
        {
            return SearchCommand::Terminate(format!(
                "time limit of {:.1}s exceeded",
                self.time_limit.as_secs_f64()
            ));
        }
        SearchCommand::Continue
    }

    fn on_node_start(&mut self, _node: &BbNode, _stats: &BbtStatistics) {}
    fn on_prune(&mut self, _node: &BbNode, _reason: PruneReason, _stats: &BbtStatistics) {}
    fn on_children_pushed(&mut self, _count: usize, _stats: &BbtStatistics) {}
    fn on_incumbent(&mut self, _objective: f64, _stats: &BbtStatistics) {}
    fn on_bounds(&mut self, _lower_bound: f64, _upper_bound: f64, _stats: &BbtStatistics) {}

    fn on_exit_search(&mut self, _stats: &BbtStatistics) {
        self.start_time = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_limit_terminates_immediately() {
        let mut monitor = TimeLimitMonitor::new(Duration::ZERO);
        monitor.on_enter_search(&BbtStatistics::default());
        std::thread::sleep(Duration::from_millis(2));
        match monitor.search_command(&BbtStatistics::default()) {
            SearchCommand::Terminate(reason) => assert!(reason.contains("time limit")),
            SearchCommand::Continue => panic!("expected termination"),
        }
    }

    #[test]
    fn test_generous_limit_continues() {
        let mut monitor = TimeLimitMonitor::new(Duration::from_secs(3600));
        monitor.on_enter_search(&BbtStatistics::default());
        assert_eq!(
            monitor.search_command(&BbtStatistics::default()),
            SearchCommand::Continue
        );
    }
}
