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

/// Fans every event out to a list of monitors. The first `Terminate`
/// command wins.
#[derive(Default)]
pub struct CompositeMonitor {
    monitors: Vec<Box<dyn TreeSearchMonitor>>,
}

impl CompositeMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a monitor, builder style.
    pub fn with(mut self, monitor: Box<dyn TreeSearchMonitor>) -> Self {
        self.monitors.push(monitor);
        self
    }

    pub fn push(&mut self, monitor: Box<dyn TreeSearchMonitor>) {
        self.monitors.push(monitor);
    }

    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }
}

impl TreeSearchMonitor for CompositeMonitor {
    fn name(&self) -> &str {
        "CompositeMonitor"
    }

    fn on_enter_search(&mut self, stats: &BbtStatistics) {
        for monitor in &mut self.monitors {
            monitor.on_enter_search(stats);
        }
    }

    fn search_command(&mut self, stats: &BbtStatistics) -> SearchCommand {
        for monitor in &mut self.monitors {
            if let SearchCommand::Terminate(reason) = monitor.search_command(stats) {
                return SearchCommand::Terminate(reason);
            }
        }
        SearchCommand::Continue
    }

    fn on_node_start(&mut self, node: &BbNode, stats: &BbtStatistics) {
        for monitor in &mut self.monitors {
            monitor.on_node_start(node, stats);
        }
    }

    fn on_prune(&mut self, node: &BbNode, reason: PruneReason, stats: &BbtStatistics) {
        for monitor in &mut self.monitors {
            monitor.on_prune(node, reason, stats);
        }
    }

    fn on_children_pushed(&mut self, count: usize, stats: &BbtStatistics) {
        for monitor in &mut self.monitors {
            monitor.on_children_pushed(count, stats);
        }
    }

    fn on_incumbent(&mut self, objective: f64, stats: &BbtStatistics) {
        for monitor in &mut self.monitors {
            monitor.on_incumbent(objective, stats);
        }
    }

    fn on_bounds(&mut self, lower_bound: f64, upper_bound: f64, stats: &BbtStatistics) {
        for monitor in &mut self.monitors {
            monitor.on_bounds(lower_bound, upper_bound, stats);
        }
    }

    fn on_exit_search(&mut self, stats: &BbtStatistics) {
        for monitor in &mut self.monitors {
            monitor.on_exit_search(stats);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingMonitor {
        events: std::rc::Rc<std::cell::RefCell<u32>>,
        terminate: bool,
    }

    impl TreeSearchMonitor for CountingMonitor {
        fn name(&self) -> &str {
            "CountingMonitor"
        }

        fn on_enter_search(&mut self, _stats: &BbtStatistics) {
            *self.events.borrow_mut() += 1;
        }

        fn search_command(&mut self, _stats: &BbtStatistics) -> SearchCommand {
            if self.terminate {
                SearchCommand::Terminate(String::from("stop requested"))
            } else {
                SearchCommand::Continue
            }
        }

        fn on_node_start(&mut self, _node: &BbNode, _stats: &BbtStatistics) {}
        fn on_prune(&mut self, _n: &BbNode, _r: PruneReason, _s: &BbtStatistics) {}
        fn on_children_pushed(&mut self, _count: usize, _stats: &BbtStatistics) {}
        fn on_incumbent(&mut self, _objective: f64, _stats: &BbtStatistics) {}
        fn on_bounds(&mut self, _lb: f64, _ub: f64, _stats: &BbtStatistics) {}
        fn on_exit_search(&mut self, _stats: &BbtStatistics) {}
    }

    #[test]
    fn test_events_fan_out_to_all_monitors() {
        let events = std::rc::Rc::new(std::cell::RefCell::new(0u32));
        let mut composite = CompositeMonitor::new()
            .with(Box::new(CountingMonitor {
                events: events.clone(),
                terminate: false,
            }))
            .with(Box::new(CountingMonitor {
                events: events.clone(),
                terminate: false,
            }));
        assert_eq!(composite.len(), 2);

        composite.on_enter_search(&BbtStatistics::default());
        assert_eq!(*events.borrow(), 2);
    }

    #[test]
    fn test_first_terminate_wins() {
        let events = std::rc::Rc::new(std::cell::RefCell::new(0u32));
        let mut composite = CompositeMonitor::new()
            .with(Box::new(CountingMonitor {
                events: events.clone(),
                terminate: false,
            }))
            .with(Box::new(CountingMonitor {
                events,
                terminate: true,
            }));

        match composite.search_command(&BbtStatistics::default()) {
            SearchCommand::Terminate(reason) => assert_eq!(reason, "stop requested"),
            SearchCommand::Continue => panic!("expected termination"),
        }
    }
}
