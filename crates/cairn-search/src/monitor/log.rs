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
use std::time::{Duration, Instant};

/// A monitor that prints a progress table to stdout.
#[derive(Debug, Clone)]
pub struct LogMonitor {
    start_time: Instant,
    last_log_time: Instant,
    log_interval: Duration,
    lower_bound: f64,
    upper_bound: f64,
}

impl LogMonitor {
    pub fn new(log_interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            start_time: now,
            last_log_time: now,
            log_interval,
            lower_bound: f64::NEG_INFINITY,
            upper_bound: f64::INFINITY,
        }
    }

    fn print_header(&self) {
        println!(
            "{:<9} | {:<10} | {:<14} | {:<14} | {:<9} | {:<10}",
            "Elapsed", "Nodes", "LB", "UB", "Gap", "Incumbents"
        );
        println!("{}", "-".repeat(80));
    }

    fn log_line(&mut self, stats: &BbtStatistics) {
        let elapsed = format!("{:.1}s", self.start_time.elapsed().as_secs_f64());
        let gap = if self.upper_bound.is_finite() && self.lower_bound.is_finite() {
            format!(
                "{:.2}%",
                100.0 * (self.upper_bound - self.lower_bound) / self.upper_bound.abs().max(1e-10)
            )
        } else {
            String::from("inf")
        };
        println!(
            "{:<9} | {:<10} | {:<14.4} | {:<14.4} | {:<9} | {:<10}",
            elapsed,
            stats.nodes_explored,
            self.lower_bound,
            self.upper_bound,
            gap,
            stats.incumbents_found
        );
        self.last_log_time = Instant::now();
    }
}

impl TreeSearchMonitor for LogMonitor {
    fn name(&self) -> &str {
        "LogMonitor"
    }

    fn on_enter_search(&mut self, _stats: &BbtStatistics) {
        self.start_time = Instant::now();
        self.last_log_time = self.start_time;
        self.print_header();
    }

    fn on_node_start(&mut self, _node: &BbNode, stats: &BbtStatistics) {
        if self.last_log_time.elapsed() >= self.log_interval {
            self.log_line(stats);
        }
    }

    fn on_prune(&mut self, _node: &BbNode, _reason: PruneReason, _stats: &BbtStatistics) {}
    fn on_children_pushed(&mut self, _count: usize, _stats: &BbtStatistics) {}

    fn on_incumbent(&mut self, objective: f64, stats: &BbtStatistics) {
        self.upper_bound = objective;
        self.log_line(stats);
    }

    fn on_bounds(&mut self, lower_bound: f64, upper_bound: f64, _stats: &BbtStatistics) {
        self.lower_bound = lower_bound;
        self.upper_bound = upper_bound;
    }

    fn on_exit_search(&mut self, stats: &BbtStatistics) {
        self.log_line(stats);
        println!("{}", stats);
    }
}
