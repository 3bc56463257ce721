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

//! The BKF advisor.
//!
//! BKF balances strong-branching effort against expected tree-size
//! reduction: when a testing phase is slow relative to full node
//! processing, fewer candidates should be promoted into it. The advisor
//! keeps one `(time, count)` pair per testing phase plus a node-time
//! estimate, and turns a `(m, n)` parameter pair into a promotion count.
//!
//! The rule is monotone in `m / n` and never promotes more candidates
//! than the upstream phase produced.

use std::time::Duration;

/// The `(m, n)` parameter pair of one advisor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BkfParams {
    pub m: u32,
    pub n: u32,
}

impl BkfParams {
    pub fn new(m: u32, n: u32) -> Self {
        assert!(n > 0, "called `BkfParams::new` with n = 0");
        Self { m, n }
    }
}

/// Phase-scheduling advisor for one testing phase.
#[derive(Clone, Debug)]
pub struct BkfAdvisor {
    params: BkfParams,
    testing_time: Duration,
    testing_count: u32,
    node_time: Duration,
}

impl BkfAdvisor {
    pub fn new(params: BkfParams) -> Self {
        Self {
            params,
            testing_time: Duration::ZERO,
            testing_count: 0,
            node_time: Duration::ZERO,
        }
    }

    /// Records the accumulated testing time and test count of the phase.
    pub fn set_testing_time(&mut self, time: Duration, count: u32) {
        self.testing_time = time;
        self.testing_count = count;
    }

    /// Records the node-processing time estimate.
    pub fn set_node_time(&mut self, time: Duration) {
        self.node_time = time;
    }

    /// Average cost of one test in this phase.
    fn per_test_cost(&self) -> Duration {
        if self.testing_count == 0 {
            Duration::ZERO
        } else {
            self.testing_time / self.testing_count
        }
    }

    /// How many of `upstream` candidates to promote into this phase.
    ///
    /// With no timing data yet, everything is promoted. Otherwise the
    /// count is `round((m / n) · sqrt(t_node / c_test))`, clamped to
    /// `1..=upstream`: a phase whose tests are cheap relative to full node
    /// processing absorbs more candidates, an expensive one fewer, and a
    /// larger `m / n` always promotes at least as many.
    pub fn promote_count(&self, upstream: usize) -> usize {
        if upstream == 0 {
            return 0;
        }
        let per_test = self.per_test_cost().as_secs_f64();
        if per_test <= 0.0 || self.node_time.is_zero() {
            return upstream;
        }
        let ratio = self.node_time.as_secs_f64() / per_test;
        let raw = (f64::from(self.params.m) / f64::from(self.params.n)) * ratio.sqrt();
        (raw.round() as usize).clamp(1, upstream)
    }
}
