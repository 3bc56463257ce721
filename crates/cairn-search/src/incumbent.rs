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

//! The shared incumbent: the best integer solution found so far.
//!
//! The upper bound is stored as `f64` bits in an `AtomicU64` for fast,
//! lock-free reads on the pruning hot path; the solution itself sits
//! behind a `Mutex` as the source of truth. The sentinel `+∞` means "no
//! incumbent yet". Atomic reads use `Ordering::Relaxed`: the bound is a
//! pruning heuristic, and every correctness-relevant update goes through
//! the mutex.

use cairn_model::solution::Solution;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Concurrent holder of the best solution and its objective.
#[derive(Debug)]
pub struct SharedIncumbent {
    /// Objective of the incumbent, stored as `f64::to_bits`.
    upper_bound: AtomicU64,
    /// The incumbent solution, protected by a mutex.
    solution: Mutex<Option<Solution>>,
}

impl Default for SharedIncumbent {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedIncumbent {
    /// Creates an empty incumbent with upper bound `+∞`.
    pub fn new() -> Self {
        Self {
            upper_bound: AtomicU64::new(f64::INFINITY.to_bits()),
            solution: Mutex::new(None),
        }
    }

    /// The current upper bound; `+∞` while no solution is installed.
    #[inline]
    pub fn upper_bound(&self) -> f64 {
        f64::from_bits(self.upper_bound.load(Ordering::Relaxed))
    }

    /// Installs `candidate` if it is strictly better than the incumbent.
    /// Returns `true` on installation.
    pub fn try_install(&self, candidate: &Solution) -> bool {
        // cheap pre-check without the lock
        if candidate.objective() >= self.upper_bound() {
            return false;
        }
        let mut guard = self.solution.lock().expect("incumbent lock poisoned");
        let better = match guard.as_ref() {
            Some(current) => candidate.objective() < current.objective(),
            None => true,
        };
        if better {
            *guard = Some(candidate.clone());
            self.upper_bound
                .store(candidate.objective().to_bits(), Ordering::Relaxed);
        }
        better
    }

    /// A cloned snapshot of the incumbent, if any.
    pub fn snapshot(&self) -> Option<Solution> {
        self.solution
            .lock()
            .expect("incumbent lock poisoned")
            .clone()
    }
}
