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

//! The branching history: per-candidate pseudo-costs shared by the whole
//! tree.
//!
//! For every candidate the history keeps moving arithmetic means of the
//! LP-bound increase observed on the up branch (FORCE side) and the down
//! branch (FORBID side), together with per-phase test counts. The counts
//! are monotone: an update never decreases them.
//!
//! Sharing discipline: the history lives behind an `RwLock`; the initial
//! screen takes snapshot reads, test recording takes the write lock. The
//! candidate scorer is the single logical writer.

use cairn_core::num::tolerance::fractional_part_distance;
use cairn_model::candidate::BranchCandidate;
use std::collections::HashMap;

/// Testing phases of the strong-branching pipeline.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum TestingPhase {
    /// LP-only re-solve, cheapest.
    Lp,
    /// Short (heuristic) column generation.
    Heuristic,
    /// Full column generation, most expensive.
    Exact,
}

impl std::fmt::Display for TestingPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestingPhase::Lp => write!(f, "LP"),
            TestingPhase::Heuristic => write!(f, "Heuristic"),
            TestingPhase::Exact => write!(f, "Exact"),
        }
    }
}

/// Minimum observations per side before the pseudo-cost term is trusted.
/// Below this the LP-fractionality term dominates the screening score.
pub const MIN_OBSERVATIONS: u32 = 1;

/// Weight of the fractionality term in the screening score.
const FRACTIONALITY_WEIGHT: f64 = 0.1;

/// Per-candidate record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CandidateRecord {
    up_count: u32,
    down_count: u32,
    up_mean: f64,
    down_mean: f64,
    lp_tests: u32,
    heuristic_tests: u32,
    exact_tests: u32,
    exhausted: bool,
}

impl CandidateRecord {
    #[inline(always)]
    pub fn up_count(&self) -> u32 {
        self.up_count
    }

    #[inline(always)]
    pub fn down_count(&self) -> u32 {
        self.down_count
    }

    #[inline(always)]
    pub fn up_mean(&self) -> f64 {
        self.up_mean
    }

    #[inline(always)]
    pub fn down_mean(&self) -> f64 {
        self.down_mean
    }

    #[inline(always)]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Number of tests in a phase.
    pub fn tests(&self, phase: TestingPhase) -> u32 {
        match phase {
            TestingPhase::Lp => self.lp_tests,
            TestingPhase::Heuristic => self.heuristic_tests,
            TestingPhase::Exact => self.exact_tests,
        }
    }

    fn absorb(&mut self, phase: TestingPhase, delta_up: f64, delta_down: f64) {
        self.up_mean =
            (self.up_mean * f64::from(self.up_count) + delta_up) / f64::from(self.up_count + 1);
        self.down_mean = (self.down_mean * f64::from(self.down_count) + delta_down)
            / f64::from(self.down_count + 1);
        self.up_count += 1;
        self.down_count += 1;
        match phase {
            TestingPhase::Lp => self.lp_tests += 1,
            TestingPhase::Heuristic => self.heuristic_tests += 1,
            TestingPhase::Exact => self.exact_tests += 1,
        }
    }

    /// The pseudo-cost part of the screening score:
    /// `(μ⁺ · μ⁻) / (n⁺ · n⁻ + 1)`.
    fn pseudo_term(&self) -> f64 {
        (self.up_mean * self.down_mean)
            / (f64::from(self.up_count) * f64::from(self.down_count) + 1.0)
    }
}

/// The shared pseudo-cost history.
#[derive(Debug, Default)]
pub struct BranchingHistory<C> {
    records: HashMap<C, CandidateRecord>,
}

impl<C> BranchingHistory<C>
where
    C: BranchCandidate,
{
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The record of a candidate, if it was ever tested.
    #[inline]
    pub fn record(&self, candidate: &C) -> Option<&CandidateRecord> {
        self.records.get(candidate)
    }

    /// Folds a test result into the candidate's moving means and counts.
    pub fn record_test(
        &mut self,
        candidate: C,
        phase: TestingPhase,
        delta_up: f64,
        delta_down: f64,
    ) {
        self.records
            .entry(candidate)
            .or_default()
            .absorb(phase, delta_up, delta_down);
    }

    /// Marks a candidate as exhausted; exhausted candidates are skipped by
    /// the initial screen.
    pub fn mark_exhausted(&mut self, candidate: C) {
        self.records.entry(candidate).or_default().exhausted = true;
    }

    /// The initial-screening score of a candidate whose LP value is
    /// `lp_value`. Larger is better. The pseudo-cost term carries the
    /// score once both sides have at least [`MIN_OBSERVATIONS`] samples;
    /// before that the fractionality term dominates because the
    /// pseudo-cost means are still zero-initialized.
    pub fn screening_score(&self, candidate: &C, lp_value: f64) -> f64 {
        let fractionality = fractional_part_distance(lp_value);
        match self.records.get(candidate) {
            Some(record)
                if record.up_count.min(record.down_count) >= MIN_OBSERVATIONS =>
            {
                record.pseudo_term() + FRACTIONALITY_WEIGHT * fractionality
            }
            _ => FRACTIONALITY_WEIGHT * fractionality,
        }
    }

    /// Ranks the candidate map by screening score and returns the best
    /// `keep` candidates with their LP values. Exhausted candidates are
    /// skipped; ties break on the candidate's canonical ordering so the
    /// result is deterministic.
    pub fn initial_screen(
        &self,
        candidate_map: &HashMap<C, f64>,
        keep: usize,
    ) -> Vec<(C, f64)> {
        let mut ranked: Vec<(C, f64, f64)> = candidate_map
            .iter()
            .filter(|(candidate, _)| {
                !self
                    .records
                    .get(candidate)
                    .is_some_and(|r| r.exhausted)
            })
            .map(|(candidate, &lp_value)| {
                (*candidate, lp_value, self.screening_score(candidate, lp_value))
            })
            .collect();
        ranked.sort_unstable_by(|a, b| {
            b.2.partial_cmp(&a.2)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked.truncate(keep);
        ranked
            .into_iter()
            .map(|(candidate, lp_value, _)| (candidate, lp_value))
            .collect()
    }
}
