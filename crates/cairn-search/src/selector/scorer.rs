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

//! The multi-phase candidate scorer.
//!
//! Up to four phases narrow the candidate set:
//! 1. **Initial screening**: no LP work; the history's pseudo-cost score
//!    ranks all candidates and the top `num_phase0` survive, sub-sorted by
//!    fractional closeness (how near the LP value sits to the candidate
//!    type's ideal target).
//! 2. **LP test**: the injected `lp` callback re-solves the LP on both
//!    branch sides and reports the bound increases.
//! 3. **Heuristic test**: short column generation, `num_phase1` survivors.
//! 4. **Exact test**: full column generation, `num_phase2` survivors.
//!
//! Between phases the extreme-unbalanced revision replaces the left-right
//! product score when one side dwarfs the other, so a nearly-infeasible
//! branch cannot dominate the ranking. A phase that would test at most one
//! candidate is skipped outright: a single test cannot change the ranking.
//!
//! Wall-clock time and test count of every phase are recorded and exported
//! to the BKF advisors, which in turn throttle how many candidates later
//! phases receive.

use crate::node::BbNode;
use crate::selector::bkf::BkfAdvisor;
use crate::selector::history::{BranchingHistory, TestingPhase};
use cairn_core::num::tolerance::SOLVER_EPS;
use cairn_model::candidate::BranchCandidate;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// A side's bound increase is "extreme" when it exceeds the other side by
/// this factor.
const UNBALANCE_RATIO: f64 = 50.0;

/// Additive penalty of the unbalanced-score substitute.
const UNBALANCE_PENALTY: f64 = 1e-3;

/// The three test callbacks, injected once per run as first-class values.
///
/// Each callback receives the node and a candidate and returns the
/// LP-bound increase on the up branch and the down branch.
pub struct TestingCallbacks<'a, C> {
    pub lp: Box<dyn FnMut(&mut BbNode, &C) -> (f64, f64) + 'a>,
    pub heuristic: Box<dyn FnMut(&mut BbNode, &C) -> (f64, f64) + 'a>,
    pub exact: Box<dyn FnMut(&mut BbNode, &C) -> (f64, f64) + 'a>,
}

impl<C> TestingCallbacks<'_, C> {
    /// Callbacks that report no bound increase; screening alone decides.
    pub fn no_op() -> Self {
        Self {
            lp: Box::new(|_, _| (0.0, 0.0)),
            heuristic: Box::new(|_, _| (0.0, 0.0)),
            exact: Box::new(|_, _| (0.0, 0.0)),
        }
    }
}

/// Wall-clock time and test count of one phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PhaseTime {
    pub time: Duration,
    pub count: u32,
}

/// The candidate scorer.
#[derive(Clone, Debug)]
pub struct CandidateScorer {
    num_phase0: usize,
    num_phase1: usize,
    num_phase2: usize,
    num_phase3: usize,
    lp_time: PhaseTime,
    heuristic_time: PhaseTime,
    exact_time: PhaseTime,
}

impl CandidateScorer {
    /// Creates a scorer with the per-phase survivor counts `N0..N3`.
    pub fn new(num_phase0: usize, num_phase1: usize, num_phase2: usize, num_phase3: usize) -> Self {
        Self {
            num_phase0,
            num_phase1,
            num_phase2,
            num_phase3,
            lp_time: PhaseTime::default(),
            heuristic_time: PhaseTime::default(),
            exact_time: PhaseTime::default(),
        }
    }

    #[inline(always)]
    pub fn num_phase0(&self) -> usize {
        self.num_phase0
    }

    #[inline(always)]
    pub fn num_phase1(&self) -> usize {
        self.num_phase1
    }

    #[inline(always)]
    pub fn num_phase2(&self) -> usize {
        self.num_phase2
    }

    /// Reserved for machine-learning plug-in phases.
    #[inline(always)]
    pub fn num_phase3(&self) -> usize {
        self.num_phase3
    }

    #[inline(always)]
    pub fn lp_time(&self) -> PhaseTime {
        self.lp_time
    }

    #[inline(always)]
    pub fn heuristic_time(&self) -> PhaseTime {
        self.heuristic_time
    }

    #[inline(always)]
    pub fn exact_time(&self) -> PhaseTime {
        self.exact_time
    }

    /// Runs the full pipeline and returns the winning candidate, or `None`
    /// when the candidate map is empty (the node should then terminate).
    pub fn best_candidate<C>(
        &mut self,
        node: &mut BbNode,
        history: &RwLock<BranchingHistory<C>>,
        callbacks: &mut TestingCallbacks<'_, C>,
        candidate_map: &HashMap<C, f64>,
        advisors: &[BkfAdvisor],
    ) -> Option<C>
    where
        C: BranchCandidate,
    {
        let mut ranked = self.screen(history, candidate_map)?;

        // LP phase over all screened candidates.
        let keep = ranked.len();
        self.lp_time = self.run_phase(
            node,
            history,
            &mut ranked,
            keep,
            TestingPhase::Lp,
            &mut callbacks.lp,
        );

        // Heuristic phase over the advisor-throttled survivors.
        let keep = advised_count(self.num_phase1, ranked.len(), advisors.first());
        self.heuristic_time = self.run_phase(
            node,
            history,
            &mut ranked,
            keep,
            TestingPhase::Heuristic,
            &mut callbacks.heuristic,
        );

        // Exact phase.
        let keep = advised_count(self.num_phase2, ranked.len(), advisors.get(1));
        self.exact_time = self.run_phase(
            node,
            history,
            &mut ranked,
            keep,
            TestingPhase::Exact,
            &mut callbacks.exact,
        );

        ranked.first().map(|entry| entry.candidate)
    }

    /// Screens and exact-tests the candidates, then returns two whose LP
    /// values do not sum to 1: the top-ranked candidate anchors the pair
    /// and the partner's sum with it lies closest to 0 or 2. When every
    /// partner sums to 1, the top two are returned regardless.
    pub fn top_two_candidates<C>(
        &mut self,
        node: &mut BbNode,
        history: &RwLock<BranchingHistory<C>>,
        callbacks: &mut TestingCallbacks<'_, C>,
        candidate_map: &HashMap<C, f64>,
    ) -> Option<(C, C)>
    where
        C: BranchCandidate,
    {
        let mut ranked = self.screen(history, candidate_map)?;
        if ranked.len() < 2 {
            return None;
        }

        let keep = ranked.len();
        self.exact_time = self.run_phase(
            node,
            history,
            &mut ranked,
            keep,
            TestingPhase::Exact,
            &mut callbacks.exact,
        );

        let anchor = ranked[0].candidate;
        let anchor_value = candidate_map[&anchor];

        let mut best_partner: Option<(C, f64)> = None;
        for entry in &ranked[1..] {
            let sum = anchor_value + candidate_map[&entry.candidate];
            if (sum - 1.0).abs() <= SOLVER_EPS {
                continue;
            }
            // prefer the pair whose sum is most decisive: closest to 0
            // (both near-unused) or 2 (both near-forced)
            let distance = (sum - 0.0).abs().min((sum - 2.0).abs());
            let better = match best_partner {
                None => true,
                Some((current, current_distance)) => {
                    distance < current_distance
                        || (distance == current_distance && entry.candidate < current)
                }
            };
            if better {
                best_partner = Some((entry.candidate, distance));
            }
        }

        match best_partner {
            Some((partner, _)) => Some((anchor, partner)),
            // every pair sums to 1: fall back to the top two
            None => Some((anchor, ranked[1].candidate)),
        }
    }

    /// Pushes the measured phase times into the BKF advisors. Advisor `i`
    /// receives its own phase's `(time, count)` and, as node-time
    /// estimate, the caller's node time plus the mean of the other two
    /// phases.
    pub fn update_advisors(&self, node_time: Duration, advisors: &mut [BkfAdvisor]) {
        debug_assert!(
            advisors.len() <= 3,
            "called `CandidateScorer::update_advisors` with {} advisors, at most 3 phases exist",
            advisors.len()
        );
        for (i, advisor) in advisors.iter_mut().enumerate() {
            let (own, other_a, other_b) = match i {
                0 => (self.lp_time, self.heuristic_time, self.exact_time),
                1 => (self.heuristic_time, self.exact_time, self.lp_time),
                _ => (self.exact_time, self.lp_time, self.heuristic_time),
            };
            advisor.set_testing_time(own.time, own.count);
            advisor.set_node_time(node_time + (other_a.time + other_b.time) / 2);
        }
    }

    /// Initial screening plus the LP-phase sub-sort by fractional
    /// closeness. Returns `None` on an empty candidate map.
    fn screen<C>(
        &self,
        history: &RwLock<BranchingHistory<C>>,
        candidate_map: &HashMap<C, f64>,
    ) -> Option<Vec<RankedCandidate<C>>>
    where
        C: BranchCandidate,
    {
        let screened = history
            .read()
            .expect("branching history lock poisoned")
            .initial_screen(candidate_map, self.num_phase0);
        if screened.is_empty() {
            return None;
        }

        let target = C::fractional_target();
        let mut ranked: Vec<RankedCandidate<C>> = screened
            .into_iter()
            .map(|(candidate, lp_value)| RankedCandidate {
                candidate,
                score: -(lp_value - target).abs(),
            })
            .collect();
        sort_ranked(&mut ranked);
        Some(ranked)
    }

    /// Runs one testing phase over the best `keep` candidates and re-sorts
    /// by the revised product score. A phase with fewer than two
    /// candidates to test is skipped: one test cannot change the ranking.
    fn run_phase<C>(
        &self,
        node: &mut BbNode,
        history: &RwLock<BranchingHistory<C>>,
        ranked: &mut Vec<RankedCandidate<C>>,
        keep: usize,
        phase: TestingPhase,
        test: &mut (dyn FnMut(&mut BbNode, &C) -> (f64, f64) + '_),
    ) -> PhaseTime
    where
        C: BranchCandidate,
    {
        let keep = keep.min(ranked.len());
        if keep <= 1 {
            return PhaseTime::default();
        }
        ranked.truncate(keep);

        let start = Instant::now();
        for entry in ranked.iter_mut() {
            let (delta_up, delta_down) = test(node, &entry.candidate);
            history
                .write()
                .expect("branching history lock poisoned")
                .record_test(entry.candidate, phase, delta_up, delta_down);
            entry.score = revised_score(delta_up, delta_down);
        }
        sort_ranked(ranked);

        PhaseTime {
            time: start.elapsed(),
            count: 2 * keep as u32,
        }
    }
}

/// One candidate and its current-phase score.
#[derive(Clone, Copy, Debug)]
struct RankedCandidate<C> {
    candidate: C,
    score: f64,
}

fn sort_ranked<C: BranchCandidate>(ranked: &mut [RankedCandidate<C>]) {
    ranked.sort_unstable_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.candidate.cmp(&b.candidate))
    });
}

/// The left-right product score with the extreme-unbalanced revision: when
/// one side dwarfs the other, the product would reward the near-infeasible
/// branch, so the smaller side plus a small penalty stands in.
fn revised_score(delta_up: f64, delta_down: f64) -> f64 {
    let lo = delta_up.min(delta_down).max(0.0);
    let hi = delta_up.max(delta_down).max(0.0);
    if hi > UNBALANCE_RATIO * lo.max(SOLVER_EPS) {
        lo + UNBALANCE_PENALTY
    } else {
        lo.max(SOLVER_EPS) * hi.max(SOLVER_EPS)
    }
}

/// Caps a phase's candidate count by its configured maximum and, when an
/// advisor with timing data exists, by the advisor's promotion decision.
fn advised_count(configured: usize, upstream: usize, advisor: Option<&BkfAdvisor>) -> usize {
    let capped = configured.min(upstream);
    match advisor {
        Some(advisor) => advisor.promote_count(upstream).min(capped),
        None => capped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::BucketGraph;
    use crate::node::NodeIndexer;
    use cairn_lp::model::LpModel;
    use cairn_model::column::Column;
    use cairn_model::edge::Edge;
    use cairn_model::index::VertexIndex;
    use std::cell::RefCell;

    fn v(i: usize) -> VertexIndex {
        VertexIndex::new(i)
    }

    fn edge(a: usize, b: usize) -> Edge {
        Edge::new(v(a), v(b))
    }

    fn test_node(indexer: &NodeIndexer) -> BbNode {
        let cols = vec![Column::dummy()];
        let mut lp = LpModel::new();
        lp.add_col(Column::DUMMY_COST, &[]);
        BbNode::root(indexer, lp, cols, BucketGraph::complete(4, 1, true))
    }

    fn map(entries: &[(Edge, f64)]) -> HashMap<Edge, f64> {
        entries.iter().copied().collect()
    }

    #[test]
    fn test_empty_candidate_map_yields_none() {
        let indexer = NodeIndexer::new();
        let mut node = test_node(&indexer);
        let history = RwLock::new(BranchingHistory::<Edge>::new());
        let mut scorer = CandidateScorer::new(10, 3, 1, 0);
        let mut callbacks = TestingCallbacks::no_op();

        let winner =
            scorer.best_candidate(&mut node, &history, &mut callbacks, &HashMap::new(), &[]);
        assert!(winner.is_none());
    }

    #[test]
    fn test_lp_tests_run_on_screened_candidates_only() {
        let indexer = NodeIndexer::new();
        let mut node = test_node(&indexer);
        let history = RwLock::new(BranchingHistory::<Edge>::new());
        let mut scorer = CandidateScorer::new(2, 2, 0, 0);

        let tested: RefCell<Vec<Edge>> = RefCell::new(Vec::new());
        let mut callbacks = TestingCallbacks {
            lp: Box::new(|_, c: &Edge| {
                tested.borrow_mut().push(*c);
                (1.0, 1.0)
            }),
            heuristic: Box::new(|_, _| (0.0, 0.0)),
            exact: Box::new(|_, _| (0.0, 0.0)),
        };

        let candidate_map = map(&[
            (edge(1, 2), 0.5),
            (edge(1, 3), 0.45),
            (edge(2, 3), 0.9),
        ]);
        let winner = scorer.best_candidate(&mut node, &history, &mut callbacks, &candidate_map, &[]);

        assert!(winner.is_some());
        drop(callbacks);
        // N0 = 2: the near-integral candidate never reaches the LP phase
        let tested = tested.into_inner();
        assert_eq!(tested.len(), 2);
        assert!(!tested.contains(&edge(2, 3)));
        assert_eq!(scorer.lp_time().count, 4);
    }

    #[test]
    fn test_balanced_candidate_beats_unbalanced() {
        let indexer = NodeIndexer::new();
        let mut node = test_node(&indexer);
        let history = RwLock::new(BranchingHistory::<Edge>::new());
        let mut scorer = CandidateScorer::new(10, 0, 0, 0);

        let mut callbacks = TestingCallbacks {
            // (1,2) balanced 3/3; (1,3) extreme 1000 vs 0.001
            lp: Box::new(|_, c: &Edge| {
                if *c == Edge::new(VertexIndex::new(1), VertexIndex::new(2)) {
                    (3.0, 3.0)
                } else {
                    (1000.0, 0.001)
                }
            }),
            heuristic: Box::new(|_, _| (0.0, 0.0)),
            exact: Box::new(|_, _| (0.0, 0.0)),
        };

        let candidate_map = map(&[(edge(1, 2), 0.5), (edge(1, 3), 0.5)]);
        let winner = scorer
            .best_candidate(&mut node, &history, &mut callbacks, &candidate_map, &[])
            .unwrap();
        assert_eq!(winner, edge(1, 2));
    }

    #[test]
    fn test_history_records_every_phase() {
        let indexer = NodeIndexer::new();
        let mut node = test_node(&indexer);
        let history = RwLock::new(BranchingHistory::<Edge>::new());
        let mut scorer = CandidateScorer::new(3, 2, 2, 0);

        let mut callbacks = TestingCallbacks {
            lp: Box::new(|_, _| (1.0, 1.0)),
            heuristic: Box::new(|_, _| (2.0, 2.0)),
            exact: Box::new(|_, _| (3.0, 3.0)),
        };

        let candidate_map = map(&[(edge(1, 2), 0.5), (edge(1, 3), 0.4), (edge(2, 3), 0.3)]);
        let winner = scorer.best_candidate(&mut node, &history, &mut callbacks, &candidate_map, &[]);
        assert!(winner.is_some());

        let guard = history.read().unwrap();
        let winner_record = guard.record(&winner.unwrap()).unwrap();
        assert_eq!(winner_record.tests(TestingPhase::Lp), 1);
        assert_eq!(winner_record.tests(TestingPhase::Heuristic), 1);
        assert_eq!(winner_record.tests(TestingPhase::Exact), 1);
    }

    #[test]
    fn test_single_candidate_phases_are_skipped() {
        let indexer = NodeIndexer::new();
        let mut node = test_node(&indexer);
        let history = RwLock::new(BranchingHistory::<Edge>::new());
        // exact phase allows a single survivor: it must be skipped
        let mut scorer = CandidateScorer::new(2, 2, 1, 0);

        let exact_calls: RefCell<u32> = RefCell::new(0);
        let mut callbacks = TestingCallbacks {
            lp: Box::new(|_, _| (1.0, 1.0)),
            heuristic: Box::new(|_, _| (1.0, 1.0)),
            exact: Box::new(|_, _| {
                *exact_calls.borrow_mut() += 1;
                (1.0, 1.0)
            }),
        };

        let candidate_map = map(&[(edge(1, 2), 0.5), (edge(1, 3), 0.4)]);
        let winner = scorer.best_candidate(&mut node, &history, &mut callbacks, &candidate_map, &[]);
        assert!(winner.is_some());
        assert_eq!(*exact_calls.borrow(), 0);
        assert_eq!(scorer.exact_time().count, 0);
    }

    #[test]
    fn test_deterministic_tie_break() {
        let indexer = NodeIndexer::new();
        let history = RwLock::new(BranchingHistory::<Edge>::new());
        let mut scorer = CandidateScorer::new(10, 0, 0, 0);
        let candidate_map = map(&[(edge(2, 3), 0.5), (edge(1, 2), 0.5), (edge(1, 4), 0.5)]);

        for _ in 0..3 {
            let mut node = test_node(&indexer);
            let mut callbacks = TestingCallbacks::no_op();
            let winner = scorer
                .best_candidate(&mut node, &history, &mut callbacks, &candidate_map, &[])
                .unwrap();
            assert_eq!(winner, edge(1, 2), "ties must break lexicographically");
        }
    }

    #[test]
    fn test_top_two_excludes_pairs_summing_to_one() {
        let indexer = NodeIndexer::new();
        let mut node = test_node(&indexer);
        let history = RwLock::new(BranchingHistory::<Edge>::new());
        let mut scorer = CandidateScorer::new(10, 0, 0, 0);
        let mut callbacks = TestingCallbacks::no_op();

        // anchor will be the most fractional: (1,2) at 0.5
        // (1,3) at 0.5 sums to exactly 1 and must be excluded
        // (2,3) at 0.8 sums to 1.3 and is the only valid partner
        let candidate_map = map(&[
            (edge(1, 2), 0.5),
            (edge(1, 3), 0.5),
            (edge(2, 3), 0.8),
        ]);

        let (first, second) = scorer
            .top_two_candidates(&mut node, &history, &mut callbacks, &candidate_map)
            .unwrap();
        assert_eq!(first, edge(1, 2));
        assert_eq!(second, edge(2, 3));
    }

    #[test]
    fn test_top_two_falls_back_when_all_pairs_sum_to_one() {
        let indexer = NodeIndexer::new();
        let mut node = test_node(&indexer);
        let history = RwLock::new(BranchingHistory::<Edge>::new());
        let mut scorer = CandidateScorer::new(10, 0, 0, 0);
        let mut callbacks = TestingCallbacks::no_op();

        let candidate_map = map(&[(edge(1, 2), 0.5), (edge(1, 3), 0.5)]);
        let (first, second) = scorer
            .top_two_candidates(&mut node, &history, &mut callbacks, &candidate_map)
            .unwrap();
        assert_eq!(first, edge(1, 2));
        assert_eq!(second, edge(1, 3));
    }

    #[test]
    fn test_top_two_needs_two_candidates() {
        let indexer = NodeIndexer::new();
        let mut node = test_node(&indexer);
        let history = RwLock::new(BranchingHistory::<Edge>::new());
        let mut scorer = CandidateScorer::new(10, 0, 0, 0);
        let mut callbacks = TestingCallbacks::no_op();

        let candidate_map = map(&[(edge(1, 2), 0.5)]);
        assert!(
            scorer
                .top_two_candidates(&mut node, &history, &mut callbacks, &candidate_map)
                .is_none()
        );
    }

    #[test]
    fn test_update_advisors_distributes_times() {
        use crate::selector::bkf::BkfParams;

        let mut scorer = CandidateScorer::new(4, 2, 2, 0);
        scorer.lp_time = PhaseTime {
            time: Duration::from_millis(10),
            count: 8,
        };
        scorer.heuristic_time = PhaseTime {
            time: Duration::from_millis(100),
            count: 4,
        };
        scorer.exact_time = PhaseTime {
            time: Duration::from_millis(200),
            count: 4,
        };

        let mut advisors = vec![
            BkfAdvisor::new(BkfParams::new(1, 1)),
            BkfAdvisor::new(BkfParams::new(1, 1)),
        ];
        scorer.update_advisors(Duration::from_millis(50), &mut advisors);

        // both advisors now hold timing data, so they throttle promotion
        assert!(advisors[0].promote_count(100) < 100);
        assert!(advisors[1].promote_count(100) < 100);
    }
}
