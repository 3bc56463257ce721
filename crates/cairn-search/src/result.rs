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

use crate::stats::BbtStatistics;
use cairn_model::solution::Solution;

/// The result of the search after termination.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchResult {
    /// Optimality proven: the frontier is exhausted and an incumbent
    /// exists.
    Optimal(Solution),
    /// A feasible solution exists but the search stopped early.
    Feasible(Solution),
    /// Infeasibility proven.
    Infeasible,
    /// The search stopped early without any solution.
    Unknown,
}

impl SearchResult {
    /// The objective of the carried solution, if any.
    #[inline]
    pub fn objective(&self) -> Option<f64> {
        match self {
            SearchResult::Optimal(solution) | SearchResult::Feasible(solution) => {
                Some(solution.objective())
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for SearchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchResult::Optimal(solution) => {
                write!(f, "Optimal(objective={})", solution.objective())
            }
            SearchResult::Feasible(solution) => {
                write!(f, "Feasible(objective={})", solution.objective())
            }
            SearchResult::Infeasible => write!(f, "Infeasible"),
            SearchResult::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Why the search stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationReason {
    OptimalityProven,
    InfeasibilityProven,
    /// The soft deadline fired.
    TimeLimit,
    /// A monitor or an unrecoverable failure stopped the search; the
    /// string describes the cause.
    Aborted(String),
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminationReason::OptimalityProven => write!(f, "Optimality Proven"),
            TerminationReason::InfeasibilityProven => write!(f, "Infeasibility Proven"),
            TerminationReason::TimeLimit => write!(f, "Time Limit"),
            TerminationReason::Aborted(reason) => write!(f, "Aborted: {}", reason),
        }
    }
}

/// The complete outcome of a search run.
#[derive(Debug, Clone, PartialEq)]
pub struct BbtOutcome {
    result: SearchResult,
    reason: TerminationReason,
    statistics: BbtStatistics,
    lower_bound: f64,
}

impl BbtOutcome {
    pub fn new(
        result: SearchResult,
        reason: TerminationReason,
        statistics: BbtStatistics,
        lower_bound: f64,
    ) -> Self {
        Self {
            result,
            reason,
            statistics,
            lower_bound,
        }
    }

    #[inline]
    pub fn result(&self) -> &SearchResult {
        &self.result
    }

    #[inline]
    pub fn reason(&self) -> &TerminationReason {
        &self.reason
    }

    #[inline]
    pub fn statistics(&self) -> &BbtStatistics {
        &self.statistics
    }

    /// The final global lower bound.
    #[inline]
    pub fn lower_bound(&self) -> f64 {
        self.lower_bound
    }

    /// The final global upper bound (`+∞` without a solution).
    #[inline]
    pub fn upper_bound(&self) -> f64 {
        self.result.objective().unwrap_or(f64::INFINITY)
    }

    /// The process exit code: 0 optimal within time, 1 time limit,
    /// 2 infeasible, 3 unrecoverable failure.
    pub fn exit_code(&self) -> i32 {
        match &self.reason {
            TerminationReason::OptimalityProven => 0,
            TerminationReason::TimeLimit => 1,
            TerminationReason::InfeasibilityProven => 2,
            TerminationReason::Aborted(_) => 3,
        }
    }
}

impl std::fmt::Display for BbtOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Outcome: {} ({})", self.result, self.reason)?;
        writeln!(f, "Bounds: LB = {}, UB = {}", self.lower_bound, self.upper_bound())?;
        write!(f, "{}", self.statistics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_model::column::Column;
    use cairn_model::index::VertexIndex;

    fn solution(objective: f64) -> Solution {
        let route = Column::new(vec![VertexIndex::new(1)], objective);
        Solution::new(objective, vec![route])
    }

    #[test]
    fn test_exit_codes_follow_reason() {
        let stats = BbtStatistics::default();
        let optimal = BbtOutcome::new(
            SearchResult::Optimal(solution(10.0)),
            TerminationReason::OptimalityProven,
            stats.clone(),
            10.0,
        );
        assert_eq!(optimal.exit_code(), 0);

        let timeout = BbtOutcome::new(
            SearchResult::Unknown,
            TerminationReason::TimeLimit,
            stats.clone(),
            5.0,
        );
        assert_eq!(timeout.exit_code(), 1);

        let infeasible = BbtOutcome::new(
            SearchResult::Infeasible,
            TerminationReason::InfeasibilityProven,
            stats.clone(),
            f64::INFINITY,
        );
        assert_eq!(infeasible.exit_code(), 2);

        let aborted = BbtOutcome::new(
            SearchResult::Unknown,
            TerminationReason::Aborted(String::from("solver failure")),
            stats,
            0.0,
        );
        assert_eq!(aborted.exit_code(), 3);
    }

    #[test]
    fn test_bounds_reporting() {
        let outcome = BbtOutcome::new(
            SearchResult::Unknown,
            TerminationReason::TimeLimit,
            BbtStatistics::default(),
            42.0,
        );
        assert_eq!(outcome.lower_bound(), 42.0);
        assert!(outcome.upper_bound().is_infinite());

        let with_solution = BbtOutcome::new(
            SearchResult::Feasible(solution(50.0)),
            TerminationReason::TimeLimit,
            BbtStatistics::default(),
            42.0,
        );
        assert_eq!(with_solution.upper_bound(), 50.0);
    }
}
