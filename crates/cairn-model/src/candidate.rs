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

use crate::edge::{Edge, EdgePair};

/// The bound satisfied by every branching-candidate type.
///
/// The branching history and the candidate scorer are generic over the
/// candidate so that a single edge (2-way branching) and an ordered edge
/// pair (3-way branching) share one selection pipeline. Candidates must
/// hash and compare deterministically: `Ord` is the tie-break of the scorer
/// and therefore part of the reproducibility contract of the search.
pub trait BranchCandidate:
    Clone + Copy + Eq + std::hash::Hash + Ord + std::fmt::Debug + std::fmt::Display + Send + Sync
{
    /// The LP value an ideal branching candidate of this type sits at.
    ///
    /// The scorer's LP-phase sub-sort prefers candidates whose aggregated
    /// primal value is closest to this target: 0.5 for a single edge,
    /// 1.5 for an edge pair (both edges half-used).
    fn fractional_target() -> f64;
}

impl BranchCandidate for Edge {
    #[inline(always)]
    fn fractional_target() -> f64 {
        0.5
    }
}

impl BranchCandidate for EdgePair {
    #[inline(always)]
    fn fractional_target() -> f64 {
        1.5
    }
}
