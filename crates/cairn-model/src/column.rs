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

//! Route columns of the set-partitioning master problem.
//!
//! A column is one feasible route: an ordered customer sequence (the depot
//! endpoints are implicit) plus the route cost. The search core never
//! inspects route feasibility (that is the pricing oracle's contract), but
//! it constantly asks columns which branching edges they use, so those
//! queries live here.

use crate::edge::Edge;
use crate::index::{DEPOT, VertexIndex};

/// A route variable of the master problem.
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    /// Customer sequence, depot endpoints implicit. Empty for the dummy.
    seq: Vec<VertexIndex>,
    /// Route cost (objective coefficient in the master).
    cost: f64,
}

impl Column {
    /// Objective coefficient of the artificial dummy column.
    ///
    /// Large enough that the dummy never stays basic in an optimal solution
    /// of a feasible master, small enough not to wreck the LP scaling.
    pub const DUMMY_COST: f64 = 1e7;

    /// Creates a new column from a customer sequence and cost.
    ///
    /// # Panics
    ///
    /// Panics if the sequence contains the depot; depot endpoints are
    /// implicit.
    pub fn new(seq: Vec<VertexIndex>, cost: f64) -> Self {
        assert!(
            !seq.contains(&DEPOT),
            "called `Column::new` with an explicit depot in the customer sequence"
        );
        Self { seq, cost }
    }

    /// The artificial column pinned at LP index 0.
    ///
    /// It covers every partitioning row with coefficient 1 so the master
    /// stays feasible while pricing is still warming up, and it is never
    /// removed by branching.
    #[inline]
    pub fn dummy() -> Self {
        Self {
            seq: Vec::new(),
            cost: Self::DUMMY_COST,
        }
    }

    /// Returns `true` if this is the dummy column.
    #[inline(always)]
    pub fn is_dummy(&self) -> bool {
        self.seq.is_empty()
    }

    /// The customer sequence (depot endpoints implicit).
    #[inline(always)]
    pub fn seq(&self) -> &[VertexIndex] {
        &self.seq
    }

    #[inline(always)]
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Returns `true` if the route visits customer `v`.
    #[inline]
    pub fn visits(&self, v: VertexIndex) -> bool {
        self.seq.contains(&v)
    }

    /// Number of times the route traverses the undirected edge.
    ///
    /// The closed tour `depot, c_1, …, c_k, depot` is scanned, so a
    /// single-customer route traverses its depot edge twice. This count is
    /// the column's coefficient on a branching row, and it is symmetric in
    /// the edge's endpoints by construction.
    pub fn edge_coefficient(&self, edge: Edge) -> f64 {
        if self.seq.is_empty() {
            return 0.0;
        }
        let mut count = 0u32;
        let mut prev = DEPOT;
        for &v in &self.seq {
            if edge.touches(prev) && edge.other(prev) == Some(v) {
                count += 1;
            }
            prev = v;
        }
        if edge.touches(prev) && edge.other(prev) == Some(DEPOT) {
            count += 1;
        }
        f64::from(count)
    }

    /// Returns `true` if the route uses the edge at least once.
    #[inline]
    pub fn uses_edge(&self, edge: Edge) -> bool {
        self.edge_coefficient(edge) > 0.0
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_dummy() {
            return write!(f, "Column(dummy, cost: {})", self.cost);
        }
        write!(f, "Column(0")?;
        for v in &self.seq {
            write!(f, "-{}", v.get())?;
        }
        write!(f, "-0, cost: {})", self.cost)
    }
}
