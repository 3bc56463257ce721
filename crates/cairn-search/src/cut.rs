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

//! Cut records carried on branch-and-bound nodes.
//!
//! The cutting-plane generator is an external collaborator; the search core
//! only needs to know which cuts are active on a node (their LP row, so the
//! row-count invariant stays checkable) and to clone the lists into
//! children. The member sets are kept so a checkpointed node can be
//! reconstructed.

use cairn_model::index::VertexIndex;

/// An active rounded capacity cut (RCC).
#[derive(Clone, Debug, PartialEq)]
pub struct CapacityCut {
    /// Customer set the cut is defined on.
    pub members: Vec<VertexIndex>,
    /// Right-hand side (the rounded vehicle count bound).
    pub rhs: f64,
    /// LP row the cut occupies.
    pub row: usize,
}

/// An active rank-1 cut (R1C).
#[derive(Clone, Debug, PartialEq)]
pub struct RankOneCut {
    /// Customer multiset the cut is defined on.
    pub members: Vec<VertexIndex>,
    /// Per-member multipliers (numerators of the rank-1 weights).
    pub multipliers: Vec<u32>,
    /// Multiplier denominator.
    pub denominator: u32,
    /// Right-hand side.
    pub rhs: f64,
    /// LP row the cut occupies.
    pub row: usize,
}
