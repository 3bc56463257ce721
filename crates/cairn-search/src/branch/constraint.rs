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

use cairn_model::edge::Edge;
use serde::{Deserialize, Serialize};

/// Direction of a branch constraint.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum BranchDirection {
    /// The edge is forced into the solution (`x_e = 1`).
    Force,
    /// The edge is excluded (`x_e = 0`).
    Forbid,
    /// 3-way middle branch: exactly one of the two paired edges is used.
    /// Always appears as a pair of constraints sharing one LP row.
    Middle,
}

impl std::fmt::Display for BranchDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BranchDirection::Force => write!(f, "Force"),
            BranchDirection::Forbid => write!(f, "Forbid"),
            BranchDirection::Middle => write!(f, "Middle"),
        }
    }
}

/// A branch constraint recorded on a node.
///
/// `row` is the LP row enforcing the constraint; `None` marks a constraint
/// with no solver row; the decision is then enforced implicitly by column
/// exclusion (the 2-way FORBID side and all enumeration-state branching).
/// Constraints are immutable after insertion: the fields are private and
/// there are no setters.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct BranchConstraint {
    edge: Edge,
    row: Option<usize>,
    direction: BranchDirection,
    three_way: bool,
}

impl BranchConstraint {
    /// A constraint created by a 2-way split.
    #[inline]
    pub fn two_way(edge: Edge, row: Option<usize>, direction: BranchDirection) -> Self {
        debug_assert!(
            direction != BranchDirection::Middle,
            "called `BranchConstraint::two_way` with the Middle direction"
        );
        Self {
            edge,
            row,
            direction,
            three_way: false,
        }
    }

    /// A constraint created by a 3-way split.
    #[inline]
    pub fn three_way(edge: Edge, row: Option<usize>, direction: BranchDirection) -> Self {
        Self {
            edge,
            row,
            direction,
            three_way: true,
        }
    }

    #[inline(always)]
    pub fn edge(&self) -> Edge {
        self.edge
    }

    /// The LP row enforcing this constraint, if it has one.
    #[inline(always)]
    pub fn row(&self) -> Option<usize> {
        self.row
    }

    #[inline(always)]
    pub fn direction(&self) -> BranchDirection {
        self.direction
    }

    /// Returns `true` if this constraint came from a 3-way split.
    #[inline(always)]
    pub fn is_three_way(&self) -> bool {
        self.three_way
    }

    /// Returns `true` if this constraint occupies an LP row.
    #[inline(always)]
    pub fn has_row(&self) -> bool {
        self.row.is_some()
    }
}

impl std::fmt::Display for BranchConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.row {
            Some(row) => write!(f, "Brc({} {}, row {})", self.direction, self.edge, row),
            None => write!(f, "Brc({} {}, no row)", self.direction, self.edge),
        }
    }
}
