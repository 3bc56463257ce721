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

/// Error raised by the LP wrapper.
///
/// Infeasibility is an error at this layer on purpose: whether an
/// infeasible LP means "prune the node" or "the whole problem is
/// infeasible" is a search-level decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LpError {
    /// The LP has no feasible point.
    Infeasible,
    /// The LP is unbounded below.
    Unbounded,
    /// The backend failed for another reason.
    Backend(String),
    /// A primal query was issued before any successful solve.
    NotSolved,
}

impl std::fmt::Display for LpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LpError::Infeasible => write!(f, "LP is infeasible"),
            LpError::Unbounded => write!(f, "LP is unbounded"),
            LpError::Backend(msg) => write!(f, "LP backend failure: {}", msg),
            LpError::NotSolved => write!(f, "primal values queried before a successful solve"),
        }
    }
}

impl std::error::Error for LpError {}
