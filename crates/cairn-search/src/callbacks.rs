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

//! The external collaborators of the controller, wired in as a record of
//! first-class closures configured once per run.
//!
//! Pricing, cutting, column enumeration and the machine-learning candidate
//! scorers are all external to this crate; the controller only knows their
//! shapes. The testing callbacks of the candidate scorer live in
//! [`crate::selector::scorer::TestingCallbacks`].

use crate::branch::operator::BranchChildren;
use crate::node::BbNode;
use std::collections::HashMap;

/// Failure of an external collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackError {
    /// The collaborator proved the node's subproblem infeasible.
    Infeasible,
    /// The collaborator failed; at the root this aborts the search, at
    /// any other node the bound degrades to `+∞` and the node is pruned.
    Failed(String),
}

impl std::fmt::Display for CallbackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallbackError::Infeasible => write!(f, "subproblem infeasible"),
            CallbackError::Failed(reason) => write!(f, "collaborator failed: {}", reason),
        }
    }
}

impl std::error::Error for CallbackError {}

/// A branching decision handed to the impose callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BranchDecision<C> {
    /// 2-way split on a single candidate.
    Single(C),
    /// 3-way split on an ordered candidate pair.
    Pair(C, C),
}

/// The collaborator record of one search run.
pub struct SearchCallbacks<'a, C> {
    /// Pricing at node begin: solves the node's LP by column generation,
    /// sets the node's value, and may set the terminate flag.
    pub pricing_at_begin: Box<dyn FnMut(&mut BbNode) -> Result<(), CallbackError> + 'a>,
    /// Cutting: separates violated cuts and re-solves until none is found
    /// or a stop criterion fires.
    pub cutting: Box<dyn FnMut(&mut BbNode) -> Result<(), CallbackError> + 'a>,
    /// Extracts the branching-candidate map from the node's LP solution.
    pub candidate_map: Box<dyn FnMut(&mut BbNode) -> Result<HashMap<C, f64>, CallbackError> + 'a>,
    /// Applies a branching decision, yielding the children.
    pub impose_branching:
        Box<dyn FnMut(BbNode, BranchDecision<C>) -> Result<BranchChildren, CallbackError> + 'a>,
    /// Optional external candidate selection (the machine-learning hook).
    /// When present it replaces the scorer; returning `None` falls back
    /// to terminating the node.
    #[allow(clippy::type_complexity)]
    pub external_selection:
        Option<Box<dyn FnMut(&mut BbNode, &HashMap<C, f64>) -> Option<BranchDecision<C>> + 'a>>,
    /// Optional node checkpoint writer, invoked after a node is processed.
    pub node_out: Option<Box<dyn FnMut(&BbNode) -> Result<(), CallbackError> + 'a>>,
}

impl<C> std::fmt::Debug for SearchCallbacks<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchCallbacks")
            .field("external_selection", &self.external_selection.is_some())
            .field("node_out", &self.node_out.is_some())
            .finish()
    }
}
