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

//! # Cairn Search
//!
//! The branch-and-bound search core of the cairn branch-cut-and-price
//! solver. The crate separates node state, branching, candidate selection,
//! and tree control so each can be exercised and swapped independently:
//!
//! Core flow
//! - The controller pops the best open node from the frontier.
//! - Pricing and cutting run as injected callbacks (the engines themselves
//!   are external collaborators).
//! - If the node's LP stays fractional, the candidate scorer screens and
//!   tests branching candidates, guided by the shared pseudo-cost history
//!   and throttled by the BKF advisor.
//! - The branching operator materializes 2 or 3 children; the controller
//!   pushes them back onto the frontier.
//!
//! Module map
//! - `node`: the branch-and-bound node (LP model, columns, cuts, branch
//!   constraints, bucket graph or enumeration payload.
//! - `bucket`: the arc bucket graph constraining the pricing engine.
//! - `pool`: the shared, append-only enumeration column pool.
//! - `cut`: capacity and rank-1 cut records carried on nodes.
//! - `branch`: branch constraints and the branching operator.
//! - `selector`: pseudo-cost history, the multi-phase candidate scorer, and
//!   the BKF phase advisor.
//! - `frontier`: the best-bound-first open-node queue.
//! - `callbacks`: the closure record wiring external collaborators in.
//! - `controller`: the branch-and-bound tree controller.
//! - `monitor`: tree-search monitors (no-op, composite, time limit, log).
//! - `incumbent`: the shared upper bound and best solution.
//! - `stats`, `result`: telemetry and outcome types.
//! - `checkpoint`: node dump/load for resuming a search.
//!
//! Determinism: given deterministic callbacks, a run is reproducible. Child
//! push order (true before false, A-B-C for 3-way) and the scorer's
//! lexicographic tie-break are part of that contract.

pub mod branch;
pub mod bucket;
pub mod callbacks;
pub mod checkpoint;
pub mod controller;
pub mod cut;
pub mod frontier;
pub mod incumbent;
pub mod monitor;
pub mod node;
pub mod pool;
pub mod result;
pub mod selector;
pub mod stats;
