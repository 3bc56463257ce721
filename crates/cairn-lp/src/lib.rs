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

//! # Cairn LP
//!
//! The LP-solver wrapper consumed by the search core.
//!
//! Every branch-and-bound node owns one [`model::LpModel`]. The wrapper owns
//! the row/column representation itself so that the operations the search
//! core needs (deep clone on node branching, row addition for branch
//! constraints, column removal on the FORBID side) are exact, cheap, and
//! backend independent. `solve` rebuilds the backend problem (`good_lp` with
//! the pure-Rust `microlp` backend) from the stored representation on each
//! call; nodes solve rarely and mutate often, so this trade is the right
//! one.

pub mod err;
pub mod model;
