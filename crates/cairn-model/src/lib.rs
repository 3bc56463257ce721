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

//! # Cairn Model
//!
//! **The domain model of the cairn branch-cut-and-price solver.**
//!
//! This crate defines the data structures shared between the problem input
//! and the search engine (`cairn-search`):
//!
//! * **`index`**: the strongly typed `VertexIndex` (vertex 0 is the depot).
//! * **`edge`**: branching candidates, the canonical undirected [`edge::Edge`]
//!   and the ordered [`edge::EdgePair`] used by 3-way branching.
//! * **`candidate`**: the trait bound every branching-candidate type satisfies,
//!   so history and scoring are generic over the branching style.
//! * **`column`**: a route variable of the set-partitioning master problem.
//! * **`instance`**: the immutable CVRP/VRPTW instance and its builder.
//! * **`loading`**: a TSPLIB-like text loader.
//! * **`solution`**: the integer solution held by the incumbent.
//!
//! ## Design Philosophy
//!
//! 1. **Type safety**: vertex indices are a distinct type; an LP column index
//!    cannot silently stand in for a customer.
//! 2. **Fail-fast**: the builder validates eagerly so the search engine never
//!    sees an inconsistent instance.
//! 3. **Immutability**: the instance is frozen after construction; all search
//!    state lives in the engine's nodes.

pub mod candidate;
pub mod column;
pub mod edge;
pub mod index;
pub mod instance;
pub mod loading;
pub mod solution;
