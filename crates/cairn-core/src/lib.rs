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

//! # Cairn Core
//!
//! Shared low-level utilities for the cairn branch-cut-and-price solver.
//!
//! This crate intentionally knows nothing about vehicle routing, linear
//! programming, or search trees. It provides:
//!
//! * **`utils::index`**: strongly typed, zero-cost index wrappers so that
//!   vertex, column, and row indices cannot be mixed up at compile time.
//! * **`num::tolerance`**: the floating-point tolerances of the solver and
//!   the comparison helpers built on them. Every crate in the workspace
//!   compares LP quantities through these helpers rather than with ad-hoc
//!   epsilons.

pub mod num;
pub mod utils;
