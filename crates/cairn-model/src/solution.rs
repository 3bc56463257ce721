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

use crate::column::Column;

/// An integer-feasible solution: the routes of the incumbent.
#[derive(Clone, Debug, PartialEq)]
pub struct Solution {
    objective: f64,
    routes: Vec<Column>,
}

impl Solution {
    /// Constructs a new solution from its routes.
    ///
    /// # Panics
    ///
    /// Panics if any route is the dummy column; the dummy never belongs to
    /// an integer-feasible solution.
    pub fn new(objective: f64, routes: Vec<Column>) -> Self {
        assert!(
            routes.iter().all(|r| !r.is_dummy()),
            "called `Solution::new` with the dummy column among the routes"
        );
        Self { objective, routes }
    }

    #[inline(always)]
    pub fn objective(&self) -> f64 {
        self.objective
    }

    #[inline(always)]
    pub fn routes(&self) -> &[Column] {
        &self.routes
    }

    #[inline(always)]
    pub fn num_routes(&self) -> usize {
        self.routes.len()
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Solution(objective: {}, routes: {})",
            self.objective,
            self.routes.len()
        )?;
        for route in &self.routes {
            writeln!(f, "  {}", route)?;
        }
        Ok(())
    }
}
