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

//! Floating-point tolerances of the solver.
//!
//! LP values flow through the entire search core: node bounds, primal edge
//! usages, pseudo-cost means. Comparing them with raw `==`/`<` invites
//! tolerance bugs that only surface on degenerate instances, so every
//! comparison goes through this module.
//!
//! Two tolerances exist on purpose:
//! - [`SOLVER_EPS`] is the tight tolerance of the LP itself (feasibility,
//!   duplicate-row detection, the "sums to exactly one" guard on 3-way
//!   candidate pairs).
//! - [`INTEGRALITY_EPS`] is the looser tolerance used to decide whether a
//!   primal value counts as integral. It must be strictly wider than
//!   [`SOLVER_EPS`], otherwise genuinely integral LP solutions are
//!   misclassified as fractional after round-off.

use num_traits::Float;

/// Tolerance of LP-level comparisons.
pub const SOLVER_EPS: f64 = 1e-9;

/// Tolerance for classifying a primal value as integral.
pub const INTEGRALITY_EPS: f64 = 1e-6;

/// Returns `true` if `a` and `b` are equal within `eps`.
#[inline(always)]
pub fn approx_eq<T: Float>(a: T, b: T, eps: T) -> bool {
    (a - b).abs() <= eps
}

/// Returns the distance of `x` to the nearest integer.
///
/// This is the fractionality measure used by the initial branching screen:
/// it is `0` for integral values and peaks at `0.5` for perfectly fractional
/// ones.
#[inline(always)]
pub fn fractional_part_distance(x: f64) -> f64 {
    (x - x.round()).abs()
}

/// Returns `true` if `x` is integral within [`INTEGRALITY_EPS`].
#[inline(always)]
pub fn is_integral(x: f64) -> bool {
    fractional_part_distance(x) <= INTEGRALITY_EPS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approx_eq_within_and_outside_eps() {
        assert!(approx_eq(1.0, 1.0 + 0.5e-9, SOLVER_EPS));
        assert!(!approx_eq(1.0, 1.0 + 2e-9, SOLVER_EPS));
    }

    #[test]
    fn test_fractional_part_distance_symmetry() {
        assert_eq!(fractional_part_distance(2.0), 0.0);
        assert!((fractional_part_distance(2.3) - 0.3).abs() < 1e-12);
        assert!((fractional_part_distance(2.7) - 0.3).abs() < 1e-12);
        assert!((fractional_part_distance(-0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_is_integral_classification() {
        assert!(is_integral(3.0));
        assert!(is_integral(3.0 + 0.5e-6));
        assert!(!is_integral(3.5));
        assert!(!is_integral(3.001));
    }

    #[test]
    fn test_integrality_eps_wider_than_solver_eps() {
        assert!(INTEGRALITY_EPS > SOLVER_EPS);
    }
}
