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

//! The owned LP model.
//!
//! [`LpModel`] stores the master problem explicitly: per-column objective
//! coefficients and sparse rows with sense and right-hand side. Mutations
//! (row addition, column removal) edit this representation directly;
//! `solve` lowers it into a fresh `good_lp` problem on the `microlp`
//! backend and caches the primal result. Any mutation invalidates the
//! cache, so stale primal values can never be observed.
//!
//! All variables are continuous with lower bound 0; the model minimizes.

use crate::err::LpError;
use good_lp::{Expression, Solution, SolverModel, microlp, variable, variables};
use std::io::Write;
use std::path::Path;

/// Sense of an LP row.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RowSense {
    /// `≤ rhs`
    Le,
    /// `= rhs`
    Eq,
    /// `≥ rhs`
    Ge,
}

impl std::fmt::Display for RowSense {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowSense::Le => write!(f, "<="),
            RowSense::Eq => write!(f, "="),
            RowSense::Ge => write!(f, ">="),
        }
    }
}

/// One sparse row of the model.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    entries: Vec<(usize, f64)>,
    sense: RowSense,
    rhs: f64,
}

impl Row {
    #[inline(always)]
    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    #[inline(always)]
    pub fn sense(&self) -> RowSense {
        self.sense
    }

    #[inline(always)]
    pub fn rhs(&self) -> f64 {
        self.rhs
    }

    /// Coefficient of the given column in this row (0 if absent).
    #[inline]
    pub fn coefficient(&self, col: usize) -> f64 {
        self.entries
            .iter()
            .find(|(j, _)| *j == col)
            .map_or(0.0, |(_, v)| *v)
    }
}

/// The primal result of a successful solve.
#[derive(Clone, Debug, PartialEq)]
pub struct LpSolution {
    objective: f64,
    x: Vec<f64>,
}

impl LpSolution {
    #[inline(always)]
    pub fn objective(&self) -> f64 {
        self.objective
    }

    #[inline(always)]
    pub fn x(&self) -> &[f64] {
        &self.x
    }
}

/// An owned, deep-clonable LP model.
///
/// `Clone` is the deep-clone operation branch-and-bound relies on: the clone
/// shares nothing with the original, so two nodes can mutate their models
/// independently.
#[derive(Clone, Debug, Default)]
pub struct LpModel {
    obj: Vec<f64>,
    rows: Vec<Row>,
    last: Option<LpSolution>,
}

impl LpModel {
    /// Creates an empty model.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows.
    #[inline(always)]
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    #[inline(always)]
    pub fn num_cols(&self) -> usize {
        self.obj.len()
    }

    /// Read access to a row.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[inline]
    pub fn row(&self, index: usize) -> &Row {
        &self.rows[index]
    }

    /// Objective coefficient of a column.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[inline]
    pub fn col_obj(&self, index: usize) -> f64 {
        self.obj[index]
    }

    /// Appends a column with the given objective coefficient and row
    /// entries, returning its index.
    ///
    /// # Panics
    ///
    /// Panics if any row index is out of bounds.
    pub fn add_col(&mut self, obj: f64, entries: &[(usize, f64)]) -> usize {
        let col = self.obj.len();
        for &(row, value) in entries {
            assert!(
                row < self.rows.len(),
                "called `LpModel::add_col` with row index out of bounds: the len is {} but the index is {}",
                self.rows.len(),
                row
            );
            self.rows[row].entries.push((col, value));
        }
        self.obj.push(obj);
        self.last = None;
        col
    }

    /// Appends a row `sum(values[k] * x[indices[k]]) sense rhs`, returning
    /// its index.
    ///
    /// # Panics
    ///
    /// Panics if `indices` and `values` differ in length or any column index
    /// is out of bounds.
    pub fn add_row(&mut self, indices: &[usize], values: &[f64], sense: RowSense, rhs: f64) -> usize {
        assert_eq!(
            indices.len(),
            values.len(),
            "called `LpModel::add_row` with inconsistent lengths: {} indices but {} values",
            indices.len(),
            values.len()
        );
        for &col in indices {
            assert!(
                col < self.obj.len(),
                "called `LpModel::add_row` with column index out of bounds: the len is {} but the index is {}",
                self.obj.len(),
                col
            );
        }
        let row = self.rows.len();
        self.rows.push(Row {
            entries: indices.iter().copied().zip(values.iter().copied()).collect(),
            sense,
            rhs,
        });
        self.last = None;
        row
    }

    /// Removes the given columns and compacts the remaining indices.
    ///
    /// `indices` must be sorted ascending and duplicate-free.
    ///
    /// # Panics
    ///
    /// Panics if an index is out of bounds; in debug builds, also panics on
    /// unsorted or duplicate input.
    pub fn remove_cols(&mut self, indices: &[usize]) {
        if indices.is_empty() {
            return;
        }
        debug_assert!(
            indices.windows(2).all(|w| w[0] < w[1]),
            "called `LpModel::remove_cols` with unsorted or duplicate indices"
        );
        assert!(
            *indices.last().unwrap() < self.obj.len(),
            "called `LpModel::remove_cols` with column index out of bounds: the len is {} but the index is {}",
            self.obj.len(),
            indices.last().unwrap()
        );

        // old index -> new index, usize::MAX marks removal
        let mut remap = vec![0usize; self.obj.len()];
        let mut removed_iter = indices.iter().peekable();
        let mut next_new = 0usize;
        for (old, slot) in remap.iter_mut().enumerate() {
            if removed_iter.peek() == Some(&&old) {
                removed_iter.next();
                *slot = usize::MAX;
            } else {
                *slot = next_new;
                next_new += 1;
            }
        }

        let mut new_obj = Vec::with_capacity(self.obj.len() - indices.len());
        for (old, &c) in self.obj.iter().enumerate() {
            if remap[old] != usize::MAX {
                new_obj.push(c);
            }
        }
        debug_assert_eq!(new_obj.len(), next_new);
        self.obj = new_obj;

        for row in &mut self.rows {
            row.entries.retain_mut(|(col, _)| {
                if remap[*col] == usize::MAX {
                    false
                } else {
                    *col = remap[*col];
                    true
                }
            });
        }
        self.last = None;
    }

    /// Removes the given rows.
    ///
    /// `indices` must be sorted ascending and duplicate-free.
    ///
    /// # Panics
    ///
    /// Panics if an index is out of bounds.
    pub fn remove_rows(&mut self, indices: &[usize]) {
        if indices.is_empty() {
            return;
        }
        debug_assert!(
            indices.windows(2).all(|w| w[0] < w[1]),
            "called `LpModel::remove_rows` with unsorted or duplicate indices"
        );
        assert!(
            *indices.last().unwrap() < self.rows.len(),
            "called `LpModel::remove_rows` with row index out of bounds: the len is {} but the index is {}",
            self.rows.len(),
            indices.last().unwrap()
        );
        let mut removed_iter = indices.iter().peekable();
        let mut old = 0usize;
        self.rows.retain(|_| {
            let drop = removed_iter.peek() == Some(&&old);
            if drop {
                removed_iter.next();
            }
            old += 1;
            !drop
        });
        self.last = None;
    }

    /// Solves the model, caching and returning the objective value.
    pub fn solve(&mut self) -> Result<f64, LpError> {
        let mut problem_vars = variables!();
        let xs: Vec<_> = (0..self.obj.len())
            .map(|_| problem_vars.add(variable().min(0.0)))
            .collect();

        let objective: Expression = xs
            .iter()
            .zip(self.obj.iter())
            .map(|(x, &c)| c * *x)
            .sum();

        let mut model = problem_vars.minimise(objective).using(microlp);
        for row in &self.rows {
            let lhs: Expression = row.entries.iter().map(|&(j, v)| v * xs[j]).sum();
            let constraint = match row.sense {
                RowSense::Le => lhs.leq(row.rhs),
                RowSense::Eq => lhs.eq(row.rhs),
                RowSense::Ge => lhs.geq(row.rhs),
            };
            model = model.with(constraint);
        }

        let solved = model.solve().map_err(|err| match err {
            good_lp::ResolutionError::Infeasible => LpError::Infeasible,
            good_lp::ResolutionError::Unbounded => LpError::Unbounded,
            other => LpError::Backend(other.to_string()),
        })?;

        let x: Vec<f64> = xs.iter().map(|v| solved.value(*v)).collect();
        let objective = x
            .iter()
            .zip(self.obj.iter())
            .map(|(xi, ci)| xi * ci)
            .sum();
        self.last = Some(LpSolution { objective, x });
        Ok(objective)
    }

    /// The cached solution of the last successful solve, if any mutation
    /// has not invalidated it.
    #[inline]
    pub fn solution(&self) -> Result<&LpSolution, LpError> {
        self.last.as_ref().ok_or(LpError::NotSolved)
    }

    /// Primal values of the columns `start..start + len`.
    pub fn get_x(&self, start: usize, len: usize) -> Result<&[f64], LpError> {
        let solution = self.solution()?;
        assert!(
            start + len <= solution.x.len(),
            "called `LpModel::get_x` with range {}..{} out of bounds: the len is {}",
            start,
            start + len,
            solution.x.len()
        );
        Ok(&solution.x[start..start + len])
    }

    /// Dumps the model in an LP-format-style listing, for debugging.
    pub fn write(&self, path: &Path) -> std::io::Result<()> {
        let mut out = std::io::BufWriter::new(std::fs::File::create(path)?);
        writeln!(out, "Minimize")?;
        write!(out, " obj:")?;
        for (j, c) in self.obj.iter().enumerate() {
            write!(out, " {:+} x{}", c, j)?;
        }
        writeln!(out)?;
        writeln!(out, "Subject To")?;
        for (i, row) in self.rows.iter().enumerate() {
            write!(out, " r{}:", i)?;
            for (j, v) in &row.entries {
                write!(out, " {:+} x{}", v, j)?;
            }
            writeln!(out, " {} {}", row.sense, row.rhs)?;
        }
        writeln!(out, "Bounds")?;
        for j in 0..self.obj.len() {
            writeln!(out, " x{} >= 0", j)?;
        }
        writeln!(out, "End")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_col_and_row_bookkeeping() {
        let mut lp = LpModel::new();
        let a = lp.add_col(2.0, &[]);
        let b = lp.add_col(3.0, &[]);
        assert_eq!((a, b), (0, 1));
        let r = lp.add_row(&[0, 1], &[1.0, 1.0], RowSense::Ge, 1.0);
        assert_eq!(r, 0);
        assert_eq!(lp.num_cols(), 2);
        assert_eq!(lp.num_rows(), 1);
        assert_eq!(lp.row(0).coefficient(0), 1.0);
        assert_eq!(lp.row(0).coefficient(7), 0.0);
    }

    #[test]
    fn test_solve_picks_cheaper_column() {
        // min 2a + 3b  s.t.  a + b >= 1, a,b >= 0  =>  a = 1, obj = 2
        let mut lp = LpModel::new();
        lp.add_col(2.0, &[]);
        lp.add_col(3.0, &[]);
        lp.add_row(&[0, 1], &[1.0, 1.0], RowSense::Ge, 1.0);

        let obj = lp.solve().expect("LP should solve");
        assert!((obj - 2.0).abs() < 1e-6, "objective was {}", obj);
        let x = lp.get_x(0, 2).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-6);
        assert!(x[1].abs() < 1e-6);
    }

    #[test]
    fn test_solve_equality_row() {
        // min a  s.t.  a = 4
        let mut lp = LpModel::new();
        lp.add_col(1.0, &[]);
        lp.add_row(&[0], &[1.0], RowSense::Eq, 4.0);
        let obj = lp.solve().unwrap();
        assert!((obj - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_infeasible_is_reported() {
        // a >= 0 and a <= -1 cannot hold
        let mut lp = LpModel::new();
        lp.add_col(1.0, &[]);
        lp.add_row(&[0], &[1.0], RowSense::Le, -1.0);
        assert_eq!(lp.solve(), Err(LpError::Infeasible));
    }

    #[test]
    fn test_primal_query_before_solve_fails() {
        let lp = LpModel::new();
        assert_eq!(lp.solution().unwrap_err(), LpError::NotSolved);
    }

    #[test]
    fn test_mutation_invalidates_cached_solution() {
        let mut lp = LpModel::new();
        lp.add_col(1.0, &[]);
        lp.add_row(&[0], &[1.0], RowSense::Eq, 1.0);
        lp.solve().unwrap();
        assert!(lp.solution().is_ok());
        lp.add_col(5.0, &[]);
        assert_eq!(lp.solution().unwrap_err(), LpError::NotSolved);
    }

    #[test]
    fn test_remove_cols_remaps_row_entries() {
        let mut lp = LpModel::new();
        lp.add_col(1.0, &[]); // 0
        lp.add_col(2.0, &[]); // 1, removed
        lp.add_col(3.0, &[]); // 2 -> 1
        lp.add_row(&[0, 1, 2], &[1.0, 5.0, 7.0], RowSense::Eq, 1.0);

        lp.remove_cols(&[1]);

        assert_eq!(lp.num_cols(), 2);
        assert_eq!(lp.col_obj(1), 3.0);
        let row = lp.row(0);
        assert_eq!(row.entries(), &[(0, 1.0), (1, 7.0)]);
    }

    #[test]
    fn test_remove_rows() {
        let mut lp = LpModel::new();
        lp.add_col(1.0, &[]);
        lp.add_row(&[0], &[1.0], RowSense::Ge, 1.0);
        lp.add_row(&[0], &[1.0], RowSense::Le, 9.0);
        lp.add_row(&[0], &[1.0], RowSense::Eq, 5.0);
        lp.remove_rows(&[0, 2]);
        assert_eq!(lp.num_rows(), 1);
        assert_eq!(lp.row(0).sense(), RowSense::Le);
    }

    #[test]
    fn test_clone_is_deep() {
        let mut lp = LpModel::new();
        lp.add_col(1.0, &[]);
        lp.add_row(&[0], &[1.0], RowSense::Eq, 1.0);

        let mut other = lp.clone();
        other.add_col(2.0, &[]);
        other.add_row(&[1], &[1.0], RowSense::Eq, 2.0);

        assert_eq!(lp.num_cols(), 1);
        assert_eq!(lp.num_rows(), 1);
        assert_eq!(other.num_cols(), 2);
        assert_eq!(other.num_rows(), 2);
    }

    #[test]
    fn test_write_produces_listing() {
        let mut lp = LpModel::new();
        lp.add_col(1.5, &[]);
        lp.add_row(&[0], &[1.0], RowSense::Ge, 1.0);

        let path = std::env::temp_dir().join("cairn_lp_write_test.lp");
        lp.write(&path).expect("write should succeed");
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Minimize"));
        assert!(text.contains("Subject To"));
        assert!(text.contains(">= 1"));
        let _ = std::fs::remove_file(&path);
    }
}
