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

//! The shared enumeration column pool.
//!
//! In enumeration state the pricing oracle is replaced by lookups into a
//! pool of fully enumerated columns. The pool is append-only and shared
//! across the whole tree: nodes reference columns by index and keep a
//! private deleted-mask, so a column is never relocated and an index stays
//! valid for the lifetime of the search.

use cairn_model::column::Column;
use std::sync::RwLock;

/// Append-only shared buffer of enumerated columns.
#[derive(Debug, Default)]
pub struct EnumColumnPool {
    cols: RwLock<Vec<Column>>,
}

impl EnumColumnPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column, returning its stable pool index.
    pub fn append(&self, col: Column) -> usize {
        let mut cols = self.cols.write().expect("enumeration pool lock poisoned");
        cols.push(col);
        cols.len() - 1
    }

    /// Number of columns in the pool.
    pub fn len(&self) -> usize {
        self.cols.read().expect("enumeration pool lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clones the column at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn get(&self, index: usize) -> Column {
        self.cols.read().expect("enumeration pool lock poisoned")[index].clone()
    }

    /// Applies `f` to the column at `index` without cloning.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn with_col<R>(&self, index: usize, f: impl FnOnce(&Column) -> R) -> R {
        f(&self.cols.read().expect("enumeration pool lock poisoned")[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_model::index::VertexIndex;

    fn col(seq: &[usize], cost: f64) -> Column {
        Column::new(seq.iter().map(|&i| VertexIndex::new(i)).collect(), cost)
    }

    #[test]
    fn test_append_returns_stable_indices() {
        let pool = EnumColumnPool::new();
        assert!(pool.is_empty());
        let a = pool.append(col(&[1], 3.0));
        let b = pool.append(col(&[2, 3], 7.0));
        assert_eq!((a, b), (0, 1));
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.get(0).cost(), 3.0);
        assert_eq!(pool.with_col(1, |c| c.seq().len()), 2);
    }
}
