//! Row-major dense matrix for constraint Jacobians.
//!
//! Constraint bindings carry one Jacobian per coupled state block. The
//! row count is the number of constrained scalar equations; the column
//! count matches the block's generalized-velocity dimension, so no glam
//! fixed-size type fits. Matrices here are tiny (a handful of rows, up
//! to 6 columns), so a flat `Vec<f64>` is plenty.

use serde::{Deserialize, Serialize};

/// A row-major dense matrix with runtime dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl RowMatrix {
    /// Creates a zero matrix of the given shape.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Number of rows (constrained scalar equations).
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (block velocity dimension).
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Resizes to the given shape, zeroing all entries.
    pub fn resize(&mut self, rows: usize, cols: usize) {
        self.rows = rows;
        self.cols = cols;
        self.data.clear();
        self.data.resize(rows * cols, 0.0);
    }

    /// Returns row `r` as a slice of length `cols`.
    #[inline]
    pub fn row(&self, r: usize) -> &[f64] {
        let base = r * self.cols;
        &self.data[base..base + self.cols]
    }

    /// Returns row `r` as a mutable slice.
    #[inline]
    pub fn row_mut(&mut self, r: usize) -> &mut [f64] {
        let base = r * self.cols;
        &mut self.data[base..base + self.cols]
    }

    #[inline]
    pub fn get(&self, r: usize, c: usize) -> f64 {
        self.data[r * self.cols + c]
    }

    #[inline]
    pub fn set(&mut self, r: usize, c: usize, value: f64) {
        self.data[r * self.cols + c] = value;
    }

    /// Dot product of row `r` with a velocity slice: (J·v)ᵣ.
    ///
    /// `v` must have length `cols`.
    #[inline]
    pub fn row_dot(&self, r: usize, v: &[f64]) -> f64 {
        debug_assert_eq!(v.len(), self.cols);
        self.row(r).iter().zip(v).map(|(a, b)| a * b).sum()
    }

    /// Accumulates `scale` times row `r` into `out`: out += Jᵣᵀ·scale.
    ///
    /// Used to apply a multiplier update to a block's impulse or
    /// velocity vector.
    #[inline]
    pub fn accumulate_row(&self, r: usize, scale: f64, out: &mut [f64]) {
        debug_assert_eq!(out.len(), self.cols);
        for (o, j) in out.iter_mut().zip(self.row(r)) {
            *o += j * scale;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeros_shape() {
        let m = RowMatrix::zeros(2, 6);
        assert_eq!(m.rows(), 2);
        assert_eq!(m.cols(), 6);
        assert_eq!(m.row(1), &[0.0; 6]);
    }

    #[test]
    fn resize_clears() {
        let mut m = RowMatrix::zeros(1, 3);
        m.set(0, 1, 5.0);
        m.resize(1, 6);
        assert_eq!(m.cols(), 6);
        assert_eq!(m.get(0, 1), 0.0);
    }

    #[test]
    fn row_dot() {
        let mut m = RowMatrix::zeros(1, 3);
        m.row_mut(0).copy_from_slice(&[1.0, 2.0, 3.0]);
        assert_eq!(m.row_dot(0, &[1.0, 1.0, 1.0]), 6.0);
    }

    #[test]
    fn accumulate_row() {
        let mut m = RowMatrix::zeros(1, 3);
        m.row_mut(0).copy_from_slice(&[0.0, 0.0, 1.0]);
        let mut out = [0.0; 3];
        m.accumulate_row(0, 2.5, &mut out);
        assert_eq!(out, [0.0, 0.0, 2.5]);
    }
}
