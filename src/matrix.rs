//! Row-major matrix storage.
//!
//! Every batch that flows through the network is a `(rows, cols)` matrix stored in a single
//! contiguous buffer: row `r` occupies `data[r * cols..(r + 1) * cols]`. Rows are independent
//! instances; columns are features (or class scores at the output).

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl Matrix {
    /// An all-zero matrix with shape `(rows, cols)`.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![0.0; rows * cols],
            rows,
            cols,
        }
    }

    /// Build a matrix from a flat row-major buffer with `cols` columns.
    pub fn from_flat(data: Vec<f64>, cols: usize) -> Result<Self> {
        if cols == 0 {
            return Err(Error::InvalidData("cols must be > 0".to_owned()));
        }
        if !data.len().is_multiple_of(cols) {
            return Err(Error::InvalidData(format!(
                "buffer length {} is not divisible by cols {}",
                data.len(),
                cols
            )));
        }

        let rows = data.len() / cols;
        Ok(Self { data, rows, cols })
    }

    /// Build a matrix from per-instance rows.
    ///
    /// This is a convenience constructor (it copies into contiguous storage).
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::InvalidData("rows must not be empty".to_owned()));
        }

        let cols = rows[0].len();
        if cols == 0 {
            return Err(Error::InvalidData("rows must have at least one column".to_owned()));
        }

        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(Error::InvalidData(format!(
                    "row {i} has len {}, expected {cols}",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }

        Ok(Self {
            data,
            rows: rows.len(),
            cols,
        })
    }

    /// Build a batch from instances of arbitrary rank.
    ///
    /// `shape[0]` is the batch dimension; the remaining dimensions of each instance are
    /// flattened into a single feature vector (e.g. a `(B, 28, 28)` image batch becomes
    /// `(B, 784)`).
    pub fn from_shape(data: Vec<f64>, shape: &[usize]) -> Result<Self> {
        let Some((&batch, instance)) = shape.split_first() else {
            return Err(Error::InvalidShape("shape must not be empty".to_owned()));
        };
        let overflow = || Error::InvalidShape(format!("shape {shape:?} overflows usize"));
        let features = instance
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or_else(overflow)?;
        let total = batch.checked_mul(features).ok_or_else(overflow)?;
        if total != data.len() {
            return Err(Error::InvalidShape(format!(
                "shape {shape:?} holds {total} values, buffer has {}",
                data.len()
            )));
        }

        Ok(Self {
            data,
            rows: batch,
            cols: features,
        })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the `r`-th row.
    ///
    /// Panics if `r >= rows`.
    #[inline]
    pub fn row(&self, r: usize) -> &[f64] {
        let start = r * self.cols;
        &self.data[start..start + self.cols]
    }

    #[inline]
    pub fn row_mut(&mut self, r: usize) -> &mut [f64] {
        let start = r * self.cols;
        &mut self.data[start..start + self.cols]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.cols.max(1))
    }

    #[inline]
    pub fn get(&self, r: usize, c: usize) -> f64 {
        self.data[r * self.cols + c]
    }

    #[inline]
    pub fn set(&mut self, r: usize, c: usize, value: f64) {
        self.data[r * self.cols + c] = value;
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Gather the given rows, in order, into a new matrix.
    pub fn select_rows(&self, indices: &[usize]) -> Result<Self> {
        let mut data = Vec::with_capacity(indices.len() * self.cols);
        for &idx in indices {
            if idx >= self.rows {
                return Err(Error::InvalidData(format!(
                    "row index {idx} out of bounds for {} rows",
                    self.rows
                )));
            }
            data.extend_from_slice(self.row(idx));
        }

        Ok(Self {
            data,
            rows: indices.len(),
            cols: self.cols,
        })
    }

    /// Element-wise map into a new matrix of the same shape.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            data: self.data.iter().map(|&v| f(v)).collect(),
            rows: self.rows,
            cols: self.cols,
        }
    }

    /// `self -= scale * other`, element-wise.
    pub(crate) fn sub_scaled(&mut self, other: &Matrix, scale: f64) {
        debug_assert_eq!(self.shape(), other.shape());
        for (p, &g) in self.data.iter_mut().zip(&other.data) {
            *p -= scale * g;
        }
    }

    pub(crate) fn ensure_shape(&self, expected: (usize, usize), what: &str) -> Result<()> {
        if self.shape() != expected {
            return Err(Error::InvalidShape(format!(
                "{what} has shape {:?}, expected {expected:?}",
                self.shape()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_flat_validates_divisibility() {
        assert!(Matrix::from_flat(vec![0.0, 1.0, 2.0, 3.0], 2).is_ok());
        assert!(Matrix::from_flat(vec![0.0, 1.0, 2.0], 2).is_err());
        assert!(Matrix::from_flat(vec![], 0).is_err());
    }

    #[test]
    fn from_rows_rejects_ragged_input() {
        let err = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }

    #[test]
    fn from_shape_flattens_instances_but_keeps_batch() {
        let m = Matrix::from_shape((0..24).map(f64::from).collect(), &[2, 3, 4]).unwrap();
        assert_eq!(m.shape(), (2, 12));
        assert_eq!(m.row(1)[0], 12.0);

        assert!(Matrix::from_shape(vec![0.0; 5], &[2, 3]).is_err());
        assert!(Matrix::from_shape(vec![], &[]).is_err());
    }

    #[test]
    fn from_shape_rejects_overflowing_dimensions() {
        let huge = usize::MAX / 2 + 1;
        assert!(matches!(
            Matrix::from_shape(vec![0.0; 4], &[2, huge, 2]),
            Err(Error::InvalidShape(_))
        ));
        assert!(matches!(
            Matrix::from_shape(vec![0.0; 4], &[huge, 4]),
            Err(Error::InvalidShape(_))
        ));
    }

    #[test]
    fn select_rows_gathers_in_order() {
        let m = Matrix::from_rows(&[vec![0.0, 0.5], vec![1.0, 1.5], vec![2.0, 2.5]]).unwrap();
        let picked = m.select_rows(&[2, 0]).unwrap();
        assert_eq!(picked.as_slice(), &[2.0, 2.5, 0.0, 0.5]);
        assert!(m.select_rows(&[3]).is_err());
    }
}
