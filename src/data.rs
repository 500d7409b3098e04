//! Labelled datasets and feature scaling.
//!
//! The network consumes already-prepared numbers: a `(N, n_features)` feature matrix and `N`
//! class indices. `Dataset` keeps the two together and validated; `MinMaxScaler` maps raw
//! features into `[-1, 1]` using statistics from the training split only.

use crate::{Error, Matrix, Result};

/// A classification dataset: features (X) and class indices (y).
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    inputs: Matrix,
    labels: Vec<usize>,
    n_classes: usize,
}

impl Dataset {
    /// Pair a feature matrix with labels in `[0, n_classes)`.
    pub fn new(inputs: Matrix, labels: Vec<usize>, n_classes: usize) -> Result<Self> {
        if n_classes == 0 {
            return Err(Error::InvalidData("n_classes must be > 0".to_owned()));
        }
        if inputs.rows() != labels.len() {
            return Err(Error::InvalidData(format!(
                "inputs/labels length mismatch: {} vs {}",
                inputs.rows(),
                labels.len()
            )));
        }
        if let Some((i, &bad)) = labels.iter().enumerate().find(|(_, l)| **l >= n_classes) {
            return Err(Error::InvalidData(format!(
                "label {bad} at row {i} is out of range for {n_classes} classes"
            )));
        }

        Ok(Self {
            inputs,
            labels,
            n_classes,
        })
    }

    /// Returns the number of instances.
    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    #[inline]
    pub fn n_features(&self) -> usize {
        self.inputs.cols()
    }

    #[inline]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    #[inline]
    pub fn inputs(&self) -> &Matrix {
        &self.inputs
    }

    #[inline]
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Gather the instances at `indices` into a new dataset.
    pub fn batch(&self, indices: &[usize]) -> Result<Self> {
        let inputs = self.inputs.select_rows(indices)?;
        let labels = indices.iter().map(|&i| self.labels[i]).collect();
        Ok(Self {
            inputs,
            labels,
            n_classes: self.n_classes,
        })
    }

    /// Replace the features, keeping labels (e.g. after scaling).
    pub fn with_inputs(self, inputs: Matrix) -> Result<Self> {
        Self::new(inputs, self.labels, self.n_classes)
    }
}

/// Per-feature affine map of the fitting data's `[min, max]` onto `[-1, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxScaler {
    offset: Vec<f64>,
    scale: Vec<f64>,
}

impl MinMaxScaler {
    /// Record the per-column minimum and range of `x`.
    ///
    /// A constant column gets range `1`, so it maps to `-1` instead of dividing by zero.
    pub fn fit(x: &Matrix) -> Result<Self> {
        if x.rows() == 0 {
            return Err(Error::InvalidData(
                "cannot fit a scaler on zero rows".to_owned(),
            ));
        }

        let mut min = x.row(0).to_vec();
        let mut max = min.clone();
        for row in x.iter_rows().skip(1) {
            for (c, &v) in row.iter().enumerate() {
                min[c] = min[c].min(v);
                max[c] = max[c].max(v);
            }
        }

        let scale = min
            .iter()
            .zip(&max)
            .map(|(lo, hi)| if hi > lo { hi - lo } else { 1.0 })
            .collect();
        Ok(Self { offset: min, scale })
    }

    #[inline]
    pub fn n_features(&self) -> usize {
        self.offset.len()
    }

    /// `((x - offset) / scale - 0.5) * 2`, column by column.
    pub fn transform(&self, x: &Matrix) -> Result<Matrix> {
        if x.cols() != self.n_features() {
            return Err(Error::InvalidShape(format!(
                "scaler was fit on {} features, got {}",
                self.n_features(),
                x.cols()
            )));
        }

        let mut out = x.clone();
        for r in 0..out.rows() {
            for (c, v) in out.row_mut(r).iter_mut().enumerate() {
                *v = ((*v - self.offset[c]) / self.scale[c] - 0.5) * 2.0;
            }
        }
        Ok(out)
    }
}
