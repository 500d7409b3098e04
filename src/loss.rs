//! Cross-entropy helpers.
//!
//! The gradient used for training never goes through these functions: the output layer
//! applies the closed-form `posteriors - one_hot(labels)` directly. The loss value is only
//! used for reporting.

use crate::{Error, Matrix, Result};

/// Probabilities are clamped to this floor before taking the log; NaN is left as is.
const MIN_PROB: f64 = 1e-12;

/// Encode class indices as rows of a `(labels.len(), n_classes)` matrix.
pub fn one_hot(labels: &[usize], n_classes: usize) -> Result<Matrix> {
    let mut out = Matrix::zeros(labels.len(), n_classes);
    for (r, &label) in labels.iter().enumerate() {
        if label >= n_classes {
            return Err(Error::InvalidData(format!(
                "label {label} at row {r} is out of range for {n_classes} classes"
            )));
        }
        out.set(r, label, 1.0);
    }
    Ok(out)
}

/// Mean cross-entropy of `posteriors` (rows of class probabilities) against `labels`.
///
/// Returns `-mean(ln p[r, labels[r]])`.
pub fn cross_entropy(posteriors: &Matrix, labels: &[usize]) -> Result<f64> {
    if posteriors.rows() != labels.len() {
        return Err(Error::InvalidShape(format!(
            "posteriors have {} rows but {} labels were given",
            posteriors.rows(),
            labels.len()
        )));
    }
    if labels.is_empty() {
        return Ok(0.0);
    }

    let mut sum = 0.0;
    for (r, (row, &label)) in posteriors.iter_rows().zip(labels).enumerate() {
        let Some(&p) = row.get(label) else {
            return Err(Error::InvalidData(format!(
                "label {label} at row {r} is out of range for {} classes",
                row.len()
            )));
        };
        // NaN posteriors keep the loss NaN.
        let p = if p.is_nan() { p } else { p.max(MIN_PROB) };
        sum -= p.ln();
    }
    Ok(sum / labels.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;

    #[test]
    fn one_hot_places_single_one_per_row() {
        let y = one_hot(&[1, 0, 2], 3).unwrap();
        assert_eq!(y.as_slice(), &[0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
        assert!(one_hot(&[3], 3).is_err());
    }

    #[test]
    fn cross_entropy_of_uniform_two_class_posteriors_is_ln_2() {
        let p = Matrix::from_rows(&[vec![0.5, 0.5], vec![0.5, 0.5]]).unwrap();
        let loss = cross_entropy(&p, &[0, 1]).unwrap();
        assert_abs_diff_eq!(loss, std::f64::consts::LN_2, epsilon = 1e-12);
    }

    #[test]
    fn cross_entropy_stays_finite_for_zero_probability() {
        let p = Matrix::from_rows(&[vec![1.0, 0.0]]).unwrap();
        let loss = cross_entropy(&p, &[1]).unwrap();
        assert!(loss.is_finite());
        assert!(loss > 20.0);
    }

    #[test]
    fn cross_entropy_propagates_nan_posteriors() {
        let p = Matrix::from_rows(&[vec![f64::NAN, f64::NAN], vec![0.5, 0.5]]).unwrap();
        assert!(cross_entropy(&p, &[0, 1]).unwrap().is_nan());
    }

    #[test]
    fn cross_entropy_rejects_row_count_mismatch() {
        let p = Matrix::zeros(2, 2);
        assert!(matches!(
            cross_entropy(&p, &[0]),
            Err(Error::InvalidShape(_))
        ));
    }
}
