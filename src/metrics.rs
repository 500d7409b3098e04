//! Metrics.
//!
//! Metrics are evaluation helpers (they do not participate in backprop).

use crate::{Error, Matrix, Result};

/// Winner-takes-all class decision for each row of `posteriors`.
///
/// Ties resolve to the lowest class index.
pub fn argmax_rows(posteriors: &Matrix) -> Vec<usize> {
    posteriors
        .iter_rows()
        .map(|row| {
            let mut best = 0;
            for (c, &v) in row.iter().enumerate().skip(1) {
                if v > row[best] {
                    best = c;
                }
            }
            best
        })
        .collect()
}

/// Number of positions where `predicted` and `truth` disagree.
pub fn misclassified(predicted: &[usize], truth: &[usize]) -> Result<usize> {
    if predicted.len() != truth.len() {
        return Err(Error::InvalidData(format!(
            "predicted/truth length mismatch: {} vs {}",
            predicted.len(),
            truth.len()
        )));
    }
    Ok(predicted.iter().zip(truth).filter(|(p, t)| p != t).count())
}

/// Fraction of misclassified instances, in `[0, 1]`.
pub fn error_rate(predicted: &[usize], truth: &[usize]) -> Result<f64> {
    let wrong = misclassified(predicted, truth)?;
    if truth.is_empty() {
        return Err(Error::InvalidData(
            "cannot compute an error rate over zero instances".to_owned(),
        ));
    }
    Ok(wrong as f64 / truth.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_picks_largest_and_breaks_ties_low() {
        let p = Matrix::from_rows(&[vec![0.2, 0.8], vec![0.6, 0.4], vec![0.5, 0.5]]).unwrap();
        assert_eq!(argmax_rows(&p), vec![1, 0, 0]);
    }

    #[test]
    fn error_rate_counts_disagreements() {
        assert_eq!(error_rate(&[0, 1, 1, 0], &[0, 1, 0, 1]).unwrap(), 0.5);
        assert_eq!(error_rate(&[2, 2], &[2, 2]).unwrap(), 0.0);
        assert!(error_rate(&[0], &[0, 1]).is_err());
        assert!(error_rate(&[], &[]).is_err());
    }
}
