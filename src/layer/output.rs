use crate::loss::one_hot;
use crate::{Error, Matrix, Result};

/// Softmax output layer trained with cross-entropy.
///
/// `forward` turns each row of class scores into a probability distribution. `backward`
/// starts backprop from the predictions and the true labels, using the combined
/// softmax + cross-entropy derivative `posteriors - one_hot(labels)`.
#[derive(Debug, Clone)]
pub struct SoftmaxOutput {
    n_classes: usize,
    input: Option<Matrix>,
}

impl SoftmaxOutput {
    pub fn new(n_classes: usize) -> Result<Self> {
        if n_classes == 0 {
            return Err(Error::InvalidConfig("n_classes must be > 0".to_owned()));
        }
        Ok(Self {
            n_classes,
            input: None,
        })
    }

    #[inline]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Row-wise softmax.
    ///
    /// Each row is shifted by its maximum before exponentiation; the result is unchanged but
    /// large scores no longer overflow.
    pub fn forward(&mut self, input: &Matrix) -> Result<Matrix> {
        if input.cols() != self.n_classes {
            return Err(Error::InvalidShape(format!(
                "softmax output expects {} class scores, got {}",
                self.n_classes,
                input.cols()
            )));
        }

        let mut out = input.clone();
        for r in 0..out.rows() {
            softmax_in_place(out.row_mut(r));
        }

        self.input = Some(input.clone());
        Ok(out)
    }

    /// Gradient of the summed cross-entropy w.r.t. the pre-softmax scores.
    pub fn backward(&mut self, posteriors: &Matrix, labels: &[usize]) -> Result<Matrix> {
        let input = self.input.as_ref().ok_or(Error::NotPrimed {
            layer: "softmax output",
            needs: "forward",
        })?;
        posteriors.ensure_shape(input.shape(), "posteriors")?;
        if labels.len() != posteriors.rows() {
            return Err(Error::InvalidShape(format!(
                "{} labels given for a batch of {}",
                labels.len(),
                posteriors.rows()
            )));
        }

        let targets = one_hot(labels, self.n_classes)?;
        let mut down = posteriors.clone();
        down.sub_scaled(&targets, 1.0);
        Ok(down)
    }
}

fn softmax_in_place(row: &mut [f64]) {
    let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for v in row.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    for v in row.iter_mut() {
        *v /= sum;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;

    #[test]
    fn forward_rows_are_distributions() {
        let mut out = SoftmaxOutput::new(3).unwrap();
        let x = Matrix::from_rows(&[
            vec![0.0, 1.0, 2.0],
            vec![-5.0, 0.0, 5.0],
            vec![3.0, 3.0, 3.0],
        ])
        .unwrap();
        let p = out.forward(&x).unwrap();

        assert_eq!(p.shape(), (3, 3));
        for row in p.iter_rows() {
            assert_abs_diff_eq!(row.iter().sum::<f64>(), 1.0, epsilon = 1e-6);
            assert!(row.iter().all(|&v| (0.0..=1.0).contains(&v)));
        }
        assert_abs_diff_eq!(p.get(2, 0), 1.0 / 3.0, epsilon = 1e-12);
        assert!(p.get(0, 2) > p.get(0, 1) && p.get(0, 1) > p.get(0, 0));
    }

    #[test]
    fn forward_handles_large_scores() {
        let mut out = SoftmaxOutput::new(2).unwrap();
        let x = Matrix::from_rows(&[vec![1000.0, 999.0]]).unwrap();
        let p = out.forward(&x).unwrap();
        assert!(p.as_slice().iter().all(|v| v.is_finite()));
        assert_abs_diff_eq!(p.get(0, 0), 1.0 / (1.0 + (-1.0_f64).exp()), epsilon = 1e-12);
    }

    #[test]
    fn backward_is_zero_when_posteriors_equal_one_hot_labels() {
        let mut out = SoftmaxOutput::new(3).unwrap();
        out.forward(&Matrix::zeros(2, 3)).unwrap();

        let labels = [2, 0];
        let p = one_hot(&labels, 3).unwrap();
        let g = out.backward(&p, &labels).unwrap();
        assert!(g.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn backward_is_posteriors_minus_one_hot() {
        let mut out = SoftmaxOutput::new(2).unwrap();
        let p = out.forward(&Matrix::from_rows(&[vec![0.0, 0.0]]).unwrap()).unwrap();
        let g = out.backward(&p, &[1]).unwrap();
        assert_eq!(g.as_slice(), &[0.5, -0.5]);
    }

    #[test]
    fn backward_validates_priming_labels_and_shape() {
        let mut out = SoftmaxOutput::new(2).unwrap();
        let p = Matrix::from_rows(&[vec![0.5, 0.5]]).unwrap();
        assert!(matches!(
            out.backward(&p, &[0]),
            Err(Error::NotPrimed { .. })
        ));

        out.forward(&Matrix::zeros(1, 2)).unwrap();
        assert!(matches!(out.backward(&p, &[2]), Err(Error::InvalidData(_))));
        assert!(matches!(
            out.backward(&p, &[0, 1]),
            Err(Error::InvalidShape(_))
        ));
        assert!(matches!(
            out.backward(&Matrix::zeros(2, 2), &[0, 1]),
            Err(Error::InvalidShape(_))
        ));
    }
}
