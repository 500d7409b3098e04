use crate::{Error, Matrix, Result};

/// Element-wise `max(0, x)`. NaN inputs pass through as NaN.
#[derive(Debug, Clone, Default)]
pub struct Relu {
    input: Option<Matrix>,
}

impl Relu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn forward(&mut self, input: &Matrix) -> Result<Matrix> {
        let out = input.map(|x| if x > 0.0 || x.is_nan() { x } else { 0.0 });
        self.input = Some(input.clone());
        Ok(out)
    }

    /// Passes the upstream gradient where the cached input was strictly positive.
    ///
    /// The subgradient at exactly `0` is taken as `0`; a NaN input blocks the gradient.
    pub fn backward(&mut self, upstream: &Matrix) -> Result<Matrix> {
        let input = self.input.as_ref().ok_or(Error::NotPrimed {
            layer: "relu",
            needs: "forward",
        })?;
        upstream.ensure_shape(input.shape(), "upstream gradient")?;

        let mut down = upstream.clone();
        for (g, &x) in down.as_mut_slice().iter_mut().zip(input.as_slice()) {
            if x.is_nan() || x <= 0.0 {
                *g = 0.0;
            }
        }
        Ok(down)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_clamps_negatives_and_keeps_shape() {
        let mut relu = Relu::new();
        let x = Matrix::from_rows(&[vec![-2.0, 0.0, 3.0], vec![1.5, -0.1, 0.0]]).unwrap();
        let y = relu.forward(&x).unwrap();
        assert_eq!(y.shape(), x.shape());
        assert_eq!(y.as_slice(), &[0.0, 0.0, 3.0, 1.5, 0.0, 0.0]);
    }

    #[test]
    fn backward_gates_gradient_by_input_sign_with_zero_at_zero() {
        let mut relu = Relu::new();
        let x = Matrix::from_rows(&[vec![-2.0, 0.0, 3.0]]).unwrap();
        relu.forward(&x).unwrap();

        let g = Matrix::from_rows(&[vec![5.0, 7.0, 11.0]]).unwrap();
        let down = relu.backward(&g).unwrap();
        // negative -> 0, exactly zero -> 0, positive -> passthrough
        assert_eq!(down.as_slice(), &[0.0, 0.0, 11.0]);
    }

    #[test]
    fn nan_input_stays_nan_forward_and_blocks_gradient_backward() {
        let mut relu = Relu::new();
        let x = Matrix::from_rows(&[vec![f64::NAN, 1.0]]).unwrap();
        let y = relu.forward(&x).unwrap();
        assert!(y.get(0, 0).is_nan());
        assert_eq!(y.get(0, 1), 1.0);

        let g = Matrix::from_rows(&[vec![5.0, 7.0]]).unwrap();
        let down = relu.backward(&g).unwrap();
        assert_eq!(down.as_slice(), &[0.0, 7.0]);
    }

    #[test]
    fn backward_checks_priming_and_shape() {
        let mut relu = Relu::new();
        assert!(matches!(
            relu.backward(&Matrix::zeros(1, 1)),
            Err(Error::NotPrimed { layer: "relu", .. })
        ));

        relu.forward(&Matrix::zeros(2, 2)).unwrap();
        assert!(matches!(
            relu.backward(&Matrix::zeros(2, 3)),
            Err(Error::InvalidShape(_))
        ));
    }
}
