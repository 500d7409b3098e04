use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::matmul::{matmul, matmul_a_bt, matmul_at_b};
use crate::{Error, Matrix, Result};

/// Standard deviation of the normal distribution weights and biases are drawn from.
pub const INIT_STD: f64 = 0.01;

/// Fully connected layer: `output = input · W + b`.
///
/// `W` has shape `(n_inputs, n_outputs)` and `b` has length `n_outputs`; the bias is
/// broadcast over the batch dimension.
#[derive(Debug, Clone)]
pub struct Linear {
    weights: Matrix,
    biases: Vec<f64>,
    input: Option<Matrix>,
    grads: Option<LinearGrads>,
}

/// Parameter gradients recorded by `backward` and consumed by `update`.
#[derive(Debug, Clone)]
struct LinearGrads {
    weights: Matrix,
    biases: Vec<f64>,
}

impl Linear {
    /// Build a layer with parameters sampled from `N(0, INIT_STD)`.
    pub fn new_with_rng<R: Rng + ?Sized>(
        n_inputs: usize,
        n_outputs: usize,
        rng: &mut R,
    ) -> Result<Self> {
        if n_inputs == 0 || n_outputs == 0 {
            return Err(Error::InvalidConfig(format!(
                "linear layer dims must be > 0, got n_inputs={n_inputs} n_outputs={n_outputs}"
            )));
        }

        let normal = Normal::new(0.0, INIT_STD)
            .map_err(|e| Error::InvalidConfig(format!("weight init distribution: {e}")))?;

        let weights: Vec<f64> = (0..n_inputs * n_outputs)
            .map(|_| normal.sample(rng))
            .collect();
        let biases: Vec<f64> = (0..n_outputs).map(|_| normal.sample(rng)).collect();

        Self::from_parts(Matrix::from_flat(weights, n_outputs)?, biases)
    }

    /// Build a layer from explicit parameters.
    pub fn from_parts(weights: Matrix, biases: Vec<f64>) -> Result<Self> {
        if weights.is_empty() {
            return Err(Error::InvalidConfig(
                "linear layer weights must not be empty".to_owned(),
            ));
        }
        if biases.len() != weights.cols() {
            return Err(Error::InvalidShape(format!(
                "biases length {} does not match weight columns {}",
                biases.len(),
                weights.cols()
            )));
        }

        Ok(Self {
            weights,
            biases,
            input: None,
            grads: None,
        })
    }

    #[inline]
    pub fn n_inputs(&self) -> usize {
        self.weights.rows()
    }

    #[inline]
    pub fn n_outputs(&self) -> usize {
        self.weights.cols()
    }

    #[inline]
    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    #[inline]
    pub fn biases(&self) -> &[f64] {
        &self.biases
    }

    #[inline]
    pub fn weights_mut(&mut self) -> &mut Matrix {
        &mut self.weights
    }

    #[inline]
    pub fn biases_mut(&mut self) -> &mut [f64] {
        &mut self.biases
    }

    /// Weight gradient from the latest `backward`, if not yet consumed by `update`.
    pub fn grad_weights(&self) -> Option<&Matrix> {
        self.grads.as_ref().map(|g| &g.weights)
    }

    /// Bias gradient from the latest `backward`, if not yet consumed by `update`.
    pub fn grad_biases(&self) -> Option<&[f64]> {
        self.grads.as_ref().map(|g| g.biases.as_slice())
    }

    /// Forward pass for a batch with shape `(batch, n_inputs)`.
    pub fn forward(&mut self, input: &Matrix) -> Result<Matrix> {
        if input.cols() != self.n_inputs() {
            return Err(Error::InvalidShape(format!(
                "linear layer expects {} input features, got {}",
                self.n_inputs(),
                input.cols()
            )));
        }

        let mut out = matmul(input, &self.weights)?;
        for r in 0..out.rows() {
            for (v, &b) in out.row_mut(r).iter_mut().zip(&self.biases) {
                *v += b;
            }
        }

        self.input = Some(input.clone());
        Ok(out)
    }

    /// Backward pass.
    ///
    /// With upstream gradient `G: (batch, n_outputs)` and cached input `X`:
    /// - `grad_b = mean over batch of G`
    /// - `grad_W = Xᵀ · G` (summed over the batch)
    /// - returns `G · Wᵀ`, shape `(batch, n_inputs)`
    pub fn backward(&mut self, upstream: &Matrix) -> Result<Matrix> {
        let input = self.input.as_ref().ok_or(Error::NotPrimed {
            layer: "linear",
            needs: "forward",
        })?;
        upstream.ensure_shape((input.rows(), self.n_outputs()), "upstream gradient")?;
        if upstream.rows() == 0 {
            return Err(Error::InvalidShape(
                "upstream gradient must have at least one row".to_owned(),
            ));
        }

        let inv_batch = 1.0 / upstream.rows() as f64;
        let mut grad_b = vec![0.0; self.n_outputs()];
        for row in upstream.iter_rows() {
            for (acc, &g) in grad_b.iter_mut().zip(row) {
                *acc += g;
            }
        }
        for v in &mut grad_b {
            *v *= inv_batch;
        }

        let grad_w = matmul_at_b(input, upstream)?;
        let downstream = matmul_a_bt(upstream, &self.weights)?;

        self.grads = Some(LinearGrads {
            weights: grad_w,
            biases: grad_b,
        });
        Ok(downstream)
    }

    /// Gradient descent step: `W -= lr * grad_W`, `b -= lr * grad_b`.
    ///
    /// Consumes the gradients recorded by the latest `backward`.
    pub fn update(&mut self, lr: f64) -> Result<()> {
        if !(lr.is_finite() && lr > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "learning rate must be finite and > 0, got {lr}"
            )));
        }
        let grads = self.grads.take().ok_or(Error::NotPrimed {
            layer: "linear",
            needs: "backward",
        })?;

        self.weights.sub_scaled(&grads.weights, lr);
        for (b, g) in self.biases.iter_mut().zip(grads.biases) {
            *b -= lr * g;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn fixed_layer() -> Linear {
        // W: (2, 3), b: (3,)
        let w = Matrix::from_rows(&[vec![1.0, 0.0, -1.0], vec![2.0, 1.0, 0.5]]).unwrap();
        Linear::from_parts(w, vec![0.1, 0.2, 0.3]).unwrap()
    }

    #[test]
    fn forward_broadcasts_bias_over_batch() {
        let mut layer = fixed_layer();
        let x = Matrix::from_rows(&[vec![1.0, 1.0], vec![0.0, 2.0], vec![-1.0, 0.0]]).unwrap();
        let y = layer.forward(&x).unwrap();

        assert_eq!(y.shape(), (3, 3));
        assert_abs_diff_eq!(y.row(0)[0], 3.1, epsilon = 1e-12);
        assert_abs_diff_eq!(y.row(1)[1], 2.2, epsilon = 1e-12);
        assert_abs_diff_eq!(y.row(2)[2], 1.3, epsilon = 1e-12);
    }

    #[test]
    fn backward_gradient_shapes_follow_parameters_and_input() {
        let mut layer = fixed_layer();
        let x = Matrix::from_rows(&[vec![1.0, 1.0], vec![0.0, 2.0]]).unwrap();
        layer.forward(&x).unwrap();

        let g = Matrix::from_rows(&[vec![1.0, 0.0, 2.0], vec![3.0, 1.0, 0.0]]).unwrap();
        let down = layer.backward(&g).unwrap();

        assert_eq!(down.shape(), x.shape());
        assert_eq!(layer.grad_weights().unwrap().shape(), layer.weights().shape());
        assert_eq!(layer.grad_biases().unwrap().len(), layer.biases().len());

        // grad_b is the batch mean, grad_W the batch sum.
        assert_eq!(layer.grad_biases().unwrap(), &[2.0, 0.5, 1.0]);
        let gw = layer.grad_weights().unwrap();
        assert_eq!(gw.row(0), &[1.0, 0.0, 2.0]);
        assert_eq!(gw.row(1), &[7.0, 2.0, 2.0]);

        // G · Wᵀ for the first instance: [1*1 + 0*0 + 2*-1, 1*2 + 0*1 + 2*0.5]
        assert_eq!(down.row(0), &[-1.0, 3.0]);
    }

    #[test]
    fn update_applies_and_consumes_gradients() {
        let mut layer = fixed_layer();
        let x = Matrix::from_rows(&[vec![1.0, 0.0]]).unwrap();
        layer.forward(&x).unwrap();
        layer
            .backward(&Matrix::from_rows(&[vec![1.0, 1.0, 1.0]]).unwrap())
            .unwrap();
        layer.update(0.5).unwrap();

        assert_eq!(layer.weights().row(0), &[0.5, -0.5, -1.5]);
        assert_eq!(layer.weights().row(1), &[2.0, 1.0, 0.5]);
        assert_abs_diff_eq!(layer.biases()[0], -0.4, epsilon = 1e-12);
        assert!(layer.grad_weights().is_none());

        let err = layer.update(0.5).unwrap_err();
        assert_eq!(
            err,
            Error::NotPrimed {
                layer: "linear",
                needs: "backward"
            }
        );
    }

    #[test]
    fn backward_before_forward_is_not_primed() {
        let mut layer = fixed_layer();
        let g = Matrix::zeros(1, 3);
        assert!(matches!(
            layer.backward(&g),
            Err(Error::NotPrimed { needs: "forward", .. })
        ));
    }

    #[test]
    fn forward_rejects_wrong_feature_width() {
        let mut layer = fixed_layer();
        let x = Matrix::zeros(4, 3);
        assert!(matches!(layer.forward(&x), Err(Error::InvalidShape(_))));
    }

    #[test]
    fn update_rejects_non_positive_learning_rate() {
        let mut layer = fixed_layer();
        assert!(layer.update(0.0).is_err());
        assert!(layer.update(f64::NAN).is_err());
    }

    #[test]
    fn random_init_is_small_and_seeded() {
        let a = Linear::new_with_rng(30, 40, &mut StdRng::seed_from_u64(7)).unwrap();
        let b = Linear::new_with_rng(30, 40, &mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(a.weights(), b.weights());
        assert_eq!(a.biases(), b.biases());

        let w = a.weights().as_slice();
        let mean = w.iter().sum::<f64>() / w.len() as f64;
        let var = w.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / w.len() as f64;
        assert!(mean.abs() < 0.005, "mean {mean}");
        assert!((var.sqrt() - INIT_STD).abs() < 0.002, "std {}", var.sqrt());

        assert!(Linear::new_with_rng(0, 3, &mut StdRng::seed_from_u64(0)).is_err());
    }
}
