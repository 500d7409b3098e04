use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::layer::Upstream;
use crate::{Error, Layer, Linear, Matrix, Relu, Result, SoftmaxOutput, loss, metrics};

/// A feed-forward classifier: `Linear → ReLU` blocks followed by `Linear → softmax`.
///
/// The layer stack is fixed at construction.
#[derive(Debug, Clone)]
pub struct Network {
    n_features: usize,
    layers: Vec<Layer>,
}

/// What one `update` step observed on its mini-batch, before the parameters moved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    pub batch_size: usize,
    /// Mean cross-entropy of the batch.
    pub loss: f64,
    /// Instances whose argmax prediction differs from the label.
    pub misclassified: usize,
}

impl Network {
    /// Build a network seeded from OS entropy.
    ///
    /// `layer_sizes[k]` is the width of block `k`; the last entry is the number of classes.
    pub fn new(n_features: usize, layer_sizes: &[usize]) -> Result<Self> {
        let mut rng = StdRng::from_entropy();
        Self::new_with_rng(n_features, layer_sizes, &mut rng)
    }

    pub fn new_with_seed(n_features: usize, layer_sizes: &[usize], seed: u64) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::new_with_rng(n_features, layer_sizes, &mut rng)
    }

    pub fn new_with_rng<R: Rng + ?Sized>(
        n_features: usize,
        layer_sizes: &[usize],
        rng: &mut R,
    ) -> Result<Self> {
        if n_features == 0 {
            return Err(Error::InvalidConfig("n_features must be > 0".to_owned()));
        }
        let Some((&n_classes, hidden)) = layer_sizes.split_last() else {
            return Err(Error::InvalidConfig(
                "layer_sizes must name at least the output width".to_owned(),
            ));
        };
        if layer_sizes.contains(&0) {
            return Err(Error::InvalidConfig(
                "all layer sizes must be > 0".to_owned(),
            ));
        }

        let mut layers = Vec::with_capacity(2 * layer_sizes.len());
        let mut n_in = n_features;
        for &n_out in hidden {
            layers.push(Linear::new_with_rng(n_in, n_out, rng)?.into());
            layers.push(Relu::new().into());
            n_in = n_out;
        }
        layers.push(Linear::new_with_rng(n_in, n_classes, rng)?.into());
        layers.push(SoftmaxOutput::new(n_classes)?.into());

        debug!(
            n_features,
            ?layer_sizes,
            num_layers = layers.len(),
            "built network"
        );
        Ok(Self { n_features, layers })
    }

    #[inline]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        match self.layers.last() {
            Some(Layer::Output(out)) => out.n_classes(),
            _ => 0,
        }
    }

    #[inline]
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    #[inline]
    pub fn layer(&self, idx: usize) -> Option<&Layer> {
        self.layers.get(idx)
    }

    #[inline]
    pub fn layer_mut(&mut self, idx: usize) -> Option<&mut Layer> {
        self.layers.get_mut(idx)
    }

    /// Total number of trainable scalars.
    pub fn param_count(&self) -> usize {
        self.layers.iter().map(Layer::param_count).sum()
    }

    /// Forward pass over a batch with shape `(batch, n_features)`.
    ///
    /// Every layer caches its input for the following `backward`.
    pub fn forward(&mut self, x: &Matrix) -> Result<Matrix> {
        if x.cols() != self.n_features {
            return Err(Error::InvalidShape(format!(
                "batch has {} features, network expects {}",
                x.cols(),
                self.n_features
            )));
        }

        let mut layers = self.layers.iter_mut();
        let Some(first) = layers.next() else {
            return Err(Error::InvalidConfig("network has no layers".to_owned()));
        };
        let mut out = first.forward(x)?;
        for layer in layers {
            out = layer.forward(&out)?;
        }
        Ok(out)
    }

    /// Forward pass over instances of any rank; `shape[0]` is the batch dimension and the
    /// rest is flattened into the feature vector.
    pub fn forward_shaped(&mut self, data: Vec<f64>, shape: &[usize]) -> Result<Matrix> {
        let x = Matrix::from_shape(data, shape)?;
        self.forward(&x)
    }

    /// Backpropagate from the output layer down to the first layer.
    ///
    /// You must call `forward` first on the batch that produced `posteriors`.
    pub fn backward(&mut self, posteriors: &Matrix, labels: &[usize]) -> Result<()> {
        let Some((output, rest)) = self.layers.split_last_mut() else {
            return Err(Error::InvalidConfig("network has no layers".to_owned()));
        };

        let mut upstream = output.backward(Upstream::Targets { posteriors, labels })?;
        for layer in rest.iter_mut().rev() {
            upstream = layer.backward(Upstream::Gradient(&upstream))?;
        }
        Ok(())
    }

    /// One gradient descent step on the mini-batch `(x, y)`.
    pub fn update(&mut self, x: &Matrix, y: &[usize], lr: f64) -> Result<StepReport> {
        let posteriors = self.forward(x)?;

        let predicted = metrics::argmax_rows(&posteriors);
        let report = StepReport {
            batch_size: y.len(),
            loss: loss::cross_entropy(&posteriors, y)?,
            misclassified: metrics::misclassified(&predicted, y)?,
        };

        self.backward(&posteriors, y)?;
        for layer in &mut self.layers {
            layer.update(lr)?;
        }
        Ok(report)
    }

    /// Winner-takes-all class predictions.
    pub fn predict(&mut self, x: &Matrix) -> Result<Vec<usize>> {
        let posteriors = self.forward(x)?;
        Ok(metrics::argmax_rows(&posteriors))
    }

    /// Fraction of instances in `x` whose predicted class differs from `y`.
    pub fn error_rate(&mut self, x: &Matrix, y: &[usize]) -> Result<f64> {
        let predicted = self.predict(x)?;
        metrics::error_rate(&predicted, y)
    }
}
