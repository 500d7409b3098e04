//! Layers.
//!
//! A network is an ordered stack of [`Layer`]s. Every layer speaks the same three-step
//! protocol, run once per mini-batch:
//!
//! 1. `forward(input)` caches `input` and returns the layer output.
//! 2. `backward(upstream)` turns the gradient w.r.t. the output into the gradient w.r.t. the
//!    cached input (and, for [`Linear`], records parameter gradients).
//! 3. `update(lr)` applies the recorded parameter gradients (a no-op without parameters).
//!
//! The cache is a single slot: each `forward` overwrites it. Calling a step before the one it
//! depends on returns [`Error::NotPrimed`](crate::Error::NotPrimed) instead of computing with
//! stale state.

mod linear;
mod output;
mod relu;

pub use linear::{INIT_STD, Linear};
pub use output::SoftmaxOutput;
pub use relu::Relu;

use std::fmt;

use crate::{Error, Matrix, Result};

/// The gradient source handed to [`Layer::backward`].
#[derive(Debug, Clone, Copy)]
pub enum Upstream<'a> {
    /// Gradient of the loss w.r.t. the layer output, from the layer after it.
    Gradient(&'a Matrix),
    /// Predictions and true class indices; only the output layer starts backprop from these.
    Targets {
        posteriors: &'a Matrix,
        labels: &'a [usize],
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Linear,
    Relu,
    Output,
}

impl LayerKind {
    pub fn name(self) -> &'static str {
        match self {
            LayerKind::Linear => "linear",
            LayerKind::Relu => "relu",
            LayerKind::Output => "softmax output",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
pub enum Layer {
    Linear(Linear),
    Relu(Relu),
    Output(SoftmaxOutput),
}

impl Layer {
    #[inline]
    pub fn kind(&self) -> LayerKind {
        match self {
            Layer::Linear(_) => LayerKind::Linear,
            Layer::Relu(_) => LayerKind::Relu,
            Layer::Output(_) => LayerKind::Output,
        }
    }

    /// Number of trainable scalars.
    pub fn param_count(&self) -> usize {
        match self {
            Layer::Linear(l) => l.n_inputs() * l.n_outputs() + l.n_outputs(),
            Layer::Relu(_) | Layer::Output(_) => 0,
        }
    }

    pub fn forward(&mut self, input: &Matrix) -> Result<Matrix> {
        match self {
            Layer::Linear(l) => l.forward(input),
            Layer::Relu(l) => l.forward(input),
            Layer::Output(l) => l.forward(input),
        }
    }

    pub fn backward(&mut self, upstream: Upstream<'_>) -> Result<Matrix> {
        match (self, upstream) {
            (Layer::Linear(l), Upstream::Gradient(g)) => l.backward(g),
            (Layer::Relu(l), Upstream::Gradient(g)) => l.backward(g),
            (Layer::Output(l), Upstream::Targets { posteriors, labels }) => {
                l.backward(posteriors, labels)
            }
            (layer, Upstream::Gradient(_)) => Err(Error::InvalidConfig(format!(
                "{} layer starts backprop from targets, not from a gradient",
                layer.kind()
            ))),
            (layer, Upstream::Targets { .. }) => Err(Error::InvalidConfig(format!(
                "{} layer expects an upstream gradient, not targets",
                layer.kind()
            ))),
        }
    }

    pub fn update(&mut self, lr: f64) -> Result<()> {
        match self {
            Layer::Linear(l) => l.update(lr),
            // Parameter-free.
            Layer::Relu(_) | Layer::Output(_) => Ok(()),
        }
    }

    pub fn as_linear(&self) -> Option<&Linear> {
        match self {
            Layer::Linear(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_linear_mut(&mut self) -> Option<&mut Linear> {
        match self {
            Layer::Linear(l) => Some(l),
            _ => None,
        }
    }
}

impl From<Linear> for Layer {
    fn from(value: Linear) -> Self {
        Layer::Linear(value)
    }
}

impl From<Relu> for Layer {
    fn from(value: Relu) -> Self {
        Layer::Relu(value)
    }
}

impl From<SoftmaxOutput> for Layer {
    fn from(value: SoftmaxOutput) -> Self {
        Layer::Output(value)
    }
}
