//! A small MLP (multi-layer perceptron) trained by mini-batch backpropagation.
//!
//! `backprop-mlp` is a from-scratch classifier meant to be read: a network is an ordered
//! stack of layers, and training is nothing more than `forward`, `backward` and `update`
//! applied to each layer in turn.
//!
//! # The layer protocol
//!
//! - [`Linear`]: `input · W + b`, the only layer with parameters.
//! - [`Relu`]: element-wise `max(0, x)`.
//! - [`SoftmaxOutput`]: row-wise softmax; its backward pass is the closed-form softmax +
//!   cross-entropy derivative `posteriors - one_hot(labels)`.
//!
//! [`Network::new`] builds `Linear → Relu` for every width but the last, and
//! `Linear → SoftmaxOutput` for the last width (the number of classes).
//!
//! Each layer caches the input of its latest `forward`. Out-of-order calls (`backward` before
//! `forward`, `update` before `backward`) return [`Error::NotPrimed`].
//!
//! # Data layout and shapes
//!
//! - Scalars are `f64`.
//! - Batches are [`Matrix`] values with shape `(batch_size, n_features)`, row-major.
//! - `W` has shape `(n_inputs, n_outputs)`.
//! - Labels are class indices in `[0, n_classes)`.
//!
//! # Randomness
//!
//! Weight initialization and the per-epoch permutation draw from explicit generators:
//! [`Network::new_with_seed`] / [`Network::new_with_rng`] and [`Shuffle::Seeded`] /
//! [`Network::train_with_rng`]. With fixed seeds, training is bit-for-bit reproducible.
//!
//! # Logging
//!
//! Training emits [`tracing`] events (`info` per epoch, `trace` per mini-batch). Install a
//! subscriber in your binary to see them.

//! # Quick start
//!
//! ```rust
//! use backprop_mlp::{FitConfig, MinMaxScaler, Network, Shuffle, moons};
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! # fn main() -> backprop_mlp::Result<()> {
//! let mut rng = StdRng::seed_from_u64(0);
//! let data = moons::make_moons(200, 0.05, &mut rng)?;
//! let scaler = MinMaxScaler::fit(data.inputs())?;
//! let scaled = scaler.transform(data.inputs())?;
//! let train = data.with_inputs(scaled)?;
//!
//! let mut net = Network::new_with_seed(2, &[8, 2], 0)?;
//! let report = net.fit(
//!     &train,
//!     &FitConfig {
//!         epochs: 20,
//!         batch_size: 20,
//!         lr: 0.05,
//!         shuffle: Shuffle::Seeded(0),
//!     },
//! )?;
//! assert_eq!(report.epochs.len(), 20);
//!
//! let error = net.error_rate(train.inputs(), train.labels())?;
//! assert!((0.0..=1.0).contains(&error));
//! # Ok(())
//! # }
//! ```

//! # Driving the protocol by hand
//!
//! ```rust
//! use backprop_mlp::{Matrix, Network};
//!
//! # fn main() -> backprop_mlp::Result<()> {
//! let mut net = Network::new_with_seed(3, &[4, 2], 0)?;
//! let x = Matrix::from_rows(&[vec![0.1, -0.2, 0.3], vec![0.5, 0.0, -0.5]])?;
//! let y = [0, 1];
//!
//! let posteriors = net.forward(&x)?;
//! net.backward(&posteriors, &y)?;
//! for layer in 0..net.num_layers() {
//!     if let Some(layer) = net.layer_mut(layer) {
//!         layer.update(0.05)?;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod data;
pub mod error;
pub mod experiment;
pub mod layer;
pub mod loss;
pub(crate) mod matmul;
pub mod matrix;
pub mod metrics;
pub mod moons;
pub mod network;
pub mod train;

pub use data::{Dataset, MinMaxScaler};
pub use error::{Error, Result};
pub use experiment::{ExperimentConfig, ExperimentOutcome, run_experiment};
pub use layer::{Layer, LayerKind, Linear, Relu, SoftmaxOutput, Upstream};
pub use matrix::Matrix;
pub use network::{Network, StepReport};
pub use train::{EpochReport, FitConfig, FitReport, Shuffle, epoch_batches};
