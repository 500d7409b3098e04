//! Mini-batch training loop.
//!
//! Every epoch draws a fresh permutation of the training indices, cuts it into
//! `N / batch_size` contiguous mini-batches of exactly `batch_size` instances (the remaining
//! `N % batch_size` instances sit that epoch out), and runs one `Network::update` per batch.
//! The epoch count is the only stopping condition.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{info, trace, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Dataset, Error, Matrix, Network, Result};

/// How the per-epoch permutation is drawn.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", content = "seed", rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shuffle {
    /// Reproducible permutations from a fixed seed.
    Seeded(u64),
    /// Permutations seeded from OS entropy.
    Entropy,
}

impl Shuffle {
    fn rng(self) -> StdRng {
        match self {
            Shuffle::Seeded(seed) => StdRng::seed_from_u64(seed),
            Shuffle::Entropy => StdRng::from_entropy(),
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub lr: f64,
    pub shuffle: Shuffle,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            epochs: 5,
            batch_size: 200,
            lr: 0.05,
            shuffle: Shuffle::Seeded(0),
        }
    }
}

impl FitConfig {
    /// `epochs == 0` is valid: training then runs no steps and reports no epochs.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be > 0".to_owned()));
        }
        if !(self.lr.is_finite() && self.lr > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "lr must be finite and > 0, got {}",
                self.lr
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpochReport {
    /// Zero-based epoch index.
    pub epoch: usize,
    pub batches: usize,
    /// Instances left out of this epoch because they did not fill a whole batch.
    pub dropped: usize,
    /// Mean of the per-batch losses, measured before each step's update.
    pub mean_loss: f64,
    /// Misclassification rate over the instances seen this epoch, measured before each step's
    /// update.
    ///
    /// `mean_loss` and `error_rate` are both `NaN` when no batch could be formed.
    pub error_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FitReport {
    pub epochs: Vec<EpochReport>,
}

impl FitReport {
    pub fn last(&self) -> Option<&EpochReport> {
        self.epochs.last()
    }
}

/// Partition a fresh permutation of `0..n` into `n / batch_size` mini-batches.
///
/// Each batch holds exactly `batch_size` distinct indices; no index repeats within the call.
pub fn epoch_batches<R: Rng + ?Sized>(
    n: usize,
    batch_size: usize,
    rng: &mut R,
) -> Result<Vec<Vec<usize>>> {
    if batch_size == 0 {
        return Err(Error::InvalidConfig("batch_size must be > 0".to_owned()));
    }

    let mut permutation: Vec<usize> = (0..n).collect();
    permutation.shuffle(rng);

    Ok(permutation
        .chunks_exact(batch_size)
        .map(<[usize]>::to_vec)
        .collect())
}

impl Network {
    /// Train on features `x` (one instance per row) and class labels `y`.
    ///
    /// The permutation RNG is built from `cfg.shuffle`.
    pub fn train(&mut self, x: &Matrix, y: &[usize], cfg: &FitConfig) -> Result<FitReport> {
        let mut rng = cfg.shuffle.rng();
        self.train_with_rng(x, y, cfg, &mut rng)
    }

    /// Train on a validated dataset.
    pub fn fit(&mut self, train: &Dataset, cfg: &FitConfig) -> Result<FitReport> {
        if train.n_classes() != self.n_classes() {
            return Err(Error::InvalidData(format!(
                "dataset has {} classes, network outputs {}",
                train.n_classes(),
                self.n_classes()
            )));
        }
        self.train(train.inputs(), train.labels(), cfg)
    }

    /// Same as [`Network::train`], drawing permutations from the caller's `rng`.
    ///
    /// `cfg.shuffle` is ignored.
    pub fn train_with_rng<R: Rng + ?Sized>(
        &mut self,
        x: &Matrix,
        y: &[usize],
        cfg: &FitConfig,
        rng: &mut R,
    ) -> Result<FitReport> {
        cfg.validate()?;
        if x.rows() != y.len() {
            return Err(Error::InvalidData(format!(
                "features/labels length mismatch: {} vs {}",
                x.rows(),
                y.len()
            )));
        }
        if x.cols() != self.n_features() {
            return Err(Error::InvalidData(format!(
                "train features {} do not match network n_features {}",
                x.cols(),
                self.n_features()
            )));
        }
        if let Some(&bad) = y.iter().find(|&&label| label >= self.n_classes()) {
            return Err(Error::InvalidData(format!(
                "label {bad} is out of range for {} classes",
                self.n_classes()
            )));
        }

        let n = x.rows();
        let n_batches = n / cfg.batch_size;
        let dropped = n - n_batches * cfg.batch_size;
        if n_batches == 0 {
            warn!(
                n,
                batch_size = cfg.batch_size,
                "batch_size exceeds the number of instances; no updates will run"
            );
        }

        let mut report = FitReport {
            epochs: Vec::with_capacity(cfg.epochs),
        };

        for epoch in 0..cfg.epochs {
            let mut loss_sum = 0.0;
            let mut wrong = 0;

            for (step, batch) in epoch_batches(n, cfg.batch_size, rng)?.iter().enumerate() {
                let xb = x.select_rows(batch)?;
                let yb: Vec<usize> = batch.iter().map(|&i| y[i]).collect();

                let stats = self.update(&xb, &yb, cfg.lr)?;
                trace!(
                    epoch,
                    step,
                    loss = stats.loss,
                    misclassified = stats.misclassified,
                    "step"
                );
                loss_sum += stats.loss;
                wrong += stats.misclassified;
            }

            let seen = n_batches * cfg.batch_size;
            let epoch_report = EpochReport {
                epoch,
                batches: n_batches,
                dropped,
                mean_loss: loss_sum / n_batches as f64,
                error_rate: wrong as f64 / seen as f64,
            };
            info!(
                epoch,
                batches = n_batches,
                dropped,
                mean_loss = epoch_report.mean_loss,
                error_rate = epoch_report.error_rate,
                "epoch"
            );
            report.epochs.push(epoch_report);
        }

        Ok(report)
    }
}
