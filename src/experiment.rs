//! End-to-end moons experiment.
//!
//! Generates train/test moons, scales both with the training statistics, then trains one
//! network per architecture and measures its error rates.

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Dataset, Error, FitConfig, FitReport, MinMaxScaler, Network, Result, moons};

const N_FEATURES: usize = 2;
const N_CLASSES: usize = 2;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentConfig {
    pub n_train: usize,
    pub n_test: usize,
    pub noise: f64,
    /// Seeds data generation and weight initialization.
    pub seed: u64,
    /// `layer_sizes` of each network to train; the last width must be 2.
    pub architectures: Vec<Vec<usize>>,
    pub fit: FitConfig,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            n_train: 2000,
            n_test: 2000,
            noise: 0.05,
            seed: 0,
            architectures: vec![vec![2, 2, 2], vec![3, 3, 2], vec![5, 5, 2], vec![30, 30, 2]],
            fit: FitConfig::default(),
        }
    }
}

impl ExperimentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.n_train == 0 || self.n_test == 0 {
            return Err(Error::InvalidConfig(
                "n_train and n_test must be > 0".to_owned(),
            ));
        }
        if !(self.noise.is_finite() && self.noise >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "noise must be finite and >= 0, got {}",
                self.noise
            )));
        }
        if self.architectures.is_empty() {
            return Err(Error::InvalidConfig(
                "at least one architecture is required".to_owned(),
            ));
        }
        for arch in &self.architectures {
            if arch.last() != Some(&N_CLASSES) {
                return Err(Error::InvalidConfig(format!(
                    "architecture {arch:?} must end in {N_CLASSES} output classes"
                )));
            }
        }
        self.fit.validate()
    }
}

#[derive(Debug, Clone)]
pub struct ExperimentOutcome {
    pub layer_sizes: Vec<usize>,
    pub train_error: f64,
    pub test_error: f64,
    pub report: FitReport,
}

/// Run the experiment described by `cfg`, one outcome per architecture, in order.
pub fn run_experiment(cfg: &ExperimentConfig) -> Result<Vec<ExperimentOutcome>> {
    cfg.validate()?;

    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let train = moons::make_moons(cfg.n_train, cfg.noise, &mut rng)?;
    let test = moons::make_moons(cfg.n_test, cfg.noise, &mut rng)?;

    let scaler = MinMaxScaler::fit(train.inputs())?;
    let train = scale(train, &scaler)?;
    let test = scale(test, &scaler)?;

    let mut outcomes = Vec::with_capacity(cfg.architectures.len());
    for layer_sizes in &cfg.architectures {
        let mut net = Network::new_with_rng(N_FEATURES, layer_sizes, &mut rng)?;
        let report = net.fit(&train, &cfg.fit)?;

        let train_error = net.error_rate(train.inputs(), train.labels())?;
        let test_error = net.error_rate(test.inputs(), test.labels())?;
        info!(?layer_sizes, train_error, test_error, "trained architecture");

        outcomes.push(ExperimentOutcome {
            layer_sizes: layer_sizes.clone(),
            train_error,
            test_error,
            report,
        });
    }
    Ok(outcomes)
}

fn scale(ds: Dataset, scaler: &MinMaxScaler) -> Result<Dataset> {
    let inputs = scaler.transform(ds.inputs())?;
    ds.with_inputs(inputs)
}
