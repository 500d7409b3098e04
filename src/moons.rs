//! Two interleaving half circles ("moons"), a standard non-linearly separable toy problem.

use std::f64::consts::PI;

use rand::Rng;
use rand::seq::SliceRandom;
use rand_distr::{Distribution, Normal};

use crate::{Dataset, Error, Matrix, Result};

/// Generate `n` shuffled points on two moons with Gaussian noise of standard deviation `noise`.
///
/// - class 0: `n / 2` points on the upper half circle `(cos t, sin t)`
/// - class 1: the remaining points on `(1 - cos t, 1 - sin t - 0.5)`
///
/// with `t` evenly spaced over `[0, π]` within each class.
pub fn make_moons<R: Rng + ?Sized>(n: usize, noise: f64, rng: &mut R) -> Result<Dataset> {
    if n == 0 {
        return Err(Error::InvalidConfig("make_moons needs n > 0".to_owned()));
    }
    if !(noise.is_finite() && noise >= 0.0) {
        return Err(Error::InvalidConfig(format!(
            "moons noise must be finite and >= 0, got {noise}"
        )));
    }
    let normal = Normal::new(0.0, noise)
        .map_err(|e| Error::InvalidConfig(format!("moons noise {noise}: {e}")))?;

    let n_outer = n / 2;
    let n_inner = n - n_outer;

    let mut points = Vec::with_capacity(n);
    for t in linspace(0.0, PI, n_outer) {
        points.push(([t.cos(), t.sin()], 0));
    }
    for t in linspace(0.0, PI, n_inner) {
        points.push(([1.0 - t.cos(), 1.0 - t.sin() - 0.5], 1));
    }
    points.shuffle(rng);

    let mut features = Vec::with_capacity(2 * n);
    let mut labels = Vec::with_capacity(n);
    for ([x, y], label) in points {
        features.push(x + normal.sample(rng));
        features.push(y + normal.sample(rng));
        labels.push(label);
    }

    Dataset::new(Matrix::from_flat(features, 2)?, labels, 2)
}

fn linspace(start: f64, end: f64, count: usize) -> impl Iterator<Item = f64> {
    let step = if count > 1 {
        (end - start) / (count - 1) as f64
    } else {
        0.0
    };
    (0..count).map(move |i| start + step * i as f64)
}
