//! Online per-channel mean/variance tracker used to scale a network's
//! inputs. One instance lives on each [`crate::network::Network`] that
//! opts in via `NeuralNetwork.use_normalizer`; it is touched only by the
//! worker evaluating that network's owning genome (spec.md §4.2).

use serde::{Deserialize, Serialize};

const VARIANCE_FLOOR: f64 = 1e-2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Normalizer {
    dimension: usize,
    n: f64,
    mean: Vec<f64>,
    m2: Vec<f64>,
}

impl Normalizer {
    pub fn new(dimension: usize) -> Self {
        Normalizer {
            dimension,
            n: 0.0,
            mean: vec![0.0; dimension],
            m2: vec![0.0; dimension],
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Updates the running mean/variance with a fresh observation using
    /// Welford's online algorithm.
    pub fn observe(&mut self, x: &[f64]) {
        debug_assert_eq!(x.len(), self.dimension);
        self.n += 1.0;
        for i in 0..self.dimension {
            let prev_mean = self.mean[i];
            self.mean[i] += (x[i] - prev_mean) / self.n;
            self.m2[i] += (x[i] - prev_mean) * (x[i] - self.mean[i]);
        }
    }

    /// Per-channel variance, floored at `1e-2` so a constant channel never
    /// drives `normalize` toward a division blow-up.
    pub fn variance(&self) -> Vec<f64> {
        if self.n < 1.0 {
            return vec![VARIANCE_FLOOR; self.dimension];
        }
        self.m2
            .iter()
            .map(|&m2| (m2 / self.n).max(VARIANCE_FLOOR))
            .collect()
    }

    pub fn normalize(&self, x: &[f64]) -> Vec<f64> {
        debug_assert_eq!(x.len(), self.dimension);
        let variance = self.variance();
        x.iter()
            .zip(self.mean.iter())
            .zip(variance.iter())
            .map(|((&xi, &mean), &var)| (xi - mean) / var.sqrt())
            .collect()
    }
}
