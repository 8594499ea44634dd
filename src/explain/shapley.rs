//! Interventional Shapley attribution for one row against a background
//! reference row: every coalition is enumerated exactly for small feature
//! counts, and a permutation-sampling estimator takes over above that.

use super::{AttributionError, Explainer, RawAttribution, RawBaseline};
use crate::model::Classifier;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::Arc;

/// Feature count at or below which every coalition is enumerated.
pub const DEFAULT_EXACT_LIMIT: usize = 12;
/// Permutation draws used by the sampled estimator.
pub const DEFAULT_PERMUTATION_SAMPLES: usize = 200;

/// Shapley backend over any [`Classifier`], attributing the positive-class
/// probability relative to a fixed background row.
pub struct MarginalShapley {
    model: Arc<dyn Classifier>,
    background: Vec<f64>,
    exact_limit: usize,
    permutation_samples: usize,
    seed: u64,
}

impl MarginalShapley {
    /// `background` is the reference row attributions are measured against,
    /// in the same column order as prediction rows.
    pub fn new(model: Arc<dyn Classifier>, background: Vec<f64>) -> Self {
        Self {
            model,
            background,
            exact_limit: DEFAULT_EXACT_LIMIT,
            permutation_samples: DEFAULT_PERMUTATION_SAMPLES,
            seed: 0,
        }
    }

    pub fn with_exact_limit(mut self, exact_limit: usize) -> Self {
        self.exact_limit = exact_limit;
        self
    }

    pub fn with_permutation_samples(mut self, permutation_samples: usize) -> Self {
        self.permutation_samples = permutation_samples.max(1);
        self
    }

    /// Fixed sampling seed so repeated explanations of the same row agree.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Positive-class probability for one blended row.
    fn event_probability(&self, row: &[f64]) -> Result<f64, AttributionError> {
        let proba = self.model.predict_proba(row)?;
        proba
            .get(1)
            .copied()
            .ok_or_else(|| AttributionError::Backend("probability pair has no index 1".to_string()))
    }

    /// Exact Shapley values: evaluates all 2^n coalitions once, then folds
    /// the weighted marginal of each feature over every coalition excluding
    /// it. Feasible because the clinical models here stay in single digits
    /// of features.
    fn exact(&self, row: &[f64]) -> Result<Vec<f64>, AttributionError> {
        let n = row.len();
        let mut coalition_value = vec![0.0f64; 1 << n];
        let mut blended = self.background.clone();
        for mask in 0..(1usize << n) {
            for i in 0..n {
                blended[i] = if mask & (1 << i) != 0 {
                    row[i]
                } else {
                    self.background[i]
                };
            }
            coalition_value[mask] = self.event_probability(&blended)?;
        }

        // weight for a coalition of size s: s! (n-1-s)! / n!
        let mut weight = vec![0.0f64; n];
        for s in 0..n {
            weight[s] = factorial(s) * factorial(n - 1 - s) / factorial(n);
        }

        let mut phi = vec![0.0f64; n];
        for mask in 0..(1usize << n) {
            let s = (mask as u32).count_ones() as usize;
            for i in 0..n {
                if mask & (1 << i) == 0 {
                    phi[i] += weight[s] * (coalition_value[mask | (1 << i)] - coalition_value[mask]);
                }
            }
        }
        Ok(phi)
    }

    /// Permutation-sampling estimator. Each permutation walks the row in
    /// feature by feature and credits every feature its marginal step, so a
    /// single permutation's credits already telescope to f(x) - f(background);
    /// averaging keeps that sum exact.
    fn sampled(&self, row: &[f64]) -> Result<Vec<f64>, AttributionError> {
        let n = row.len();
        let baseline = self.event_probability(&self.background)?;
        let mut phi = vec![0.0f64; n];
        let mut order: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(self.seed);

        for _ in 0..self.permutation_samples {
            order.shuffle(&mut rng);
            let mut blended = self.background.clone();
            let mut previous = baseline;
            for &i in &order {
                blended[i] = row[i];
                let next = self.event_probability(&blended)?;
                phi[i] += next - previous;
                previous = next;
            }
        }
        for value in phi.iter_mut() {
            *value /= self.permutation_samples as f64;
        }
        Ok(phi)
    }

    fn positive_class_values(&self, row: &[f64]) -> Result<Vec<f64>, AttributionError> {
        if row.len() != self.background.len() {
            return Err(AttributionError::LengthMismatch {
                expected: self.background.len(),
                got: row.len(),
            });
        }
        if row.is_empty() {
            return Err(AttributionError::Backend("empty feature row".to_string()));
        }
        if row.len() <= self.exact_limit {
            self.exact(row)
        } else {
            self.sampled(row)
        }
    }
}

impl Explainer for MarginalShapley {
    /// Emits a per-class matrix: row 0 for survival, row 1 for death. For a
    /// binary model the two rows are exact negations.
    fn attribute(&self, row: &[f64]) -> Result<RawAttribution, AttributionError> {
        let death = self.positive_class_values(row)?;
        let survival: Vec<f64> = death.iter().map(|v| -v).collect();
        Ok(RawAttribution::PerClass(vec![survival, death]))
    }

    fn expected_value(&self) -> Result<RawBaseline, AttributionError> {
        let event = self.event_probability(&self.background)?;
        Ok(RawBaseline::PerClass(vec![1.0 - event, event]))
    }
}

fn factorial(n: usize) -> f64 {
    (1..=n).map(|i| i as f64).product()
}
