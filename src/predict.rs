//! Single-row prediction: submitted keys checked against the reconciled
//! order, probability pair read from the model, risk tier attached.

use crate::model::{Classifier, ModelError};
use crate::pipeline::PipelineError;
use crate::risk::RiskTier;
use crate::schema::{FeatureVector, ReconciledSchema};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Prediction for one submission, in display units (percent).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub death_probability: f64,
    pub survival_probability: f64,
    pub risk_tier: RiskTier,
}

pub struct Predictor {
    model: Arc<dyn Classifier>,
    schema: ReconciledSchema,
}

impl Predictor {
    pub fn new(model: Arc<dyn Classifier>, schema: ReconciledSchema) -> Self {
        Self { model, schema }
    }

    pub fn schema(&self) -> &ReconciledSchema {
        &self.schema
    }

    /// Assemble the model input row in reconciled column order.
    ///
    /// Fails before any model call when the submitted key set differs from
    /// the reconciled order in either direction, or when reconciliation left
    /// the schema inoperable.
    pub fn ordered_row(&self, vector: &FeatureVector) -> Result<Vec<f64>, PipelineError> {
        if !self.schema.is_operable() {
            return Err(PipelineError::SchemaIncomplete {
                missing: self.schema.missing().to_vec(),
            });
        }

        let mut row = Vec::with_capacity(self.schema.len());
        let mut missing = Vec::new();
        for spec in self.schema.specs() {
            match vector.get(&spec.name) {
                Some(value) => row.push(value),
                None => missing.push(spec.name.clone()),
            }
        }
        let mut unexpected: Vec<String> = vector
            .names()
            .filter(|name| self.schema.spec(name).is_none())
            .map(str::to_string)
            .collect();

        if !missing.is_empty() || !unexpected.is_empty() {
            missing.sort();
            unexpected.sort();
            return Err(PipelineError::FeatureMismatch {
                missing,
                unexpected,
            });
        }
        Ok(row)
    }

    /// Run the model on an already-ordered row.
    ///
    /// The death probability is index 1 of the probability pair, scaled to
    /// percent. The class label is also computed and logged, matching the
    /// trained pipeline's own reporting.
    pub fn predict_row(&self, row: &[f64]) -> Result<PredictionResult, PipelineError> {
        let label = self.model.predict(row).map_err(PipelineError::Prediction)?;
        tracing::debug!(label, "predicted class");

        let proba = self
            .model
            .predict_proba(row)
            .map_err(PipelineError::Prediction)?;
        if proba.len() < 2 {
            return Err(PipelineError::Prediction(ModelError::MalformedOutput {
                expected: 2,
                got: proba.len(),
            }));
        }
        let p_death = proba[1];
        if !p_death.is_finite() || !(0.0..=1.0).contains(&p_death) {
            return Err(PipelineError::Prediction(ModelError::InvalidProbability(
                p_death,
            )));
        }

        let death_probability = p_death * 100.0;
        Ok(PredictionResult {
            death_probability,
            survival_probability: 100.0 - death_probability,
            risk_tier: RiskTier::from_probability(death_probability),
        })
    }

    /// Predict one submission end to end.
    pub fn predict_one(&self, vector: &FeatureVector) -> Result<PredictionResult, PipelineError> {
        let row = self.ordered_row(vector)?;
        self.predict_row(&row)
    }
}
