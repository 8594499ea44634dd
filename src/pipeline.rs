//! One prediction request end to end: ordered row assembly, model call,
//! risk tier, then attribution in an isolated stage that can degrade the
//! outcome but never discard the prediction.

use crate::explain::{AttributionEngine, AttributionResult, Explainer};
use crate::model::ModelError;
use crate::predict::{PredictionResult, Predictor};
use crate::schema::{FeatureVector, ReconciledSchema};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Per-request failure. Everything here aborts the request; attribution
/// failures never reach this type.
#[derive(Debug)]
pub enum PipelineError {
    /// Reconciliation left model-required features undefined.
    SchemaIncomplete { missing: Vec<String> },
    /// Submitted keys differ from the reconciled order. Caught before the
    /// model runs; both lists are sorted for stable reporting.
    FeatureMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },
    /// The model call itself failed.
    Prediction(ModelError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::SchemaIncomplete { missing } => write!(
                f,
                "model requires features with no schema definition: {}",
                missing.join(", ")
            ),
            PipelineError::FeatureMismatch {
                missing,
                unexpected,
            } => write!(
                f,
                "submitted features do not match the model inputs (missing: [{}], unexpected: [{}])",
                missing.join(", "),
                unexpected.join(", ")
            ),
            PipelineError::Prediction(e) => write!(f, "prediction failed: {}", e),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Prediction(e) => Some(e),
            _ => None,
        }
    }
}

/// Attribution outcome attached to a prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Explanation {
    Available(AttributionResult),
    Unavailable { reason: String },
}

impl Explanation {
    pub fn is_available(&self) -> bool {
        matches!(self, Explanation::Available(_))
    }
}

/// Everything one request produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionOutcome {
    pub request_id: String,
    pub generated_at: DateTime<Utc>,
    pub prediction: PredictionResult,
    pub explanation: Explanation,
}

pub struct Pipeline {
    predictor: Predictor,
    explainer: Arc<dyn Explainer>,
    engine: AttributionEngine,
}

impl Pipeline {
    pub fn new(predictor: Predictor, explainer: Arc<dyn Explainer>) -> Self {
        Self {
            predictor,
            explainer,
            engine: AttributionEngine::new(),
        }
    }

    pub fn schema(&self) -> &ReconciledSchema {
        self.predictor.schema()
    }

    /// Run one submission through prediction and attribution.
    ///
    /// A prediction failure aborts the request. An attribution failure is
    /// logged and reported as [`Explanation::Unavailable`]; the prediction
    /// stands.
    pub fn run_one(&self, vector: &FeatureVector) -> Result<PredictionOutcome, PipelineError> {
        let request_id = Uuid::new_v4().to_string();

        let row = self.predictor.ordered_row(vector)?;
        let prediction = self.predictor.predict_row(&row)?;
        tracing::info!(
            request_id = %request_id,
            death_probability = prediction.death_probability,
            risk_tier = prediction.risk_tier.as_str(),
            "prediction complete"
        );

        let explanation = match self.engine.explain_one(
            self.explainer.as_ref(),
            self.predictor.schema(),
            &row,
        ) {
            Ok(result) => Explanation::Available(result),
            Err(e) => {
                tracing::warn!(
                    request_id = %request_id,
                    error = %e,
                    "attribution failed; explanation unavailable"
                );
                Explanation::Unavailable {
                    reason: e.to_string(),
                }
            }
        };

        Ok(PredictionOutcome {
            request_id,
            generated_at: Utc::now(),
            prediction,
            explanation,
        })
    }
}
