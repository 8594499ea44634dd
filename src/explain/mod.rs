//! Per-instance feature attribution: the explainer contract, normalization
//! of the shapes a backend may emit, and selection of the displayed
//! contributors.

mod shapley;

pub use shapley::MarginalShapley;

use crate::schema::ReconciledSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Contributors kept for display, matching the deployed chart.
pub const TOP_K: usize = 7;
/// Headroom factor for the symmetric chart axis.
pub const AXIS_HEADROOM: f64 = 1.2;
/// Baseline substituted when the backend reports a non-finite expected value.
pub const NEUTRAL_BASELINE: f64 = 0.5;
/// Class row read from multi-class outputs: the event of interest.
const EVENT_CLASS: usize = 1;

/// Single-output wrapper some backends produce instead of a bare array.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleOutput {
    pub values: Vec<f64>,
}

/// Raw per-feature scores as a backend emits them, one variant per shape.
#[derive(Debug, Clone, PartialEq)]
pub enum RawAttribution {
    /// One score row per class, indexed by class.
    PerClass(Vec<Vec<f64>>),
    /// Single-output wrapper around one score row.
    Single(SingleOutput),
    /// Bare score row.
    Flat(Vec<f64>),
}

impl RawAttribution {
    /// Normalize to one signed score per feature for class `class`. The
    /// variant decides the access path; no probing beyond it.
    pub fn for_class(self, class: usize) -> Result<Vec<f64>, AttributionError> {
        match self {
            RawAttribution::PerClass(rows) => rows
                .into_iter()
                .nth(class)
                .ok_or(AttributionError::MissingClass { class }),
            RawAttribution::Single(single) => Ok(single.values),
            RawAttribution::Flat(values) => Ok(values),
        }
    }
}

/// Expected value as a backend reports it: per class or already scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum RawBaseline {
    PerClass(Vec<f64>),
    Scalar(f64),
}

impl RawBaseline {
    /// Class entry when more than one class is reported, the lone value
    /// otherwise. Resolution failures surface as NaN and are absorbed by the
    /// neutral fallback downstream.
    pub fn resolve(self, class: usize) -> f64 {
        match self {
            RawBaseline::PerClass(values) if values.len() > 1 => {
                values.get(class).copied().unwrap_or(f64::NAN)
            }
            RawBaseline::PerClass(values) => values.first().copied().unwrap_or(f64::NAN),
            RawBaseline::Scalar(value) => value,
        }
    }
}

/// Model-agnostic per-instance attribution backend.
pub trait Explainer: Send + Sync {
    /// Signed per-feature scores for one ordered row.
    fn attribute(&self, row: &[f64]) -> Result<RawAttribution, AttributionError>;

    /// The backend's expected output with no feature evidence.
    fn expected_value(&self) -> Result<RawBaseline, AttributionError>;
}

#[derive(Debug)]
pub enum AttributionError {
    /// The backend computation itself failed.
    Backend(String),
    /// Normalized scores do not cover every reconciled feature.
    LengthMismatch { expected: usize, got: usize },
    /// The requested class row is absent from a per-class output.
    MissingClass { class: usize },
}

impl fmt::Display for AttributionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributionError::Backend(msg) => write!(f, "attribution backend: {}", msg),
            AttributionError::LengthMismatch { expected, got } => write!(
                f,
                "attribution covers {} features, schema has {}",
                got, expected
            ),
            AttributionError::MissingClass { class } => {
                write!(f, "per-class output has no row for class {}", class)
            }
        }
    }
}

impl std::error::Error for AttributionError {}

impl From<crate::model::ModelError> for AttributionError {
    fn from(e: crate::model::ModelError) -> Self {
        AttributionError::Backend(e.to_string())
    }
}

/// One kept contributor, display-ready.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub feature: String,
    /// Signed attribution score for the event-of-interest class.
    pub score: f64,
    /// Submitted value rendered for humans (categorical codes as labels).
    pub display_value: String,
}

impl Contribution {
    /// Chart row caption: `display value = feature name`.
    pub fn caption(&self) -> String {
        format!("{} = {}", self.display_value, self.feature)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionResult {
    /// Expected model output with no feature evidence, rounded to 3 decimals.
    pub baseline_value: f64,
    /// Kept contributors, descending absolute score, at most [`TOP_K`].
    pub contributions: Vec<Contribution>,
}

impl AttributionResult {
    /// Symmetric axis bound for the chart: the caller's maximum when it is
    /// usable, otherwise headroom over the largest absolute kept score.
    pub fn symmetric_axis_max(&self, supplied: Option<f64>) -> f64 {
        if let Some(max) = supplied {
            if max.is_finite() && max > 0.0 {
                return max;
            }
        }
        let peak = self
            .contributions
            .iter()
            .map(|c| c.score.abs())
            .fold(0.0, f64::max);
        if peak > 0.0 {
            peak * AXIS_HEADROOM
        } else {
            1.0
        }
    }
}

/// Normalizes backend output and selects the displayed contributors.
pub struct AttributionEngine {
    class_index: usize,
    top_k: usize,
}

impl Default for AttributionEngine {
    fn default() -> Self {
        Self {
            class_index: EVENT_CLASS,
            top_k: TOP_K,
        }
    }
}

impl AttributionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Explain one already-ordered row.
    ///
    /// Scores are taken for the event-of-interest class, checked against the
    /// reconciled feature count, ranked by absolute value, and truncated.
    /// The baseline is rounded to 3 decimals; a non-finite baseline falls
    /// back to the neutral 0.5 with a warning rather than failing the
    /// explanation.
    pub fn explain_one(
        &self,
        explainer: &dyn Explainer,
        schema: &ReconciledSchema,
        row: &[f64],
    ) -> Result<AttributionResult, AttributionError> {
        if row.len() != schema.len() {
            return Err(AttributionError::LengthMismatch {
                expected: schema.len(),
                got: row.len(),
            });
        }

        let scores = explainer.attribute(row)?.for_class(self.class_index)?;
        if scores.len() != schema.len() {
            return Err(AttributionError::LengthMismatch {
                expected: schema.len(),
                got: scores.len(),
            });
        }

        let baseline = explainer.expected_value()?.resolve(self.class_index);
        let baseline_value = round_baseline(baseline);

        let mut contributions: Vec<Contribution> = schema
            .specs()
            .iter()
            .zip(row.iter().zip(scores.iter()))
            .map(|(spec, (value, score))| Contribution {
                feature: spec.name.clone(),
                score: *score,
                display_value: spec.display_value(*value),
            })
            .collect();
        contributions.sort_by(|a, b| {
            b.score
                .abs()
                .partial_cmp(&a.score.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        contributions.truncate(self.top_k);

        Ok(AttributionResult {
            baseline_value,
            contributions,
        })
    }
}

fn round_baseline(value: f64) -> f64 {
    if value.is_finite() {
        (value * 1000.0).round() / 1000.0
    } else {
        tracing::warn!("non-finite baseline from explainer; using neutral fallback");
        NEUTRAL_BASELINE
    }
}
