//! Oncorisk — gastric cancer postoperative three-year survival prediction core.
//!
//! Modular structure:
//! - [`schema`] — Clinical feature definitions and reconciliation against the model's input order
//! - [`model`] — Trained classifier artifacts (ONNX, calibrated logistic) behind one inference trait
//! - [`predict`] — Single-row prediction with probability extraction
//! - [`risk`] — Fixed-threshold risk tiers
//! - [`explain`] — Per-instance feature attribution with shape normalization
//! - [`pipeline`] — One request end to end, attribution failures isolated
//! - [`render`] — Attribution chart for the UI side channel
//! - [`logging`] — Structured JSON logging

pub mod config;
pub mod explain;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod predict;
pub mod render;
pub mod risk;
pub mod schema;

pub use config::AppConfig;
pub use explain::{AttributionEngine, AttributionResult, Explainer, MarginalShapley};
pub use logging::StructuredLogger;
pub use model::{Classifier, ModelError, ModelMetadata};
pub use pipeline::{Explanation, Pipeline, PipelineError, PredictionOutcome};
pub use predict::{PredictionResult, Predictor};
pub use risk::RiskTier;
pub use schema::{FeatureSpec, FeatureVector, ModelContract, ReconciledSchema};
