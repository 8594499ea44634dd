//! Trained binary classifier surface: artifact loading, fingerprinting, and
//! the inference contract the rest of the pipeline is written against.

mod linear;
mod onnx;

pub use linear::{LogisticArtifact, LogisticClassifier};
pub use onnx::OnnxClassifier;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Inference surface of a loaded artifact.
///
/// For a binary model `predict_proba` returns `[p_survival, p_death]`: index
/// 1 is the event-of-interest class. That encoding is a precondition on the
/// exported artifact; formats that declare their labels are checked at load.
pub trait Classifier: Send + Sync {
    /// Number of input columns the model was fit on.
    fn n_features(&self) -> usize;

    /// Training-time column names, when the artifact declares them.
    fn feature_names(&self) -> Option<&[String]>;

    /// Class probabilities for one ordered row.
    fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, ModelError>;

    /// Predicted class label for one ordered row (argmax over probabilities).
    fn predict(&self, row: &[f64]) -> Result<usize, ModelError> {
        let proba = self.predict_proba(row)?;
        proba
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(label, _)| label)
            .ok_or(ModelError::MalformedOutput { expected: 2, got: 0 })
    }
}

#[derive(Debug)]
pub enum ModelError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    /// ONNX Runtime failure, stringified at the boundary.
    Session(String),
    UnsupportedFormat(String),
    DimensionMismatch { expected: usize, got: usize },
    /// Output did not contain the expected probability vector.
    MalformedOutput { expected: usize, got: usize },
    NonFiniteParameter { name: String, value: f64 },
    MissingWeight(String),
    /// Label encoding does not put the event of interest at index 1.
    InvalidClassLabels(String),
    /// A returned probability was non-finite or outside [0, 1].
    InvalidProbability(f64),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Io(e) => write!(f, "artifact io: {}", e),
            ModelError::Parse(e) => write!(f, "artifact parse: {}", e),
            ModelError::Session(msg) => write!(f, "onnx session: {}", msg),
            ModelError::UnsupportedFormat(ext) => {
                write!(f, "unsupported artifact format: {:?}", ext)
            }
            ModelError::DimensionMismatch { expected, got } => {
                write!(f, "input has {} features, model expects {}", got, expected)
            }
            ModelError::MalformedOutput { expected, got } => write!(
                f,
                "model output has {} probabilities, expected at least {}",
                got, expected
            ),
            ModelError::NonFiniteParameter { name, value } => {
                write!(f, "non-finite parameter {}: {}", name, value)
            }
            ModelError::MissingWeight(name) => {
                write!(f, "artifact declares feature {:?} but carries no weight for it", name)
            }
            ModelError::InvalidClassLabels(msg) => write!(f, "class labels: {}", msg),
            ModelError::InvalidProbability(p) => {
                write!(f, "probability {} outside [0, 1]", p)
            }
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelError::Io(e) => Some(e),
            ModelError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ModelError {
    fn from(e: std::io::Error) -> Self {
        ModelError::Io(e)
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(e: serde_json::Error) -> Self {
        ModelError::Parse(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactFormat {
    Onnx,
    Json,
}

/// Recorded once when the artifact is opened; logged for the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub artifact_path: PathBuf,
    pub format: ArtifactFormat,
    pub n_features: usize,
    pub sha256: String,
    pub loaded_at: DateTime<Utc>,
}

/// Open a trained artifact and wrap it behind the classifier surface.
///
/// Dispatches on extension: `.onnx` goes through ONNX Runtime, `.json` is a
/// calibrated logistic artifact. `declared_features` is the fallback input
/// width for formats that do not describe their own (`.onnx`); self-describing
/// formats ignore it.
pub fn load_artifact(
    path: &Path,
    declared_features: usize,
) -> Result<(Arc<dyn Classifier>, ModelMetadata), ModelError> {
    let bytes = std::fs::read(path)?;
    let sha256 = fingerprint(&bytes);

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    let (classifier, format): (Arc<dyn Classifier>, ArtifactFormat) = match ext.as_str() {
        "onnx" => (
            Arc::new(OnnxClassifier::from_bytes(&bytes, declared_features)?),
            ArtifactFormat::Onnx,
        ),
        "json" => (
            Arc::new(LogisticClassifier::from_json(&bytes)?),
            ArtifactFormat::Json,
        ),
        other => return Err(ModelError::UnsupportedFormat(other.to_string())),
    };

    let metadata = ModelMetadata {
        artifact_path: path.to_path_buf(),
        format,
        n_features: classifier.n_features(),
        sha256,
        loaded_at: Utc::now(),
    };
    tracing::info!(
        path = %path.display(),
        format = ?metadata.format,
        n_features = metadata.n_features,
        sha256 = %metadata.sha256,
        "model artifact loaded"
    );

    Ok((classifier, metadata))
}

fn fingerprint(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    format!("{:x}", h.finalize())
}
