//! ONNX Runtime adapter: `[1, n]` f32 row in, class probability pair out.
//!
//! An exported graph does not expose which probability column carries which
//! training label, so the index-1-is-death precondition cannot be verified
//! here; it is asserted against the export pipeline, not the session.

use super::{Classifier, ModelError};
use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use std::sync::Mutex;

pub struct OnnxClassifier {
    /// `Session::run` needs exclusive access; the classifier surface is `&self`.
    session: Mutex<Session>,
    input_name: String,
    output_names: Vec<String>,
    n_features: usize,
}

impl OnnxClassifier {
    /// Build a session from raw model bytes. `n_features` is the input width
    /// the caller expects; the graph itself does not declare column names.
    pub fn from_bytes(bytes: &[u8], n_features: usize) -> Result<Self, ModelError> {
        let session = Session::builder()
            .map_err(|e| ModelError::Session(format!("session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ModelError::Session(format!("optimization level: {}", e)))?
            .commit_from_memory(bytes)
            .map_err(|e| ModelError::Session(format!("commit model: {}", e)))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "input".to_string());
        let output_names: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
        if output_names.is_empty() {
            return Err(ModelError::Session("graph declares no outputs".to_string()));
        }

        tracing::debug!(
            input = %input_name,
            outputs = output_names.len(),
            n_features,
            "onnx session ready"
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_names,
            n_features,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn n_features(&self) -> usize {
        self.n_features
    }

    /// The graph carries no column names; reconciliation falls back to table
    /// order for this format.
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, ModelError> {
        if row.len() != self.n_features {
            return Err(ModelError::DimensionMismatch {
                expected: self.n_features,
                got: row.len(),
            });
        }

        let floats: Vec<f32> = row.iter().map(|v| *v as f32).collect();
        let array = Array2::from_shape_vec((1, self.n_features), floats)
            .map_err(|e| ModelError::Session(format!("input array: {}", e)))?;
        let tensor = Value::from_array(array)
            .map_err(|e| ModelError::Session(format!("input tensor: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| ModelError::Session("session lock poisoned".to_string()))?;
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => tensor])
            .map_err(|e| ModelError::Session(format!("inference failed: {}", e)))?;

        // A classifier exported from a scikit-learn pipeline emits a label
        // tensor and a probability tensor; take the first float output wide
        // enough to be the probability pair.
        let mut widest = 0;
        for name in &self.output_names {
            let Some(value) = outputs.get(name.as_str()) else {
                continue;
            };
            if let Ok(extracted) = value.try_extract_tensor::<f32>() {
                let data = extracted.1;
                if data.len() >= 2 {
                    return Ok(data.iter().map(|p| *p as f64).collect());
                }
                widest = widest.max(data.len());
            }
        }
        Err(ModelError::MalformedOutput {
            expected: 2,
            got: widest,
        })
    }
}
