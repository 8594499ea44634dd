//! Calibrated logistic artifact: named weights and bias in JSON, with the
//! training pipeline's standardization parameters baked in.
//!
//! Unlike an ONNX graph this format declares its column order and label
//! encoding, so the event-of-interest position is validated at load.

use super::{Classifier, ModelError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// On-disk artifact as produced by the training exporter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticArtifact {
    pub model_id: String,
    pub model_version: String,
    /// Training-time column order; weights are keyed by these names.
    pub feature_order: Vec<String>,
    pub weights: HashMap<String, f64>,
    pub bias: f64,
    /// Standardization applied before the dot product: (x - mean) / scale.
    #[serde(default)]
    pub feature_means: HashMap<String, f64>,
    #[serde(default)]
    pub feature_scales: HashMap<String, f64>,
    /// Training label encoding; index 1 must be the event of interest (1).
    pub class_labels: Vec<i64>,
}

impl LogisticArtifact {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.feature_order.is_empty() {
            return Err(ModelError::DimensionMismatch {
                expected: 1,
                got: 0,
            });
        }
        if self.class_labels.len() != 2 {
            return Err(ModelError::InvalidClassLabels(format!(
                "expected 2 labels, found {}",
                self.class_labels.len()
            )));
        }
        if self.class_labels[1] != 1 {
            return Err(ModelError::InvalidClassLabels(format!(
                "index 1 must carry the positive label 1, found {}",
                self.class_labels[1]
            )));
        }
        if !self.bias.is_finite() {
            return Err(ModelError::NonFiniteParameter {
                name: "bias".to_string(),
                value: self.bias,
            });
        }
        for name in &self.feature_order {
            let weight = self
                .weights
                .get(name)
                .ok_or_else(|| ModelError::MissingWeight(name.clone()))?;
            if !weight.is_finite() {
                return Err(ModelError::NonFiniteParameter {
                    name: name.clone(),
                    value: *weight,
                });
            }
            if let Some(scale) = self.feature_scales.get(name) {
                if !scale.is_finite() || *scale <= 0.0 {
                    return Err(ModelError::NonFiniteParameter {
                        name: format!("scale[{}]", name),
                        value: *scale,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Validated artifact with weights resolved to positional form.
pub struct LogisticClassifier {
    feature_order: Vec<String>,
    weights: Vec<f64>,
    means: Vec<f64>,
    scales: Vec<f64>,
    bias: f64,
}

impl LogisticClassifier {
    pub fn from_json(bytes: &[u8]) -> Result<Self, ModelError> {
        let artifact: LogisticArtifact = serde_json::from_slice(bytes)?;
        Self::from_artifact(artifact)
    }

    pub fn from_artifact(artifact: LogisticArtifact) -> Result<Self, ModelError> {
        artifact.validate()?;
        let mut weights = Vec::with_capacity(artifact.feature_order.len());
        let mut means = Vec::with_capacity(artifact.feature_order.len());
        let mut scales = Vec::with_capacity(artifact.feature_order.len());
        for name in &artifact.feature_order {
            // validate() guarantees the weight exists
            weights.push(artifact.weights.get(name).copied().unwrap_or(0.0));
            means.push(artifact.feature_means.get(name).copied().unwrap_or(0.0));
            scales.push(artifact.feature_scales.get(name).copied().unwrap_or(1.0));
        }
        Ok(Self {
            feature_order: artifact.feature_order,
            weights,
            means,
            scales,
            bias: artifact.bias,
        })
    }
}

impl Classifier for LogisticClassifier {
    fn n_features(&self) -> usize {
        self.feature_order.len()
    }

    fn feature_names(&self) -> Option<&[String]> {
        Some(&self.feature_order)
    }

    fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, ModelError> {
        if row.len() != self.feature_order.len() {
            return Err(ModelError::DimensionMismatch {
                expected: self.feature_order.len(),
                got: row.len(),
            });
        }
        let mut z = self.bias;
        for i in 0..row.len() {
            z += self.weights[i] * (row[i] - self.means[i]) / self.scales[i];
        }
        let p_death = sigmoid(z);
        Ok(vec![1.0 - p_death, p_death])
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact_json(class_labels: &str) -> String {
        format!(
            r#"{{
                "model_id": "gc-3yr-mortality",
                "model_version": "1.0.0",
                "feature_order": ["age", "CEA"],
                "weights": {{"age": 0.04, "CEA": 0.12}},
                "bias": -2.0,
                "feature_means": {{"age": 62.0, "CEA": 10.0}},
                "feature_scales": {{"age": 11.0, "CEA": 18.0}},
                "class_labels": {}
            }}"#,
            class_labels
        )
    }

    #[test]
    fn valid_artifact_predicts_a_probability_pair() {
        let model = LogisticClassifier::from_json(artifact_json("[0, 1]").as_bytes()).unwrap();
        assert_eq!(model.n_features(), 2);
        assert_eq!(
            model.feature_names().unwrap(),
            ["age".to_string(), "CEA".to_string()]
        );
        let proba = model.predict_proba(&[76.0, 8.68]).unwrap();
        assert_eq!(proba.len(), 2);
        assert!((proba[0] + proba[1] - 1.0).abs() < 1e-12);
        assert!(proba[1] > 0.0 && proba[1] < 1.0);
    }

    #[test]
    fn higher_risk_inputs_raise_the_death_probability() {
        let model = LogisticClassifier::from_json(artifact_json("[0, 1]").as_bytes()).unwrap();
        let low = model.predict_proba(&[40.0, 2.0]).unwrap()[1];
        let high = model.predict_proba(&[85.0, 120.0]).unwrap()[1];
        assert!(high > low);
    }

    #[test]
    fn flipped_class_labels_are_rejected_at_load() {
        let err = LogisticClassifier::from_json(artifact_json("[1, 0]").as_bytes()).err();
        assert!(matches!(err, Some(ModelError::InvalidClassLabels(_))));
    }

    #[test]
    fn missing_weight_for_a_declared_feature_is_rejected() {
        let json = r#"{
            "model_id": "m", "model_version": "1",
            "feature_order": ["age", "CEA"],
            "weights": {"age": 0.04},
            "bias": -2.0,
            "class_labels": [0, 1]
        }"#;
        let err = LogisticClassifier::from_json(json.as_bytes()).err();
        assert!(matches!(err, Some(ModelError::MissingWeight(name)) if name == "CEA"));
    }

    #[test]
    fn non_finite_weight_is_rejected() {
        let artifact = LogisticArtifact {
            model_id: "m".to_string(),
            model_version: "1".to_string(),
            feature_order: vec!["age".to_string()],
            weights: [("age".to_string(), f64::NAN)].into_iter().collect(),
            bias: 0.0,
            feature_means: HashMap::new(),
            feature_scales: HashMap::new(),
            class_labels: vec![0, 1],
        };
        assert!(matches!(
            artifact.validate(),
            Err(ModelError::NonFiniteParameter { .. })
        ));
    }

    #[test]
    fn default_argmax_prediction_follows_the_probability_pair() {
        let model = LogisticClassifier::from_json(artifact_json("[0, 1]").as_bytes()).unwrap();
        let proba = model.predict_proba(&[85.0, 120.0]).unwrap();
        let label = model.predict(&[85.0, 120.0]).unwrap();
        assert_eq!(label, if proba[1] > proba[0] { 1 } else { 0 });
    }
}
