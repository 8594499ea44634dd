//! Shell configuration. The clinical feature table and risk thresholds are
//! fixed by the deployed product and deliberately not configurable here.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Trained classifier artifact (`.onnx` or `.json`)
    pub model_path: PathBuf,
    /// Submitted feature vector as a JSON object of name to value;
    /// schema defaults are used when absent
    pub input_path: Option<PathBuf>,
    /// Well-known attribution chart location, overwritten every request
    pub chart_path: PathBuf,
    /// Attribution backend budgets
    pub explain: ExplainConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainConfig {
    /// Feature count at or below which coalitions are enumerated exactly
    pub exact_feature_limit: usize,
    /// Permutation draws for the sampled estimator above that limit
    pub permutation_samples: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("model.onnx"),
            input_path: None,
            chart_path: PathBuf::from("attribution_plot.svg"),
            explain: ExplainConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for ExplainConfig {
    fn default() -> Self {
        Self {
            exact_feature_limit: 12,
            permutation_samples: 200,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl AppConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &std::path::Path) -> Self {
        if path.exists() {
            if let Ok(data) = std::fs::read_to_string(path) {
                if let Ok(c) = serde_json::from_str::<AppConfig>(&data) {
                    return c;
                }
            }
        }
        Self::default()
    }
}
