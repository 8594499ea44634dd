//! Clinical input feature definitions: type, domain, default, and display metadata
//! for every feature the trained model consumes.

mod reconcile;

pub use reconcile::{log_warnings, reconcile, ModelContract, ReconciledSchema, SchemaWarning};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Numerical,
    Categorical,
}

/// One category a discrete feature may take, with its display label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCode {
    pub code: i64,
    pub label: String,
}

/// Allowed values for one feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureDomain {
    /// Inclusive continuous range with an input step hint.
    Numerical { min: f64, max: f64, step: f64 },
    /// Ordered discrete codes.
    Categorical { codes: Vec<CategoryCode> },
}

/// Definition of a single model input feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub name: String,
    pub kind: FeatureKind,
    pub domain: FeatureDomain,
    /// Prefilled value; always inside the domain.
    pub default: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub description: String,
}

impl FeatureSpec {
    pub fn numerical(
        name: &str,
        min: f64,
        max: f64,
        step: f64,
        default: f64,
        unit: Option<&str>,
        description: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            kind: FeatureKind::Numerical,
            domain: FeatureDomain::Numerical { min, max, step },
            default,
            unit: unit.map(str::to_string),
            description: description.to_string(),
        }
    }

    pub fn categorical(name: &str, codes: &[(i64, &str)], default: f64, description: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FeatureKind::Categorical,
            domain: FeatureDomain::Categorical {
                codes: codes
                    .iter()
                    .map(|(code, label)| CategoryCode {
                        code: *code,
                        label: (*label).to_string(),
                    })
                    .collect(),
            },
            default,
            unit: None,
            description: description.to_string(),
        }
    }

    /// Whether `value` lies inside this feature's domain.
    pub fn accepts(&self, value: f64) -> bool {
        match &self.domain {
            FeatureDomain::Numerical { min, max, .. } => {
                value.is_finite() && value >= *min && value <= *max
            }
            FeatureDomain::Categorical { codes } => {
                codes.iter().any(|c| (c.code as f64) == value)
            }
        }
    }

    /// Human-readable rendering of a submitted value. Categorical codes map
    /// to their labels; unknown codes and numerical values print as numbers.
    pub fn display_value(&self, value: f64) -> String {
        if let FeatureDomain::Categorical { codes } = &self.domain {
            if let Some(c) = codes.iter().find(|c| (c.code as f64) == value) {
                return c.label.clone();
            }
        }
        format!("{}", value)
    }
}

/// The clinical feature table for the three-year mortality model.
/// Declaration order is the fallback column order when the trained artifact
/// declares none.
pub fn feature_table() -> Vec<FeatureSpec> {
    vec![
        FeatureSpec::numerical(
            "blood_loss",
            0.0,
            800.0,
            0.1,
            50.0,
            Some("ml"),
            "Intraoperative blood loss",
        ),
        FeatureSpec::numerical(
            "CEA",
            0.0,
            150.0,
            0.1,
            8.68,
            Some("ng/ml"),
            "Preoperative carcinoembryonic antigen",
        ),
        FeatureSpec::numerical(
            "albumin",
            1.0,
            80.0,
            0.1,
            38.6,
            Some("g/L"),
            "Preoperative serum albumin",
        ),
        FeatureSpec::categorical(
            "TNM_stage",
            &[(1, "Stage I"), (2, "Stage II"), (3, "Stage III"), (4, "Stage IV")],
            2.0,
            "Pathological TNM stage",
        ),
        FeatureSpec::numerical("age", 25.0, 90.0, 0.1, 76.0, Some("years"), "Age at surgery"),
        FeatureSpec::numerical(
            "tumor_diameter",
            0.2,
            20.0,
            0.1,
            4.0,
            Some("cm"),
            "Maximum tumor diameter",
        ),
        FeatureSpec::categorical(
            "lymphovascular_invasion",
            &[(0, "No"), (1, "Yes")],
            1.0,
            "Lymphovascular invasion on pathology",
        ),
    ]
}

/// One submission: feature name to value. Built per request and discarded
/// after the prediction completes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector {
    values: HashMap<String, f64>,
}

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Vector prefilled with every feature's default value.
    pub fn defaults(specs: &[FeatureSpec]) -> Self {
        Self {
            values: specs.iter().map(|s| (s.name.clone(), s.default)).collect(),
        }
    }

    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            values: pairs.into_iter().map(|(n, v)| (n.into(), v)).collect(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    pub fn remove(&mut self, name: &str) -> Option<f64> {
        self.values.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_defaults_are_inside_domains() {
        for spec in feature_table() {
            assert!(
                spec.accepts(spec.default),
                "default for {} outside domain",
                spec.name
            );
        }
    }

    #[test]
    fn categorical_display_maps_codes_to_labels() {
        let table = feature_table();
        let stage = table.iter().find(|s| s.name == "TNM_stage").unwrap();
        assert_eq!(stage.display_value(2.0), "Stage II");
        assert_eq!(stage.display_value(9.0), "9");
        let lvi = table.iter().find(|s| s.name == "lymphovascular_invasion").unwrap();
        assert_eq!(lvi.display_value(1.0), "Yes");
        assert_eq!(lvi.display_value(0.0), "No");
    }

    #[test]
    fn numerical_domain_rejects_out_of_range_and_non_finite() {
        let table = feature_table();
        let age = table.iter().find(|s| s.name == "age").unwrap();
        assert!(age.accepts(25.0));
        assert!(age.accepts(90.0));
        assert!(!age.accepts(24.9));
        assert!(!age.accepts(f64::NAN));
    }

    #[test]
    fn defaults_vector_covers_every_feature() {
        let table = feature_table();
        let vector = FeatureVector::defaults(&table);
        assert_eq!(vector.len(), table.len());
        assert_eq!(vector.get("CEA"), Some(8.68));
        assert_eq!(vector.get("blood_loss"), Some(50.0));
    }
}
