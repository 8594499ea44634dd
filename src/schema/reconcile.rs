//! Aligns the clinical feature table against the trained model's declared
//! input order. Runs once at startup; the result is the single source of
//! truth for every downstream model and explainer call.

use super::FeatureSpec;
use crate::model::Classifier;
use serde::{Deserialize, Serialize};

/// The trained artifact's expectations about its input columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelContract {
    /// Training-time column order; `None` when the artifact declares none.
    pub expected_feature_order: Option<Vec<String>>,
}

impl ModelContract {
    pub fn new(expected_feature_order: Option<Vec<String>>) -> Self {
        Self {
            expected_feature_order,
        }
    }

    pub fn from_classifier(model: &dyn Classifier) -> Self {
        Self {
            expected_feature_order: model.feature_names().map(|names| names.to_vec()),
        }
    }
}

/// Configuration defect found while reconciling. Warnings are reported and
/// the pipeline continues; a missing model feature only becomes fatal when a
/// prediction is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaWarning {
    /// The model requires a feature the table does not define.
    ModelFeatureUndefined { name: String },
    /// The table defines a feature the model does not use.
    UnusedByModel { name: String },
    /// The artifact declares no input order; table order is in effect.
    NoDeclaredOrder,
}

/// Feature specs in the model's column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledSchema {
    specs: Vec<FeatureSpec>,
    /// Model-required names with no table definition. Prediction is
    /// impossible while this is non-empty.
    missing: Vec<String>,
    /// True when no declared order existed and table order was assumed.
    degraded: bool,
}

impl ReconciledSchema {
    pub fn specs(&self) -> &[FeatureSpec] {
        &self.specs
    }

    pub fn spec(&self, name: &str) -> Option<&FeatureSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(|s| s.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn missing(&self) -> &[String] {
        &self.missing
    }

    /// False when the model requires a feature the table cannot supply.
    pub fn is_operable(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn degraded(&self) -> bool {
        self.degraded
    }

    /// Default values in reconciled column order; the explainer background row.
    pub fn default_row(&self) -> Vec<f64> {
        self.specs.iter().map(|s| s.default).collect()
    }
}

/// Reconcile the feature table against the model contract.
///
/// The declared order wins: the result lists specs in the model's column
/// order, never in table order, unless no order was declared at all. Every
/// discrepancy is returned as a warning rather than an error.
pub fn reconcile(
    contract: &ModelContract,
    table: &[FeatureSpec],
) -> (ReconciledSchema, Vec<SchemaWarning>) {
    let mut warnings = Vec::new();

    let (order, degraded) = match &contract.expected_feature_order {
        Some(names) => (names.clone(), false),
        None => {
            warnings.push(SchemaWarning::NoDeclaredOrder);
            (table.iter().map(|s| s.name.clone()).collect(), true)
        }
    };

    let mut specs = Vec::with_capacity(order.len());
    let mut missing = Vec::new();
    for name in &order {
        match table.iter().find(|s| &s.name == name) {
            Some(spec) => specs.push(spec.clone()),
            None => {
                warnings.push(SchemaWarning::ModelFeatureUndefined { name: name.clone() });
                missing.push(name.clone());
            }
        }
    }

    for spec in table {
        if !order.iter().any(|n| n == &spec.name) {
            warnings.push(SchemaWarning::UnusedByModel {
                name: spec.name.clone(),
            });
        }
    }

    (
        ReconciledSchema {
            specs,
            missing,
            degraded,
        },
        warnings,
    )
}

/// Report reconciliation warnings through the audit log.
pub fn log_warnings(warnings: &[SchemaWarning]) {
    for warning in warnings {
        match warning {
            SchemaWarning::ModelFeatureUndefined { name } => {
                tracing::warn!(feature = %name, "model requires a feature the table does not define");
            }
            SchemaWarning::UnusedByModel { name } => {
                tracing::warn!(feature = %name, "table feature is not used by the model");
            }
            SchemaWarning::NoDeclaredOrder => {
                tracing::warn!("artifact declares no feature order; assuming table order");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::feature_table;

    fn names(schema: &ReconciledSchema) -> Vec<&str> {
        schema.names().collect()
    }

    #[test]
    fn declared_order_wins_over_table_order() {
        let table = feature_table();
        let contract = ModelContract::new(Some(vec![
            "age".to_string(),
            "CEA".to_string(),
            "blood_loss".to_string(),
        ]));
        let (schema, warnings) = reconcile(&contract, &table);
        assert_eq!(names(&schema), vec!["age", "CEA", "blood_loss"]);
        assert!(schema.is_operable());
        assert!(!schema.degraded());
        // every table feature the model skips is flagged, nothing else
        let unused: Vec<_> = warnings
            .iter()
            .filter(|w| matches!(w, SchemaWarning::UnusedByModel { .. }))
            .collect();
        assert_eq!(unused.len(), table.len() - 3);
    }

    #[test]
    fn undefined_model_feature_is_recorded_and_blocks_operation() {
        let table = feature_table();
        let contract = ModelContract::new(Some(vec![
            "age".to_string(),
            "ki67_index".to_string(),
        ]));
        let (schema, warnings) = reconcile(&contract, &table);
        assert!(!schema.is_operable());
        assert_eq!(schema.missing(), ["ki67_index".to_string()]);
        assert!(warnings.contains(&SchemaWarning::ModelFeatureUndefined {
            name: "ki67_index".to_string()
        }));
        // the resolvable part of the order is still usable for reporting
        assert_eq!(names(&schema), vec!["age"]);
    }

    #[test]
    fn missing_declared_order_falls_back_to_table_order() {
        let table = feature_table();
        let contract = ModelContract::new(None);
        let (schema, warnings) = reconcile(&contract, &table);
        assert!(warnings.contains(&SchemaWarning::NoDeclaredOrder));
        assert!(schema.degraded());
        assert!(schema.is_operable());
        let expected: Vec<&str> = table.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names(&schema), expected);
    }

    #[test]
    fn exact_match_produces_no_warnings() {
        let table = feature_table();
        let order: Vec<String> = table.iter().map(|s| s.name.clone()).collect();
        let contract = ModelContract::new(Some(order));
        let (schema, warnings) = reconcile(&contract, &table);
        assert!(warnings.is_empty());
        assert!(schema.is_operable());
        assert_eq!(schema.len(), table.len());
    }
}
