//! Prediction shell: loads the trained artifact, reconciles the clinical
//! feature table against it, runs one submission through the pipeline,
//! prints the outcome as JSON on stdout, and writes the attribution chart
//! to its well-known location.

use oncorisk::{
    config::AppConfig,
    explain::MarginalShapley,
    logging::StructuredLogger,
    model,
    pipeline::{Explanation, Pipeline},
    predict::Predictor,
    render,
    schema::{self, FeatureVector, ModelContract},
};
use std::sync::Arc;
use tracing::{error, info};

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config_path = std::env::var("ONCORISK_CONFIG_PATH")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::path::PathBuf::from("config.json"));
    let config = AppConfig::load(&config_path);

    StructuredLogger::init(config.log.json, &config.log.level);

    info!(model_path = %config.model_path.display(), "oncorisk starting");

    let table = schema::feature_table();
    let (classifier, metadata) = model::load_artifact(&config.model_path, table.len())?;

    let contract = ModelContract::from_classifier(classifier.as_ref());
    let (reconciled, warnings) = schema::reconcile(&contract, &table);
    schema::log_warnings(&warnings);

    let vector = match &config.input_path {
        Some(path) => {
            let data = std::fs::read_to_string(path)?;
            serde_json::from_str::<FeatureVector>(&data)?
        }
        None => FeatureVector::defaults(&table),
    };
    info!(features = vector.len(), "submission loaded");

    let explainer = Arc::new(
        MarginalShapley::new(classifier.clone(), reconciled.default_row())
            .with_exact_limit(config.explain.exact_feature_limit)
            .with_permutation_samples(config.explain.permutation_samples),
    );
    let pipeline = Pipeline::new(Predictor::new(classifier, reconciled), explainer);

    match pipeline.run_one(&vector) {
        Ok(outcome) => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            match &outcome.explanation {
                Explanation::Available(result) => {
                    render::write_attribution_svg(&config.chart_path, result, None)?;
                    info!(
                        request_id = %outcome.request_id,
                        chart = %config.chart_path.display(),
                        "attribution chart written"
                    );
                }
                Explanation::Unavailable { reason } => {
                    info!(request_id = %outcome.request_id, reason = %reason, "no chart written");
                }
            }
            info!(
                request_id = %outcome.request_id,
                model_sha256 = %metadata.sha256,
                "request complete"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "request failed");
            eprintln!(
                "Prediction could not be completed: {}. Check that the submitted features match the model's inputs, or contact the maintainers of the model artifact.",
                e
            );
            Err(Box::new(e))
        }
    }
}
