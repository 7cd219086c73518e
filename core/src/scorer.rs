//! Scoring stage — applies the fitted scaler and both classifiers to a
//! monthly snapshot and appends the prediction rows in one batch write.

use crate::{
    error::{PipeResult, PipelineError},
    features,
    model::ModelArtifacts,
    snapshot::SnapshotMonth,
    store::ChurnStore,
    types::CustomerId,
};
use serde::{Deserialize, Serialize};

/// One (customer, month, model) prediction. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRow {
    pub customer_id:              CustomerId,
    pub snapshot_month:           SnapshotMonth,
    pub model_name:               String,
    pub churn_probability:        f64,
    /// Always churn_probability × that row's monthly charge.
    pub retention_priority_score: f64,
}

/// Score every customer in `month` with both models. Rows for both models
/// are concatenated and written in a single batch. Returns the number of
/// prediction rows written.
pub fn score_month(
    store: &ChurnStore,
    artifacts: &ModelArtifacts,
    month: SnapshotMonth,
) -> PipeResult<usize> {
    let rows = store.snapshot_for_month(month)?;
    if rows.is_empty() {
        return Err(PipelineError::EmptySnapshot {
            month: month.to_string(),
        });
    }

    let engineered = features::engineer(&rows);

    // The fitted scaler's recorded names are the feature contract; each
    // vector is assembled in exactly that order and validated by name.
    let contract = &artifacts.scaler.feature_names;

    let mut predictions: Vec<PredictionRow> =
        Vec::with_capacity(engineered.len() * artifacts.classifiers().len());

    for classifier in artifacts.classifiers() {
        for row in &engineered {
            let vector = row.vector(contract)?;
            let scaled = artifacts.scaler.transform(&vector)?;
            let probability = classifier.predict_proba(&scaled);

            predictions.push(PredictionRow {
                customer_id: row.customer_id.clone(),
                snapshot_month: month,
                model_name: classifier.kind().name().to_string(),
                churn_probability: probability,
                retention_priority_score: probability * row.monthly_charges,
            });
        }
    }

    store.append_predictions(&predictions)?;
    log::info!(
        "month={month} score: customers={} predictions={}",
        engineered.len(),
        predictions.len(),
    );

    Ok(predictions.len())
}
