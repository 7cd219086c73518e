//! Training stage — fits the scaler and both classifiers on a labeled
//! month and persists the artifact set.
//!
//! Model selection is fixed: one logistic regression, one random forest,
//! both scored every month thereafter.

use crate::{
    config::PipelineConfig,
    error::{PipeResult, PipelineError},
    features::{self, FEATURE_NAMES},
    forest::{ForestFitParams, RandomForest},
    model::{Classifier, LogisticFitParams, LogisticModel, ModelArtifacts, StandardScaler},
    rng::{PipelineRng, StreamSlot},
    snapshot::SnapshotMonth,
    store::ChurnStore,
};
use std::path::Path;

const TEST_FRACTION: f64 = 0.30;

/// What the training run saw and how the fitted models did on holdout.
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub month:           SnapshotMonth,
    pub labeled_rows:    usize,
    pub train_rows:      usize,
    pub test_rows:       usize,
    pub logreg_accuracy: f64,
    pub forest_accuracy: f64,
}

/// Fit scaler + both classifiers on the labeled rows of `month` and save
/// the artifacts to the configured model directory.
pub fn train(
    store: &ChurnStore,
    config: &PipelineConfig,
    month: SnapshotMonth,
) -> PipeResult<TrainReport> {
    let rows = store.snapshot_for_month(month)?;
    if rows.is_empty() {
        return Err(PipelineError::EmptySnapshot {
            month: month.to_string(),
        });
    }

    let engineered = features::engineer(&rows);
    let labeled: Vec<_> = engineered.iter().filter(|r| r.churn.is_some()).collect();
    if labeled.is_empty() {
        return Err(PipelineError::NoLabels {
            month: month.to_string(),
        });
    }

    let names: Vec<String> = FEATURE_NAMES.iter().map(|s| s.to_string()).collect();
    let matrix: Vec<Vec<f64>> = labeled
        .iter()
        .map(|r| r.vector(&names))
        .collect::<PipeResult<_>>()?;
    let labels: Vec<i64> = labeled.iter().filter_map(|r| r.churn).collect();

    let mut indices: Vec<usize> = (0..matrix.len()).collect();
    let mut split_rng = PipelineRng::for_stream(config.seed, StreamSlot::TrainSplit);
    split_rng.shuffle(&mut indices);

    let test_n = ((matrix.len() as f64) * TEST_FRACTION).round() as usize;
    let (test_idx, train_idx) = indices.split_at(test_n.min(matrix.len().saturating_sub(1)));

    // The scaler sees only the training rows; holdout rows are transformed
    // with the training statistics.
    let train_matrix: Vec<Vec<f64>> = train_idx.iter().map(|&i| matrix[i].clone()).collect();
    let scaler = StandardScaler::fit(&FEATURE_NAMES, &train_matrix);
    let scaled: Vec<Vec<f64>> = matrix
        .iter()
        .map(|row| scaler.transform(row))
        .collect::<PipeResult<_>>()?;

    let x_train: Vec<Vec<f64>> = train_idx.iter().map(|&i| scaled[i].clone()).collect();
    let y_train: Vec<i64> = train_idx.iter().map(|&i| labels[i]).collect();

    let logistic = LogisticModel::fit(&x_train, &y_train, LogisticFitParams::default());

    let mut forest_rng = PipelineRng::for_stream(config.seed, StreamSlot::Forest);
    let forest = RandomForest::fit(
        &x_train,
        &y_train,
        ForestFitParams::default(),
        &mut forest_rng,
    );

    let logreg_accuracy = holdout_accuracy(&logistic, &scaled, &labels, test_idx);
    let forest_accuracy = holdout_accuracy(&forest, &scaled, &labels, test_idx);

    let artifacts = ModelArtifacts {
        scaler,
        logistic,
        forest,
    };
    artifacts.save(Path::new(&config.model_dir))?;

    let report = TrainReport {
        month,
        labeled_rows: labeled.len(),
        train_rows: train_idx.len(),
        test_rows: test_idx.len(),
        logreg_accuracy,
        forest_accuracy,
    };

    log::info!(
        "month={month} train: rows={} train={} test={} acc_logreg={:.3} acc_rf={:.3}",
        report.labeled_rows,
        report.train_rows,
        report.test_rows,
        report.logreg_accuracy,
        report.forest_accuracy,
    );

    Ok(report)
}

fn holdout_accuracy(
    model: &dyn Classifier,
    scaled: &[Vec<f64>],
    labels: &[i64],
    test_idx: &[usize],
) -> f64 {
    if test_idx.is_empty() {
        return 0.0;
    }
    let correct = test_idx
        .iter()
        .filter(|&&i| {
            let predicted = if model.predict_proba(&scaled[i]) >= 0.5 { 1 } else { 0 };
            predicted == labels[i]
        })
        .count();
    correct as f64 / test_idx.len() as f64
}
