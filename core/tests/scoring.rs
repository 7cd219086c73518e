use churnwatch_core::error::PipelineError;
use churnwatch_core::features::FEATURE_NAMES;
use churnwatch_core::forest::{RandomForest, TreeNode};
use churnwatch_core::model::{LogisticModel, ModelArtifacts, StandardScaler};
use churnwatch_core::scorer;
use churnwatch_core::snapshot::{payment_method, SnapshotMonth, SnapshotRow};
use churnwatch_core::store::ChurnStore;
use churnwatch_core::types::ModelKind;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn month() -> SnapshotMonth {
    SnapshotMonth::new(2026, 2).unwrap()
}

fn snapshot_rows(n: usize) -> Vec<SnapshotRow> {
    (0..n)
        .map(|i| SnapshotRow {
            customer_id: format!("C{i:03}"),
            snapshot_month: month(),
            tenure: (i as u32 * 7) % 60,
            monthly_charges: 25.0 + i as f64 * 3.0,
            total_charges: 300.0 + i as f64 * 40.0,
            payment_method: payment_method::ALL[i % payment_method::ALL.len()].to_string(),
            churn: None,
        })
        .collect()
}

fn seeded_store(rows: &[SnapshotRow]) -> ChurnStore {
    let store = ChurnStore::in_memory().unwrap();
    store.migrate().unwrap();
    store.insert_snapshot_rows(rows).unwrap();
    store
}

/// Identity scaler over the canonical contract, plus fixed-output models:
/// enough to verify the scoring plumbing without a training run.
fn fixed_artifacts() -> ModelArtifacts {
    let d = FEATURE_NAMES.len();
    ModelArtifacts {
        scaler: StandardScaler {
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            means: vec![0.0; d],
            stds: vec![1.0; d],
        },
        logistic: LogisticModel {
            weights: vec![0.0; d],
            intercept: 0.0, // sigmoid(0) = 0.5 for every row
        },
        forest: RandomForest {
            trees: vec![TreeNode::Leaf { probability: 0.3 }],
            n_features: d,
        },
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Both models' rows are concatenated into one batch: 2 × customers.
#[test]
fn scores_both_models_in_one_batch() {
    let rows = snapshot_rows(10);
    let store = seeded_store(&rows);

    let written = scorer::score_month(&store, &fixed_artifacts(), month()).unwrap();
    assert_eq!(written, 20);

    assert_eq!(store.prediction_count(month(), ModelKind::Logistic).unwrap(), 10);
    assert_eq!(store.prediction_count(month(), ModelKind::Forest).unwrap(), 10);
}

/// Priority score always equals probability × monthly charge.
#[test]
fn priority_is_probability_times_charge() {
    let rows = snapshot_rows(8);
    let store = seeded_store(&rows);
    scorer::score_month(&store, &fixed_artifacts(), month()).unwrap();

    for model in ModelKind::ALL {
        for prediction in store.predictions_for(month(), model).unwrap() {
            let snapshot = rows
                .iter()
                .find(|r| r.customer_id == prediction.customer_id)
                .unwrap();
            let expected = prediction.churn_probability * snapshot.monthly_charges;
            assert!(
                (prediction.retention_priority_score - expected).abs() < 1e-12,
                "priority must be probability × monthly charge"
            );
        }
    }
}

#[test]
fn probabilities_are_in_unit_interval() {
    let rows = snapshot_rows(8);
    let store = seeded_store(&rows);
    scorer::score_month(&store, &fixed_artifacts(), month()).unwrap();

    for model in ModelKind::ALL {
        for prediction in store.predictions_for(month(), model).unwrap() {
            assert!((0.0..=1.0).contains(&prediction.churn_probability));
        }
    }
}

/// A scaler whose recorded contract names a feature the engineer does not
/// produce must fail loudly, not shift columns.
#[test]
fn stale_scaler_contract_is_rejected() {
    let rows = snapshot_rows(4);
    let store = seeded_store(&rows);

    let mut artifacts = fixed_artifacts();
    artifacts.scaler.feature_names[0] = "renamed_feature".to_string();

    match scorer::score_month(&store, &artifacts, month()) {
        Err(PipelineError::FeatureMismatch { name }) => assert_eq!(name, "renamed_feature"),
        other => panic!("Expected FeatureMismatch, got {other:?}"),
    }
    // Nothing partial was written.
    assert_eq!(store.prediction_count(month(), ModelKind::Logistic).unwrap(), 0);
}

/// Scoring a month with no snapshot rows is an error, not an empty write.
#[test]
fn empty_month_is_an_error() {
    let store = seeded_store(&[]);
    match scorer::score_month(&store, &fixed_artifacts(), month()) {
        Err(PipelineError::EmptySnapshot { .. }) => {}
        other => panic!("Expected EmptySnapshot, got {other:?}"),
    }
}

/// Append-only: a re-run for the same month duplicates rather than
/// overwrites. This mirrors the documented no-idempotency contract.
#[test]
fn rerun_appends_duplicate_rows() {
    let rows = snapshot_rows(5);
    let store = seeded_store(&rows);
    let artifacts = fixed_artifacts();

    scorer::score_month(&store, &artifacts, month()).unwrap();
    scorer::score_month(&store, &artifacts, month()).unwrap();

    assert_eq!(store.prediction_count(month(), ModelKind::Logistic).unwrap(), 10);
}
