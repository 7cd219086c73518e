use churnwatch_core::error::PipelineError;
use churnwatch_core::features::{self, FEATURE_NAMES};
use churnwatch_core::snapshot::{payment_method, SnapshotMonth, SnapshotRow};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn month() -> SnapshotMonth {
    SnapshotMonth::new(2026, 1).unwrap()
}

fn row(id: &str, tenure: u32, monthly: f64, total: f64, method: &str) -> SnapshotRow {
    SnapshotRow {
        customer_id: id.to_string(),
        snapshot_month: month(),
        tenure,
        monthly_charges: monthly,
        total_charges: total,
        payment_method: method.to_string(),
        churn: None,
    }
}

fn bucket_flags(r: &churnwatch_core::features::EngineeredRow) -> [f64; 5] {
    [
        r.tenure_bucket_0_6,
        r.tenure_bucket_7_12,
        r.tenure_bucket_13_24,
        r.tenure_bucket_25_48,
        r.tenure_bucket_49_plus,
    ]
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Every tenure value falls in exactly one bracket: the indicators are
/// mutually exclusive and their disjunction is always true.
#[test]
fn tenure_buckets_partition_every_tenure() {
    let rows: Vec<SnapshotRow> = (0..=120)
        .map(|t| row(&format!("C{t}"), t, 50.0, 500.0, payment_method::MAILED_CHECK))
        .collect();

    for engineered in features::engineer(&rows) {
        let set: f64 = bucket_flags(&engineered).iter().sum();
        assert_eq!(
            set, 1.0,
            "tenure {} must fall in exactly one bucket",
            engineered.tenure
        );
    }
}

/// Spec case: tenures [5, 10, 50] land in buckets 0-6, 7-12 and 49+
/// respectively, with all other bucket flags zero.
#[test]
fn three_customer_bucket_assignment() {
    let rows = vec![
        row("a", 5, 70.0, 350.0, payment_method::ELECTRONIC_CHECK),
        row("b", 10, 50.0, 500.0, payment_method::MAILED_CHECK),
        row("c", 50, 90.0, 4500.0, payment_method::CREDIT_CARD_AUTO),
    ];
    let engineered = features::engineer(&rows);

    assert_eq!(bucket_flags(&engineered[0]), [1.0, 0.0, 0.0, 0.0, 0.0]);
    assert_eq!(bucket_flags(&engineered[1]), [0.0, 1.0, 0.0, 0.0, 0.0]);
    assert_eq!(bucket_flags(&engineered[2]), [0.0, 0.0, 0.0, 0.0, 1.0]);
}

#[test]
fn tenure_flags_follow_thresholds() {
    let rows = vec![
        row("new", 6, 50.0, 300.0, payment_method::MAILED_CHECK),
        row("mid", 7, 50.0, 350.0, payment_method::MAILED_CHECK),
        row("long", 24, 50.0, 1200.0, payment_method::MAILED_CHECK),
    ];
    let engineered = features::engineer(&rows);

    assert_eq!(engineered[0].is_new_customer, 1.0);
    assert_eq!(engineered[1].is_new_customer, 0.0);
    assert_eq!(engineered[1].is_long_tenure, 0.0);
    assert_eq!(engineered[2].is_long_tenure, 1.0);
}

/// Auto-payment comes only from the two automatic payment methods.
#[test]
fn auto_payment_flag_from_method() {
    let rows = vec![
        row("cc", 12, 50.0, 600.0, payment_method::CREDIT_CARD_AUTO),
        row("bank", 12, 50.0, 600.0, payment_method::BANK_TRANSFER_AUTO),
        row("echeck", 12, 50.0, 600.0, payment_method::ELECTRONIC_CHECK),
        row("mail", 12, 50.0, 600.0, payment_method::MAILED_CHECK),
    ];
    let engineered = features::engineer(&rows);

    assert_eq!(engineered[0].is_auto_payment, 1.0);
    assert_eq!(engineered[1].is_auto_payment, 1.0);
    assert_eq!(engineered[2].is_auto_payment, 0.0);
    assert_eq!(engineered[3].is_auto_payment, 0.0);
}

/// The above-average flag is relative to the batch mean, so the same
/// charge can flip depending on the rest of the batch.
#[test]
fn above_avg_charge_relative_to_batch() {
    let rows = vec![
        row("low", 12, 30.0, 360.0, payment_method::MAILED_CHECK),
        row("high", 12, 90.0, 1080.0, payment_method::MAILED_CHECK),
    ];
    let engineered = features::engineer(&rows);

    // mean = 60
    assert_eq!(engineered[0].above_avg_charge, 0.0);
    assert_eq!(engineered[1].above_avg_charge, 1.0);
}

#[test]
fn interaction_features_exact() {
    let rows = vec![row("a", 10, 50.0, 480.0, payment_method::MAILED_CHECK)];
    let engineered = features::engineer(&rows);

    assert_eq!(engineered[0].price_tenure_interaction, 500.0);
    // 480 / (10 + 1)
    assert!((engineered[0].total_charges_tenure_ratio - 480.0 / 11.0).abs() < 1e-12);
}

/// Tenure zero must not divide by zero in the ratio feature.
#[test]
fn zero_tenure_ratio_is_finite() {
    let rows = vec![row("a", 0, 40.0, 40.0, payment_method::MAILED_CHECK)];
    let engineered = features::engineer(&rows);

    assert_eq!(engineered[0].total_charges_tenure_ratio, 40.0);
}

/// The named contract resolves every canonical feature and rejects
/// anything else.
#[test]
fn vector_honors_named_contract() {
    let rows = vec![row("a", 10, 50.0, 480.0, payment_method::MAILED_CHECK)];
    let engineered = features::engineer(&rows);

    let names: Vec<String> = FEATURE_NAMES.iter().map(|s| s.to_string()).collect();
    let vector = engineered[0].vector(&names).unwrap();
    assert_eq!(vector.len(), FEATURE_NAMES.len());

    let bogus = vec!["not_a_feature".to_string()];
    match engineered[0].vector(&bogus) {
        Err(PipelineError::FeatureMismatch { name }) => assert_eq!(name, "not_a_feature"),
        other => panic!("Expected FeatureMismatch, got {other:?}"),
    }
}

#[test]
fn empty_batch_yields_empty_output() {
    assert!(features::engineer(&[]).is_empty());
}
