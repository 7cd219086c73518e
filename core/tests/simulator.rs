use churnwatch_core::config::PipelineConfig;
use churnwatch_core::error::PipelineError;
use churnwatch_core::rng::{PipelineRng, StreamSlot};
use churnwatch_core::simulator;
use churnwatch_core::snapshot::{payment_method, SnapshotMonth, SnapshotRow};
use churnwatch_core::store::ChurnStore;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn store_with_month(month: SnapshotMonth, rows: &[SnapshotRow]) -> ChurnStore {
    let store = ChurnStore::in_memory().unwrap();
    store.migrate().unwrap();
    store.insert_snapshot_rows(rows).unwrap();
    assert_eq!(store.snapshot_count(month).unwrap(), rows.len() as i64);
    store
}

fn row(id: &str, month: SnapshotMonth, tenure: u32, monthly: f64, total: f64) -> SnapshotRow {
    SnapshotRow {
        customer_id: id.to_string(),
        snapshot_month: month,
        tenure,
        monthly_charges: monthly,
        total_charges: total,
        payment_method: payment_method::ELECTRONIC_CHECK.to_string(),
        churn: Some(0),
    }
}

fn sim_rng(seed: u64) -> PipelineRng {
    PipelineRng::for_stream(seed, StreamSlot::Simulate)
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Tenure strictly increases by exactly 1 and total charges grow by
/// exactly the prior month's monthly charge, per customer.
#[test]
fn advance_increments_tenure_and_accumulates_total() {
    let jan = SnapshotMonth::new(2026, 1).unwrap();
    let rows = vec![
        row("a", jan, 5, 70.0, 350.0),
        row("b", jan, 10, 50.0, 500.0),
        row("c", jan, 50, 90.0, 4500.0),
    ];
    let store = store_with_month(jan, &rows);
    let config = PipelineConfig::default();

    let next = simulator::simulate_next_month(&store, &config, &mut sim_rng(7)).unwrap();
    let advanced = store.snapshot_for_month(next).unwrap();
    assert_eq!(advanced.len(), 3);

    for new_row in &advanced {
        let old = rows
            .iter()
            .find(|r| r.customer_id == new_row.customer_id)
            .unwrap();
        assert_eq!(new_row.tenure, old.tenure + 1);
        assert!(
            (new_row.total_charges - (old.total_charges + old.monthly_charges)).abs() < 1e-9,
            "total must grow by exactly the prior monthly charge"
        );
    }
}

/// The new batch is stamped with the following calendar month, day 1,
/// including across a year boundary.
#[test]
fn advance_stamps_next_month_day_one() {
    let dec = SnapshotMonth::new(2026, 12).unwrap();
    let store = store_with_month(dec, &[row("a", dec, 3, 40.0, 120.0)]);
    let config = PipelineConfig::default();

    let next = simulator::simulate_next_month(&store, &config, &mut sim_rng(7)).unwrap();
    assert_eq!(next, SnapshotMonth::new(2027, 1).unwrap());
    assert!(next.as_sql().ends_with("-01"));
}

/// The charge perturbation is Gaussian around the prior value; with
/// std 0.02 a drift beyond ±20% would be far outside the distribution.
#[test]
fn charge_perturbation_stays_plausible() {
    let jan = SnapshotMonth::new(2026, 1).unwrap();
    let rows: Vec<SnapshotRow> = (0..100)
        .map(|i| row(&format!("C{i}"), jan, 12, 60.0, 720.0))
        .collect();
    let store = store_with_month(jan, &rows);
    let config = PipelineConfig::default();

    let next = simulator::simulate_next_month(&store, &config, &mut sim_rng(11)).unwrap();
    for advanced in store.snapshot_for_month(next).unwrap() {
        assert!(
            (advanced.monthly_charges - 60.0).abs() < 12.0,
            "charge {} drifted implausibly far",
            advanced.monthly_charges
        );
    }
}

/// Simulated rows are unlabeled — the churn label exists only on the
/// training month.
#[test]
fn advance_clears_churn_label() {
    let jan = SnapshotMonth::new(2026, 1).unwrap();
    let store = store_with_month(jan, &[row("a", jan, 3, 40.0, 120.0)]);
    let config = PipelineConfig::default();

    let next = simulator::simulate_next_month(&store, &config, &mut sim_rng(7)).unwrap();
    let advanced = store.snapshot_for_month(next).unwrap();
    assert_eq!(advanced[0].churn, None);
}

/// Same seed, same input month → identical perturbed charges.
#[test]
fn simulation_is_deterministic_per_seed() {
    let jan = SnapshotMonth::new(2026, 1).unwrap();
    let rows: Vec<SnapshotRow> = (0..20)
        .map(|i| row(&format!("C{i}"), jan, 12, 55.0, 660.0))
        .collect();

    let charges = |seed: u64| -> Vec<f64> {
        let store = store_with_month(jan, &rows);
        let config = PipelineConfig::default();
        let next = simulator::simulate_next_month(&store, &config, &mut sim_rng(seed)).unwrap();
        store
            .snapshot_for_month(next)
            .unwrap()
            .iter()
            .map(|r| r.monthly_charges)
            .collect()
    };

    assert_eq!(charges(42), charges(42));
    assert_ne!(charges(42), charges(43));
}

/// An empty snapshot table has nothing to advance.
#[test]
fn empty_store_is_an_error() {
    let store = ChurnStore::in_memory().unwrap();
    store.migrate().unwrap();
    let config = PipelineConfig::default();

    match simulator::simulate_next_month(&store, &config, &mut sim_rng(7)) {
        Err(PipelineError::NoSnapshots) => {}
        other => panic!("Expected NoSnapshots, got {other:?}"),
    }
}
