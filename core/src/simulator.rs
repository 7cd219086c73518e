//! Snapshot simulator — advances the customer population one month.
//!
//! Single steady-advance transition, invoked once per external trigger:
//! tenure += 1, total charges accumulate the current monthly charge, the
//! monthly charge drifts by independent Gaussian noise, and the batch is
//! appended under the next calendar month (day 1).

use crate::{
    config::PipelineConfig,
    error::{PipeResult, PipelineError},
    rng::PipelineRng,
    snapshot::{SnapshotMonth, SnapshotRow},
    store::ChurnStore,
};

/// Advance the latest known month by one. Returns the new month.
pub fn simulate_next_month(
    store: &ChurnStore,
    config: &PipelineConfig,
    rng: &mut PipelineRng,
) -> PipeResult<SnapshotMonth> {
    let latest = store
        .latest_snapshot_month()?
        .ok_or(PipelineError::NoSnapshots)?;
    let rows = store.snapshot_for_month(latest)?;

    let next = latest.next();
    let advanced: Vec<SnapshotRow> = rows.iter().map(|row| advance_row(row, next, config, rng)).collect();

    store.insert_snapshot_rows(&advanced)?;
    log::info!(
        "month={next} simulate: advanced {} customers from {latest}",
        advanced.len(),
    );

    Ok(next)
}

fn advance_row(
    row: &SnapshotRow,
    next: SnapshotMonth,
    config: &PipelineConfig,
    rng: &mut PipelineRng,
) -> SnapshotRow {
    // Total charges accumulate the pre-perturbation monthly charge.
    let total_charges = row.total_charges + row.monthly_charges;
    let monthly_charges = row.monthly_charges * (1.0 + rng.normal(0.0, config.sim_noise_std));

    SnapshotRow {
        customer_id: row.customer_id.clone(),
        snapshot_month: next,
        tenure: row.tenure + 1,
        monthly_charges,
        total_charges,
        payment_method: row.payment_method.clone(),
        // Labels exist only on the training month; simulated rows are unlabeled.
        churn: None,
    }
}
