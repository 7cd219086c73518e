//! Demo population generator — a synthetic, labeled month-1 snapshot so
//! the pipeline can be exercised end to end without real data.
//!
//! Labels come from a noisy linear rule: short tenure, high charges and
//! manual payment all push churn probability up. That gives the trainers
//! real signal to find.

use crate::{
    config::PipelineConfig,
    error::PipeResult,
    rng::PipelineRng,
    snapshot::{payment_method, SnapshotMonth, SnapshotRow},
    store::ChurnStore,
};

/// Generate and persist `config.demo_customers` labeled rows for `month`.
/// Returns the number of rows written.
pub fn generate_demo_snapshot(
    store: &ChurnStore,
    config: &PipelineConfig,
    month: SnapshotMonth,
    rng: &mut PipelineRng,
) -> PipeResult<usize> {
    let n = config.demo_customers;
    let mut rows = Vec::with_capacity(n);

    for i in 0..n {
        rows.push(demo_row(i, month, rng));
    }

    store.insert_snapshot_rows(&rows)?;
    log::info!("month={month} seed: generated {n} demo customers");
    Ok(n)
}

fn demo_row(index: usize, month: SnapshotMonth, rng: &mut PipelineRng) -> SnapshotRow {
    let customer_id = format!("C{:05}", index + 1);

    let tenure = rng.next_u64_below(72) as u32;
    let monthly_charges = 20.0 + 80.0 * rng.next_f64();
    // Historical spend with a little billing noise per month served.
    let total_charges =
        monthly_charges * (tenure as f64 + 1.0) * (1.0 + rng.normal(0.0, 0.05)).max(0.5);

    let method = pick_payment_method(rng);
    let churn = churn_label(tenure, monthly_charges, method, rng);

    SnapshotRow {
        customer_id,
        snapshot_month: month,
        tenure,
        monthly_charges,
        total_charges,
        payment_method: method.to_string(),
        churn: Some(churn),
    }
}

fn pick_payment_method(rng: &mut PipelineRng) -> &'static str {
    // Electronic check dominates, mirroring the usual telco mix.
    let roll = rng.next_f64();
    if roll < 0.35 {
        payment_method::ELECTRONIC_CHECK
    } else if roll < 0.55 {
        payment_method::MAILED_CHECK
    } else if roll < 0.78 {
        payment_method::CREDIT_CARD_AUTO
    } else {
        payment_method::BANK_TRANSFER_AUTO
    }
}

fn churn_label(tenure: u32, monthly_charges: f64, method: &str, rng: &mut PipelineRng) -> i64 {
    let mut p = 0.40;
    p -= 0.005 * tenure as f64;
    p += 0.003 * (monthly_charges - 55.0);
    if method == payment_method::ELECTRONIC_CHECK {
        p += 0.15;
    }
    if payment_method::is_automatic(method) {
        p -= 0.10;
    }

    if rng.chance(p.clamp(0.02, 0.90)) {
        1
    } else {
        0
    }
}
