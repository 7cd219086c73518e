//! Metrics evaluator — aggregate and rank-stability statistics across
//! consecutive months of predictions.
//!
//! For each model: mean probability, high-risk fraction, revenue at risk,
//! and Spearman rank correlation of probabilities against the prior month
//! (inner join on customer id). Stability is None on the first scored
//! month, and on a zero-overlap join.

use crate::{
    config::PipelineConfig,
    error::{PipeResult, PipelineError},
    scorer::PredictionRow,
    snapshot::SnapshotMonth,
    store::ChurnStore,
    types::ModelKind,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One (month, model) metrics row. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsRow {
    pub snapshot_month:        SnapshotMonth,
    pub model_name:            String,
    pub avg_churn_probability: f64,
    pub high_risk_pct:         f64,
    pub revenue_at_risk:       f64,
    pub rank_stability:        Option<f64>,
}

/// Evaluate both models for `month`, appending one metrics row each.
pub fn evaluate_month(
    store: &ChurnStore,
    config: &PipelineConfig,
    month: SnapshotMonth,
) -> PipeResult<Vec<MetricsRow>> {
    let mut out = Vec::with_capacity(ModelKind::ALL.len());

    for model in ModelKind::ALL {
        let current = store.predictions_for(month, model)?;
        if current.is_empty() {
            return Err(PipelineError::NoPredictions {
                month: month.to_string(),
                model: model.name().to_string(),
            });
        }
        let previous = store.predictions_for(month.prev(), model)?;

        let row = compute_metrics(&current, &previous, month, model, config.high_risk_threshold);
        store.append_metrics(&row)?;

        log::info!(
            "month={month} evaluate: model={} avg_p={:.4} high_risk={:.3} revenue_at_risk={:.2} stability={:?}",
            model.name(),
            row.avg_churn_probability,
            row.high_risk_pct,
            row.revenue_at_risk,
            row.rank_stability,
        );

        out.push(row);
    }

    Ok(out)
}

/// Pure metric computation over already-loaded prediction rows.
/// `previous` may be empty — stability is None in that case.
pub fn compute_metrics(
    current: &[PredictionRow],
    previous: &[PredictionRow],
    month: SnapshotMonth,
    model: ModelKind,
    high_risk_threshold: f64,
) -> MetricsRow {
    let n = current.len() as f64;
    let avg_churn_probability =
        current.iter().map(|r| r.churn_probability).sum::<f64>() / n;
    let high_risk_pct = current
        .iter()
        .filter(|r| r.churn_probability >= high_risk_threshold)
        .count() as f64
        / n;
    let revenue_at_risk = current.iter().map(|r| r.retention_priority_score).sum();

    let rank_stability = if previous.is_empty() {
        None
    } else {
        let prior: HashMap<&str, f64> = previous
            .iter()
            .map(|r| (r.customer_id.as_str(), r.churn_probability))
            .collect();

        // Inner join on customer id: only customers present in both months.
        let (mut curr_p, mut prev_p) = (Vec::new(), Vec::new());
        for row in current {
            if let Some(&p) = prior.get(row.customer_id.as_str()) {
                curr_p.push(row.churn_probability);
                prev_p.push(p);
            }
        }
        spearman(&curr_p, &prev_p)
    };

    MetricsRow {
        snapshot_month: month,
        model_name: model.name().to_string(),
        avg_churn_probability,
        high_risk_pct,
        revenue_at_risk,
        rank_stability,
    }
}

/// Spearman rank correlation with average ranks for ties.
/// None for fewer than two pairs or a zero-variance ranking.
pub fn spearman(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.len() < 2 {
        return None;
    }
    pearson(&ranks(a), &ranks(b))
}

/// Average ranks (1-based); tied values share the mean of their positions.
fn ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| {
        values[i]
            .partial_cmp(&values[j])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut out = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        // Positions i..=j (0-based) share the average 1-based rank.
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            out[idx] = avg_rank;
        }
        i = j + 1;
    }
    out
}

fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let da = x - mean_a;
        let db = y - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    let denom = (var_a * var_b).sqrt();
    if denom < 1e-12 {
        return None;
    }
    Some(cov / denom)
}
