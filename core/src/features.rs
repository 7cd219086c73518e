//! Feature engineering — derives the model-ready feature set from raw
//! snapshot rows.
//!
//! The engineered feature set is a named contract: the fitted scaler records
//! the feature names it was trained with, and `EngineeredRow::vector`
//! resolves those names at call time. A name the engineer does not produce
//! is an error, never a silent column shift.

use crate::{
    error::{PipeResult, PipelineError},
    snapshot::{payment_method, SnapshotRow},
    types::CustomerId,
};

/// Canonical training-time feature order. The scaler is fit against this
/// list; scoring resolves whatever order the fitted scaler recorded.
pub const FEATURE_NAMES: [&str; 14] = [
    "tenure",
    "monthly_charges",
    "total_charges",
    "is_new_customer",
    "is_long_tenure",
    "above_avg_charge",
    "is_auto_payment",
    "price_tenure_interaction",
    "total_charges_tenure_ratio",
    "tenure_bucket_0_6",
    "tenure_bucket_7_12",
    "tenure_bucket_13_24",
    "tenure_bucket_25_48",
    "tenure_bucket_49_plus",
];

/// One customer's engineered feature values for one month.
#[derive(Debug, Clone)]
pub struct EngineeredRow {
    pub customer_id:     CustomerId,
    pub monthly_charges: f64,
    pub churn:           Option<i64>,

    pub tenure:                     f64,
    pub total_charges:              f64,
    pub is_new_customer:            f64,
    pub is_long_tenure:             f64,
    pub above_avg_charge:           f64,
    pub is_auto_payment:            f64,
    pub price_tenure_interaction:   f64,
    pub total_charges_tenure_ratio: f64,
    pub tenure_bucket_0_6:          f64,
    pub tenure_bucket_7_12:         f64,
    pub tenure_bucket_13_24:        f64,
    pub tenure_bucket_25_48:        f64,
    pub tenure_bucket_49_plus:      f64,
}

impl EngineeredRow {
    /// Look up a single feature by contract name.
    pub fn feature(&self, name: &str) -> Option<f64> {
        let value = match name {
            "tenure" => self.tenure,
            "monthly_charges" => self.monthly_charges,
            "total_charges" => self.total_charges,
            "is_new_customer" => self.is_new_customer,
            "is_long_tenure" => self.is_long_tenure,
            "above_avg_charge" => self.above_avg_charge,
            "is_auto_payment" => self.is_auto_payment,
            "price_tenure_interaction" => self.price_tenure_interaction,
            "total_charges_tenure_ratio" => self.total_charges_tenure_ratio,
            "tenure_bucket_0_6" => self.tenure_bucket_0_6,
            "tenure_bucket_7_12" => self.tenure_bucket_7_12,
            "tenure_bucket_13_24" => self.tenure_bucket_13_24,
            "tenure_bucket_25_48" => self.tenure_bucket_25_48,
            "tenure_bucket_49_plus" => self.tenure_bucket_49_plus,
            _ => return None,
        };
        Some(value)
    }

    /// Assemble the feature vector in the order the caller requires,
    /// typically the fitted scaler's recorded feature names.
    pub fn vector(&self, names: &[String]) -> PipeResult<Vec<f64>> {
        names
            .iter()
            .map(|name| {
                self.feature(name).ok_or_else(|| PipelineError::FeatureMismatch {
                    name: name.clone(),
                })
            })
            .collect()
    }
}

/// Engineer features for a whole monthly batch. The above-average-charge
/// flag is relative to this batch's mean, so it must see all rows at once.
pub fn engineer(rows: &[SnapshotRow]) -> Vec<EngineeredRow> {
    if rows.is_empty() {
        return Vec::new();
    }

    let avg_charge =
        rows.iter().map(|r| r.monthly_charges).sum::<f64>() / rows.len() as f64;

    rows.iter().map(|row| engineer_row(row, avg_charge)).collect()
}

fn engineer_row(row: &SnapshotRow, avg_charge: f64) -> EngineeredRow {
    let tenure = row.tenure;
    let as_flag = |b: bool| if b { 1.0 } else { 0.0 };

    EngineeredRow {
        customer_id: row.customer_id.clone(),
        monthly_charges: row.monthly_charges,
        churn: row.churn,

        tenure: tenure as f64,
        total_charges: row.total_charges,
        is_new_customer: as_flag(tenure <= 6),
        is_long_tenure: as_flag(tenure >= 24),
        above_avg_charge: as_flag(row.monthly_charges > avg_charge),
        is_auto_payment: as_flag(payment_method::is_automatic(&row.payment_method)),
        price_tenure_interaction: row.monthly_charges * tenure as f64,
        total_charges_tenure_ratio: row.total_charges / (tenure as f64 + 1.0),
        tenure_bucket_0_6: as_flag(tenure <= 6),
        tenure_bucket_7_12: as_flag((7..=12).contains(&tenure)),
        tenure_bucket_13_24: as_flag((13..=24).contains(&tenure)),
        tenure_bucket_25_48: as_flag((25..=48).contains(&tenure)),
        tenure_bucket_49_plus: as_flag(tenure >= 49),
    }
}
