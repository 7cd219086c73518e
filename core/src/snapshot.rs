//! Monthly snapshot primitives — the month key and the raw customer row.

use crate::types::CustomerId;
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A calendar month, represented as the first day of that month.
/// All snapshot, prediction and metrics rows are keyed by this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SnapshotMonth(NaiveDate);

impl SnapshotMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    /// Clamp an arbitrary date to the first of its month.
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.with_day(1).unwrap_or(date))
    }

    /// Parse either "YYYY-MM" or a full "YYYY-MM-DD" date.
    pub fn parse(s: &str) -> Option<Self> {
        let full = if s.len() == 7 { format!("{s}-01") } else { s.to_string() };
        NaiveDate::parse_from_str(&full, "%Y-%m-%d")
            .ok()
            .map(Self::from_date)
    }

    /// The following calendar month, clamped to day 1.
    pub fn next(self) -> Self {
        self.0
            .checked_add_months(Months::new(1))
            .map(Self::from_date)
            .unwrap_or(self)
    }

    /// The preceding calendar month, clamped to day 1.
    pub fn prev(self) -> Self {
        self.0
            .checked_sub_months(Months::new(1))
            .map(Self::from_date)
            .unwrap_or(self)
    }

    /// ISO date string used as the `snapshot_month` column value.
    pub fn as_sql(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for SnapshotMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m"))
    }
}

/// One customer's state for one month. Immutable after write; the next
/// month's row for the same customer supersedes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRow {
    pub customer_id:     CustomerId,
    pub snapshot_month:  SnapshotMonth,
    pub tenure:          u32,
    pub monthly_charges: f64,
    pub total_charges:   f64,
    pub payment_method:  String,
    /// Churn label, present only on labeled training months.
    pub churn:           Option<i64>,
}

/// Payment methods carried on snapshot rows. The two automatic methods
/// drive the `is_auto_payment` feature.
pub mod payment_method {
    pub const ELECTRONIC_CHECK: &str = "electronic_check";
    pub const MAILED_CHECK: &str = "mailed_check";
    pub const CREDIT_CARD_AUTO: &str = "credit_card_automatic";
    pub const BANK_TRANSFER_AUTO: &str = "bank_transfer_automatic";

    pub const ALL: [&str; 4] = [
        ELECTRONIC_CHECK,
        MAILED_CHECK,
        CREDIT_CARD_AUTO,
        BANK_TRANSFER_AUTO,
    ];

    pub fn is_automatic(method: &str) -> bool {
        method == CREDIT_CARD_AUTO || method == BANK_TRANSFER_AUTO
    }
}
