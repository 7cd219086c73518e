//! Shared primitive types used across the entire pipeline.

/// A stable, unique identifier for a customer.
pub type CustomerId = String;

/// The two classifiers scored every month.
/// NEVER rename the wire names — they key prediction and metrics rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelKind {
    Logistic,
    Forest,
}

impl ModelKind {
    pub const ALL: [ModelKind; 2] = [ModelKind::Logistic, ModelKind::Forest];

    /// Stable name used in the `model_name` column.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Logistic => "logreg",
            Self::Forest => "rf",
        }
    }
}
