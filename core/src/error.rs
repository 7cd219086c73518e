use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No snapshot rows for month {month}")]
    EmptySnapshot { month: String },

    #[error("Snapshot table is empty; nothing to advance")]
    NoSnapshots,

    #[error("No predictions for month {month}, model '{model}'")]
    NoPredictions { month: String, model: String },

    #[error("Feature '{name}' is not part of the engineered feature set")]
    FeatureMismatch { name: String },

    #[error("Feature vector length mismatch: expected {expected}, got {actual}")]
    FeatureLength { expected: usize, actual: usize },

    #[error("No labeled rows in month {month}; cannot train")]
    NoLabels { month: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type PipeResult<T> = Result<T, PipelineError>;
