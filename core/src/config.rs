//! Pipeline configuration — loaded once at startup, passed in explicitly.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// SQLite database path. ":memory:" is valid for tests.
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Directory holding the serialized model artifacts.
    #[serde(default = "default_model_dir")]
    pub model_dir: String,

    /// Probability at or above which a customer counts as high risk.
    #[serde(default = "default_high_risk_threshold")]
    pub high_risk_threshold: f64,

    /// Std of the per-row Gaussian charge perturbation when simulating.
    #[serde(default = "default_sim_noise_std")]
    pub sim_noise_std: f64,

    /// Master seed. Every RNG stream in the pipeline derives from it.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Population size for the synthetic month-1 snapshot.
    #[serde(default = "default_demo_customers")]
    pub demo_customers: usize,
}

fn default_db_path() -> String {
    "churnwatch.db".to_string()
}
fn default_model_dir() -> String {
    "models".to_string()
}
fn default_high_risk_threshold() -> f64 {
    0.6
}
fn default_sim_noise_std() -> f64 {
    0.02
}
fn default_seed() -> u64 {
    42
}
fn default_demo_customers() -> usize {
    200
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            model_dir: default_model_dir(),
            high_risk_threshold: default_high_risk_threshold(),
            sim_noise_std: default_sim_noise_std(),
            seed: default_seed(),
            demo_customers: default_demo_customers(),
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config {}: {e}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {e}", path.display()))?;
        Ok(config)
    }
}
