//! Fitted model artifacts — the feature scaler, the logistic classifier,
//! and loading/saving of the serialized set.
//!
//! Artifacts are serialized to JSON with serde, one file each, under the
//! configured model directory. The scaler carries the feature-name contract;
//! the scorer resolves features by those names, never by position.

use crate::{
    error::{PipeResult, PipelineError},
    forest::RandomForest,
    types::ModelKind,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const SCALER_FILE: &str = "scaler.json";
pub const LOGISTIC_FILE: &str = "logistic_regression.json";
pub const FOREST_FILE: &str = "random_forest.json";

/// The contract every fitted classifier fulfills: a probability of the
/// positive (churn) class for one scaled feature vector.
pub trait Classifier {
    fn kind(&self) -> ModelKind;
    fn predict_proba(&self, features: &[f64]) -> f64;
}

// ── Scaler ───────────────────────────────────────────────────────────────────

/// Per-feature standardization: (x - mean) / std, fit on training data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Training-time feature names, in training-time order.
    pub feature_names: Vec<String>,
    pub means: Vec<f64>,
    pub stds:  Vec<f64>,
}

impl StandardScaler {
    /// Fit on a row-major matrix whose columns follow `feature_names`.
    pub fn fit(feature_names: &[&str], rows: &[Vec<f64>]) -> Self {
        let d = feature_names.len();
        let n = rows.len().max(1) as f64;

        let mut means = vec![0.0; d];
        for row in rows {
            for (j, v) in row.iter().enumerate() {
                means[j] += v;
            }
        }
        for m in &mut means {
            *m /= n;
        }

        let mut stds = vec![0.0; d];
        for row in rows {
            for (j, v) in row.iter().enumerate() {
                let delta = v - means[j];
                stds[j] += delta * delta;
            }
        }
        for s in &mut stds {
            *s = (*s / n).sqrt();
            // Constant columns (e.g. a bucket nobody falls in) pass through.
            if *s < 1e-12 {
                *s = 1.0;
            }
        }

        Self {
            feature_names: feature_names.iter().map(|s| s.to_string()).collect(),
            means,
            stds,
        }
    }

    pub fn transform(&self, features: &[f64]) -> PipeResult<Vec<f64>> {
        if features.len() != self.means.len() {
            return Err(PipelineError::FeatureLength {
                expected: self.means.len(),
                actual: features.len(),
            });
        }
        Ok(features
            .iter()
            .zip(self.means.iter().zip(&self.stds))
            .map(|(v, (mean, std))| (v - mean) / std)
            .collect())
    }
}

// ── Logistic regression ──────────────────────────────────────────────────────

/// Logistic regression trained by full-batch gradient descent with
/// class-balanced sample weighting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    pub weights:   Vec<f64>,
    pub intercept: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct LogisticFitParams {
    pub epochs:        usize,
    pub learning_rate: f64,
}

impl Default for LogisticFitParams {
    fn default() -> Self {
        Self {
            epochs: 500,
            learning_rate: 0.1,
        }
    }
}

impl LogisticModel {
    /// Fit on scaled features. `y` holds 0/1 churn labels.
    pub fn fit(x: &[Vec<f64>], y: &[i64], params: LogisticFitParams) -> Self {
        let n = x.len();
        let d = x.first().map(|r| r.len()).unwrap_or(0);
        let mut weights = vec![0.0; d];
        let mut intercept = 0.0;

        if n == 0 || d == 0 {
            return Self { weights, intercept };
        }

        // Balanced class weights: n / (2 * class_count), like the source's
        // class_weight="balanced".
        let n_pos = y.iter().filter(|&&v| v == 1).count().max(1) as f64;
        let n_neg = (n - y.iter().filter(|&&v| v == 1).count()).max(1) as f64;
        let w_pos = n as f64 / (2.0 * n_pos);
        let w_neg = n as f64 / (2.0 * n_neg);

        for _ in 0..params.epochs {
            let mut grad = vec![0.0; d];
            let mut grad_b = 0.0;

            for (row, &label) in x.iter().zip(y) {
                let z = intercept
                    + row.iter().zip(&weights).map(|(v, w)| v * w).sum::<f64>();
                let p = sigmoid(z);
                let sample_weight = if label == 1 { w_pos } else { w_neg };
                let err = sample_weight * (p - label as f64);

                for (g, v) in grad.iter_mut().zip(row) {
                    *g += err * v;
                }
                grad_b += err;
            }

            let step = params.learning_rate / n as f64;
            for (w, g) in weights.iter_mut().zip(&grad) {
                *w -= step * g;
            }
            intercept -= step * grad_b;
        }

        Self { weights, intercept }
    }
}

impl Classifier for LogisticModel {
    fn kind(&self) -> ModelKind {
        ModelKind::Logistic
    }

    fn predict_proba(&self, features: &[f64]) -> f64 {
        let z = self.intercept
            + features
                .iter()
                .zip(&self.weights)
                .map(|(v, w)| v * w)
                .sum::<f64>();
        sigmoid(z)
    }
}

pub fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

// ── Artifact set ─────────────────────────────────────────────────────────────

/// The three fitted artifacts the scoring step consumes.
#[derive(Debug, Clone)]
pub struct ModelArtifacts {
    pub scaler:   StandardScaler,
    pub logistic: LogisticModel,
    pub forest:   RandomForest,
}

impl ModelArtifacts {
    pub fn save(&self, dir: &Path) -> PipeResult<()> {
        std::fs::create_dir_all(dir)?;
        write_json(&dir.join(SCALER_FILE), &self.scaler)?;
        write_json(&dir.join(LOGISTIC_FILE), &self.logistic)?;
        write_json(&dir.join(FOREST_FILE), &self.forest)?;
        log::info!("models saved to {}", dir.display());
        Ok(())
    }

    pub fn load(dir: &Path) -> PipeResult<Self> {
        Ok(Self {
            scaler: read_json(&dir.join(SCALER_FILE))?,
            logistic: read_json(&dir.join(LOGISTIC_FILE))?,
            forest: read_json(&dir.join(FOREST_FILE))?,
        })
    }

    /// The fitted classifiers in scoring order.
    pub fn classifiers(&self) -> [&dyn Classifier; 2] {
        [&self.logistic, &self.forest]
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> PipeResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> PipeResult<T> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
