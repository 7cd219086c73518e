//! Random forest classifier — bootstrap-sampled, Gini-split CART trees
//! with per-split feature subsampling.
//!
//! Training is deterministic: all sampling flows through the Forest RNG
//! stream. Trees are depth- and leaf-limited to keep the serialized
//! artifact small.

use crate::{
    model::Classifier,
    rng::PipelineRng,
    types::ModelKind,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        probability: f64,
    },
    Split {
        feature:   usize,
        threshold: f64,
        left:      Box<TreeNode>,
        right:     Box<TreeNode>,
    },
}

impl TreeNode {
    fn predict(&self, features: &[f64]) -> f64 {
        match self {
            TreeNode::Leaf { probability } => *probability,
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                let value = features.get(*feature).copied().unwrap_or(0.0);
                if value <= *threshold {
                    left.predict(features)
                } else {
                    right.predict(features)
                }
            }
        }
    }

    fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ForestFitParams {
    pub n_trees:   usize,
    pub max_depth: usize,
    pub min_leaf:  usize,
}

impl Default for ForestFitParams {
    fn default() -> Self {
        Self {
            n_trees: 50,
            max_depth: 6,
            min_leaf: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    pub trees:      Vec<TreeNode>,
    pub n_features: usize,
}

impl RandomForest {
    pub fn fit(
        x: &[Vec<f64>],
        y: &[i64],
        params: ForestFitParams,
        rng: &mut PipelineRng,
    ) -> Self {
        let n = x.len();
        let n_features = x.first().map(|r| r.len()).unwrap_or(0);

        if n == 0 || n_features == 0 {
            return Self {
                trees: vec![TreeNode::Leaf { probability: 0.0 }],
                n_features,
            };
        }

        let mut trees = Vec::with_capacity(params.n_trees);
        for _ in 0..params.n_trees {
            // Bootstrap sample with replacement, same size as the input.
            let indices: Vec<usize> = (0..n)
                .map(|_| rng.next_u64_below(n as u64) as usize)
                .collect();
            trees.push(build_node(x, y, &indices, 0, &params, rng));
        }

        Self { trees, n_features }
    }

    pub fn max_tree_depth(&self) -> usize {
        self.trees.iter().map(TreeNode::depth).max().unwrap_or(0)
    }
}

impl Classifier for RandomForest {
    fn kind(&self) -> ModelKind {
        ModelKind::Forest
    }

    /// Mean of per-tree leaf class fractions.
    fn predict_proba(&self, features: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict(features)).sum();
        sum / self.trees.len() as f64
    }
}

fn build_node(
    x: &[Vec<f64>],
    y: &[i64],
    indices: &[usize],
    depth: usize,
    params: &ForestFitParams,
    rng: &mut PipelineRng,
) -> TreeNode {
    let n = indices.len();
    let positives = indices.iter().filter(|&&i| y[i] == 1).count();
    let probability = positives as f64 / n as f64;

    let pure = positives == 0 || positives == n;
    if pure || depth >= params.max_depth || n < 2 * params.min_leaf {
        return TreeNode::Leaf { probability };
    }

    let n_features = x[0].len();
    let Some((feature, threshold)) =
        best_split(x, y, indices, n_features, params.min_leaf, rng)
    else {
        return TreeNode::Leaf { probability };
    };

    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .copied()
        .partition(|&i| x[i][feature] <= threshold);

    if left_idx.len() < params.min_leaf || right_idx.len() < params.min_leaf {
        return TreeNode::Leaf { probability };
    }

    TreeNode::Split {
        feature,
        threshold,
        left: Box::new(build_node(x, y, &left_idx, depth + 1, params, rng)),
        right: Box::new(build_node(x, y, &right_idx, depth + 1, params, rng)),
    }
}

/// Evaluate sqrt(d) randomly chosen features; for each, candidate
/// thresholds are midpoints between adjacent distinct sorted values.
/// Returns the (feature, threshold) with the lowest weighted Gini.
fn best_split(
    x: &[Vec<f64>],
    y: &[i64],
    indices: &[usize],
    n_features: usize,
    min_leaf: usize,
    rng: &mut PipelineRng,
) -> Option<(usize, f64)> {
    let k = (n_features as f64).sqrt().ceil() as usize;
    let mut candidates: Vec<usize> = (0..n_features).collect();
    rng.shuffle(&mut candidates);
    candidates.truncate(k.max(1));

    let mut best: Option<(usize, f64, f64)> = None; // (feature, threshold, gini)

    for &feature in &candidates {
        let mut values: Vec<(f64, i64)> = indices
            .iter()
            .map(|&i| (x[i][feature], y[i]))
            .collect();
        values.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let total = values.len();
        let total_pos: usize = values.iter().filter(|(_, l)| *l == 1).count();

        let mut left_n = 0usize;
        let mut left_pos = 0usize;

        for w in 0..total - 1 {
            left_n += 1;
            if values[w].1 == 1 {
                left_pos += 1;
            }

            // Only split between distinct values.
            if values[w].0 == values[w + 1].0 {
                continue;
            }
            let right_n = total - left_n;
            if left_n < min_leaf || right_n < min_leaf {
                continue;
            }

            let right_pos = total_pos - left_pos;
            let gini = weighted_gini(left_n, left_pos, right_n, right_pos);

            if best.map(|(_, _, g)| gini < g).unwrap_or(true) {
                let threshold = (values[w].0 + values[w + 1].0) / 2.0;
                best = Some((feature, threshold, gini));
            }
        }
    }

    best.map(|(feature, threshold, _)| (feature, threshold))
}

fn weighted_gini(left_n: usize, left_pos: usize, right_n: usize, right_pos: usize) -> f64 {
    let total = (left_n + right_n) as f64;
    let gini = |n: usize, pos: usize| -> f64 {
        if n == 0 {
            return 0.0;
        }
        let p = pos as f64 / n as f64;
        2.0 * p * (1.0 - p)
    };
    (left_n as f64 / total) * gini(left_n, left_pos)
        + (right_n as f64 / total) * gini(right_n, right_pos)
}
