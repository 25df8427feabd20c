//! Gradient-boosted decision stumps for binary buy/no-buy classification.
//!
//! Logistic loss, one depth-1 tree per round, Newton leaf values with L2
//! regularisation. Optional per-round feature subsampling is driven by a
//! seeded `StdRng`, so a given seed and data set always give the same model.
//! The split search runs per feature in parallel; ties resolve to the lowest
//! feature index, then the lowest threshold, which keeps results identical
//! regardless of thread count.
//!
//! Models are persisted as JSON and carry the feature names they were trained
//! on, so prediction reads the same explicit column list.

use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::features::FeatureMatrix;

/// Probabilities are clamped away from 0 and 1 before taking log-odds.
const PROB_EPS: f64 = 1e-6;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("model file {} is unreadable or corrupt: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("failed to write model file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot train on an empty data set")]
    EmptyTrainingSet,

    #[error("{rows} feature rows but {labels} labels")]
    LabelMismatch { rows: usize, labels: usize },

    #[error("model expects features {expected:?}, got {actual:?}")]
    FeatureMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("invalid model parameters: {0}")]
    InvalidParams(String),

    #[error("failed to serialize model: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Boosting hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingParams {
    /// Number of boosting rounds.
    pub n_estimators: usize,
    /// Shrinkage applied to every leaf value.
    pub learning_rate: f64,
    /// Minimum rows on each side of a split.
    pub min_samples_leaf: usize,
    /// Fraction of features considered per round, in (0, 1].
    pub feature_fraction: f64,
    /// L2 penalty on leaf values.
    pub l2_regularization: f64,
    pub seed: u64,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            min_samples_leaf: 20,
            feature_fraction: 1.0,
            l2_regularization: 1.0,
            seed: 42,
        }
    }
}

impl BoostingParams {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.n_estimators == 0 {
            return Err(ModelError::InvalidParams(
                "n_estimators must be at least 1".into(),
            ));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(ModelError::InvalidParams(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if self.min_samples_leaf == 0 {
            return Err(ModelError::InvalidParams(
                "min_samples_leaf must be at least 1".into(),
            ));
        }
        if !(self.feature_fraction > 0.0 && self.feature_fraction <= 1.0) {
            return Err(ModelError::InvalidParams(format!(
                "feature_fraction must be in (0, 1], got {}",
                self.feature_fraction
            )));
        }
        if !(self.l2_regularization >= 0.0 && self.l2_regularization.is_finite()) {
            return Err(ModelError::InvalidParams(format!(
                "l2_regularization must be non-negative, got {}",
                self.l2_regularization
            )));
        }
        Ok(())
    }
}

/// One depth-1 tree. NaN inputs take the left branch.
///
/// A `None` threshold separates missing values from all real ones: NaN goes
/// left, every number goes right. Thresholds are always finite so the model
/// survives a JSON round trip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct Stump {
    feature: usize,
    threshold: Option<f64>,
    left: f64,
    right: f64,
}

impl Stump {
    fn predict(&self, row: &[f64]) -> f64 {
        let x = row.get(self.feature).copied().unwrap_or(f64::NAN);
        let goes_left = match self.threshold {
            _ if x.is_nan() => true,
            Some(t) => x <= t,
            None => false,
        };
        if goes_left {
            self.left
        } else {
            self.right
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Split {
    feature: usize,
    threshold: Option<f64>,
    gain: f64,
    left: f64,
    right: f64,
}

impl Split {
    /// Higher gain wins; ties go to the lower feature index, then lower threshold.
    fn better(self, other: Split) -> Split {
        match self.gain.total_cmp(&other.gain) {
            std::cmp::Ordering::Greater => self,
            std::cmp::Ordering::Less => other,
            std::cmp::Ordering::Equal => {
                if (self.feature, self.threshold) <= (other.feature, other.threshold) {
                    self
                } else {
                    other
                }
            }
        }
    }
}

/// Trained binary classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingClassifier {
    params: BoostingParams,
    feature_names: Vec<String>,
    /// Log-odds of the training base rate.
    base_score: f64,
    stumps: Vec<Stump>,
    /// BLAKE3 hex digest of the training features and labels.
    training_fingerprint: String,
    trained_rows: usize,
}

impl GradientBoostingClassifier {
    /// Fit on `x` with labels `y`.
    pub fn fit(x: &FeatureMatrix, y: &[bool], params: BoostingParams) -> Result<Self, ModelError> {
        params.validate()?;
        if x.n_rows() == 0 {
            return Err(ModelError::EmptyTrainingSet);
        }
        if x.n_rows() != y.len() {
            return Err(ModelError::LabelMismatch {
                rows: x.n_rows(),
                labels: y.len(),
            });
        }

        let n = x.n_rows();
        let n_features = x.n_features();
        let columns = x.columns();
        let sorted: Vec<Vec<usize>> = columns.iter().map(|col| sort_order(col)).collect();
        let labels: Vec<f64> = y.iter().map(|&v| if v { 1.0 } else { 0.0 }).collect();

        let positive_rate = (labels.iter().sum::<f64>() / n as f64).clamp(PROB_EPS, 1.0 - PROB_EPS);
        let base_score = (positive_rate / (1.0 - positive_rate)).ln();

        let mut raw = vec![base_score; n];
        let mut rng = StdRng::seed_from_u64(params.seed);
        let per_round = ((n_features as f64 * params.feature_fraction).ceil() as usize)
            .clamp(1, n_features.max(1));
        let mut stumps = Vec::with_capacity(params.n_estimators);

        for round in 0..params.n_estimators {
            let mut grad = vec![0.0; n];
            let mut hess = vec![0.0; n];
            for i in 0..n {
                let p = sigmoid(raw[i]);
                grad[i] = p - labels[i];
                hess[i] = (p * (1.0 - p)).max(1e-12);
            }

            let candidates: Vec<usize> = if per_round < n_features {
                let mut picked = sample(&mut rng, n_features, per_round).into_vec();
                picked.sort_unstable();
                picked
            } else {
                (0..n_features).collect()
            };

            let best = candidates
                .par_iter()
                .filter_map(|&f| best_split(f, &columns[f], &sorted[f], &grad, &hess, &params))
                .reduce_with(Split::better);

            let Some(split) = best else {
                tracing::debug!(round, "no split with positive gain, stopping early");
                break;
            };

            let stump = Stump {
                feature: split.feature,
                threshold: split.threshold,
                left: split.left * params.learning_rate,
                right: split.right * params.learning_rate,
            };
            for (r, row) in raw.iter_mut().zip(x.rows()) {
                *r += stump.predict(row);
            }
            stumps.push(stump);
        }

        tracing::info!(
            rows = n,
            features = n_features,
            rounds = stumps.len(),
            positive_rate,
            "trained gradient boosting classifier"
        );

        Ok(Self {
            params,
            feature_names: x.names().to_vec(),
            base_score,
            stumps,
            training_fingerprint: fingerprint(x, y),
            trained_rows: n,
        })
    }

    /// Probability of the positive class for one row.
    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        let raw = self.base_score + self.stumps.iter().map(|s| s.predict(row)).sum::<f64>();
        sigmoid(raw)
    }

    /// Class per row, positive when probability exceeds 0.5.
    pub fn predict(&self, x: &FeatureMatrix) -> Result<Vec<bool>, ModelError> {
        self.check_features(x)?;
        Ok(x.rows().iter().map(|r| self.predict_proba(r) > 0.5).collect())
    }

    /// Fraction of rows classified correctly.
    pub fn score(&self, x: &FeatureMatrix, y: &[bool]) -> Result<f64, ModelError> {
        if x.n_rows() != y.len() {
            return Err(ModelError::LabelMismatch {
                rows: x.n_rows(),
                labels: y.len(),
            });
        }
        if y.is_empty() {
            return Ok(0.0);
        }
        let predicted = self.predict(x)?;
        let correct = predicted.iter().zip(y).filter(|(p, t)| p == t).count();
        Ok(correct as f64 / y.len() as f64)
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn params(&self) -> &BoostingParams {
        &self.params
    }

    pub fn n_trees(&self) -> usize {
        self.stumps.len()
    }

    pub fn trained_rows(&self) -> usize {
        self.trained_rows
    }

    pub fn training_fingerprint(&self) -> &str {
        &self.training_fingerprint
    }

    /// Write the model as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| ModelError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), trees = self.n_trees(), "saved model");
        Ok(())
    }

    /// Read a model written by [`save`](Self::save).
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        if !path.exists() {
            return Err(ModelError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let corrupt = |reason: String| ModelError::Corrupt {
            path: path.to_path_buf(),
            reason,
        };
        let content = std::fs::read_to_string(path).map_err(|e| corrupt(e.to_string()))?;
        let model: Self = serde_json::from_str(&content).map_err(|e| corrupt(e.to_string()))?;
        if let Some(s) = model
            .stumps
            .iter()
            .find(|s| s.feature >= model.feature_names.len())
        {
            return Err(corrupt(format!(
                "tree references feature {} but only {} features are defined",
                s.feature,
                model.feature_names.len()
            )));
        }
        Ok(model)
    }

    fn check_features(&self, x: &FeatureMatrix) -> Result<(), ModelError> {
        if x.names() != self.feature_names.as_slice() {
            return Err(ModelError::FeatureMismatch {
                expected: self.feature_names.clone(),
                actual: x.names().to_vec(),
            });
        }
        Ok(())
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Row indices ordered by value, NaN first.
fn sort_order(col: &[f64]) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..col.len()).collect();
    idx.sort_by(|&a, &b| {
        let (x, y) = (col[a], col[b]);
        y.is_nan()
            .cmp(&x.is_nan())
            .then(x.total_cmp(&y))
            .then(a.cmp(&b))
    });
    idx
}

/// Where to cut between two adjacent sorted values, if anywhere.
///
/// `Some(None)` is the missing-vs-present cut. Cuts touching an infinite value
/// are skipped so every stored threshold is finite.
fn cut_between(here: f64, next: f64) -> Option<Option<f64>> {
    match (here.is_nan(), next.is_nan()) {
        (true, true) => None,
        (true, false) => Some(None),
        (false, true) => None,
        (false, false) => {
            if here == next || !here.is_finite() || !next.is_finite() {
                return None;
            }
            let mid = here / 2.0 + next / 2.0;
            // Rounding can land on `next`; `here` still separates the two.
            Some(Some(if mid < next { mid } else { here }))
        }
    }
}

/// Best threshold on one feature by second-order gain.
fn best_split(
    feature: usize,
    col: &[f64],
    order: &[usize],
    grad: &[f64],
    hess: &[f64],
    params: &BoostingParams,
) -> Option<Split> {
    let lambda = params.l2_regularization;
    let min_leaf = params.min_samples_leaf;
    let n = order.len();
    if n < 2 * min_leaf {
        return None;
    }

    let g_total: f64 = grad.iter().sum();
    let h_total: f64 = hess.iter().sum();
    let parent = g_total * g_total / (h_total + lambda);

    let mut g_left = 0.0;
    let mut h_left = 0.0;
    let mut best: Option<Split> = None;

    for pos in 0..n - 1 {
        let i = order[pos];
        g_left += grad[i];
        h_left += hess[i];

        let left_count = pos + 1;
        if left_count < min_leaf || n - left_count < min_leaf {
            continue;
        }
        let Some(threshold) = cut_between(col[i], col[order[pos + 1]]) else {
            continue;
        };

        let g_right = g_total - g_left;
        let h_right = h_total - h_left;
        let gain = g_left * g_left / (h_left + lambda) + g_right * g_right / (h_right + lambda)
            - parent;
        if gain <= 1e-12 {
            continue;
        }

        let candidate = Split {
            feature,
            threshold,
            gain,
            left: -g_left / (h_left + lambda),
            right: -g_right / (h_right + lambda),
        };
        best = Some(match best {
            Some(b) => b.better(candidate),
            None => candidate,
        });
    }
    best
}

fn fingerprint(x: &FeatureMatrix, y: &[bool]) -> String {
    let mut hasher = blake3::Hasher::new();
    for name in x.names() {
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
    }
    for (row, &label) in x.rows().iter().zip(y) {
        for v in row {
            hasher.update(&v.to_le_bytes());
        }
        hasher.update(&[label as u8]);
    }
    hasher.finalize().to_hex().to_string()
}
