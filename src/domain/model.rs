//! Fitted model parameters.
//!
//! A [`TrainedModel`] is immutable once built: a per-column standardizer and a linear
//! decision boundary over the 18-element conditioned vector.

use serde::{Deserialize, Serialize};

use super::features::{Condition, SubjectFeatures, CONDITIONED_LEN};

/// Per-column z-score transform fitted on a training table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standardizer {
    pub mean: Vec<f64>,
    /// Population standard deviation; a constant column is stored as 1.0.
    pub scale: Vec<f64>,
}

impl Standardizer {
    /// Fit column means and standard deviations.
    ///
    /// Returns `None` for an empty table or ragged rows.
    #[must_use]
    pub fn fit<R: AsRef<[f64]>>(rows: &[R]) -> Option<Self> {
        let width = rows.first()?.as_ref().len();
        if width == 0 || rows.iter().any(|r| r.as_ref().len() != width) {
            return None;
        }

        let n = rows.len() as f64;
        let mut mean = vec![0.0; width];
        for row in rows {
            for (m, x) in mean.iter_mut().zip(row.as_ref()) {
                *m += x;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut var = vec![0.0; width];
        for row in rows {
            for ((v, x), m) in var.iter_mut().zip(row.as_ref()).zip(&mean) {
                let d = x - m;
                *v += d * d;
            }
        }
        let scale = var
            .into_iter()
            .map(|v| {
                let std = (v / n).sqrt();
                if std > f64::EPSILON {
                    std
                } else {
                    1.0
                }
            })
            .collect();

        Some(Self { mean, scale })
    }

    #[must_use]
    pub fn transform(&self, x: &[f64]) -> Vec<f64> {
        x.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| (x - m) / s)
            .collect()
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.mean.len()
    }
}

/// Linear decision boundary over standardized inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl LinearModel {
    /// Log-odds for an already standardized vector.
    #[must_use]
    pub fn logit(&self, z: &[f64]) -> f64 {
        self.bias + self.weights.iter().zip(z).map(|(w, x)| w * x).sum::<f64>()
    }
}

/// Logistic function.
#[must_use]
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Inverse of [`sigmoid`] for `p` in (0, 1).
#[must_use]
pub fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}

/// Bookkeeping recorded when a model is fitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub samples: usize,
    pub positives: usize,
    pub iterations: usize,
    pub converged: bool,
    pub final_loss: f64,
}

/// A fitted risk model for one condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    /// Condition this model predicts; conditioned on `target.other()`.
    pub target: Condition,
    pub standardizer: Standardizer,
    pub linear: LinearModel,
    pub summary: TrainingSummary,
}

impl TrainedModel {
    /// Standardized conditioned vector for a subject.
    #[must_use]
    pub fn standardize(&self, subject: &SubjectFeatures, conditioning: bool) -> Vec<f64> {
        self.standardizer.transform(&subject.conditioned(conditioning))
    }

    /// Log-odds of the target condition.
    #[must_use]
    pub fn logit(&self, subject: &SubjectFeatures, conditioning: bool) -> f64 {
        self.linear.logit(&self.standardize(subject, conditioning))
    }

    /// Probability of the target condition as a percentage in [0, 100].
    #[must_use]
    pub fn predict_percent(&self, subject: &SubjectFeatures, conditioning: bool) -> f64 {
        (sigmoid(self.logit(subject, conditioning)) * 100.0).clamp(0.0, 100.0)
    }

    /// Parameter shapes agree with the conditioned schema.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.standardizer.width() == CONDITIONED_LEN
            && self.standardizer.scale.len() == CONDITIONED_LEN
            && self.linear.weights.len() == CONDITIONED_LEN
            && self.linear.bias.is_finite()
            && self.linear.weights.iter().all(|w| w.is_finite())
    }
}
