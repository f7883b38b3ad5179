//! Logistic model training.
//!
//! Class-balanced, L2-regularized logistic regression fitted by full-batch
//! gradient descent on standardized inputs. The objective is the mean weighted
//! log-loss plus `‖w‖² / (2·C·n)`; the bias is not penalized.

use thiserror::Error;

use crate::application::normalize::CanonicalTable;
use crate::config::TrainingConfig;
use crate::domain::{
    sigmoid, Condition, LinearModel, Standardizer, TrainedModel, TrainingSummary,
    CONDITIONED_LEN,
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrainingError {
    #[error("Training table is empty")]
    Empty,

    #[error("Target {condition} has a single class ({positives} positive of {samples})")]
    SingleClass {
        condition: Condition,
        positives: usize,
        samples: usize,
    },

    #[error("Training table contains non-finite values")]
    NonFinite,

    #[error("Optimization diverged for {0}")]
    Diverged(Condition),
}

/// `ln(1 + e^t)` without overflow.
fn softplus(t: f64) -> f64 {
    t.max(0.0) + (-t.abs()).exp().ln_1p()
}

/// Fit the model predicting `target`, conditioned on the other label.
///
/// # Errors
/// Fails on an empty table, a target with only one class, non-finite inputs or
/// a diverging optimization.
pub fn fit(
    table: &CanonicalTable,
    target: Condition,
    config: &TrainingConfig,
) -> Result<TrainedModel, TrainingError> {
    let samples = table.len();
    if samples == 0 {
        return Err(TrainingError::Empty);
    }

    let rows: Vec<[f64; CONDITIONED_LEN]> = table
        .records
        .iter()
        .map(|r| r.training_row(target))
        .collect();
    if rows.iter().flatten().any(|x| !x.is_finite()) {
        return Err(TrainingError::NonFinite);
    }

    let labels: Vec<f64> = table
        .records
        .iter()
        .map(|r| f64::from(r.label(target)))
        .collect();
    let positives = table.positives(target);
    if positives == 0 || positives == samples {
        return Err(TrainingError::SingleClass {
            condition: target,
            positives,
            samples,
        });
    }

    let standardizer = Standardizer::fit(&rows).ok_or(TrainingError::Empty)?;
    let z: Vec<Vec<f64>> = rows.iter().map(|r| standardizer.transform(r)).collect();

    // Balanced class weights: n / (2 · n_class).
    let n = samples as f64;
    let w_pos = n / (2.0 * positives as f64);
    let w_neg = n / (2.0 * (samples - positives) as f64);
    let sample_weight: Vec<f64> = labels
        .iter()
        .map(|&y| if y > 0.5 { w_pos } else { w_neg })
        .collect();

    let l2 = 1.0 / (config.c * n);
    let mut weights = vec![0.0; CONDITIONED_LEN];
    let mut bias = 0.0;
    let mut iterations = 0;
    let mut converged = false;

    for _ in 0..config.max_iter {
        iterations += 1;
        let mut grad_w = vec![0.0; CONDITIONED_LEN];
        let mut grad_b = 0.0;

        for ((x, &y), &s) in z.iter().zip(&labels).zip(&sample_weight) {
            let t = bias + weights.iter().zip(x).map(|(w, v)| w * v).sum::<f64>();
            let residual = s * (sigmoid(t) - y);
            grad_b += residual;
            for (g, v) in grad_w.iter_mut().zip(x) {
                *g += residual * v;
            }
        }

        grad_b /= n;
        for (g, w) in grad_w.iter_mut().zip(&weights) {
            *g = *g / n + l2 * w;
        }

        let largest = grad_w.iter().fold(grad_b.abs(), |m, g| m.max(g.abs()));
        if !largest.is_finite() {
            return Err(TrainingError::Diverged(target));
        }
        if largest < config.tolerance {
            converged = true;
            break;
        }

        bias -= config.learning_rate * grad_b;
        for (w, g) in weights.iter_mut().zip(&grad_w) {
            *w -= config.learning_rate * g;
        }
    }

    let final_loss = z
        .iter()
        .zip(&labels)
        .zip(&sample_weight)
        .map(|((x, &y), &s)| {
            let t = bias + weights.iter().zip(x).map(|(w, v)| w * v).sum::<f64>();
            s * (softplus(t) - y * t)
        })
        .sum::<f64>()
        / n
        + 0.5 * l2 * weights.iter().map(|w| w * w).sum::<f64>();

    if !converged {
        tracing::warn!(
            "{target} model stopped after {iterations} iterations without converging"
        );
    }

    let model = TrainedModel {
        target,
        standardizer,
        linear: LinearModel { weights, bias },
        summary: TrainingSummary {
            samples,
            positives,
            iterations,
            converged,
            final_loss,
        },
    };
    if !model.is_consistent() {
        return Err(TrainingError::Diverged(target));
    }
    Ok(model)
}
