//! Linear attribution of a model's log-odds to its inputs.
//!
//! For a linear model over standardized inputs each contribution is
//! `w_i · z_i`, and `bias + Σ contributions` reproduces the logit exactly.

use serde::Serialize;

use crate::domain::{conditioned_label, AttributionMap, SubjectFeatures, TrainedModel};

/// Full decomposition of one prediction, before noise filtering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decomposition {
    pub bias: f64,
    pub logit: f64,
    /// One entry per conditioned-vector position
    pub contributions: Vec<f64>,
}

impl Decomposition {
    /// `bias + Σ contributions`; equals `logit` up to rounding.
    #[must_use]
    pub fn reconstructed(&self) -> f64 {
        self.bias + self.contributions.iter().sum::<f64>()
    }
}

#[must_use]
pub fn decompose(
    model: &TrainedModel,
    subject: &SubjectFeatures,
    conditioning: bool,
) -> Decomposition {
    let z = model.standardize(subject, conditioning);
    let contributions: Vec<f64> = model
        .linear
        .weights
        .iter()
        .zip(&z)
        .map(|(w, x)| w * x)
        .collect();
    Decomposition {
        bias: model.linear.bias,
        logit: model.linear.logit(&z),
        contributions,
    }
}

/// Labelled contributions whose magnitude exceeds `threshold`.
///
/// An unset model yields an empty map.
#[must_use]
pub fn explain(
    model: Option<&TrainedModel>,
    subject: &SubjectFeatures,
    conditioning: bool,
    threshold: f64,
) -> AttributionMap {
    let Some(model) = model else {
        return AttributionMap::new();
    };

    let mut map = AttributionMap::new();
    for (i, c) in decompose(model, subject, conditioning)
        .contributions
        .into_iter()
        .enumerate()
    {
        if c.abs() > threshold {
            map.insert(conditioned_label(model.target, i), c);
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::fixtures::{sample_query, synthetic_table};
    use crate::application::training::fit;
    use crate::config::TrainingConfig;
    use crate::domain::{
        Condition, Feature, LinearModel, Standardizer, TrainingSummary, CONDITIONED_LEN,
    };

    #[test]
    fn test_decomposition_is_exact() {
        let table = synthetic_table(300, 21);
        let model = fit(&table, Condition::Hypertension, &TrainingConfig::default()).expect("fit");
        let subject = sample_query(false, true).features;

        let d = decompose(&model, &subject, true);
        assert_eq!(d.contributions.len(), CONDITIONED_LEN);
        assert!((d.reconstructed() - d.logit).abs() < 1e-9);
        assert!((d.logit - model.logit(&subject, true)).abs() < 1e-12);
    }

    #[test]
    fn test_threshold_filters_small_contributions() {
        let table = synthetic_table(300, 21);
        let model = fit(&table, Condition::Diabetes, &TrainingConfig::default()).expect("fit");
        let subject = sample_query(true, false).features;

        let all = explain(Some(&model), &subject, true, 0.0);
        let filtered = explain(Some(&model), &subject, true, 0.25);
        assert!(filtered.len() <= all.len());
        assert!(filtered.iter().all(|(_, c)| c.abs() > 0.25));
        assert!(all.get(Feature::Glucose.label()).is_some());
    }

    #[test]
    fn test_contribution_equal_to_threshold_is_dropped() {
        let threshold = crate::config::EngineConfig::default().noise_threshold;
        let mut weights = vec![0.0; CONDITIONED_LEN];
        weights[Feature::Age.index()] = threshold;
        weights[Feature::Glucose.index()] = -threshold;
        weights[Feature::Bmi.index()] = 0.0011;
        let model = TrainedModel {
            target: Condition::Diabetes,
            standardizer: Standardizer {
                mean: vec![0.0; CONDITIONED_LEN],
                scale: vec![1.0; CONDITIONED_LEN],
            },
            linear: LinearModel { weights, bias: 0.0 },
            summary: TrainingSummary {
                samples: 2,
                positives: 1,
                iterations: 1,
                converged: true,
                final_loss: 0.0,
            },
        };
        // Unit inputs on zero mean and unit scale give contributions equal to the weights.
        let subject = SubjectFeatures {
            age: 1.0,
            glucose: 1.0,
            bmi: 1.0,
            ..Default::default()
        };

        let map = explain(Some(&model), &subject, false, threshold);
        assert_eq!(map.get(Feature::Age.label()), None);
        assert_eq!(map.get(Feature::Glucose.label()), None);
        assert_eq!(map.get(Feature::Bmi.label()), Some(0.0011));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_conditioning_feature_is_labelled() {
        let table = synthetic_table(300, 4);
        let model = fit(&table, Condition::Diabetes, &TrainingConfig::default()).expect("fit");
        let subject = sample_query(true, false).features;

        let map = explain(Some(&model), &subject, true, 0.0);
        assert!(map.get("Existing Hypertension").is_some());
    }

    #[test]
    fn test_unset_model_yields_empty_map() {
        let subject = sample_query(false, false).features;
        assert!(explain(None, &subject, false, 0.001).is_empty());
    }
}
