//! Assessment orchestration: one-shot dispatch on the subject's known status.
//!
//! | mode       | scored                              |
//! |------------|-------------------------------------|
//! | `HtnOnly`  | diabetes, conditioned on HTN = 1    |
//! | `DmOnly`   | hypertension, conditioned on DM = 1 |
//! | `Neither`  | both, conditioned on 0              |
//! | `Both`     | nothing; ideal-range table instead  |

use crate::application::attribution;
use crate::domain::{
    AssessmentMode, AssessmentResult, AttributionMap, Condition, MetricDeviation, MetricRange,
    RiskPercent, SubjectFeatures, SubjectQuery, TrainedModel,
};

/// Borrowed view over the two models and the parameters used to read them.
#[derive(Debug, Clone, Copy)]
pub struct Assessor<'a> {
    pub htn: Option<&'a TrainedModel>,
    pub dm: Option<&'a TrainedModel>,
    pub noise_threshold: f64,
    pub metric_ranges: &'a [MetricRange],
}

impl<'a> Assessor<'a> {
    #[must_use]
    pub fn model(&self, condition: Condition) -> Option<&'a TrainedModel> {
        match condition {
            Condition::Hypertension => self.htn,
            Condition::Diabetes => self.dm,
        }
    }

    /// Risk of `condition` in percent; 0 when its model is unset.
    #[must_use]
    pub fn predict(
        &self,
        condition: Condition,
        subject: &SubjectFeatures,
        other_present: bool,
    ) -> f64 {
        self.model(condition)
            .map_or(0.0, |m| m.predict_percent(subject, other_present))
    }

    #[must_use]
    pub fn explain(
        &self,
        condition: Condition,
        subject: &SubjectFeatures,
        other_present: bool,
    ) -> AttributionMap {
        attribution::explain(
            self.model(condition),
            subject,
            other_present,
            self.noise_threshold,
        )
    }

    /// Dispatch one assessment.
    #[must_use]
    pub fn assess(&self, query: &SubjectQuery) -> AssessmentResult {
        let mode = AssessmentMode::from_status(query.has_htn, query.has_dm);
        let subject = &query.features;
        let mut result = AssessmentResult::empty(mode);

        // In the single-condition modes the conditioning flag is the known condition (1);
        // in NEITHER it is 0 for both models.
        let other_present = mode != AssessmentMode::Neither;
        for &condition in mode.scored_conditions() {
            let risk = RiskPercent(self.predict(condition, subject, other_present));
            let attribution = self.explain(condition, subject, other_present);
            match condition {
                Condition::Hypertension => {
                    result.htn_risk = risk;
                    result.htn_attribution = attribution;
                }
                Condition::Diabetes => {
                    result.dm_risk = risk;
                    result.dm_attribution = attribution;
                }
            }
        }

        if mode == AssessmentMode::Both {
            result.metrics = metric_table(subject, self.metric_ranges);
        }

        tracing::debug!(
            "Assessment {mode}: htn={} dm={} metrics={}",
            result.htn_risk,
            result.dm_risk,
            result.metrics.len()
        );
        result
    }
}

/// Classify each configured measurement against its ideal range.
#[must_use]
pub fn metric_table(subject: &SubjectFeatures, ranges: &[MetricRange]) -> Vec<MetricDeviation> {
    ranges
        .iter()
        .map(|range| {
            let value = subject.get(range.feature);
            MetricDeviation {
                feature: range.feature,
                value,
                target: range.target,
                limit: range.limit,
                status: range.classify(value),
            }
        })
        .collect()
}
