//! Domain layer: Core types and pure computations.
//!
//! This module holds the canonical feature schema, subject queries, fitted model
//! parameters and assessment results. Nothing here performs I/O.

mod advice;
mod assessment;
mod features;
mod model;
mod subject;

pub use advice::{lifestyle_advice, Advice, Severity};
pub use assessment::{
    AssessmentMode, AssessmentResult, AttributionMap, MetricDeviation, MetricRange, MetricStatus,
    RiskBand, RiskPercent, DEFAULT_METRIC_RANGES,
};
pub use features::{
    conditioned_label, CanonicalRecord, Condition, Feature, SubjectFeatures, CONDITIONED_LEN,
    FEATURE_COUNT,
};
pub use model::{logit, sigmoid, LinearModel, Standardizer, TrainedModel, TrainingSummary};
pub use subject::{IntakeForm, SaltUnit, Sex, SmokingStatus, SubjectQuery, ValidationError};
