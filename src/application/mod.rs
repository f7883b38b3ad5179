//! Application layer: Use cases and services.
//!
//! This module turns a raw dataset into trained models and answers the
//! subject-level queries (risk, attribution, cohort, assessment) against them.

pub mod assessment;
pub mod attribution;
pub mod cohort;
mod engine;
pub mod normalize;
pub mod training;

#[cfg(test)]
pub(crate) mod fixtures;

pub use assessment::{metric_table, Assessor};
pub use attribution::Decomposition;
pub use cohort::{Cohort, CohortWindow};
pub use engine::{EngineStatus, ModelExport, RiskEngine, Snapshot};
pub use normalize::{normalize, CanonicalTable};
pub use training::TrainingError;
