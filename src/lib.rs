//! # CardioRisk
//!
//! Hypertension and diabetes risk inference over a historical population table.
//!
//! This crate provides:
//! - Normalization of heterogeneous CSV exports into one canonical schema
//! - Two cross-conditioned logistic risk models
//! - Exact per-feature attribution of each prediction
//! - Similar-subject cohort sampling and a four-state assessment dispatcher
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (features, subjects, fitted models, assessment results)
//! - `ports`: Trait definitions for dataset sources
//! - `adapters`: Concrete implementations (CSV files, memory, log sanitization)
//! - `application`: Normalization, training and the risk engine
//! - `config`: Engine defaults and environment overrides

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use application::{EngineStatus, RiskEngine};
pub use config::EngineConfig;
pub use domain::{AssessmentResult, Condition, SubjectQuery};

/// Result type for CardioRisk operations
pub type Result<T> = std::result::Result<T, CardioRiskError>;

/// Main error type for CardioRisk
#[derive(Debug, thiserror::Error)]
pub enum CardioRiskError {
    #[error("Dataset error: {0}")]
    Dataset(#[from] ports::DatasetError),

    #[error("Malformed subject: {}", join_errors(.0))]
    MalformedSubject(Vec<domain::ValidationError>),
}

fn join_errors(errors: &[domain::ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
