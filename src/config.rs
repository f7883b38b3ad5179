//! Engine configuration.
//!
//! Every value defaults to the behavior the models were calibrated with; the
//! `CARDIORISK_*` environment variables override individual values (best-effort,
//! invalid values keep the default).

use std::path::PathBuf;

use crate::domain::{MetricRange, DEFAULT_METRIC_RANGES};

/// Gradient-descent settings for the logistic models.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingConfig {
    /// Maximum full-batch iterations
    pub max_iter: usize,
    /// Step size on standardized inputs
    pub learning_rate: f64,
    /// Inverse L2 regularization strength
    pub c: f64,
    /// Stop once the largest gradient component falls below this
    pub tolerance: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            max_iter: 5000,
            learning_rate: 0.5,
            c: 1.0,
            tolerance: 1e-4,
        }
    }
}

/// Window sizes and seeds for the cohort sampler.
#[derive(Debug, Clone, PartialEq)]
pub struct CohortConfig {
    /// Half-width of the age window matched together with sex
    pub narrow_years: f64,
    /// Half-width of the relaxed, sex-agnostic window
    pub wide_years: f64,
    /// Narrow matches required before the window is relaxed
    pub min_narrow_matches: usize,
    /// Seed used when sampling the narrow and relaxed windows
    pub seed: u64,
    /// Seed for the full-table path; `None` samples from entropy
    pub fallback_seed: Option<u64>,
    /// Default sample size used by callers that do not pass one
    pub default_limit: usize,
}

impl Default for CohortConfig {
    fn default() -> Self {
        Self {
            narrow_years: 5.0,
            wide_years: 10.0,
            min_narrow_matches: 20,
            seed: 42,
            fallback_seed: None,
            default_limit: 500,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Dataset used by `RiskEngine::initialize_from_config`
    pub dataset_path: PathBuf,
    /// Attributions with magnitude at or below this are dropped
    pub noise_threshold: f64,
    /// Ideal ranges reported when both conditions are present
    pub metric_ranges: Vec<MetricRange>,
    pub training: TrainingConfig,
    pub cohort: CohortConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("data/hypertension_data.csv"),
            noise_threshold: 0.001,
            metric_ranges: DEFAULT_METRIC_RANGES.to_vec(),
            training: TrainingConfig::default(),
            cohort: CohortConfig::default(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Option<T> {
    lookup(name)?.trim().parse::<T>().ok()
}

fn positive_f64(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<f64> {
    parse_var::<f64>(lookup, name).filter(|x| x.is_finite() && *x > 0.0)
}

impl EngineConfig {
    /// Load config overrides from environment (best-effort).
    ///
    /// Supported:
    /// - CARDIORISK_DATASET
    /// - CARDIORISK_NOISE_THRESHOLD
    /// - CARDIORISK_COHORT_SEED, CARDIORISK_COHORT_FALLBACK_SEED, CARDIORISK_COHORT_LIMIT
    /// - CARDIORISK_MAX_ITER, CARDIORISK_LEARNING_RATE, CARDIORISK_L2_C, CARDIORISK_TOLERANCE
    #[must_use]
    pub fn from_env_or_default() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Apply overrides read through `lookup`, keyed by the variable names
    /// listed on [`EngineConfig::from_env_or_default`].
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(path) = lookup("CARDIORISK_DATASET") {
            if !path.trim().is_empty() {
                cfg.dataset_path = PathBuf::from(path.trim());
            }
        }

        if let Some(x) = parse_var::<f64>(&lookup, "CARDIORISK_NOISE_THRESHOLD") {
            if x.is_finite() && x >= 0.0 {
                cfg.noise_threshold = x;
            }
        }

        if let Some(seed) = parse_var::<u64>(&lookup, "CARDIORISK_COHORT_SEED") {
            cfg.cohort.seed = seed;
        }
        if let Some(seed) = parse_var::<u64>(&lookup, "CARDIORISK_COHORT_FALLBACK_SEED") {
            cfg.cohort.fallback_seed = Some(seed);
        }
        if let Some(limit) =
            parse_var::<usize>(&lookup, "CARDIORISK_COHORT_LIMIT").filter(|&n| n > 0)
        {
            cfg.cohort.default_limit = limit;
        }

        if let Some(n) = parse_var::<usize>(&lookup, "CARDIORISK_MAX_ITER").filter(|&n| n > 0) {
            cfg.training.max_iter = n;
        }
        if let Some(lr) = positive_f64(&lookup, "CARDIORISK_LEARNING_RATE") {
            cfg.training.learning_rate = lr;
        }
        if let Some(c) = positive_f64(&lookup, "CARDIORISK_L2_C") {
            cfg.training.c = c;
        }
        if let Some(tol) = positive_f64(&lookup, "CARDIORISK_TOLERANCE") {
            cfg.training.tolerance = tol;
        }

        cfg
    }
}
