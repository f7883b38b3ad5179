//! Assessment result types.
//!
//! Represents the output of one orchestrated analysis: risk percentages,
//! per-feature attributions and, when both conditions are already present,
//! the ideal-range deviation table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::features::{Condition, Feature};

/// Signed per-feature contributions to a model's log-odds, keyed by label.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributionMap(BTreeMap<String, f64>);

impl AttributionMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: impl Into<String>, contribution: f64) {
        self.0.insert(label.into(), contribution);
    }

    #[must_use]
    pub fn get(&self, label: &str) -> Option<f64> {
        self.0.get(label).copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    /// Entries sorted by descending magnitude.
    #[must_use]
    pub fn ranked(&self) -> Vec<(&str, f64)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
        entries
    }

    /// The `k` largest contributions by magnitude.
    #[must_use]
    pub fn top(&self, k: usize) -> Vec<(&str, f64)> {
        let mut ranked = self.ranked();
        ranked.truncate(k);
        ranked
    }
}

/// Dispatch state selected from the subject's known disease status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssessmentMode {
    /// Known hypertension: estimate diabetes risk.
    HtnOnly,
    /// Known diabetes: estimate hypertension risk.
    DmOnly,
    /// Neither condition known: estimate both.
    Neither,
    /// Both conditions known: report distance from ideal ranges.
    Both,
}

impl AssessmentMode {
    #[must_use]
    pub fn from_status(has_htn: bool, has_dm: bool) -> Self {
        match (has_htn, has_dm) {
            (true, false) => Self::HtnOnly,
            (false, true) => Self::DmOnly,
            (false, false) => Self::Neither,
            (true, true) => Self::Both,
        }
    }

    /// Conditions whose risk is estimated in this mode.
    #[must_use]
    pub fn scored_conditions(self) -> &'static [Condition] {
        match self {
            Self::HtnOnly => &[Condition::Diabetes],
            Self::DmOnly => &[Condition::Hypertension],
            Self::Neither => &[Condition::Hypertension, Condition::Diabetes],
            Self::Both => &[],
        }
    }
}

impl std::fmt::Display for AssessmentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HtnOnly => write!(f, "HTN_ONLY"),
            Self::DmOnly => write!(f, "DM_ONLY"),
            Self::Neither => write!(f, "NEITHER"),
            Self::Both => write!(f, "BOTH"),
        }
    }
}

/// Position of a measurement relative to its ideal range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricStatus {
    Ideal,
    Attention,
    High,
}

impl std::fmt::Display for MetricStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ideal => write!(f, "ideal"),
            Self::Attention => write!(f, "attention"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Ideal target and upper attention limit for one measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricRange {
    pub feature: Feature,
    pub target: f64,
    pub limit: f64,
}

impl MetricRange {
    #[must_use]
    pub const fn new(feature: Feature, target: f64, limit: f64) -> Self {
        Self {
            feature,
            target,
            limit,
        }
    }

    #[must_use]
    pub fn classify(&self, value: f64) -> MetricStatus {
        if value <= self.target {
            MetricStatus::Ideal
        } else if value <= self.limit {
            MetricStatus::Attention
        } else {
            MetricStatus::High
        }
    }
}

/// Default ideal ranges reported when both conditions are present.
pub const DEFAULT_METRIC_RANGES: [MetricRange; 6] = [
    MetricRange::new(Feature::SystolicBp, 120.0, 140.0),
    MetricRange::new(Feature::DiastolicBp, 80.0, 90.0),
    MetricRange::new(Feature::Glucose, 90.0, 120.0),
    MetricRange::new(Feature::Bmi, 22.0, 25.0),
    MetricRange::new(Feature::Ldl, 100.0, 130.0),
    MetricRange::new(Feature::Triglycerides, 150.0, 200.0),
];

/// One row of the ideal-range table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricDeviation {
    pub feature: Feature,
    pub value: f64,
    pub target: f64,
    pub limit: f64,
    pub status: MetricStatus,
}

impl MetricDeviation {
    /// Amount above the ideal target (0 when within it).
    #[must_use]
    pub fn excess(&self) -> f64 {
        (self.value - self.target).max(0.0)
    }
}

/// Display band for a risk percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskBand {
    Low,
    Moderate,
    High,
}

impl RiskBand {
    #[must_use]
    pub fn from_percent(percent: f64) -> Self {
        if percent < 30.0 {
            Self::Low
        } else if percent < 70.0 {
            Self::Moderate
        } else {
            Self::High
        }
    }

    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Low => "Low risk - No significant indicators",
            Self::Moderate => "Moderate risk - Follow-up recommended",
            Self::High => "High risk - Consultation advised",
        }
    }
}

impl std::fmt::Display for RiskBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Moderate => write!(f, "MODERATE"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// A risk percentage; displays with one decimal place.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiskPercent(pub f64);

impl RiskPercent {
    #[must_use]
    pub fn band(self) -> RiskBand {
        RiskBand::from_percent(self.0)
    }
}

impl std::fmt::Display for RiskPercent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "%{:.1}", self.0)
    }
}

/// Complete output of one assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub mode: AssessmentMode,
    /// Hypertension risk; 0 when not scored
    pub htn_risk: RiskPercent,
    /// Diabetes risk; 0 when not scored
    pub dm_risk: RiskPercent,
    pub htn_attribution: AttributionMap,
    pub dm_attribution: AttributionMap,
    /// Ideal-range table; only populated in [`AssessmentMode::Both`]
    pub metrics: Vec<MetricDeviation>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl AssessmentResult {
    /// Empty result for a mode; callers fill in the parts the mode computes.
    #[must_use]
    pub fn empty(mode: AssessmentMode) -> Self {
        Self {
            mode,
            htn_risk: RiskPercent::default(),
            dm_risk: RiskPercent::default(),
            htn_attribution: AttributionMap::new(),
            dm_attribution: AttributionMap::new(),
            metrics: Vec::new(),
            created_at: chrono::Utc::now(),
        }
    }

    /// Status of one metric in the ideal-range table.
    #[must_use]
    pub fn metric_status(&self, feature: Feature) -> Option<MetricStatus> {
        self.metrics
            .iter()
            .find(|m| m.feature == feature)
            .map(|m| m.status)
    }
}
