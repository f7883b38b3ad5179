//! Risk engine: the handle through which callers reach the trained state.
//!
//! The engine owns an immutable [`Snapshot`] (canonical table, both models and the
//! dataset fingerprint) behind an `Arc`. Readers clone the `Arc` and never observe a
//! partially trained state; retraining builds a complete new snapshot and swaps it in.
//!
//! Lifecycle: `Uninitialized -> Ready | Unavailable`, then optionally replaced by a
//! later `initialize` call. Every query on an unavailable engine returns the sentinel
//! value (0 % risk, empty attribution, empty cohort).

use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;

use crate::adapters::csv_file::CsvFileSource;
use crate::application::assessment::Assessor;
use crate::application::attribution::{self, Decomposition};
use crate::application::cohort::{self, Cohort};
use crate::application::normalize::{normalize, CanonicalTable};
use crate::application::training;
use crate::config::EngineConfig;
use crate::domain::{
    AssessmentResult, AttributionMap, Condition, SubjectFeatures, SubjectQuery, TrainedModel,
};
use crate::ports::DatasetSource;
use crate::CardioRiskError;

/// Engine lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineStatus {
    Uninitialized,
    Ready,
    Unavailable,
}

impl std::fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Ready => write!(f, "ready"),
            Self::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Immutable trained state.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub status: EngineStatus,
    /// Incremented on every successful or failed initialization
    pub generation: u64,
    pub source: Option<String>,
    pub fingerprint: Option<String>,
    pub table: CanonicalTable,
    pub htn: Option<TrainedModel>,
    pub dm: Option<TrainedModel>,
}

impl Snapshot {
    fn empty(status: EngineStatus, generation: u64, source: Option<String>) -> Self {
        Self {
            status,
            generation,
            source,
            fingerprint: None,
            table: CanonicalTable::from_records(Vec::new()),
            htn: None,
            dm: None,
        }
    }

    #[must_use]
    pub fn model(&self, condition: Condition) -> Option<&TrainedModel> {
        match condition {
            Condition::Hypertension => self.htn.as_ref(),
            Condition::Diabetes => self.dm.as_ref(),
        }
    }
}

/// Serializable dump of the trained models.
#[derive(Debug, Clone, Serialize)]
pub struct ModelExport {
    pub generation: u64,
    pub fingerprint: Option<String>,
    pub htn: Option<TrainedModel>,
    pub dm: Option<TrainedModel>,
}

/// Handle to the trained risk models.
pub struct RiskEngine {
    config: EngineConfig,
    current: RwLock<Arc<Snapshot>>,
}

impl RiskEngine {
    /// Create an uninitialized engine.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            current: RwLock::new(Arc::new(Snapshot::empty(
                EngineStatus::Uninitialized,
                0,
                None,
            ))),
        }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current snapshot; cheap to clone and safe to hold across a retrain.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    #[must_use]
    pub fn status(&self) -> EngineStatus {
        self.snapshot().status
    }

    /// Load, normalize and train from `source`, replacing the current snapshot.
    ///
    /// Never fails: a source that cannot be loaded or normalized yields
    /// [`EngineStatus::Unavailable`]; a model that cannot be fitted is left unset.
    pub fn initialize(&self, source: &dyn DatasetSource) -> EngineStatus {
        let description = source.describe();
        tracing::info!("Initializing risk engine from {description}");

        let built = self.build(source);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let previous = guard.status;
        let generation = guard.generation + 1;

        let snapshot = match built {
            Ok(mut snapshot) => {
                snapshot.generation = generation;
                snapshot
            }
            Err(e) => {
                tracing::warn!("Dataset unavailable ({description}): {e}");
                Snapshot::empty(EngineStatus::Unavailable, generation, Some(description))
            }
        };

        let status = snapshot.status;
        *guard = Arc::new(snapshot);
        drop(guard);

        if previous != EngineStatus::Uninitialized {
            tracing::info!("Replaced {previous} snapshot with generation {generation} ({status})");
        } else {
            tracing::info!("Risk engine {status} (generation {generation})");
        }
        status
    }

    /// [`initialize`](Self::initialize) from the configured CSV dataset path.
    pub fn initialize_from_config(&self) -> EngineStatus {
        let source = CsvFileSource::new(self.config.dataset_path.clone());
        self.initialize(&source)
    }

    fn build(&self, source: &dyn DatasetSource) -> crate::Result<Snapshot> {
        let loaded = source.load()?;
        let table = normalize(&loaded.table)?;

        if let Some(fp) = &loaded.fingerprint {
            tracing::info!("Dataset fingerprint sha256:{fp}");
        }
        tracing::info!(
            "Normalized {} records ({} HTN, {} DM positive, {} cells imputed)",
            table.len(),
            table.positives(Condition::Hypertension),
            table.positives(Condition::Diabetes),
            table.imputed_cells
        );

        let htn = self.train(&table, Condition::Hypertension);
        let dm = self.train(&table, Condition::Diabetes);

        Ok(Snapshot {
            status: EngineStatus::Ready,
            generation: 0,
            source: Some(source.describe()),
            fingerprint: loaded.fingerprint,
            table,
            htn,
            dm,
        })
    }

    fn train(&self, table: &CanonicalTable, condition: Condition) -> Option<TrainedModel> {
        match training::fit(table, condition, &self.config.training) {
            Ok(model) => {
                let s = &model.summary;
                tracing::info!(
                    "Trained {condition} model on {} samples ({} positive): {} iterations, loss {:.4}{}",
                    s.samples,
                    s.positives,
                    s.iterations,
                    s.final_loss,
                    if s.converged { "" } else { " (not converged)" }
                );
                Some(model)
            }
            Err(e) => {
                tracing::warn!("{condition} model unset: {e}");
                None
            }
        }
    }

    fn assessor<'a>(&'a self, snapshot: &'a Snapshot) -> Assessor<'a> {
        Assessor {
            htn: snapshot.htn.as_ref(),
            dm: snapshot.dm.as_ref(),
            noise_threshold: self.config.noise_threshold,
            metric_ranges: &self.config.metric_ranges,
        }
    }

    /// Hypertension risk in percent, conditioned on the known diabetes status.
    #[must_use]
    pub fn predict_htn(&self, subject: &SubjectFeatures, dm_status: bool) -> f64 {
        let snapshot = self.snapshot();
        self.assessor(&snapshot)
            .predict(Condition::Hypertension, subject, dm_status)
    }

    /// Diabetes risk in percent, conditioned on the known hypertension status.
    #[must_use]
    pub fn predict_dm(&self, subject: &SubjectFeatures, htn_status: bool) -> f64 {
        let snapshot = self.snapshot();
        self.assessor(&snapshot)
            .predict(Condition::Diabetes, subject, htn_status)
    }

    /// Attribution of the `target` model's log-odds; `existing` is the other condition.
    #[must_use]
    pub fn explain(
        &self,
        target: Condition,
        subject: &SubjectFeatures,
        existing: bool,
    ) -> AttributionMap {
        let snapshot = self.snapshot();
        self.assessor(&snapshot).explain(target, subject, existing)
    }

    /// Unpruned decomposition; `None` when the model is unset.
    #[must_use]
    pub fn decompose(
        &self,
        target: Condition,
        subject: &SubjectFeatures,
        existing: bool,
    ) -> Option<Decomposition> {
        let snapshot = self.snapshot();
        snapshot
            .model(target)
            .map(|m| attribution::decompose(m, subject, existing))
    }

    #[must_use]
    pub fn similar_cohort(&self, age: f64, is_male: bool, limit: usize) -> Cohort {
        let snapshot = self.snapshot();
        cohort::similar_cohort(&snapshot.table, age, is_male, limit, &self.config.cohort)
    }

    /// Run the four-state assessment. Assumes a validated query.
    #[must_use]
    pub fn assess(&self, query: &SubjectQuery) -> AssessmentResult {
        let snapshot = self.snapshot();
        self.assessor(&snapshot).assess(query)
    }

    /// Validate, then assess.
    ///
    /// # Errors
    /// Returns `CardioRiskError::MalformedSubject` listing every problem found.
    pub fn assess_checked(&self, query: &SubjectQuery) -> crate::Result<AssessmentResult> {
        query
            .validate()
            .map_err(CardioRiskError::MalformedSubject)?;
        Ok(self.assess(query))
    }

    #[must_use]
    pub fn export_models(&self) -> ModelExport {
        let snapshot = self.snapshot();
        ModelExport {
            generation: snapshot.generation,
            fingerprint: snapshot.fingerprint.clone(),
            htn: snapshot.htn.clone(),
            dm: snapshot.dm.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySource;
    use crate::application::fixtures::{sample_query, set_column, synthetic_raw_table};
    use crate::domain::{logit, AssessmentMode, Feature};

    fn ready_engine() -> RiskEngine {
        let engine = RiskEngine::new(EngineConfig::default());
        let source = InMemorySource::new("synthetic", synthetic_raw_table(500, 42));
        assert_eq!(engine.initialize(&source), EngineStatus::Ready);
        engine
    }

    #[test]
    fn test_uninitialized_engine_returns_sentinels() {
        let engine = RiskEngine::new(EngineConfig::default());
        let subject = sample_query(false, false).features;

        assert_eq!(engine.status(), EngineStatus::Uninitialized);
        assert_eq!(engine.predict_htn(&subject, false), 0.0);
        assert_eq!(engine.predict_dm(&subject, true), 0.0);
        assert!(engine.explain(Condition::Diabetes, &subject, true).is_empty());
        assert!(engine.similar_cohort(55.0, true, 10).is_empty());
    }

    #[test]
    fn test_missing_dataset_is_unavailable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = EngineConfig {
            dataset_path: dir.path().join("absent.csv"),
            ..EngineConfig::default()
        };
        let engine = RiskEngine::new(config);

        assert_eq!(engine.initialize_from_config(), EngineStatus::Unavailable);
        let result = engine.assess(&sample_query(false, false));
        assert_eq!(result.htn_risk.0, 0.0);
        assert_eq!(result.dm_risk.0, 0.0);
        assert!(result.htn_attribution.is_empty());
        assert!(engine.export_models().htn.is_none());
    }

    #[test]
    fn test_csv_dataset_initializes() {
        let raw = synthetic_raw_table(300, 8);
        let mut body = raw.headers.join(",");
        body.push('\n');
        for row in &raw.rows {
            body.push_str(&row.join(","));
            body.push('\n');
        }
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("hypertension_data.csv");
        std::fs::write(&path, body).expect("write csv");

        let engine = RiskEngine::new(EngineConfig {
            dataset_path: path,
            ..EngineConfig::default()
        });
        assert_eq!(engine.initialize_from_config(), EngineStatus::Ready);
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.table.len(), 300);
        assert_eq!(snapshot.fingerprint.as_deref().map(str::len), Some(64));
    }

    #[test]
    fn test_predictions_in_range_and_deterministic() {
        let engine = ready_engine();
        let table = engine.snapshot().table.clone();

        for record in table.records.iter().take(50) {
            for flag in [false, true] {
                let h = engine.predict_htn(&record.features, flag);
                let d = engine.predict_dm(&record.features, flag);
                assert!((0.0..=100.0).contains(&h));
                assert!((0.0..=100.0).contains(&d));
                assert_eq!(h, engine.predict_htn(&record.features, flag));
                assert_eq!(
                    engine.explain(Condition::Diabetes, &record.features, flag),
                    engine.explain(Condition::Diabetes, &record.features, flag)
                );
            }
        }
    }

    #[test]
    fn test_conditioning_independence() {
        let engine = ready_engine();
        let subject = sample_query(false, false).features;

        let htn_without = engine.predict_htn(&subject, false);
        let htn_with = engine.predict_htn(&subject, true);
        assert_ne!(htn_without, htn_with);

        // The DM prediction depends only on its own conditioning flag.
        let dm_before = engine.predict_dm(&subject, false);
        let _ = engine.predict_htn(&subject, true);
        assert_eq!(dm_before, engine.predict_dm(&subject, false));
    }

    #[test]
    fn test_attribution_exactness() {
        let engine = ready_engine();
        let subject = sample_query(true, false).features;

        let d = engine
            .decompose(Condition::Diabetes, &subject, true)
            .expect("dm model");
        let p = engine.predict_dm(&subject, true) / 100.0;
        assert!((d.reconstructed() - logit(p)).abs() < 1e-6);
    }

    #[test]
    fn test_htn_only_scenario() {
        let engine = ready_engine();
        let mut query = sample_query(true, false);
        query.features.age = 55.0;
        query.features.systolic_bp = 150.0;
        query.features.diastolic_bp = 95.0;
        query.features.glucose = 110.0;
        query.features.bmi = 29.0;
        query.features.ldl = 140.0;
        query.features.triglycerides = 160.0;

        let result = engine.assess_checked(&query).expect("valid query");
        assert_eq!(result.mode, AssessmentMode::HtnOnly);
        assert!((0.0..=100.0).contains(&result.dm_risk.0));
        assert!(!result.dm_attribution.is_empty());

        let glucose_mean = engine.snapshot().table.column_means[Feature::Glucose.index()];
        assert!(glucose_mean < 110.0);
        let glucose = result
            .dm_attribution
            .get(Feature::Glucose.label())
            .expect("glucose contribution");
        assert!(glucose >= 0.0);
    }

    #[test]
    fn test_malformed_subject_rejected() {
        let engine = ready_engine();
        let mut query = sample_query(false, false);
        query.features.age = -4.0;
        assert!(matches!(
            engine.assess_checked(&query),
            Err(CardioRiskError::MalformedSubject(_))
        ));
    }

    #[test]
    fn test_build_surfaces_dataset_error() {
        let engine = RiskEngine::new(EngineConfig::default());
        let source = InMemorySource::new("empty", crate::ports::RawTable::default());

        let err = engine.build(&source).err().expect("empty table must fail");
        assert!(matches!(
            err,
            CardioRiskError::Dataset(crate::ports::DatasetError::Empty)
        ));
        assert_eq!(err.to_string(), "Dataset error: Dataset has no data rows");
        assert_eq!(engine.initialize(&source), EngineStatus::Unavailable);
    }

    #[test]
    fn test_dataset_without_diabetes_leaves_dm_model_unset() {
        let mut raw = synthetic_raw_table(300, 13);
        set_column(&mut raw, "Diabetes", "No");
        let engine = RiskEngine::new(EngineConfig::default());

        assert_eq!(
            engine.initialize(&InMemorySource::new("no-dm", raw)),
            EngineStatus::Ready
        );
        let subject = sample_query(false, false).features;
        assert_eq!(engine.predict_dm(&subject, false), 0.0);
        assert!(engine.explain(Condition::Diabetes, &subject, false).is_empty());
        assert!(engine.predict_htn(&subject, false) > 0.0);
        assert!(!engine.explain(Condition::Hypertension, &subject, false).is_empty());
    }

    #[test]
    fn test_retrain_swaps_snapshot_atomically() {
        let engine = ready_engine();
        let before = engine.snapshot();

        let status = engine.initialize(&InMemorySource::new("next", synthetic_raw_table(200, 99)));
        assert_eq!(status, EngineStatus::Ready);

        let after = engine.snapshot();
        assert_eq!(before.generation + 1, after.generation);
        assert_eq!(before.table.len(), 500);
        assert_eq!(after.table.len(), 200);
        assert!(before.htn.is_some());
    }

    #[test]
    fn test_export_models_serializes() {
        let engine = ready_engine();
        let json = serde_json::to_value(engine.export_models()).expect("serialize");
        assert_eq!(json["generation"], 1);
        assert_eq!(json["htn"]["linear"]["weights"].as_array().map(Vec::len), Some(18));
    }
}
