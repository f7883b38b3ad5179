//! Cohort sampler: similar historical subjects for comparison views.
//!
//! The narrow window (same sex, close in age) is sampled with a fixed seed so
//! the same subject always sees the same cohort. When it is too sparse the
//! window widens to a sex-agnostic age band under the same seed, and finally
//! to the whole table.

use rand::seq::index;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::Serialize;

use crate::application::normalize::CanonicalTable;
use crate::config::CohortConfig;
use crate::domain::CanonicalRecord;

/// Which filter produced a cohort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CohortWindow {
    /// Same sex within the narrow age window
    Narrow,
    /// Any sex within the wide age window
    Relaxed,
    /// No similar records; sampled from the whole table
    FullTable,
}

/// Sampled comparison records.
#[derive(Debug, Clone, PartialEq)]
pub struct Cohort {
    pub records: Vec<CanonicalRecord>,
    pub window: CohortWindow,
    /// Number of records that matched the window before sampling
    pub matched: usize,
}

impl Cohort {
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn sample(
    pool: Vec<&CanonicalRecord>,
    limit: usize,
    rng: &mut ChaCha20Rng,
) -> Vec<CanonicalRecord> {
    let amount = limit.min(pool.len());
    index::sample(rng, pool.len(), amount)
        .into_iter()
        .map(|i| *pool[i])
        .collect()
}

fn fallback_rng(config: &CohortConfig) -> ChaCha20Rng {
    match config.fallback_seed {
        Some(seed) => ChaCha20Rng::seed_from_u64(seed),
        None => ChaCha20Rng::from_entropy(),
    }
}

/// Sample up to `limit` records similar to a subject of the given age and sex.
#[must_use]
pub fn similar_cohort(
    table: &CanonicalTable,
    age: f64,
    is_male: bool,
    limit: usize,
    config: &CohortConfig,
) -> Cohort {
    let narrow: Vec<&CanonicalRecord> = table
        .records
        .iter()
        .filter(|r| (r.features.age - age).abs() <= config.narrow_years && r.is_male() == is_male)
        .collect();

    if narrow.len() >= config.min_narrow_matches {
        let matched = narrow.len();
        let mut rng = ChaCha20Rng::seed_from_u64(config.seed);
        return Cohort {
            records: sample(narrow, limit, &mut rng),
            window: CohortWindow::Narrow,
            matched,
        };
    }

    let relaxed: Vec<&CanonicalRecord> = table
        .records
        .iter()
        .filter(|r| (r.features.age - age).abs() <= config.wide_years)
        .collect();

    if !relaxed.is_empty() {
        tracing::debug!(
            "Narrow cohort too small ({} < {}); widening age window",
            narrow.len(),
            config.min_narrow_matches
        );
        let matched = relaxed.len();
        let mut rng = ChaCha20Rng::seed_from_u64(config.seed);
        return Cohort {
            records: sample(relaxed, limit, &mut rng),
            window: CohortWindow::Relaxed,
            matched,
        };
    }

    tracing::debug!("No records in the wide age window; sampling the full table");
    let all: Vec<&CanonicalRecord> = table.records.iter().collect();
    let matched = all.len();
    let mut rng = fallback_rng(config);
    Cohort {
        records: sample(all, limit, &mut rng),
        window: CohortWindow::FullTable,
        matched,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::fixtures::synthetic_table;
    use crate::domain::SubjectFeatures;

    fn record(age: f64, male: bool) -> CanonicalRecord {
        CanonicalRecord {
            features: SubjectFeatures {
                age,
                gender_male: if male { 1.0 } else { 0.0 },
                ..Default::default()
            },
            target_htn: 0,
            target_dm: 0,
        }
    }

    #[test]
    fn test_narrow_window_is_reproducible() {
        let table = synthetic_table(1000, 5);
        let cfg = CohortConfig::default();

        let a = similar_cohort(&table, 55.0, true, 30, &cfg);
        let b = similar_cohort(&table, 55.0, true, 30, &cfg);

        assert_eq!(a.window, CohortWindow::Narrow);
        assert_eq!(a.len(), 30);
        assert_eq!(a, b);
        assert!(a
            .records
            .iter()
            .all(|r| r.is_male() && (r.features.age - 55.0).abs() <= 5.0));
    }

    #[test]
    fn test_relaxed_window_ignores_sex() {
        let mut records: Vec<_> = (0..5u8).map(|i| record(50.0 + f64::from(i), true)).collect();
        records.extend((0..5u8).map(|i| record(48.0 + f64::from(i), false)));
        records.push(record(80.0, true));
        let table = CanonicalTable::from_records(records);

        let cohort = similar_cohort(&table, 50.0, true, 100, &CohortConfig::default());

        assert_eq!(cohort.window, CohortWindow::Relaxed);
        assert_eq!(cohort.matched, 10);
        assert_eq!(cohort.len(), 10);
        assert!(cohort.records.iter().any(|r| !r.is_male()));
    }

    #[test]
    fn test_full_table_fallback() {
        let table = CanonicalTable::from_records(vec![record(20.0, false), record(22.0, true)]);
        let cohort = similar_cohort(&table, 70.0, true, 500, &CohortConfig::default());

        assert_eq!(cohort.window, CohortWindow::FullTable);
        assert_eq!(cohort.len(), 2);
    }

    #[test]
    fn test_limit_above_pool_returns_whole_pool() {
        let table = synthetic_table(300, 9);
        let cfg = CohortConfig {
            fallback_seed: Some(3),
            ..CohortConfig::default()
        };
        let cohort = similar_cohort(&table, 50.0, false, 1000, &cfg);
        assert_eq!(cohort.len(), cohort.matched);
    }

    #[test]
    fn test_relaxed_window_is_reproducible_without_fallback_seed() {
        let table = CanonicalTable::from_records(
            (0..40u8)
                .map(|i| record(f64::from(i % 20) + 40.0, i % 2 == 0))
                .collect(),
        );
        let cfg = CohortConfig {
            min_narrow_matches: 100,
            ..CohortConfig::default()
        };
        assert_eq!(cfg.fallback_seed, None);

        let a = similar_cohort(&table, 50.0, true, 10, &cfg);
        let b = similar_cohort(&table, 50.0, true, 10, &cfg);
        assert_eq!(a.window, CohortWindow::Relaxed);
        assert_eq!(a.len(), 10);
        assert_eq!(a, b);
    }

    #[test]
    fn test_fallback_seed_makes_full_table_path_deterministic() {
        let table = CanonicalTable::from_records(
            (0..30u8).map(|i| record(20.0 + f64::from(i % 5), i % 2 == 0)).collect(),
        );
        let cfg = CohortConfig {
            fallback_seed: Some(99),
            ..CohortConfig::default()
        };
        let a = similar_cohort(&table, 80.0, true, 8, &cfg);
        let b = similar_cohort(&table, 80.0, true, 8, &cfg);
        assert_eq!(a.window, CohortWindow::FullTable);
        assert_eq!(a, b);
    }
}
