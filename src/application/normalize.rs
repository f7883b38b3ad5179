//! Dataset normalizer: maps a raw table of unknown conventions onto the
//! canonical schema.
//!
//! Reconciliation is driven by [`RULES`], evaluated in order. Each rule names the
//! source columns it accepts, how their text is encoded, and what to do when none
//! of them is present. Numeric cells that cannot be parsed are imputed with the
//! column mean over the whole table in a single pass.

use crate::domain::{CanonicalRecord, Condition, Feature, SubjectFeatures, FEATURE_COUNT};
use crate::ports::{DatasetError, RawTable};

/// How the text of a source column becomes a number.
#[derive(Debug, Clone, Copy)]
enum Encoding {
    /// Parsed as a number; unparseable cells are imputed.
    Numeric,
    /// 1 when the text names "male" but not "female", or is exactly `1`.
    Sex,
    /// First tier with a matching token wins, else `default`.
    /// Numeric cells pass through when `numeric_passthrough` is set.
    Tiered {
        tiers: &'static [(&'static [&'static str], f64)],
        default: f64,
        numeric_passthrough: bool,
    },
    /// 1 when any token appears in the text.
    Flag(&'static [&'static str]),
}

/// Value used when none of a rule's source columns exists.
#[derive(Debug, Clone, Copy)]
enum Fallback {
    Constant(f64),
    /// `Weight / (Height / 100)²` when both columns exist, else 0.
    BmiFromWeightHeight,
    /// Label is 1 when the raw measurement is at least `at_least`.
    Threshold { measurement: Feature, at_least: f64 },
}

#[derive(Debug, Clone, Copy)]
enum Output {
    Feature(Feature),
    Label(Condition),
}

#[derive(Debug, Clone, Copy)]
struct ColumnRule {
    output: Output,
    sources: &'static [&'static str],
    encoding: Encoding,
    fallback: Fallback,
}

const fn numeric(feature: Feature, sources: &'static [&'static str]) -> ColumnRule {
    ColumnRule {
        output: Output::Feature(feature),
        sources,
        encoding: Encoding::Numeric,
        fallback: Fallback::Constant(0.0),
    }
}

const RULES: &[ColumnRule] = &[
    ColumnRule {
        output: Output::Feature(Feature::GenderMale),
        sources: &["Gender", "Sex"],
        encoding: Encoding::Sex,
        fallback: Fallback::Constant(0.0),
    },
    ColumnRule {
        output: Output::Feature(Feature::SmokingNum),
        sources: &["Smoking_Status", "Smoking"],
        encoding: Encoding::Tiered {
            tiers: &[(&["current", "smoker", "yes"], 2.0), (&["former", "past"], 1.0)],
            default: 0.0,
            numeric_passthrough: false,
        },
        fallback: Fallback::Constant(0.0),
    },
    ColumnRule {
        output: Output::Feature(Feature::FamilyHistoryNum),
        sources: &["Family_History"],
        encoding: Encoding::Flag(&["yes", "1", "true"]),
        fallback: Fallback::Constant(0.0),
    },
    ColumnRule {
        output: Output::Feature(Feature::PhysicalActivityLevel),
        sources: &["Physical_Activity_Level"],
        encoding: Encoding::Tiered {
            tiers: &[(&["low"], 1.0), (&["moderate"], 2.0), (&["high"], 3.0)],
            default: 2.0,
            numeric_passthrough: true,
        },
        fallback: Fallback::Constant(0.0),
    },
    ColumnRule {
        output: Output::Feature(Feature::Bmi),
        sources: &["BMI"],
        encoding: Encoding::Numeric,
        fallback: Fallback::BmiFromWeightHeight,
    },
    ColumnRule {
        output: Output::Label(Condition::Hypertension),
        sources: &["Hypertension"],
        encoding: Encoding::Flag(&["high", "yes", "1"]),
        fallback: Fallback::Threshold {
            measurement: Feature::SystolicBp,
            at_least: 140.0,
        },
    },
    ColumnRule {
        output: Output::Label(Condition::Diabetes),
        sources: &["Diabetes"],
        encoding: Encoding::Flag(&["high", "yes", "1", "true"]),
        fallback: Fallback::Threshold {
            measurement: Feature::Glucose,
            at_least: 126.0,
        },
    },
    numeric(Feature::Age, &["Age"]),
    numeric(Feature::SystolicBp, &["Systolic_BP"]),
    numeric(Feature::DiastolicBp, &["Diastolic_BP"]),
    numeric(Feature::Cholesterol, &["Cholesterol"]),
    numeric(Feature::Ldl, &["LDL"]),
    numeric(Feature::Hdl, &["HDL"]),
    numeric(Feature::Triglycerides, &["Triglycerides"]),
    numeric(Feature::Glucose, &["Glucose"]),
    numeric(Feature::HeartRate, &["Heart_Rate"]),
    numeric(Feature::SaltIntake, &["Salt_Intake"]),
    numeric(Feature::AlcoholIntake, &["Alcohol_Intake"]),
    numeric(Feature::SleepDuration, &["Sleep_Duration"]),
];

/// Normalized, fully numeric training table.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalTable {
    pub records: Vec<CanonicalRecord>,
    /// Imputation value of each feature column (mean of its parseable cells)
    pub column_means: [f64; FEATURE_COUNT],
    /// Number of cells filled by imputation
    pub imputed_cells: usize,
}

impl CanonicalTable {
    /// Build a table from already canonical records, computing column means.
    #[must_use]
    pub fn from_records(records: Vec<CanonicalRecord>) -> Self {
        let mut column_means = [0.0; FEATURE_COUNT];
        if !records.is_empty() {
            for record in &records {
                for (m, x) in column_means.iter_mut().zip(record.features.to_array()) {
                    *m += x;
                }
            }
            let n = records.len() as f64;
            column_means.iter_mut().for_each(|m| *m /= n);
        }
        Self {
            records,
            column_means,
            imputed_cells: 0,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records carrying the given condition.
    #[must_use]
    pub fn positives(&self, condition: Condition) -> usize {
        self.records
            .iter()
            .filter(|r| r.label(condition) == 1)
            .count()
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|x| x.is_finite())
}

fn contains_any(text: &str, tokens: &[&str]) -> bool {
    tokens.iter().any(|t| text.contains(t))
}

impl Encoding {
    fn encode(self, raw: &str) -> Option<f64> {
        let lower = raw.to_lowercase();
        match self {
            Self::Numeric => parse_number(raw),
            Self::Sex => {
                let male = lower.contains("male") && !lower.contains("female");
                Some(if male || raw.trim() == "1" { 1.0 } else { 0.0 })
            }
            Self::Tiered {
                tiers,
                default,
                numeric_passthrough,
            } => {
                if numeric_passthrough {
                    if let Some(x) = parse_number(raw) {
                        return Some(x);
                    }
                }
                let value = tiers
                    .iter()
                    .find(|(tokens, _)| contains_any(&lower, tokens))
                    .map_or(default, |(_, v)| *v);
                Some(value)
            }
            Self::Flag(tokens) => Some(if contains_any(&lower, tokens) { 1.0 } else { 0.0 }),
        }
    }
}

impl ColumnRule {
    fn source_index(&self, table: &RawTable) -> Option<(usize, &'static str)> {
        self.sources
            .iter()
            .find_map(|name| table.column_index(name).map(|idx| (idx, *name)))
    }

    /// Evaluate the rule for every row; `None` cells are imputed later.
    fn apply(&self, table: &RawTable) -> Result<Vec<Option<f64>>, DatasetError> {
        if let Some((idx, name)) = self.source_index(table) {
            tracing::debug!("Rule {:?} reads column {name:?}", self.output);
            return Ok((0..table.len())
                .map(|row| self.encoding.encode(table.cell(row, idx)))
                .collect());
        }

        match self.fallback {
            Fallback::Constant(c) => {
                tracing::debug!("Rule {:?}: no source column, using constant {c}", self.output);
                Ok(vec![Some(c); table.len()])
            }
            Fallback::BmiFromWeightHeight => {
                match (table.column_index("Weight"), table.column_index("Height")) {
                    (Some(w), Some(h)) => {
                        tracing::debug!("Deriving BMI from Weight and Height");
                        Ok((0..table.len())
                            .map(|row| {
                                let weight = parse_number(table.cell(row, w))?;
                                let height = parse_number(table.cell(row, h))?;
                                let meters = height / 100.0;
                                (meters > 0.0).then(|| weight / (meters * meters))
                            })
                            .collect())
                    }
                    _ => Ok(vec![Some(0.0); table.len()]),
                }
            }
            Fallback::Threshold {
                measurement,
                at_least,
            } => {
                let idx = table
                    .column_index(measurement.column())
                    .ok_or(DatasetError::MissingColumn(measurement.column()))?;
                tracing::debug!(
                    "Rule {:?}: deriving label from {} >= {at_least}",
                    self.output,
                    measurement.column()
                );
                Ok((0..table.len())
                    .map(|row| {
                        let hit = parse_number(table.cell(row, idx)).is_some_and(|x| x >= at_least);
                        Some(if hit { 1.0 } else { 0.0 })
                    })
                    .collect())
            }
        }
    }
}

/// Normalize a raw table into the canonical schema.
///
/// # Errors
/// Returns `DatasetError::Empty` for a table without rows and
/// `DatasetError::MissingColumn` when a label must be derived from a measurement
/// that is not present.
pub fn normalize(table: &RawTable) -> Result<CanonicalTable, DatasetError> {
    if table.is_empty() {
        return Err(DatasetError::Empty);
    }

    let n = table.len();
    let mut columns: Vec<Vec<Option<f64>>> = vec![vec![Some(0.0); n]; FEATURE_COUNT];
    let mut htn = vec![0u8; n];
    let mut dm = vec![0u8; n];

    for rule in RULES {
        let values = rule.apply(table)?;
        match rule.output {
            Output::Feature(feature) => columns[feature.index()] = values,
            Output::Label(condition) => {
                let labels: Vec<u8> = values
                    .into_iter()
                    .map(|v| u8::from(v == Some(1.0)))
                    .collect();
                match condition {
                    Condition::Hypertension => htn = labels,
                    Condition::Diabetes => dm = labels,
                }
            }
        }
    }

    // Single imputation pass: each column's mean over its own parseable cells.
    let mut column_means = [0.0; FEATURE_COUNT];
    let mut imputed_cells = 0;
    let mut dense: Vec<Vec<f64>> = Vec::with_capacity(FEATURE_COUNT);
    for (feature, column) in Feature::ALL.iter().zip(columns) {
        let present: Vec<f64> = column.iter().flatten().copied().collect();
        let mean = if present.is_empty() {
            tracing::warn!(
                "Column {} has no numeric values; filling with 0",
                feature.column()
            );
            0.0
        } else {
            present.iter().sum::<f64>() / present.len() as f64
        };
        imputed_cells += n - present.len();
        column_means[feature.index()] = mean;
        dense.push(column.into_iter().map(|v| v.unwrap_or(mean)).collect());
    }

    let records = (0..n)
        .map(|row| {
            let mut v = [0.0; FEATURE_COUNT];
            for (slot, column) in v.iter_mut().zip(&dense) {
                *slot = column[row];
            }
            CanonicalRecord {
                features: SubjectFeatures::from_array(v),
                target_htn: htn[row],
                target_dm: dm[row],
            }
        })
        .collect();

    if imputed_cells > 0 {
        tracing::info!("Imputed {imputed_cells} missing or unparseable cells with column means");
    }

    Ok(CanonicalTable {
        records,
        column_means,
        imputed_cells,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_sex_encoding() {
        let t = table(
            &["Gender", "Systolic_BP", "Glucose"],
            &[&["Male", "120", "90"], &["Female", "120", "90"], &["1", "120", "90"], &["m", "120", "90"]],
        );
        let out = normalize(&t).expect("normalize");
        let sexes: Vec<f64> = out.records.iter().map(|r| r.features.gender_male).collect();
        assert_eq!(sexes, vec![1.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_smoking_and_family_history_encoding() {
        let t = table(
            &["Smoking_Status", "Family_History", "Systolic_BP", "Glucose"],
            &[
                &["Current", "Yes", "120", "90"],
                &["Former", "No", "120", "90"],
                &["Never", "TRUE", "120", "90"],
                &["past smoker", "0", "120", "90"],
            ],
        );
        let out = normalize(&t).expect("normalize");
        let smoking: Vec<f64> = out.records.iter().map(|r| r.features.smoking_num).collect();
        let family: Vec<f64> = out.records.iter().map(|r| r.features.family_history_num).collect();
        // "current" tokens take priority over "former" ones.
        assert_eq!(smoking, vec![2.0, 1.0, 0.0, 2.0]);
        assert_eq!(family, vec![1.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_activity_levels() {
        let t = table(
            &["Physical_Activity_Level", "Systolic_BP", "Glucose"],
            &[
                &["Low", "120", "90"],
                &["Moderate", "120", "90"],
                &["HIGH", "120", "90"],
                &["unknown", "120", "90"],
                &["4", "120", "90"],
            ],
        );
        let out = normalize(&t).expect("normalize");
        let levels: Vec<f64> = out
            .records
            .iter()
            .map(|r| r.features.physical_activity_level)
            .collect();
        assert_eq!(levels, vec![1.0, 2.0, 3.0, 2.0, 4.0]);
    }

    #[test]
    fn test_labels_from_columns() {
        let t = table(
            &["Hypertension", "Diabetes", "Systolic_BP", "Glucose"],
            &[
                &["High", "true", "110", "80"],
                &["No", "0", "170", "200"],
                &["1", "Yes", "110", "80"],
            ],
        );
        let out = normalize(&t).expect("normalize");
        let htn: Vec<u8> = out.records.iter().map(|r| r.target_htn).collect();
        let dm: Vec<u8> = out.records.iter().map(|r| r.target_dm).collect();
        // Explicit label columns win over thresholds.
        assert_eq!(htn, vec![1, 0, 1]);
        assert_eq!(dm, vec![1, 0, 1]);
    }

    #[test]
    fn test_labels_derived_by_threshold() {
        let t = table(
            &["Systolic_BP", "Glucose"],
            &[&["140", "125.9"], &["139.5", "126"], &["n/a", "n/a"]],
        );
        let out = normalize(&t).expect("normalize");
        let htn: Vec<u8> = out.records.iter().map(|r| r.target_htn).collect();
        let dm: Vec<u8> = out.records.iter().map(|r| r.target_dm).collect();
        assert_eq!(htn, vec![1, 0, 0]);
        assert_eq!(dm, vec![0, 1, 0]);
    }

    #[test]
    fn test_missing_threshold_column_is_malformed() {
        let t = table(&["Age", "Glucose"], &[&["40", "90"]]);
        assert!(matches!(
            normalize(&t),
            Err(DatasetError::MissingColumn("Systolic_BP"))
        ));
    }

    #[test]
    fn test_bmi_derived_from_weight_and_height() {
        let t = table(
            &["Weight", "Height", "Systolic_BP", "Glucose"],
            &[&["80", "200", "120", "90"], &["90", "150", "120", "90"]],
        );
        let out = normalize(&t).expect("normalize");
        assert!((out.records[0].features.bmi - 20.0).abs() < 1e-9);
        assert!((out.records[1].features.bmi - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_absent_columns_default_to_zero() {
        let t = table(&["Systolic_BP", "Glucose"], &[&["120", "90"]]);
        let out = normalize(&t).expect("normalize");
        let f = out.records[0].features;
        assert_eq!(f.age, 0.0);
        assert_eq!(f.bmi, 0.0);
        assert_eq!(f.physical_activity_level, 0.0);
        assert_eq!(f.gender_male, 0.0);
        assert_eq!(out.imputed_cells, 0);
    }

    #[test]
    fn test_unparseable_cells_imputed_with_column_mean() {
        let t = table(
            &["Age", "Systolic_BP", "Glucose"],
            &[&["40", "120", "90"], &["abc", "130", ""], &["60", "NaN", "110"]],
        );
        let out = normalize(&t).expect("normalize");
        assert_eq!(out.imputed_cells, 3);
        assert!((out.records[1].features.age - 50.0).abs() < 1e-9);
        assert!((out.records[1].features.glucose - 100.0).abs() < 1e-9);
        assert!((out.records[2].features.systolic_bp - 125.0).abs() < 1e-9);
        assert!((out.column_means[Feature::Age.index()] - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_table_rejected() {
        let t = table(&["Systolic_BP", "Glucose"], &[]);
        assert!(matches!(normalize(&t), Err(DatasetError::Empty)));
    }

    #[test]
    fn test_from_records_computes_means() {
        let mk = |age: f64| CanonicalRecord {
            features: SubjectFeatures {
                age,
                ..Default::default()
            },
            target_htn: 0,
            target_dm: 1,
        };
        let t = CanonicalTable::from_records(vec![mk(30.0), mk(50.0)]);
        assert!((t.column_means[0] - 40.0).abs() < 1e-12);
        assert_eq!(t.positives(Condition::Diabetes), 2);
        assert_eq!(t.positives(Condition::Hypertension), 0);
    }
}
