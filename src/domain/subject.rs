//! Subject query types: what a caller supplies for one analysis request.
//!
//! [`IntakeForm`] carries measurements the way they are collected (height and weight,
//! activity minutes, salt in household units); [`SubjectQuery`] is the canonical form
//! consumed by the engine.

use serde::{Deserialize, Serialize};

use super::features::SubjectFeatures;

/// Errors raised when a subject cannot be handed to the models.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} is not a finite number")]
    NotFinite { field: &'static str },

    #[error("{field} {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field} {value} is not a valid code")]
    InvalidCode { field: &'static str, value: f64 },
}

/// One analysis request: canonical features plus the known condition flags.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct SubjectQuery {
    pub features: SubjectFeatures,
    /// Hypertension already diagnosed
    pub has_htn: bool,
    /// Diabetes already diagnosed
    pub has_dm: bool,
}

impl SubjectQuery {
    #[must_use]
    pub fn new(features: SubjectFeatures, has_htn: bool, has_dm: bool) -> Self {
        Self {
            features,
            has_htn,
            has_dm,
        }
    }

    /// Reject non-numeric or out-of-domain input before it reaches model code.
    ///
    /// # Errors
    /// Returns every violation found.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let f = &self.features;
        let mut errors = Vec::new();

        let ranges: [(&'static str, f64, f64, f64); 13] = [
            ("Age", f.age, 1.0, 120.0),
            ("BMI", f.bmi, 10.0, 80.0),
            ("Systolic BP", f.systolic_bp, 50.0, 260.0),
            ("Diastolic BP", f.diastolic_bp, 30.0, 160.0),
            ("Cholesterol", f.cholesterol, 50.0, 600.0),
            ("LDL", f.ldl, 10.0, 400.0),
            ("HDL", f.hdl, 5.0, 200.0),
            ("Triglycerides", f.triglycerides, 10.0, 2000.0),
            ("Glucose", f.glucose, 20.0, 700.0),
            ("Heart rate", f.heart_rate, 20.0, 250.0),
            ("Salt intake", f.salt_intake, 0.0, 100.0),
            ("Alcohol intake", f.alcohol_intake, 0.0, 200.0),
            ("Sleep duration", f.sleep_duration, 0.0, 24.0),
        ];
        for (field, value, min, max) in ranges {
            if !value.is_finite() {
                errors.push(ValidationError::NotFinite { field });
            } else if !(min..=max).contains(&value) {
                errors.push(ValidationError::OutOfRange {
                    field,
                    value,
                    min,
                    max,
                });
            }
        }

        let codes: [(&'static str, f64, &[f64]); 4] = [
            (
                "Physical activity level",
                f.physical_activity_level,
                &[1.0, 2.0, 3.0, 4.0],
            ),
            ("Gender", f.gender_male, &[0.0, 1.0]),
            ("Smoking", f.smoking_num, &[0.0, 1.0, 2.0]),
            ("Family history", f.family_history_num, &[0.0, 1.0]),
        ];
        for (field, value, allowed) in codes {
            if !allowed.contains(&value) {
                errors.push(ValidationError::InvalidCode { field, value });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Biological sex as collected on the intake form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Female,
    Male,
}

/// Smoking history as collected on the intake form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmokingStatus {
    Never,
    Former,
    Current,
}

impl SmokingStatus {
    #[must_use]
    pub fn code(self) -> f64 {
        match self {
            Self::Never => 0.0,
            Self::Former => 1.0,
            Self::Current => 2.0,
        }
    }
}

/// Household measures used to report daily salt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SaltUnit {
    Gram,
    TeaspoonLevel,
    TeaspoonHeaped,
    DessertSpoonLevel,
    #[default]
    DessertSpoonHeaped,
    TablespoonLevel,
    TablespoonHeaped,
}

impl SaltUnit {
    /// Grams of salt per unit.
    #[must_use]
    pub fn grams(self) -> f64 {
        match self {
            Self::Gram => 1.0,
            Self::TeaspoonLevel => 2.0,
            Self::TeaspoonHeaped => 4.0,
            Self::DessertSpoonLevel => 5.0,
            Self::DessertSpoonHeaped => 9.0,
            Self::TablespoonLevel => 10.0,
            Self::TablespoonHeaped => 18.0,
        }
    }
}

/// Raw measurements as entered by a person.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeForm {
    pub age: f64,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub systolic_bp: f64,
    pub diastolic_bp: f64,
    pub heart_rate: f64,
    pub glucose: f64,
    pub total_cholesterol: f64,
    pub ldl: f64,
    pub hdl: f64,
    pub triglycerides: f64,
    pub salt_amount: f64,
    #[serde(default)]
    pub salt_unit: SaltUnit,
    /// Drinks per day
    pub alcohol_per_day: f64,
    pub sleep_hours: f64,
    pub activity_minutes: f64,
    pub sex: Sex,
    pub smoking: SmokingStatus,
    pub family_history: bool,
    #[serde(default)]
    pub has_htn: bool,
    #[serde(default)]
    pub has_dm: bool,
}

impl IntakeForm {
    /// Body mass index from height and weight.
    #[must_use]
    pub fn bmi(&self) -> f64 {
        let meters = self.height_cm / 100.0;
        self.weight_kg / (meters * meters)
    }

    /// Daily salt in grams.
    #[must_use]
    pub fn salt_grams(&self) -> f64 {
        self.salt_amount * self.salt_unit.grams()
    }

    /// Activity level 1-4 from daily activity minutes.
    #[must_use]
    pub fn activity_level(&self) -> f64 {
        match self.activity_minutes {
            m if m < 30.0 => 1.0,
            m if m < 60.0 => 2.0,
            m if m < 90.0 => 3.0,
            _ => 4.0,
        }
    }

    /// Convert into the canonical query.
    #[must_use]
    pub fn to_query(&self) -> SubjectQuery {
        let features = SubjectFeatures {
            age: self.age,
            bmi: self.bmi(),
            systolic_bp: self.systolic_bp,
            diastolic_bp: self.diastolic_bp,
            cholesterol: self.total_cholesterol,
            ldl: self.ldl,
            hdl: self.hdl,
            triglycerides: self.triglycerides,
            glucose: self.glucose,
            heart_rate: self.heart_rate,
            salt_intake: self.salt_grams(),
            alcohol_intake: self.alcohol_per_day * 7.0,
            sleep_duration: self.sleep_hours,
            physical_activity_level: self.activity_level(),
            gender_male: match self.sex {
                Sex::Male => 1.0,
                Sex::Female => 0.0,
            },
            smoking_num: self.smoking.code(),
            family_history_num: if self.family_history { 1.0 } else { 0.0 },
        };
        SubjectQuery::new(features, self.has_htn, self.has_dm)
    }
}
