//! Canonical feature schema shared by the normalizer, both risk models and the
//! cohort sampler.
//!
//! The order of [`Feature::ALL`] is significant: it fixes the vector position of
//! every feature for both standardizers and both weight vectors.

use serde::{Deserialize, Serialize};

/// Number of canonical features (without the conditioning column).
pub const FEATURE_COUNT: usize = 17;

/// Length of a conditioned vector: canonical features plus the other condition's label.
pub const CONDITIONED_LEN: usize = FEATURE_COUNT + 1;

/// One canonical feature column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Feature {
    Age,
    Bmi,
    SystolicBp,
    DiastolicBp,
    Cholesterol,
    Ldl,
    Hdl,
    Triglycerides,
    Glucose,
    HeartRate,
    SaltIntake,
    AlcoholIntake,
    SleepDuration,
    PhysicalActivityLevel,
    GenderMale,
    SmokingNum,
    FamilyHistoryNum,
}

impl Feature {
    /// All features in schema order.
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::Age,
        Feature::Bmi,
        Feature::SystolicBp,
        Feature::DiastolicBp,
        Feature::Cholesterol,
        Feature::Ldl,
        Feature::Hdl,
        Feature::Triglycerides,
        Feature::Glucose,
        Feature::HeartRate,
        Feature::SaltIntake,
        Feature::AlcoholIntake,
        Feature::SleepDuration,
        Feature::PhysicalActivityLevel,
        Feature::GenderMale,
        Feature::SmokingNum,
        Feature::FamilyHistoryNum,
    ];

    /// Position of this feature in the canonical vector.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Canonical column name as it appears in historical datasets.
    #[must_use]
    pub fn column(self) -> &'static str {
        match self {
            Self::Age => "Age",
            Self::Bmi => "BMI",
            Self::SystolicBp => "Systolic_BP",
            Self::DiastolicBp => "Diastolic_BP",
            Self::Cholesterol => "Cholesterol",
            Self::Ldl => "LDL",
            Self::Hdl => "HDL",
            Self::Triglycerides => "Triglycerides",
            Self::Glucose => "Glucose",
            Self::HeartRate => "Heart_Rate",
            Self::SaltIntake => "Salt_Intake",
            Self::AlcoholIntake => "Alcohol_Intake",
            Self::SleepDuration => "Sleep_Duration",
            Self::PhysicalActivityLevel => "Physical_Activity_Level",
            Self::GenderMale => "Gender_Male",
            Self::SmokingNum => "Smoking_Num",
            Self::FamilyHistoryNum => "Family_History_Num",
        }
    }

    /// Human-readable label used in attribution maps.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Age => "Age",
            Self::Bmi => "Weight (BMI)",
            Self::SystolicBp => "Systolic Pressure",
            Self::DiastolicBp => "Diastolic Pressure",
            Self::Cholesterol => "Cholesterol",
            Self::Ldl => "LDL",
            Self::Hdl => "HDL",
            Self::Triglycerides => "Triglycerides",
            Self::Glucose => "Blood Sugar",
            Self::HeartRate => "Pulse",
            Self::SaltIntake => "Salt",
            Self::AlcoholIntake => "Alcohol",
            Self::SleepDuration => "Sleep",
            Self::PhysicalActivityLevel => "Inactivity",
            Self::GenderMale => "Sex",
            Self::SmokingNum => "Smoking",
            Self::FamilyHistoryNum => "Genetics",
        }
    }
}

/// The two chronic conditions modelled by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    Hypertension,
    Diabetes,
}

impl Condition {
    /// The sibling condition used as this model's conditioning feature.
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::Hypertension => Self::Diabetes,
            Self::Diabetes => Self::Hypertension,
        }
    }

    /// Label shown when this condition appears as a conditioning feature.
    #[must_use]
    pub fn existing_label(self) -> &'static str {
        match self {
            Self::Hypertension => "Existing Hypertension",
            Self::Diabetes => "Existing Diabetes",
        }
    }

    /// Short code used in logs and CLI arguments.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Hypertension => "htn",
            Self::Diabetes => "dm",
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Condition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "htn" | "hypertension" => Ok(Self::Hypertension),
            "dm" | "diabetes" => Ok(Self::Diabetes),
            other => Err(format!("Unknown condition: {other}")),
        }
    }
}

/// Numeric feature values of one subject, in named form.
///
/// Field order matches [`Feature::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct SubjectFeatures {
    /// Age in years
    pub age: f64,
    /// Body mass index in kg/m²
    pub bmi: f64,
    /// Systolic blood pressure in mmHg
    pub systolic_bp: f64,
    /// Diastolic blood pressure in mmHg
    pub diastolic_bp: f64,
    /// Total cholesterol in mg/dL
    pub cholesterol: f64,
    /// LDL cholesterol in mg/dL
    pub ldl: f64,
    /// HDL cholesterol in mg/dL
    pub hdl: f64,
    /// Triglycerides in mg/dL
    pub triglycerides: f64,
    /// Fasting glucose in mg/dL
    pub glucose: f64,
    /// Resting heart rate in beats per minute
    pub heart_rate: f64,
    /// Daily salt intake in grams
    pub salt_intake: f64,
    /// Weekly alcohol intake in drinks
    pub alcohol_intake: f64,
    /// Nightly sleep in hours
    pub sleep_duration: f64,
    /// Activity level, 1 (sedentary) to 4 (very active)
    pub physical_activity_level: f64,
    /// 1 = male, 0 = female
    pub gender_male: f64,
    /// 0 = never, 1 = former, 2 = current smoker
    pub smoking_num: f64,
    /// 1 = family history of cardiometabolic disease
    pub family_history_num: f64,
}

impl SubjectFeatures {
    /// Convert to the canonical vector.
    #[must_use]
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.age,
            self.bmi,
            self.systolic_bp,
            self.diastolic_bp,
            self.cholesterol,
            self.ldl,
            self.hdl,
            self.triglycerides,
            self.glucose,
            self.heart_rate,
            self.salt_intake,
            self.alcohol_intake,
            self.sleep_duration,
            self.physical_activity_level,
            self.gender_male,
            self.smoking_num,
            self.family_history_num,
        ]
    }

    /// Build from a canonical vector.
    #[must_use]
    pub fn from_array(v: [f64; FEATURE_COUNT]) -> Self {
        Self {
            age: v[0],
            bmi: v[1],
            systolic_bp: v[2],
            diastolic_bp: v[3],
            cholesterol: v[4],
            ldl: v[5],
            hdl: v[6],
            triglycerides: v[7],
            glucose: v[8],
            heart_rate: v[9],
            salt_intake: v[10],
            alcohol_intake: v[11],
            sleep_duration: v[12],
            physical_activity_level: v[13],
            gender_male: v[14],
            smoking_num: v[15],
            family_history_num: v[16],
        }
    }

    /// Value of a single feature.
    #[must_use]
    pub fn get(&self, feature: Feature) -> f64 {
        self.to_array()[feature.index()]
    }

    /// Build the 18-element vector consumed by either risk model: canonical
    /// features followed by the flag of the condition the model is conditioned on.
    #[must_use]
    pub fn conditioned(&self, conditioning: bool) -> [f64; CONDITIONED_LEN] {
        let mut out = [0.0; CONDITIONED_LEN];
        out[..FEATURE_COUNT].copy_from_slice(&self.to_array());
        out[FEATURE_COUNT] = if conditioning { 1.0 } else { 0.0 };
        out
    }
}

/// One normalized historical record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    #[serde(flatten)]
    pub features: SubjectFeatures,
    pub target_htn: u8,
    pub target_dm: u8,
}

impl CanonicalRecord {
    /// Label of the given condition (0 or 1).
    #[must_use]
    pub fn label(&self, condition: Condition) -> u8 {
        match condition {
            Condition::Hypertension => self.target_htn,
            Condition::Diabetes => self.target_dm,
        }
    }

    /// Training row for the model predicting `target`: features plus the other label.
    #[must_use]
    pub fn training_row(&self, target: Condition) -> [f64; CONDITIONED_LEN] {
        self.features.conditioned(self.label(target.other()) == 1)
    }

    #[must_use]
    pub fn is_male(&self) -> bool {
        self.features.gender_male == 1.0
    }
}

/// Human-readable label of a conditioned-vector position for the model predicting `target`.
#[must_use]
pub fn conditioned_label(target: Condition, index: usize) -> &'static str {
    match Feature::ALL.get(index) {
        Some(feature) => feature.label(),
        None => target.other().existing_label(),
    }
}
