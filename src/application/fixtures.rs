//! Deterministic synthetic population used by the application tests.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::application::normalize::{normalize, CanonicalTable};
use crate::domain::{sigmoid, SubjectFeatures, SubjectQuery};
use crate::ports::RawTable;

const HEADERS: [&str; 19] = [
    "Age",
    "BMI",
    "Systolic_BP",
    "Diastolic_BP",
    "Cholesterol",
    "LDL",
    "HDL",
    "Triglycerides",
    "Glucose",
    "Heart_Rate",
    "Salt_Intake",
    "Alcohol_Intake",
    "Sleep_Duration",
    "Physical_Activity_Level",
    "Gender",
    "Smoking_Status",
    "Family_History",
    "Hypertension",
    "Diabetes",
];

/// Raw table in the historical export format. Glucose drives the diabetes label
/// and systolic pressure the hypertension label; the labels are correlated.
pub(crate) fn synthetic_raw_table(n: usize, seed: u64) -> RawTable {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let yes_no = |b: bool| if b { "Yes" } else { "No" }.to_string();

    let rows = (0..n)
        .map(|_| {
            let age: f64 = rng.gen_range(25.0..80.0);
            let glucose: f64 = rng.gen_range(70.0..140.0);
            let sbp: f64 = rng.gen_range(100.0..180.0);
            let dm = rng.gen::<f64>() < sigmoid((glucose - 112.0) / 6.0);
            let htn_logit = (sbp - 140.0) / 8.0 + if dm { 0.8 } else { 0.0 };
            let htn = rng.gen::<f64>() < sigmoid(htn_logit);

            let activity = ["Low", "Moderate", "High"][rng.gen_range(0..3)];
            let gender = if rng.gen_bool(0.5) { "Male" } else { "Female" };
            let smoking = ["Never", "Former", "Current"][rng.gen_range(0..3)];

            vec![
                format!("{age:.0}"),
                format!("{:.1}", rng.gen_range(18.0..40.0)),
                format!("{sbp:.0}"),
                format!("{:.0}", rng.gen_range(60.0..110.0)),
                format!("{:.0}", rng.gen_range(150.0..280.0)),
                format!("{:.0}", rng.gen_range(70.0..190.0)),
                format!("{:.0}", rng.gen_range(30.0..80.0)),
                format!("{:.0}", rng.gen_range(80.0..300.0)),
                format!("{glucose:.0}"),
                format!("{:.0}", rng.gen_range(55.0..100.0)),
                format!("{:.1}", rng.gen_range(2.0..15.0)),
                format!("{:.0}", rng.gen_range(0.0..14.0)),
                format!("{:.1}", rng.gen_range(4.0..10.0)),
                activity.to_string(),
                gender.to_string(),
                smoking.to_string(),
                yes_no(rng.gen_bool(0.3)),
                yes_no(htn),
                yes_no(dm),
            ]
        })
        .collect();

    RawTable::new(HEADERS.iter().map(|h| h.to_string()).collect(), rows)
}

/// [`synthetic_raw_table`] after normalization.
pub(crate) fn synthetic_table(n: usize, seed: u64) -> CanonicalTable {
    normalize(&synthetic_raw_table(n, seed)).expect("synthetic table normalizes")
}

/// Overwrite one column of a raw table with a fixed value.
pub(crate) fn set_column(table: &mut RawTable, column: &str, value: &str) {
    let idx = table.column_index(column).expect("column exists");
    for row in &mut table.rows {
        row[idx] = value.to_string();
    }
}

/// A 55-year-old male with elevated pressure and borderline glucose.
pub(crate) fn sample_query(has_htn: bool, has_dm: bool) -> SubjectQuery {
    let features = SubjectFeatures {
        age: 55.0,
        bmi: 29.0,
        systolic_bp: 150.0,
        diastolic_bp: 85.0,
        cholesterol: 220.0,
        ldl: 120.0,
        hdl: 45.0,
        triglycerides: 180.0,
        glucose: 110.0,
        heart_rate: 78.0,
        salt_intake: 9.0,
        alcohol_intake: 7.0,
        sleep_duration: 6.5,
        physical_activity_level: 2.0,
        gender_male: 1.0,
        smoking_num: 1.0,
        family_history_num: 1.0,
    };
    SubjectQuery::new(features, has_htn, has_dm)
}
