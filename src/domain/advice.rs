//! Lifestyle recommendations derived from intake measurements.

use serde::{Deserialize, Serialize};

use super::subject::{IntakeForm, SmokingStatus};

/// Urgency of a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Good,
    Info,
    Warning,
    Critical,
}

/// A single recommendation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Advice {
    pub severity: Severity,
    pub topic: &'static str,
    pub message: String,
}

impl Advice {
    fn new(severity: Severity, topic: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity,
            topic,
            message: message.into(),
        }
    }
}

/// Recommendations for an intake, most urgent first.
#[must_use]
pub fn lifestyle_advice(intake: &IntakeForm) -> Vec<Advice> {
    let mut out = Vec::new();

    let bmi = intake.bmi();
    if bmi > 30.0 {
        out.push(Advice::new(
            Severity::Critical,
            "weight",
            "Obesity (BMI > 30): losing 10% of body weight is the most effective way to lower blood pressure.",
        ));
    } else if bmi > 25.0 {
        out.push(Advice::new(
            Severity::Warning,
            "weight",
            "Overweight (BMI 25-30): aim for weight control through a balanced diet.",
        ));
    }

    if intake.systolic_bp >= 140.0 || intake.diastolic_bp >= 90.0 {
        out.push(Advice::new(
            Severity::Critical,
            "blood_pressure",
            "High blood pressure: readings are in the hypertensive range; see a physician and restrict salt.",
        ));
    } else if intake.systolic_bp >= 120.0 {
        out.push(Advice::new(
            Severity::Warning,
            "blood_pressure",
            "Elevated blood pressure: monitor regularly and manage stress.",
        ));
    }

    let salt = intake.salt_grams();
    if salt > 5.0 {
        out.push(Advice::new(
            Severity::Warning,
            "salt",
            format!("Salt: {salt:.1} g per day exceeds the 5 g WHO recommendation."),
        ));
    }

    if intake.glucose > 126.0 {
        out.push(Advice::new(
            Severity::Critical,
            "glucose",
            "High fasting glucose: at or above the diabetic threshold; reduce carbohydrates and see an endocrinologist.",
        ));
    } else if intake.glucose > 100.0 {
        out.push(Advice::new(
            Severity::Warning,
            "glucose",
            "Insulin resistance risk: fasting glucose is between 100 and 126.",
        ));
    }

    if intake.ldl > 130.0 || intake.total_cholesterol > 200.0 {
        out.push(Advice::new(
            Severity::Warning,
            "cholesterol",
            "High cholesterol: limit saturated fats.",
        ));
    }
    if intake.triglycerides > 150.0 {
        out.push(Advice::new(
            Severity::Warning,
            "triglycerides",
            "High triglycerides: limit pastries, sweets and alcohol.",
        ));
    }

    if intake.activity_minutes < 30.0 {
        out.push(Advice::new(
            Severity::Info,
            "activity",
            "Inactivity: at least 30 minutes of moderate walking per day is recommended.",
        ));
    }

    if intake.sleep_hours < 6.0 {
        out.push(Advice::new(
            Severity::Info,
            "sleep",
            "Insufficient sleep: under 6 hours raises stress and blood pressure; aim for 7-8 hours.",
        ));
    } else if intake.sleep_hours > 9.0 {
        out.push(Advice::new(
            Severity::Info,
            "sleep",
            "Oversleeping: more than 9 hours may slow metabolism.",
        ));
    }

    if intake.alcohol_per_day > 0.0 {
        out.push(Advice::new(
            Severity::Info,
            "alcohol",
            "Alcohol raises blood pressure and triglycerides; reduce or stop.",
        ));
    }

    if intake.smoking == SmokingStatus::Current {
        out.push(Advice::new(
            Severity::Warning,
            "smoking",
            "Smoking damages blood vessels; consider professional cessation support.",
        ));
    }

    if out.is_empty() {
        out.push(Advice::new(
            Severity::Good,
            "overall",
            "All values are within healthy ranges; keep up regular check-ups.",
        ));
    }

    out.sort_by(|a, b| b.severity.cmp(&a.severity));
    out
}
