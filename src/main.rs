//! CardioRisk: hypertension and diabetes risk assessment
//!
//! Trains both models from the configured dataset, assesses one intake form and
//! prints the result as JSON.
//!
//! # Usage
//!
//! ```bash
//! cardiorisk <intake.json> [--dataset <csv>] [--limit <n>] [--export-models <out.json>]
//! ```

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cardiorisk::adapters::sanitize::SanitizingMakeWriter;
use cardiorisk::application::CohortWindow;
use cardiorisk::domain::{lifestyle_advice, Advice, IntakeForm, RiskBand};
use cardiorisk::{AssessmentResult, EngineConfig, EngineStatus, RiskEngine};

struct Args {
    intake: PathBuf,
    dataset: Option<PathBuf>,
    limit: Option<usize>,
    export_models: Option<PathBuf>,
}

fn usage() -> String {
    "Usage: cardiorisk <intake.json> [--dataset <csv>] [--limit <n>] [--export-models <out.json>]"
        .to_string()
}

fn parse_args() -> Result<Args> {
    let mut args = std::env::args().skip(1);
    let mut intake: Option<PathBuf> = None;
    let mut dataset = None;
    let mut limit = None;
    let mut export_models = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--dataset" => {
                dataset = Some(PathBuf::from(
                    args.next().ok_or_else(|| anyhow::anyhow!(usage()))?,
                ));
            }
            "--limit" => {
                let v = args.next().ok_or_else(|| anyhow::anyhow!(usage()))?;
                let parsed = v
                    .trim()
                    .parse::<usize>()
                    .context("--limit must be a positive integer")?;
                limit = Some(parsed);
            }
            "--export-models" => {
                export_models = Some(PathBuf::from(
                    args.next().ok_or_else(|| anyhow::anyhow!(usage()))?,
                ));
            }
            "-h" | "--help" => bail!(usage()),
            _ => {
                if intake.is_some() {
                    bail!(usage());
                }
                intake = Some(PathBuf::from(arg));
            }
        }
    }

    Ok(Args {
        intake: intake.ok_or_else(|| anyhow::anyhow!(usage()))?,
        dataset,
        limit,
        export_models,
    })
}

#[derive(Serialize)]
struct CohortSummary {
    window: CohortWindow,
    matched: usize,
    size: usize,
}

#[derive(Serialize)]
struct BandSummary {
    band: RiskBand,
    description: &'static str,
}

impl From<RiskBand> for BandSummary {
    fn from(band: RiskBand) -> Self {
        Self {
            band,
            description: band.description(),
        }
    }
}

#[derive(Serialize)]
struct Report {
    engine: EngineStatus,
    assessment: AssessmentResult,
    htn_band: Option<BandSummary>,
    dm_band: Option<BandSummary>,
    advice: Vec<Advice>,
    cohort: CohortSummary,
}

fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
    // stdout carries the JSON report, so interactive runs log to stderr unless a file is requested.
    let log_mode = std::env::var("CARDIORISK_LOG_MODE").unwrap_or_else(|_| "auto".to_string());

    let (writer, guard) = match log_mode.as_str() {
        "file" => {
            let log_file = std::env::var("CARDIORISK_LOG_FILE")
                .unwrap_or_else(|_| "data/cardiorisk.log".to_string());
            if let Some(parent) = std::path::Path::new(&log_file).parent() {
                // Best-effort: don't fail startup just because the directory is missing.
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_file)
                .with_context(|| format!("Failed to open log file {log_file}"))?;
            tracing_appender::non_blocking(file)
        }
        "stdout" => tracing_appender::non_blocking(std::io::stdout()),
        _ => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(std::io::stderr().is_terminal() && log_mode != "file")
                .with_writer(SanitizingMakeWriter::new(writer)),
        )
        .init();

    Ok(guard)
}

fn main() -> Result<()> {
    let _guard = init_logging()?;
    let args = parse_args()?;

    let mut config = EngineConfig::from_env_or_default();
    if let Some(path) = args.dataset {
        config.dataset_path = path;
    }
    let limit = args.limit.unwrap_or(config.cohort.default_limit);

    tracing::info!("Starting CardioRisk...");
    let engine = RiskEngine::new(config);
    if engine.initialize_from_config() == EngineStatus::Unavailable {
        tracing::warn!("Continuing without a dataset; risks will read 0");
    }

    if let Some(path) = &args.export_models {
        let json = serde_json::to_vec_pretty(&engine.export_models())?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!("Exported models to {}", path.display());
    }

    let raw = std::fs::read_to_string(&args.intake)
        .with_context(|| format!("Failed to read {}", args.intake.display()))?;
    let intake: IntakeForm = serde_json::from_str(&raw).context("Invalid intake JSON")?;
    let query = intake.to_query();

    let assessment = engine.assess_checked(&query)?;
    let is_male = query.features.gender_male == 1.0;
    let cohort = engine.similar_cohort(query.features.age, is_male, limit);

    let scored = assessment.mode.scored_conditions();
    let band = |c: cardiorisk::Condition, risk: f64| {
        scored
            .contains(&c)
            .then(|| BandSummary::from(RiskBand::from_percent(risk)))
    };

    let report = Report {
        engine: engine.status(),
        htn_band: band(cardiorisk::Condition::Hypertension, assessment.htn_risk.0),
        dm_band: band(cardiorisk::Condition::Diabetes, assessment.dm_risk.0),
        advice: lifestyle_advice(&intake),
        cohort: CohortSummary {
            window: cohort.window,
            matched: cohort.matched,
            size: cohort.len(),
        },
        assessment,
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    tracing::info!("CardioRisk run complete.");
    Ok(())
}
