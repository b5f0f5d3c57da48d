#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Road accident severity pipeline.
//!
//! Stages, in order:
//!
//! 1. acquire the yearly CSV (download + extract, or a local file)
//! 2. read and normalize it to typed records
//! 3. derive calendar fields and the severity label
//! 4. train the classifier on a stratified split and evaluate it
//! 5. rank encoded features by importance
//! 6. score every record and write the artifacts
//!
//! Stage boundaries are narrated with `log::info!`.

pub mod acquire;
pub mod config;

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use road_severity_accident_models::progress::ProgressCallback;
use road_severity_accident_models::{RawTable, ScoredTable};
use road_severity_export::ExportError;
use road_severity_model::{
    ClassificationReport, ImportanceRanking, ModelError, SeverityClassifier, prepare_features,
};
use road_severity_source::SourceError;

pub use config::PipelineConfig;

/// Errors that abort a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Acquisition, reading or normalization failed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Training or evaluation failed.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Writing an artifact failed.
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Writing the JSON report failed.
    #[error("Failed to write report {path}: {source}")]
    Report {
        /// Report path.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },
}

/// In-memory results of the analysis stages.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub scored: ScoredTable,
    pub ranking: ImportanceRanking,
    pub report: ClassificationReport,
    pub train_size: usize,
    pub test_size: usize,
    /// Raw rows dropped by normalization.
    pub dropped_rows: usize,
}

/// Paths written by a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    /// The enriched table, `.xlsx` or the `.csv` fallback.
    pub table: PathBuf,
    pub importances: PathBuf,
    pub report: Option<PathBuf>,
}

/// Runs normalization, enrichment, evaluation, ranking and scoring on an
/// already-read table.
///
/// # Errors
///
/// Returns [`PipelineError::Source`] if a mandatory column is missing and
/// [`PipelineError::Model`] if the data cannot be split or trained on.
pub fn analyze(
    raw: &RawTable,
    classifier: &SeverityClassifier,
    progress: &dyn ProgressCallback,
) -> Result<Analysis, PipelineError> {
    log::info!("Normalizing schema...");
    let normalized = road_severity_source::normalize::normalize(raw)?;
    let dropped_rows = raw.rows.len() - normalized.records.len();

    log::info!("Engineering features...");
    let enriched = road_severity_source::enrich::enrich(normalized);

    log::info!("Training and evaluating severity classifier...");
    let (rows, targets) = prepare_features(&enriched.records);
    let evaluation = classifier.evaluate(&rows, &targets, progress)?;

    log::info!("Ranking feature importances...");
    let ranking = ImportanceRanking::from_model(&evaluation.model);

    log::info!("Scoring {} records...", enriched.records.len());
    let scored = road_severity_export::score(&evaluation.model, enriched);

    Ok(Analysis {
        scored,
        ranking,
        report: evaluation.report,
        train_size: evaluation.train_size,
        test_size: evaluation.test_size,
        dropped_rows,
    })
}

fn write_report(report: &ClassificationReport, path: &Path) -> Result<(), PipelineError> {
    let report_err = |source: std::io::Error| PipelineError::Report {
        path: path.display().to_string(),
        source,
    };
    let json = serde_json::to_string_pretty(report).map_err(|e| report_err(e.into()))?;
    std::fs::write(path, json).map_err(report_err)?;
    log::info!("Wrote classification report to {}", path.display());
    Ok(())
}

/// Writes the enriched table, the importance CSV and the optional report.
/// If any write fails, the artifacts already written by this call are
/// removed before the error is returned.
///
/// # Errors
///
/// Returns [`PipelineError`] if an artifact cannot be written.
pub fn write_artifacts(
    analysis: &Analysis,
    config: &PipelineConfig,
) -> Result<Artifacts, PipelineError> {
    let mut written = Vec::new();
    let result = write_each_artifact(analysis, config, &mut written);
    if result.is_err() && !written.is_empty() {
        log::warn!(
            "Removing {} artifact(s) written before the failure",
            written.len()
        );
        acquire::cleanup(&written);
    }
    result
}

fn write_each_artifact(
    analysis: &Analysis,
    config: &PipelineConfig,
    written: &mut Vec<PathBuf>,
) -> Result<Artifacts, PipelineError> {
    let table = road_severity_export::write_scored_table(&analysis.scored, &config.output)?;
    written.push(table.clone());

    road_severity_export::delimited::write_importances(
        &analysis.ranking,
        &config.importance_output,
    )?;
    written.push(config.importance_output.clone());

    if let Some(path) = &config.report {
        write_report(&analysis.report, path)?;
        written.push(path.clone());
    }

    Ok(Artifacts {
        table,
        importances: config.importance_output.clone(),
        report: config.report.clone(),
    })
}

/// Renders the `k` most important features as a ranked text table.
#[must_use]
pub fn format_top_features(ranking: &ImportanceRanking, k: usize) -> String {
    let top = ranking.top(k);
    let width = top
        .iter()
        .map(|e| e.feature.chars().count())
        .max()
        .unwrap_or(0)
        .max("variavel".len());

    let mut out = String::new();
    let _ = writeln!(out, "Top {} variáveis mais importantes:", top.len());
    let _ = writeln!(out, "{:>4}  {:<width$}  {:>12}", "", "variavel", "importancia");
    for (i, entry) in top.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>4}  {:<width$}  {:>12.6}",
            i + 1,
            entry.feature,
            entry.importance
        );
    }
    out
}

/// Runs the whole pipeline and returns the analysis with the written
/// artifact paths. Temporary files are removed unless `keep_temp` is set,
/// also when a later stage fails.
///
/// # Errors
///
/// Returns [`PipelineError`] from the first failing stage. No artifact is
/// written if acquisition, reading or training fails.
pub async fn run(
    config: &PipelineConfig,
    progress: &dyn ProgressCallback,
) -> Result<(Analysis, Artifacts), PipelineError> {
    log::info!("Acquiring accident data for {}...", config.year);
    let acquired = acquire::acquire(config).await?;

    let result = road_severity_source::reader::read_table(&acquired.csv)
        .map_err(PipelineError::from)
        .and_then(|raw| analyze(&raw, &config.classifier(), progress))
        .and_then(|analysis| {
            let artifacts = write_artifacts(&analysis, config)?;
            Ok((analysis, artifacts))
        });

    if config.keep_temp {
        log::info!("Keeping temporary files: {:?}", acquired.temp_files);
    } else {
        acquire::cleanup(&acquired.temp_files);
    }

    result
}
