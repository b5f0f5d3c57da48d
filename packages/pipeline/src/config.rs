//! Run configuration.

use std::path::PathBuf;

use road_severity_model::importance::DEFAULT_TOP_K;
use road_severity_model::{EvaluationParams, ForestParams, SeverityClassifier};

/// Default analysis year.
pub const DEFAULT_YEAR: i32 = 2023;

/// Default path of the enriched table.
pub const DEFAULT_OUTPUT: &str = "dados_sinistros_para_looker.xlsx";

/// Default path of the importance CSV.
pub const DEFAULT_IMPORTANCE_OUTPUT: &str = "importancia_variaveis_modelo.csv";

/// Everything a pipeline run needs.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Analysis year, used to name the downloaded archive.
    pub year: i32,
    /// Local `.csv` or `.zip` to read instead of downloading.
    pub input: Option<PathBuf>,
    /// Dataset URL. `None` resolves through the environment, then the
    /// built-in default.
    pub url: Option<String>,
    /// Directory for the downloaded archive and extracted CSV.
    pub work_dir: PathBuf,
    pub output: PathBuf,
    pub importance_output: PathBuf,
    /// Optional JSON copy of the classification report.
    pub report: Option<PathBuf>,
    /// Rows of the printed importance summary.
    pub top_k: usize,
    pub forest: ForestParams,
    pub evaluation: EvaluationParams,
    /// Keep the downloaded archive and extracted CSV.
    pub keep_temp: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            year: DEFAULT_YEAR,
            input: None,
            url: None,
            work_dir: PathBuf::from("."),
            output: PathBuf::from(DEFAULT_OUTPUT),
            importance_output: PathBuf::from(DEFAULT_IMPORTANCE_OUTPUT),
            report: None,
            top_k: DEFAULT_TOP_K,
            forest: ForestParams::default(),
            evaluation: EvaluationParams::default(),
            keep_temp: false,
        }
    }
}

impl PipelineConfig {
    /// The classifier described by this configuration.
    #[must_use]
    pub const fn classifier(&self) -> SeverityClassifier {
        SeverityClassifier::new(self.forest, self.evaluation)
    }
}
