#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Severity classifier for enriched accident records.
//!
//! The model is a one-hot [`encoder::OneHotEncoder`] over six categorical
//! features composed with a [`forest::RandomForest`] of CART trees. Fitting
//! returns an immutable [`classifier::TrainedModel`] that is shared by the
//! importance ranker and the inference exporter.

pub mod classifier;
pub mod encoder;
pub mod features;
pub mod forest;
pub mod importance;
pub mod metrics;
pub mod split;
pub mod tree;

pub use classifier::{Evaluation, EvaluationParams, SeverityClassifier, TrainedModel};
pub use features::{FeatureRow, prepare_features};
pub use forest::ForestParams;
pub use importance::{ImportanceEntry, ImportanceRanking};
pub use metrics::ClassificationReport;

/// Errors that can occur while training or evaluating the model.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// No rows to train on.
    #[error("Cannot fit a model on an empty training set")]
    EmptyTrainingSet,

    /// Feature rows and targets differ in length.
    #[error("Feature rows ({rows}) and targets ({targets}) differ in length")]
    LengthMismatch {
        /// Number of feature rows.
        rows: usize,
        /// Number of targets.
        targets: usize,
    },

    /// A target class is too sparse for a stratified split.
    #[error(
        "Cannot stratify: class '{class}' has {count} member(s), at least 2 are required"
    )]
    Stratification {
        /// Class label.
        class: String,
        /// Members of that class.
        count: usize,
    },

    /// A partition would hold fewer rows than there are classes.
    #[error(
        "Cannot stratify {total} rows into {train} train / {test} test rows for {classes} classes"
    )]
    SplitTooSmall {
        /// Total rows.
        total: usize,
        /// Rows in the train partition.
        train: usize,
        /// Rows in the test partition.
        test: usize,
        /// Number of classes.
        classes: usize,
    },

    /// A parameter is out of range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}
