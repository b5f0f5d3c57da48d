//! Severity classifier: encoder + forest training, evaluation, prediction.

use road_severity_accident_models::progress::ProgressCallback;

use crate::ModelError;
use crate::encoder::{EncodedFeature, OneHotEncoder};
use crate::features::FeatureRow;
use crate::forest::{ForestParams, RandomForest};
use crate::metrics::{ClassificationReport, classification_report};
use crate::split::stratified_split;

/// Probability at or above which a row is predicted severe.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// A fitted encoder and forest. Immutable once trained.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedModel {
    encoder: OneHotEncoder,
    forest: RandomForest,
}

impl TrainedModel {
    /// Severe probability for each row.
    #[must_use]
    pub fn predict_proba(&self, rows: &[FeatureRow]) -> Vec<f64> {
        rows.iter()
            .map(|row| self.forest.predict_proba(&self.encoder.transform_row(row)))
            .collect()
    }

    /// Predicted class id (0/1) for each row.
    #[must_use]
    pub fn predict(&self, rows: &[FeatureRow]) -> Vec<u8> {
        self.predict_proba(rows)
            .into_iter()
            .map(|p| u8::from(p >= DECISION_THRESHOLD))
            .collect()
    }

    #[must_use]
    pub const fn encoder(&self) -> &OneHotEncoder {
        &self.encoder
    }

    #[must_use]
    pub const fn forest(&self) -> &RandomForest {
        &self.forest
    }

    /// Each encoded feature paired with its importance, in encoder order.
    #[must_use]
    pub fn encoded_importances(&self) -> Vec<(EncodedFeature, f64)> {
        self.encoder
            .features()
            .iter()
            .cloned()
            .zip(self.forest.feature_importances().iter().copied())
            .collect()
    }
}

/// Hold-out evaluation settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationParams {
    /// Fraction of rows held out for testing.
    pub test_fraction: f64,
    /// Seed for the stratified shuffle.
    pub seed: u64,
}

impl Default for EvaluationParams {
    fn default() -> Self {
        Self {
            test_fraction: 0.3,
            seed: 42,
        }
    }
}

/// Result of a hold-out evaluation.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Model trained on the train partition only.
    pub model: TrainedModel,
    pub report: ClassificationReport,
    pub train_size: usize,
    pub test_size: usize,
}

/// Trains and evaluates the severity model.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SeverityClassifier {
    pub forest: ForestParams,
    pub evaluation: EvaluationParams,
}

impl SeverityClassifier {
    #[must_use]
    pub const fn new(forest: ForestParams, evaluation: EvaluationParams) -> Self {
        Self { forest, evaluation }
    }

    /// Fits the encoder and forest on all given rows.
    ///
    /// # Errors
    ///
    /// * [`ModelError::EmptyTrainingSet`] if `rows` is empty
    /// * [`ModelError::LengthMismatch`] if `rows` and `targets` differ in
    ///   length
    /// * [`ModelError::InvalidParameter`] if the forest parameters are
    ///   invalid
    pub fn fit(
        &self,
        rows: &[FeatureRow],
        targets: &[u8],
        progress: &dyn ProgressCallback,
    ) -> Result<TrainedModel, ModelError> {
        if rows.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        if rows.len() != targets.len() {
            return Err(ModelError::LengthMismatch {
                rows: rows.len(),
                targets: targets.len(),
            });
        }

        let encoder = OneHotEncoder::fit(rows);
        let encoded = encoder.transform(rows);
        log::info!(
            "Training random forest: {} rows, {} encoded features, {} trees",
            rows.len(),
            encoder.n_features(),
            self.forest.n_trees
        );

        let forest =
            RandomForest::fit(&encoded, targets, encoder.n_features(), &self.forest, progress)?;

        Ok(TrainedModel { encoder, forest })
    }

    /// Splits the rows (stratified), trains on the train partition and
    /// reports metrics on the test partition.
    ///
    /// # Errors
    ///
    /// Any error of [`crate::split::stratified_split`] or [`Self::fit`].
    pub fn evaluate(
        &self,
        rows: &[FeatureRow],
        targets: &[u8],
        progress: &dyn ProgressCallback,
    ) -> Result<Evaluation, ModelError> {
        if rows.len() != targets.len() {
            return Err(ModelError::LengthMismatch {
                rows: rows.len(),
                targets: targets.len(),
            });
        }

        let split = stratified_split(
            targets,
            self.evaluation.test_fraction,
            self.evaluation.seed,
        )?;

        let pick_rows = |idx: &[usize]| idx.iter().map(|&i| rows[i].clone()).collect::<Vec<_>>();
        let pick_targets = |idx: &[usize]| idx.iter().map(|&i| targets[i]).collect::<Vec<_>>();

        let train_rows = pick_rows(&split.train);
        let train_targets = pick_targets(&split.train);
        let test_rows = pick_rows(&split.test);
        let test_targets = pick_targets(&split.test);

        let model = self.fit(&train_rows, &train_targets, progress)?;
        let predictions = model.predict(&test_rows);
        let report = classification_report(&test_targets, &predictions);

        log::info!(
            "Evaluated on {} held-out rows: accuracy {:.4}",
            test_rows.len(),
            report.accuracy
        );

        Ok(Evaluation {
            model,
            report,
            train_size: split.train.len(),
            test_size: split.test.len(),
        })
    }
}
