//! Bagged ensemble of [`DecisionTree`]s.
//!
//! Each tree is grown on a bootstrap sample drawn with replacement and
//! considers a random subset of features at every split. The whole ensemble
//! is reproducible from a single seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng as _};
use road_severity_accident_models::progress::ProgressCallback;

use crate::ModelError;
use crate::encoder::EncodedRow;
use crate::tree::{DecisionTree, TreeParams};

/// Number of candidate features examined at each split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaxFeatures {
    /// `floor(sqrt(n_features))`, at least 1.
    #[default]
    Sqrt,
    /// Every feature.
    All,
    /// A fixed count, clamped to `1..=n_features`.
    Fixed(usize),
}

impl MaxFeatures {
    /// Resolves the count for `n_features` encoded features.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn resolve(self, n_features: usize) -> usize {
        let n = match self {
            Self::Sqrt => (n_features as f64).sqrt().floor() as usize,
            Self::All => n_features,
            Self::Fixed(k) => k.min(n_features),
        };
        n.max(1)
    }
}

/// Random forest hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForestParams {
    /// Number of trees in the ensemble.
    pub n_trees: usize,
    /// Seed for bootstrap sampling and feature subsets.
    pub seed: u64,
    /// Candidate features per split.
    pub max_features: MaxFeatures,
    /// Maximum tree depth. Unlimited when `None`.
    pub max_depth: Option<usize>,
    /// Minimum samples a node needs to be split.
    pub min_samples_split: usize,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            seed: 42,
            max_features: MaxFeatures::Sqrt,
            max_depth: None,
            min_samples_split: 2,
        }
    }
}

impl ForestParams {
    /// Checks that the parameters describe a trainable forest.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidParameter`] for a zero tree count or a
    /// `min_samples_split` below 2.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.n_trees == 0 {
            return Err(ModelError::InvalidParameter(
                "n_trees must be at least 1".to_string(),
            ));
        }
        if self.min_samples_split < 2 {
            return Err(ModelError::InvalidParameter(format!(
                "min_samples_split must be at least 2, got {}",
                self.min_samples_split
            )));
        }
        Ok(())
    }
}

/// A fitted random forest.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
    importances: Vec<f64>,
}

impl RandomForest {
    /// Fits `params.n_trees` trees on `rows` / `targets`.
    ///
    /// # Errors
    ///
    /// * [`ModelError::EmptyTrainingSet`] if there are no rows
    /// * [`ModelError::LengthMismatch`] if rows and targets differ in length
    /// * [`ModelError::InvalidParameter`] if `params` fails validation
    pub fn fit(
        rows: &[EncodedRow],
        targets: &[u8],
        n_features: usize,
        params: &ForestParams,
        progress: &dyn ProgressCallback,
    ) -> Result<Self, ModelError> {
        params.validate()?;
        if rows.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        if rows.len() != targets.len() {
            return Err(ModelError::LengthMismatch {
                rows: rows.len(),
                targets: targets.len(),
            });
        }

        let tree_params = TreeParams {
            max_features: params.max_features.resolve(n_features),
            min_samples_split: params.min_samples_split,
            max_depth: params.max_depth,
        };
        log::debug!(
            "Fitting {} trees on {} rows x {n_features} features (max_features={}, seed={})",
            params.n_trees,
            rows.len(),
            tree_params.max_features,
            params.seed,
        );

        let n = rows.len();
        let mut master = StdRng::seed_from_u64(params.seed);
        progress.set_message("Training trees".to_string());
        progress.set_total(params.n_trees as u64);

        let mut trees = Vec::with_capacity(params.n_trees);
        for _ in 0..params.n_trees {
            let mut rng = StdRng::seed_from_u64(master.r#gen::<u64>());
            let samples: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            trees.push(DecisionTree::fit(
                rows,
                targets,
                samples,
                n_features,
                tree_params,
                &mut rng,
            ));
            progress.inc(1);
        }

        let importances = aggregate_importances(&trees, n_features);
        let forest = Self {
            trees,
            n_features,
            importances,
        };

        progress.finish(format!(
            "Trained {} trees (avg depth {:.1}, {} nodes)",
            forest.n_trees(),
            forest.avg_depth(),
            forest.total_nodes()
        ));

        Ok(forest)
    }

    /// Mean severe probability over all trees.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn predict_proba(&self, row: &EncodedRow) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict_proba(row)).sum();
        sum / self.trees.len() as f64
    }

    /// Normalized feature importances, one per encoded feature, summing to 1.
    #[must_use]
    pub fn feature_importances(&self) -> &[f64] {
        &self.importances
    }

    #[must_use]
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    #[must_use]
    pub const fn n_features(&self) -> usize {
        self.n_features
    }

    /// Average depth over all trees.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn avg_depth(&self) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let total: usize = self.trees.iter().map(DecisionTree::depth).sum();
        total as f64 / self.trees.len() as f64
    }

    /// Total node count over all trees.
    #[must_use]
    pub fn total_nodes(&self) -> usize {
        self.trees.iter().map(DecisionTree::n_nodes).sum()
    }
}

/// Averages per-tree importances over the trees that split at least once,
/// then renormalizes. Falls back to uniform weights when no tree split.
#[allow(clippy::cast_precision_loss)]
fn aggregate_importances(trees: &[DecisionTree], n_features: usize) -> Vec<f64> {
    let mut sum = vec![0.0; n_features];
    for tree in trees.iter().filter(|t| t.n_nodes() > 1) {
        for (acc, v) in sum.iter_mut().zip(tree.feature_importances()) {
            *acc += v;
        }
    }

    let total: f64 = sum.iter().sum();
    if total > 0.0 {
        for v in &mut sum {
            *v /= total;
        }
    } else if n_features > 0 {
        log::warn!("No tree split on any feature, using uniform importances");
        sum.fill(1.0 / n_features as f64);
    }
    sum
}
