//! CART decision tree over one-hot encoded rows.
//!
//! Every split tests a single binary encoded feature: samples where the
//! feature is 0 go to the `absent` child, samples where it is 1 go to the
//! `present` child. Impurity is Gini. Trees are stored as a flat node arena
//! (root at index 0) and grown until nodes are pure, too small to split,
//! or have no non-constant candidate feature.

use rand::Rng;
use rand::seq::SliceRandom as _;

use crate::encoder::EncodedRow;

/// A node in the tree arena.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode {
    /// Terminal node.
    Leaf {
        /// Fraction of (bootstrap-weighted) samples in this node that are
        /// severe.
        severe_fraction: f64,
        /// Number of (bootstrap-weighted) samples that reached this node.
        samples: usize,
    },
    /// Internal node splitting on one encoded feature.
    Split {
        /// Encoded feature tested by this node.
        feature: usize,
        /// Child for rows where the feature is 0.
        absent: usize,
        /// Child for rows where the feature is 1.
        present: usize,
    },
}

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeParams {
    /// Non-constant candidate features examined per split.
    pub max_features: usize,
    /// Minimum samples a node needs to be split.
    pub min_samples_split: usize,
    /// Maximum depth, unlimited when `None`.
    pub max_depth: Option<usize>,
}

/// A fitted classification tree.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
    n_features: usize,
    /// Normalized mean decrease in impurity per encoded feature.
    importances: Vec<f64>,
}

/// Weighted Gini impurity `n * gini` of a node with `severe` positives out
/// of `n` samples.
#[allow(clippy::cast_precision_loss)]
fn weighted_gini(n: usize, severe: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    let p = severe as f64;
    let q = n - p;
    n - (p * p + q * q) / n
}

struct Candidate {
    feature: usize,
    decrease: f64,
}

struct Builder<'a, R> {
    rows: &'a [EncodedRow],
    targets: &'a [u8],
    params: TreeParams,
    rng: &'a mut R,
    nodes: Vec<TreeNode>,
    decrease: Vec<f64>,
    /// Reused per-node counters: samples with the feature present, and
    /// severe samples among them.
    present: Vec<usize>,
    present_severe: Vec<usize>,
    order: Vec<usize>,
}

impl<R: Rng> Builder<'_, R> {
    fn severe_count(&self, samples: &[usize]) -> usize {
        samples.iter().filter(|&&i| self.targets[i] != 0).count()
    }

    #[allow(clippy::cast_precision_loss)]
    fn leaf(samples: usize, severe: usize) -> TreeNode {
        TreeNode::Leaf {
            severe_fraction: if samples == 0 {
                0.0
            } else {
                severe as f64 / samples as f64
            },
            samples,
        }
    }

    fn best_split(&mut self, samples: &[usize], severe: usize) -> Option<Candidate> {
        self.present.fill(0);
        self.present_severe.fill(0);
        for &i in samples {
            let positive = self.targets[i] != 0;
            for &f in self.rows[i].active() {
                self.present[f] += 1;
                if positive {
                    self.present_severe[f] += 1;
                }
            }
        }

        let n = samples.len();
        let parent = weighted_gini(n, severe);
        self.order.shuffle(&mut *self.rng);

        let mut visited = 0;
        let mut best: Option<Candidate> = None;

        for &f in &self.order {
            if visited >= self.params.max_features {
                break;
            }
            let n_present = self.present[f];
            if n_present == 0 || n_present == n {
                continue;
            }
            visited += 1;

            let s_present = self.present_severe[f];
            let children = weighted_gini(n_present, s_present)
                + weighted_gini(n - n_present, severe - s_present);
            let decrease = parent - children;

            if best.as_ref().is_none_or(|b| decrease > b.decrease) {
                best = Some(Candidate {
                    feature: f,
                    decrease,
                });
            }
        }

        best
    }

    fn build(&mut self, samples: Vec<usize>, depth: usize) -> usize {
        let n = samples.len();
        let severe = self.severe_count(&samples);
        let idx = self.nodes.len();
        self.nodes.push(Self::leaf(n, severe));

        let pure = severe == 0 || severe == n;
        let too_deep = self.params.max_depth.is_some_and(|d| depth >= d);
        if pure || too_deep || n < self.params.min_samples_split {
            return idx;
        }

        let Some(split) = self.best_split(&samples, severe) else {
            return idx;
        };

        self.decrease[split.feature] += split.decrease;

        let (present, absent): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&i| self.rows[i].is_active(split.feature));

        let absent = self.build(absent, depth + 1);
        let present = self.build(present, depth + 1);
        self.nodes[idx] = TreeNode::Split {
            feature: split.feature,
            absent,
            present,
        };

        idx
    }
}

impl DecisionTree {
    /// Grows a tree on the rows selected by `samples` (indices into `rows`
    /// and `targets`, duplicates allowed for bootstrap sampling).
    #[must_use]
    pub fn fit<R: Rng>(
        rows: &[EncodedRow],
        targets: &[u8],
        samples: Vec<usize>,
        n_features: usize,
        params: TreeParams,
        rng: &mut R,
    ) -> Self {
        let mut builder = Builder {
            rows,
            targets,
            params,
            rng,
            nodes: Vec::new(),
            decrease: vec![0.0; n_features],
            present: vec![0; n_features],
            present_severe: vec![0; n_features],
            order: (0..n_features).collect(),
        };

        builder.build(samples, 0);

        let mut importances = builder.decrease;
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for v in &mut importances {
                *v /= total;
            }
        }

        Self {
            nodes: builder.nodes,
            n_features,
            importances,
        }
    }

    /// Probability that `row` is severe: the severe fraction of the leaf it
    /// lands in.
    #[must_use]
    pub fn predict_proba(&self, row: &EncodedRow) -> f64 {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf {
                    severe_fraction, ..
                } => return *severe_fraction,
                TreeNode::Split {
                    feature,
                    absent,
                    present,
                } => {
                    idx = if row.is_active(*feature) {
                        *present
                    } else {
                        *absent
                    };
                }
            }
        }
    }

    /// Normalized impurity decrease per encoded feature. All zeros when the
    /// tree never split.
    #[must_use]
    pub fn feature_importances(&self) -> &[f64] {
        &self.importances
    }

    /// Number of nodes in the tree.
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, TreeNode::Leaf { .. }))
            .count()
    }

    /// Expected number of encoded features.
    #[must_use]
    pub const fn n_features(&self) -> usize {
        self.n_features
    }

    /// Tree depth (longest root-to-leaf path).
    #[must_use]
    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        self.node_depth(0)
    }

    fn node_depth(&self, idx: usize) -> usize {
        match &self.nodes[idx] {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split {
                absent, present, ..
            } => 1 + self.node_depth(*absent).max(self.node_depth(*present)),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand::rngs::StdRng;

    use super::*;

    /// Encodes rows where the listed columns hold "a" and the rest "b".
    fn rows(active: &[&[usize]]) -> (Vec<EncodedRow>, usize) {
        use crate::encoder::OneHotEncoder;
        use crate::features::FeatureRow;

        let feature_rows: Vec<FeatureRow> = active
            .iter()
            .map(|set| {
                let mut values: [String; 6] = Default::default();
                for (col, value) in values.iter_mut().enumerate() {
                    *value = if set.contains(&col) { "a" } else { "b" }.to_string();
                }
                FeatureRow::new(values)
            })
            .collect();
        let encoder = OneHotEncoder::fit(&feature_rows);
        (encoder.transform(&feature_rows), encoder.n_features())
    }

    fn params(max_features: usize) -> TreeParams {
        TreeParams {
            max_features,
            min_samples_split: 2,
            max_depth: None,
        }
    }

    #[test]
    fn weighted_gini_of_pure_and_balanced_nodes() {
        assert!(weighted_gini(10, 0).abs() < 1e-12);
        assert!(weighted_gini(10, 10).abs() < 1e-12);
        assert!((weighted_gini(10, 5) - 5.0).abs() < 1e-12);
        assert!(weighted_gini(0, 0).abs() < 1e-12);
    }

    #[test]
    fn learns_single_feature_rule() {
        // Column 0 set to "a" <=> severe.
        let (encoded, n_features) = rows(&[&[0], &[0, 1], &[1], &[], &[0, 2], &[2]]);
        let targets = [1, 1, 0, 0, 1, 0];
        let mut rng = StdRng::seed_from_u64(7);

        let tree = DecisionTree::fit(
            &encoded,
            &targets,
            (0..encoded.len()).collect(),
            n_features,
            params(n_features),
            &mut rng,
        );

        for (row, &target) in encoded.iter().zip(&targets) {
            let p = tree.predict_proba(row);
            assert!((p - f64::from(target)).abs() < 1e-12);
        }
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.n_leaves(), 2);

        let importances = tree.feature_importances();
        assert!((importances.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn pure_node_is_a_single_leaf() {
        let (encoded, n_features) = rows(&[&[0], &[1], &[2]]);
        let targets = [0, 0, 0];
        let mut rng = StdRng::seed_from_u64(1);

        let tree = DecisionTree::fit(
            &encoded,
            &targets,
            vec![0, 1, 2],
            n_features,
            params(3),
            &mut rng,
        );

        assert_eq!(tree.n_nodes(), 1);
        assert!(tree.predict_proba(&encoded[0]).abs() < f64::EPSILON);
        assert!(tree.feature_importances().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn identical_rows_with_mixed_targets_stay_a_leaf() {
        let (encoded, n_features) = rows(&[&[0], &[0], &[0], &[0]]);
        let targets = [1, 0, 0, 1];
        let mut rng = StdRng::seed_from_u64(3);

        let tree = DecisionTree::fit(
            &encoded,
            &targets,
            vec![0, 1, 2, 3],
            n_features,
            params(n_features),
            &mut rng,
        );

        assert_eq!(tree.n_nodes(), 1);
        assert!((tree.predict_proba(&encoded[0]) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn bootstrap_duplicates_weight_the_leaf() {
        let (encoded, n_features) = rows(&[&[0], &[0]]);
        let targets = [1, 0];
        let mut rng = StdRng::seed_from_u64(3);

        let tree = DecisionTree::fit(
            &encoded,
            &targets,
            vec![0, 0, 0, 1],
            n_features,
            params(n_features),
            &mut rng,
        );

        assert!((tree.predict_proba(&encoded[0]) - 0.75).abs() < 1e-12);
    }
}
