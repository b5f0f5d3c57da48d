//! Ranking of encoded features by mean decrease in impurity.

use serde::Serialize;

use crate::classifier::TrainedModel;

/// Number of features shown in the summary table.
pub const DEFAULT_TOP_K: usize = 15;

/// One ranked encoded feature. Serializes with the output CSV headers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportanceEntry {
    /// Encoded feature name, `{column}_{category}`.
    #[serde(rename = "variavel")]
    pub feature: String,
    #[serde(rename = "importancia")]
    pub importance: f64,
}

/// Encoded features sorted by importance, descending, ties by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportanceRanking {
    entries: Vec<ImportanceEntry>,
}

impl ImportanceRanking {
    /// Ranks every encoded feature of a trained model.
    #[must_use]
    pub fn from_model(model: &TrainedModel) -> Self {
        Self::from_pairs(
            model
                .encoded_importances()
                .into_iter()
                .map(|(feature, weight)| (feature.to_string(), weight)),
        )
    }

    /// Ranks arbitrary `(name, weight)` pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, f64)>) -> Self {
        let mut entries: Vec<ImportanceEntry> = pairs
            .into_iter()
            .map(|(feature, importance)| ImportanceEntry {
                feature,
                importance,
            })
            .collect();
        entries.sort_by(|a, b| {
            b.importance
                .total_cmp(&a.importance)
                .then_with(|| a.feature.cmp(&b.feature))
        });
        Self { entries }
    }

    /// The `k` most important features (all of them if fewer).
    #[must_use]
    pub fn top(&self, k: usize) -> &[ImportanceEntry] {
        &self.entries[..k.min(self.entries.len())]
    }

    /// All features, ranked.
    #[must_use]
    pub fn entries(&self) -> &[ImportanceEntry] {
        &self.entries
    }

    /// Sum of all weights.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|e| e.importance).sum()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
