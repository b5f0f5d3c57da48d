//! One-hot encoding of the categorical feature columns.
//!
//! Each (column, category) pair seen during fitting becomes one binary
//! encoded feature. Categories are sorted per column, so the encoded layout
//! is independent of row order. Rows are stored sparsely as the list of
//! active encoded positions (at most one per column).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use road_severity_accident_models::Column;

use crate::features::{FEATURE_COLUMNS, FeatureRow, N_FEATURE_COLUMNS};

/// One binary column produced by the encoder.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EncodedFeature {
    /// Source column.
    pub column: Column,
    /// Category value within that column.
    pub category: String,
}

impl fmt::Display for EncodedFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.column, self.category)
    }
}

/// A sparse one-hot row: the encoded positions whose value is 1.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct EncodedRow {
    active: Vec<usize>,
}

impl EncodedRow {
    /// Whether encoded position `feature` is 1 in this row.
    #[must_use]
    pub fn is_active(&self, feature: usize) -> bool {
        self.active.contains(&feature)
    }

    /// Encoded positions set to 1, ascending.
    #[must_use]
    pub fn active(&self) -> &[usize] {
        &self.active
    }

    /// Expands the row to a dense 0/1 vector of `n_features` values.
    #[must_use]
    pub fn to_dense(&self, n_features: usize) -> Vec<f64> {
        let mut dense = vec![0.0; n_features];
        for &i in &self.active {
            if let Some(v) = dense.get_mut(i) {
                *v = 1.0;
            }
        }
        dense
    }
}

/// Fitted one-hot encoder.
///
/// Categories absent at fit time encode to an all-zero block for their
/// column instead of failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneHotEncoder {
    features: Vec<EncodedFeature>,
    positions: Vec<BTreeMap<String, usize>>,
}

impl OneHotEncoder {
    /// Learns the category set of every feature column.
    #[must_use]
    pub fn fit(rows: &[FeatureRow]) -> Self {
        let mut seen: Vec<BTreeSet<&str>> = vec![BTreeSet::new(); N_FEATURE_COLUMNS];
        for row in rows {
            for (set, value) in seen.iter_mut().zip(row.values()) {
                set.insert(value.as_str());
            }
        }

        let mut features = Vec::new();
        let mut positions = Vec::with_capacity(N_FEATURE_COLUMNS);

        for (column, categories) in FEATURE_COLUMNS.iter().zip(seen) {
            let mut lookup = BTreeMap::new();
            for category in categories {
                lookup.insert(category.to_string(), features.len());
                features.push(EncodedFeature {
                    column: *column,
                    category: category.to_string(),
                });
            }
            log::debug!("Encoder: {column} has {} categories", lookup.len());
            positions.push(lookup);
        }

        Self {
            features,
            positions,
        }
    }

    /// Encodes one row.
    #[must_use]
    pub fn transform_row(&self, row: &FeatureRow) -> EncodedRow {
        let active = self
            .positions
            .iter()
            .zip(row.values())
            .filter_map(|(lookup, value)| lookup.get(value).copied())
            .collect();
        EncodedRow { active }
    }

    /// Encodes many rows.
    #[must_use]
    pub fn transform(&self, rows: &[FeatureRow]) -> Vec<EncodedRow> {
        rows.iter().map(|r| self.transform_row(r)).collect()
    }

    /// Total number of encoded features.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.features.len()
    }

    /// Encoded features in position order.
    #[must_use]
    pub fn features(&self) -> &[EncodedFeature] {
        &self.features
    }

    /// Encoded feature names (`{column}_{category}`) in position order.
    #[must_use]
    pub fn feature_names(&self) -> Vec<String> {
        self.features.iter().map(ToString::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: [&str; 6]) -> FeatureRow {
        FeatureRow::new(values.map(ToString::to_string))
    }

    fn fitted() -> OneHotEncoder {
        OneHotEncoder::fit(&[
            row(["sábado", "Pleno dia", "Céu Claro", "Simples", "Reta", "Capotamento"]),
            row(["domingo", "Noite", "Chuva", "Dupla", "Curva", "Capotamento"]),
            row(["domingo", "Pleno dia", "Chuva", "Simples", "Reta", "Colisão frontal"]),
        ])
    }

    #[test]
    fn sorts_categories_per_column() {
        let encoder = fitted();
        assert_eq!(encoder.n_features(), 12);
        assert_eq!(
            encoder.feature_names()[..4],
            [
                "dia_semana_domingo",
                "dia_semana_sábado",
                "fase_dia_Noite",
                "fase_dia_Pleno dia",
            ]
        );
    }

    #[test]
    fn encodes_one_position_per_column() {
        let encoder = fitted();
        let encoded =
            encoder.transform_row(&row(["domingo", "Noite", "Chuva", "Dupla", "Curva", "Capotamento"]));
        assert_eq!(encoded.active().len(), 6);

        let dense = encoded.to_dense(encoder.n_features());
        assert!((dense.iter().sum::<f64>() - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unseen_category_encodes_to_zero_block() {
        let encoder = fitted();
        let encoded = encoder.transform_row(&row([
            "quarta-feira",
            "Noite",
            "Neve",
            "Dupla",
            "Curva",
            "Capotamento",
        ]));

        assert_eq!(encoded.active().len(), 4);
        for (i, feature) in encoder.features().iter().enumerate() {
            if feature.column == Column::DiaSemana || feature.column == Column::CondicaoMetereologica
            {
                assert!(!encoded.is_active(i), "{feature} should be inactive");
            }
        }
    }

    #[test]
    fn seen_category_round_trips_to_its_name() {
        let encoder = fitted();
        let encoded = encoder.transform_row(&row([
            "sábado",
            "Pleno dia",
            "Céu Claro",
            "Simples",
            "Reta",
            "Colisão frontal",
        ]));

        let names = encoder.feature_names();
        let active_names: Vec<&str> = encoded.active().iter().map(|&i| names[i].as_str()).collect();
        assert!(active_names.iter().any(|n| n.contains("Céu Claro")));
        assert!(active_names.iter().any(|n| n.contains("Colisão frontal")));
        assert!(active_names.contains(&"tipo_acidente_Colisão frontal"));
    }
}
