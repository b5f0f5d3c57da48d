//! Model input preparation.

use road_severity_accident_models::{AccidentRecord, Column, EnrichedRecord};

/// The categorical columns fed to the model, in encoding order.
pub const FEATURE_COLUMNS: [Column; 6] = [
    Column::DiaSemana,
    Column::FaseDia,
    Column::CondicaoMetereologica,
    Column::TipoPista,
    Column::TracadoVia,
    Column::TipoAcidente,
];

/// Number of raw feature columns.
pub const N_FEATURE_COLUMNS: usize = FEATURE_COLUMNS.len();

/// Category substituted for missing feature values.
pub const UNKNOWN_CATEGORY: &str = "Desconhecido";

/// The six categorical values of one record, missing values already
/// replaced by [`UNKNOWN_CATEGORY`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeatureRow {
    values: [String; N_FEATURE_COLUMNS],
}

impl FeatureRow {
    /// Builds a row from explicit values in [`FEATURE_COLUMNS`] order.
    #[must_use]
    pub const fn new(values: [String; N_FEATURE_COLUMNS]) -> Self {
        Self { values }
    }

    /// Extracts the feature values of a record.
    #[must_use]
    pub fn from_record(record: &AccidentRecord) -> Self {
        Self {
            values: FEATURE_COLUMNS.map(|column| {
                record
                    .category(column)
                    .unwrap_or(UNKNOWN_CATEGORY)
                    .to_string()
            }),
        }
    }

    /// Value of the feature at `position` in [`FEATURE_COLUMNS`].
    #[must_use]
    pub fn value(&self, position: usize) -> &str {
        &self.values[position]
    }

    /// All values in [`FEATURE_COLUMNS`] order.
    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }
}

/// Selects the model features and the binary target of every record.
///
/// Never drops a row: missing feature values become [`UNKNOWN_CATEGORY`].
#[must_use]
pub fn prepare_features(records: &[EnrichedRecord]) -> (Vec<FeatureRow>, Vec<u8>) {
    records
        .iter()
        .map(|r| (FeatureRow::from_record(&r.record), r.target()))
        .unzip()
}
