//! Schema normalization.
//!
//! Restricts the raw table to the [`Column`] allow-list, parses each field
//! into its canonical type, and drops every row that lacks a parseable
//! latitude, longitude, classification or date. That mandatory-field gate is
//! the only place rows are discarded.

use std::collections::BTreeMap;

use road_severity_accident_models::{AccidentRecord, Column, NormalizedTable, RawTable};
use strum::IntoEnumIterator as _;

use crate::SourceError;
use crate::parsing::{non_empty, parse_count, parse_date, parse_decimal};

/// A single raw row addressed by [`Column`].
struct RowView<'a> {
    row: &'a [String],
    index: &'a BTreeMap<Column, usize>,
}

impl RowView<'_> {
    fn raw(&self, column: Column) -> Option<&str> {
        let pos = *self.index.get(&column)?;
        self.row.get(pos).and_then(|s| non_empty(s))
    }

    fn text(&self, column: Column) -> Option<String> {
        self.raw(column).map(ToOwned::to_owned)
    }

    fn decimal(&self, column: Column) -> Option<f64> {
        self.raw(column).and_then(parse_decimal)
    }

    fn count(&self, column: Column) -> Option<u32> {
        self.raw(column).and_then(parse_count)
    }

    /// Builds the record, or `None` if a mandatory field is missing.
    fn to_record(&self) -> Option<AccidentRecord> {
        Some(AccidentRecord {
            id: self.text(Column::Id),
            date: self.raw(Column::DataInversa).and_then(parse_date)?,
            weekday: self.text(Column::DiaSemana),
            time_of_day: self.text(Column::Horario),
            state: self.text(Column::Uf),
            highway: self.text(Column::Br),
            km: self.decimal(Column::Km),
            municipality: self.text(Column::Municipio),
            cause: self.text(Column::CausaAcidente),
            accident_type: self.text(Column::TipoAcidente),
            classification: self.text(Column::ClassificacaoAcidente)?,
            day_phase: self.text(Column::FaseDia),
            direction: self.text(Column::SentidoVia),
            weather: self.text(Column::CondicaoMetereologica),
            road_type: self.text(Column::TipoPista),
            road_layout: self.text(Column::TracadoVia),
            latitude: self.decimal(Column::Latitude)?,
            longitude: self.decimal(Column::Longitude)?,
            people: self.count(Column::Pessoas),
            deaths: self.count(Column::Mortos),
            light_injuries: self.count(Column::FeridosLeves),
            severe_injuries: self.count(Column::FeridosGraves),
            uninjured: self.count(Column::Ilesos),
            unknown_injury: self.count(Column::Ignorados),
            vehicles: self.count(Column::Veiculos),
        })
    }
}

/// Maps each allow-list column present in `table` to its position.
fn index_columns(table: &RawTable) -> BTreeMap<Column, usize> {
    Column::iter()
        .filter_map(|column| {
            let pos = table.column_index(column.as_ref());
            if pos.is_none() {
                log::debug!("Column '{column}' not present in input, omitting");
            }
            pos.map(|p| (column, p))
        })
        .collect()
}

/// Normalizes a raw table.
///
/// Columns outside the allow-list are ignored and allow-list columns absent
/// from the input are omitted from the output.
///
/// # Errors
///
/// Returns [`SourceError::MissingColumn`] if a mandatory column is absent,
/// since no row could pass the validity gate.
pub fn normalize(table: &RawTable) -> Result<NormalizedTable, SourceError> {
    let index = index_columns(table);

    if let Some(&column) = Column::MANDATORY.iter().find(|c| !index.contains_key(c)) {
        return Err(SourceError::MissingColumn { column });
    }

    let records: Vec<AccidentRecord> = table
        .rows
        .iter()
        .filter_map(|row| RowView { row, index: &index }.to_record())
        .collect();

    let dropped = table.rows.len() - records.len();
    log::info!(
        "Normalized {} of {} rows ({dropped} dropped for missing latitude, longitude, classification or date)",
        records.len(),
        table.rows.len(),
    );

    Ok(NormalizedTable {
        columns: index.into_keys().collect(),
        records,
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            headers: headers.iter().map(ToString::to_string).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(ToString::to_string).collect())
                .collect(),
        }
    }

    const HEADERS: &[&str] = &[
        "id",
        "data_inversa",
        "horario",
        "classificacao_acidente",
        "latitude",
        "longitude",
        "km",
        "mortos",
        "regional",
    ];

    #[test]
    fn parses_typed_fields() {
        let raw = table(
            HEADERS,
            &[&[
                "42",
                "2023-01-07",
                "18:20:00",
                "Com Vítimas Feridas",
                "-23,55",
                "-46,63",
                "12,5",
                "0",
                "SPRF-SP",
            ]],
        );

        let normalized = normalize(&raw).unwrap();
        assert_eq!(normalized.records.len(), 1);

        let record = &normalized.records[0];
        assert_eq!(record.id.as_deref(), Some("42"));
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2023, 1, 7).unwrap());
        assert!((record.latitude - -23.55).abs() < f64::EPSILON);
        assert!((record.longitude - -46.63).abs() < f64::EPSILON);
        assert_eq!(record.km, Some(12.5));
        assert_eq!(record.deaths, Some(0));
        assert_eq!(record.time_of_day.as_deref(), Some("18:20:00"));
    }

    #[test]
    fn restricts_to_present_allow_list_columns() {
        let raw = table(HEADERS, &[]);
        let normalized = normalize(&raw).unwrap();
        assert_eq!(
            normalized.columns,
            vec![
                Column::Id,
                Column::DataInversa,
                Column::Horario,
                Column::Km,
                Column::ClassificacaoAcidente,
                Column::Latitude,
                Column::Longitude,
                Column::Mortos,
            ]
        );
    }

    #[test]
    fn drops_rows_missing_mandatory_fields() {
        let raw = table(
            HEADERS,
            &[
                &["1", "2023-01-01", "", "Sem Vítimas", "-23,5", "-46,6", "", "", ""],
                &["2", "not a date", "", "Sem Vítimas", "-23,5", "-46,6", "", "", ""],
                &["3", "2023-01-01", "", "", "-23,5", "-46,6", "", "", ""],
                &["4", "2023-01-01", "", "Sem Vítimas", "abc", "-46,6", "", "", ""],
                &["5", "2023-01-01", "", "Sem Vítimas", "-23,5", "", "", "", ""],
                &["6", "2023-01-01"],
            ],
        );

        let normalized = normalize(&raw).unwrap();
        let ids: Vec<&str> = normalized
            .records
            .iter()
            .filter_map(|r| r.id.as_deref())
            .collect();
        assert_eq!(ids, vec!["1"]);

        for record in &normalized.records {
            assert!(!record.classification.is_empty());
            assert!(record.latitude.is_finite());
            assert!(record.longitude.is_finite());
        }
    }

    #[test]
    fn optional_parse_failures_keep_the_row() {
        let raw = table(
            HEADERS,
            &[&[
                "1",
                "2023-01-01",
                "meio-dia",
                "Sem Vítimas",
                "-23,5",
                "-46,6",
                "km?",
                "x",
                "",
            ]],
        );

        let normalized = normalize(&raw).unwrap();
        assert_eq!(normalized.records.len(), 1);
        assert_eq!(normalized.records[0].km, None);
        assert_eq!(normalized.records[0].deaths, None);
    }

    #[test]
    fn missing_mandatory_column_is_an_error() {
        let raw = table(&["id", "data_inversa", "latitude", "longitude"], &[]);
        let err = normalize(&raw).unwrap_err();
        assert!(matches!(
            err,
            SourceError::MissingColumn {
                column: Column::ClassificacaoAcidente
            }
        ));
    }
}
