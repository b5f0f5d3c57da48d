//! Flat tabular view of the scored table shared by the writers.

use road_severity_accident_models::{
    Column, DerivedColumn, FieldValue, ScoredRecord, ScoredTable,
};
use strum::IntoEnumIterator as _;

/// One output cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    /// Text rendering used by the CSV writer. Empty cells render as `""`.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::Empty => String::new(),
        }
    }
}

impl From<FieldValue<'_>> for Cell {
    fn from(value: FieldValue<'_>) -> Self {
        match value {
            FieldValue::Text(s) => Self::Text(s.to_string()),
            FieldValue::Date(d) => Self::Text(d.to_string()),
            FieldValue::Decimal(v) => Self::Number(v),
            FieldValue::Count(v) => Self::Number(f64::from(v)),
            FieldValue::Missing => Self::Empty,
        }
    }
}

/// A header row plus data rows of equal width.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

fn derived_cell(record: &ScoredRecord, column: DerivedColumn) -> Cell {
    let enriched = &record.enriched;
    match column {
        DerivedColumn::Ano => Cell::Number(f64::from(enriched.year)),
        DerivedColumn::Mes => Cell::Number(f64::from(enriched.month)),
        DerivedColumn::Hora => enriched
            .hour
            .map_or(Cell::Empty, |h| Cell::Number(f64::from(h))),
        DerivedColumn::AlvoGrave => Cell::Number(f64::from(enriched.target())),
        DerivedColumn::NivelGravidade => Cell::Text(enriched.severity.to_string()),
        DerivedColumn::PrevisaoGravidadeId => Cell::Number(f64::from(record.predicted.id())),
        DerivedColumn::ProbabilidadeSerGrave => Cell::Number(record.probability),
        DerivedColumn::PrevisaoGravidadeLabel => Cell::Text(record.predicted.to_string()),
    }
}

impl Sheet {
    /// Lays out the present source columns followed by every derived column.
    #[must_use]
    pub fn from_scored(table: &ScoredTable) -> Self {
        let headers = table
            .columns
            .iter()
            .map(ToString::to_string)
            .chain(DerivedColumn::iter().map(|c| c.to_string()))
            .collect();

        let rows = table
            .records
            .iter()
            .map(|record| {
                let source = table
                    .columns
                    .iter()
                    .map(|&column: &Column| Cell::from(record.enriched.record.value(column)));
                let derived = DerivedColumn::iter().map(|c| derived_cell(record, c));
                source.chain(derived).collect()
            })
            .collect();

        Self { headers, rows }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use road_severity_accident_models::{AccidentRecord, EnrichedRecord, SeverityLevel};

    use super::*;

    fn scored(hour: Option<u32>) -> ScoredRecord {
        ScoredRecord {
            enriched: EnrichedRecord {
                record: AccidentRecord {
                    id: Some("7".to_string()),
                    date: NaiveDate::from_ymd_opt(2023, 3, 9).unwrap(),
                    weekday: None,
                    time_of_day: None,
                    state: Some("MG".to_string()),
                    highway: None,
                    km: Some(101.5),
                    municipality: None,
                    cause: None,
                    accident_type: None,
                    classification: "Com Vítimas Fatais".to_string(),
                    day_phase: None,
                    direction: None,
                    weather: None,
                    road_type: None,
                    road_layout: None,
                    latitude: -19.9,
                    longitude: -43.9,
                    people: Some(2),
                    deaths: Some(1),
                    light_injuries: None,
                    severe_injuries: None,
                    uninjured: None,
                    unknown_injury: None,
                    vehicles: None,
                },
                year: 2023,
                month: 3,
                hour,
                severity: SeverityLevel::Severe,
            },
            predicted: SeverityLevel::NotSevere,
            probability: 0.25,
        }
    }

    #[test]
    fn headers_put_derived_columns_last() {
        let table = ScoredTable {
            columns: vec![Column::Id, Column::DataInversa, Column::Mortos],
            records: Vec::new(),
        };
        let sheet = Sheet::from_scored(&table);
        assert_eq!(
            sheet.headers,
            vec![
                "id",
                "data_inversa",
                "mortos",
                "ano",
                "mes",
                "hora",
                "alvo_grave",
                "nivel_gravidade",
                "previsao_gravidade_id",
                "probabilidade_ser_grave",
                "previsao_gravidade_label",
            ]
        );
    }

    #[test]
    fn cells_are_typed() {
        let table = ScoredTable {
            columns: vec![Column::Id, Column::DataInversa, Column::Km, Column::Mortos, Column::Br],
            records: vec![scored(Some(14)), scored(None)],
        };
        let sheet = Sheet::from_scored(&table);

        let row = &sheet.rows[0];
        assert_eq!(row.len(), sheet.headers.len());
        assert_eq!(row[0], Cell::Text("7".to_string()));
        assert_eq!(row[1], Cell::Text("2023-03-09".to_string()));
        assert_eq!(row[2], Cell::Number(101.5));
        assert_eq!(row[3], Cell::Number(1.0));
        assert_eq!(row[4], Cell::Empty);
        assert_eq!(row[5], Cell::Number(2023.0));
        assert_eq!(row[7], Cell::Number(14.0));
        assert_eq!(row[8], Cell::Number(1.0));
        assert_eq!(row[9], Cell::Text("Grave ou Fatal".to_string()));
        assert_eq!(row[10], Cell::Number(0.0));
        assert_eq!(row[11], Cell::Number(0.25));
        assert_eq!(row[12], Cell::Text("Leve ou Sem Vítimas".to_string()));

        assert_eq!(sheet.rows[1][7], Cell::Empty);
    }
}
