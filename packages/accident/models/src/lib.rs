#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Accident record schema and severity definitions.
//!
//! This crate defines the canonical column allow-list of the federal highway
//! accident export, the typed [`AccidentRecord`] every source row is
//! normalized into, and the derived/scored record types that flow through
//! the rest of the pipeline.

pub mod progress;

use chrono::NaiveDate;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// A column of the relevant-column allow-list.
///
/// Variants are declared in output order and render to the exact header text
/// used by the source export (e.g. [`Column::DataInversa`] is
/// `"data_inversa"`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum Column {
    /// Accident identifier.
    Id,
    /// Event date (year-first in recent exports).
    DataInversa,
    /// Day of the week.
    DiaSemana,
    /// Time of day (`HH:MM:SS`).
    Horario,
    /// Two-letter state code.
    Uf,
    /// Federal highway number.
    Br,
    /// Mile marker, decimal-comma formatted.
    Km,
    /// Municipality name.
    Municipio,
    /// Probable cause.
    CausaAcidente,
    /// Accident type (collision, run-off-road, ...).
    TipoAcidente,
    /// Outcome classification (victims / no victims).
    ClassificacaoAcidente,
    /// Phase of day (daylight, night, dusk, dawn).
    FaseDia,
    /// Direction of travel.
    SentidoVia,
    /// Weather condition. The misspelling is the source header.
    CondicaoMetereologica,
    /// Road surface type (single, double, multiple lanes).
    TipoPista,
    /// Road layout (straight, curve, intersection, ...).
    TracadoVia,
    /// Latitude (WGS84), decimal-comma formatted.
    Latitude,
    /// Longitude (WGS84), decimal-comma formatted.
    Longitude,
    /// People involved.
    Pessoas,
    /// Fatalities.
    Mortos,
    /// Light injuries.
    FeridosLeves,
    /// Severe injuries.
    FeridosGraves,
    /// Uninjured people.
    Ilesos,
    /// People with unknown injury state.
    Ignorados,
    /// Vehicles involved.
    Veiculos,
}

/// How the raw text of a [`Column`] is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Kept as text.
    Text,
    /// Calendar date.
    Date,
    /// Decimal number that may use a comma separator.
    Decimal,
    /// Non-negative integer count.
    Count,
}

impl Column {
    /// Columns that must be present and parseable for a row to survive
    /// normalization.
    pub const MANDATORY: &[Self] = &[
        Self::Latitude,
        Self::Longitude,
        Self::ClassificacaoAcidente,
        Self::DataInversa,
    ];

    /// Returns how this column's raw text is parsed.
    #[must_use]
    pub const fn kind(self) -> ColumnKind {
        match self {
            Self::DataInversa => ColumnKind::Date,
            Self::Km | Self::Latitude | Self::Longitude => ColumnKind::Decimal,
            Self::Pessoas
            | Self::Mortos
            | Self::FeridosLeves
            | Self::FeridosGraves
            | Self::Ilesos
            | Self::Ignorados
            | Self::Veiculos => ColumnKind::Count,
            _ => ColumnKind::Text,
        }
    }

    /// Whether rows missing this column's value are discarded.
    #[must_use]
    pub fn is_mandatory(self) -> bool {
        Self::MANDATORY.contains(&self)
    }
}

/// Columns derived by the pipeline, appended after the source columns in
/// this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum DerivedColumn {
    /// Year of the event date.
    Ano,
    /// Month of the event date.
    Mes,
    /// Hour parsed from the time of day.
    Hora,
    /// Binary severity target (0/1).
    AlvoGrave,
    /// Severity target as text.
    NivelGravidade,
    /// Predicted severity id (0/1).
    PrevisaoGravidadeId,
    /// Predicted probability of a severe outcome.
    ProbabilidadeSerGrave,
    /// Predicted severity as text.
    PrevisaoGravidadeLabel,
}

/// Binary accident severity.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum SeverityLevel {
    /// Light injuries or no victims.
    #[strum(serialize = "Leve ou Sem Vítimas")]
    NotSevere = 0,
    /// Fatal or severe-injury victims.
    #[strum(serialize = "Grave ou Fatal")]
    Severe = 1,
}

impl SeverityLevel {
    /// Both levels, ordered by id.
    pub const ALL: &[Self] = &[Self::NotSevere, Self::Severe];

    /// Returns the binary id of this level.
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Maps a binary id back to a level. Any non-zero id is severe.
    #[must_use]
    pub const fn from_id(id: u8) -> Self {
        if id == 0 { Self::NotSevere } else { Self::Severe }
    }

    /// Short class name used in classification reports.
    #[must_use]
    pub const fn report_name(self) -> &'static str {
        match self {
            Self::NotSevere => "Não Grave",
            Self::Severe => "Grave",
        }
    }
}

/// A delimited table read verbatim from the source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    /// Header names from the first row, trimmed.
    pub headers: Vec<String>,
    /// Data rows. Rows may be shorter than the header.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Returns the position of the named header, if present.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// One accident event normalized to canonical types.
///
/// Mandatory fields are non-optional: a source row that lacks any of them
/// never becomes an `AccidentRecord`.
#[derive(Debug, Clone, PartialEq)]
pub struct AccidentRecord {
    /// Accident identifier (`id`).
    pub id: Option<String>,
    /// Event date (`data_inversa`).
    pub date: NaiveDate,
    /// Day of the week (`dia_semana`).
    pub weekday: Option<String>,
    /// Raw time-of-day text, kept as-is.
    pub time_of_day: Option<String>,
    /// Two-letter state code (`uf`).
    pub state: Option<String>,
    /// Federal highway number (`br`).
    pub highway: Option<String>,
    /// Mile marker (`km`).
    pub km: Option<f64>,
    /// Municipality name (`municipio`).
    pub municipality: Option<String>,
    /// Probable cause (`causa_acidente`).
    pub cause: Option<String>,
    /// Accident type (`tipo_acidente`).
    pub accident_type: Option<String>,
    /// Outcome classification (`classificacao_acidente`).
    pub classification: String,
    /// Phase of day (`fase_dia`).
    pub day_phase: Option<String>,
    /// Direction of travel (`sentido_via`).
    pub direction: Option<String>,
    /// Weather condition (`condicao_metereologica`).
    pub weather: Option<String>,
    /// Road surface type (`tipo_pista`).
    pub road_type: Option<String>,
    /// Road layout (`tracado_via`).
    pub road_layout: Option<String>,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// People involved (`pessoas`).
    pub people: Option<u32>,
    /// Fatalities (`mortos`).
    pub deaths: Option<u32>,
    /// Light injuries (`feridos_leves`).
    pub light_injuries: Option<u32>,
    /// Severe injuries (`feridos_graves`).
    pub severe_injuries: Option<u32>,
    /// Uninjured people (`ilesos`).
    pub uninjured: Option<u32>,
    /// People with unknown injury state (`ignorados`).
    pub unknown_injury: Option<u32>,
    /// Vehicles involved (`veiculos`).
    pub vehicles: Option<u32>,
}

/// A typed view of one cell of an [`AccidentRecord`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    /// Free or categorical text.
    Text(&'a str),
    /// Calendar date.
    Date(NaiveDate),
    /// Decimal number.
    Decimal(f64),
    /// Non-negative count.
    Count(u32),
    /// Absent or unparseable in the source.
    Missing,
}

impl<'a> FieldValue<'a> {
    fn text(value: Option<&'a String>) -> Self {
        value.map_or(Self::Missing, |s| Self::Text(s.as_str()))
    }

    fn decimal(value: Option<f64>) -> Self {
        value.map_or(Self::Missing, Self::Decimal)
    }

    fn count(value: Option<u32>) -> Self {
        value.map_or(Self::Missing, Self::Count)
    }
}

impl AccidentRecord {
    /// Returns the value stored for `column`.
    #[must_use]
    pub fn value(&self, column: Column) -> FieldValue<'_> {
        match column {
            Column::Id => FieldValue::text(self.id.as_ref()),
            Column::DataInversa => FieldValue::Date(self.date),
            Column::DiaSemana => FieldValue::text(self.weekday.as_ref()),
            Column::Horario => FieldValue::text(self.time_of_day.as_ref()),
            Column::Uf => FieldValue::text(self.state.as_ref()),
            Column::Br => FieldValue::text(self.highway.as_ref()),
            Column::Km => FieldValue::decimal(self.km),
            Column::Municipio => FieldValue::text(self.municipality.as_ref()),
            Column::CausaAcidente => FieldValue::text(self.cause.as_ref()),
            Column::TipoAcidente => FieldValue::text(self.accident_type.as_ref()),
            Column::ClassificacaoAcidente => FieldValue::Text(&self.classification),
            Column::FaseDia => FieldValue::text(self.day_phase.as_ref()),
            Column::SentidoVia => FieldValue::text(self.direction.as_ref()),
            Column::CondicaoMetereologica => FieldValue::text(self.weather.as_ref()),
            Column::TipoPista => FieldValue::text(self.road_type.as_ref()),
            Column::TracadoVia => FieldValue::text(self.road_layout.as_ref()),
            Column::Latitude => FieldValue::Decimal(self.latitude),
            Column::Longitude => FieldValue::Decimal(self.longitude),
            Column::Pessoas => FieldValue::count(self.people),
            Column::Mortos => FieldValue::count(self.deaths),
            Column::FeridosLeves => FieldValue::count(self.light_injuries),
            Column::FeridosGraves => FieldValue::count(self.severe_injuries),
            Column::Ilesos => FieldValue::count(self.uninjured),
            Column::Ignorados => FieldValue::count(self.unknown_injury),
            Column::Veiculos => FieldValue::count(self.vehicles),
        }
    }

    /// Returns the text of a categorical column, or `None` when the column
    /// is missing or not textual.
    #[must_use]
    pub fn category(&self, column: Column) -> Option<&str> {
        match self.value(column) {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Normalized records together with the allow-list columns that were
/// present in the source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedTable {
    /// Present allow-list columns, in allow-list order.
    pub columns: Vec<Column>,
    /// Rows that passed the mandatory-field gate.
    pub records: Vec<AccidentRecord>,
}

/// An [`AccidentRecord`] with calendar fields and the severity label.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    /// The normalized source record.
    pub record: AccidentRecord,
    /// Year of the event date (`ano`).
    pub year: i32,
    /// Month of the event date, 1 to 12 (`mes`).
    pub month: u32,
    /// `None` when the time of day is missing or unparseable.
    pub hour: Option<u32>,
    /// Severity derived from the classification (`nivel_gravidade`).
    pub severity: SeverityLevel,
}

impl EnrichedRecord {
    /// The binary target (`alvo_grave`).
    #[must_use]
    pub const fn target(&self) -> u8 {
        self.severity.id()
    }
}

/// Enriched records with the present source columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichedTable {
    /// Present allow-list columns, in allow-list order.
    pub columns: Vec<Column>,
    pub records: Vec<EnrichedRecord>,
}

/// An [`EnrichedRecord`] with the model's prediction attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub enriched: EnrichedRecord,
    /// Predicted severity (`previsao_gravidade_id` and `_label`).
    pub predicted: SeverityLevel,
    /// Probability assigned to [`SeverityLevel::Severe`].
    pub probability: f64,
}

/// The final enriched output table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoredTable {
    pub columns: Vec<Column>,
    pub records: Vec<ScoredRecord>,
}
