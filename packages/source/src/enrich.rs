//! Feature engineering: calendar fields and the severity label.

use chrono::Datelike as _;
use road_severity_accident_models::{
    AccidentRecord, EnrichedRecord, EnrichedTable, NormalizedTable, SeverityLevel,
};

use crate::parsing::parse_hour;

/// Classification fragment marking accidents with fatal victims.
pub const FATAL_VICTIMS: &str = "Com Vítimas Fatais";

/// Classification fragment marking accidents with severely injured victims.
pub const SEVERE_VICTIMS: &str = "Com Vítimas Graves";

/// Derives the severity level from the classification text.
///
/// Matching is an exact, case-sensitive substring test against the source
/// vocabulary.
#[must_use]
pub fn severity_from_classification(classification: &str) -> SeverityLevel {
    if classification.contains(FATAL_VICTIMS) || classification.contains(SEVERE_VICTIMS) {
        SeverityLevel::Severe
    } else {
        SeverityLevel::NotSevere
    }
}

/// Adds year, month, hour and severity to a single record.
#[must_use]
pub fn enrich_record(record: AccidentRecord) -> EnrichedRecord {
    let hour = record.time_of_day.as_deref().and_then(parse_hour);
    EnrichedRecord {
        year: record.date.year(),
        month: record.date.month(),
        hour,
        severity: severity_from_classification(&record.classification),
        record,
    }
}

/// Enriches every record of a normalized table. No row is dropped.
#[must_use]
pub fn enrich(table: NormalizedTable) -> EnrichedTable {
    let records: Vec<EnrichedRecord> = table.records.into_iter().map(enrich_record).collect();

    let severe = records
        .iter()
        .filter(|r| r.severity == SeverityLevel::Severe)
        .count();
    let missing_hour = records.iter().filter(|r| r.hour.is_none()).count();
    log::info!(
        "Enriched {} records: {severe} severe, {missing_hour} without a parseable hour",
        records.len()
    );

    EnrichedTable {
        columns: table.columns,
        records,
    }
}
