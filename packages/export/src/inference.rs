//! Batch scoring of the full enriched table.

use road_severity_accident_models::{EnrichedTable, ScoredRecord, ScoredTable, SeverityLevel};
use road_severity_model::{TrainedModel, prepare_features};

/// Scores every record of `table` with `model`. No row is excluded.
#[must_use]
pub fn score(model: &TrainedModel, table: EnrichedTable) -> ScoredTable {
    let (rows, _) = prepare_features(&table.records);
    let predicted = model.predict(&rows);
    let probabilities = model.predict_proba(&rows);

    let records: Vec<ScoredRecord> = table
        .records
        .into_iter()
        .zip(predicted)
        .zip(probabilities)
        .map(|((enriched, id), probability)| ScoredRecord {
            enriched,
            predicted: SeverityLevel::from_id(id),
            probability,
        })
        .collect();

    let flagged = records
        .iter()
        .filter(|r| r.predicted == SeverityLevel::Severe)
        .count();
    log::info!(
        "Scored {} records, {flagged} predicted severe",
        records.len()
    );

    ScoredTable {
        columns: table.columns,
        records,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use road_severity_accident_models::{AccidentRecord, EnrichedRecord};
    use road_severity_accident_models::progress::NullProgress;
    use road_severity_model::{ForestParams, SeverityClassifier};

    use super::*;

    fn enriched(i: usize) -> EnrichedRecord {
        let severe = i % 2 == 0;
        EnrichedRecord {
            record: AccidentRecord {
                id: Some(i.to_string()),
                date: NaiveDate::from_ymd_opt(2023, 8, 20).unwrap(),
                weekday: Some("domingo".to_string()),
                time_of_day: None,
                state: None,
                highway: None,
                km: None,
                municipality: None,
                cause: None,
                accident_type: Some(if severe { "Capotamento" } else { "Tombamento" }.to_string()),
                classification: String::new(),
                day_phase: None,
                direction: None,
                weather: None,
                road_type: None,
                road_layout: None,
                latitude: -3.7,
                longitude: -38.5,
                people: None,
                deaths: None,
                light_injuries: None,
                severe_injuries: None,
                uninjured: None,
                unknown_injury: None,
                vehicles: None,
            },
            year: 2023,
            month: 8,
            hour: None,
            severity: SeverityLevel::from_id(u8::from(severe)),
        }
    }

    #[test]
    fn scores_every_row_consistently() {
        let table = EnrichedTable {
            columns: Vec::new(),
            records: (0..12).map(enriched).collect(),
        };
        let (rows, targets) = prepare_features(&table.records);
        let classifier = SeverityClassifier {
            forest: ForestParams {
                n_trees: 10,
                ..ForestParams::default()
            },
            ..SeverityClassifier::default()
        };
        let model = classifier.fit(&rows, &targets, &NullProgress).unwrap();

        let scored = score(&model, table);

        assert_eq!(scored.records.len(), 12);
        for record in &scored.records {
            assert!((0.0..=1.0).contains(&record.probability));
            assert_eq!(
                record.predicted == SeverityLevel::Severe,
                record.probability >= 0.5
            );
            assert_eq!(record.predicted, record.enriched.severity);
        }
    }
}
