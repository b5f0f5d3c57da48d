//! Per-class precision / recall / F1 report.

use std::fmt;

use road_severity_accident_models::SeverityLevel;
use serde::Serialize;

/// Metrics for one class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub class: String,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Averaged metrics over all classes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

/// Evaluation report on a held-out partition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    /// One entry per severity level, in id order.
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
    /// Total number of evaluated rows.
    pub support: usize,
}

#[allow(clippy::cast_precision_loss)]
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

fn class_metrics(y_true: &[u8], y_pred: &[u8], level: SeverityLevel) -> ClassMetrics {
    let id = level.id();
    let mut tp = 0;
    let mut fp = 0;
    let mut fn_count = 0;
    for (&t, &p) in y_true.iter().zip(y_pred) {
        match (t == id, p == id) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (true, false) => fn_count += 1,
            (false, false) => {}
        }
    }

    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_count);
    let f1_score = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    ClassMetrics {
        class: level.report_name().to_string(),
        precision,
        recall,
        f1_score,
        support: tp + fn_count,
    }
}

/// Computes the report for binary targets and predictions.
///
/// Undefined ratios (no predicted or no true members of a class) are 0.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn classification_report(y_true: &[u8], y_pred: &[u8]) -> ClassificationReport {
    let support = y_true.len().min(y_pred.len());
    let (y_true, y_pred) = (&y_true[..support], &y_pred[..support]);

    let classes: Vec<ClassMetrics> = SeverityLevel::ALL
        .iter()
        .map(|&level| class_metrics(y_true, y_pred, level))
        .collect();

    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    let accuracy = ratio(correct, support);

    let n_classes = classes.len() as f64;
    let macro_avg = AverageMetrics {
        precision: classes.iter().map(|c| c.precision).sum::<f64>() / n_classes,
        recall: classes.iter().map(|c| c.recall).sum::<f64>() / n_classes,
        f1_score: classes.iter().map(|c| c.f1_score).sum::<f64>() / n_classes,
    };

    let weighted = |metric: fn(&ClassMetrics) -> f64| {
        if support == 0 {
            return 0.0;
        }
        classes
            .iter()
            .map(|c| metric(c) * c.support as f64)
            .sum::<f64>()
            / support as f64
    };
    let weighted_avg = AverageMetrics {
        precision: weighted(|c| c.precision),
        recall: weighted(|c| c.recall),
        f1_score: weighted(|c| c.f1_score),
    };

    ClassificationReport {
        classes,
        accuracy,
        macro_avg,
        weighted_avg,
        support,
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|c| c.class.chars().count())
            .chain(["weighted avg".len()])
            .max()
            .unwrap_or(0);

        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>width$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
                c.class, c.precision, c.recall, c.f1_score, c.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.support
        )?;
        for (name, avg) in [
            ("macro avg", &self.macro_avg),
            ("weighted avg", &self.weighted_avg),
        ] {
            writeln!(
                f,
                "{:>width$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, avg.precision, avg.recall, avg.f1_score, self.support
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn per_class_metrics() {
        let y_true = [0, 0, 0, 0, 1, 1];
        let y_pred = [0, 0, 0, 1, 1, 0];

        let report = classification_report(&y_true, &y_pred);

        let not_severe = &report.classes[0];
        assert_eq!(not_severe.class, "Não Grave");
        assert!(close(not_severe.precision, 0.75));
        assert!(close(not_severe.recall, 0.75));
        assert_eq!(not_severe.support, 4);

        let severe = &report.classes[1];
        assert_eq!(severe.class, "Grave");
        assert!(close(severe.precision, 0.5));
        assert!(close(severe.recall, 0.5));
        assert!(close(severe.f1_score, 0.5));
        assert_eq!(severe.support, 2);

        assert!(close(report.accuracy, 4.0 / 6.0));
        assert!(close(report.macro_avg.recall, 0.625));
        assert!(close(report.weighted_avg.precision, (0.75 * 4.0 + 0.5 * 2.0) / 6.0));
        assert_eq!(report.support, 6);
    }

    #[test]
    fn undefined_ratios_are_zero() {
        let report = classification_report(&[0, 0, 1], &[0, 0, 0]);
        let severe = &report.classes[1];
        assert!(close(severe.precision, 0.0));
        assert!(close(severe.recall, 0.0));
        assert!(close(severe.f1_score, 0.0));
    }

    #[test]
    fn renders_a_table() {
        let report = classification_report(&[0, 1, 1, 0], &[0, 1, 0, 0]);
        let text = report.to_string();

        assert!(text.contains("precision"));
        assert!(text.contains("Não Grave"));
        assert!(text.contains("Grave"));
        assert!(text.contains("accuracy"));
        assert!(text.contains("weighted avg"));
        assert!(text.contains("0.75"));
    }

    #[test]
    fn serializes_to_json() {
        let report = classification_report(&[0, 1], &[0, 1]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["classes"][1]["class"], "Grave");
        assert_eq!(json["support"], 2);
    }
}
