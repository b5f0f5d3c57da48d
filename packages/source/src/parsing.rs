//! Field-level parsing for the accident export.
//!
//! Every parser returns `None` on missing or unparseable input instead of
//! failing; only the normalizer's mandatory-field gate decides whether a row
//! is dropped.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike as _};

/// Date formats seen across yearly exports, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];

/// Date-time formats whose date part is kept.
const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Returns the trimmed text, or `None` if it is empty.
#[must_use]
pub fn non_empty(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Parses a calendar date.
#[must_use]
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = non_empty(s)?;
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_TIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Parses a decimal that may use a comma as the decimal separator
/// (`"-23,55"` and `"-23.55"` yield the same value). Non-finite results
/// count as missing.
#[must_use]
pub fn parse_decimal(s: &str) -> Option<f64> {
    let s = non_empty(s)?;
    s.replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Parses a non-negative count, tolerating a float rendering with no
/// fractional part (`"3.0"`).
#[must_use]
pub fn parse_count(s: &str) -> Option<u32> {
    let s = non_empty(s)?;
    if let Ok(n) = s.parse::<u32>() {
        return Some(n);
    }
    let value = parse_decimal(s)?;
    if value >= 0.0 && value.fract() == 0.0 && value <= f64::from(u32::MAX) {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        return Some(value as u32);
    }
    None
}

/// Extracts the hour from an `HH:MM:SS` time-of-day string.
#[must_use]
pub fn parse_hour(s: &str) -> Option<u32> {
    let s = non_empty(s)?;
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .ok()
        .map(|t| t.hour())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_and_point_decimals_parse_identically() {
        let comma = parse_decimal("-23,55").unwrap();
        let point = parse_decimal("-23.55").unwrap();
        assert!((comma - point).abs() < f64::EPSILON);
        assert!((comma - -23.55).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_unparseable_decimals() {
        assert!(parse_decimal("").is_none());
        assert!(parse_decimal("   ").is_none());
        assert!(parse_decimal("abc").is_none());
        assert!(parse_decimal("1,2,3").is_none());
        assert!(parse_decimal("NaN").is_none());
    }

    #[test]
    fn parses_iso_and_brazilian_dates() {
        let expected = NaiveDate::from_ymd_opt(2023, 3, 15).unwrap();
        assert_eq!(parse_date("2023-03-15"), Some(expected));
        assert_eq!(parse_date("15/03/2023"), Some(expected));
        assert_eq!(parse_date("2023-03-15 08:30:00"), Some(expected));
        assert_eq!(parse_date(" 2023-03-15 "), Some(expected));
    }

    #[test]
    fn rejects_invalid_dates() {
        assert!(parse_date("not-a-date").is_none());
        assert!(parse_date("2023-02-30").is_none());
        assert!(parse_date("").is_none());
    }

    #[test]
    fn parses_hour_of_day() {
        assert_eq!(parse_hour("07:45:00"), Some(7));
        assert_eq!(parse_hour("23:59:59"), Some(23));
        assert!(parse_hour("7h45").is_none());
        assert!(parse_hour("25:00:00").is_none());
        assert!(parse_hour("").is_none());
    }

    #[test]
    fn parses_counts() {
        assert_eq!(parse_count("3"), Some(3));
        assert_eq!(parse_count("3.0"), Some(3));
        assert_eq!(parse_count("0"), Some(0));
        assert!(parse_count("-1").is_none());
        assert!(parse_count("2.5").is_none());
        assert!(parse_count("x").is_none());
    }
}
