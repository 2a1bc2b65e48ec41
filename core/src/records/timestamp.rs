use crate::prelude::{WddError, WddResult};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

const NAIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y%m%dT%H%M%S%.f",
];

/// Parses an ISO-8601 timestamp. Values without an offset are taken as UTC.
pub fn parse_timestamp(text: &str) -> WddResult<DateTime<Utc>> {
    let trimmed = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Ok(parsed.with_timezone(&Utc));
    }

    let naive_text = trimmed.strip_suffix('Z').unwrap_or(trimmed);
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(naive_text, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| WddError::Timestamp(trimmed.to_string()))
}

/// Keeps only the first fractional-second section of a timestamp.
///
/// Recording names carry stamps like `20240904T122936.14581.115Z`; everything
/// after the second dot is dropped and the `Z` restored.
pub fn truncate_fraction_sections(timestamp: &str) -> String {
    let mut sections = timestamp.split('.');
    match (sections.next(), sections.next(), sections.next()) {
        (Some(whole), Some(fraction), Some(_)) => format!("{}.{}Z", whole, fraction),
        _ => timestamp.to_string(),
    }
}
