use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::error::{ConfigurationError, ResolutionError};

/// Formats accepted for `--since`, tried in order.
/// The first is the default `git log` date format.
const SINCE_FORMATS: &[&str] = &[
    "%a %b %e %H:%M:%S %Y %z",
    "%Y-%m-%d %H:%M:%S %z",
    "%a, %d %b %Y %H:%M:%S %z",
];

/// Parses a TimeMap `datetime` / `until` value (ISO-8601 with zone, `Z` allowed).
pub fn parse_memento_datetime(value: &str) -> Result<DateTime<FixedOffset>, ResolutionError> {
    DateTime::parse_from_rfc3339(value.trim()).map_err(|source| ResolutionError::InvalidDatetime {
        value: value.to_string(),
        source,
    })
}

/// Parses the cutoff given on the command line.
///
/// A bare `YYYY-MM-DD` date means midnight UTC of that day.
pub fn parse_since(input: &str) -> Result<DateTime<FixedOffset>, ConfigurationError> {
    let trimmed = input.trim();

    for format in SINCE_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(trimmed, format) {
            return Ok(parsed);
        }
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed);
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc().fixed_offset());
        }
    }

    Err(ConfigurationError::InvalidDate {
        input: input.to_string(),
    })
}
