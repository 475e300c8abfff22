//! Text and time measures shared by every detail entry.

use chrono::{DateTime, NaiveDateTime};

/// Number of lines: 0 for empty text, otherwise one more than the newline count.
///
/// A trailing newline therefore counts as starting one more line.
pub fn count_lines(text: &str) -> usize {
    if text.is_empty() {
        0
    } else {
        1 + text.bytes().filter(|&b| b == b'\n').count()
    }
}

/// Number of Unicode code points.
pub fn count_chars(text: &str) -> usize {
    text.chars().count()
}

/// Parse an ISO-8601 timestamp into Unix milliseconds.
///
/// Accepts RFC 3339 with or without fractional seconds; a value without a zone
/// designator is read as UTC. Anything else yields 0.
pub fn parse_timestamp(value: &str) -> i64 {
    let value = value.trim();
    if value.is_empty() {
        return 0;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return dt.timestamp_millis();
    }

    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc().timestamp_millis())
        .unwrap_or(0)
}
