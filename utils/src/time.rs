//! Timestamp formatting and date parsing helpers.

use chrono::{DateTime, NaiveDate, SecondsFormat};

/// Render a Unix-seconds timestamp as ISO-8601 with milliseconds,
/// e.g. `2016-02-20T20:26:40.000Z`.
///
/// Out-of-range timestamps render as an empty string.
pub fn timestamp_to_iso(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

/// Parse a caller-supplied date into epoch milliseconds.
///
/// Accepts integer epoch milliseconds, RFC 3339 timestamps and plain
/// `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_date_millis(input: &str) -> Option<i64> {
    let trimmed = input.trim();
    if let Ok(millis) = trimmed.parse::<i64>() {
        return Some(millis);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.timestamp_millis());
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}
