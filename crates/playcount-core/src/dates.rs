//! Civil-date and timestamp formatting for store columns and debug rows.

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};

/// Taipei observes UTC+8 year-round.
const TAIPEI_OFFSET_SECS: i64 = 8 * 3600;

/// The `YYYY-MM-DD` date label for `instant` in Taipei civil time.
#[must_use]
pub fn taipei_date(instant: DateTime<Utc>) -> String {
    let local = instant.naive_utc() + TimeDelta::seconds(TAIPEI_OFFSET_SECS);
    local.format("%Y-%m-%d").to_string()
}

/// ISO-8601 UTC timestamp with millisecond precision and a `Z` suffix.
#[must_use]
pub fn iso_timestamp_utc(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}
