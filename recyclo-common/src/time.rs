//! Timestamp utilities
//!
//! Decision log timestamps are stored as fixed-width RFC 3339 UTC text
//! (`2025-03-14T09:26:53.589793Z`) so string order equals time order.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current UTC calendar day
pub fn today() -> NaiveDate {
    now().date_naive()
}

/// Storage form of a timestamp
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Midnight UTC at the start of `day`, in storage form
pub fn day_start(day: NaiveDate) -> String {
    format_timestamp(&day.and_time(chrono::NaiveTime::MIN).and_utc())
}

/// Parse a stored timestamp.
///
/// Accepts RFC 3339 and the space-separated `YYYY-MM-DD HH:MM:SS[.f]` form
/// found in databases written by older releases (read as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
