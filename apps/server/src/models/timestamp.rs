//! Canonical timestamp handling for `testDate`.
//!
//! Every stored and emitted test date is UTC, RFC 3339, millisecond precision,
//! `Z` suffix: `2024-01-15T00:00:00.000Z`.

use chrono::{Datelike, DateTime, NaiveDate, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use serde::Serializer;

/// Date-time layouts accepted without an explicit offset. Interpreted as UTC.
const NAIVE_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Years every store can hold. PostgreSQL `TIMESTAMPTZ` stops at 4713 BC.
const SUPPORTED_YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

/// Parse a user-supplied test date into its canonical instant.
///
/// Returns `None` when the input is not a valid calendar date/time or the
/// UTC year falls outside 1..=9999.
pub fn parse_test_date(input: &str) -> Option<DateTime<Utc>> {
    parse_any(input).filter(|dt| SUPPORTED_YEARS.contains(&dt.year()))
}

fn parse_any(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(canonicalize(dt.with_timezone(&Utc)));
    }

    for format in NAIVE_DATE_TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(canonicalize(naive.and_utc()));
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| canonicalize(naive.and_utc()))
}

/// Truncate to the stored precision so that values read back compare equal.
pub fn canonicalize(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.trunc_subsecs(3)
}

pub fn format_canonical(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `serialize_with` helper emitting the canonical form.
pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_canonical(dt))
}
