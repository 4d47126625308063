//! Timestamp encoding for stored due dates and review times.
//!
//! Timestamps are written as fixed-width RFC 3339 UTC strings with microsecond
//! precision (`2024-01-01T10:00:00.000000Z`), so SQLite's text comparison
//! orders them chronologically. That only holds for four-digit years, so
//! timestamps outside 0000-9999 are never written.

use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::Row;

/// Format a timestamp for storage.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Latest value that can be stored.
const LAST_STORABLE: &str = "9999-12-31T23:59:59.999999Z";

/// Whether `ts` formats to the fixed-width form (years 0000-9999).
pub fn is_storable(ts: DateTime<Utc>) -> bool {
    (0..=9999).contains(&ts.year())
}

/// Text bound for a `<= now` comparison against stored timestamps.
///
/// `None` when `now` precedes every storable timestamp.
pub(crate) fn upper_bound(now: DateTime<Utc>) -> Option<String> {
    match now.year() {
        year if year < 0 => None,
        year if year > 9999 => Some(LAST_STORABLE.to_string()),
        _ => Some(format_timestamp(now)),
    }
}

/// Parse a stored timestamp.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}

/// Read a timestamp column, reporting unparseable text as a conversion failure.
pub(crate) fn timestamp_column(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    parse_timestamp(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Read a nullable timestamp column.
pub(crate) fn optional_timestamp_column(
    row: &Row,
    idx: usize,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(text) => parse_timestamp(&text)
            .map(Some)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_fixed_width_format() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        assert_eq!(format_timestamp(ts), "2024-01-01T10:00:00.000000Z");
        let later = ts + Duration::microseconds(1);
        assert_eq!(format_timestamp(later), "2024-01-01T10:00:00.000001Z");
    }

    #[test]
    fn test_text_order_is_chronological() {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 9, 59, 59).unwrap();
        let times = [
            base,
            base + Duration::milliseconds(1),
            base + Duration::seconds(1),
            base + Duration::days(400),
        ];
        for pair in times.windows(2) {
            assert!(format_timestamp(pair[0]) < format_timestamp(pair[1]));
        }
    }

    #[test]
    fn test_storable_range() {
        let last = Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap()
            + Duration::microseconds(999_999);
        let first = Utc.with_ymd_and_hms(0, 1, 1, 0, 0, 0).unwrap();
        assert!(is_storable(last));
        assert!(is_storable(first));
        assert!(!is_storable(last + Duration::microseconds(1)));
        assert!(!is_storable(first - Duration::microseconds(1)));
        assert_eq!(format_timestamp(last), LAST_STORABLE);
        assert_eq!(parse_timestamp(&format_timestamp(first)).unwrap(), first);
    }

    #[test]
    fn test_upper_bound_clamps() {
        let far = Utc.with_ymd_and_hms(12000, 1, 1, 0, 0, 0).unwrap();
        let ancient = Utc.with_ymd_and_hms(-5, 1, 1, 0, 0, 0).unwrap();
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        assert_eq!(upper_bound(far).as_deref(), Some(LAST_STORABLE));
        assert_eq!(upper_bound(ancient), None);
        assert_eq!(upper_bound(ts), Some(format_timestamp(ts)));
    }

    #[test]
    fn test_parse_round_trip() {
        let ts = Utc.with_ymd_and_hms(2030, 6, 15, 23, 1, 2).unwrap() + Duration::microseconds(7);
        assert_eq!(parse_timestamp(&format_timestamp(ts)).unwrap(), ts);
        assert!(parse_timestamp("yesterday").is_err());
    }
}
