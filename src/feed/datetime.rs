//! Date/time grammar of the source dumps
//!
//! Dumps carry dates as `YYYY-MM-DD` or bare 8-digit `YYYYMMDD`, with an
//! optional time column that is either 6-digit `HHMMSS`, colon-delimited
//! `HH:MM[:SS]`, or a literal `0` meaning "no intraday time". All parsed
//! timestamps are anchored to UTC so a row ingested on any host maps to the
//! same calendar date.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// Fallback date formats tried after the two primary encodings
const FALLBACK_DATE_FORMATS: &[&str] = &["%Y/%m/%d", "%m/%d/%Y"];

/// Parse a date string and an optional time string into a UTC timestamp.
///
/// Returns `None` when the date portion is unrecognizable; callers discard
/// the row. A missing, empty, or zero time maps to midnight, as does a time
/// string in none of the recognized forms.
///
/// Out-of-range month/day components (e.g. `20241345`) are rejected here
/// rather than rolled over.
pub fn parse_timestamp(date: &str, time: Option<&str>) -> Option<DateTime<Utc>> {
    let date = parse_date(date)?;
    let time = time.map(parse_time).unwrap_or(NaiveTime::MIN);
    Some(date.and_time(time).and_utc())
}

/// Parse the date portion alone.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }

    // 8 digits split 4/2/2
    if raw.len() == 8 && raw.bytes().all(|b| b.is_ascii_digit()) {
        let year: i32 = raw[..4].parse().ok()?;
        let month: u32 = raw[4..6].parse().ok()?;
        let day: u32 = raw[6..8].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    FALLBACK_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Parse the time-of-day portion; anything unrecognized is midnight.
fn parse_time(raw: &str) -> NaiveTime {
    let raw = raw.trim();

    if raw.is_empty() || raw == "0" {
        return NaiveTime::MIN;
    }

    if raw.len() == 6 && raw.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(time) = NaiveTime::parse_from_str(raw, "%H%M%S") {
            return time;
        }
    }

    if raw.contains(':') {
        for fmt in ["%H:%M:%S", "%H:%M"] {
            if let Ok(time) = NaiveTime::parse_from_str(raw, fmt) {
                return time;
            }
        }
    }

    NaiveTime::MIN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_and_dashed_dates_agree() {
        for (compact, dashed) in [
            ("20240102", "2024-01-02"),
            ("19991231", "1999-12-31"),
            ("20000229", "2000-02-29"),
        ] {
            assert_eq!(parse_date(compact), parse_date(dashed));
            assert!(parse_date(compact).is_some());
        }
    }

    #[test]
    fn test_fallback_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15);
        assert_eq!(parse_date("2024/03/15"), expected);
        assert_eq!(parse_date("03/15/2024"), expected);
    }

    #[test]
    fn test_unparseable_date_is_none() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("not-a-date"), None);
        assert_eq!(parse_date("2024010"), None);
    }

    #[test]
    fn test_out_of_range_components_rejected() {
        // Month 13 / day 45 are discarded, not rolled over.
        assert_eq!(parse_date("20241345"), None);
        assert_eq!(parse_date("20240230"), None);
    }

    #[test]
    fn test_missing_time_is_midnight() {
        let ts = parse_timestamp("20240102", None).unwrap();
        assert_eq!(ts.time(), NaiveTime::MIN);

        for zeroish in ["", "0", "  "] {
            let ts = parse_timestamp("20240102", Some(zeroish)).unwrap();
            assert_eq!(ts.time(), NaiveTime::MIN);
        }
    }

    #[test]
    fn test_six_digit_time() {
        let ts = parse_timestamp("20240102", Some("153045")).unwrap();
        assert_eq!(ts.time(), NaiveTime::from_hms_opt(15, 30, 45).unwrap());
    }

    #[test]
    fn test_colon_delimited_time() {
        let ts = parse_timestamp("2024-01-02", Some("09:30")).unwrap();
        assert_eq!(ts.time(), NaiveTime::from_hms_opt(9, 30, 0).unwrap());

        let ts = parse_timestamp("2024-01-02", Some("09:30:15")).unwrap();
        assert_eq!(ts.time(), NaiveTime::from_hms_opt(9, 30, 15).unwrap());
    }

    #[test]
    fn test_unrecognized_time_falls_back_to_midnight() {
        let ts = parse_timestamp("2024-01-02", Some("noon")).unwrap();
        assert_eq!(ts.time(), NaiveTime::MIN);
    }

    #[test]
    fn test_timestamp_is_utc_anchored() {
        let ts = parse_timestamp("2024-01-02", None).unwrap();
        assert_eq!(ts.date_naive(), NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(ts.timezone(), Utc);
    }
}
