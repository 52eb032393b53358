//! Source row decode and filtering
//!
//! A dump line is `ticker,period,date,time,open,high,low,close,volume,openint`
//! (the trailing open-interest column is ignored). Decode is tolerant: any
//! row that fails the column/number/date contract yields `None` and is
//! dropped by the caller; header lines fall out the same way.

use chrono::{DateTime, NaiveDate, Utc};
use csv::StringRecord;

use super::datetime::parse_timestamp;
use super::ticker::normalize_ticker;

/// Minimum column count for a decodable row (open interest is optional)
const MIN_COLUMNS: usize = 9;

/// One parsed source row, pre-filter
#[derive(Debug, Clone)]
pub struct PriceRow {
    pub ticker: String,
    pub period: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl PriceRow {
    /// Decode a CSV record into a row, or `None` if it violates the contract.
    ///
    /// OHLC must all parse to finite numbers; an unparsable or negative
    /// volume defaults to zero rather than rejecting the row.
    pub fn from_record(record: &StringRecord) -> Option<Self> {
        if record.len() < MIN_COLUMNS {
            return None;
        }

        let ticker = normalize_ticker(record.get(0)?);
        let period = record.get(1)?.trim().to_string();
        let timestamp = parse_timestamp(record.get(2)?, record.get(3))?;

        let open = parse_finite(record.get(4)?)?;
        let high = parse_finite(record.get(5)?)?;
        let low = parse_finite(record.get(6)?)?;
        let close = parse_finite(record.get(7)?)?;

        let volume = record
            .get(8)?
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|v| *v >= 0)
            .unwrap_or(0);

        Some(Self {
            ticker,
            period,
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        })
    }

    /// Calendar date of the bar (the persisted form drops the time)
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}

fn parse_finite(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Pure acceptance predicate over a decoded row
#[derive(Debug, Clone, Default)]
pub struct RowFilter {
    /// Rows strictly earlier than this date are rejected
    pub cutoff: Option<NaiveDate>,
    /// Required period code, compared case-insensitively; `None` accepts all
    pub period: Option<String>,
}

impl RowFilter {
    pub fn new(cutoff: Option<NaiveDate>, period: Option<String>) -> Self {
        Self { cutoff, period }
    }

    /// Whether a row is in scope. No side effects.
    pub fn accepts(&self, row: &PriceRow) -> bool {
        if row.ticker.is_empty() {
            return false;
        }

        if let Some(period) = &self.period {
            if !row.period.eq_ignore_ascii_case(period) {
                return false;
            }
        }

        if let Some(cutoff) = self.cutoff {
            if row.date() < cutoff {
                return false;
            }
        }

        true
    }
}
