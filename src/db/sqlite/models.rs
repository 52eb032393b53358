//! SQLite database models

use chrono::NaiveDate;
use serde::Serialize;

/// Persisted daily price bar, keyed by (ticker, date)
#[derive(Debug, Clone)]
pub struct PricePoint {
    /// Internal asset link; absent when reconciliation found no match
    pub asset_id: Option<i64>,
    pub ticker: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// Full price row as stored, for the CSV export
#[derive(Debug, Clone)]
pub struct PriceExportRow {
    pub asset_id: Option<i64>,
    pub ticker: String,
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// One bar of the per-ticker JSON export
#[derive(Debug, Clone, Serialize)]
pub struct JsonBar {
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// Per-ticker summary used by the stats command
#[derive(Debug, Clone)]
pub struct TickerStats {
    pub ticker: String,
    pub rows: i64,
    pub latest_date: String,
}
