//! Daily price storage
//!
//! Two write paths against one `(ticker, date)` uniqueness contract:
//! the bulk loader inserts with `INSERT OR IGNORE` (duplicates are skipped,
//! never overwritten), the incremental refresh upserts (conflicts overwrite).
//! The two are deliberately separate operations, not a configurable mode.

use crate::db::sqlite::models::{JsonBar, PriceExportRow, PricePoint, TickerStats};
use crate::error::{AppError, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection};

/// Summary of the whole price table
#[derive(Debug, Clone)]
pub struct PriceSummary {
    pub rows: i64,
    pub tickers: i64,
    pub first_date: Option<String>,
    pub last_date: Option<String>,
}

/// Bulk-insert points, skipping rows that collide on (ticker, date).
///
/// Returns the number of rows actually inserted; the caller derives the
/// skipped count as `points.len() - inserted`.
pub fn insert_ignore(conn: &mut Connection, points: &[PricePoint]) -> Result<usize> {
    let tx = conn.transaction()?;

    let mut stmt = tx.prepare(
        "INSERT OR IGNORE INTO daily_prices
             (asset_id, ticker, date, open, high, low, close, volume)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;

    let mut inserted = 0;
    for point in points {
        inserted += stmt.execute(params![
            point.asset_id,
            point.ticker,
            point.date.to_string(),
            point.open,
            point.high,
            point.low,
            point.close,
            point.volume,
        ])?;
    }

    drop(stmt);
    tx.commit()?;

    Ok(inserted)
}

/// Insert or overwrite one point by its (ticker, date) key.
pub fn upsert(conn: &Connection, point: &PricePoint) -> Result<()> {
    conn.execute(
        "INSERT INTO daily_prices
             (asset_id, ticker, date, open, high, low, close, volume)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT (ticker, date) DO UPDATE SET
             asset_id = excluded.asset_id,
             open = excluded.open,
             high = excluded.high,
             low = excluded.low,
             close = excluded.close,
             volume = excluded.volume,
             updated_at = datetime('now')",
        params![
            point.asset_id,
            point.ticker,
            point.date.to_string(),
            point.open,
            point.high,
            point.low,
            point.close,
            point.volume,
        ],
    )?;

    Ok(())
}

/// Latest stored date for a ticker, or `None` when nothing is stored.
pub fn latest_date(conn: &Connection, ticker: &str) -> Result<Option<NaiveDate>> {
    let latest: Option<String> = conn.query_row(
        "SELECT MAX(date) FROM daily_prices WHERE ticker = ?1",
        params![ticker],
        |row| row.get(0),
    )?;

    match latest {
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|e| AppError::Internal(format!("Bad stored date '{}': {}", raw, e))),
        None => Ok(None),
    }
}

/// All distinct tickers with stored prices, alphabetically.
pub fn tickers(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT DISTINCT ticker FROM daily_prices ORDER BY ticker")?;

    let tickers = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(tickers)
}

/// One ticker's series, ascending by date, in JSON-export form.
pub fn series(conn: &Connection, ticker: &str) -> Result<Vec<JsonBar>> {
    let mut stmt = conn.prepare(
        "SELECT date, open, high, low, close, volume
         FROM daily_prices
         WHERE ticker = ?1
         ORDER BY date ASC",
    )?;

    let bars = stmt
        .query_map(params![ticker], |row| {
            Ok(JsonBar {
                date: row.get(0)?,
                open: row.get(1)?,
                high: row.get(2)?,
                low: row.get(3)?,
                close: row.get(4)?,
                volume: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(bars)
}

/// Every stored row in full, ordered by ticker then date, for the CSV export.
pub fn export_rows(conn: &Connection) -> Result<Vec<PriceExportRow>> {
    let mut stmt = conn.prepare(
        "SELECT asset_id, ticker, date, open, high, low, close, volume, created_at, updated_at
         FROM daily_prices
         ORDER BY ticker, date",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok(PriceExportRow {
                asset_id: row.get(0)?,
                ticker: row.get(1)?,
                date: row.get(2)?,
                open: row.get(3)?,
                high: row.get(4)?,
                low: row.get(5)?,
                close: row.get(6)?,
                volume: row.get(7)?,
                created_at: row.get(8)?,
                updated_at: row.get(9)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Table-wide summary counts and date range.
pub fn summary(conn: &Connection) -> Result<PriceSummary> {
    conn.query_row(
        "SELECT COUNT(*), COUNT(DISTINCT ticker), MIN(date), MAX(date) FROM daily_prices",
        [],
        |row| {
            Ok(PriceSummary {
                rows: row.get(0)?,
                tickers: row.get(1)?,
                first_date: row.get(2)?,
                last_date: row.get(3)?,
            })
        },
    )
    .map_err(Into::into)
}

/// Per-ticker row counts and latest dates, alphabetically.
pub fn ticker_stats(conn: &Connection) -> Result<Vec<TickerStats>> {
    let mut stmt = conn.prepare(
        "SELECT ticker, COUNT(*), MAX(date)
         FROM daily_prices
         GROUP BY ticker
         ORDER BY ticker",
    )?;

    let stats = stmt
        .query_map([], |row| {
            Ok(TickerStats {
                ticker: row.get(0)?,
                rows: row.get(1)?,
                latest_date: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(stats)
}
