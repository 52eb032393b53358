//! SQLite database module

pub mod models;
mod assets;
mod migrations;
mod prices;

use crate::error::Result;
use crate::reconcile::AssetRef;
use chrono::NaiveDate;
use models::{JsonBar, PriceExportRow, PricePoint, TickerStats};
use parking_lot::Mutex;
pub use prices::PriceSummary;
use rusqlite::Connection;
use std::path::Path;

/// SQLite database wrapper
///
/// One connection shared by all pipeline workers; the mutex serializes
/// access, which is sufficient because every write already batches rows.
pub struct SqliteDb {
    conn: Mutex<Connection>,
}

impl SqliteDb {
    /// Create new SQLite database connection
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent access. foreign_keys is left
        // OFF (SQLite's standard default) because asset_id is an optional,
        // advisory link per the spec, not a DB-enforced constraint; some
        // bundled SQLite builds default it ON, so set it explicitly.
        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=OFF;",
        )?;

        let db = Self {
            conn: Mutex::new(conn),
        };

        // Run migrations
        db.run_migrations()?;

        Ok(db)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn.lock();
        migrations::run_migrations(&conn)
    }

    // ========== Price Methods ==========

    /// Bulk-insert price points, skipping (ticker, date) duplicates.
    /// Returns the number of rows actually inserted.
    pub fn insert_prices_ignore(&self, points: &[PricePoint]) -> Result<usize> {
        let mut conn = self.conn.lock();
        prices::insert_ignore(&mut conn, points)
    }

    /// Insert or overwrite one price point by its (ticker, date) key
    pub fn upsert_price(&self, point: &PricePoint) -> Result<()> {
        let conn = self.conn.lock();
        prices::upsert(&conn, point)
    }

    /// Latest stored date for a ticker
    pub fn latest_price_date(&self, ticker: &str) -> Result<Option<NaiveDate>> {
        let conn = self.conn.lock();
        prices::latest_date(&conn, ticker)
    }

    /// All distinct tickers with stored prices
    pub fn price_tickers(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        prices::tickers(&conn)
    }

    /// One ticker's series, ascending by date
    pub fn price_series(&self, ticker: &str) -> Result<Vec<JsonBar>> {
        let conn = self.conn.lock();
        prices::series(&conn, ticker)
    }

    /// Every stored price row in export form
    pub fn price_export_rows(&self) -> Result<Vec<PriceExportRow>> {
        let conn = self.conn.lock();
        prices::export_rows(&conn)
    }

    /// Table-wide summary
    pub fn price_summary(&self) -> Result<PriceSummary> {
        let conn = self.conn.lock();
        prices::summary(&conn)
    }

    /// Per-ticker row counts and latest dates
    pub fn price_ticker_stats(&self) -> Result<Vec<TickerStats>> {
        let conn = self.conn.lock();
        prices::ticker_stats(&conn)
    }

    // ========== Asset Methods ==========

    /// Replace the asset reference table
    pub fn replace_assets(&self, assets: &[AssetRef]) -> Result<()> {
        let mut conn = self.conn.lock();
        assets::replace_all(&mut conn, assets)
    }

    /// Load all asset references in import order
    pub fn load_assets(&self) -> Result<Vec<AssetRef>> {
        let conn = self.conn.lock();
        assets::load_all(&conn)
    }

    /// Get asset count
    pub fn asset_count(&self) -> Result<i64> {
        let conn = self.conn.lock();
        assets::count(&conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_runs_migrations_idempotently() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.db");

        let db = SqliteDb::new(&path).unwrap();
        assert_eq!(db.price_summary().unwrap().rows, 0);
        drop(db);

        // Reopening an existing database must not re-run applied migrations.
        let db = SqliteDb::new(&path).unwrap();
        assert_eq!(db.asset_count().unwrap(), 0);
    }
}
