//! Stats Service
//!
//! Read-only summary of the price table for operators: overall counts and
//! date range, optionally broken down per ticker.

use crate::db::SqliteDb;
use crate::error::Result;

/// Price table reporting
pub struct StatsService;

impl StatsService {
    /// Render the stats report as printable text.
    pub fn render(db: &SqliteDb, by_ticker: bool) -> Result<String> {
        let summary = db.price_summary()?;
        let assets = db.asset_count()?;

        let range = match (&summary.first_date, &summary.last_date) {
            (Some(first), Some(last)) => format!("{} .. {}", first, last),
            _ => "-".to_string(),
        };

        let mut out = String::new();
        out.push_str(&format!("price rows : {}\n", summary.rows));
        out.push_str(&format!("tickers    : {}\n", summary.tickers));
        out.push_str(&format!("assets     : {}\n", assets));
        out.push_str(&format!("date range : {}\n", range));

        if by_ticker {
            out.push('\n');
            for stats in db.price_ticker_stats()? {
                out.push_str(&format!(
                    "{:<12} {:>8} rows  latest {}\n",
                    stats.ticker, stats.rows, stats.latest_date
                ));
            }
        }

        Ok(out)
    }
}
