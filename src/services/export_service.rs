//! Export Service
//!
//! Two read-side outputs: a full-table CSV dump with the fixed column
//! header the downstream importer expects, and one JSON array file per
//! ticker for static serving.

use crate::db::SqliteDb;
use crate::error::Result;
use std::fs::{File, OpenOptions};
use std::path::Path;
use tracing::{info, warn};

/// Fixed export header; the adjusted/split/dividend columns are
/// placeholders kept for importer compatibility.
const CSV_HEADER: &[&str] = &[
    "asset_id",
    "ticker",
    "date",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "adj_open",
    "adj_high",
    "adj_low",
    "adj_close",
    "split_ratio",
    "dividend",
    "created_at",
    "updated_at",
];

/// Price table exports
pub struct ExportService;

impl ExportService {
    /// Write the whole price table to a CSV file. Overwrite mode emits the
    /// header; append mode only adds rows. Returns the row count written.
    pub fn export_csv(db: &SqliteDb, path: &Path, append: bool) -> Result<usize> {
        let rows = db.price_export_rows()?;

        let file = if append {
            OpenOptions::new().create(true).append(true).open(path)?
        } else {
            File::create(path)?
        };

        let mut writer = csv::Writer::from_writer(file);
        if !append {
            writer.write_record(CSV_HEADER)?;
        }

        for row in &rows {
            writer.write_record(&[
                row.asset_id.map(|id| id.to_string()).unwrap_or_default(),
                row.ticker.clone(),
                row.date.clone(),
                row.open.to_string(),
                row.high.to_string(),
                row.low.to_string(),
                row.close.to_string(),
                row.volume.to_string(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                row.created_at.clone(),
                row.updated_at.clone(),
            ])?;
        }

        writer.flush()?;
        info!("Exported {} rows to {}", rows.len(), path.display());

        Ok(rows.len())
    }

    /// Write one `<TICKER>.json` per ticker under `out_dir`, each an array
    /// of daily bars ascending by date. Returns the file count written.
    pub fn export_json(db: &SqliteDb, out_dir: &Path) -> Result<usize> {
        std::fs::create_dir_all(out_dir)?;

        let tickers = db.price_tickers()?;
        let mut written = 0;

        for ticker in &tickers {
            match write_ticker_json(db, out_dir, ticker) {
                Ok(()) => written += 1,
                Err(e) => warn!("{}: JSON export failed: {}", ticker, e),
            }
        }

        info!("Exported {} ticker files to {}", written, out_dir.display());
        Ok(written)
    }
}

fn write_ticker_json(db: &SqliteDb, out_dir: &Path, ticker: &str) -> Result<()> {
    let bars = db.price_series(ticker)?;
    let body = serde_json::to_string(&bars)?;
    std::fs::write(out_dir.join(format!("{}.json", ticker)), body)?;
    Ok(())
}
