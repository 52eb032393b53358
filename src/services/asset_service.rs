//! Asset Service
//!
//! Loads the asset reference list (from the assets table or a CSV snapshot)
//! and builds the reconciliation lookup. Also handles snapshot imports.

use crate::db::SqliteDb;
use crate::error::{AppError, Result};
use crate::reconcile::{AssetLookup, AssetRef};
use std::path::Path;
use tracing::info;

/// Asset reference loading and import
pub struct AssetService;

impl AssetService {
    /// Read an assets snapshot CSV (`asset_id,ticker,clean_ticker`, with header)
    ///
    /// An unreadable or malformed snapshot is a setup error and aborts the
    /// run; this is the one input the whole pipeline depends on.
    pub fn read_snapshot(path: &Path) -> Result<Vec<AssetRef>> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| {
                AppError::Config(format!(
                    "Cannot read assets snapshot '{}': {}",
                    path.display(),
                    e
                ))
            })?;

        let mut assets = Vec::new();
        for record in reader.deserialize() {
            let asset: AssetRef = record?;
            assets.push(asset);
        }

        Ok(assets)
    }

    /// Import a snapshot into the assets table, replacing existing rows
    pub fn import_snapshot(db: &SqliteDb, path: &Path) -> Result<usize> {
        let assets = Self::read_snapshot(path)?;
        db.replace_assets(&assets)?;

        info!("Imported {} asset references from {}", assets.len(), path.display());
        Ok(assets.len())
    }

    /// Build the reconciliation lookup from a snapshot (when given) or the
    /// assets table.
    pub fn load_lookup(db: &SqliteDb, snapshot: Option<&Path>) -> Result<AssetLookup> {
        let refs = match snapshot {
            Some(path) => Self::read_snapshot(path)?,
            None => db.load_assets()?,
        };

        let lookup = AssetLookup::build(&refs);
        info!("Asset lookup ready: {} tickers from {} records", lookup.len(), refs.len());

        Ok(lookup)
    }
}
