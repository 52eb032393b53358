//! Asset reference storage
//!
//! Holds the internal asset list the reconciler is built from. Imports
//! replace the whole table inside one transaction; load order preserves
//! import order so the reconciler's first-wins tie-break is stable.

use crate::error::Result;
use crate::reconcile::AssetRef;
use rusqlite::{params, Connection};

/// Replace all asset reference rows (batch insert with transaction)
pub fn replace_all(conn: &mut Connection, assets: &[AssetRef]) -> Result<()> {
    let tx = conn.transaction()?;

    // Clear existing assets
    tx.execute("DELETE FROM assets", [])?;

    let mut stmt = tx.prepare(
        "INSERT INTO assets (asset_id, ticker, clean_ticker) VALUES (?1, ?2, ?3)",
    )?;

    for asset in assets {
        stmt.execute(params![asset.asset_id, asset.ticker, asset.clean_ticker])?;
    }

    drop(stmt);
    tx.commit()?;

    tracing::info!("Stored {} asset references", assets.len());
    Ok(())
}

/// Load all asset references in import order
pub fn load_all(conn: &Connection) -> Result<Vec<AssetRef>> {
    let mut stmt =
        conn.prepare("SELECT asset_id, ticker, clean_ticker FROM assets ORDER BY rowid")?;

    let assets = stmt
        .query_map([], |row| {
            Ok(AssetRef {
                asset_id: row.get(0)?,
                ticker: row.get(1)?,
                clean_ticker: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(assets)
}

/// Get asset count
pub fn count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM assets", [], |row| row.get(0))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        // Match the production connection: asset_id is an advisory link, not a
        // DB-enforced FK (some bundled SQLite builds default foreign_keys ON).
        conn.execute_batch("PRAGMA foreign_keys=OFF;").unwrap();
        crate::db::sqlite::migrations::run_migrations(&conn).unwrap();
        conn
    }

    fn asset(id: i64, ticker: &str) -> AssetRef {
        AssetRef {
            asset_id: id,
            ticker: Some(ticker.to_string()),
            clean_ticker: None,
        }
    }

    #[test]
    fn test_replace_all_and_load() {
        let mut conn = test_conn();

        replace_all(&mut conn, &[asset(1, "AAPL"), asset(2, "MSFT")]).unwrap();
        assert_eq!(count(&conn).unwrap(), 2);

        let loaded = load_all(&conn).unwrap();
        assert_eq!(loaded[0].asset_id, 1);
        assert_eq!(loaded[1].ticker.as_deref(), Some("MSFT"));
    }

    #[test]
    fn test_reimport_replaces_rather_than_duplicates() {
        let mut conn = test_conn();

        replace_all(&mut conn, &[asset(1, "AAPL"), asset(2, "MSFT")]).unwrap();
        replace_all(&mut conn, &[asset(3, "TSLA")]).unwrap();

        let loaded = load_all(&conn).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].asset_id, 3);
    }

    #[test]
    fn test_load_preserves_import_order() {
        let mut conn = test_conn();

        // Import order, not id order, drives the reconciler tie-break.
        replace_all(&mut conn, &[asset(9, "ZZZ"), asset(1, "AAA")]).unwrap();

        let ids: Vec<i64> = load_all(&conn).unwrap().into_iter().map(|a| a.asset_id).collect();
        assert_eq!(ids, vec![9, 1]);
    }
}
