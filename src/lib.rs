//! OHLCV Loader
//!
//! Offline tooling that keeps the trading-transparency database's price
//! history current: bulk ingestion of OHLCV dump files, incremental
//! per-ticker refresh from a remote daily source, and CSV / per-ticker
//! JSON exports of the stored series.

pub mod db;
pub mod error;
pub mod feed;
pub mod provider;
pub mod reconcile;
pub mod services;

pub use db::SqliteDb;
pub use error::{AppError, Result};
