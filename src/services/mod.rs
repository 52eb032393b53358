//! Services Layer
//!
//! Business logic called by the CLI subcommands. Each pipeline operation is
//! one service so the binary stays a thin argument-parsing shell.
//!
//! # Architecture
//!
//! ```text
//! CLI subcommand --> Service --> feed / reconcile / provider / db
//! ```
//!
//! # Services
//!
//! - `IngestService` - Bulk-load OHLCV dumps (skip-on-duplicate)
//! - `RefreshService` - Incremental per-ticker refresh (upsert)
//! - `ExportService` - CSV and per-ticker JSON exports
//! - `AssetService` - Asset reference import and lookup construction
//! - `StatsService` - Price table reporting

pub mod asset_service;
pub mod export_service;
pub mod ingest_service;
pub mod refresh_service;
pub mod stats_service;

// Re-export commonly used types and services
pub use asset_service::AssetService;
pub use export_service::ExportService;
pub use ingest_service::{IngestOptions, IngestReport, IngestService};
pub use refresh_service::{RefreshOptions, RefreshReport, RefreshService};
pub use stats_service::StatsService;
