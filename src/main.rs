//! ohlcv-loader binary
//!
//! Thin argument-parsing shell over the service layer; one subcommand per
//! pipeline operation. Setup failures (bad flags, unreadable reference
//! data, database open errors) abort with a non-zero exit; everything
//! past setup is contained per row/file/ticker by the services.

use anyhow::Result;
use clap::{Parser, Subcommand};
use ohlcv_loader::db::SqliteDb;
use ohlcv_loader::provider::StooqProvider;
use ohlcv_loader::services::{
    AssetService, ExportService, IngestOptions, IngestService, RefreshOptions, RefreshService,
    StatsService,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(author, version, about = "OHLCV ingestion and export toolkit")]
struct Cli {
    /// SQLite database path
    #[arg(long, global = true, default_value = "prices.db")]
    db: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bulk-load OHLCV dump files into the price table
    Ingest {
        /// Root directory searched (recursively) for .csv/.txt dumps
        #[arg(long)]
        root: PathBuf,

        /// Discard rows older than this many days
        #[arg(long)]
        lookback_days: Option<i64>,

        /// Period code to keep
        #[arg(long, default_value = "D")]
        period: String,

        /// Concurrent file workers (capped at 16)
        #[arg(long, default_value = "4")]
        workers: usize,

        /// Rows per insert chunk
        #[arg(long, default_value = "1000")]
        chunk_size: usize,

        /// Parse and filter without inserting
        #[arg(long)]
        dry_run: bool,

        /// Skip files and rows whose ticker has no asset reference
        #[arg(long)]
        known_only: bool,

        /// Asset snapshot CSV used instead of the assets table
        #[arg(long)]
        assets_csv: Option<PathBuf>,
    },

    /// Refresh tickers from the remote daily price source
    Refresh {
        /// Tickers to refresh; defaults to every known asset
        tickers: Vec<String>,

        /// Seconds to pause between tickers
        #[arg(long, default_value = "2")]
        delay_secs: u64,

        /// Asset snapshot CSV used instead of the assets table
        #[arg(long)]
        assets_csv: Option<PathBuf>,

        /// Override the price provider base URL
        #[arg(long)]
        provider_url: Option<String>,
    },

    /// Export stored prices
    Export {
        #[command(subcommand)]
        format: ExportFormat,
    },

    /// Manage the asset reference table
    Assets {
        #[command(subcommand)]
        action: AssetsAction,
    },

    /// Show price table statistics
    Stats {
        /// Include a per-ticker breakdown
        #[arg(long)]
        by_ticker: bool,
    },
}

#[derive(Subcommand)]
enum ExportFormat {
    /// Full-table CSV with the fixed importer header
    Csv {
        /// Output file path
        #[arg(long)]
        out: PathBuf,

        /// Append rows without a header instead of overwriting
        #[arg(long)]
        append: bool,
    },

    /// One JSON array file per ticker
    Json {
        /// Output directory
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum AssetsAction {
    /// Import a snapshot CSV (asset_id,ticker,clean_ticker), replacing the table
    Import {
        /// Snapshot path
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ohlcv_loader=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let db = Arc::new(SqliteDb::new(&cli.db)?);

    // On interrupt, exit without awaiting in-flight chunks: committed work
    // survives and a re-run is a no-op for already-stored rows.
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted; exiting. Re-run to pick up unfinished files");
            std::process::exit(130);
        }
    });

    match cli.command {
        Commands::Ingest {
            root,
            lookback_days,
            period,
            workers,
            chunk_size,
            dry_run,
            known_only,
            assets_csv,
        } => {
            let lookup = AssetService::load_lookup(&db, assets_csv.as_deref())?;
            let report = IngestService::run(
                Arc::clone(&db),
                Arc::new(lookup),
                IngestOptions {
                    root,
                    lookback_days,
                    period: Some(period),
                    workers,
                    chunk_size,
                    dry_run,
                    known_only,
                },
            )
            .await?;

            println!(
                "{} files ({} skipped, {} failed), {} candidates, {} inserted, {} duplicates skipped",
                report.files,
                report.files_skipped,
                report.files_failed,
                report.candidates,
                report.inserted,
                report.skipped,
            );
        }

        Commands::Refresh {
            tickers,
            delay_secs,
            assets_csv,
            provider_url,
        } => {
            let lookup = AssetService::load_lookup(&db, assets_csv.as_deref())?;
            let provider = match provider_url {
                Some(url) => StooqProvider::with_base_url(url),
                None => StooqProvider::new(),
            };

            let report = RefreshService::run(
                &db,
                &lookup,
                &provider,
                RefreshOptions {
                    tickers,
                    delay: Duration::from_secs(delay_secs),
                },
            )
            .await?;

            println!(
                "{} tickers ({} failed), {} bars upserted",
                report.tickers, report.tickers_failed, report.upserted,
            );
        }

        Commands::Export { format } => match format {
            ExportFormat::Csv { out, append } => {
                let rows = ExportService::export_csv(&db, &out, append)?;
                println!("{} rows exported to {}", rows, out.display());
            }
            ExportFormat::Json { out } => {
                let files = ExportService::export_json(&db, &out)?;
                println!("{} ticker files exported to {}", files, out.display());
            }
        },

        Commands::Assets { action } => match action {
            AssetsAction::Import { path } => {
                let count = AssetService::import_snapshot(&db, &path)?;
                println!("{} asset references imported", count);
            }
        },

        Commands::Stats { by_ticker } => {
            print!("{}", StatsService::render(&db, by_ticker)?);
        }
    }

    Ok(())
}
