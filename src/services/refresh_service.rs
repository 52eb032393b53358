//! Refresh Service
//!
//! Incremental per-ticker refresh: fetch daily bars newer than the latest
//! stored date from the price provider and upsert them one by one. This is
//! the overwrite-on-conflict counterpart to the bulk loader's
//! skip-on-duplicate path; the two share the (ticker, date) contract but
//! are deliberately separate operations.
//!
//! A fixed delay between tickers respects the provider rate limit; it is a
//! scheduling pause, not a failure condition.

use crate::db::sqlite::models::PricePoint;
use crate::db::SqliteDb;
use crate::error::Result;
use crate::feed::normalize_ticker;
use crate::provider::PriceProvider;
use crate::reconcile::AssetLookup;
use std::time::Duration;
use tracing::{info, warn};

/// Incremental refresh configuration
#[derive(Debug, Clone)]
pub struct RefreshOptions {
    /// Tickers to refresh; empty means every ticker in the asset lookup
    pub tickers: Vec<String>,
    /// Pause between tickers
    pub delay: Duration,
}

/// Refresh run totals
#[derive(Debug, Default)]
pub struct RefreshReport {
    pub tickers: usize,
    pub tickers_failed: usize,
    pub upserted: u64,
}

/// Per-ticker incremental price refresh
pub struct RefreshService;

impl RefreshService {
    /// Refresh each ticker in turn and return the run totals.
    pub async fn run(
        db: &SqliteDb,
        lookup: &AssetLookup,
        provider: &dyn PriceProvider,
        options: RefreshOptions,
    ) -> Result<RefreshReport> {
        let tickers: Vec<String> = if options.tickers.is_empty() {
            lookup.tickers()
        } else {
            options
                .tickers
                .iter()
                .map(|t| normalize_ticker(t))
                .filter(|t| !t.is_empty())
                .collect()
        };

        info!("Refreshing {} tickers via {}", tickers.len(), provider.id());

        let mut report = RefreshReport {
            tickers: tickers.len(),
            ..Default::default()
        };

        for (index, ticker) in tickers.iter().enumerate() {
            match refresh_ticker(db, lookup, provider, ticker).await {
                Ok(upserted) => {
                    info!("{}: {} bars upserted", ticker, upserted);
                    report.upserted += upserted;
                }
                Err(e) => {
                    // Contained at the ticker boundary; the run continues.
                    warn!("{}: refresh failed: {}", ticker, e);
                    report.tickers_failed += 1;
                }
            }

            if index + 1 < tickers.len() && !options.delay.is_zero() {
                tokio::time::sleep(options.delay).await;
            }
        }

        info!(
            "Refresh complete: {} tickers ({} failed), {} bars upserted",
            report.tickers, report.tickers_failed, report.upserted,
        );

        Ok(report)
    }
}

async fn refresh_ticker(
    db: &SqliteDb,
    lookup: &AssetLookup,
    provider: &dyn PriceProvider,
    ticker: &str,
) -> Result<u64> {
    let latest = db.latest_price_date(ticker)?;
    let bars = provider.fetch_daily(ticker, latest).await?;

    let asset_id = lookup.resolve(ticker);
    let mut upserted = 0;

    for bar in bars {
        db.upsert_price(&PricePoint {
            asset_id,
            ticker: ticker.to_string(),
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        })?;
        upserted += 1;
    }

    Ok(upserted)
}
