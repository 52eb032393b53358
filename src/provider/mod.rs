//! Remote daily-price providers
//!
//! The incremental refresh path fetches per-ticker history from an external
//! HTTP source. Providers implement one trait so the service layer stays
//! source-agnostic; the only shipped implementation speaks the stooq-style
//! CSV download endpoint that matches the bulk dump format.

pub mod stooq;

use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

pub use stooq::StooqProvider;

/// One daily bar as returned by a provider
#[derive(Debug, Clone)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// Daily history source for the incremental refresh path
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Provider ID (e.g., "stooq")
    fn id(&self) -> &'static str;

    /// Fetch daily bars for a canonical ticker, strictly after `from` when
    /// set, ascending by date.
    async fn fetch_daily(&self, ticker: &str, from: Option<NaiveDate>) -> Result<Vec<DailyBar>>;
}
