//! Stooq daily-history provider
//!
//! Downloads `Date,Open,High,Low,Close,Volume` CSV from the stooq quote
//! endpoint. Tickers are requested with the `.us` market marker, mirroring
//! the filenames of the bulk dumps.

use crate::error::{AppError, Result};
use crate::feed::datetime::parse_date;
use crate::provider::{DailyBar, PriceProvider};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;

const BASE_URL: &str = "https://stooq.com";

/// Stooq CSV download provider
pub struct StooqProvider {
    client: Client,
    base_url: String,
}

impl StooqProvider {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    /// Point the provider at a different host (used by tests)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.into(),
        }
    }

    fn history_url(&self, ticker: &str, from: Option<NaiveDate>) -> String {
        let symbol = format!("{}.us", ticker.to_ascii_lowercase());
        let mut url = format!("{}/q/d/l/?s={}&i=d", self.base_url, symbol);

        if let Some(from) = from {
            url.push_str(&format!("&d1={}", from.format("%Y%m%d")));
        }

        url
    }
}

impl Default for StooqProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceProvider for StooqProvider {
    fn id(&self) -> &'static str {
        "stooq"
    }

    async fn fetch_daily(&self, ticker: &str, from: Option<NaiveDate>) -> Result<Vec<DailyBar>> {
        let url = self.history_url(ticker, from);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(AppError::Provider(format!(
                "History request for {} failed with status {}",
                ticker,
                response.status()
            )));
        }

        let body = response.text().await?;
        Ok(parse_history_csv(&body, from))
    }
}

/// Decode a history CSV body into bars strictly after `from`, ascending.
///
/// Malformed lines (including the header and the literal "No data" body)
/// are skipped, matching the tolerant decode of the bulk path.
fn parse_history_csv(body: &str, from: Option<NaiveDate>) -> Vec<DailyBar> {
    let mut bars: Vec<DailyBar> = body
        .lines()
        .filter_map(parse_history_line)
        .filter(|bar| from.map(|from| bar.date > from).unwrap_or(true))
        .collect();

    bars.sort_by_key(|bar| bar.date);
    bars
}

fn parse_history_line(line: &str) -> Option<DailyBar> {
    let fields: Vec<&str> = line.trim().split(',').collect();
    if fields.len() < 5 {
        return None;
    }

    let date = parse_date(fields[0])?;
    let open = parse_finite(fields[1])?;
    let high = parse_finite(fields[2])?;
    let low = parse_finite(fields[3])?;
    let close = parse_finite(fields[4])?;

    // Volume is absent for some instruments; treat it as zero.
    let volume = fields
        .get(5)
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|v| *v >= 0)
        .unwrap_or(0);

    Some(DailyBar {
        date,
        open,
        high,
        low,
        close,
        volume,
    })
}

fn parse_finite(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = "Date,Open,High,Low,Close,Volume\n\
        2024-01-03,186.0,187.0,185.0,186.5,900000\n\
        2024-01-02,185.0,186.5,184.0,186.0,1000000\n\
        No data\n";

    #[test]
    fn test_parse_history_skips_header_and_junk() {
        let bars = parse_history_csv(BODY, None);
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(bars[1].close, 186.5);
    }

    #[test]
    fn test_parse_history_filters_strictly_after_from() {
        let from = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let bars = parse_history_csv(BODY, Some(from));
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
    }

    #[test]
    fn test_parse_history_missing_volume_defaults_to_zero() {
        let bars = parse_history_csv("2024-01-02,1.0,2.0,0.5,1.5", None);
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].volume, 0);
    }

    #[test]
    fn test_history_url_shape() {
        let provider = StooqProvider::with_base_url("http://localhost:1234");
        let from = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();

        assert_eq!(
            provider.history_url("AAPL", Some(from)),
            "http://localhost:1234/q/d/l/?s=aapl.us&i=d&d1=20240102"
        );
        assert_eq!(
            provider.history_url("MSFT", None),
            "http://localhost:1234/q/d/l/?s=msft.us&i=d"
        );
    }
}
