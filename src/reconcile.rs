//! Ticker-to-asset reconciliation
//!
//! The web application keys everything on internal asset ids; source dumps
//! and remote feeds only know tickers. The lookup built here maps canonical
//! tickers to asset ids using both the primary and the alternate "clean"
//! ticker of each reference record. On collision the first-encountered
//! record wins and later ones are silently dropped.

use std::collections::HashMap;

use serde::Deserialize;

use crate::feed::normalize_ticker;

/// One asset reference record, as loaded from the assets table or snapshot
#[derive(Debug, Clone, Deserialize)]
pub struct AssetRef {
    pub asset_id: i64,
    pub ticker: Option<String>,
    pub clean_ticker: Option<String>,
}

/// Read-only canonical-ticker → asset-id lookup
#[derive(Debug, Default)]
pub struct AssetLookup {
    map: HashMap<String, i64>,
}

impl AssetLookup {
    /// Build the lookup from reference records, in order. First wins.
    pub fn build(refs: &[AssetRef]) -> Self {
        let mut map = HashMap::new();

        for asset in refs {
            for raw in [asset.ticker.as_deref(), asset.clean_ticker.as_deref()]
                .into_iter()
                .flatten()
            {
                let key = normalize_ticker(raw);
                if key.is_empty() {
                    continue;
                }
                map.entry(key).or_insert(asset.asset_id);
            }
        }

        Self { map }
    }

    /// Resolve a canonical ticker to an asset id. Empty input never matches.
    pub fn resolve(&self, ticker: &str) -> Option<i64> {
        if ticker.is_empty() {
            return None;
        }
        self.map.get(ticker).copied()
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.resolve(ticker).is_some()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// All canonical tickers in the lookup, alphabetically
    pub fn tickers(&self) -> Vec<String> {
        let mut tickers: Vec<String> = self.map.keys().cloned().collect();
        tickers.sort();
        tickers
    }
}
