//! Ticker canonicalization
//!
//! Source dumps name securities with an exchange marker appended
//! (`aapl.us`, `msft.us`). The canonical form used everywhere downstream
//! is trimmed, uppercased, and stripped of that marker. An empty result
//! means "no ticker" and must never be matched against a lookup key.

/// Exchange suffixes recognized on incoming tickers
const EXCHANGE_SUFFIXES: &[&str] = &[".US"];

/// Canonicalize a raw ticker string.
///
/// Trims whitespace, uppercases, and strips a known exchange suffix.
/// Empty input yields an empty string. Idempotent.
pub fn normalize_ticker(raw: &str) -> String {
    let mut ticker = raw.trim().to_ascii_uppercase();

    for suffix in EXCHANGE_SUFFIXES {
        if ticker.len() > suffix.len() && ticker.ends_with(suffix) {
            ticker.truncate(ticker.len() - suffix.len());
            break;
        }
    }

    ticker
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_exchange_suffix() {
        assert_eq!(normalize_ticker("AAPL.US"), "AAPL");
        assert_eq!(normalize_ticker("aapl.us"), "AAPL");
        assert_eq!(normalize_ticker("BRK-A.US"), "BRK-A");
    }

    #[test]
    fn test_trims_and_uppercases() {
        assert_eq!(normalize_ticker("  msft "), "MSFT");
        assert_eq!(normalize_ticker("tsla"), "TSLA");
    }

    #[test]
    fn test_plain_ticker_unchanged() {
        assert_eq!(normalize_ticker("GOOG"), "GOOG");
    }

    #[test]
    fn test_empty_and_whitespace_input() {
        assert_eq!(normalize_ticker(""), "");
        assert_eq!(normalize_ticker("   "), "");
    }

    #[test]
    fn test_bare_suffix_not_stripped_to_empty() {
        // A "ticker" that is nothing but the marker stays as-is rather than
        // collapsing to the empty (no-ticker) sentinel.
        assert_eq!(normalize_ticker(".US"), ".US");
    }

    #[test]
    fn test_idempotent() {
        for raw in ["AAPL.US", " aapl.us ", "msft", "BRK-A.US", "", ".US"] {
            let once = normalize_ticker(raw);
            assert_eq!(normalize_ticker(&once), once, "failed for '{}'", raw);
        }
    }
}
