//! Price-feed file format concerns
//!
//! Everything needed to turn a line of a source OHLCV dump into a clean,
//! filterable [`row::PriceRow`]: ticker canonicalization, the date/time
//! grammar of the dumps, and the row decode + filter predicate.

pub mod datetime;
pub mod row;
pub mod ticker;

pub use row::{PriceRow, RowFilter};
pub use ticker::normalize_ticker;
