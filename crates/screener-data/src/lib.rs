//! Market data sources, caching and symbol universes.
//!
//! [`FmpClient`] talks to the REST provider, [`CachedSource`] puts a
//! date-stamped file cache in front of any [`MarketDataSource`] and
//! [`InMemorySource`] serves preloaded records for offline runs.
//!
//! [`MarketDataSource`]: screener_core::traits::MarketDataSource

mod article;
mod cache;
mod cached;
mod csv_source;
mod fmp;
mod index;
mod memory;
mod throttle;
mod universe;

pub use article::{extract_paragraph_text, ArticleFetcher};
pub use cache::FileCache;
pub use cached::{CacheIntervals, CachedSource};
pub use csv_source::{load_price_file, CsvPriceSource};
pub use fmp::{FmpClient, FmpConfig, DEFAULT_BASE_URL, DEFAULT_CALLS_PER_MINUTE};
pub use index::{parse_constituents, IndexConstituentsLoader, MarketIndex};
pub use memory::InMemorySource;
pub use throttle::Throttle;
pub use universe::{symbols_of, UniverseSelector};

use screener_core::error::DataError;
use screener_core::types::PriceHistory;
use std::path::Path;

/// Load a price history from a CSV file.
pub fn load_price_csv(path: impl AsRef<Path>, symbol: &str) -> Result<PriceHistory, DataError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DataError::NoDataAvailable);
    }
    load_price_file(path, symbol)
}
