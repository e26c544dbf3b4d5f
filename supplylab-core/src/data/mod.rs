//! Data acquisition, persistence and combining

pub mod coingecko;
pub mod combine;
pub mod download;
pub mod provider;
pub mod resolve;
pub mod series;
pub mod store;
pub mod symbols;

pub use coingecko::CoinGeckoProvider;
pub use combine::{combine, combine_tables};
pub use download::{fetch_all, BatchSummary, FetchMode, FetchOutcome};
pub use provider::{
    CatalogEntry, DataError, DownloadProgress, ErrorKind, MarketChart, MarketDataProvider,
    RawSample, SilentProgress, StdoutProgress,
};
pub use resolve::{resolve_ids, resolve_in_catalog};
pub use series::{build_series, fetch_series};
pub use store::SeriesStore;
pub use symbols::{load_symbols, parse_symbols};
