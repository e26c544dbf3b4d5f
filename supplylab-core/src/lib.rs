//! SupplyLab Core: market-chart fetching, CSV persistence and supply combining.
//!
//! This crate contains the whole pipeline:
//! - Domain types (fetch requests, windows, series tables, combined table)
//! - Provider trait with a CoinGecko implementation
//! - Series fetcher with timestamp alignment and supply derivation
//! - Batch fetch driver, sequential or on a bounded worker pool
//! - Symbol → asset id resolution against the provider catalog
//! - Combiner producing a date-indexed supply table

pub mod config;
pub mod data;
pub mod domain;

pub use config::SupplyConfig;
pub use data::{
    combine, fetch_all, fetch_series, resolve_ids, BatchSummary, CoinGeckoProvider, DataError,
    ErrorKind, FetchMode, MarketDataProvider, SeriesStore,
};
pub use domain::{AssetSeriesTable, CombinedTable, FetchRequest, SeriesRow, Window, MISSING_SUPPLY};
