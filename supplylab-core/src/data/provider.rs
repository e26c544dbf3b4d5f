//! Market-data provider trait and structured error types.
//!
//! The MarketDataProvider trait abstracts over the upstream source (CoinGecko
//! today) so the fetcher, resolver and batch driver can be exercised against
//! an in-memory mock in tests.

use crate::domain::{FetchRequest, Window};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// One `(unix_timestamp_ms, value)` sample as delivered by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub unix_ms: i64,
    pub value: f64,
}

impl RawSample {
    pub fn new(unix_ms: i64, value: f64) -> Self {
        Self { unix_ms, value }
    }
}

/// The two parallel streams returned for an asset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketChart {
    pub market_caps: Vec<RawSample>,
    pub prices: Vec<RawSample>,
}

/// One entry of the provider's asset catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub symbol: String,
    pub name: String,
}

/// Coarse classification of a [`DataError`], so callers can decide
/// whether a failure is worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Transient,
    DataIntegrity,
    Config,
    Storage,
}

/// Structured error types for data operations.
///
/// These are designed to be displayable in CLI output and batch summaries.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("asset not found: {asset_id}")]
    AssetNotFound { asset_id: String },

    #[error("no stored series at {}; run `fetch` for it first", .path.display())]
    StorageNotFound { path: PathBuf },

    #[error("rate limited by provider{}", retry_after_hint(.retry_after_secs))]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("{asset_id}: {market_caps} market-cap samples but {prices} price samples")]
    LengthMismatch {
        asset_id: String,
        market_caps: usize,
        prices: usize,
    },

    #[error("{asset_id}: duplicate {stream} sample at unix ms {unix_ms}")]
    DuplicateTimestamp {
        asset_id: String,
        stream: &'static str,
        unix_ms: i64,
    },

    #[error("{asset_id}: market-cap sample at unix ms {unix_ms} has no matching price sample")]
    UnmatchedTimestamp { asset_id: String, unix_ms: i64 },

    #[error("{asset_id}: timestamp {unix_ms} ms is out of range")]
    InvalidTimestamp { asset_id: String, unix_ms: i64 },

    #[error("{asset_id}: price is zero at unix ms {unix_ms}, supply is undefined")]
    ZeroPrice { asset_id: String, unix_ms: i64 },

    #[error("{asset_id}: market cap {market_cap} / price {price} at unix ms {unix_ms} is not a finite supply")]
    NonFiniteSupply {
        asset_id: String,
        unix_ms: i64,
        market_cap: f64,
        price: f64,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

fn retry_after_hint(secs: &Option<u64>) -> String {
    secs.map(|s| format!(" (retry after {s}s)")).unwrap_or_default()
}

impl DataError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DataError::AssetNotFound { .. } | DataError::StorageNotFound { .. } => {
                ErrorKind::NotFound
            }
            DataError::RateLimited { .. } | DataError::NetworkUnreachable(_) => {
                ErrorKind::Transient
            }
            DataError::ResponseFormatChanged(_)
            | DataError::LengthMismatch { .. }
            | DataError::DuplicateTimestamp { .. }
            | DataError::UnmatchedTimestamp { .. }
            | DataError::InvalidTimestamp { .. }
            | DataError::ZeroPrice { .. }
            | DataError::NonFiniteSupply { .. } => ErrorKind::DataIntegrity,
            DataError::Config(_) => ErrorKind::Config,
            DataError::StorageError(_) => ErrorKind::Storage,
        }
    }

    /// Whether a caller could reasonably try the same request again later.
    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}

/// Trait for market-data sources.
///
/// Implementations handle the specifics of talking to one upstream API.
/// Persistence sits above this trait; providers don't know about the store.
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch the market-cap and price streams for an asset.
    fn market_chart(
        &self,
        asset_id: &str,
        fiat: &str,
        window: Window,
    ) -> Result<MarketChart, DataError>;

    /// Fetch the full `(id, symbol, name)` catalog.
    fn catalog(&self) -> Result<Vec<CatalogEntry>, DataError>;
}

/// Progress callback for multi-request operations.
///
/// Called from worker threads in parallel mode, hence `Sync`.
pub trait DownloadProgress: Send + Sync {
    /// Called when starting to fetch a request.
    fn on_start(&self, request: &FetchRequest, index: usize, total: usize);

    /// Called when a request completes (fetched and persisted, or failed).
    fn on_complete(
        &self,
        request: &FetchRequest,
        index: usize,
        total: usize,
        result: &Result<PathBuf, DataError>,
    );

    /// Called when the entire batch is done.
    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize);
}

/// Simple progress reporter that prints to stdout.
pub struct StdoutProgress;

impl DownloadProgress for StdoutProgress {
    fn on_start(&self, request: &FetchRequest, index: usize, total: usize) {
        println!("[{}/{}] Fetching {request}...", index + 1, total);
    }

    fn on_complete(
        &self,
        request: &FetchRequest,
        _index: usize,
        _total: usize,
        result: &Result<PathBuf, DataError>,
    ) {
        match result {
            Ok(path) => println!("  OK: {} -> {}", request.asset_id, path.display()),
            Err(e) => println!("  FAIL: {}: {e}", request.asset_id),
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        println!("\nFetch complete: {succeeded}/{total} succeeded, {failed} failed");
    }
}

/// Progress reporter that prints nothing.
pub struct SilentProgress;

impl DownloadProgress for SilentProgress {
    fn on_start(&self, _request: &FetchRequest, _index: usize, _total: usize) {}

    fn on_complete(
        &self,
        _request: &FetchRequest,
        _index: usize,
        _total: usize,
        _result: &Result<PathBuf, DataError>,
    ) {
    }

    fn on_batch_complete(&self, _succeeded: usize, _failed: usize, _total: usize) {}
}
