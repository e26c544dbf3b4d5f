//! CoinGecko data provider.
//!
//! Fetches market-cap and price history from the v3 `coins/{id}/market_chart`
//! endpoint and the asset catalog from `coins/list`. No retries: a 429 is
//! reported as `RateLimited` and left to the caller.

use super::provider::{CatalogEntry, DataError, MarketChart, MarketDataProvider, RawSample};
use crate::domain::Window;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// CoinGecko `market_chart` response. Entries are `[unix_ms, value]`.
#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    #[serde(default)]
    prices: Vec<(f64, Option<f64>)>,
    #[serde(default)]
    market_caps: Vec<(f64, Option<f64>)>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// CoinGecko data provider.
pub struct CoinGeckoProvider {
    client: reqwest::blocking::Client,
    base: Url,
}

impl CoinGeckoProvider {
    /// Create a provider against `base_url`, with `timeout` as the
    /// per-request deadline.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DataError> {
        let mut base = Url::parse(base_url)
            .map_err(|e| DataError::Config(format!("invalid API base URL '{base_url}': {e}")))?;
        // Url::join replaces the last segment unless the path ends in '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("supplylab/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DataError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, base })
    }

    /// Build the market-chart URL for an asset. The id is pushed as a single
    /// percent-encoded path segment.
    fn market_chart_url(&self, asset_id: &str, fiat: &str, window: Window) -> Result<Url, DataError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| DataError::Config(format!("API base URL '{}' cannot take a path", self.base)))?
            .pop_if_empty()
            .extend(["coins", asset_id, "market_chart"]);
        url.query_pairs_mut()
            .append_pair("vs_currency", fiat)
            .append_pair("days", &window.to_string());
        Ok(url)
    }

    fn catalog_url(&self) -> Result<Url, DataError> {
        self.base
            .join("coins/list")
            .map_err(|e| DataError::Config(format!("invalid catalog URL: {e}")))
    }

    /// Send a GET and return the body of a successful response.
    ///
    /// `asset_id` is used to classify a 404.
    fn get(&self, url: Url, asset_id: Option<&str>) -> Result<String, DataError> {
        tracing::debug!(%url, "GET");
        let resp = self
            .client
            .get(url.clone())
            .header("accept", "application/json")
            .send()
            .map_err(|e| DataError::NetworkUnreachable(format!("{url}: {e}")))?;

        let status = resp.status();
        let retry_after = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = resp
            .text()
            .map_err(|e| DataError::NetworkUnreachable(format!("reading body of {url}: {e}")))?;

        classify_response(&url, status, retry_after.as_deref(), asset_id, &body)?;
        Ok(body)
    }
}

impl MarketDataProvider for CoinGeckoProvider {
    fn name(&self) -> &str {
        "coingecko"
    }

    fn market_chart(
        &self,
        asset_id: &str,
        fiat: &str,
        window: Window,
    ) -> Result<MarketChart, DataError> {
        let url = self.market_chart_url(asset_id, fiat, window)?;
        let body = self.get(url, Some(asset_id))?;
        parse_market_chart(asset_id, &body)
    }

    fn catalog(&self) -> Result<Vec<CatalogEntry>, DataError> {
        let url = self.catalog_url()?;
        let body = self.get(url, None)?;
        parse_catalog(&body)
    }
}

/// Map a non-success HTTP status to its error. `Ok` for 2xx.
///
/// `asset_id` is `None` for catalog requests, where a 404 means the endpoint
/// itself moved rather than an unknown asset.
pub(crate) fn classify_response(
    url: &Url,
    status: StatusCode,
    retry_after: Option<&str>,
    asset_id: Option<&str>,
    body: &str,
) -> Result<(), DataError> {
    if status.is_success() {
        return Ok(());
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = retry_after.and_then(|v| v.trim().parse::<u64>().ok());
        return Err(DataError::RateLimited { retry_after_secs });
    }

    if status == StatusCode::NOT_FOUND {
        return Err(match asset_id {
            Some(id) => DataError::AssetNotFound {
                asset_id: id.to_string(),
            },
            None => DataError::ResponseFormatChanged(format!("HTTP 404 for {url}")),
        });
    }

    if status.is_server_error() {
        return Err(DataError::NetworkUnreachable(format!("HTTP {status} for {url}")));
    }

    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_else(|| body.chars().take(200).collect());
    Err(DataError::ResponseFormatChanged(format!("HTTP {status}: {detail}")))
}

/// Parse a `market_chart` body into the two sample streams.
pub(crate) fn parse_market_chart(asset_id: &str, body: &str) -> Result<MarketChart, DataError> {
    let resp: MarketChartResponse = serde_json::from_str(body).map_err(|e| {
        DataError::ResponseFormatChanged(format!("failed to parse market chart for {asset_id}: {e}"))
    })?;

    if let Some(msg) = resp.error {
        if msg.contains("not found") {
            return Err(DataError::AssetNotFound {
                asset_id: asset_id.to_string(),
            });
        }
        return Err(DataError::ResponseFormatChanged(msg));
    }

    Ok(MarketChart {
        market_caps: to_samples(asset_id, "market_caps", resp.market_caps)?,
        prices: to_samples(asset_id, "prices", resp.prices)?,
    })
}

fn to_samples(
    asset_id: &str,
    stream: &str,
    entries: Vec<(f64, Option<f64>)>,
) -> Result<Vec<RawSample>, DataError> {
    entries
        .into_iter()
        .map(|(ts, value)| {
            if !ts.is_finite() {
                return Err(DataError::ResponseFormatChanged(format!(
                    "{asset_id}: non-finite timestamp in {stream}"
                )));
            }
            let unix_ms = ts.round() as i64;
            let value = value.ok_or_else(|| {
                DataError::ResponseFormatChanged(format!(
                    "{asset_id}: null {stream} value at unix ms {unix_ms}"
                ))
            })?;
            Ok(RawSample { unix_ms, value })
        })
        .collect()
}

/// Parse a `coins/list` body.
pub(crate) fn parse_catalog(body: &str) -> Result<Vec<CatalogEntry>, DataError> {
    serde_json::from_str(body)
        .map_err(|e| DataError::ResponseFormatChanged(format!("failed to parse coin list: {e}")))
}
