//! Series fetcher: market chart → aligned market-cap/price/supply table.
//!
//! The two streams are joined on their millisecond timestamps rather than on
//! position. Each timestamp is converted once, from the market-cap stream.

use super::provider::{DataError, MarketChart, MarketDataProvider, RawSample};
use crate::domain::{AssetSeriesTable, FetchRequest, SeriesRow};
use chrono::DateTime;
use std::collections::HashMap;

/// Fetch one request from the provider and build its series table.
pub fn fetch_series(
    provider: &dyn MarketDataProvider,
    request: &FetchRequest,
) -> Result<AssetSeriesTable, DataError> {
    let chart = provider.market_chart(&request.asset_id, &request.fiat, request.window)?;
    let table = build_series(request, chart)?;
    tracing::debug!(
        asset = %request.asset_id,
        provider = provider.name(),
        rows = table.len(),
        "series built"
    );
    Ok(table)
}

/// Align the two streams of `chart` and derive supply.
pub fn build_series(request: &FetchRequest, chart: MarketChart) -> Result<AssetSeriesTable, DataError> {
    let asset_id = request.asset_id.as_str();
    let MarketChart {
        market_caps,
        prices,
    } = chart;

    if market_caps.is_empty() && prices.is_empty() {
        return Err(DataError::AssetNotFound {
            asset_id: asset_id.to_string(),
        });
    }

    if market_caps.len() != prices.len() {
        return Err(DataError::LengthMismatch {
            asset_id: asset_id.to_string(),
            market_caps: market_caps.len(),
            prices: prices.len(),
        });
    }

    let price_by_ts = index_by_timestamp(asset_id, "price", &prices)?;
    // Equal lengths and unique timestamps on both sides make the join one-to-one.
    index_by_timestamp(asset_id, "market_cap", &market_caps)?;

    let mut rows = Vec::with_capacity(market_caps.len());
    for cap in &market_caps {
        let price = *price_by_ts
            .get(&cap.unix_ms)
            .ok_or_else(|| DataError::UnmatchedTimestamp {
                asset_id: asset_id.to_string(),
                unix_ms: cap.unix_ms,
            })?;

        let timestamp =
            DateTime::from_timestamp_millis(cap.unix_ms).ok_or_else(|| DataError::InvalidTimestamp {
                asset_id: asset_id.to_string(),
                unix_ms: cap.unix_ms,
            })?;

        if price == 0.0 {
            return Err(DataError::ZeroPrice {
                asset_id: asset_id.to_string(),
                unix_ms: cap.unix_ms,
            });
        }
        let supply = cap.value / price;
        if !supply.is_finite() {
            return Err(DataError::NonFiniteSupply {
                asset_id: asset_id.to_string(),
                unix_ms: cap.unix_ms,
                market_cap: cap.value,
                price,
            });
        }

        rows.push(SeriesRow {
            timestamp,
            market_cap: cap.value,
            price,
            supply,
        });
    }

    rows.sort_by_key(|r| r.timestamp);

    Ok(AssetSeriesTable {
        request: request.clone(),
        rows,
    })
}

fn index_by_timestamp(
    asset_id: &str,
    stream: &'static str,
    samples: &[RawSample],
) -> Result<HashMap<i64, f64>, DataError> {
    let mut map = HashMap::with_capacity(samples.len());
    for s in samples {
        if map.insert(s.unix_ms, s.value).is_some() {
            return Err(DataError::DuplicateTimestamp {
                asset_id: asset_id.to_string(),
                stream,
                unix_ms: s.unix_ms,
            });
        }
    }
    Ok(map)
}
