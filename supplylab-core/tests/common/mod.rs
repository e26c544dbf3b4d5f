//! Shared fixtures: an in-memory provider and synthetic hourly charts.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use supplylab_core::data::{CatalogEntry, MarketChart, RawSample};
use supplylab_core::{DataError, MarketDataProvider, Window};

pub const HOUR_MS: i64 = 3_600_000;
/// 2024-01-01T00:00:00Z
pub const JAN_1_2024_MS: i64 = 1_704_067_200_000;

/// Provider serving canned charts. Unknown ids are `AssetNotFound`.
#[derive(Default)]
pub struct MockProvider {
    charts: HashMap<String, MarketChart>,
    rate_limited: HashSet<String>,
    catalog: Vec<CatalogEntry>,
    chart_calls: AtomicUsize,
    catalog_calls: AtomicUsize,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chart(mut self, asset_id: &str, chart: MarketChart) -> Self {
        self.charts.insert(asset_id.to_string(), chart);
        self
    }

    pub fn with_rate_limit(mut self, asset_id: &str) -> Self {
        self.rate_limited.insert(asset_id.to_string());
        self
    }

    pub fn with_catalog_entry(mut self, id: &str, symbol: &str, name: &str) -> Self {
        self.catalog.push(CatalogEntry {
            id: id.into(),
            symbol: symbol.into(),
            name: name.into(),
        });
        self
    }

    pub fn chart_calls(&self) -> usize {
        self.chart_calls.load(Ordering::SeqCst)
    }

    pub fn catalog_calls(&self) -> usize {
        self.catalog_calls.load(Ordering::SeqCst)
    }
}

impl MarketDataProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn market_chart(
        &self,
        asset_id: &str,
        _fiat: &str,
        _window: Window,
    ) -> Result<MarketChart, DataError> {
        self.chart_calls.fetch_add(1, Ordering::SeqCst);
        if self.rate_limited.contains(asset_id) {
            return Err(DataError::RateLimited {
                retry_after_secs: Some(60),
            });
        }
        self.charts
            .get(asset_id)
            .cloned()
            .ok_or_else(|| DataError::AssetNotFound {
                asset_id: asset_id.to_string(),
            })
    }

    fn catalog(&self) -> Result<Vec<CatalogEntry>, DataError> {
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.catalog.clone())
    }
}

/// `hours` hourly samples starting at `start_ms`, with supply `base_supply + i`
/// and price `10 + i`.
pub fn hourly_chart(start_ms: i64, hours: usize, base_supply: f64) -> MarketChart {
    let mut chart = MarketChart::default();
    for i in 0..hours {
        let ts = start_ms + i as i64 * HOUR_MS;
        let price = 10.0 + i as f64;
        let supply = base_supply + i as f64;
        chart.prices.push(RawSample::new(ts, price));
        chart.market_caps.push(RawSample::new(ts, supply * price));
    }
    chart
}
