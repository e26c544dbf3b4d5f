//! Per-asset time series: market cap, price and derived circulating supply.

use super::request::FetchRequest;
use chrono::{DateTime, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// One timestamped sample of an asset series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesRow {
    pub timestamp: DateTime<Utc>,
    pub market_cap: f64,
    pub price: f64,
    pub supply: f64,
}

impl SeriesRow {
    /// True for the sample taken in the midnight hour (UTC).
    pub fn is_midnight(&self) -> bool {
        self.timestamp.hour() == 0
    }

    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}

/// All rows fetched for one request, sorted ascending by timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetSeriesTable {
    pub request: FetchRequest,
    pub rows: Vec<SeriesRow>,
}

impl AssetSeriesTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Midnight-hour rows, at most one per calendar date.
    ///
    /// When a date has several midnight-hour rows the first one in
    /// timestamp order is kept. Output is ascending even if `rows` is not.
    pub fn midnight_rows(&self) -> Vec<SeriesRow> {
        let mut candidates: Vec<SeriesRow> =
            self.rows.iter().filter(|r| r.is_midnight()).copied().collect();
        candidates.sort_by_key(|r| r.timestamp);

        let mut kept: Vec<SeriesRow> = Vec::with_capacity(candidates.len());
        for row in candidates {
            if kept.last().is_some_and(|prev| prev.date() == row.date()) {
                tracing::debug!(
                    asset = %self.request.asset_id,
                    timestamp = %row.timestamp,
                    "dropping duplicate midnight sample"
                );
                continue;
            }
            kept.push(row);
        }
        kept
    }
}
