//! Multi-asset supply combining on a calendar-date index.
//!
//! Each asset contributes its midnight-hour samples (one per date, first
//! observed wins). The date index is the union over all assets; a date an
//! asset has no sample for gets `MISSING_SUPPLY`.

use super::provider::DataError;
use super::store::SeriesStore;
use crate::domain::{AssetSeriesTable, CombinedTable, FetchRequest, MISSING_SUPPLY};
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Load every requested series from the store, combine, and persist the result.
pub fn combine(store: &SeriesStore, requests: &[FetchRequest]) -> Result<CombinedTable, DataError> {
    let tables = requests
        .iter()
        .map(|r| store.load(r))
        .collect::<Result<Vec<_>, _>>()?;

    let combined = combine_tables(&tables)?;
    let path = store.write_combined(&combined)?;
    tracing::info!(
        assets = combined.asset_ids.len(),
        dates = combined.row_count(),
        path = %path.display(),
        "combined table written"
    );
    Ok(combined)
}

/// Combine already-loaded tables. Columns follow the order of `tables`.
pub fn combine_tables(tables: &[AssetSeriesTable]) -> Result<CombinedTable, DataError> {
    let mut seen = HashSet::new();
    for table in tables {
        if !seen.insert(table.request.asset_id.as_str()) {
            return Err(DataError::Config(format!(
                "asset '{}' requested more than once; combined columns are keyed by asset id",
                table.request.asset_id
            )));
        }
    }

    // Per asset: date → supply at the midnight sample
    let per_asset: Vec<HashMap<NaiveDate, f64>> = tables
        .iter()
        .map(|t| t.midnight_rows().iter().map(|r| (r.date(), r.supply)).collect())
        .collect();

    let all_dates: BTreeSet<NaiveDate> = per_asset.iter().flat_map(|m| m.keys().copied()).collect();
    let dates: Vec<NaiveDate> = all_dates.into_iter().collect();

    let columns: Vec<Vec<f64>> = per_asset
        .iter()
        .map(|by_date| {
            dates
                .iter()
                .map(|d| by_date.get(d).copied().unwrap_or(MISSING_SUPPLY))
                .collect()
        })
        .collect();

    Ok(CombinedTable {
        dates,
        asset_ids: tables.iter().map(|t| t.request.asset_id.clone()).collect(),
        columns,
    })
}
