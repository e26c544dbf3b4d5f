use chrono::NaiveDate;

/// Cell value for a date on which an asset has no midnight sample.
pub const MISSING_SUPPLY: f64 = -1.0;

/// Circulating supply of several assets on a shared calendar-date index.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedTable {
    /// Date index, ascending.
    pub dates: Vec<NaiveDate>,
    /// Column names in request order.
    pub asset_ids: Vec<String>,
    /// One column per asset, each the same length as `dates`.
    pub columns: Vec<Vec<f64>>,
}

impl CombinedTable {
    pub fn row_count(&self) -> usize {
        self.dates.len()
    }

    /// Column for an asset id, if present.
    pub fn column(&self, asset_id: &str) -> Option<&[f64]> {
        self.asset_ids
            .iter()
            .position(|id| id == asset_id)
            .map(|i| self.columns[i].as_slice())
    }

    /// Supply of `asset_id` on `date`; `None` for the sentinel or an unknown date/asset.
    pub fn supply_on(&self, asset_id: &str, date: NaiveDate) -> Option<f64> {
        let col = self.column(asset_id)?;
        let row = self.dates.binary_search(&date).ok()?;
        let value = col[row];
        (value != MISSING_SUPPLY).then_some(value)
    }
}
