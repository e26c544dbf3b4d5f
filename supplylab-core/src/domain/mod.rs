//! Domain types: requests, windows, per-asset series and the combined table.

pub mod combined;
pub mod request;
pub mod series;
pub mod window;

pub use combined::{CombinedTable, MISSING_SUPPLY};
pub use request::FetchRequest;
pub use series::{AssetSeriesTable, SeriesRow};
pub use window::Window;
