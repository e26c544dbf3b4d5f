//! CSV series store.
//!
//! Layout:
//! - `{root}/{asset_id}_{fiat}_{window}.csv`: one file per fetch request
//! - `{root}/combined/combined_result.csv`: latest combiner output
//!
//! Writes are atomic (write to .tmp, rename into place). Series files carry
//! the header `timestamp,market_cap,price,supply` with UTC timestamps at
//! millisecond precision; floats use the shortest round-trip representation
//! so a reload is lossless.

use super::provider::DataError;
use crate::domain::{AssetSeriesTable, CombinedTable, FetchRequest, SeriesRow};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const SERIES_HEADER: [&str; 4] = ["timestamp", "market_cap", "price", "supply"];
const COMBINED_DIR: &str = "combined";
const COMBINED_FILE: &str = "combined_result.csv";

/// One row of a series file as read back from disk.
#[derive(Debug, Deserialize)]
struct SeriesRecord {
    timestamp: String,
    market_cap: f64,
    price: f64,
    supply: f64,
}

/// The on-disk store for series and combined tables.
#[derive(Debug, Clone)]
pub struct SeriesStore {
    root: PathBuf,
}

impl SeriesStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the series file for a request: `{root}/{key}.csv`
    pub fn series_path(&self, request: &FetchRequest) -> PathBuf {
        self.root.join(format!("{}.csv", request.storage_key()))
    }

    /// Path of the combined output: `{root}/combined/combined_result.csv`
    pub fn combined_path(&self) -> PathBuf {
        self.root.join(COMBINED_DIR).join(COMBINED_FILE)
    }

    /// Whether a series file exists for a request.
    pub fn contains(&self, request: &FetchRequest) -> bool {
        self.series_path(request).is_file()
    }

    /// Write a series table, replacing any previous file for the same request.
    pub fn write(&self, table: &AssetSeriesTable) -> Result<PathBuf, DataError> {
        let path = self.series_path(&table.request);
        write_atomic(&path, |w| {
            w.write_record(SERIES_HEADER)?;
            for row in &table.rows {
                w.write_record([
                    row.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                    row.market_cap.to_string(),
                    row.price.to_string(),
                    row.supply.to_string(),
                ])?;
            }
            Ok(())
        })?;
        Ok(path)
    }

    /// Load the series table for a request, sorted by timestamp ascending.
    pub fn load(&self, request: &FetchRequest) -> Result<AssetSeriesTable, DataError> {
        let path = self.series_path(request);
        if !path.is_file() {
            return Err(DataError::StorageNotFound { path });
        }

        let mut reader = csv::Reader::from_path(&path).map_err(|e| storage_err(&path, e))?;

        let headers = reader.headers().map_err(|e| storage_err(&path, e))?;
        if headers.iter().ne(SERIES_HEADER) {
            return Err(DataError::StorageError(format!(
                "{}: unexpected header {:?}",
                path.display(),
                headers.iter().collect::<Vec<_>>()
            )));
        }

        let mut rows = Vec::new();
        for (i, record) in reader.deserialize::<SeriesRecord>().enumerate() {
            let record = record.map_err(|e| storage_err(&path, e))?;
            let timestamp = NaiveDateTime::parse_from_str(&record.timestamp, TIMESTAMP_FORMAT)
                .map_err(|e| {
                    DataError::StorageError(format!(
                        "{}: bad timestamp '{}' on row {}: {e}",
                        path.display(),
                        record.timestamp,
                        i + 1
                    ))
                })?
                .and_utc();
            rows.push(SeriesRow {
                timestamp,
                market_cap: record.market_cap,
                price: record.price,
                supply: record.supply,
            });
        }

        rows.sort_by_key(|r| r.timestamp);
        Ok(AssetSeriesTable {
            request: request.clone(),
            rows,
        })
    }

    /// Write the combined table, overwriting the previous run's output.
    pub fn write_combined(&self, table: &CombinedTable) -> Result<PathBuf, DataError> {
        let path = self.combined_path();
        write_atomic(&path, |w| {
            let mut header = Vec::with_capacity(table.asset_ids.len() + 1);
            header.push("date".to_string());
            header.extend(table.asset_ids.iter().cloned());
            w.write_record(&header)?;

            for (row, date) in table.dates.iter().enumerate() {
                let mut record = Vec::with_capacity(header.len());
                record.push(date.format(DATE_FORMAT).to_string());
                record.extend(table.columns.iter().map(|col| col[row].to_string()));
                w.write_record(&record)?;
            }
            Ok(())
        })?;
        Ok(path)
    }

    /// Read back the combined output written by [`SeriesStore::write_combined`].
    pub fn load_combined(&self) -> Result<CombinedTable, DataError> {
        let path = self.combined_path();
        if !path.is_file() {
            return Err(DataError::StorageNotFound { path });
        }

        let mut reader = csv::Reader::from_path(&path).map_err(|e| storage_err(&path, e))?;
        let headers = reader.headers().map_err(|e| storage_err(&path, e))?.clone();
        if headers.get(0) != Some("date") {
            return Err(DataError::StorageError(format!(
                "{}: first column must be 'date'",
                path.display()
            )));
        }

        let asset_ids: Vec<String> = headers.iter().skip(1).map(String::from).collect();
        let mut dates = Vec::new();
        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); asset_ids.len()];

        for record in reader.records() {
            let record = record.map_err(|e| storage_err(&path, e))?;
            let date_str = record.get(0).unwrap_or_default();
            let date = NaiveDate::parse_from_str(date_str, DATE_FORMAT).map_err(|e| {
                DataError::StorageError(format!("{}: bad date '{date_str}': {e}", path.display()))
            })?;
            dates.push(date);

            for (col, cell) in columns.iter_mut().zip(record.iter().skip(1)) {
                let value = cell.parse::<f64>().map_err(|e| {
                    DataError::StorageError(format!("{}: bad value '{cell}': {e}", path.display()))
                })?;
                col.push(value);
            }
        }

        Ok(CombinedTable {
            dates,
            asset_ids,
            columns,
        })
    }
}

fn storage_err(path: &Path, e: impl std::fmt::Display) -> DataError {
    DataError::StorageError(format!("{}: {e}", path.display()))
}

/// Write a CSV file through `fill`, then atomically rename it into place.
fn write_atomic<F>(path: &Path, fill: F) -> Result<(), DataError>
where
    F: FnOnce(&mut csv::Writer<fs::File>) -> Result<(), csv::Error>,
{
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| DataError::StorageError(format!("failed to create dir: {e}")))?;
    }

    let tmp_path = path.with_extension("csv.tmp");
    let mut writer = csv::Writer::from_path(&tmp_path).map_err(|e| storage_err(&tmp_path, e))?;

    let written = fill(&mut writer).and_then(|()| writer.flush().map_err(csv::Error::from));
    drop(writer);
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(storage_err(&tmp_path, e));
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        // Clean up temp file on rename failure
        let _ = fs::remove_file(&tmp_path);
        DataError::StorageError(format!("atomic rename failed: {e}"))
    })
}
