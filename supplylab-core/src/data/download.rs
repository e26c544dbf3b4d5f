//! Batch fetch driver: fetch → build series → persist, once per request.
//!
//! Every request is isolated: a failure is recorded in its outcome and the
//! batch carries on. Outcomes come back in input order in both modes.
//! Requests sharing a storage key are fetched once; later copies fail with a
//! `Config` error so no two workers ever write the same file.

use super::provider::{DataError, DownloadProgress, MarketDataProvider};
use super::series::fetch_series;
use super::store::SeriesStore;
use crate::domain::FetchRequest;
use rayon::prelude::*;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::PathBuf;

/// How the batch is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// One request at a time, in input order.
    Sequential,
    /// Fan out over a dedicated pool of
    /// `min(max_workers, available_parallelism)` threads.
    Parallel { max_workers: usize },
}

impl FetchMode {
    /// Number of worker threads this mode actually uses.
    pub fn worker_count(&self) -> usize {
        match *self {
            FetchMode::Sequential => 1,
            FetchMode::Parallel { max_workers } => {
                let available = std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1);
                max_workers.min(available).max(1)
            }
        }
    }
}

/// Result of one request within a batch.
#[derive(Debug)]
pub struct FetchOutcome {
    pub request: FetchRequest,
    /// Path of the persisted series on success.
    pub result: Result<PathBuf, DataError>,
}

impl FetchOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Summary of a batch fetch.
#[derive(Debug)]
pub struct BatchSummary {
    /// One outcome per request, in input order.
    pub outcomes: Vec<FetchOutcome>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }

    /// Failed requests with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (&FetchRequest, &DataError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (&o.request, e)))
    }
}

/// Fetch and persist every request, collecting one outcome per request.
pub fn fetch_all(
    provider: &dyn MarketDataProvider,
    store: &SeriesStore,
    requests: &[FetchRequest],
    mode: FetchMode,
    progress: &dyn DownloadProgress,
) -> BatchSummary {
    let total = requests.len();
    tracing::info!(
        total,
        provider = provider.name(),
        workers = mode.worker_count(),
        root = %store.root().display(),
        "starting batch fetch"
    );

    let duplicate_of = find_duplicates(requests);

    let run_one = |(i, request): (usize, &FetchRequest)| {
        progress.on_start(request, i, total);
        let result = match duplicate_of[i] {
            Some(first) => Err(DataError::Config(format!(
                "{request} repeats request #{} and would overwrite its file",
                first + 1
            ))),
            None => fetch_single(provider, store, request),
        };
        progress.on_complete(request, i, total, &result);
        if let Err(e) = &result {
            tracing::warn!(asset = %request.asset_id, kind = ?e.kind(), error = %e, "fetch failed");
        }
        FetchOutcome {
            request: request.clone(),
            result,
        }
    };

    let outcomes: Vec<FetchOutcome> = match mode {
        FetchMode::Sequential => requests.iter().enumerate().map(run_one).collect(),
        FetchMode::Parallel { .. } => {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(mode.worker_count())
                .build()
            {
                Ok(pool) => pool.install(|| requests.par_iter().enumerate().map(run_one).collect()),
                Err(e) => {
                    tracing::warn!(error = %e, "could not build worker pool, fetching sequentially");
                    requests.iter().enumerate().map(run_one).collect()
                }
            }
        }
    };

    let summary = BatchSummary { outcomes };
    progress.on_batch_complete(summary.succeeded(), summary.failed(), total);
    tracing::info!(
        succeeded = summary.succeeded(),
        failed = summary.failed(),
        "batch fetch finished"
    );
    summary
}

/// For each request, the index of an earlier request with the same storage
/// key. Only the first of a group is fetched; the rest fail without touching
/// the store.
fn find_duplicates(requests: &[FetchRequest]) -> Vec<Option<usize>> {
    let mut first_by_key: HashMap<String, usize> = HashMap::with_capacity(requests.len());
    requests
        .iter()
        .enumerate()
        .map(|(i, r)| match first_by_key.entry(r.storage_key()) {
            Entry::Occupied(e) => Some(*e.get()),
            Entry::Vacant(e) => {
                e.insert(i);
                None
            }
        })
        .collect()
}

/// Fetch a single request: fetch → build series → write.
fn fetch_single(
    provider: &dyn MarketDataProvider,
    store: &SeriesStore,
    request: &FetchRequest,
) -> Result<PathBuf, DataError> {
    let table = fetch_series(provider, request)?;
    store.write(&table)
}
