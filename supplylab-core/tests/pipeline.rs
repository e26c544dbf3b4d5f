//! End-to-end tests: mock provider → batch fetch → CSV store → combiner.

mod common;

use chrono::NaiveDate;
use common::{hourly_chart, MockProvider, JAN_1_2024_MS};
use supplylab_core::data::{build_series, resolve_ids, SilentProgress};
use supplylab_core::{
    combine, fetch_all, DataError, ErrorKind, FetchMode, FetchRequest, SeriesStore, Window,
    MISSING_SUPPLY,
};

/// Samples land a few minutes past the hour, the way the upstream API reports them.
const FIVE_MIN_MS: i64 = 300_000;

fn request(asset: &str) -> FetchRequest {
    FetchRequest::new(asset, "usd", Window::Days(3))
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
}

#[test]
fn parallel_batch_isolates_a_failing_request() {
    let dir = tempfile::tempdir().unwrap();
    let store = SeriesStore::new(dir.path());
    let provider = ["a", "b", "d", "e"]
        .iter()
        .fold(MockProvider::new(), |p, id| {
            p.with_chart(id, hourly_chart(JAN_1_2024_MS, 24, 1_000.0))
        });
    let requests: Vec<FetchRequest> = ["a", "b", "c", "d", "e"].iter().map(|id| request(id)).collect();

    let summary = fetch_all(
        &provider,
        &store,
        &requests,
        FetchMode::Parallel { max_workers: 2 },
        &SilentProgress,
    );

    assert_eq!(summary.total(), 5);
    assert_eq!(summary.succeeded(), 4);
    assert_eq!(summary.failed(), 1);
    assert!(!summary.all_succeeded());
    assert_eq!(provider.chart_calls(), 5);

    let failures: Vec<_> = summary.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0.asset_id, "c");
    assert_eq!(failures[0].1.kind(), ErrorKind::NotFound);

    // Outcomes come back in input order
    let order: Vec<&str> = summary
        .outcomes
        .iter()
        .map(|o| o.request.asset_id.as_str())
        .collect();
    assert_eq!(order, vec!["a", "b", "c", "d", "e"]);

    for outcome in &summary.outcomes {
        match &outcome.result {
            Ok(path) => {
                assert!(path.is_file());
                assert_eq!(*path, store.series_path(&outcome.request));
            }
            Err(_) => assert!(!store.contains(&outcome.request)),
        }
    }
}

#[test]
fn repeated_request_is_fetched_and_written_once() {
    let dir = tempfile::tempdir().unwrap();
    let store = SeriesStore::new(dir.path());
    let provider = MockProvider::new()
        .with_chart("bitcoin", hourly_chart(JAN_1_2024_MS, 48, 19_000_000.0))
        .with_chart("ethereum", hourly_chart(JAN_1_2024_MS, 48, 1.2e8));
    let requests = vec![
        request("bitcoin"),
        request("bitcoin"),
        request("ethereum"),
        request("bitcoin"),
        request("bitcoin"),
    ];

    for _ in 0..10 {
        let summary = fetch_all(
            &provider,
            &store,
            &requests,
            FetchMode::Parallel { max_workers: 4 },
            &SilentProgress,
        );

        assert_eq!(summary.succeeded(), 2);
        assert!(summary.outcomes[0].is_ok());
        assert!(summary.outcomes[2].is_ok());
        let failed: Vec<usize> = summary
            .outcomes
            .iter()
            .enumerate()
            .filter(|(_, o)| !o.is_ok())
            .map(|(i, _)| i)
            .collect();
        assert_eq!(failed, vec![1, 3, 4]);
        for (_, err) in summary.failures() {
            assert_eq!(err.kind(), ErrorKind::Config);
        }
    }

    assert_eq!(provider.chart_calls(), 20);
    let reloaded = store.load(&request("bitcoin")).unwrap();
    assert_eq!(reloaded.len(), 48);
    let leftovers = std::fs::read_dir(dir.path())
        .unwrap()
        .filter(|e| {
            e.as_ref()
                .unwrap()
                .file_name()
                .to_string_lossy()
                .ends_with(".tmp")
        })
        .count();
    assert_eq!(leftovers, 0);
}

#[test]
fn sequential_batch_continues_after_failure() {
    let dir = tempfile::tempdir().unwrap();
    let store = SeriesStore::new(dir.path());
    let provider = MockProvider::new()
        .with_chart("bitcoin", hourly_chart(JAN_1_2024_MS, 4, 19_000_000.0))
        .with_rate_limit("ethereum");
    let requests = vec![request("missing"), request("ethereum"), request("bitcoin")];

    let summary = fetch_all(&provider, &store, &requests, FetchMode::Sequential, &SilentProgress);

    assert_eq!(summary.succeeded(), 1);
    assert_eq!(summary.failed(), 2);
    assert!(summary.outcomes[2].is_ok());

    let kinds: Vec<ErrorKind> = summary.failures().map(|(_, e)| e.kind()).collect();
    assert_eq!(kinds, vec![ErrorKind::NotFound, ErrorKind::Transient]);
    assert!(summary.outcomes[1].result.as_ref().unwrap_err().is_transient());
}

#[test]
fn combine_aligns_dates_and_marks_missing() {
    let dir = tempfile::tempdir().unwrap();
    let store = SeriesStore::new(dir.path());
    let start = JAN_1_2024_MS + FIVE_MIN_MS;
    // bitcoin: midnight samples on Jan 1 and Jan 2; ethereum: Jan 1 only
    let provider = MockProvider::new()
        .with_chart("bitcoin", hourly_chart(start, 48, 19_000_000.0))
        .with_chart("ethereum", hourly_chart(start, 24, 120_000_000.0));
    let requests = vec![request("bitcoin"), request("ethereum")];

    let summary = fetch_all(&provider, &store, &requests, FetchMode::Sequential, &SilentProgress);
    assert!(summary.all_succeeded());

    let combined = combine(&store, &requests).unwrap();

    assert_eq!(combined.dates, vec![date(1), date(2)]);
    assert_eq!(combined.asset_ids, vec!["bitcoin", "ethereum"]);

    let btc = combined.column("bitcoin").unwrap();
    assert!((btc[0] - 19_000_000.0).abs() < 1e-6);
    assert!((btc[1] - 19_000_024.0).abs() < 1e-6);

    let eth = combined.column("ethereum").unwrap();
    assert!((eth[0] - 120_000_000.0).abs() < 1e-6);
    assert_eq!(eth[1], MISSING_SUPPLY);

    assert_eq!(store.load_combined().unwrap(), combined);
}

#[test]
fn combine_is_byte_identical_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let store = SeriesStore::new(dir.path());
    let provider = MockProvider::new()
        .with_chart("bitcoin", hourly_chart(JAN_1_2024_MS, 72, 19_000_000.0))
        .with_chart("ethereum", hourly_chart(JAN_1_2024_MS + 26 * common::HOUR_MS, 30, 1.0e8));
    let requests = vec![request("bitcoin"), request("ethereum")];
    fetch_all(&provider, &store, &requests, FetchMode::Sequential, &SilentProgress);

    combine(&store, &requests).unwrap();
    let first = std::fs::read(store.combined_path()).unwrap();
    combine(&store, &requests).unwrap();
    let second = std::fs::read(store.combined_path()).unwrap();

    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn combine_without_fetch_is_storage_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = SeriesStore::new(dir.path());

    let err = combine(&store, &[request("bitcoin")]).unwrap_err();
    assert!(matches!(err, DataError::StorageNotFound { .. }));
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(!store.combined_path().exists());
}

#[test]
fn persisted_midnight_dates_match_in_memory() {
    let dir = tempfile::tempdir().unwrap();
    let store = SeriesStore::new(dir.path());
    let req = request("bitcoin");
    let table = build_series(
        &req,
        hourly_chart(JAN_1_2024_MS + 7 * FIVE_MIN_MS, 100, 19_000_000.0),
    )
    .unwrap();

    let in_memory: Vec<NaiveDate> = table.midnight_rows().iter().map(|r| r.date()).collect();

    store.write(&table).unwrap();
    let reloaded = store.load(&req).unwrap();
    let from_disk: Vec<NaiveDate> = reloaded.midnight_rows().iter().map(|r| r.date()).collect();

    assert_eq!(in_memory, vec![date(1), date(2), date(3), date(4), date(5)]);
    assert_eq!(from_disk, in_memory);
    assert_eq!(reloaded, table);
}

#[test]
fn resolve_uses_catalog_once() {
    let provider = MockProvider::new()
        .with_catalog_entry("bitcoin", "BTC", "Bitcoin")
        .with_catalog_entry("ethereum", "ETH", "Ethereum")
        .with_catalog_entry("weth", "ETH", "WETH");

    assert_eq!(resolve_ids(&provider, &["BTC"]).unwrap(), vec!["bitcoin"]);
    assert!(resolve_ids(&provider, &["NOPE"]).unwrap().is_empty());
    assert_eq!(
        resolve_ids(&provider, &["ETH", "BTC"]).unwrap(),
        vec!["ethereum", "weth", "bitcoin"]
    );
    assert_eq!(provider.catalog_calls(), 3);
}
