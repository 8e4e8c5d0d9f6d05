//! Tests for the worker pool and the run lifecycle against a mock server.
//!
//! - every order is processed exactly once
//! - resumed, already complete and failing transfers
//! - dry runs and interrupts

use slurp::{Download, TransferOutcome};

use std::collections::HashSet;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::helpers::*;

#[tokio::test]
async fn test_every_order_processed_exactly_once() {
    let server = MockServer::start().await;
    let dir = create_temp_dir();

    let mut downloads = Vec::new();
    for i in 0..25 {
        let name = format!("file{:02}.bin", i);
        mount_file(&server, &name, create_test_content(100 + i)).await;
        downloads.push(create_test_download(&server, &name));
    }

    let completions = Arc::new(AtomicUsize::new(0));
    let seen = completions.clone();
    let report = create_test_downloader_builder(4)
        .on_complete(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .run(&downloads, direct_sink(dir.path()), CancellationToken::new())
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(completions.load(Ordering::SeqCst), 25);
    assert_eq!(report.summaries.len(), 25);
    assert_eq!(report.files_done, 25);

    let names: HashSet<_> = report
        .summaries
        .iter()
        .map(|s| s.download().filename.clone())
        .collect();
    assert_eq!(names.len(), 25);

    let expected: u64 = (0..25).map(|i| 100 + i as u64).sum();
    assert_eq!(report.bytes, expected);
    for i in 0..25 {
        assert_file_size(
            &dir.path().join(format!("file{:02}.bin", i)),
            100 + i as u64,
        );
    }
}

#[tokio::test]
async fn test_single_worker_many_orders() {
    let server = MockServer::start().await;
    let dir = create_temp_dir();

    let mut downloads = Vec::new();
    for i in 0..7 {
        let name = format!("f{}", i);
        mount_file(&server, &name, vec![b'x'; 10]).await;
        downloads.push(create_test_download(&server, &name));
    }

    let report = create_test_downloader_builder(1)
        .queue_capacity(2)
        .build()
        .run(&downloads, direct_sink(dir.path()), CancellationToken::new())
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.files_done, 7);
    assert_eq!(report.bytes, 70);
}

#[tokio::test]
async fn test_partial_file_is_resumed() {
    let server = MockServer::start().await;
    let dir = create_temp_dir();
    let content = create_test_content(4096);
    let already = 1000;
    create_temp_file(dir.path(), "big.iso", &content[..already]);

    Mock::given(method("GET"))
        .and(path("/dir/big.iso"))
        .and(header("Range", format!("bytes={}-", already).as_str()))
        .respond_with(ResponseTemplate::new(206).set_body_bytes(content[already..].to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let report = create_test_downloader_builder(1)
        .build()
        .run(
            &[create_test_download(&server, "big.iso")],
            direct_sink(dir.path()),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.bytes, (4096 - already) as u64);
    assert_eq!(std::fs::read(dir.path().join("big.iso")).unwrap(), content);
}

#[tokio::test]
async fn test_range_not_satisfiable_is_already_complete() {
    let server = MockServer::start().await;
    let dir = create_temp_dir();
    let content = create_test_content(512);
    create_temp_file(dir.path(), "done.bin", &content);

    Mock::given(method("GET"))
        .and(path("/dir/done.bin"))
        .and(header("Range", "bytes=512-"))
        .respond_with(ResponseTemplate::new(416))
        .expect(1)
        .mount(&server)
        .await;

    let report = create_test_downloader_builder(1)
        .build()
        .run(
            &[create_test_download(&server, "done.bin")],
            direct_sink(dir.path()),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.files_done, 1);
    assert_eq!(report.bytes, 0);
    assert_eq!(report.summaries[0].outcome(), &TransferOutcome::AlreadyComplete);
    assert_eq!(std::fs::read(dir.path().join("done.bin")).unwrap(), content);
}

#[tokio::test]
async fn test_one_failure_among_five() {
    let server = MockServer::start().await;
    let dir = create_temp_dir();

    let mut downloads = Vec::new();
    for name in ["a", "b", "c", "d"] {
        mount_file(&server, name, name.as_bytes().repeat(64)).await;
        downloads.push(create_test_download(&server, name));
    }
    Mock::given(method("GET"))
        .and(path("/dir/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    downloads.insert(2, create_test_download(&server, "missing"));

    let report = create_test_downloader_builder(2)
        .build()
        .run(&downloads, direct_sink(dir.path()), CancellationToken::new())
        .await
        .unwrap();

    assert!(!report.is_success());
    assert_eq!(report.failures, 1);
    assert_eq!(report.files_done, 4);
    assert_eq!(report.summaries.len(), 5);
    for name in ["a", "b", "c", "d"] {
        assert_file_size(&dir.path().join(name), 64);
    }
    assert!(!dir.path().join("missing").exists());

    let failed: Vec<_> = report
        .summaries
        .iter()
        .filter(|s| !s.outcome().is_success())
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].download().filename, "missing");
    assert_eq!(failed[0].statuscode(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_dry_run_fetches_nothing() {
    let server = MockServer::start().await;
    let dir = create_temp_dir();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let downloads: Vec<Download> = ["x", "y", "z"]
        .iter()
        .map(|name| create_test_download(&server, name))
        .collect();

    let report = create_test_downloader_builder(2)
        .dry_run(true)
        .build()
        .run(&downloads, direct_sink(dir.path()), CancellationToken::new())
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.files_done, 3);
    assert_eq!(report.bytes, 0);
    assert!(!dir.path().join("x").exists());
}

#[tokio::test]
async fn test_interrupt_returns_without_waiting() {
    let server = MockServer::start().await;
    let dir = create_temp_dir();

    Mock::given(method("GET"))
        .and(path("/dir/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![0u8; 16])
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let report = create_test_downloader_builder(1)
        .build()
        .run(
            &[create_test_download(&server, "slow")],
            direct_sink(dir.path()),
            cancel,
        )
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(report.interrupted);
    assert!(!report.is_success());
    assert_eq!(report.files_done, 0);
    assert!(report.summaries.is_empty());
}

#[tokio::test]
async fn test_empty_run() {
    let dir = create_temp_dir();
    let report = create_test_downloader_builder(3)
        .build()
        .run(&[], direct_sink(dir.path()), CancellationToken::new())
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.files_done, 0);
    assert!(report.summaries.is_empty());
}
