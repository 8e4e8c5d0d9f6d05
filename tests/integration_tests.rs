//! End-to-end: listing page to files on disk or in a tar container.

use regex::Regex;
use slurp::{create_http_client, listing, ArchiveSink, HttpClientConfig, TransferOutcome};

use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use wiremock::MockServer;

mod common;
use common::helpers::*;

#[tokio::test]
async fn test_listing_to_directory() {
    let server = MockServer::start().await;
    mount_listing(&server, &["a.txt", "b.txt", "sub/c.txt", "notes.md"]).await;
    mount_file(&server, "a.txt", b"alpha".to_vec()).await;
    mount_file(&server, "b.txt", b"bravo!".to_vec()).await;

    let client = create_http_client(HttpClientConfig::default()).unwrap();
    let pattern = Regex::new(r".*\.txt$").unwrap();
    let downloads = listing::resolve(&client, &[file_url(&server, "")], &pattern)
        .await
        .unwrap();
    assert_eq!(downloads.len(), 2);

    let finished = Arc::new(Mutex::new(Vec::new()));
    let log = finished.clone();
    let dir = create_temp_dir();
    let report = create_test_downloader_builder(2)
        .on_complete(move |summary| {
            log.lock()
                .unwrap()
                .push((summary.download().filename.clone(), summary.outcome().clone()));
        })
        .build()
        .run(&downloads, direct_sink(dir.path()), CancellationToken::new())
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.bytes, 11);
    assert_eq!(std::fs::read(dir.path().join("a.txt")).unwrap(), b"alpha");
    assert_eq!(std::fs::read(dir.path().join("b.txt")).unwrap(), b"bravo!");
    assert!(!dir.path().join("c.txt").exists());
    assert!(!dir.path().join("notes.md").exists());

    let mut finished = finished.lock().unwrap().clone();
    finished.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(
        finished,
        vec![
            ("a.txt".to_string(), TransferOutcome::Success),
            ("b.txt".to_string(), TransferOutcome::Success),
        ]
    );
}

#[tokio::test]
async fn test_listing_to_archive() {
    let server = MockServer::start().await;
    mount_listing(&server, &["one.iso", "two.iso"]).await;
    mount_file(&server, "one.iso", create_test_content(1500)).await;
    mount_file(&server, "two.iso", create_test_content(512)).await;

    let client = create_http_client(HttpClientConfig::default()).unwrap();
    let downloads = listing::resolve(&client, &[file_url(&server, "")], &Regex::new("iso").unwrap())
        .await
        .unwrap();

    let dir = create_temp_dir();
    let tar_path = dir.path().join("isos.tar");
    let sink = ArchiveSink::create_file(&tar_path).await.unwrap();
    let report = create_test_downloader_builder(2)
        .build()
        .run(&downloads, Arc::new(sink), CancellationToken::new())
        .await
        .unwrap();

    assert!(report.is_success());
    let mut entries = read_tar(&tar_path);
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(entries.len(), 2);
    assert_eq!((entries[0].0.as_str(), entries[0].1), ("one.iso", 1500));
    assert_eq!((entries[1].0.as_str(), entries[1].1), ("two.iso", 512));
    assert_eq!(entries[0].2, create_test_content(1500));
}

#[tokio::test]
async fn test_second_run_asks_for_remaining_range() {
    let server = MockServer::start().await;
    mount_file(&server, "f.bin", create_test_content(300)).await;
    let dir = create_temp_dir();
    let downloads = vec![create_test_download(&server, "f.bin")];

    let first = create_test_downloader_builder(1)
        .build()
        .run(&downloads, direct_sink(dir.path()), CancellationToken::new())
        .await
        .unwrap();
    assert!(first.is_success());
    assert_file_size(&dir.path().join("f.bin"), 300);

    // The mock ignores Range and answers 200 again: the file starts over.
    let second = create_test_downloader_builder(1)
        .build()
        .run(&downloads, direct_sink(dir.path()), CancellationToken::new())
        .await
        .unwrap();
    assert!(second.is_success());
    assert_file_size(&dir.path().join("f.bin"), 300);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[1].headers.get("range").unwrap().to_str().unwrap(),
        "bytes=300-"
    );
}
