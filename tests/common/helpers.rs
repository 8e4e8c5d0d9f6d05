#![allow(dead_code)]

use std::convert::TryFrom;
use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use slurp::{DirectSink, Download, DownloaderBuilder, OutputSink};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Directory served by the mock server.
pub const TEST_DIR: &str = "/dir/";

/// Creates a temporary directory for testing purposes
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

/// Creates a temporary file with the given content
pub fn create_temp_file(dir: &Path, filename: &str, content: &[u8]) -> PathBuf {
    let file_path = dir.join(filename);
    fs::write(&file_path, content).expect("Failed to write temporary file");
    file_path
}

/// Creates test file content of specified size
pub fn create_test_content(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 251) as u8).collect()
}

/// Asserts that a file has the expected size
pub fn assert_file_size(path: &Path, expected_size: u64) {
    let metadata = fs::metadata(path).expect("Failed to get file metadata");
    assert_eq!(
        metadata.len(),
        expected_size,
        "File size mismatch at path: {:?}",
        path
    );
}

/// A quiet downloader builder.
pub fn create_test_downloader_builder(workers: usize) -> DownloaderBuilder {
    DownloaderBuilder::hidden().workers(workers)
}

/// A [`DirectSink`] rooted at `dir`.
pub fn direct_sink(dir: &Path) -> Arc<dyn OutputSink> {
    Arc::new(DirectSink::new(dir))
}

/// Address of `name` in the served directory.
pub fn file_url(server: &MockServer, name: &str) -> String {
    format!("{}{}{}", server.uri(), TEST_DIR, name)
}

/// Download of `name` in the served directory.
pub fn create_test_download(server: &MockServer, name: &str) -> Download {
    Download::try_from(file_url(server, name).as_str()).expect("Failed to create download")
}

/// Serve `body` at `name` in the served directory.
pub async fn mount_file(server: &MockServer, name: &str, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(format!("{}{}", TEST_DIR, name)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(server)
        .await;
}

/// A minimal autoindex-style listing page linking `links`.
pub fn listing_page(links: &[&str]) -> String {
    let mut page = String::from("<html><body><h1>Index of /dir/</h1>\n<a href=\"../\">../</a>\n");
    for link in links {
        page.push_str(&format!("<a href=\"{0}\">{0}</a>\n", link));
    }
    page.push_str("</body></html>\n");
    page
}

/// Serve a listing page at the served directory.
pub async fn mount_listing(server: &MockServer, links: &[&str]) {
    Mock::given(method("GET"))
        .and(path(TEST_DIR))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string(listing_page(links)),
        )
        .mount(server)
        .await;
}

/// Every entry of a tar file as (path, declared size, body).
pub fn read_tar(path: &Path) -> Vec<(String, u64, Vec<u8>)> {
    let file = fs::File::open(path).expect("Failed to open archive");
    let mut archive = tar::Archive::new(file);
    archive
        .entries()
        .expect("Failed to read archive")
        .map(|entry| {
            let mut entry = entry.expect("Corrupt archive entry");
            let name = entry.path().unwrap().to_string_lossy().into_owned();
            let size = entry.header().size().unwrap();
            let mut body = Vec::new();
            entry.read_to_end(&mut body).unwrap();
            (name, size, body)
        })
        .collect()
}

/// Answer every connection with the raw bytes of `response`, then hold the
/// connection open for `linger` before closing it. Returns the base address.
///
/// Covers what the mock server cannot: bodies without a Content-Length and
/// bodies that stall halfway.
pub fn serve_raw(response: Vec<u8>, linger: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind raw server");
    let address = format!("http://{}", listener.local_addr().unwrap());
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            let response = response.clone();
            thread::spawn(move || {
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut line = String::new();
                while reader.read_line(&mut line).unwrap_or(0) > 0 && line != "\r\n" {
                    line.clear();
                }
                let _ = stream.write_all(&response);
                let _ = stream.flush();
                thread::sleep(linger);
            });
        }
    });
    address
}

/// A complete chunked response carrying `body`, without a Content-Length.
pub fn chunked_response(body: &[u8]) -> Vec<u8> {
    let mut response =
        b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n".to_vec();
    for chunk in body.chunks(100) {
        response.extend_from_slice(format!("{:x}\r\n", chunk.len()).as_bytes());
        response.extend_from_slice(chunk);
        response.extend_from_slice(b"\r\n");
    }
    response.extend_from_slice(b"0\r\n\r\n");
    response
}

/// A response declaring `declared` bytes that only ever sends `sent` of them.
pub fn stalled_response(declared: usize, sent: &[u8]) -> Vec<u8> {
    let mut response = format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n",
        declared
    )
    .into_bytes();
    response.extend_from_slice(sent);
    response
}
