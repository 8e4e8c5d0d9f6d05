//! Slurp bulk-downloads the files listed on directory listing pages, with a
//! pool of concurrent workers, resumable transfers and a choice of output:
//! loose files under a directory, or one tar container.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use regex::Regex;
//! use slurp::{create_http_client, listing, DirectSink, DownloaderBuilder, HttpClientConfig};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = create_http_client(HttpClientConfig::default())?;
//! let pattern = Regex::new(r"\.iso$")?;
//! let downloads =
//!     listing::resolve(&client, &["https://example.com/pub/".to_string()], &pattern).await?;
//!
//! let report = DownloaderBuilder::new()
//!     .workers(4)
//!     .build()
//!     .run(&downloads, Arc::new(DirectSink::new("mirror")), CancellationToken::new())
//!     .await?;
//! println!("Number of errors: {}", report.failures);
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`download`] - Download descriptors, work orders and per-order summaries
//! - [`downloader`] - The worker pool, order queue, coordinator and builder
//! - [`error`] - Centralized error handling with the `Error` enum
//! - [`http`] - HTTP client creation
//! - [`listing`] - Discovery of files on directory listing pages
//! - [`progress`] - The shared byte counter and the status line
//! - [`sink`] - Output sinks: loose files or a tar container

pub mod download;
pub mod downloader;
pub mod error;
pub mod http;
pub mod listing;
pub mod progress;
pub mod sink;

pub use download::{Download, Order, Summary, TransferOutcome, UiEvent};
pub use downloader::{CoordinatorExit, Downloader, DownloaderBuilder, RunReport};
pub use error::{Error, Result};
pub use http::{create_http_client, HttpClientConfig};
pub use progress::{ByteCounter, ProgressBarOpts};
pub use sink::{ArchiveSink, DirectSink, EntryWriter, OutputSink};
