//! Configuration structures and defaults for the downloader.
//!
//! This module provides the configuration used by the [`Downloader`] and
//! filled in by the [`DownloaderBuilder`].
//!
//! [`Downloader`]: super::Downloader
//! [`DownloaderBuilder`]: super::DownloaderBuilder
//!
//! # Examples
//!
//! ## Using Callbacks
//!
//! ```rust
//! use slurp::downloader::DownloadCallback;
//! use slurp::download::{Summary, TransferOutcome};
//!
//! let callback: DownloadCallback = Box::new(|summary: &Summary| {
//!     match summary.outcome() {
//!         TransferOutcome::Success => println!("Downloaded: {}", summary.download().filename),
//!         TransferOutcome::AlreadyComplete => println!("Complete: {}", summary.download().filename),
//!         TransferOutcome::Failed(msg) => println!("Failed: {} - {}", summary.download().filename, msg),
//!     }
//! });
//! ```

use super::queue::DEFAULT_QUEUE_CAPACITY;
use crate::download::Summary;
use crate::http::HttpClientConfig;
use crate::progress::ProgressBarOpts;

use std::sync::Arc;
use std::time::Duration;

/// Callback type for download completion events
pub type DownloadCallback = Box<dyn Fn(&Summary) + Send + Sync>;

/// Default interval between two status line updates.
pub const DEFAULT_UI_DELAY: Duration = Duration::from_secs(1);

/// Configuration structure for the downloader
#[derive(Clone)]
pub struct DownloaderConfig {
    /// Number of workers in the pool. Never less than one.
    pub workers: usize,
    /// Report every order as done without fetching anything.
    pub dry_run: bool,
    /// Log the start of every order at INFO.
    pub verbose: bool,
    /// Interval between status line updates.
    pub ui_delay: Duration,
    /// Orders buffered between the dispatcher and the pool.
    pub queue_capacity: usize,
    /// Status line style.
    pub style_options: ProgressBarOpts,
    /// HTTP client settings.
    pub http: HttpClientConfig,
    /// Callback for when each order completes.
    pub on_complete: Option<Arc<DownloadCallback>>,
}

impl std::fmt::Debug for DownloaderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloaderConfig")
            .field("workers", &self.workers)
            .field("dry_run", &self.dry_run)
            .field("verbose", &self.verbose)
            .field("ui_delay", &self.ui_delay)
            .field("queue_capacity", &self.queue_capacity)
            .field("style_options", &self.style_options)
            .field("http", &self.http)
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            dry_run: false,
            verbose: false,
            ui_delay: DEFAULT_UI_DELAY,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            style_options: ProgressBarOpts::default(),
            http: HttpClientConfig::default(),
            on_complete: None,
        }
    }
}
