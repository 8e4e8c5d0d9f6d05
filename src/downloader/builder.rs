//! Builder pattern implementation for creating Downloader instances.
//!
//! # Examples
//!
//! ## Basic Builder Usage
//!
//! ```rust
//! use slurp::downloader::DownloaderBuilder;
//! use std::time::Duration;
//!
//! let downloader = DownloaderBuilder::new()
//!     .workers(4)
//!     .ui_delay(Duration::from_millis(250))
//!     .retries(2)
//!     .build();
//! assert_eq!(downloader.workers(), 4);
//! ```
//!
//! ## Advanced Configuration with Callbacks
//!
//! ```rust
//! use slurp::downloader::DownloaderBuilder;
//! use slurp::download::TransferOutcome;
//! use reqwest::header::{HeaderValue, AUTHORIZATION};
//!
//! let downloader = DownloaderBuilder::new()
//!     .header(AUTHORIZATION, HeaderValue::from_static("Basic aGk6MTIzNDU2Cg=="))
//!     .on_complete(|summary| {
//!         if let TransferOutcome::Failed(msg) = summary.outcome() {
//!             println!("Failed to download {}: {}", summary.download().filename, msg);
//!         }
//!     })
//!     .build();
//! ```
//!
//! ## Hidden Status Line
//!
//! ```rust
//! use slurp::downloader::DownloaderBuilder;
//!
//! let downloader = DownloaderBuilder::hidden().build();
//! ```

use super::{config::DownloaderConfig, downloader::Downloader};
use crate::download::Summary;
use crate::progress::ProgressBarOpts;

use reqwest::header::{HeaderMap, HeaderValue, IntoHeaderName};
use std::{sync::Arc, time::Duration};

/// A builder used to create a [`Downloader`].
///
/// ```rust
/// # fn main()  {
/// use slurp::downloader::DownloaderBuilder;
///
/// let d = DownloaderBuilder::new().workers(8).dry_run(true).build();
/// # }
/// ```
#[derive(Default)]
pub struct DownloaderBuilder {
    config: DownloaderConfig,
}

impl DownloaderBuilder {
    /// Creates a builder with the default options.
    pub fn new() -> Self {
        DownloaderBuilder::default()
    }

    /// Convenience function to hide the status line.
    pub fn hidden() -> Self {
        let mut builder = DownloaderBuilder::default();
        builder.config.style_options = ProgressBarOpts::hidden();
        builder
    }

    /// Set the number of workers. Zero is raised to one.
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers.max(1);
        self
    }

    /// Report every order as done without fetching or writing anything.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.config.dry_run = dry_run;
        self
    }

    /// Log the start of every order at INFO instead of DEBUG.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    /// Set the interval between two status line updates.
    pub fn ui_delay(mut self, ui_delay: Duration) -> Self {
        self.config.ui_delay = ui_delay;
        self
    }

    /// Set how many orders may wait in the queue.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity.max(1);
        self
    }

    /// Set the status line style.
    pub fn style_options(mut self, style_options: ProgressBarOpts) -> Self {
        self.config.style_options = style_options;
        self
    }

    /// Set the number of retries on transient HTTP failures.
    pub fn retries(mut self, retries: u32) -> Self {
        self.config.http.retries = retries;
        self
    }

    /// Limit every request, body included.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.http.timeout = Some(timeout);
        self
    }

    /// Limit connection establishment.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.http.connect_timeout = Some(timeout);
        self
    }

    /// Replace the user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.http.user_agent = user_agent.into();
        self
    }

    /// Send every request through `proxy`.
    pub fn proxy(mut self, proxy: reqwest::Proxy) -> Self {
        self.config.http.proxy = Some(proxy);
        self
    }

    /// Set callback for when each order completes.
    ///
    /// The callback runs on the worker that processed the order, right after
    /// it finished, whatever the outcome.
    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Summary) + Send + Sync + 'static,
    {
        self.config.on_complete = Some(Arc::new(Box::new(callback)));
        self
    }

    /// Helper method to get or create a new HeaderMap.
    fn new_header(&self) -> HeaderMap {
        match self.config.http.headers {
            Some(ref h) => h.to_owned(),
            _ => HeaderMap::new(),
        }
    }

    /// Add the http headers.
    ///
    /// You can call `.headers()` multiple times and all `HeaderMap` will be
    /// merged into a single one.
    ///
    /// See also [`header()`].
    ///
    /// [`header()`]: DownloaderBuilder::header
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        let mut new = self.new_header();
        new.extend(headers);

        self.config.http.headers = Some(new);
        self
    }

    /// Add the http header
    pub fn header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        let mut new = self.new_header();

        new.insert(name, value);

        self.config.http.headers = Some(new);
        self
    }

    /// Create the [`Downloader`] with the specified options.
    pub fn build(self) -> Downloader {
        Downloader::new(self.config)
    }
}
