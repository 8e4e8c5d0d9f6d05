//! Core downloader implementation: the worker pool and the run lifecycle.
//!
//! A run goes through these steps:
//!
//! 1. spawn the dispatcher, which fills the bounded order queue and closes it;
//! 2. spawn the fixed pool of workers sharing the queue, the HTTP client,
//!    the byte counter and the sink;
//! 3. run the coordinator until every worker is done or the run is
//!    interrupted;
//! 4. close the sink exactly once and print the final totals.
//!
//! # Examples
//!
//! ```rust,no_run
//! use slurp::downloader::DownloaderBuilder;
//! use slurp::download::Download;
//! use slurp::sink::DirectSink;
//! use std::convert::TryFrom;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let downloader = DownloaderBuilder::new().workers(4).build();
//! let downloads = vec![
//!     Download::try_from("https://example.com/pub/file1.zip")?,
//!     Download::try_from("https://example.com/pub/file2.pdf")?,
//! ];
//!
//! let report = downloader
//!     .run(&downloads, Arc::new(DirectSink::new("downloads")), CancellationToken::new())
//!     .await?;
//! println!("{} files, {} bytes, {} failed", report.files_done, report.bytes, report.failures);
//! # Ok(())
//! # }
//! ```

use super::config::DownloaderConfig;
use super::coordinator::{done_channel, Coordinator, CoordinatorExit, DoneSignal};
use super::queue::{dispatch, order_queue};
use super::worker::{run_worker, TransferContext, WorkerContext};
use crate::download::{Download, Summary};
use crate::error::Result;
use crate::http::{create_http_client, HttpClientConfig};
use crate::progress::{ByteCounter, ProgressBarOpts, ProgressDisplay};
use crate::sink::OutputSink;

use std::fmt;
use std::fmt::Debug;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// What a run did.
#[derive(Debug)]
pub struct RunReport {
    /// One summary per processed order. Orders abandoned by an interrupt
    /// have none.
    pub summaries: Vec<Summary>,
    /// Failed orders, lost workers and a failed sink close.
    pub failures: usize,
    /// Bytes read from response bodies.
    pub bytes: u64,
    /// Files reported done.
    pub files_done: usize,
    /// The run stopped on an interrupt.
    pub interrupted: bool,
    /// Wall time of the run.
    pub elapsed: Duration,
}

impl RunReport {
    /// No failure and no interrupt.
    pub fn is_success(&self) -> bool {
        self.failures == 0 && !self.interrupted
    }
}

/// Represents the download controller.
///
/// A downloader can be created via its builder:
///
/// ```rust
/// # fn main()  {
/// use slurp::downloader::DownloaderBuilder;
///
/// let d = DownloaderBuilder::new().build();
/// # }
/// ```
#[derive(Clone)]
pub struct Downloader {
    config: DownloaderConfig,
}

impl Debug for Downloader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Downloader")
            .field("config", &self.config)
            .finish()
    }
}

impl Downloader {
    /// Creates a new Downloader with the given configuration.
    pub(crate) fn new(config: DownloaderConfig) -> Self {
        Self { config }
    }

    /// Gets the number of workers.
    pub fn workers(&self) -> usize {
        self.config.workers.max(1)
    }

    /// Gets whether this is a dry run.
    pub fn dry_run(&self) -> bool {
        self.config.dry_run
    }

    /// Gets the status line update interval.
    pub fn ui_delay(&self) -> Duration {
        self.config.ui_delay
    }

    /// Gets the order queue capacity.
    pub fn queue_capacity(&self) -> usize {
        self.config.queue_capacity
    }

    /// Gets the status line style.
    pub fn style_options(&self) -> &ProgressBarOpts {
        &self.config.style_options
    }

    /// Gets the HTTP client settings.
    pub fn http(&self) -> &HttpClientConfig {
        &self.config.http
    }

    /// Fetch every download into `sink`.
    ///
    /// Per-order failures never stop the run; they are counted in the
    /// report. Cancelling `cancel` stops waiting for the workers: the sink is
    /// closed and the report returned while transfers may still be in
    /// flight. The only error is failing to build the HTTP client.
    pub async fn run(
        &self,
        downloads: &[Download],
        sink: Arc<dyn OutputSink>,
        cancel: CancellationToken,
    ) -> Result<RunReport> {
        let client = create_http_client(self.config.http.clone())?;
        let counter = ByteCounter::new();
        let failures = Arc::new(AtomicUsize::new(0));
        let workers = self.workers();

        let ctx = Arc::new(WorkerContext {
            transfer: TransferContext {
                client,
                sink: sink.clone(),
                counter: counter.clone(),
                dry_run: self.config.dry_run,
            },
            verbose: self.config.verbose,
            failures: failures.clone(),
            on_complete: self.config.on_complete.clone(),
            summaries: Mutex::new(Vec::with_capacity(downloads.len())),
        });

        let display = ProgressDisplay::new(self.config.style_options.clone(), downloads.len());

        // Orders carry the only senders of the event channel.
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (sender, receiver) = order_queue(self.config.queue_capacity);
        let dispatcher = tokio::spawn(dispatch(sender, downloads.to_vec(), events_tx));

        let (done_tx, done_rx) = done_channel();
        let handles: Vec<_> = (0..workers)
            .map(|id| {
                let signal = DoneSignal::new(id, done_tx.clone());
                tokio::spawn(run_worker(id, ctx.clone(), receiver.clone(), signal))
            })
            .collect();
        drop(done_tx);
        drop(receiver);
        debug!(workers, orders = downloads.len(), "Worker pool started");

        let coordinator = Coordinator::new(display, counter.clone(), self.config.ui_delay, workers);
        let (exit, display) = coordinator.run(events_rx, done_rx, cancel).await;
        let interrupted = exit == CoordinatorExit::Interrupted;

        if interrupted {
            debug!("Abandoning in-flight transfers");
        } else {
            for handle in handles {
                if let Err(e) = handle.await {
                    warn!("Worker lost: {}", e);
                    failures.fetch_add(1, Ordering::SeqCst);
                }
            }
            if let Err(e) = dispatcher.await {
                warn!("Dispatcher lost: {}", e);
            }
        }

        if let Err(e) = sink.close().await {
            error!("Failed to finalize output: {}", e);
            failures.fetch_add(1, Ordering::SeqCst);
        }

        let failures = failures.load(Ordering::SeqCst);
        let report = RunReport {
            summaries: ctx.take_summaries(),
            failures,
            bytes: counter.snapshot(),
            files_done: display.files_done(),
            interrupted,
            elapsed: display.elapsed(),
        };
        display.finish(failures);

        Ok(report)
    }
}
