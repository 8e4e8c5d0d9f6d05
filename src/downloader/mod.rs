//! The transfer engine: worker pool, order queue, coordinator and
//! configuration.
//!
//! - `downloader` - [`Downloader`] and the run lifecycle
//! - `builder` - [`DownloaderBuilder`] for configuring a [`Downloader`]
//! - `config` - configuration structures and callback types
//! - `queue` - the bounded order queue and the dispatcher
//! - `worker` - resumable transfers of single orders
//! - `coordinator` - progress ticks, completion and interruption
//!
//! # Examples
//!
//! ```rust,no_run
//! use slurp::downloader::DownloaderBuilder;
//! use slurp::download::Download;
//! use slurp::sink::ArchiveSink;
//! use std::convert::TryFrom;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let sink = ArchiveSink::create_file("mirror.tar").await?;
//! let downloads = vec![Download::try_from("https://example.com/pub/a.iso")?];
//!
//! let report = DownloaderBuilder::new()
//!     .workers(2)
//!     .on_complete(|summary| println!("{}", summary.download().filename))
//!     .build()
//!     .run(&downloads, Arc::new(sink), CancellationToken::new())
//!     .await?;
//! assert!(report.is_success());
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod coordinator;
pub mod downloader;
pub mod queue;
pub mod worker;

pub use builder::DownloaderBuilder;
pub use config::{DownloadCallback, DownloaderConfig};
pub use coordinator::CoordinatorExit;
pub use downloader::{Downloader, RunReport};
pub use queue::{dispatch, order_queue, OrderReceiver, OrderSender, QueueState};
pub use worker::{transfer, TransferContext};
