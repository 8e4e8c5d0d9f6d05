//! Per-order results.
//!
//! Every order taken from the queue produces exactly one [`Summary`] carrying
//! a [`TransferOutcome`].
//!
//! ```rust
//! use slurp::download::{Download, Summary, TransferOutcome};
//! use reqwest::StatusCode;
//! use std::convert::TryFrom;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let download = Download::try_from("https://example.com/file.zip")?;
//! let summary = Summary::new(download, StatusCode::OK, 2048).with_outcome(TransferOutcome::Success);
//! assert!(summary.outcome().is_success());
//! # Ok(())
//! # }
//! ```

use super::download::Download;
use reqwest::StatusCode;

/// How a single order ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The body was written to the sink.
    Success,
    /// The server reported the requested range as unsatisfiable: the
    /// destination already holds the whole file.
    AlreadyComplete,
    /// The order failed with a reason.
    Failed(String),
}

impl TransferOutcome {
    /// `true` for [`TransferOutcome::Success`] and
    /// [`TransferOutcome::AlreadyComplete`].
    pub fn is_success(&self) -> bool {
        !matches!(self, TransferOutcome::Failed(_))
    }
}

/// Represents a [`Download`] summary.
#[derive(Debug, Clone)]
pub struct Summary {
    /// Downloaded item.
    download: Download,
    /// HTTP status code.
    statuscode: StatusCode,
    /// Bytes written for this order.
    size: u64,
    /// Outcome.
    outcome: TransferOutcome,
}

impl Summary {
    /// Create a new [`Download`] [`Summary`].
    ///
    /// The outcome starts as a failure so that an early return never reports
    /// success by accident.
    pub fn new(download: Download, statuscode: StatusCode, size: u64) -> Self {
        Self {
            download,
            statuscode,
            size,
            outcome: TransferOutcome::Failed("not started".into()),
        }
    }

    /// Attach an outcome to a [`Download`] [`Summary`].
    pub fn with_outcome(self, outcome: TransferOutcome) -> Self {
        Self { outcome, ..self }
    }

    /// Get the summary's HTTP status.
    pub fn statuscode(&self) -> StatusCode {
        self.statuscode
    }

    /// Get the summary's size.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Get a reference to the summary's download.
    pub fn download(&self) -> &Download {
        &self.download
    }

    /// Get a reference to the summary's outcome.
    pub fn outcome(&self) -> &TransferOutcome {
        &self.outcome
    }

    /// Mark the summary as failed with a message.
    pub fn fail(self, msg: impl std::fmt::Display) -> Self {
        Self {
            outcome: TransferOutcome::Failed(format!("{}", msg)),
            ..self
        }
    }
}
