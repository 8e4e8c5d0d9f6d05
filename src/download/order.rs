//! Work orders and the events flowing back to the coordinator.

use super::download::Download;
use reqwest::Url;
use tokio::sync::mpsc::UnboundedSender;

/// Events consumed by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// A worker finished writing this file.
    FileDone(Url),
    /// Snapshot of the byte counter.
    BytesProgress(u64),
    /// A line of text to print above the progress line.
    TerminalMessage(String),
}

/// One file to fetch, plus the channel the worker reports completion on.
#[derive(Debug, Clone)]
pub struct Order {
    pub download: Download,
    pub notify: UnboundedSender<UiEvent>,
}

impl Order {
    pub fn new(download: Download, notify: UnboundedSender<UiEvent>) -> Self {
        Self { download, notify }
    }

    /// Report the file as done. A coordinator that already stopped listening
    /// is not an error.
    pub(crate) fn file_done(&self) {
        let _ = self
            .notify
            .send(UiEvent::FileDone(self.download.url.clone()));
    }
}
