//! Transfer workers.
//!
//! A worker takes orders from the queue until it is drained and performs one
//! resumable GET per order:
//!
//! 1. If the sink can continue partial files and already holds some bytes
//!    for the destination, ask for the rest with `Range: bytes=<size>-`.
//! 2. `200` starts the destination over, `206` appends to it, `416` means the
//!    destination is already complete. Anything else fails the order.
//! 3. Bodies stream straight into the sink, unless the sink needs the size
//!    up front and the response has none: then the body is spooled to an
//!    anonymous temporary file first and copied across once its length is
//!    known.
//!
//! Every chunk read off the network is added to the shared [`ByteCounter`]
//! as it arrives. A failed order is logged and counted; the worker moves on.

use super::config::DownloadCallback;
use super::coordinator::DoneSignal;
use super::queue::OrderReceiver;
use crate::download::{Download, Summary, TransferOutcome};
use crate::error::{Error, Result};
use crate::progress::ByteCounter;
use crate::sink::{EntryWriter, OutputSink};

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::{header::RANGE, StatusCode};
use reqwest_middleware::ClientWithMiddleware;
use std::io::SeekFrom;
use std::path::Path;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt},
};
use tracing::{debug, info, warn};

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// What a single transfer needs.
#[derive(Debug, Clone)]
pub struct TransferContext {
    /// Client shared by the pool.
    pub client: ClientWithMiddleware,
    /// Destination shared by the pool.
    pub sink: Arc<dyn OutputSink>,
    /// Run-wide byte total.
    pub counter: ByteCounter,
    /// Report orders as done without touching the network or the sink.
    pub dry_run: bool,
}

/// Run-wide state every worker of a pool shares.
pub(crate) struct WorkerContext {
    pub(crate) transfer: TransferContext,
    pub(crate) verbose: bool,
    pub(crate) failures: Arc<AtomicUsize>,
    pub(crate) on_complete: Option<Arc<DownloadCallback>>,
    pub(crate) summaries: Mutex<Vec<Summary>>,
}

impl WorkerContext {
    fn record(&self, summary: Summary) {
        self.summaries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(summary);
    }

    pub(crate) fn take_summaries(&self) -> Vec<Summary> {
        std::mem::take(
            &mut *self
                .summaries
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }
}

/// Worker loop: process orders until the queue is drained, then signal done.
pub(crate) async fn run_worker(
    id: usize,
    ctx: Arc<WorkerContext>,
    orders: OrderReceiver,
    done: DoneSignal,
) {
    // Signals on drop, also if a transfer panics.
    let _done = done;

    while let Some(order) = orders.next().await {
        let filename = &order.download.filename;
        if ctx.verbose {
            info!(worker = id, "Starting {:?}", filename);
        } else {
            debug!(worker = id, "Starting {:?}", filename);
        }

        let summary = transfer(&ctx.transfer, &order.download).await;
        match summary.outcome() {
            TransferOutcome::Failed(reason) => {
                warn!(url = %order.download.url, "Failed downloading {:?}: {}", filename, reason);
                ctx.failures.fetch_add(1, Ordering::SeqCst);
            }
            TransferOutcome::AlreadyComplete => {
                debug!("{:?} was already fully downloaded", filename);
                order.file_done();
            }
            TransferOutcome::Success => order.file_done(),
        }

        if let Some(ref callback) = ctx.on_complete {
            callback(&summary);
        }
        ctx.record(summary);
    }

    debug!(worker = id, "Order queue drained, worker done");
}

/// Perform one order and report how it ended. Never panics on network or
/// sink errors; they end up in [`TransferOutcome::Failed`].
pub async fn transfer(ctx: &TransferContext, download: &Download) -> Summary {
    let summary = Summary::new(download.clone(), StatusCode::BAD_REQUEST, 0);
    if ctx.dry_run {
        debug!("Dry run, skipping {}", download.url);
        return Summary::new(download.clone(), StatusCode::OK, 0)
            .with_outcome(TransferOutcome::Success);
    }

    let path = Path::new(&download.filename);

    // Resume from whatever the sink already holds.
    let offset = if ctx.sink.has_partial_support() {
        match ctx.sink.existing_len(path).await {
            Ok(len) => len,
            Err(e) => return summary.fail(e),
        }
    } else {
        None
    };

    debug!("Fetching {}", &download.url);
    let mut req = ctx.client.get(download.url.clone());
    if let Some(offset) = offset {
        debug!(offset, "Resuming {:?}", path);
        req = req.header(RANGE, format!("bytes={}-", offset));
    }

    let res = match req.send().await {
        Ok(res) => res,
        Err(e) => return summary.fail(Error::from(e)),
    };

    let status = res.status();
    let summary = Summary::new(download.clone(), status, 0);
    let append = match status {
        StatusCode::OK => false,
        StatusCode::PARTIAL_CONTENT => true,
        StatusCode::RANGE_NOT_SATISFIABLE => {
            return summary.with_outcome(TransferOutcome::AlreadyComplete)
        }
        _ => {
            return summary.fail(Error::UnexpectedStatus {
                url: download.url.to_string(),
                status,
            })
        }
    };

    let content_length = res.content_length();
    let body = Box::pin(res.bytes_stream());
    let written = if ctx.sink.requires_known_size_upfront() && content_length.is_none() {
        spool_then_copy(ctx.sink.as_ref(), &ctx.counter, path, body).await
    } else {
        stream_to_sink(
            ctx.sink.as_ref(),
            &ctx.counter,
            path,
            append,
            content_length,
            body,
        )
        .await
    };

    match written {
        Ok(size) => Summary::new(download.clone(), status, size)
            .with_outcome(TransferOutcome::Success),
        Err(e) => summary.fail(e),
    }
}

/// Copy every chunk of `body` into `writer`, counting bytes as they arrive.
pub async fn copy_body<S, B, E>(
    body: &mut S,
    counter: &ByteCounter,
    writer: &mut dyn EntryWriter,
) -> Result<u64>
where
    S: Stream<Item = std::result::Result<B, E>> + Unpin + Send,
    B: AsRef<[u8]> + Send,
    E: Into<Error> + Send,
{
    let mut copied = 0;
    while let Some(item) = body.next().await {
        let chunk = item.map_err(Into::into)?;
        let chunk = chunk.as_ref();
        let len = chunk.len() as u64;
        counter.add(len);
        writer.write_all(chunk).await?;
        copied += len;
    }
    Ok(copied)
}

/// Stream `body` directly into a fresh or appended sink entry.
pub async fn stream_to_sink<S, B, E>(
    sink: &dyn OutputSink,
    counter: &ByteCounter,
    path: &Path,
    append: bool,
    expected_size: Option<u64>,
    mut body: S,
) -> Result<u64>
where
    S: Stream<Item = std::result::Result<B, E>> + Unpin + Send,
    B: AsRef<[u8]> + Send,
    E: Into<Error> + Send,
{
    let mut writer = if append {
        sink.append(path, expected_size).await?
    } else {
        sink.create(path, expected_size).await?
    };

    let copied = copy_body(&mut body, counter, writer.as_mut()).await;
    let finished = writer.finish().await;
    let copied = copied?;
    finished?;
    Ok(copied)
}

/// Spool `body` to a temporary file, then write it to the sink with its
/// exact size.
pub async fn spool_then_copy<S, B, E>(
    sink: &dyn OutputSink,
    counter: &ByteCounter,
    path: &Path,
    mut body: S,
) -> Result<u64>
where
    S: Stream<Item = std::result::Result<B, E>> + Unpin + Send,
    B: AsRef<[u8]> + Send,
    E: Into<Error> + Send,
{
    let mut spool = Spool {
        file: File::from_std(tempfile::tempfile()?),
    };
    let len = copy_body(&mut body, counter, &mut spool).await?;
    spool.finish().await?;
    debug!(len, "Spooled body of unknown length for {:?}", path);

    let mut file = spool.file;
    file.seek(SeekFrom::Start(0)).await?;

    let mut writer = sink.create(path, Some(len)).await?;
    let copied = copy_spool(&mut file, writer.as_mut()).await;
    let finished = writer.finish().await;
    copied?;
    finished?;
    Ok(len)
}

async fn copy_spool(file: &mut File, writer: &mut dyn EntryWriter) -> Result<()> {
    let mut buf = vec![0u8; COPY_BUFFER_SIZE];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        writer.write_all(&buf[..n]).await?;
    }
}

/// Anonymous temporary file, removed by the OS once closed.
struct Spool {
    file: File,
}

#[async_trait]
impl EntryWriter for Spool {
    async fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        self.file.write_all(buf).await?;
        Ok(())
    }

    async fn finish(&mut self) -> Result<()> {
        self.file.flush().await?;
        Ok(())
    }
}
