//! Tar container output.
//!
//! Every path becomes one regular-file entry. A tar entry is a 512 byte
//! header carrying the body size, the body, and zero padding up to the next
//! 512 byte boundary; the container ends with two zero blocks.
//!
//! All workers share the one container, so entries are written one at a
//! time: [`ArchiveSink::create`](super::OutputSink::create) takes the
//! container lock and the returned writer keeps it until the entry is
//! finished.
//!
//! Names longer than the 100 byte header field are preceded by a GNU
//! `././@LongLink` entry holding the full name.
//!
//! Closing never waits for an entry in flight. When a writer holds the lock,
//! [`close`](super::OutputSink::close) only marks the container as closing
//! and the writer appends the trailer once its entry is finished.

use super::{EntryWriter, OutputSink};
use crate::error::{Error, Result};

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::{
    fs::File,
    io::{AsyncWrite, AsyncWriteExt, BufWriter},
    sync::{Mutex, OwnedMutexGuard},
};
use tracing::{debug, warn};

const BLOCK_SIZE: u64 = 512;
const ZEROS: [u8; BLOCK_SIZE as usize] = [0; BLOCK_SIZE as usize];
const NAME_FIELD_LEN: usize = 100;
const LONG_LINK_NAME: &[u8] = b"././@LongLink";

type Container = BufWriter<Box<dyn AsyncWrite + Send + Unpin>>;

struct ArchiveState {
    /// `None` once the container is closed.
    out: Option<Container>,
    /// Entries fully written.
    entries: usize,
    /// An entry writer was dropped before it finished.
    poisoned: bool,
}

/// Writes every path as an entry of a single tar container.
pub struct ArchiveSink {
    state: Arc<Mutex<ArchiveState>>,
    /// Set by `close`; the next holder of the lock finalizes the container.
    closing: Arc<AtomicBool>,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for ArchiveSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveSink")
            .field("path", &self.path)
            .finish()
    }
}

impl ArchiveSink {
    /// Create (or truncate) the container file at `path`.
    pub async fn create_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        debug!("Creating archive {:?}", &path);
        let file = File::create(&path).await?;
        let mut sink = Self::new(file);
        sink.path = Some(path);
        Ok(sink)
    }

    /// Write the container to any async writer.
    pub fn new<W>(out: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let out: Box<dyn AsyncWrite + Send + Unpin> = Box::new(out);
        Self {
            state: Arc::new(Mutex::new(ArchiveState {
                out: Some(BufWriter::new(out)),
                entries: 0,
                poisoned: false,
            })),
            closing: Arc::new(AtomicBool::new(false)),
            path: None,
        }
    }

    /// Container path, when backed by a file.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of entries fully written so far.
    pub async fn entries(&self) -> usize {
        self.state.lock().await.entries
    }
}

/// Build the header blocks of a regular-file entry: the entry header,
/// preceded by a GNU long name entry when `path` does not fit the header.
pub fn entry_header(path: &Path, size: u64) -> Result<Vec<u8>> {
    let name = path
        .to_str()
        .ok_or_else(|| Error::Sink(format!("archive entry {:?} is not UTF-8", path)))?;

    let mut header = tar::Header::new_gnu();
    let mut blocks = Vec::with_capacity(BLOCK_SIZE as usize);
    if name.len() >= NAME_FIELD_LEN {
        blocks.extend_from_slice(&long_name_blocks(name.as_bytes()));
        // Readers take the name from the long name entry.
        header.as_old_mut().name = truncated_name(name.as_bytes());
    } else {
        header.set_path(path)?;
    }
    header.set_size(size);
    header.set_mode(0o644);
    header.set_entry_type(tar::EntryType::Regular);
    header.set_mtime(
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0),
    );
    header.set_cksum();
    blocks.extend_from_slice(header.as_bytes());
    Ok(blocks)
}

/// A `././@LongLink` entry carrying `name` and its NUL terminator.
fn long_name_blocks(name: &[u8]) -> Vec<u8> {
    let size = name.len() as u64 + 1;
    let mut header = tar::Header::new_gnu();
    header.as_old_mut().name[..LONG_LINK_NAME.len()].copy_from_slice(LONG_LINK_NAME);
    header.set_size(size);
    header.set_mode(0o644);
    header.set_uid(0);
    header.set_gid(0);
    header.set_mtime(0);
    header.set_entry_type(tar::EntryType::GNULongName);
    header.set_cksum();

    let mut blocks = Vec::with_capacity((BLOCK_SIZE + size + padding(size)) as usize);
    blocks.extend_from_slice(header.as_bytes());
    blocks.extend_from_slice(name);
    blocks.push(0);
    blocks.resize(blocks.len() + padding(size) as usize, 0);
    blocks
}

fn truncated_name(name: &[u8]) -> [u8; NAME_FIELD_LEN] {
    let mut field = [0; NAME_FIELD_LEN];
    let len = name.len().min(NAME_FIELD_LEN);
    field[..len].copy_from_slice(&name[..len]);
    field
}

/// Zero bytes needed after a body of `size` bytes to reach a block boundary.
pub fn padding(size: u64) -> u64 {
    (BLOCK_SIZE - size % BLOCK_SIZE) % BLOCK_SIZE
}

async fn write_zeros(out: &mut Container, mut n: u64) -> Result<()> {
    while n > 0 {
        let len = n.min(BLOCK_SIZE);
        out.write_all(&ZEROS[..len as usize]).await?;
        n -= len;
    }
    Ok(())
}

/// Write the trailer and release the container. Finalizing twice is a no-op.
async fn finalize(state: &mut ArchiveState) -> Result<()> {
    let Some(mut out) = state.out.take() else {
        debug!("Archive closed twice");
        return Ok(());
    };

    write_zeros(&mut out, 2 * BLOCK_SIZE).await?;
    out.flush().await?;
    out.into_inner().shutdown().await?;
    debug!(entries = state.entries, "Archive closed");

    if state.poisoned {
        return Err(Error::Sink(
            "archive contains an entry that was never finished".into(),
        ));
    }
    Ok(())
}

#[async_trait]
impl OutputSink for ArchiveSink {
    async fn create(
        &self,
        path: &Path,
        expected_size: Option<u64>,
    ) -> Result<Box<dyn EntryWriter>> {
        let size = expected_size.ok_or_else(|| {
            Error::Sink(format!("archive entry {:?} needs a known size", path))
        })?;
        let header = entry_header(path, size)?;

        let mut guard = self.state.clone().lock_owned().await;
        if self.closing.load(Ordering::SeqCst) {
            // Close gave up the trailer to whoever held the lock next.
            finalize(&mut guard).await?;
            return Err(Error::Sink("archive is closed".into()));
        }
        let out = guard
            .out
            .as_mut()
            .ok_or_else(|| Error::Sink("archive is closed".into()))?;
        debug!(size, "Writing archive entry {:?}", path);
        out.write_all(&header).await?;

        Ok(Box::new(ArchiveEntryWriter {
            guard,
            closing: self.closing.clone(),
            name: path.display().to_string(),
            declared: size,
            written: 0,
            finished: false,
        }))
    }

    async fn append(
        &self,
        path: &Path,
        _expected_size: Option<u64>,
    ) -> Result<Box<dyn EntryWriter>> {
        Err(Error::Sink(format!(
            "archive entries cannot be appended to ({:?})",
            path
        )))
    }

    fn has_partial_support(&self) -> bool {
        false
    }

    fn requires_known_size_upfront(&self) -> bool {
        true
    }

    async fn close(&self) -> Result<()> {
        self.closing.store(true, Ordering::SeqCst);
        match self.state.try_lock() {
            Ok(mut state) => finalize(&mut state).await,
            Err(_) => {
                warn!("Archive entry still in flight, its writer will close the archive");
                Ok(())
            }
        }
    }
}

/// Writes one entry body while holding the container lock.
struct ArchiveEntryWriter {
    guard: OwnedMutexGuard<ArchiveState>,
    closing: Arc<AtomicBool>,
    name: String,
    declared: u64,
    written: u64,
    finished: bool,
}

impl ArchiveEntryWriter {
    fn out(&mut self) -> Result<&mut Container> {
        self.guard
            .out
            .as_mut()
            .ok_or_else(|| Error::Sink("archive is closed".into()))
    }
}

#[async_trait]
impl EntryWriter for ArchiveEntryWriter {
    async fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        let len = buf.len() as u64;
        if self.written + len > self.declared {
            return Err(Error::Sink(format!(
                "entry {} is larger than its declared {} bytes",
                self.name, self.declared
            )));
        }
        self.out()?.write_all(buf).await?;
        self.written += len;
        Ok(())
    }

    async fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;

        // Keep the container well-formed even when the body came up short.
        let short = self.declared - self.written;
        let pad = padding(self.declared);
        let out = self.out()?;
        write_zeros(out, short + pad).await?;
        self.guard.entries += 1;

        if self.closing.load(Ordering::SeqCst) {
            finalize(&mut self.guard).await?;
        }

        if short > 0 {
            warn!(entry = %self.name, short, "Archive entry zero-filled");
            return Err(Error::Sink(format!(
                "entry {} is {} bytes short of its declared size",
                self.name, short
            )));
        }
        Ok(())
    }
}

impl Drop for ArchiveEntryWriter {
    fn drop(&mut self) {
        if !self.finished {
            self.guard.poisoned = true;
        }
    }
}
