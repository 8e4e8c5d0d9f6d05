//! Output sinks.
//!
//! A sink turns response bodies into persisted output. Workers only ever see
//! the [`OutputSink`] capability set, never a concrete sink:
//!
//! - [`DirectSink`] writes loose files under a root directory. It can append
//!   to a partial file and does not need to know sizes in advance.
//! - [`ArchiveSink`] writes every file as an entry of one tar container. Tar
//!   headers carry the entry size, so the size must be known before the first
//!   body byte is written, and there is no append.
//!
//! ```rust,no_run
//! use slurp::sink::{DirectSink, EntryWriter, OutputSink};
//! use std::path::Path;
//!
//! # async fn example() -> slurp::Result<()> {
//! let sink = DirectSink::new("downloads");
//! let mut writer = sink.create(Path::new("a.txt"), Some(5)).await?;
//! writer.write_all(b"hello").await?;
//! writer.finish().await?;
//! sink.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod direct;

pub use archive::ArchiveSink;
pub use direct::DirectSink;

use crate::error::Result;

use async_trait::async_trait;
use std::fmt::Debug;
use std::path::Path;

/// Destination for the body of one order.
///
/// Callers must always call [`EntryWriter::finish`], also after a failed
/// body read, so the sink can leave its output in a consistent state.
#[async_trait]
pub trait EntryWriter: Send {
    /// Write the whole buffer.
    async fn write_all(&mut self, buf: &[u8]) -> Result<()>;

    /// Flush and finalize the entry. Calling it twice is a no-op.
    async fn finish(&mut self) -> Result<()>;
}

/// The destination of a run.
///
/// One sink exists per run. It is created before any worker starts and
/// closed exactly once after the workers are done.
#[async_trait]
pub trait OutputSink: Send + Sync + Debug {
    /// Open `path` fresh. `expected_size` is the exact body length when known.
    async fn create(&self, path: &Path, expected_size: Option<u64>)
        -> Result<Box<dyn EntryWriter>>;

    /// Open `path` to continue a partial file.
    async fn append(&self, path: &Path, expected_size: Option<u64>)
        -> Result<Box<dyn EntryWriter>>;

    /// Whether partial files can be continued with [`OutputSink::append`].
    fn has_partial_support(&self) -> bool;

    /// Whether [`OutputSink::create`] needs the exact size.
    fn requires_known_size_upfront(&self) -> bool;

    /// Size of what is already stored at `path`, for sinks with partial
    /// support.
    async fn existing_len(&self, _path: &Path) -> Result<Option<u64>> {
        Ok(None)
    }

    /// Finalize the output.
    async fn close(&self) -> Result<()>;
}
