//! Loose files under a root directory.

use super::{EntryWriter, OutputSink};
use crate::error::{Error, Result};

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::{
    fs::{self, File, OpenOptions},
    io::{AsyncWriteExt, BufWriter},
};
use tracing::debug;

/// Writes each path as an independent file below `root`.
///
/// Distinct orders write distinct files, so no locking is involved.
#[derive(Debug)]
pub struct DirectSink {
    root: PathBuf,
    closed: AtomicBool,
}

impl DirectSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            closed: AtomicBool::new(false),
        }
    }

    /// Directory the files are written to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where `path` lands on disk.
    pub fn destination(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    async fn open(&self, path: &Path, append: bool) -> Result<Box<dyn EntryWriter>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::Sink("output directory sink is closed".into()));
        }

        let output = self.destination(path);
        let output_dir = output.parent().unwrap_or(&self.root);
        debug!("Creating destination directory {:?}", output_dir);
        fs::create_dir_all(output_dir).await?;

        debug!(append, "Opening destination file {:?}", &output);
        let mut options = OpenOptions::new();
        options.create(true).write(true);
        if append {
            options.append(true);
        } else {
            options.truncate(true);
        }
        let file = options.open(&output).await?;

        Ok(Box::new(FileWriter {
            file: BufWriter::new(file),
            finished: false,
        }))
    }
}

#[async_trait]
impl OutputSink for DirectSink {
    async fn create(
        &self,
        path: &Path,
        _expected_size: Option<u64>,
    ) -> Result<Box<dyn EntryWriter>> {
        self.open(path, false).await
    }

    async fn append(
        &self,
        path: &Path,
        _expected_size: Option<u64>,
    ) -> Result<Box<dyn EntryWriter>> {
        self.open(path, true).await
    }

    fn has_partial_support(&self) -> bool {
        true
    }

    fn requires_known_size_upfront(&self) -> bool {
        false
    }

    async fn existing_len(&self, path: &Path) -> Result<Option<u64>> {
        match fs::metadata(self.destination(path)).await {
            Ok(m) if m.is_file() => Ok(Some(m.len())),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            debug!("Output directory sink closed twice");
        }
        Ok(())
    }
}

struct FileWriter {
    file: BufWriter<File>,
    finished: bool,
}

#[async_trait]
impl EntryWriter for FileWriter {
    async fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        self.file.write_all(buf).await?;
        Ok(())
    }

    async fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.file.flush().await?;
        Ok(())
    }
}
