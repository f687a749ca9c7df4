//! # Log Sink
//!
//! Append-only text sink for validated records. One line per record,
//! flushed immediately, so a crash or power cut loses at most the line in
//! flight. Storage errors are fatal to the process; a logger that cannot
//! log has no degraded mode. Every failure here maps to
//! [`AquaLogError::Storage`].

use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{AquaLogError, Result};
use crate::record::Record;

/// Append-only record writer
#[derive(Debug)]
pub struct LogSink {
    file: File,
    path: PathBuf,
}

impl LogSink {
    /// Open the output file in create-if-missing append mode.
    ///
    /// Existing contents are preserved; the logger only ever appends.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the file cannot be opened for appending.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// use aqualog::sink::LogSink;
    ///
    /// let sink = LogSink::open("datos_offline.txt").await?;
    /// println!("Logging to {}", sink.path().display());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| {
                AquaLogError::Storage(format!("Failed to open {}: {}", path.display(), e))
            })?;

        Ok(Self { file, path })
    }

    /// Append one record as a single newline-terminated line and flush.
    ///
    /// The write-then-flush pair keeps the file durable per record; there
    /// is no batching and no partial-write recovery.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the write or flush fails (disk full, permission
    /// revoked).
    pub async fn append(&mut self, record: &Record) -> Result<()> {
        let line = format!("{}\n", record);

        self.file.write_all(line.as_bytes()).await.map_err(|e| {
            AquaLogError::Storage(format!("Failed to append to {}: {}", self.path.display(), e))
        })?;

        self.file.flush().await.map_err(|e| {
            AquaLogError::Storage(format!("Failed to flush {}: {}", self.path.display(), e))
        })?;

        debug!("Appended record for node {}", record.node);
        Ok(())
    }

    /// Path of the output file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
