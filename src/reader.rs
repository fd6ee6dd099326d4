//! Reads the newest lines of a growing log file.

use std::io::SeekFrom;
use std::path::PathBuf;

use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// Errors that can occur while reading the log tail
#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Reads a fixed number of bytes from the end of a log file
#[derive(Debug, Clone)]
pub struct LogTailReader {
    path: PathBuf,
    bytes_to_read: u64,
    average_line_bytes: u64,
}

impl LogTailReader {
    pub fn new(path: impl Into<PathBuf>, bytes_to_read: u64, average_line_bytes: u64) -> Self {
        Self {
            path: path.into(),
            bytes_to_read,
            average_line_bytes: average_line_bytes.max(1),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Read the last `bytes_to_read` bytes and split them into lines.
    ///
    /// When the read starts inside the file the first line is dropped, it
    /// is most likely cut in half. Empty lines are skipped.
    pub async fn read_last_lines(&self) -> Result<Vec<String>, ReaderError> {
        let mut file = File::open(&self.path).await.map_err(|source| ReaderError::Open {
            path: self.path.clone(),
            source,
        })?;
        let read_err = |source: std::io::Error| ReaderError::Read {
            path: self.path.clone(),
            source,
        };

        let size = file.metadata().await.map_err(read_err)?.len();
        let offset = size.saturating_sub(self.bytes_to_read);
        file.seek(SeekFrom::Start(offset)).await.map_err(read_err)?;

        let mut buffer = Vec::with_capacity((size - offset) as usize);
        file.take(self.bytes_to_read)
            .read_to_end(&mut buffer)
            .await
            .map_err(read_err)?;

        Ok(self.split_lines(&buffer, offset > 0))
    }

    fn split_lines(&self, buffer: &[u8], partial_head: bool) -> Vec<String> {
        let text = String::from_utf8_lossy(buffer);
        let mut lines = Vec::with_capacity((buffer.len() as u64 / self.average_line_bytes) as usize + 1);
        let mut segments = text.split('\n');
        if partial_head {
            segments.next();
        }

        for segment in segments {
            let line = segment.strip_suffix('\r').unwrap_or(segment);
            if !line.is_empty() {
                lines.push(line.to_string());
            }
        }

        lines
    }
}
