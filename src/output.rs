//! Writes flagged addresses for downstream blocking.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::models::FlaggedSet;

/// Errors that can occur while writing flagged addresses
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Write one address per line, sorted, appending unless `overwrite` is set.
///
/// Returns the number of addresses written.
pub async fn write_flagged(flagged: &FlaggedSet, path: &Path, overwrite: bool) -> Result<usize, OutputError> {
    let mut options = OpenOptions::new();
    options.create(true);
    if overwrite {
        options.write(true).truncate(true);
    } else {
        options.append(true);
    }

    let mut file = options.open(path).await.map_err(|source| OutputError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut addresses: Vec<&String> = flagged.iter().collect();
    addresses.sort();

    let mut contents = String::new();
    for address in &addresses {
        contents.push_str(address);
        contents.push('\n');
    }

    let write_err = |source: std::io::Error| OutputError::Write {
        path: path.to_path_buf(),
        source,
    };
    file.write_all(contents.as_bytes()).await.map_err(write_err)?;
    file.flush().await.map_err(write_err)?;

    Ok(addresses.len())
}
