//! Access log line parsing.
//!
//! A parser turns one raw log line into a [`Record`]. Parsers hold no
//! mutable state, so a single instance is shared by every chunk worker.

pub mod nginx;

use thiserror::Error;

use crate::models::Record;

pub use nginx::NginxParser;

/// Errors that can occur while parsing a log line
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("line does not match the log format: {0}")]
    Format(String),
    #[error("invalid timestamp {value:?}: {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("invalid JSON log line: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parses raw log lines into records
#[cfg_attr(test, mockall::automock)]
pub trait LineParser: Send + Sync {
    fn parse(&self, line: &str) -> Result<Record, ParseError>;
}
