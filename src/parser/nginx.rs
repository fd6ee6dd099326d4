//! nginx access log parser.
//!
//! Supports the stock `combined` format and a JSON `log_format` keyed by
//! `ip`, `uri` and `time`. Only `time` is required; a missing `ip` or `uri`
//! reads as an empty string.

use std::sync::OnceLock;

use chrono::{DateTime, FixedOffset};
use regex::Regex;
use serde::Deserialize;

use super::{LineParser, ParseError};
use crate::models::Record;

/// Timestamp layout of the combined format, e.g. `18/Jul/2023:13:44:17 +0000`
pub const COMBINED_TIME_LAYOUT: &str = "%d/%b/%Y:%H:%M:%S %z";

fn combined_regex() -> &'static Regex {
    static COMBINED: OnceLock<Regex> = OnceLock::new();
    COMBINED.get_or_init(|| {
        Regex::new(
            r#"^(\S+) \S+ \S+ \[([^\]]+)\] "[A-Z]+ (\S+) HTTP/\d(?:\.\d)?" \d{3} \d+ "[^"]*" "([^"]*)""#,
        )
        .expect("Invalid combined log regex")
    })
}

#[derive(Debug, Deserialize)]
struct JsonLine {
    #[serde(default)]
    ip: String,
    #[serde(default)]
    uri: String,
    time: String,
    #[serde(default)]
    user_agent: String,
}

#[derive(Debug, Clone)]
enum Format {
    Combined,
    Json { time_layout: Option<String> },
}

/// Parser for nginx access logs
#[derive(Debug, Clone)]
pub struct NginxParser {
    format: Format,
}

impl NginxParser {
    /// Parser for the default `combined` log format
    pub fn combined() -> Self {
        Self { format: Format::Combined }
    }

    /// Parser for JSON lines. `time_layout` is a chrono format string;
    /// when `None` the `time` field is read as RFC 3339.
    pub fn json(time_layout: Option<String>) -> Self {
        Self { format: Format::Json { time_layout } }
    }

    fn parse_combined(&self, line: &str) -> Result<Record, ParseError> {
        let captures = combined_regex()
            .captures(line)
            .ok_or_else(|| ParseError::Format(line.to_string()))?;

        let timestamp = parse_timestamp(&captures[2], Some(COMBINED_TIME_LAYOUT))?;

        Ok(Record {
            timestamp,
            source_address: captures[1].to_string(),
            requested_path: captures[3].to_string(),
            user_agent: captures[4].to_string(),
        })
    }

    fn parse_json(&self, line: &str, time_layout: Option<&str>) -> Result<Record, ParseError> {
        let row: JsonLine = serde_json::from_str(line)?;
        let timestamp = parse_timestamp(&row.time, time_layout)?;

        Ok(Record {
            timestamp,
            source_address: row.ip,
            requested_path: row.uri,
            user_agent: row.user_agent,
        })
    }
}

impl LineParser for NginxParser {
    fn parse(&self, line: &str) -> Result<Record, ParseError> {
        match &self.format {
            Format::Combined => self.parse_combined(line),
            Format::Json { time_layout } => self.parse_json(line, time_layout.as_deref()),
        }
    }
}

fn parse_timestamp(value: &str, layout: Option<&str>) -> Result<DateTime<FixedOffset>, ParseError> {
    let parsed = match layout {
        Some(layout) => DateTime::parse_from_str(value, layout),
        None => DateTime::parse_from_rfc3339(value),
    };
    parsed.map_err(|source| ParseError::Timestamp {
        value: value.to_string(),
        source,
    })
}
