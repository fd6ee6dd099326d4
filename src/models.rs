use std::collections::HashSet;
use std::num::NonZeroUsize;

use chrono::{DateTime, Duration, FixedOffset};
use serde::{Deserialize, Serialize};

/// Addresses flagged during one detection run.
pub type FlaggedSet = HashSet<String>;

/// One parsed access log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Time the request was logged
    pub timestamp: DateTime<FixedOffset>,
    /// Client address as written in the log (IPv4 or IPv6 literal)
    pub source_address: String,
    /// Requested path, used for URL filtering
    pub requested_path: String,
    /// User agent string
    pub user_agent: String,
}

/// Raw application settings as loaded from file and environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Access log to tail
    pub log_path: String,
    /// Seconds between two scans
    pub read_interval_secs: u64,
    /// Number of bytes read from the end of the log on each scan
    pub bytes_to_read: u64,
    /// Average log line size, used to size the line buffer
    pub average_line_bytes: u64,
    /// Requests inside one window that flag an address
    pub threshold: u32,
    /// Window length in seconds
    pub time_window_secs: u64,
    /// Substring a requested path must contain to be counted (empty matches all)
    pub url_pattern: String,
    /// Lines per chunk processed by one worker
    pub lines_in_group: usize,
    /// File receiving flagged addresses
    pub output_path: String,
    /// Truncate the output file instead of appending
    pub output_overwrite: bool,
    /// Drop flagged addresses that are not IPv4 literals
    pub only_ipv4: bool,
    /// Parse lines as JSON objects instead of the combined format
    pub json_log_format: bool,
    /// chrono format string for the JSON `time` field; RFC 3339 when unset
    pub json_time_layout: Option<String>,
    /// Listen address for the Prometheus exporter
    pub metrics_addr: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_path: "/var/log/nginx/access.log".to_string(),
            read_interval_secs: 60,
            bytes_to_read: 1024,
            average_line_bytes: 157,
            threshold: 10,
            time_window_secs: 60,
            url_pattern: String::new(),
            lines_in_group: 100,
            output_path: "blocked_ips.txt".to_string(),
            output_overwrite: false,
            only_ipv4: false,
            json_log_format: false,
            json_time_layout: None,
            metrics_addr: None,
        }
    }
}

/// Validated detection parameters handed to the dispatcher
#[derive(Debug, Clone)]
pub struct DetectionConfig {
    /// Count at which an address is emitted, always at least 1
    pub threshold: u32,
    /// Window length, always positive
    pub window: Duration,
    /// Substring filter on the requested path
    pub url_filter: String,
    /// Keep only IPv4 addresses in the result
    pub ipv4_only: bool,
    /// Partition width
    pub chunk_size: NonZeroUsize,
}
