//! Metrics for the log detector.
//!
//! Counters are recorded through the `metrics` facade and are no-ops
//! until [`install_exporter`] registers the Prometheus recorder.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use log::info;
use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

pub const LINES_PARSED: &str = "detector_lines_parsed_total";
pub const PARSE_ERRORS: &str = "detector_parse_errors_total";
pub const CHUNKS_ABANDONED: &str = "detector_chunks_abandoned_total";
pub const FLAGGED: &str = "detector_flagged_total";
pub const SCANS: &str = "detector_scans_total";
pub const LAST_FLAGGED: &str = "detector_last_flagged_count";

/// Start the Prometheus HTTP listener on `addr`
pub fn install_exporter(addr: &str) -> Result<()> {
    let addr: SocketAddr = addr
        .parse()
        .with_context(|| format!("invalid metrics address {addr:?}"))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("failed to install Prometheus exporter")?;

    info!("Prometheus exporter listening on {}", addr);
    Ok(())
}

pub fn record_lines_parsed(count: u64) {
    counter!(LINES_PARSED, count);
}

pub fn record_parse_error() {
    counter!(PARSE_ERRORS, 1);
}

pub fn record_chunk_abandoned() {
    counter!(CHUNKS_ABANDONED, 1);
}

/// Record the outcome of one scan
pub fn record_scan(flagged: usize) {
    counter!(SCANS, 1);
    counter!(FLAGGED, flagged as u64);
    gauge!(LAST_FLAGGED, flagged as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_exporter_address() {
        let err = install_exporter("not an address").unwrap_err();
        assert!(err.to_string().contains("invalid metrics address"));
    }

    #[test]
    fn test_recording_without_exporter_is_noop() {
        record_lines_parsed(10);
        record_parse_error();
        record_chunk_abandoned();
        record_scan(3);
    }
}
