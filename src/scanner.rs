//! Scheduled scanning of the access log.
//!
//! One scan reads the log tail, partitions it, runs detection and writes
//! the flagged addresses. [`Scanner::run`] repeats that on a fixed period
//! until its cancellation token fires.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{error, info};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::SettingsError;
use crate::core::{monitoring, partition, Dispatcher};
use crate::models::Settings;
use crate::output::write_flagged;
use crate::parser::{LineParser, NginxParser};
use crate::reader::LogTailReader;

pub struct Scanner {
    reader: LogTailReader,
    dispatcher: Dispatcher,
    output_path: PathBuf,
    overwrite: bool,
}

impl Scanner {
    pub fn new(reader: LogTailReader, dispatcher: Dispatcher, output_path: impl Into<PathBuf>, overwrite: bool) -> Self {
        Self {
            reader,
            dispatcher,
            output_path: output_path.into(),
            overwrite,
        }
    }

    /// Validate `settings` and wire the reader, parser and dispatcher
    pub fn from_settings(settings: &Settings) -> Result<Self, SettingsError> {
        let config = settings.validate()?;
        let parser: Arc<dyn LineParser> = if settings.json_log_format {
            Arc::new(NginxParser::json(settings.json_time_layout.clone()))
        } else {
            Arc::new(NginxParser::combined())
        };

        let reader = LogTailReader::new(&settings.log_path, settings.bytes_to_read, settings.average_line_bytes);
        let dispatcher = Dispatcher::new(config, parser);

        Ok(Self::new(reader, dispatcher, &settings.output_path, settings.output_overwrite))
    }

    /// Run one scan and return the number of addresses written
    pub async fn scan_once(&self, cancel: &CancellationToken) -> Result<usize> {
        let scan_id = Uuid::new_v4();
        info!("[{}] Reading the file {}", scan_id, self.reader.path().display());

        let lines = self
            .reader
            .read_last_lines()
            .await
            .context("failed to read the log tail")?;
        if lines.is_empty() {
            info!("[{}] The log file is empty", scan_id);
            monitoring::record_scan(0);
            return Ok(0);
        }

        let chunks = partition(lines, self.dispatcher.config().chunk_size);
        info!("[{}] Processing {} chunks", scan_id, chunks.len());
        let flagged = self.dispatcher.process(chunks, cancel).await;

        let written = write_flagged(&flagged, &self.output_path, self.overwrite)
            .await
            .context("failed to write flagged addresses")?;
        monitoring::record_scan(flagged.len());

        info!(
            "[{}] Wrote {} flagged addresses to {}",
            scan_id,
            written,
            self.output_path.display()
        );
        Ok(written)
    }

    /// Scan every `period`, starting one period from now, until `cancel` fires
    pub async fn run(&self, period: Duration, cancel: CancellationToken) {
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Received a signal to stop");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.scan_once(&cancel).await {
                        error!("Scan failed: {:#}", e);
                    }
                }
            }
        }
    }
}
