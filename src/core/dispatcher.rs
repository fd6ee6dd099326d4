//! Concurrent chunk dispatch.
//!
//! Every chunk gets its own blocking worker and its own [`WindowCounter`].
//! Workers push flagged addresses into a bounded channel, and a single
//! merge task owns the [`FlaggedSet`] and drains that channel until every
//! worker has dropped its sender.

use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::core::monitoring;
use crate::core::window_counter::{FlagSink, WindowCounter};
use crate::models::{DetectionConfig, FlaggedSet};
use crate::parser::LineParser;
use crate::utils::{is_ipv4, matches_url_filter};

/// Forwards emitted addresses from a blocking worker into the merge channel
struct ChannelSink {
    chunk_id: usize,
    tx: mpsc::Sender<String>,
}

impl FlagSink for ChannelSink {
    fn emit(&mut self, address: &str) {
        if self.tx.blocking_send(address.to_string()).is_err() {
            warn!("Chunk {}: merge task is gone, dropping {}", self.chunk_id, address);
        }
    }
}

/// Runs window detection over chunks of raw log lines
pub struct Dispatcher {
    config: Arc<DetectionConfig>,
    parser: Arc<dyn LineParser>,
}

impl Dispatcher {
    pub fn new(config: DetectionConfig, parser: Arc<dyn LineParser>) -> Self {
        Self {
            config: Arc::new(config),
            parser,
        }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Process every chunk concurrently and merge the flagged addresses.
    ///
    /// Bad lines and chunks whose first line cannot be parsed are logged
    /// and skipped. Cancellation stops workers before their next line;
    /// addresses merged so far are kept.
    pub async fn process(&self, chunks: Vec<Vec<String>>, cancel: &CancellationToken) -> FlaggedSet {
        if chunks.is_empty() {
            return FlaggedSet::new();
        }

        let (tx, rx) = mpsc::channel(chunks.len());
        let merger = tokio::spawn(merge(rx, self.config.ipv4_only));

        let mut workers = JoinSet::new();
        for (index, chunk) in chunks.into_iter().enumerate() {
            let worker = ChunkWorker {
                id: index + 1,
                config: Arc::clone(&self.config),
                parser: Arc::clone(&self.parser),
                cancel: cancel.clone(),
            };
            let sink = ChannelSink {
                chunk_id: worker.id,
                tx: tx.clone(),
            };
            workers.spawn_blocking(move || worker.run(chunk, sink));
        }
        drop(tx);

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!("Chunk worker failed: {}", e);
            }
        }

        let flagged = match merger.await {
            Ok(flagged) => flagged,
            Err(e) => {
                error!("Merge task failed: {}", e);
                FlaggedSet::new()
            }
        };

        info!("Finished processing all chunks, {} addresses flagged", flagged.len());
        flagged
    }
}

async fn merge(mut rx: mpsc::Receiver<String>, ipv4_only: bool) -> FlaggedSet {
    let mut flagged = FlaggedSet::new();
    while let Some(address) = rx.recv().await {
        if ipv4_only && !is_ipv4(&address) {
            debug!("Skipping non-IPv4 address {}", address);
            continue;
        }
        flagged.insert(address);
    }
    flagged
}

struct ChunkWorker {
    id: usize,
    config: Arc<DetectionConfig>,
    parser: Arc<dyn LineParser>,
    cancel: CancellationToken,
}

impl ChunkWorker {
    fn run(self, chunk: Vec<String>, sink: ChannelSink) {
        debug!("Processing chunk {} with {} lines", self.id, chunk.len());

        if self.cancel.is_cancelled() {
            debug!("Chunk {}: cancelled before start", self.id);
            return;
        }

        let Some(first_line) = chunk.first() else {
            return;
        };
        let first = match self.parser.parse(first_line) {
            Ok(record) => record,
            Err(e) => {
                error!("Chunk {}: abandoning, first line unparsable: {}", self.id, e);
                monitoring::record_parse_error();
                monitoring::record_chunk_abandoned();
                return;
            }
        };

        let mut counter = WindowCounter::new(first.timestamp, self.config.window, self.config.threshold, sink);
        if matches_url_filter(&first.requested_path, &self.config.url_filter) {
            counter.observe(&first.source_address, first.timestamp);
        }
        let mut parsed = 1u64;

        for line in &chunk[1..] {
            if self.cancel.is_cancelled() {
                debug!("Chunk {}: cancelled, stopping early", self.id);
                break;
            }

            let record = match self.parser.parse(line) {
                Ok(record) => record,
                Err(e) => {
                    warn!("Chunk {}: skipping line {:?}: {}", self.id, line, e);
                    monitoring::record_parse_error();
                    continue;
                }
            };
            parsed += 1;

            if matches_url_filter(&record.requested_path, &self.config.url_filter) {
                counter.observe(&record.source_address, record.timestamp);
            }
        }

        monitoring::record_lines_parsed(parsed);
    }
}
