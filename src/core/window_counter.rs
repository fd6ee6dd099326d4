//! Per-chunk request counting inside a resetting time window.
//!
//! The window does not slide. It is anchored at a timestamp and, once a
//! record arrives more than `window` after the anchor, every count is
//! dropped and the window is re-anchored at that record. An address is
//! emitted when its count reaches the threshold, at most once per window.

use std::collections::HashMap;

use chrono::{DateTime, Duration, FixedOffset};

/// Receives addresses as they cross the threshold
pub trait FlagSink {
    fn emit(&mut self, address: &str);
}

impl FlagSink for Vec<String> {
    fn emit(&mut self, address: &str) {
        self.push(address.to_string());
    }
}

/// Counts requests per address for a single chunk.
///
/// Owned by exactly one worker; holds no synchronisation.
pub struct WindowCounter<S> {
    window_start: DateTime<FixedOffset>,
    window: Duration,
    threshold: u32,
    counts: HashMap<String, u32>,
    sink: S,
}

impl<S: FlagSink> WindowCounter<S> {
    /// Create a counter whose first window starts at `window_start`
    pub fn new(window_start: DateTime<FixedOffset>, window: Duration, threshold: u32, sink: S) -> Self {
        Self {
            window_start,
            window,
            threshold,
            counts: HashMap::new(),
            sink,
        }
    }

    /// Record one request from `address` at `timestamp`.
    ///
    /// Timestamps earlier than the window start are counted in the current
    /// window; only a forward gap strictly greater than the window length
    /// starts a new one.
    pub fn observe(&mut self, address: &str, timestamp: DateTime<FixedOffset>) {
        if timestamp - self.window_start > self.window {
            self.window_start = timestamp;
            self.counts.clear();
        }

        let count = match self.counts.get_mut(address) {
            Some(count) => {
                *count = count.saturating_add(1);
                *count
            }
            None => {
                self.counts.insert(address.to_string(), 1);
                1
            }
        };

        if count == self.threshold {
            self.sink.emit(address);
        }
    }

    pub fn window_start(&self) -> DateTime<FixedOffset> {
        self.window_start
    }

    /// Current count for `address` in the open window
    pub fn count(&self, address: &str) -> u32 {
        self.counts.get(address).copied().unwrap_or(0)
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .timestamp_opt(1_689_687_857 + secs, 0)
            .unwrap()
    }

    fn counter(threshold: u32, window_secs: i64) -> WindowCounter<Vec<String>> {
        WindowCounter::new(at(0), Duration::seconds(window_secs), threshold, Vec::new())
    }

    #[test]
    fn test_emits_once_at_threshold() {
        let mut counter = counter(3, 10);
        counter.observe("10.0.0.1", at(0));
        counter.observe("10.0.0.1", at(1));
        assert!(counter.sink.is_empty());

        counter.observe("10.0.0.1", at(2));
        assert_eq!(counter.sink, vec!["10.0.0.1"]);
    }

    #[test]
    fn test_no_repeat_emission_past_threshold() {
        let mut counter = counter(2, 10);
        for secs in 0..8 {
            counter.observe("10.0.0.1", at(secs));
        }
        assert_eq!(counter.count("10.0.0.1"), 8);
        assert_eq!(counter.into_sink(), vec!["10.0.0.1"]);
    }

    #[test]
    fn test_threshold_one_emits_on_first_request() {
        let mut counter = counter(1, 10);
        counter.observe("10.0.0.1", at(0));
        counter.observe("10.0.0.2", at(0));
        counter.observe("10.0.0.1", at(1));
        assert_eq!(counter.into_sink(), vec!["10.0.0.1", "10.0.0.2"]);
    }

    #[test]
    fn test_reset_clears_counts() {
        let mut counter = counter(3, 10);
        counter.observe("10.0.0.1", at(0));
        counter.observe("10.0.0.1", at(5));
        counter.observe("10.0.0.1", at(11));

        assert_eq!(counter.window_start(), at(11));
        assert_eq!(counter.count("10.0.0.1"), 1);
        assert!(counter.into_sink().is_empty());
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let mut counter = counter(2, 10);
        counter.observe("10.0.0.1", at(0));
        counter.observe("10.0.0.1", at(10));

        assert_eq!(counter.window_start(), at(0));
        assert_eq!(counter.into_sink(), vec!["10.0.0.1"]);
    }

    #[test]
    fn test_reemits_after_reset() {
        let mut counter = counter(2, 10);
        counter.observe("10.0.0.1", at(0));
        counter.observe("10.0.0.1", at(1));
        counter.observe("10.0.0.1", at(20));
        counter.observe("10.0.0.1", at(21));

        assert_eq!(counter.into_sink(), vec!["10.0.0.1", "10.0.0.1"]);
    }

    #[test]
    fn test_out_of_order_timestamp_stays_in_window() {
        let mut counter = counter(2, 10);
        counter.observe("10.0.0.1", at(5));
        counter.observe("10.0.0.1", at(-30));

        assert_eq!(counter.window_start(), at(0));
        assert_eq!(counter.into_sink(), vec!["10.0.0.1"]);
    }

    #[test]
    fn test_addresses_are_counted_independently() {
        let mut counter = counter(2, 10);
        counter.observe("10.0.0.1", at(0));
        counter.observe("10.0.0.2", at(0));
        counter.observe("10.0.0.3", at(1));
        counter.observe("10.0.0.2", at(1));

        assert_eq!(counter.count("10.0.0.1"), 1);
        assert_eq!(counter.into_sink(), vec!["10.0.0.2"]);
    }
}
