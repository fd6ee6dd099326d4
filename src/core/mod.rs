//! Core detection for the log detector.
//!
//! This module contains the chunk partitioner, the per-chunk window
//! counter, the concurrent dispatcher and the metrics helpers.

pub mod dispatcher;
pub mod monitoring;
pub mod partitioner;
pub mod window_counter;

pub use dispatcher::Dispatcher;
pub use partitioner::partition;
pub use window_counter::{FlagSink, WindowCounter};
