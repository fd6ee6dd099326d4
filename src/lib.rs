//! Access log DDoS detector
//!
//! Periodically reads the tail of a web server access log, counts requests
//! per source address inside a time window and appends the addresses that
//! reach the configured threshold to an output file.

pub mod config;
pub mod core;
pub mod models;
pub mod output;
pub mod parser;
pub mod reader;
pub mod scanner;
pub mod utils;
