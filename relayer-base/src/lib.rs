//! Shared infrastructure of the relayer: rocksdb persistence and its
//! migrations, settings, tracing, metrics and the base HTTP server.

#![forbid(unsafe_code)]

pub use metrics::RelayerMetrics;
pub use settings::*;

/// Rocksdb backed repositories
pub mod db;
mod metrics;
/// Schema migrations applied on start
pub mod migrations;
/// HTTP server
pub mod server;
/// Settings and configuration
pub mod settings;
