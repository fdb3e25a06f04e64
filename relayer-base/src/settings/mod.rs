//! Settings shared by the relayer binary and its tests.
//!
//! ### Configuration
//!
//! Settings are read from the config files, then from environment variables.
//!
//! Configuration key/value pairs are loaded in the following order, with later
//! sources taking precedence:
//!
//! 1. Every `*.json` file in `./config`, if that directory exists.
//! 2. The files listed in `CONFIG_FILES` (comma separated), each one
//!    overwriting previous ones as appropriate.
//! 3. Environment variables prefixed with `RELAYER__`, where `__` separates
//!    levels of the JSON hierarchy. E.g.
//!    `RELAYER__NETWORKS__GANACHE__RPC_URL=http://localhost:18545`.
//!
//! Keys are snake_case. Keys, including network names, are case insensitive
//! and normalised to lowercase.

use std::{collections::HashMap, path::PathBuf};

use serde::Deserialize;

pub use chains::*;
pub use loader::*;
pub use trace::*;

mod chains;
mod loader;
/// Tracing subscriber configuration
pub mod trace;

/// Default poll interval of the execution worker
pub const DEFAULT_WORKER_TICK_MS: u64 = 100;

fn default_worker_tick_ms() -> u64 {
    DEFAULT_WORKER_TICK_MS
}

/// Settings of a relayer process
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// Path of the rocksdb database
    pub db: PathBuf,
    /// Port of the HTTP API, which also serves `/metrics`. No server is
    /// started when absent.
    #[serde(default)]
    pub port: Option<u16>,
    /// Network used when a request does not name one. Rows stored before the
    /// relayer supported several networks are migrated to it.
    pub default_network: String,
    /// Poll interval of the execution worker when the queue is empty
    #[serde(default = "default_worker_tick_ms")]
    pub worker_tick_ms: u64,
    /// Logging
    #[serde(default)]
    pub tracing: TracingConfig,
    /// Every network the relayer operates on, by name
    pub networks: HashMap<String, NetworkConf>,
}

impl Settings {
    /// Check cross-field constraints the deserializer cannot express
    pub fn validate(&self) -> eyre::Result<()> {
        if !self.networks.contains_key(&self.default_network) {
            eyre::bail!(
                "default network {} is not among the configured networks",
                self.default_network
            );
        }
        Ok(())
    }
}
