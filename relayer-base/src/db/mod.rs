use std::{io, path::Path, path::PathBuf, sync::Arc};

use relayer_core::RelayerError;
use rocksdb::{DBIterator, Direction, IteratorMode, Options, WriteBatch, DB as Rocks};
use tracing::info;

pub use authorisation_store::AUTHORISATION_BY_WALLET;
pub use queue_store::{QUEUE_INDEX_BY_HASH, QUEUE_ITEM_BY_INDEX, QUEUE_LENGTH, QUEUE_NEXT_INDEX};
pub use record_store::record_prefix;
pub use relayer_db::*;

/// Shared functionality surrounding use of rocksdb
pub mod iterator;

mod authorisation_store;
mod queue_store;
mod record_store;
mod relayer_db;

/// Database test utilities.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

#[derive(Debug, Clone)]
/// A KV Store
pub struct DB(Arc<Rocks>);

impl From<Rocks> for DB {
    fn from(rocks: Rocks) -> Self {
        Self(Arc::new(rocks))
    }
}

/// DB Error type
#[derive(thiserror::Error, Debug)]
pub enum DbError {
    /// Rocks DB Error
    #[error("{0}")]
    RockError(#[from] rocksdb::Error),
    #[error("Failed to open {path}, canonicalized as {canonicalized}: {source}")]
    /// Error opening the database
    OpeningError {
        /// Rocksdb error during opening
        #[source]
        source: rocksdb::Error,
        /// Raw database path provided
        path: PathBuf,
        /// Parsed path used
        canonicalized: PathBuf,
    },
    /// Could not parse the provided database path string
    #[error("Invalid database path supplied {1:?}; {0}")]
    InvalidDbPath(#[source] io::Error, String),
    /// Stored value could not be encoded or decoded
    #[error("Failed to (de)serialize stored value: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Custom error
    #[error("{0}")]
    Other(String),
}

/// Rocks DB result type
pub type DbResult<T> = std::result::Result<T, DbError>;

impl From<DbError> for RelayerError {
    fn from(err: DbError) -> Self {
        RelayerError::Database(Box::new(err))
    }
}

impl DB {
    /// Opens db at `db_path` and creates if missing
    #[tracing::instrument(err)]
    pub fn from_path(db_path: &Path) -> DbResult<DB> {
        let path = {
            let mut path = db_path
                .parent()
                .filter(|parent| !parent.as_os_str().is_empty())
                .unwrap_or(Path::new("."))
                .canonicalize()
                .map_err(|e| DbError::InvalidDbPath(e, db_path.to_string_lossy().into()))?;
            if let Some(file_name) = db_path.file_name() {
                path.push(file_name);
            }
            path
        };

        if path.is_dir() {
            info!(path=%path.to_string_lossy(), "Opening existing db")
        } else {
            info!(path=%path.to_string_lossy(), "Creating db")
        }

        let mut opts = Options::default();
        opts.create_if_missing(true);

        Rocks::open(&opts, &path)
            .map_err(|e| DbError::OpeningError {
                source: e,
                path: db_path.into(),
                canonicalized: path,
            })
            .map(Into::into)
    }

    /// Store a value in the DB
    pub fn store(&self, key: &[u8], value: &[u8]) -> DbResult<()> {
        Ok(self.0.put(key, value)?)
    }

    /// Retrieve a value from the DB
    pub fn retrieve(&self, key: &[u8]) -> DbResult<Option<Vec<u8>>> {
        Ok(self.0.get(key)?)
    }

    /// Delete a value from the DB
    pub fn delete(&self, key: &[u8]) -> DbResult<()> {
        Ok(self.0.delete(key)?)
    }

    /// Apply a batch of writes atomically
    pub fn write(&self, batch: WriteBatch) -> DbResult<()> {
        Ok(self.0.write(batch)?)
    }

    /// Iterator over every key from `prefix` onwards, in key order. Callers
    /// stop once keys no longer start with the prefix.
    pub fn prefix_iterator(&self, prefix: &[u8]) -> DBIterator {
        self.0
            .iterator(IteratorMode::From(prefix, Direction::Forward))
    }
}
