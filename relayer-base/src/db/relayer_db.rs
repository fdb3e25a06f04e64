use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use serde::{de::DeserializeOwned, Serialize};

use super::{iterator::RawPrefixIterator, DbResult, DB};

/// Database handle shared by every repository. Rows of every network live in
/// the same rocksdb instance; each key embeds the network it belongs to.
///
/// Key structure: ```<entity_prefix><network>_<key>```
#[derive(Debug, Clone)]
pub struct RelayerRocksDB {
    db: DB,
    write_lock: Arc<Mutex<()>>,
}

impl AsRef<DB> for RelayerRocksDB {
    fn as_ref(&self) -> &DB {
        &self.db
    }
}

impl RelayerRocksDB {
    /// Wrap an opened database
    pub fn new(db: DB) -> Self {
        Self {
            db,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Serialises read-modify-write sequences. Every check-then-write on a
    /// row happens under this lock, which makes it atomic with respect to
    /// every other writer of this process.
    pub(crate) fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock()
    }

    /// Full key for `key` under `prefix`, scoped to `network`
    pub fn network_key(prefix: &str, network: &str, key: impl AsRef<[u8]>) -> Vec<u8> {
        let mut full_key = Self::network_prefix(prefix, network);
        full_key.extend_from_slice(key.as_ref());
        full_key
    }

    /// Prefix shared by every key of `prefix` on `network`
    pub fn network_prefix(prefix: &str, network: &str) -> Vec<u8> {
        let mut full_prefix = Vec::with_capacity(prefix.len() + network.len() + 1);
        full_prefix.extend_from_slice(prefix.as_bytes());
        full_prefix.extend_from_slice(network.as_bytes());
        full_prefix.push(b'_');
        full_prefix
    }

    /// Store a JSON encoded value
    pub fn store_json<V: Serialize>(&self, key: &[u8], value: &V) -> DbResult<()> {
        self.db.store(key, &serde_json::to_vec(value)?)
    }

    /// Retrieve a JSON encoded value
    pub fn retrieve_json<V: DeserializeOwned>(&self, key: &[u8]) -> DbResult<Option<V>> {
        self.db
            .retrieve(key)?
            .map(|raw| serde_json::from_slice(&raw))
            .transpose()
            .map_err(Into::into)
    }

    /// Delete a key
    pub fn delete(&self, key: &[u8]) -> DbResult<()> {
        self.db.delete(key)
    }

    /// Whether a key exists
    pub fn contains(&self, key: &[u8]) -> DbResult<bool> {
        Ok(self.db.retrieve(key)?.is_some())
    }

    /// Raw key/value pairs under `prefix`, in key order
    pub fn raw_prefix_iterator<'a>(&'a self, prefix: &'a [u8]) -> RawPrefixIterator<'a> {
        RawPrefixIterator::new(self.db.prefix_iterator(prefix), prefix)
    }

    /// Decoded values under `prefix`, in key order
    pub fn values_by_prefix<V: DeserializeOwned>(&self, prefix: &[u8]) -> DbResult<Vec<V>> {
        self.raw_prefix_iterator(prefix)
            .map(|entry| {
                let (_, value) = entry?;
                Ok(serde_json::from_slice(&value)?)
            })
            .collect()
    }

    /// Read, modify and write back a JSON value under the write lock.
    /// Returns `None` without writing if the key does not exist.
    pub fn update_json<V, F, R>(&self, key: &[u8], f: F) -> DbResult<Option<R>>
    where
        V: Serialize + DeserializeOwned,
        F: FnOnce(&mut V) -> R,
    {
        let _guard = self.lock();
        let Some(mut value) = self.retrieve_json::<V>(key)? else {
            return Ok(None);
        };
        let result = f(&mut value);
        self.store_json(key, &value)?;
        Ok(Some(result))
    }
}
