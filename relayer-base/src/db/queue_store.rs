use async_trait::async_trait;
use relayer_core::{QueueItem, QueueStore, RelayerResult, H256};
use rocksdb::WriteBatch;
use tracing::{debug, instrument, warn};

use super::{DbError, DbResult, RelayerRocksDB};

/// Queue items keyed by a big-endian insertion index, so key order is
/// insertion order
pub const QUEUE_ITEM_BY_INDEX: &str = "queue_item_by_index_";
/// `(network, hash)` to index, enforcing one queued item per row
pub const QUEUE_INDEX_BY_HASH: &str = "queue_index_by_hash_";
/// Next index to hand out
pub const QUEUE_NEXT_INDEX: &str = "queue_next_index";
/// Number of queued items. Recounted from the items when absent.
pub const QUEUE_LENGTH: &str = "queue_length";

impl RelayerRocksDB {
    /// Key of the queue item with insertion index `index`
    pub fn queue_item_key(index: u64) -> Vec<u8> {
        let mut key = QUEUE_ITEM_BY_INDEX.as_bytes().to_vec();
        key.extend_from_slice(&index.to_be_bytes());
        key
    }

    fn queue_index_key(hash: H256, network: &str) -> Vec<u8> {
        Self::network_key(QUEUE_INDEX_BY_HASH, network, hash.as_bytes())
    }

    // Every mutation below writes its keys in one batch, under the write lock.

    fn enqueue(&self, item: &QueueItem) -> DbResult<u64> {
        let index_key = Self::queue_index_key(item.hash, &item.network);
        let _guard = self.lock();
        if let Some(index) = self.retrieve_json::<u64>(&index_key)? {
            if self.contains(&Self::queue_item_key(index))? {
                return Ok(index);
            }
            warn!(index, hash = ?item.hash, network = %item.network, "Dropping stale queue index");
        }
        let index = self
            .retrieve_json::<u64>(QUEUE_NEXT_INDEX.as_bytes())?
            .unwrap_or_default();
        let length = self.queue_length_locked()?;

        let mut batch = WriteBatch::default();
        batch.put(Self::queue_item_key(index), serde_json::to_vec(item)?);
        batch.put(&index_key, serde_json::to_vec(&index)?);
        batch.put(QUEUE_NEXT_INDEX, serde_json::to_vec(&(index + 1))?);
        batch.put(QUEUE_LENGTH, serde_json::to_vec(&(length + 1))?);
        self.as_ref().write(batch)?;
        Ok(index)
    }

    fn dequeue(&self, hash: H256, network: &str) -> DbResult<bool> {
        let index_key = Self::queue_index_key(hash, network);
        let _guard = self.lock();
        let Some(index) = self.retrieve_json::<u64>(&index_key)? else {
            return self.remove_unindexed(hash, network);
        };
        let item_key = Self::queue_item_key(index);
        let length = self.queue_length_locked()?;

        let mut batch = WriteBatch::default();
        batch.delete(&index_key);
        if self.contains(&item_key)? {
            batch.delete(&item_key);
            batch.put(QUEUE_LENGTH, serde_json::to_vec(&length.saturating_sub(1))?);
        }
        self.as_ref().write(batch)?;
        Ok(true)
    }

    /// Delete items of `(hash, network)` that have no index entry, then
    /// recount. Only reached for partially written queues.
    fn remove_unindexed(&self, hash: H256, network: &str) -> DbResult<bool> {
        let mut batch = WriteBatch::default();
        let mut remaining = 0u64;
        for entry in self.raw_prefix_iterator(QUEUE_ITEM_BY_INDEX.as_bytes()) {
            let (key, value) = entry?;
            let queued: QueueItem = serde_json::from_slice(&value)?;
            if queued.hash == hash && queued.network == network {
                batch.delete(&key);
            } else {
                remaining += 1;
            }
        }
        if batch.is_empty() {
            return Ok(false);
        }
        warn!(?hash, network, "Removing queue item without index");
        batch.put(QUEUE_LENGTH, serde_json::to_vec(&remaining)?);
        self.as_ref().write(batch)?;
        Ok(true)
    }

    /// Stored queue length, counting the items once if it was never stored.
    /// Callers hold the write lock.
    fn queue_length_locked(&self) -> DbResult<u64> {
        if let Some(length) = self.retrieve_json::<u64>(QUEUE_LENGTH.as_bytes())? {
            return Ok(length);
        }
        let mut length = 0;
        for entry in self.raw_prefix_iterator(QUEUE_ITEM_BY_INDEX.as_bytes()) {
            entry?;
            length += 1;
        }
        self.store_json(QUEUE_LENGTH.as_bytes(), &length)?;
        Ok(length)
    }

    fn oldest_queue_item(&self) -> DbResult<Option<QueueItem>> {
        self.raw_prefix_iterator(QUEUE_ITEM_BY_INDEX.as_bytes())
            .next()
            .transpose()?
            .map(|(_, value)| serde_json::from_slice(&value).map_err(DbError::from))
            .transpose()
    }
}

#[async_trait]
impl QueueStore for RelayerRocksDB {
    #[instrument(skip(self), fields(hash = ?item.hash, network = %item.network))]
    async fn add(&self, item: &QueueItem) -> RelayerResult<H256> {
        let index = self.enqueue(item)?;
        debug!(index, item_type = %item.item_type, "Queued item");
        Ok(item.hash)
    }

    async fn get_next(&self) -> RelayerResult<Option<QueueItem>> {
        Ok(self.oldest_queue_item()?)
    }

    #[instrument(skip(self))]
    async fn remove(&self, hash: H256, network: &str) -> RelayerResult<()> {
        if !self.dequeue(hash, network)? {
            debug!("Queue item already removed");
        }
        Ok(())
    }

    async fn count(&self) -> RelayerResult<u64> {
        let _guard = self.lock();
        Ok(self.queue_length_locked()?)
    }
}
