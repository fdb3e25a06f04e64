use std::sync::Arc;

use relayer_base::RelayerMetrics;
use relayer_core::{QueueItem, QueueItemType, QueueStore, RelayerResult, H256};
use tracing::{debug, instrument, warn};

/// Durable FIFO of messages and deployments waiting for the worker. Keeps
/// the queue length metric in sync with the store.
#[derive(Debug, Clone)]
pub struct ExecutionQueue {
    store: Arc<dyn QueueStore>,
    metrics: Arc<RelayerMetrics>,
}

impl ExecutionQueue {
    pub fn new(store: Arc<dyn QueueStore>, metrics: Arc<RelayerMetrics>) -> Self {
        Self { store, metrics }
    }

    /// Stage a message with enough signatures
    pub async fn add_message(&self, hash: H256, network: &str) -> RelayerResult<H256> {
        self.push(QueueItem::new(hash, QueueItemType::Message, network))
            .await
    }

    /// Stage a wallet deployment
    pub async fn add_deployment(&self, hash: H256, network: &str) -> RelayerResult<H256> {
        self.push(QueueItem::new(hash, QueueItemType::Deployment, network))
            .await
    }

    /// Oldest item, left in the queue until [`Self::remove`]
    pub async fn get_next(&self) -> RelayerResult<Option<QueueItem>> {
        self.store.get_next().await
    }

    #[instrument(skip(self))]
    pub async fn remove(&self, hash: H256, network: &str) -> RelayerResult<()> {
        self.store.remove(hash, network).await?;
        self.refresh_length().await;
        Ok(())
    }

    #[instrument(skip(self), fields(hash = ?item.hash, network = %item.network, item_type = %item.item_type))]
    async fn push(&self, item: QueueItem) -> RelayerResult<H256> {
        let hash = self.store.add(&item).await?;
        debug!("Item queued for execution");
        self.refresh_length().await;
        Ok(hash)
    }

    async fn refresh_length(&self) {
        match self.store.count().await {
            Ok(count) => self
                .metrics
                .queue_length
                .set(i64::try_from(count).unwrap_or(i64::MAX)),
            Err(err) => warn!(?err, "Failed to count queue items"),
        }
    }
}

#[cfg(test)]
mod tests {
    use relayer_base::db::test_utils::tmp_db;

    use super::*;

    #[tokio::test]
    async fn tracks_queue_length() {
        let (_dir, db) = tmp_db();
        let metrics = Arc::new(RelayerMetrics::dummy_instance());
        let queue = ExecutionQueue::new(Arc::new(db), metrics.clone());

        queue
            .add_message(H256::repeat_byte(1), "ganache")
            .await
            .unwrap();
        queue
            .add_deployment(H256::repeat_byte(2), "ganache")
            .await
            .unwrap();
        assert_eq!(metrics.queue_length.get(), 2);

        let next = queue.get_next().await.unwrap().unwrap();
        assert_eq!(next.item_type, QueueItemType::Message);
        queue.remove(next.hash, &next.network).await.unwrap();
        assert_eq!(metrics.queue_length.get(), 1);

        let next = queue.get_next().await.unwrap().unwrap();
        assert_eq!(next.item_type, QueueItemType::Deployment);
    }
}
