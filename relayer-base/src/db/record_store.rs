use async_trait::async_trait;
use relayer_core::{
    Bytes, ExecutionRecord, MessageItem, MessageRepository, MessageState, RelayerError,
    RelayerResult, Repository, SignatureKeyPair, H256,
};
use tracing::{debug, instrument};

use super::{DbResult, RelayerRocksDB};

/// Key prefix of a record kind, e.g. `message_by_hash_`
pub fn record_prefix<T: ExecutionRecord>() -> String {
    format!("{}_by_hash_", T::ENTITY)
}

impl RelayerRocksDB {
    fn record_key<T: ExecutionRecord>(hash: H256, network: &str) -> Vec<u8> {
        Self::network_key(&record_prefix::<T>(), network, hash.as_bytes())
    }

    fn not_found<T: ExecutionRecord>(hash: H256, network: &str) -> RelayerError {
        RelayerError::NotFound(format!("{} {hash:?} on {network}", T::ENTITY))
    }

    fn update_record<T, F, R>(&self, hash: H256, network: &str, f: F) -> RelayerResult<R>
    where
        T: ExecutionRecord,
        F: FnOnce(&mut T) -> R,
    {
        self.update_json(&Self::record_key::<T>(hash, network), f)?
            .ok_or_else(|| Self::not_found::<T>(hash, network))
    }

    fn insert_signature(
        &self,
        hash: H256,
        pair: SignatureKeyPair,
        network: &str,
    ) -> RelayerResult<MessageItem> {
        let key = Self::record_key::<MessageItem>(hash, network);
        let _guard = self.lock();
        let mut item: MessageItem = self
            .retrieve_json(&key)?
            .ok_or_else(|| Self::not_found::<MessageItem>(hash, network))?;
        if item.has_signature(&pair.signature) || item.has_key(&pair.key) {
            return Err(RelayerError::DuplicatedSignature);
        }
        item.collected_signature_key_pairs.push(pair);
        self.store_json(&key, &item)?;
        Ok(item)
    }

    fn compare_and_set_state<T: ExecutionRecord>(
        &self,
        hash: H256,
        from: MessageState,
        to: MessageState,
        network: &str,
    ) -> RelayerResult<bool> {
        self.update_record::<T, _, _>(hash, network, |record| {
            if record.state() == from {
                record.set_state(to);
                true
            } else {
                false
            }
        })
    }

    fn insert_record<T: ExecutionRecord>(
        &self,
        hash: H256,
        item: &T,
        network: &str,
    ) -> DbResult<bool> {
        let key = Self::record_key::<T>(hash, network);
        let _guard = self.lock();
        if self.contains(&key)? {
            return Ok(false);
        }
        self.store_json(&key, item)?;
        Ok(true)
    }
}

#[async_trait]
impl<T: ExecutionRecord> Repository<T> for RelayerRocksDB {
    #[instrument(skip(self, item), fields(entity = T::ENTITY))]
    async fn add(&self, hash: H256, item: &T, network: &str) -> RelayerResult<()> {
        if self.insert_record(hash, item, network)? {
            debug!(?hash, network, "Stored record");
        } else {
            debug!(?hash, network, "Record already stored");
        }
        Ok(())
    }

    async fn get(&self, hash: H256, network: &str) -> RelayerResult<T> {
        self.retrieve_json(&Self::record_key::<T>(hash, network))?
            .ok_or_else(|| Self::not_found::<T>(hash, network))
    }

    async fn is_present(&self, hash: H256, network: &str) -> RelayerResult<bool> {
        Ok(self.contains(&Self::record_key::<T>(hash, network))?)
    }

    async fn remove(&self, hash: H256, network: &str) -> RelayerResult<()> {
        Ok(self.delete(&Self::record_key::<T>(hash, network))?)
    }

    #[instrument(skip(self), fields(entity = T::ENTITY))]
    async fn mark_as_pending(
        &self,
        hash: H256,
        transaction_hash: H256,
        network: &str,
    ) -> RelayerResult<()> {
        self.update_record::<T, _, _>(hash, network, |record| {
            record.set_pending(transaction_hash)
        })
    }

    #[instrument(skip(self), fields(entity = T::ENTITY))]
    async fn mark_as_error(&self, hash: H256, error: &str, network: &str) -> RelayerResult<()> {
        self.update_record::<T, _, _>(hash, network, |record| {
            record.set_error(error.to_owned())
        })
    }

    async fn set_state(
        &self,
        hash: H256,
        state: MessageState,
        network: &str,
    ) -> RelayerResult<()> {
        self.update_record::<T, _, _>(hash, network, |record| record.set_state(state))
    }

    async fn transition_state(
        &self,
        hash: H256,
        from: MessageState,
        to: MessageState,
        network: &str,
    ) -> RelayerResult<bool> {
        self.compare_and_set_state::<T>(hash, from, to, network)
    }
}

#[async_trait]
impl MessageRepository for RelayerRocksDB {
    #[instrument(skip(self, pair), fields(key = ?pair.key))]
    async fn add_signature(
        &self,
        hash: H256,
        pair: SignatureKeyPair,
        network: &str,
    ) -> RelayerResult<MessageItem> {
        self.insert_signature(hash, pair, network)
    }

    async fn contains_signature(
        &self,
        hash: H256,
        signature: &Bytes,
        network: &str,
    ) -> RelayerResult<bool> {
        let item: Option<MessageItem> =
            self.retrieve_json(&Self::record_key::<MessageItem>(hash, network))?;
        Ok(item.is_some_and(|item| item.has_signature(signature)))
    }
}

#[cfg(test)]
mod tests {
    use relayer_core::{Deployment, SignedMessage, UnsignedMessage, H160};

    use crate::db::test_utils::tmp_db;

    use super::*;

    const NETWORK: &str = "ganache";

    fn message_item() -> MessageItem {
        MessageItem::new(&SignedMessage {
            message: UnsignedMessage {
                from: H160::repeat_byte(1),
                ..Default::default()
            },
            signature: Bytes::from(vec![1u8; 65]),
        })
    }

    fn pair(key: u8, signature: u8) -> SignatureKeyPair {
        SignatureKeyPair {
            key: H160::repeat_byte(key),
            signature: Bytes::from(vec![signature; 65]),
        }
    }

    #[tokio::test]
    async fn get_unknown_row_is_not_found() {
        let (_dir, db) = tmp_db();
        let err = Repository::<MessageItem>::get(&db, H256::zero(), NETWORK)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(!Repository::<MessageItem>::is_present(&db, H256::zero(), NETWORK)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn add_keeps_existing_row() {
        let (_dir, db) = tmp_db();
        let item = message_item();
        let hash = item.message_hash;
        db.add(hash, &item, NETWORK).await.unwrap();
        db.add_signature(hash, pair(1, 1), NETWORK).await.unwrap();

        db.add(hash, &item, NETWORK).await.unwrap();
        let stored: MessageItem = db.get(hash, NETWORK).await.unwrap();
        assert_eq!(stored.total_collected(), 1);
    }

    #[tokio::test]
    async fn rows_are_scoped_by_network() {
        let (_dir, db) = tmp_db();
        let item = message_item();
        db.add(item.message_hash, &item, NETWORK).await.unwrap();

        assert!(Repository::<MessageItem>::is_present(&db, item.message_hash, NETWORK)
            .await
            .unwrap());
        assert!(
            !Repository::<MessageItem>::is_present(&db, item.message_hash, "rinkeby")
                .await
                .unwrap()
        );
        // a deployment with the same hash does not collide with the message
        assert!(!Repository::<Deployment>::is_present(&db, item.message_hash, NETWORK)
            .await
            .unwrap());
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn signatures_are_unique_by_value_and_key() {
        let (_dir, db) = tmp_db();
        let item = message_item();
        let hash = item.message_hash;
        db.add(hash, &item, NETWORK).await.unwrap();

        let updated = db.add_signature(hash, pair(1, 1), NETWORK).await.unwrap();
        assert_eq!(updated.total_collected(), 1);

        let same_signature = db.add_signature(hash, pair(2, 1), NETWORK).await;
        assert!(matches!(
            same_signature,
            Err(RelayerError::DuplicatedSignature)
        ));
        let same_key = db.add_signature(hash, pair(1, 2), NETWORK).await;
        assert!(matches!(same_key, Err(RelayerError::DuplicatedSignature)));

        db.add_signature(hash, pair(2, 2), NETWORK).await.unwrap();
        let stored: MessageItem = db.get(hash, NETWORK).await.unwrap();
        assert_eq!(stored.total_collected(), 2);
        assert!(db
            .contains_signature(hash, &Bytes::from(vec![2u8; 65]), NETWORK)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn transition_only_from_expected_state() {
        let (_dir, db) = tmp_db();
        let item = message_item();
        let hash = item.message_hash;
        db.add(hash, &item, NETWORK).await.unwrap();

        let queued = Repository::<MessageItem>::transition_state(
            &db,
            hash,
            MessageState::AwaitSignature,
            MessageState::Queued,
            NETWORK,
        )
        .await
        .unwrap();
        assert!(queued);

        let again = Repository::<MessageItem>::transition_state(
            &db,
            hash,
            MessageState::AwaitSignature,
            MessageState::Queued,
            NETWORK,
        )
        .await
        .unwrap();
        assert!(!again);
    }

    #[tokio::test]
    async fn pending_then_error_keeps_transaction_hash() {
        let (_dir, db) = tmp_db();
        let item = message_item();
        let hash = item.message_hash;
        db.add(hash, &item, NETWORK).await.unwrap();

        Repository::<MessageItem>::mark_as_pending(&db, hash, H256::repeat_byte(9), NETWORK)
            .await
            .unwrap();
        Repository::<MessageItem>::mark_as_error(&db, hash, "Chain: boom", NETWORK)
            .await
            .unwrap();

        let stored: MessageItem = db.get(hash, NETWORK).await.unwrap();
        assert_eq!(stored.state, MessageState::Error);
        assert_eq!(stored.transaction_hash, Some(H256::repeat_byte(9)));
        assert_eq!(stored.error.as_deref(), Some("Chain: boom"));

        let missing = Repository::<MessageItem>::mark_as_error(&db, H256::zero(), "x", NETWORK)
            .await
            .unwrap_err();
        assert!(missing.is_not_found());
    }
}
