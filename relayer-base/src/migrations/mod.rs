mod m1;

use std::fmt::Display;

use eyre::Result;
use rocksdb::WriteBatch;
use tracing::{info, instrument};

pub use m1::{LegacyTable, NetworkScopeMigration};

use crate::db::{RelayerRocksDB, QUEUE_LENGTH};

/// Number of migrations applied so far
pub const SCHEMA_VERSION: &str = "schema_version";

pub trait Migration: Display {
    /// takes the old key and value and returns the rows replacing them, using raw formats
    fn migrate(&self, key: Vec<u8>, value: Vec<u8>) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;

    fn prefix_key(&self) -> String;
}

/// Every migration in application order. Rows written before networks were
/// introduced belong to `legacy_network`.
pub fn migrations(legacy_network: &str) -> Vec<Box<dyn Migration>> {
    vec![
        Box::new(NetworkScopeMigration::new(LegacyTable::Messages, legacy_network)),
        Box::new(NetworkScopeMigration::new(LegacyTable::QueueItems, legacy_network)),
        Box::new(NetworkScopeMigration::new(
            LegacyTable::Authorisations,
            legacy_network,
        )),
    ]
}

/// Apply every migration newer than the stored schema version. Returns how
/// many were applied.
#[instrument(skip(db))]
pub fn migrate(db: &RelayerRocksDB, legacy_network: &str) -> Result<usize> {
    let applied = db
        .retrieve_json::<usize>(SCHEMA_VERSION.as_bytes())?
        .unwrap_or_default();
    let mut version = applied;

    for migration in migrations(legacy_network).into_iter().skip(applied) {
        info!(%migration, "Running migration");
        let prefix = migration.prefix_key();
        let batch = batch_updates(migration.as_ref(), db, prefix.as_bytes())?;
        let rows = batch.len();
        db.as_ref().write(batch)?;
        version += 1;
        db.store_json(SCHEMA_VERSION.as_bytes(), &version)?;
        info!(%migration, rows, version, "Migration applied");
    }
    if version > applied {
        // migrated queue items are recounted on the next access
        db.delete(QUEUE_LENGTH.as_bytes())?;
    }
    Ok(version - applied)
}

/// Collect the writes of one migration into a single batch; legacy keys are
/// deleted in the same batch.
pub fn batch_updates(
    migration: &dyn Migration,
    db: &RelayerRocksDB,
    prefix: &[u8],
) -> Result<WriteBatch> {
    let mut migration_updates = WriteBatch::default();
    for entry in db.raw_prefix_iterator(prefix) {
        let (key, value) = entry?;
        migration_updates.delete(&key);
        for (new_key, new_value) in migration.migrate(key, value)? {
            migration_updates.put(new_key, new_value);
        }
    }
    Ok(migration_updates)
}

#[cfg(test)]
mod tests {
    use relayer_core::{
        AuthorisationStore, Bytes, MessageItem, QueueItem, QueueItemType, QueueStore, Repository,
        SignedMessage, UnsignedMessage, H160, H256,
    };

    use crate::db::test_utils::tmp_db;

    use super::*;

    fn legacy_message() -> MessageItem {
        MessageItem::new(&SignedMessage {
            message: UnsignedMessage {
                from: H160::repeat_byte(1),
                ..Default::default()
            },
            signature: Bytes::default(),
        })
    }

    #[tokio::test]
    async fn moves_legacy_rows_under_network() {
        let (_dir, db) = tmp_db();
        let item = legacy_message();
        let hash = item.message_hash;

        let mut message_key = b"messages_".to_vec();
        message_key.extend_from_slice(hash.as_bytes());
        db.store_json(&message_key, &item).unwrap();

        let mut queue_key = b"queue_items_".to_vec();
        queue_key.extend_from_slice(&7u64.to_be_bytes());
        db.store_json(
            &queue_key,
            &serde_json::json!({
                "hash": hash,
                "type": "Message",
                "enqueuedAt": "2021-03-01T10:00:00Z",
            }),
        )
        .unwrap();

        let mut authorisation_key = b"authorisations_".to_vec();
        authorisation_key.extend_from_slice(H160::repeat_byte(1).as_bytes());
        authorisation_key.extend_from_slice(H160::repeat_byte(2).as_bytes());
        db.store_json(
            &authorisation_key,
            &serde_json::json!({
                "walletContractAddress": H160::repeat_byte(1),
                "key": H160::repeat_byte(2),
                "deviceInfo": { "name": "laptop" },
            }),
        )
        .unwrap();

        assert_eq!(migrate(&db, "ganache").unwrap(), 3);

        let migrated: MessageItem = db.get(hash, "ganache").await.unwrap();
        assert_eq!(migrated, item);
        assert!(!db.contains(&message_key).unwrap());

        let next = db.get_next().await.unwrap().unwrap();
        assert_eq!(next.hash, hash);
        assert_eq!(next.network, "ganache");
        // the queue index counter continues after migrated items
        QueueStore::add(
            &db,
            &QueueItem::new(H256::repeat_byte(5), QueueItemType::Message, "ganache"),
        )
        .await
        .unwrap();
        assert_eq!(db.count().await.unwrap(), 2);
        assert_eq!(db.get_next().await.unwrap().unwrap().hash, hash);

        let pending = db
            .get_pending(H160::repeat_byte(1), "ganache")
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].network, "ganache");
    }

    #[test]
    fn runs_each_migration_once() {
        let (_dir, db) = tmp_db();
        assert_eq!(migrate(&db, "ganache").unwrap(), 3);
        assert_eq!(migrate(&db, "ganache").unwrap(), 0);
        assert_eq!(
            db.retrieve_json::<usize>(SCHEMA_VERSION.as_bytes()).unwrap(),
            Some(3)
        );
    }
}
