use std::fmt::{Display, Formatter};

use eyre::{bail, eyre, Result};
use relayer_core::{MessageItem, H160, H256};

use super::Migration;
use crate::db::{
    record_prefix, RelayerRocksDB, QUEUE_INDEX_BY_HASH, QUEUE_NEXT_INDEX,
};

/// Row kinds written before rows were scoped by network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyTable {
    /// `messages_<hash>`
    Messages,
    /// `queue_items_<u64 index>`
    QueueItems,
    /// `authorisations_<wallet><key>`
    Authorisations,
}

impl LegacyTable {
    fn prefix(&self) -> &'static str {
        match self {
            LegacyTable::Messages => "messages_",
            LegacyTable::QueueItems => "queue_items_",
            LegacyTable::Authorisations => "authorisations_",
        }
    }
}

/// Moves single-network rows under the network they were written for.
/// Queue items and authorisation requests also gain a `network` field.
#[derive(Debug, Clone)]
pub struct NetworkScopeMigration {
    table: LegacyTable,
    network: String,
}

impl NetworkScopeMigration {
    pub fn new(table: LegacyTable, network: &str) -> Self {
        Self {
            table,
            network: network.to_owned(),
        }
    }

    fn with_network(&self, value: &[u8]) -> Result<Vec<u8>> {
        let mut json: serde_json::Value = serde_json::from_slice(value)?;
        let object = json
            .as_object_mut()
            .ok_or_else(|| eyre!("legacy {:?} row is not an object", self.table))?;
        object.insert(
            "network".to_owned(),
            serde_json::Value::String(self.network.clone()),
        );
        Ok(serde_json::to_vec(&json)?)
    }
}

impl Display for NetworkScopeMigration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "m1_network_scope_{}", self.table.prefix().trim_end_matches('_'))
    }
}

impl Migration for NetworkScopeMigration {
    fn prefix_key(&self) -> String {
        self.table.prefix().to_owned()
    }

    fn migrate(&self, key: Vec<u8>, value: Vec<u8>) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let suffix = &key[self.table.prefix().len()..];
        match self.table {
            LegacyTable::Messages => {
                if suffix.len() != H256::len_bytes() {
                    bail!("legacy message key has unexpected length {}", key.len());
                }
                // check the row still decodes before moving it
                serde_json::from_slice::<MessageItem>(&value)?;
                let new_key = RelayerRocksDB::network_key(
                    &record_prefix::<MessageItem>(),
                    &self.network,
                    suffix,
                );
                Ok(vec![(new_key, value)])
            }
            LegacyTable::QueueItems => {
                let index_bytes: [u8; 8] = suffix
                    .try_into()
                    .map_err(|_| eyre!("legacy queue key has unexpected length {}", key.len()))?;
                let index = u64::from_be_bytes(index_bytes);
                let value = self.with_network(&value)?;
                let hash: H256 = serde_json::from_slice::<serde_json::Value>(&value)?
                    .get("hash")
                    .cloned()
                    .map(serde_json::from_value)
                    .transpose()?
                    .ok_or_else(|| eyre!("legacy queue item {index} has no hash"))?;
                Ok(vec![
                    (RelayerRocksDB::queue_item_key(index), value),
                    (
                        RelayerRocksDB::network_key(
                            QUEUE_INDEX_BY_HASH,
                            &self.network,
                            hash.as_bytes(),
                        ),
                        serde_json::to_vec(&index)?,
                    ),
                    // legacy keys are visited in index order, so the last
                    // write leaves the counter past the highest index
                    (
                        QUEUE_NEXT_INDEX.as_bytes().to_vec(),
                        serde_json::to_vec(&(index + 1))?,
                    ),
                ])
            }
            LegacyTable::Authorisations => {
                if suffix.len() != 2 * H160::len_bytes() {
                    bail!("legacy authorisation key has unexpected length {}", key.len());
                }
                let (wallet, device_key) = suffix.split_at(H160::len_bytes());
                let new_key = RelayerRocksDB::authorisation_key(
                    H160::from_slice(wallet),
                    H160::from_slice(device_key),
                    &self.network,
                );
                Ok(vec![(new_key, self.with_network(&value)?)])
            }
        }
    }
}
