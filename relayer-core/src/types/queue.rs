use chrono::{DateTime, Utc};
use ethers_core::types::H256;
use serde::{Deserialize, Serialize};

/// What a queue item refers to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum QueueItemType {
    /// A signed message with enough signatures
    Message,
    /// A counterfactual wallet deployment
    Deployment,
}

/// An entry of the execution queue. It only references the row to execute;
/// the row itself lives in the message or deployment repository.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    pub hash: H256,
    #[serde(rename = "type")]
    pub item_type: QueueItemType,
    pub network: String,
    pub enqueued_at: DateTime<Utc>,
}

impl QueueItem {
    /// A new item stamped with the current time
    pub fn new(hash: H256, item_type: QueueItemType, network: &str) -> Self {
        Self {
            hash,
            item_type,
            network: network.to_owned(),
            enqueued_at: Utc::now(),
        }
    }
}
