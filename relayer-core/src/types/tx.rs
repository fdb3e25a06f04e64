use ethers_core::types::{H256, U256};
use serde::{Deserialize, Serialize};

/// What the chain reported once a transaction was mined
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxOutcome {
    /// Hash of the mined transaction
    pub transaction_hash: H256,
    /// False if the receipt carries a failed status
    pub executed: bool,
    /// Gas used, when the receipt reports it
    pub gas_used: Option<U256>,
}
