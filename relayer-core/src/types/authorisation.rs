use ethers_core::types::{H160, H256};
use serde::{Deserialize, Serialize};

use crate::types::packed::PackedEncoder;

/// A pending request from a new device to have its key added to a wallet
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorisationRequest {
    pub wallet_contract_address: H160,
    pub key: H160,
    #[serde(default)]
    pub device_info: serde_json::Value,
    pub network: String,
}

/// Hash a device signs to withdraw its own authorisation request
pub fn cancel_authorisation_hash(wallet_contract_address: H160, key: H160) -> H256 {
    PackedEncoder::default()
        .address(wallet_contract_address)
        .address(key)
        .bytes(b"cancel")
        .keccak()
}

/// Hash a wallet key signs to reject a device's authorisation request
pub fn deny_authorisation_hash(wallet_contract_address: H160, key: H160) -> H256 {
    PackedEncoder::default()
        .address(wallet_contract_address)
        .address(key)
        .bytes(b"deny")
        .keccak()
}
