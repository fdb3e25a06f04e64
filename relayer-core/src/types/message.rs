use ethers_core::types::{Bytes, Signature, H160, H256, U256};
use serde::{Deserialize, Serialize};

use crate::{types::packed::PackedEncoder, RelayerResult};

/// The canonical fields of a wallet meta-transaction. Everything that is
/// signed, nothing that is a signature.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedMessage {
    /// The wallet contract executing the call
    pub from: H160,
    /// Call target
    pub to: H160,
    /// Native value forwarded with the call
    #[serde(with = "crate::types::serialize", default)]
    pub value: U256,
    /// Call data
    #[serde(default)]
    pub data: Bytes,
    /// Wallet nonce
    #[serde(with = "crate::types::serialize")]
    pub nonce: U256,
    /// Price per gas unit the wallet refunds, in `gas_token`
    #[serde(with = "crate::types::serialize")]
    pub gas_price: U256,
    /// Refund token; the zero address means the native coin
    pub gas_token: H160,
    /// Total gas the relayer may spend
    #[serde(with = "crate::types::serialize")]
    pub gas_limit: U256,
    /// Gas forwarded to the inner call
    #[serde(with = "crate::types::serialize")]
    pub gas_limit_execution: U256,
}

impl UnsignedMessage {
    /// Gas reserved for calldata and wallet bookkeeping, i.e. the part of
    /// `gas_limit` not forwarded to the inner call.
    pub fn gas_data(&self) -> U256 {
        self.gas_limit.saturating_sub(self.gas_limit_execution)
    }

    /// Maximum refund the wallet pays, `gas_price * gas_limit`
    pub fn max_gas_cost(&self) -> U256 {
        self.gas_price.saturating_mul(self.gas_limit)
    }

    /// Deterministic identity of the message, matching the wallet contract's
    /// `keccak256(abi.encodePacked(...))`.
    pub fn message_hash(&self) -> H256 {
        PackedEncoder::default()
            .address(self.from)
            .address(self.to)
            .uint(self.value)
            .bytes(&self.data)
            .uint(self.nonce)
            .uint(self.gas_price)
            .address(self.gas_token)
            .uint(self.gas_limit_execution)
            .uint(self.gas_data())
            .keccak()
    }
}

/// A message together with one signature over its hash
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedMessage {
    /// Canonical fields
    #[serde(flatten)]
    pub message: UnsignedMessage,
    /// 65 byte `r || s || v` signature
    pub signature: Bytes,
}

impl SignedMessage {
    /// Hash of the canonical fields; the signature is excluded
    pub fn message_hash(&self) -> H256 {
        self.message.message_hash()
    }

    /// Address of the key that produced `signature`
    pub fn recover_signer(&self) -> RelayerResult<H160> {
        recover_signer(self.message_hash(), &self.signature)
    }
}

/// Recover the EIP-191 signer of `hash`. Malformed or unrecoverable
/// signatures are reported as `InvalidSignature`.
pub fn recover_signer(hash: H256, signature: &[u8]) -> RelayerResult<H160> {
    let signature = Signature::try_from(signature)?;
    Ok(signature.recover(hash.as_bytes())?)
}
