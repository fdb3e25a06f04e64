use ethers_core::types::{Bytes, H160, H256, U256};
use itertools::Itertools;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::types::{SignedMessage, UnsignedMessage};

/// Lifecycle of anything the relayer executes on behalf of a wallet
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
pub enum MessageState {
    /// Collecting signatures
    #[default]
    AwaitSignature,
    /// Handed to the execution queue
    Queued,
    /// Submitted, waiting to be mined
    Pending,
    /// Mined successfully
    Success,
    /// Failed validation, submission or mining
    Error,
}

impl MessageState {
    /// Whether the row will never change again
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }
}

/// A signature and the key it recovered to
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureKeyPair {
    /// Recovered signer
    pub key: H160,
    /// Raw signature
    pub signature: Bytes,
}

/// Persisted rows that go through the execution queue share this surface so
/// repositories can update them uniformly.
pub trait ExecutionRecord: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Human readable entity name, used in `NotFound` errors and storage keys
    const ENTITY: &'static str;

    /// Current state
    fn state(&self) -> MessageState;

    /// Hash of the submitted transaction, if any
    fn transaction_hash(&self) -> Option<H256>;

    /// Overwrite the state
    fn set_state(&mut self, state: MessageState);

    /// Record the submitted transaction and move to `Pending`
    fn set_pending(&mut self, transaction_hash: H256);

    /// Record a failure and move to `Error`
    fn set_error(&mut self, error: String);
}

/// A message collecting signatures, or being executed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageItem {
    pub message_hash: H256,
    pub wallet_address: H160,
    pub message: UnsignedMessage,
    #[serde(default)]
    pub collected_signature_key_pairs: Vec<SignatureKeyPair>,
    #[serde(default)]
    pub state: MessageState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<H256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MessageItem {
    /// A fresh row awaiting signatures. The signature of `signed` is not
    /// collected here.
    pub fn new(signed: &SignedMessage) -> Self {
        Self {
            message_hash: signed.message_hash(),
            wallet_address: signed.message.from,
            message: signed.message.clone(),
            collected_signature_key_pairs: vec![],
            state: MessageState::AwaitSignature,
            transaction_hash: None,
            error: None,
        }
    }

    pub fn has_signature(&self, signature: &Bytes) -> bool {
        self.collected_signature_key_pairs
            .iter()
            .any(|pair| &pair.signature == signature)
    }

    pub fn has_key(&self, key: &H160) -> bool {
        self.collected_signature_key_pairs
            .iter()
            .any(|pair| &pair.key == key)
    }

    pub fn total_collected(&self) -> u64 {
        self.collected_signature_key_pairs.len() as u64
    }

    /// Signatures concatenated in ascending signer order, the layout wallet
    /// contracts verify against.
    pub fn packed_signatures(&self) -> Bytes {
        self.collected_signature_key_pairs
            .iter()
            .sorted_by_key(|pair| pair.key)
            .flat_map(|pair| pair.signature.iter().copied())
            .collect::<Vec<u8>>()
            .into()
    }

    /// Point-in-time status given the wallet's current threshold
    pub fn status(&self, required: u64) -> MessageStatus {
        MessageStatus {
            message_hash: self.message_hash,
            collected_signatures: self
                .collected_signature_key_pairs
                .iter()
                .map(|pair| pair.signature.clone())
                .collect(),
            total_collected: self.total_collected(),
            required,
            state: self.state,
            error: self.error.clone(),
            transaction_hash: self.transaction_hash,
        }
    }
}

impl ExecutionRecord for MessageItem {
    const ENTITY: &'static str = "message";

    fn state(&self) -> MessageState {
        self.state
    }

    fn transaction_hash(&self) -> Option<H256> {
        self.transaction_hash
    }

    fn set_state(&mut self, state: MessageState) {
        self.state = state;
    }

    fn set_pending(&mut self, transaction_hash: H256) {
        self.transaction_hash = Some(transaction_hash);
        self.state = MessageState::Pending;
    }

    fn set_error(&mut self, error: String) {
        self.error = Some(error);
        self.state = MessageState::Error;
    }
}

/// Externally visible status of a message
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageStatus {
    pub message_hash: H256,
    pub collected_signatures: Vec<Bytes>,
    pub total_collected: u64,
    pub required: u64,
    pub state: MessageState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<H256>,
}

impl MessageStatus {
    /// Whether the collected signatures meet the threshold
    pub fn is_enough_signatures(&self) -> bool {
        self.total_collected >= self.required
    }
}

/// Clamp an on-chain count into a `u64`
pub fn saturating_u64(value: U256) -> u64 {
    if value > U256::from(u64::MAX) {
        u64::MAX
    } else {
        value.as_u64()
    }
}
