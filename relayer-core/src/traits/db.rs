use std::fmt::Debug;

use async_trait::async_trait;
use ethers_core::types::{Bytes, H160, H256};

use crate::{
    types::{
        AuthorisationRequest, ExecutionRecord, MessageItem, MessageState, QueueItem,
        SignatureKeyPair,
    },
    RelayerResult,
};

/// Storage for rows that go through the execution queue. Every row is scoped
/// by `(hash, network)`.
#[async_trait]
pub trait Repository<T: ExecutionRecord>: Send + Sync + Debug {
    /// Insert a new row; an existing row is left untouched
    async fn add(&self, hash: H256, item: &T, network: &str) -> RelayerResult<()>;

    /// Fetch a row, failing with `NotFound` if it does not exist
    async fn get(&self, hash: H256, network: &str) -> RelayerResult<T>;

    async fn is_present(&self, hash: H256, network: &str) -> RelayerResult<bool>;

    async fn remove(&self, hash: H256, network: &str) -> RelayerResult<()>;

    /// Store the transaction hash and move the row to `Pending`
    async fn mark_as_pending(
        &self,
        hash: H256,
        transaction_hash: H256,
        network: &str,
    ) -> RelayerResult<()>;

    /// Store the error and move the row to `Error`
    async fn mark_as_error(&self, hash: H256, error: &str, network: &str) -> RelayerResult<()>;

    async fn set_state(&self, hash: H256, state: MessageState, network: &str)
        -> RelayerResult<()>;

    /// Atomically move the row from `from` to `to`. Returns false, without
    /// writing, if the row is not in `from`.
    async fn transition_state(
        &self,
        hash: H256,
        from: MessageState,
        to: MessageState,
        network: &str,
    ) -> RelayerResult<bool>;
}

/// Message storage, with signature collection
#[async_trait]
pub trait MessageRepository: Repository<MessageItem> {
    /// Atomically append a signature. Fails with `DuplicatedSignature` if the
    /// signature, or another signature from the same key, is already
    /// collected. Returns the updated row.
    async fn add_signature(
        &self,
        hash: H256,
        pair: SignatureKeyPair,
        network: &str,
    ) -> RelayerResult<MessageItem>;

    /// Whether this exact signature was collected for the message
    async fn contains_signature(
        &self,
        hash: H256,
        signature: &Bytes,
        network: &str,
    ) -> RelayerResult<bool>;
}

/// Durable FIFO of work for the execution worker
#[async_trait]
pub trait QueueStore: Send + Sync + Debug {
    /// Append an item. An item already queued for the same hash and network
    /// is left where it is. Returns the item's hash.
    async fn add(&self, item: &QueueItem) -> RelayerResult<H256>;

    /// Oldest queued item, without removing it
    async fn get_next(&self) -> RelayerResult<Option<QueueItem>>;

    /// Remove an item; removing an absent item is a no-op
    async fn remove(&self, hash: H256, network: &str) -> RelayerResult<()>;

    /// Number of queued items
    async fn count(&self) -> RelayerResult<u64>;
}

/// Pending device authorisation requests
#[async_trait]
pub trait AuthorisationStore: Send + Sync + Debug {
    /// Insert or replace the request for `(wallet, key, network)`
    async fn add(&self, request: &AuthorisationRequest) -> RelayerResult<()>;

    async fn get_pending(
        &self,
        wallet: H160,
        network: &str,
    ) -> RelayerResult<Vec<AuthorisationRequest>>;

    /// Remove the request; returns whether one existed
    async fn remove(&self, wallet: H160, key: H160, network: &str) -> RelayerResult<bool>;
}
