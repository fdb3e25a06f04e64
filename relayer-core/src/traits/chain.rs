use std::fmt::Debug;

use async_trait::async_trait;
use auto_impl::auto_impl;
use ethers_core::types::{Bytes, H160, H256, U256};

use crate::{
    types::{Deployment, TxOutcome, UnsignedMessage},
    ChainResult,
};

/// Everything the relayer needs from one configured network: read-only
/// wallet and token calls, plus submission and mining of the two kinds of
/// transactions it pays for.
#[async_trait]
#[auto_impl(&, Box, Arc)]
pub trait RelayerChain: Send + Sync + Debug {
    /// Address of the relayer's signing key on this network
    fn relayer_address(&self) -> H160;

    /// The wallet's current signature threshold
    async fn required_signatures(&self, wallet: H160) -> ChainResult<U256>;

    /// Whether `key` is an authorised key of `wallet`
    async fn key_exist(&self, wallet: H160, key: H160) -> ChainResult<bool>;

    /// keccak256 of the bytecode deployed at `address`
    async fn code_hash(&self, address: H160) -> ChainResult<H256>;

    /// Balance of `owner` in `token`; the zero address is the native coin
    async fn balance_of(&self, token: H160, owner: H160) -> ChainResult<U256>;

    /// Submit `executeSigned` on the message's wallet. Returns the
    /// transaction hash reported by the client, if any.
    async fn execute_signed(
        &self,
        message: &UnsignedMessage,
        signatures: Bytes,
    ) -> ChainResult<Option<H256>>;

    /// Submit the factory call deploying a counterfactual wallet
    async fn deploy_wallet(&self, deployment: &Deployment) -> ChainResult<Option<H256>>;

    /// Block until `transaction_hash` is mined
    async fn wait_for_mined(&self, transaction_hash: H256) -> ChainResult<TxOutcome>;

    /// Keys added by a wallet call, if `call_data` is an `addKey` or `addKeys` call
    fn added_keys(&self, call_data: &[u8]) -> Vec<H160>;
}
