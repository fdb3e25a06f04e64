use std::fmt::{Debug, Formatter};

use async_trait::async_trait;
use ethers_signers::{LocalWallet, Signer};

use crate::{
    types::{Deployment, SignedMessage, TxOutcome, UnsignedMessage},
    Bytes, ChainResult, RelayerChain, H160, H256, U256,
};

mockall::mock! {
    pub Chain {}

    #[async_trait]
    impl RelayerChain for Chain {
        fn relayer_address(&self) -> H160;
        async fn required_signatures(&self, wallet: H160) -> ChainResult<U256>;
        async fn key_exist(&self, wallet: H160, key: H160) -> ChainResult<bool>;
        async fn code_hash(&self, address: H160) -> ChainResult<H256>;
        async fn balance_of(&self, token: H160, owner: H160) -> ChainResult<U256>;
        async fn execute_signed(
            &self,
            message: &UnsignedMessage,
            signatures: Bytes,
        ) -> ChainResult<Option<H256>>;
        async fn deploy_wallet(&self, deployment: &Deployment) -> ChainResult<Option<H256>>;
        async fn wait_for_mined(&self, transaction_hash: H256) -> ChainResult<TxOutcome>;
        fn added_keys(&self, call_data: &[u8]) -> Vec<H160>;
    }
}

impl Debug for MockChain {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockChain")
    }
}

/// A deterministic signer; distinct `index` values give distinct keys
pub fn test_signer(index: u8) -> LocalWallet {
    LocalWallet::from_bytes(&[index.wrapping_add(1); 32]).unwrap()
}

/// EIP-191 signature of `hash` by `signer`
pub async fn sign_hash(signer: &LocalWallet, hash: H256) -> Bytes {
    let signature = signer.sign_message(hash.as_bytes()).await.unwrap();
    Bytes::from(signature.to_vec())
}

/// A message from `wallet` transferring 2 wei to a fixed recipient, paying
/// gas in `gas_token`
pub fn dummy_message(wallet: H160, gas_token: H160) -> UnsignedMessage {
    UnsignedMessage {
        from: wallet,
        to: H160::repeat_byte(0x0e),
        value: U256::from(2),
        data: Bytes::default(),
        nonce: U256::zero(),
        gas_price: U256::from(1_000_000_000u64),
        gas_token,
        gas_limit: U256::from(200_000),
        gas_limit_execution: U256::from(120_000),
    }
}

/// `message` signed by `signer`
pub async fn sign_message(message: &UnsignedMessage, signer: &LocalWallet) -> SignedMessage {
    SignedMessage {
        message: message.clone(),
        signature: sign_hash(signer, message.message_hash()).await,
    }
}
