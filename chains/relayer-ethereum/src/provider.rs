use std::{
    fmt::{Debug, Formatter},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use ethers::{
    abi::AbiDecode,
    prelude::{Middleware, SignerMiddleware},
    providers::{Http, PendingTransaction, Provider},
    signers::{LocalWallet, Signer},
    utils::keccak256,
};
use eyre::{Context, Result};
use relayer_base::NetworkConf;
use relayer_core::{
    Bytes, ChainCommunicationError, ChainResult, Deployment, RelayerChain, TxOutcome,
    UnsignedMessage, H160, H256, U256,
};
use tracing::{debug, info, instrument, warn};

use crate::contracts::{Erc20, WalletContract, WalletContractCalls, WalletFactory};

type SignerProvider = SignerMiddleware<Provider<Http>, LocalWallet>;

const PENDING_TRANSACTION_POLLING_INTERVAL: Duration = Duration::from_secs(2);

/// A configured EVM network, paying for transactions with the relayer key
pub struct EthereumRelayerChain {
    network: String,
    provider: Arc<SignerProvider>,
    factory_address: H160,
}

impl Debug for EthereumRelayerChain {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EthereumRelayerChain")
            .field("network", &self.network)
            .field("relayer", &self.provider.address())
            .field("factory_address", &self.factory_address)
            .finish()
    }
}

impl EthereumRelayerChain {
    /// Connect to the network described by `conf`. The chain id is queried
    /// from the node when the configuration does not pin it.
    pub async fn from_conf(network: &str, conf: &NetworkConf) -> Result<Self> {
        let provider = Provider::<Http>::try_from(conf.rpc_url.as_str())
            .with_context(|| format!("invalid rpc url for {network}"))?;
        let chain_id = match conf.chain_id {
            Some(chain_id) => chain_id,
            None => provider
                .get_chainid()
                .await
                .with_context(|| format!("failed to query chain id of {network}"))?
                .as_u64(),
        };
        let signer = conf
            .relayer_private_key
            .trim_start_matches("0x")
            .parse::<LocalWallet>()
            .with_context(|| format!("invalid relayer key for {network}"))?
            .with_chain_id(chain_id);
        info!(network, chain_id, relayer = ?signer.address(), "Connected to network");

        Ok(Self {
            network: network.to_owned(),
            provider: Arc::new(SignerMiddleware::new(provider, signer)),
            factory_address: conf.factory_address,
        })
    }

    /// Name of the network in the configuration
    pub fn network(&self) -> &str {
        &self.network
    }

    fn wallet(&self, address: H160) -> WalletContract<SignerProvider> {
        WalletContract::new(address, self.provider.clone())
    }
}

#[async_trait]
impl RelayerChain for EthereumRelayerChain {
    fn relayer_address(&self) -> H160 {
        self.provider.address()
    }

    async fn required_signatures(&self, wallet: H160) -> ChainResult<U256> {
        self.wallet(wallet)
            .required_signatures()
            .call()
            .await
            .map_err(ChainCommunicationError::from_contract_error)
    }

    async fn key_exist(&self, wallet: H160, key: H160) -> ChainResult<bool> {
        self.wallet(wallet)
            .key_exist(key)
            .call()
            .await
            .map_err(ChainCommunicationError::from_contract_error)
    }

    async fn code_hash(&self, address: H160) -> ChainResult<H256> {
        let code = self
            .provider
            .get_code(address, None)
            .await
            .map_err(ChainCommunicationError::from_provider_error)?;
        Ok(H256::from(keccak256(&code)))
    }

    async fn balance_of(&self, token: H160, owner: H160) -> ChainResult<U256> {
        if token.is_zero() {
            return self
                .provider
                .get_balance(owner, None)
                .await
                .map_err(ChainCommunicationError::from_provider_error);
        }
        Erc20::new(token, self.provider.clone())
            .balance_of(owner)
            .call()
            .await
            .map_err(ChainCommunicationError::from_contract_error)
    }

    #[instrument(skip(self, message, signatures), fields(network = %self.network, wallet = ?message.from))]
    async fn execute_signed(
        &self,
        message: &UnsignedMessage,
        signatures: Bytes,
    ) -> ChainResult<Option<H256>> {
        let call = self
            .wallet(message.from)
            .execute_signed(
                message.to,
                message.value,
                message.data.clone(),
                message.nonce,
                message.gas_price,
                message.gas_token,
                message.gas_limit_execution,
                message.gas_data(),
                signatures,
            )
            .gas(message.gas_limit)
            .gas_price(message.gas_price);
        let transaction_hash = *call
            .send()
            .await
            .map_err(ChainCommunicationError::from_contract_error)?;
        debug!(?transaction_hash, "Dispatched executeSigned");
        Ok(Some(transaction_hash))
    }

    #[instrument(skip(self, deployment), fields(network = %self.network, wallet = ?deployment.wallet_address))]
    async fn deploy_wallet(&self, deployment: &Deployment) -> ChainResult<Option<H256>> {
        let call = WalletFactory::new(self.factory_address, self.provider.clone())
            .create_contract(
                deployment.public_key,
                deployment.ens_name.clone(),
                deployment.gas_price,
                deployment.gas_token,
                deployment.signature.clone(),
            )
            .gas_price(deployment.gas_price);
        let transaction_hash = *call
            .send()
            .await
            .map_err(ChainCommunicationError::from_contract_error)?;
        debug!(?transaction_hash, "Dispatched createContract");
        Ok(Some(transaction_hash))
    }

    #[instrument(skip(self), fields(network = %self.network))]
    async fn wait_for_mined(&self, transaction_hash: H256) -> ChainResult<TxOutcome> {
        let pending = PendingTransaction::new(transaction_hash, self.provider.provider())
            .interval(PENDING_TRANSACTION_POLLING_INTERVAL);
        match pending.await {
            Ok(Some(receipt)) => {
                let executed = receipt.status.map_or(true, |status| status.as_u64() == 1);
                info!(executed, gas_used = ?receipt.gas_used, "Transaction mined");
                Ok(TxOutcome {
                    transaction_hash,
                    executed,
                    gas_used: receipt.gas_used,
                })
            }
            // ethers-rs returns None once the tx is no longer in the mempool
            Ok(None) => {
                warn!("Transaction dropped");
                Err(ChainCommunicationError::TransactionDropped(transaction_hash))
            }
            Err(err) => Err(ChainCommunicationError::from_provider_error(err)),
        }
    }

    fn added_keys(&self, call_data: &[u8]) -> Vec<H160> {
        decode_added_keys(call_data)
    }
}

/// Keys added by a wallet `addKey`/`addKeys` call
pub fn decode_added_keys(call_data: &[u8]) -> Vec<H160> {
    match WalletContractCalls::decode(call_data) {
        Ok(WalletContractCalls::AddKey(call)) => vec![call.key],
        Ok(WalletContractCalls::AddKeys(call)) => call.keys,
        _ => vec![],
    }
}
