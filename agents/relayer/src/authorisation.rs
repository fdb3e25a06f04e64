use std::sync::Arc;

use relayer_core::{
    cancel_authorisation_hash, deny_authorisation_hash, recover_signer, AuthorisationRequest,
    AuthorisationStore, Bytes, RelayerError, RelayerResult, H160,
};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::chains::ChainRegistry;

/// A signed withdrawal of a pending authorisation request
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorisationUpdate {
    pub wallet_contract_address: H160,
    pub key: H160,
    pub signature: Bytes,
}

/// Requests of new devices to have their key added to a wallet
#[derive(Debug, Clone)]
pub struct AuthorisationService {
    store: Arc<dyn AuthorisationStore>,
    chains: Arc<ChainRegistry>,
}

impl AuthorisationService {
    pub fn new(store: Arc<dyn AuthorisationStore>, chains: Arc<ChainRegistry>) -> Self {
        Self { store, chains }
    }

    #[instrument(skip(self, request), fields(wallet = ?request.wallet_contract_address, key = ?request.key, network = %request.network))]
    pub async fn request(&self, request: &AuthorisationRequest) -> RelayerResult<()> {
        self.chains.get(&request.network)?;
        self.store.add(request).await?;
        info!("Authorisation requested");
        Ok(())
    }

    pub async fn get_pending(
        &self,
        wallet: H160,
        network: &str,
    ) -> RelayerResult<Vec<AuthorisationRequest>> {
        self.chains.get(network)?;
        self.store.get_pending(wallet, network).await
    }

    /// Withdraw a request. Only the requesting key can cancel it.
    #[instrument(skip(self, update), fields(wallet = ?update.wallet_contract_address, key = ?update.key))]
    pub async fn cancel(&self, update: &AuthorisationUpdate, network: &str) -> RelayerResult<()> {
        self.chains.get(network)?;
        let hash = cancel_authorisation_hash(update.wallet_contract_address, update.key);
        if recover_signer(hash, &update.signature)? != update.key {
            return Err(RelayerError::InvalidSignature);
        }
        self.remove(update, network).await
    }

    /// Reject a request. Any key of the wallet can deny it.
    #[instrument(skip(self, update), fields(wallet = ?update.wallet_contract_address, key = ?update.key))]
    pub async fn deny(&self, update: &AuthorisationUpdate, network: &str) -> RelayerResult<()> {
        let chain = self.chains.chain(network)?;
        let hash = deny_authorisation_hash(update.wallet_contract_address, update.key);
        let signer = recover_signer(hash, &update.signature)?;
        if !chain
            .key_exist(update.wallet_contract_address, signer)
            .await?
        {
            debug!(?signer, "Signer is not a key of the wallet");
            return Err(RelayerError::InvalidSignature);
        }
        self.remove(update, network).await
    }

    async fn remove(&self, update: &AuthorisationUpdate, network: &str) -> RelayerResult<()> {
        if !self
            .store
            .remove(update.wallet_contract_address, update.key, network)
            .await?
        {
            return Err(RelayerError::NotFound(format!(
                "authorisation request of {:?}",
                update.key
            )));
        }
        info!("Authorisation request removed");
        Ok(())
    }
}
