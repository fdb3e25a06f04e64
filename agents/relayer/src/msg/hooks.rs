use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;
use relayer_core::{AuthorisationStore, MessageItem, RelayerResult, TxOutcome};
use tracing::{debug, info};

use crate::chains::ChainRegistry;

/// Reaction to a message transaction being mined successfully. Hooks run in
/// registration order once the transaction is mined and before the message
/// is marked `Success`.
#[async_trait]
pub trait OnTransactionMined: Send + Sync + Debug {
    async fn on_mined(
        &self,
        message: &MessageItem,
        outcome: &TxOutcome,
        network: &str,
    ) -> RelayerResult<()>;
}

/// Purges pending authorisation requests of keys a mined message added to
/// its wallet
#[derive(Debug, Clone)]
pub struct AuthorisationCleanupHook {
    authorisations: Arc<dyn AuthorisationStore>,
    chains: Arc<ChainRegistry>,
}

impl AuthorisationCleanupHook {
    pub fn new(authorisations: Arc<dyn AuthorisationStore>, chains: Arc<ChainRegistry>) -> Self {
        Self {
            authorisations,
            chains,
        }
    }
}

#[async_trait]
impl OnTransactionMined for AuthorisationCleanupHook {
    async fn on_mined(
        &self,
        message: &MessageItem,
        _outcome: &TxOutcome,
        network: &str,
    ) -> RelayerResult<()> {
        let wallet = message.wallet_address;
        // key management calls target the wallet itself
        if message.message.to != wallet {
            return Ok(());
        }
        let added_keys = self.chains.chain(network)?.added_keys(&message.message.data);
        for key in added_keys {
            if self.authorisations.remove(wallet, key, network).await? {
                info!(?wallet, ?key, network, "Removed fulfilled authorisation request");
            } else {
                debug!(?wallet, ?key, network, "No authorisation request for added key");
            }
        }
        Ok(())
    }
}
