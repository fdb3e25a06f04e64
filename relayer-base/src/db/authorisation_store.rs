use async_trait::async_trait;
use relayer_core::{AuthorisationRequest, AuthorisationStore, RelayerResult, H160};
use tracing::{debug, instrument};

use super::{DbResult, RelayerRocksDB};

/// Authorisation requests keyed by `<network>_<wallet><key>`
pub const AUTHORISATION_BY_WALLET: &str = "authorisation_by_wallet_";

impl RelayerRocksDB {
    /// Key of the request from `key` to join `wallet`
    pub fn authorisation_key(wallet: H160, key: H160, network: &str) -> Vec<u8> {
        let mut suffix = wallet.as_bytes().to_vec();
        suffix.extend_from_slice(key.as_bytes());
        Self::network_key(AUTHORISATION_BY_WALLET, network, suffix)
    }

    fn delete_authorisation(&self, wallet: H160, key: H160, network: &str) -> DbResult<bool> {
        let full_key = Self::authorisation_key(wallet, key, network);
        let _guard = self.lock();
        if !self.contains(&full_key)? {
            return Ok(false);
        }
        self.delete(&full_key)?;
        Ok(true)
    }
}

#[async_trait]
impl AuthorisationStore for RelayerRocksDB {
    #[instrument(skip(self, request), fields(wallet = ?request.wallet_contract_address, key = ?request.key))]
    async fn add(&self, request: &AuthorisationRequest) -> RelayerResult<()> {
        let key = Self::authorisation_key(
            request.wallet_contract_address,
            request.key,
            &request.network,
        );
        self.store_json(&key, request)?;
        debug!("Stored authorisation request");
        Ok(())
    }

    async fn get_pending(
        &self,
        wallet: H160,
        network: &str,
    ) -> RelayerResult<Vec<AuthorisationRequest>> {
        let mut prefix = Self::network_prefix(AUTHORISATION_BY_WALLET, network);
        prefix.extend_from_slice(wallet.as_bytes());
        let expected_len = prefix.len() + H160::len_bytes();
        let mut requests = vec![];
        for entry in self.raw_prefix_iterator(&prefix) {
            let (key, value) = entry?;
            // networks sharing a name prefix could otherwise leak in
            if key.len() != expected_len {
                continue;
            }
            requests.push(serde_json::from_slice(&value).map_err(crate::db::DbError::from)?);
        }
        Ok(requests)
    }

    #[instrument(skip(self))]
    async fn remove(&self, wallet: H160, key: H160, network: &str) -> RelayerResult<bool> {
        Ok(self.delete_authorisation(wallet, key, network)?)
    }
}
