use ethers_core::types::{Bytes, H160, H256, U256};
use serde::{Deserialize, Serialize};

use crate::{
    types::{packed::PackedEncoder, ExecutionRecord, MessageState},
    RelayerResult,
};

/// A request to deploy a wallet at its counterfactual address. The owner key
/// signs the deployment hash to authorise the relayer to spend the wallet's
/// funds on deployment gas.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRequest {
    /// Initial owner key of the wallet
    pub public_key: H160,
    /// Full ENS name to register, e.g. `alex.mylogin.eth`
    pub ens_name: String,
    /// Counterfactual wallet address, funded before deployment
    pub wallet_address: H160,
    #[serde(with = "crate::types::serialize")]
    pub gas_price: U256,
    pub gas_token: H160,
    pub signature: Bytes,
}

impl DeploymentRequest {
    /// `keccak256(abi.encodePacked(publicKey, ensName, gasPrice, gasToken))`
    pub fn deployment_hash(&self) -> H256 {
        PackedEncoder::default()
            .address(self.public_key)
            .bytes(self.ens_name.as_bytes())
            .uint(self.gas_price)
            .address(self.gas_token)
            .keccak()
    }

    /// Key that signed the request
    pub fn recover_signer(&self) -> RelayerResult<H160> {
        crate::types::recover_signer(self.deployment_hash(), &self.signature)
    }
}

/// A persisted deployment
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub hash: H256,
    pub public_key: H160,
    pub ens_name: String,
    pub wallet_address: H160,
    #[serde(with = "crate::types::serialize")]
    pub gas_price: U256,
    pub gas_token: H160,
    pub signature: Bytes,
    #[serde(default)]
    pub state: MessageState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<H256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Deployment {
    /// A deployment row ready to be queued
    pub fn queued(request: DeploymentRequest) -> Self {
        Self {
            hash: request.deployment_hash(),
            public_key: request.public_key,
            ens_name: request.ens_name,
            wallet_address: request.wallet_address,
            gas_price: request.gas_price,
            gas_token: request.gas_token,
            signature: request.signature,
            state: MessageState::Queued,
            transaction_hash: None,
            error: None,
        }
    }

    /// Split the ENS name into its label and registrar domain,
    /// `alex.mylogin.eth` -> (`alex`, `mylogin.eth`)
    pub fn ens_parts(&self) -> Option<(&str, &str)> {
        self.ens_name
            .split_once('.')
            .filter(|(label, domain)| !label.is_empty() && !domain.is_empty())
    }
}

impl ExecutionRecord for Deployment {
    const ENTITY: &'static str = "deployment";

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
