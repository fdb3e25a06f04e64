use std::sync::Arc;

use relayer_core::{Deployment, DeploymentRequest, RelayerError, RelayerResult, Repository, H256};
use tracing::{info, instrument};

use crate::{
    chains::ChainRegistry,
    msg::{queue::ExecutionQueue, validators::DeploymentValidator},
};

/// Accepts counterfactual wallet deployments and stages them for the worker
#[derive(Debug, Clone)]
pub struct DeploymentService {
    deployments: Arc<dyn Repository<Deployment>>,
    queue: ExecutionQueue,
    chains: Arc<ChainRegistry>,
    validators: Arc<Vec<Box<dyn DeploymentValidator>>>,
}

impl DeploymentService {
    pub fn new(
        deployments: Arc<dyn Repository<Deployment>>,
        queue: ExecutionQueue,
        chains: Arc<ChainRegistry>,
        validators: Arc<Vec<Box<dyn DeploymentValidator>>>,
    ) -> Self {
        Self {
            deployments,
            queue,
            chains,
            validators,
        }
    }

    /// Validate and queue a deployment. Returns the deployment hash.
    #[instrument(skip(self, request), fields(ens_name = %request.ens_name, wallet = ?request.wallet_address))]
    pub async fn deploy(&self, request: DeploymentRequest, network: &str) -> RelayerResult<H256> {
        let context = self.chains.get(network)?;
        let deployment = Deployment::queued(request);
        let hash = deployment.hash;

        if self.deployments.is_present(hash, network).await? {
            let existing = self.deployments.get(hash, network).await?;
            if existing.transaction_hash.is_some() {
                return Err(RelayerError::DuplicatedExecution);
            }
            // a failed attempt is replaced by the new request
            self.deployments.remove(hash, network).await?;
        }

        for validator in self.validators.iter() {
            validator.validate(&deployment, context).await?;
        }
        self.deployments.add(hash, &deployment, network).await?;
        self.queue.add_deployment(hash, network).await?;
        info!(?hash, "Deployment queued");
        Ok(hash)
    }

    pub async fn get(&self, hash: H256, network: &str) -> RelayerResult<Deployment> {
        self.chains.get(network)?;
        self.deployments.get(hash, network).await
    }
}

#[cfg(test)]
mod tests {
    use ethers_signers::Signer;
    use relayer_core::{
        test_utils::{sign_hash, test_signer, MockChain},
        Bytes, MessageState, QueueItemType, U256,
    };

    use crate::test_utils::{funded_chain, TestNetwork, TOKEN, WALLET};

    use super::*;

    async fn request(ens_name: &str) -> DeploymentRequest {
        let owner = test_signer(0);
        let mut request = DeploymentRequest {
            public_key: owner.address(),
            ens_name: ens_name.to_owned(),
            wallet_address: WALLET,
            gas_price: U256::from(1_000_000_000u64),
            gas_token: TOKEN,
            signature: Bytes::default(),
        };
        request.signature = sign_hash(&owner, request.deployment_hash()).await;
        request
    }

    #[tokio::test]
    async fn valid_deployment_is_queued() {
        let network = TestNetwork::new(funded_chain());
        let service = network.deployment_service();

        let hash = service
            .deploy(request("alex.mylogin.eth").await, TestNetwork::NAME)
            .await
            .unwrap();

        let stored = service.get(hash, TestNetwork::NAME).await.unwrap();
        assert_eq!(stored.state, MessageState::Queued);
        assert_eq!(stored.ens_name, "alex.mylogin.eth");
        let next = network.queue().get_next().await.unwrap().unwrap();
        assert_eq!(next.hash, hash);
        assert_eq!(next.item_type, QueueItemType::Deployment);
    }

    #[tokio::test]
    async fn invalid_deployment_is_not_stored() {
        let network = TestNetwork::new(MockChain::new());
        let service = network.deployment_service();
        let request = request("alex.unknown.eth").await;
        let hash = request.deployment_hash();

        let err = service
            .deploy(request, TestNetwork::NAME)
            .await
            .unwrap_err();
        assert!(matches!(err, RelayerError::InvalidEnsDomain(_)));
        assert!(service.get(hash, TestNetwork::NAME).await.unwrap_err().is_not_found());
        assert!(network.queue().get_next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deployed_wallet_cannot_be_deployed_again() {
        let network = TestNetwork::new(funded_chain());
        let service = network.deployment_service();
        let hash = service
            .deploy(request("alex.mylogin.eth").await, TestNetwork::NAME)
            .await
            .unwrap();
        Repository::<Deployment>::mark_as_pending(
            &network.db,
            hash,
            H256::repeat_byte(0x42),
            TestNetwork::NAME,
        )
        .await
        .unwrap();

        let err = service
            .deploy(request("alex.mylogin.eth").await, TestNetwork::NAME)
            .await
            .unwrap_err();
        assert!(matches!(err, RelayerError::DuplicatedExecution));
    }

    #[tokio::test]
    async fn failed_deployment_can_be_requested_again() {
        let network = TestNetwork::new(funded_chain());
        let service = network.deployment_service();
        let hash = service
            .deploy(request("alex.mylogin.eth").await, TestNetwork::NAME)
            .await
            .unwrap();
        Repository::<Deployment>::mark_as_error(
            &network.db,
            hash,
            "NotEnoughToken: Not enough tokens",
            TestNetwork::NAME,
        )
        .await
        .unwrap();

        service
            .deploy(request("alex.mylogin.eth").await, TestNetwork::NAME)
            .await
            .unwrap();
        let stored = service.get(hash, TestNetwork::NAME).await.unwrap();
        assert_eq!(stored.state, MessageState::Queued);
        assert_eq!(stored.error, None);
    }

    #[tokio::test]
    async fn unknown_network_is_not_supported() {
        let network = TestNetwork::new(MockChain::new());
        let err = network
            .deployment_service()
            .deploy(request("alex.mylogin.eth").await, "unknownChain")
            .await
            .unwrap_err();
        assert!(matches!(err, RelayerError::ChainNotSupported(_)));
    }
}
