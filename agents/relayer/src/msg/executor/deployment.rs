use std::sync::Arc;

use async_trait::async_trait;
use relayer_base::RelayerMetrics;
use relayer_core::{Deployment, QueueItem, QueueItemType, RelayerResult, Repository, H256};
use tracing::instrument;

use super::{execute_and_record, Executor, RecordSubmitter};
use crate::{
    chains::{ChainRegistry, NetworkContext},
    msg::validators::DeploymentValidator,
};

/// Deploys counterfactual wallets through the network's wallet factory
#[derive(Debug)]
pub struct DeploymentExecutor {
    deployments: Arc<dyn Repository<Deployment>>,
    chains: Arc<ChainRegistry>,
    validators: Arc<Vec<Box<dyn DeploymentValidator>>>,
    metrics: Arc<RelayerMetrics>,
}

impl DeploymentExecutor {
    pub fn new(
        deployments: Arc<dyn Repository<Deployment>>,
        chains: Arc<ChainRegistry>,
        validators: Arc<Vec<Box<dyn DeploymentValidator>>>,
        metrics: Arc<RelayerMetrics>,
    ) -> Self {
        Self {
            deployments,
            chains,
            validators,
            metrics,
        }
    }
}

#[async_trait]
impl RecordSubmitter for DeploymentExecutor {
    type Record = Deployment;
    type Repository = dyn Repository<Deployment>;

    fn repository(&self) -> &Self::Repository {
        self.deployments.as_ref()
    }

    fn chains(&self) -> &ChainRegistry {
        &self.chains
    }

    async fn validate(
        &self,
        deployment: &Deployment,
        network: &NetworkContext,
    ) -> RelayerResult<()> {
        for validator in self.validators.iter() {
            validator.validate(deployment, network).await?;
        }
        Ok(())
    }

    async fn submit(
        &self,
        deployment: &Deployment,
        network: &NetworkContext,
    ) -> RelayerResult<Option<H256>> {
        Ok(network.chain.deploy_wallet(deployment).await?)
    }
}

#[async_trait]
impl Executor for DeploymentExecutor {
    fn can_execute(&self, item: &QueueItem) -> bool {
        item.item_type == QueueItemType::Deployment
    }

    #[instrument(skip(self), fields(entity = "deployment"))]
    async fn handle_execute(&self, hash: H256, network: &str) -> RelayerResult<()> {
        execute_and_record(self, &self.metrics, hash, network).await
    }
}

#[cfg(test)]
mod tests {
    use relayer_core::{test_utils::MockChain, MessageState, TxOutcome};

    use crate::test_utils::{funded_chain, TestNetwork};

    use super::*;

    const TX: H256 = H256([0x55; 32]);

    #[tokio::test]
    async fn deploys_through_factory() {
        let mut chain = funded_chain();
        chain
            .expect_deploy_wallet()
            .times(1)
            .returning(|_| Ok(Some(TX)));
        chain.expect_wait_for_mined().times(1).returning(|hash| {
            Ok(TxOutcome {
                transaction_hash: hash,
                executed: true,
                gas_used: None,
            })
        });
        let network = TestNetwork::new(chain);
        let deployment = network.store_deployment("alex.mylogin.eth").await;

        network
            .deployment_executor()
            .handle_execute(deployment.hash, TestNetwork::NAME)
            .await
            .unwrap();

        let stored: Deployment = network.get_row(deployment.hash).await;
        assert_eq!(stored.state, MessageState::Success);
        assert_eq!(stored.transaction_hash, Some(TX));
        assert!(network
            .metrics
            .gather()
            .map(String::from_utf8)
            .unwrap()
            .unwrap()
            .contains(r#"item_type="deployment",network="ganache",outcome="success"} 1"#));
    }

    #[tokio::test]
    async fn invalid_domain_is_recorded() {
        let mut chain = MockChain::new();
        chain.expect_deploy_wallet().never();
        let network = TestNetwork::new(chain);
        let deployment = network.store_deployment("alex.unknown.eth").await;

        network
            .deployment_executor()
            .handle_execute(deployment.hash, TestNetwork::NAME)
            .await
            .unwrap();

        let stored: Deployment = network.get_row(deployment.hash).await;
        assert_eq!(stored.state, MessageState::Error);
        assert_eq!(
            stored.error.as_deref(),
            Some("InvalidEnsDomain: ENS domain alex.unknown.eth is not supported")
        );
    }

    #[test]
    fn only_handles_deployments() {
        let network = TestNetwork::new(MockChain::new());
        let executor = network.deployment_executor();
        assert!(executor.can_execute(&QueueItem::new(
            TX,
            QueueItemType::Deployment,
            TestNetwork::NAME
        )));
        assert!(!executor.can_execute(&QueueItem::new(
            TX,
            QueueItemType::Message,
            TestNetwork::NAME
        )));
    }
}
