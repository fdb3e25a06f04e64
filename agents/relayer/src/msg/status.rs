use std::sync::Arc;

use relayer_core::{
    saturating_u64, MessageRepository, MessageStatus, RelayerError, RelayerResult, H256,
};

use crate::chains::ChainRegistry;

/// Point-in-time view of a message. The threshold is read from the wallet on
/// every call since it can change between calls.
#[derive(Debug, Clone)]
pub struct MessageStatusService {
    messages: Arc<dyn MessageRepository>,
    chains: Arc<ChainRegistry>,
}

impl MessageStatusService {
    pub fn new(messages: Arc<dyn MessageRepository>, chains: Arc<ChainRegistry>) -> Self {
        Self { messages, chains }
    }

    pub async fn get_status(&self, hash: H256, network: &str) -> RelayerResult<MessageStatus> {
        let chain = self.chains.chain(network)?;
        let item = self
            .messages
            .get(hash, network)
            .await
            .map_err(|err| {
                if err.is_not_found() {
                    RelayerError::MessageNotFound
                } else {
                    err
                }
            })?;
        let required = chain.required_signatures(item.wallet_address).await?;
        Ok(item.status(saturating_u64(required)))
    }
}

#[cfg(test)]
mod tests {
    use relayer_core::{test_utils::MockChain, MessageState, U256};

    use crate::test_utils::TestNetwork;

    use super::*;

    #[tokio::test]
    async fn unknown_message_is_not_found() {
        let mut chain = MockChain::new();
        chain.expect_required_signatures().never();
        let network = TestNetwork::new(chain);

        let err = network
            .status_service()
            .get_status(H256::repeat_byte(1), TestNetwork::NAME)
            .await
            .unwrap_err();
        assert!(matches!(err, RelayerError::MessageNotFound));
    }

    #[tokio::test]
    async fn unknown_network_is_not_supported() {
        let network = TestNetwork::new(MockChain::new());
        let err = network
            .status_service()
            .get_status(H256::repeat_byte(1), "unknownChain")
            .await
            .unwrap_err();
        assert!(matches!(err, RelayerError::ChainNotSupported(name) if name == "unknownChain"));
    }

    #[tokio::test]
    async fn threshold_is_read_on_every_call() {
        let mut chain = MockChain::new();
        let mut thresholds = vec![U256::from(1), U256::from(3)].into_iter();
        chain
            .expect_required_signatures()
            .times(2)
            .returning(move |_| Ok(thresholds.next().unwrap_or_default()));
        let network = TestNetwork::new(chain);
        let item = network.store_message().await;

        let service = network.status_service();
        let first = service
            .get_status(item.message_hash, TestNetwork::NAME)
            .await
            .unwrap();
        let second = service
            .get_status(item.message_hash, TestNetwork::NAME)
            .await
            .unwrap();
        assert_eq!(first.required, 1);
        assert_eq!(second.required, 3);
        assert_eq!(second.state, MessageState::AwaitSignature);
        assert_eq!(second.message_hash, item.message_hash);
    }
}
