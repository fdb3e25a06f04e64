use std::sync::Arc;

use async_trait::async_trait;
use relayer_base::RelayerMetrics;
use relayer_core::{
    MessageItem, MessageRepository, QueueItem, QueueItemType, RelayerResult, TxOutcome, H256,
};
use tracing::{instrument, warn};

use super::{execute_and_record, Executor, RecordSubmitter};
use crate::{
    chains::{ChainRegistry, NetworkContext},
    msg::{hooks::OnTransactionMined, validators::MessageValidator},
};

/// Executes messages that reached their signature threshold
#[derive(Debug)]
pub struct MessageExecutor {
    messages: Arc<dyn MessageRepository>,
    chains: Arc<ChainRegistry>,
    validators: Vec<Box<dyn MessageValidator>>,
    hooks: Vec<Arc<dyn OnTransactionMined>>,
    metrics: Arc<RelayerMetrics>,
}

impl MessageExecutor {
    pub fn new(
        messages: Arc<dyn MessageRepository>,
        chains: Arc<ChainRegistry>,
        validators: Vec<Box<dyn MessageValidator>>,
        metrics: Arc<RelayerMetrics>,
    ) -> Self {
        Self {
            messages,
            chains,
            validators,
            hooks: vec![],
            metrics,
        }
    }

    /// Register a hook run after every successfully mined message
    pub fn with_hook(mut self, hook: Arc<dyn OnTransactionMined>) -> Self {
        self.hooks.push(hook);
        self
    }
}

#[async_trait]
impl RecordSubmitter for MessageExecutor {
    type Record = MessageItem;
    type Repository = dyn MessageRepository;

    fn repository(&self) -> &Self::Repository {
        self.messages.as_ref()
    }

    fn chains(&self) -> &ChainRegistry {
        &self.chains
    }

    async fn validate(&self, item: &MessageItem, network: &NetworkContext) -> RelayerResult<()> {
        for validator in &self.validators {
            validator.validate(&item.message, network).await?;
        }
        Ok(())
    }

    async fn submit(
        &self,
        item: &MessageItem,
        network: &NetworkContext,
    ) -> RelayerResult<Option<H256>> {
        Ok(network
            .chain
            .execute_signed(&item.message, item.packed_signatures())
            .await?)
    }

    async fn on_mined(&self, item: &MessageItem, outcome: &TxOutcome, network: &str) {
        for hook in &self.hooks {
            if let Err(err) = hook.on_mined(item, outcome, network).await {
                warn!(?hook, error = %err, "Transaction mined hook failed");
            }
        }
    }
}

#[async_trait]
impl Executor for MessageExecutor {
    fn can_execute(&self, item: &QueueItem) -> bool {
        item.item_type == QueueItemType::Message
    }

    #[instrument(skip(self), fields(entity = "message"))]
    async fn handle_execute(&self, hash: H256, network: &str) -> RelayerResult<()> {
        execute_and_record(self, &self.metrics, hash, network).await
    }
}
