use std::sync::Arc;

use relayer_base::RelayerMetrics;
use relayer_core::{
    MessageItem, MessageRepository, MessageState, MessageStatus, RelayerError, RelayerResult,
    SignatureKeyPair, SignedMessage, H256,
};
use tracing::{debug, info, instrument, warn};

use super::{queue::ExecutionQueue, status::MessageStatusService};
use crate::chains::ChainRegistry;

/// Collects signatures of a message until the wallet's threshold is met,
/// then hands the message to the execution queue exactly once.
///
/// Every signature is checked against the wallet's key set at the time it
/// arrives, since keys can be removed between two signatures.
#[derive(Debug, Clone)]
pub struct PendingMessages {
    messages: Arc<dyn MessageRepository>,
    status: MessageStatusService,
    queue: ExecutionQueue,
    chains: Arc<ChainRegistry>,
    metrics: Arc<RelayerMetrics>,
}

impl PendingMessages {
    pub fn new(
        messages: Arc<dyn MessageRepository>,
        queue: ExecutionQueue,
        chains: Arc<ChainRegistry>,
        metrics: Arc<RelayerMetrics>,
    ) -> Self {
        Self {
            status: MessageStatusService::new(messages.clone(), chains.clone()),
            messages,
            queue,
            chains,
            metrics,
        }
    }

    pub async fn is_present(&self, hash: H256, network: &str) -> RelayerResult<bool> {
        self.messages.is_present(hash, network).await
    }

    /// Record one signature of `signed` and return the message's status.
    /// Queues the message when this signature completes the threshold.
    #[instrument(skip(self, signed), fields(hash = ?signed.message_hash(), wallet = ?signed.message.from))]
    pub async fn add(&self, signed: &SignedMessage, network: &str) -> RelayerResult<MessageStatus> {
        let chain = self.chains.chain(network)?;
        let hash = signed.message_hash();
        if !self.is_present(hash, network).await? {
            self.messages
                .add(hash, &MessageItem::new(signed), network)
                .await?;
        }

        let item = self.messages.get(hash, network).await?;
        if item.transaction_hash.is_some() {
            return Err(RelayerError::DuplicatedExecution);
        }
        if self
            .messages
            .contains_signature(hash, &signed.signature, network)
            .await?
        {
            return Err(RelayerError::DuplicatedSignature);
        }
        let key = signed.recover_signer()?;
        if !chain.key_exist(item.wallet_address, key).await? {
            debug!(?key, "Signer is not a key of the wallet");
            return Err(RelayerError::InvalidSignature);
        }
        self.messages
            .add_signature(
                hash,
                SignatureKeyPair {
                    key,
                    signature: signed.signature.clone(),
                },
                network,
            )
            .await?;
        self.metrics
            .signatures_collected
            .with_label_values(&[network])
            .inc();

        let mut status = self.status.get_status(hash, network).await?;
        if status.state == MessageState::AwaitSignature && status.is_enough_signatures() {
            if self.on_ready_to_execute(hash, network).await? {
                status.state = MessageState::Queued;
            } else {
                // a concurrent signature queued it first
                status.state = self.messages.get(hash, network).await?.state;
            }
        }
        Ok(status)
    }

    /// Fails if the message was already submitted or lacks signatures
    pub async fn ensure_correct_execution(&self, hash: H256, network: &str) -> RelayerResult<()> {
        let status = self.status.get_status(hash, network).await?;
        if status.transaction_hash.is_some() {
            return Err(RelayerError::DuplicatedExecution);
        }
        if !status.is_enough_signatures() {
            return Err(RelayerError::NotEnoughSignatures {
                required: status.required,
                total_collected: status.total_collected,
            });
        }
        Ok(())
    }

    pub async fn is_enough_signatures(&self, hash: H256, network: &str) -> RelayerResult<bool> {
        Ok(self
            .status
            .get_status(hash, network)
            .await?
            .is_enough_signatures())
    }

    /// Queue the message for execution. Returns false if another caller
    /// already queued it.
    #[instrument(skip(self))]
    pub async fn on_ready_to_execute(&self, hash: H256, network: &str) -> RelayerResult<bool> {
        self.ensure_correct_execution(hash, network).await?;
        let queued = self
            .messages
            .transition_state(
                hash,
                MessageState::AwaitSignature,
                MessageState::Queued,
                network,
            )
            .await?;
        if !queued {
            debug!("Message already queued");
            return Ok(false);
        }
        if let Err(err) = self.queue.add_message(hash, network).await {
            warn!(error = %err, "Failed to queue message");
            self.messages
                .set_state(hash, MessageState::AwaitSignature, network)
                .await?;
            return Err(err);
        }
        info!("Message queued for execution");
        Ok(true)
    }
}
