use std::fmt::Debug;

use async_trait::async_trait;
use relayer_base::RelayerMetrics;
use relayer_core::{
    ExecutionRecord, MessageState, QueueItem, RelayerError, RelayerResult, Repository, TxOutcome,
    H256,
};
use tracing::{info, warn};

use crate::chains::{ChainRegistry, NetworkContext};

pub use deployment::DeploymentExecutor;
pub use message::MessageExecutor;

mod deployment;
mod message;

/// Executes one kind of queue item
#[async_trait]
pub trait Executor: Send + Sync + Debug {
    /// Whether this executor handles `item`
    fn can_execute(&self, item: &QueueItem) -> bool;

    /// Submit the row behind `(hash, network)` and wait for it to be mined.
    /// Failures of the execution itself are recorded on the row; only
    /// failures to record them are returned.
    async fn handle_execute(&self, hash: H256, network: &str) -> RelayerResult<()>;
}

/// The row-specific half of an executor. [`execute_record`] drives every
/// implementor through the same submit, wait and record flow.
#[async_trait]
trait RecordSubmitter: Send + Sync {
    type Record: ExecutionRecord;
    type Repository: Repository<Self::Record> + ?Sized;

    fn repository(&self) -> &Self::Repository;

    fn chains(&self) -> &ChainRegistry;

    async fn validate(&self, record: &Self::Record, network: &NetworkContext)
        -> RelayerResult<()>;

    /// Send the transaction. `None` if the client reported no hash.
    async fn submit(
        &self,
        record: &Self::Record,
        network: &NetworkContext,
    ) -> RelayerResult<Option<H256>>;

    /// Side effects of a successful transaction
    async fn on_mined(&self, _record: &Self::Record, _outcome: &TxOutcome, _network: &str) {}
}

/// Run one record to completion. Returns `None` if the record had already
/// finished.
async fn execute_record<S>(
    submitter: &S,
    hash: H256,
    network: &str,
) -> RelayerResult<Option<TxOutcome>>
where
    S: RecordSubmitter + ?Sized,
{
    let context = submitter.chains().get(network)?;
    let record = submitter.repository().get(hash, network).await?;
    if record.state().is_terminal() {
        info!(state = %record.state(), "Record already finished");
        return Ok(None);
    }

    let transaction_hash = match record.transaction_hash() {
        Some(transaction_hash) => {
            // submitted before a restart
            info!(?transaction_hash, "Resuming wait for submitted transaction");
            transaction_hash
        }
        None => {
            submitter.validate(&record, context).await?;
            let transaction_hash = submitter
                .submit(&record, context)
                .await?
                .ok_or(RelayerError::TransactionHashNotFound)?;
            submitter
                .repository()
                .mark_as_pending(hash, transaction_hash, network)
                .await?;
            info!(?transaction_hash, "Transaction submitted");
            transaction_hash
        }
    };

    let outcome = context.chain.wait_for_mined(transaction_hash).await?;
    if !outcome.executed {
        return Err(RelayerError::TransactionReverted(transaction_hash));
    }
    submitter.on_mined(&record, &outcome, network).await;
    submitter
        .repository()
        .set_state(hash, MessageState::Success, network)
        .await?;
    Ok(Some(outcome))
}

/// [`execute_record`], persisting a failure onto the row
async fn execute_and_record<S>(
    submitter: &S,
    metrics: &RelayerMetrics,
    hash: H256,
    network: &str,
) -> RelayerResult<()>
where
    S: RecordSubmitter + ?Sized,
{
    let entity = <S::Record as ExecutionRecord>::ENTITY;
    match execute_record(submitter, hash, network).await {
        Ok(Some(outcome)) => {
            info!(transaction_hash = ?outcome.transaction_hash, gas_used = ?outcome.gas_used, "Execution succeeded");
            metrics.record_execution(network, entity, "success");
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(err) => {
            warn!(error = %err, kind = err.kind(), "Execution failed");
            metrics.record_execution(network, entity, "error");
            submitter
                .repository()
                .mark_as_error(hash, &err.persisted_message(), network)
                .await
        }
    }
}
