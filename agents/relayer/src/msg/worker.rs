use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;
use relayer_base::RelayerMetrics;
use relayer_core::{QueueItem, RelayerResult};
use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, instrument, warn, Instrument};

use super::{executor::Executor, queue::ExecutionQueue};

/// Lifecycle of the execution worker
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum WorkerState {
    Running,
    /// Draining: the loop stops once the queue is empty
    Stopping,
    Stopped,
}

/// The single consumer of the execution queue. Items are executed one at a
/// time, which keeps the relayer's transactions on each network strictly
/// ordered.
#[derive(Debug)]
pub struct ExecutionWorker {
    queue: ExecutionQueue,
    executors: Arc<Vec<Arc<dyn Executor>>>,
    tick: Duration,
    metrics: Arc<RelayerMetrics>,
    state: watch::Sender<WorkerState>,
    cancel: Mutex<CancellationToken>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ExecutionWorker {
    pub fn new(
        queue: ExecutionQueue,
        executors: Vec<Arc<dyn Executor>>,
        tick: Duration,
        metrics: Arc<RelayerMetrics>,
    ) -> Self {
        Self {
            queue,
            executors: Arc::new(executors),
            tick,
            metrics,
            state: watch::Sender::new(WorkerState::Stopped),
            cancel: Mutex::new(CancellationToken::new()),
            handle: Mutex::new(None),
        }
    }

    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    /// Start polling the queue. A no-op if the loop is already alive.
    pub fn start(&self) {
        match self.state.send_replace(WorkerState::Running) {
            WorkerState::Running => {}
            WorkerState::Stopping => debug!("Worker resumed while draining"),
            WorkerState::Stopped => {
                let cancel = CancellationToken::new();
                *self.cancel.lock() = cancel.clone();
                let worker_loop = WorkerLoop {
                    queue: self.queue.clone(),
                    executors: self.executors.clone(),
                    tick: self.tick,
                    metrics: self.metrics.clone(),
                    state: self.state.clone(),
                    cancel,
                };
                let handle = tokio::spawn(worker_loop.run().instrument(info_span!("worker")));
                *self.handle.lock() = Some(handle);
                info!("Execution worker started");
            }
        }
    }

    /// Stop immediately. An item in flight is abandoned; its queue entry is
    /// kept and executed again on the next start.
    pub fn stop(&self) {
        self.state.send_replace(WorkerState::Stopped);
        self.cancel.lock().cancel();
        info!("Execution worker stopped");
    }

    /// Stop taking new work once the queue is empty, and wait for the loop to
    /// exit. A transaction being waited on is not interrupted.
    pub async fn stop_later(&self) {
        self.state.send_if_modified(|state| {
            if *state == WorkerState::Running {
                *state = WorkerState::Stopping;
                true
            } else {
                false
            }
        });
        let mut state = self.state.subscribe();
        if state
            .wait_for(|state| *state == WorkerState::Stopped)
            .await
            .is_err()
        {
            warn!("Worker state channel closed");
        }
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                error!(?err, "Worker task failed");
            }
        }
        info!("Execution worker drained");
    }
}

impl Drop for ExecutionWorker {
    fn drop(&mut self) {
        self.cancel.lock().cancel();
    }
}

struct WorkerLoop {
    queue: ExecutionQueue,
    executors: Arc<Vec<Arc<dyn Executor>>>,
    tick: Duration,
    metrics: Arc<RelayerMetrics>,
    state: watch::Sender<WorkerState>,
    cancel: CancellationToken,
}

impl WorkerLoop {
    async fn run(self) {
        loop {
            self.metrics.update_liveness_metric();
            let processed = tokio::select! {
                _ = self.cancel.cancelled() => break,
                processed = self.process_next() => processed,
            };
            match processed {
                Ok(true) => continue,
                Ok(false) => {
                    if self.finish_draining() {
                        break;
                    }
                }
                Err(err) => error!(error = %err, "Failed to process queue"),
            }
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.tick) => {}
            }
        }
        debug!("Worker loop exited");
    }

    /// Move `Stopping` to `Stopped`. Returns whether the loop should exit.
    fn finish_draining(&self) -> bool {
        let drained = self.state.send_if_modified(|state| {
            if *state == WorkerState::Stopping {
                *state = WorkerState::Stopped;
                true
            } else {
                false
            }
        });
        drained || *self.state.borrow() == WorkerState::Stopped
    }

    /// Execute the oldest queue item. Returns false if the queue was empty.
    async fn process_next(&self) -> RelayerResult<bool> {
        let Some(item) = self.queue.get_next().await? else {
            return Ok(false);
        };
        match self
            .executors
            .iter()
            .find(|executor| executor.can_execute(&item))
        {
            Some(executor) => self.execute(executor.as_ref(), &item).await?,
            None => {
                warn!(hash = ?item.hash, network = %item.network, item_type = %item.item_type, "No executor for queue item, dropping it");
                self.queue.remove(item.hash, &item.network).await?;
            }
        }
        Ok(true)
    }

    #[instrument(skip(self, executor, item), fields(hash = ?item.hash, network = %item.network, item_type = %item.item_type))]
    async fn execute(&self, executor: &dyn Executor, item: &QueueItem) -> RelayerResult<()> {
        if let Err(err) = executor.handle_execute(item.hash, &item.network).await {
            error!(error = %err, "Executor failed");
        }
        self.queue.remove(item.hash, &item.network).await
    }
}

#[cfg(test)]
mod tests;
