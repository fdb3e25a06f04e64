use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use relayer_base::{db::test_utils::tmp_db, RelayerMetrics};
use relayer_core::{QueueItem, QueueItemType, RelayerError, RelayerResult, H256};

use super::*;

const NETWORK: &str = "ganache";
const TICK: Duration = Duration::from_millis(5);

#[derive(Debug)]
struct RecordingExecutor {
    item_type: QueueItemType,
    fail: bool,
    executed: Mutex<Vec<(H256, String)>>,
}

impl RecordingExecutor {
    fn new(item_type: QueueItemType, fail: bool) -> Arc<Self> {
        Arc::new(Self {
            item_type,
            fail,
            executed: Mutex::new(vec![]),
        })
    }

    fn executed(&self) -> Vec<(H256, String)> {
        self.executed.lock().clone()
    }
}

#[async_trait]
impl Executor for RecordingExecutor {
    fn can_execute(&self, item: &QueueItem) -> bool {
        item.item_type == self.item_type
    }

    async fn handle_execute(&self, hash: H256, network: &str) -> RelayerResult<()> {
        self.executed.lock().push((hash, network.to_owned()));
        if self.fail {
            return Err(RelayerError::NotFound(format!("{hash:?}")));
        }
        Ok(())
    }
}

struct Setup {
    _dir: tempfile::TempDir,
    queue: ExecutionQueue,
    worker: ExecutionWorker,
}

fn setup(executors: Vec<Arc<dyn Executor>>) -> Setup {
    let (dir, db) = tmp_db();
    let metrics = Arc::new(RelayerMetrics::dummy_instance());
    let queue = ExecutionQueue::new(Arc::new(db), metrics.clone());
    let worker = ExecutionWorker::new(queue.clone(), executors, TICK, metrics);
    Setup {
        _dir: dir,
        queue,
        worker,
    }
}

#[tokio::test]
#[tracing_test::traced_test]
async fn drains_queue_in_order_then_stops() {
    let messages = RecordingExecutor::new(QueueItemType::Message, false);
    let deployments = RecordingExecutor::new(QueueItemType::Deployment, false);
    let Setup {
        _dir, queue, worker, ..
    } = setup(vec![messages.clone(), deployments.clone()]);

    queue.add_message(H256::repeat_byte(1), NETWORK).await.unwrap();
    queue
        .add_deployment(H256::repeat_byte(2), NETWORK)
        .await
        .unwrap();
    queue
        .add_message(H256::repeat_byte(3), "rinkeby")
        .await
        .unwrap();
    assert_eq!(worker.state(), WorkerState::Stopped);

    worker.start();
    assert_eq!(worker.state(), WorkerState::Running);
    worker.stop_later().await;

    assert_eq!(worker.state(), WorkerState::Stopped);
    assert_eq!(
        messages.executed(),
        vec![
            (H256::repeat_byte(1), NETWORK.to_owned()),
            (H256::repeat_byte(3), "rinkeby".to_owned()),
        ]
    );
    assert_eq!(
        deployments.executed(),
        vec![(H256::repeat_byte(2), NETWORK.to_owned())]
    );
    assert!(queue.get_next().await.unwrap().is_none());
}

#[tokio::test]
async fn start_is_idempotent() {
    let messages = RecordingExecutor::new(QueueItemType::Message, false);
    let Setup {
        _dir, queue, worker, ..
    } = setup(vec![messages.clone()]);
    queue.add_message(H256::repeat_byte(1), NETWORK).await.unwrap();

    worker.start();
    worker.start();
    worker.stop_later().await;

    assert_eq!(messages.executed().len(), 1);
}

#[tokio::test]
async fn failed_execution_still_leaves_the_queue() {
    let messages = RecordingExecutor::new(QueueItemType::Message, true);
    let Setup {
        _dir, queue, worker, ..
    } = setup(vec![messages.clone()]);
    queue.add_message(H256::repeat_byte(1), NETWORK).await.unwrap();
    queue.add_message(H256::repeat_byte(2), NETWORK).await.unwrap();

    worker.start();
    worker.stop_later().await;

    assert_eq!(messages.executed().len(), 2);
    assert!(queue.get_next().await.unwrap().is_none());
}

#[tokio::test]
#[tracing_test::traced_test]
async fn item_without_executor_is_dropped() {
    let messages = RecordingExecutor::new(QueueItemType::Message, false);
    let Setup {
        _dir, queue, worker, ..
    } = setup(vec![messages.clone()]);
    queue
        .add_deployment(H256::repeat_byte(1), NETWORK)
        .await
        .unwrap();
    queue.add_message(H256::repeat_byte(2), NETWORK).await.unwrap();

    worker.start();
    worker.stop_later().await;

    assert_eq!(
        messages.executed(),
        vec![(H256::repeat_byte(2), NETWORK.to_owned())]
    );
    assert!(queue.get_next().await.unwrap().is_none());
    assert!(logs_contain("No executor for queue item"));
}

#[tokio::test]
async fn stop_is_immediate_and_keeps_queued_items() {
    let messages = RecordingExecutor::new(QueueItemType::Message, false);
    let Setup {
        _dir, queue, worker, ..
    } = setup(vec![messages.clone()]);

    worker.start();
    worker.stop();
    assert_eq!(worker.state(), WorkerState::Stopped);
    // the loop has exited; nothing picks this up
    worker.stop_later().await;
    queue.add_message(H256::repeat_byte(1), NETWORK).await.unwrap();
    tokio::time::sleep(TICK * 4).await;
    assert!(messages.executed().is_empty());
    assert!(queue.get_next().await.unwrap().is_some());

    // a restart picks the item up again
    worker.start();
    worker.stop_later().await;
    assert_eq!(messages.executed().len(), 1);
}

#[tokio::test]
async fn stop_later_on_idle_worker_returns() {
    let Setup { _dir, worker, .. } = setup(vec![]);
    worker.stop_later().await;
    assert_eq!(worker.state(), WorkerState::Stopped);
}
