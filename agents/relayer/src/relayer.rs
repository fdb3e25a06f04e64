use std::{
    fmt::{Debug, Formatter},
    sync::Arc,
    time::Duration,
};

use eyre::Result;
use parking_lot::Mutex;
use prometheus::Registry;
use relayer_base::{
    db::{RelayerRocksDB, DB},
    migrations::migrate,
    server::Server,
    RelayerMetrics, Settings,
};
use relayer_core::{
    DeploymentRequest, MessageStatus, RelayerError, RelayerResult, SignedMessage, H256,
};
use tokio::{net::TcpListener, task::JoinHandle};
use tracing::{info, info_span, instrument, Instrument};

use crate::{
    authorisation::AuthorisationService,
    chains::ChainRegistry,
    deployment::DeploymentService,
    msg::{
        executor::{DeploymentExecutor, MessageExecutor},
        hooks::AuthorisationCleanupHook,
        pending_messages::PendingMessages,
        queue::ExecutionQueue,
        status::MessageStatusService,
        validators::{deployment_validators, message_validators},
        worker::{ExecutionWorker, WorkerState},
    },
    server::ServerState,
};

/// A relayer process: every service wired to one database and one set of
/// networks, the execution worker and the HTTP API.
pub struct Relayer {
    db: RelayerRocksDB,
    default_network: String,
    port: Option<u16>,
    metrics: Arc<RelayerMetrics>,
    pending_messages: PendingMessages,
    status: MessageStatusService,
    deployments: DeploymentService,
    authorisations: AuthorisationService,
    worker: ExecutionWorker,
    server: Mutex<Option<JoinHandle<()>>>,
}

impl Debug for Relayer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relayer")
            .field("default_network", &self.default_network)
            .field("port", &self.port)
            .field("worker", &self.worker.state())
            .finish_non_exhaustive()
    }
}

impl Relayer {
    /// Open the database and connect to every configured network
    pub async fn from_settings(settings: &Settings) -> Result<Self> {
        let db = DB::from_path(&settings.db)?;
        let chains = ChainRegistry::from_settings(settings).await?;
        let metrics = Arc::new(RelayerMetrics::new(Registry::new())?);
        Ok(Self::new(
            settings,
            chains,
            RelayerRocksDB::new(db),
            metrics,
        ))
    }

    pub fn new(
        settings: &Settings,
        chains: ChainRegistry,
        db: RelayerRocksDB,
        metrics: Arc<RelayerMetrics>,
    ) -> Self {
        let chains = Arc::new(chains);
        let store = Arc::new(db.clone());
        let queue = ExecutionQueue::new(store.clone(), metrics.clone());
        let deployment_validators = Arc::new(deployment_validators());

        let message_executor = MessageExecutor::new(
            store.clone(),
            chains.clone(),
            message_validators(),
            metrics.clone(),
        )
        .with_hook(Arc::new(AuthorisationCleanupHook::new(
            store.clone(),
            chains.clone(),
        )));
        let deployment_executor = DeploymentExecutor::new(
            store.clone(),
            chains.clone(),
            deployment_validators.clone(),
            metrics.clone(),
        );
        let worker = ExecutionWorker::new(
            queue.clone(),
            vec![Arc::new(message_executor), Arc::new(deployment_executor)],
            Duration::from_millis(settings.worker_tick_ms),
            metrics.clone(),
        );

        Self {
            default_network: settings.default_network.clone(),
            port: settings.port,
            pending_messages: PendingMessages::new(
                store.clone(),
                queue.clone(),
                chains.clone(),
                metrics.clone(),
            ),
            status: MessageStatusService::new(store.clone(), chains.clone()),
            deployments: DeploymentService::new(
                store.clone(),
                queue,
                chains.clone(),
                deployment_validators,
            ),
            authorisations: AuthorisationService::new(store, chains),
            worker,
            server: Mutex::new(None),
            metrics,
            db,
        }
    }

    /// Migrate the database, then start the worker and, if a port is
    /// configured, the HTTP server
    #[instrument(skip(self))]
    pub fn start(&self) -> Result<()> {
        let applied = migrate(&self.db, &self.default_network)?;
        info!(applied, "Database migrated");
        self.worker.start();
        if let Some(port) = self.port {
            let server = Arc::new(Server::new(port, self.metrics.clone()));
            let handle = server.run_with_custom_router(self.server_state().router());
            self.replace_server(handle);
        }
        Ok(())
    }

    /// Serve the API on an already bound listener
    pub fn serve(&self, listener: TcpListener) {
        let server = Arc::new(Server::new(self.port.unwrap_or_default(), self.metrics.clone()));
        let router = self.server_state().router();
        let handle = tokio::spawn(
            server
                .serve(listener, router)
                .instrument(info_span!("server")),
        );
        self.replace_server(handle);
    }

    /// Hard stop: the worker abandons the item in flight
    pub fn stop(&self) {
        self.worker.stop();
        self.abort_server();
    }

    /// Let the worker drain the queue, then stop
    pub async fn stop_later(&self) {
        self.worker.stop_later().await;
        self.abort_server();
    }

    pub fn worker_state(&self) -> WorkerState {
        self.worker.state()
    }

    pub async fn handle_message(
        &self,
        message: &SignedMessage,
        network: &str,
    ) -> RelayerResult<MessageStatus> {
        self.pending_messages.add(message, network).await
    }

    /// Status of a message, `None` if the relayer never saw it
    pub async fn get_status(
        &self,
        hash: H256,
        network: &str,
    ) -> RelayerResult<Option<MessageStatus>> {
        match self.status.get_status(hash, network).await {
            Ok(status) => Ok(Some(status)),
            Err(RelayerError::MessageNotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub async fn deploy(&self, request: DeploymentRequest, network: &str) -> RelayerResult<H256> {
        self.deployments.deploy(request, network).await
    }

    pub fn server_state(&self) -> ServerState {
        ServerState::new(
            self.pending_messages.clone(),
            self.status.clone(),
            self.deployments.clone(),
            self.authorisations.clone(),
            self.default_network.clone(),
        )
    }

    fn replace_server(&self, handle: JoinHandle<()>) {
        if let Some(previous) = self.server.lock().replace(handle) {
            previous.abort();
        }
    }

    fn abort_server(&self) {
        if let Some(handle) = self.server.lock().take() {
            handle.abort();
            info!("Server stopped");
        }
    }
}
