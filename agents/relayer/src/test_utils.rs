use std::sync::Arc;

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Method, Request, Response},
    Router,
};
use ethers_signers::Signer;
use http_body_util::BodyExt;
use relayer_base::{
    db::{test_utils::tmp_db, RelayerRocksDB},
    ContractWhitelist, NetworkConf, RelayerMetrics, SupportedToken,
};
use relayer_core::{
    test_utils::{dummy_message, sign_hash, test_signer, MockChain},
    AuthorisationStore, Bytes, Deployment, DeploymentRequest, ExecutionRecord, MessageItem,
    Repository, SignedMessage, H160, H256, U256,
};
use serde::de::DeserializeOwned;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::{
    authorisation::AuthorisationService,
    chains::ChainRegistry,
    deployment::DeploymentService,
    msg::{
        executor::{DeploymentExecutor, MessageExecutor},
        pending_messages::PendingMessages,
        queue::ExecutionQueue,
        status::MessageStatusService,
        validators::{deployment_validators, message_validators},
    },
    server::ServerState,
};

pub const WALLET: H160 = H160([0x1a; 20]);
pub const TOKEN: H160 = H160([0x70; 20]);
pub const PROXY_CODE_HASH: H256 = H256([0xab; 32]);
pub const RELAYER: H160 = H160([0x99; 20]);

pub fn network_conf() -> NetworkConf {
    NetworkConf {
        rpc_url: "http://127.0.0.1:18545".parse().unwrap(),
        chain_id: Some(1337),
        relayer_private_key: "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318"
            .to_owned(),
        factory_address: H160::repeat_byte(0xfa),
        supported_tokens: vec![
            SupportedToken {
                address: TOKEN,
                minimal_amount: U256::exp10(17),
            },
            SupportedToken {
                address: H160::zero(),
                minimal_amount: U256::exp10(17),
            },
        ],
        contract_whitelist: ContractWhitelist {
            wallet: vec![],
            proxy: vec![PROXY_CODE_HASH],
        },
        ens_registrars: vec!["mylogin.eth".to_owned()],
        min_gas_limit_execution: None,
    }
}

/// A chain on which every message and deployment passes validation
pub fn funded_chain() -> MockChain {
    let mut chain = MockChain::new();
    chain
        .expect_code_hash()
        .returning(|_| Ok(PROXY_CODE_HASH));
    chain
        .expect_balance_of()
        .returning(|_, _| Ok(U256::exp10(20)));
    chain.expect_relayer_address().return_const(RELAYER);
    chain
}

/// A temporary database with a single mocked network
pub struct TestNetwork {
    pub _dir: TempDir,
    pub db: RelayerRocksDB,
    pub chains: Arc<ChainRegistry>,
    pub metrics: Arc<RelayerMetrics>,
}

impl TestNetwork {
    pub const NAME: &'static str = "ganache";

    pub fn new(chain: MockChain) -> Self {
        let (dir, db) = tmp_db();
        let mut chains = ChainRegistry::default();
        chains.insert(Self::NAME, Arc::new(chain), network_conf());
        Self {
            _dir: dir,
            db,
            chains: Arc::new(chains),
            metrics: Arc::new(RelayerMetrics::dummy_instance()),
        }
    }

    pub fn queue(&self) -> ExecutionQueue {
        ExecutionQueue::new(Arc::new(self.db.clone()), self.metrics.clone())
    }

    pub fn status_service(&self) -> MessageStatusService {
        MessageStatusService::new(Arc::new(self.db.clone()), self.chains.clone())
    }

    pub fn pending_messages(&self) -> PendingMessages {
        PendingMessages::new(
            Arc::new(self.db.clone()),
            self.queue(),
            self.chains.clone(),
            self.metrics.clone(),
        )
    }

    pub fn message_executor(&self) -> MessageExecutor {
        MessageExecutor::new(
            Arc::new(self.db.clone()),
            self.chains.clone(),
            message_validators(),
            self.metrics.clone(),
        )
    }

    pub fn deployment_executor(&self) -> DeploymentExecutor {
        DeploymentExecutor::new(
            Arc::new(self.db.clone()),
            self.chains.clone(),
            Arc::new(deployment_validators()),
            self.metrics.clone(),
        )
    }

    pub fn authorisation_store(&self) -> Arc<dyn AuthorisationStore> {
        Arc::new(self.db.clone())
    }

    pub fn deployment_service(&self) -> DeploymentService {
        DeploymentService::new(
            Arc::new(self.db.clone()),
            self.queue(),
            self.chains.clone(),
            Arc::new(deployment_validators()),
        )
    }

    pub fn authorisation_service(&self) -> AuthorisationService {
        AuthorisationService::new(self.authorisation_store(), self.chains.clone())
    }

    /// API state defaulting to this network
    pub fn server_state(&self) -> ServerState {
        ServerState::new(
            self.pending_messages(),
            self.status_service(),
            self.deployment_service(),
            self.authorisation_service(),
            Self::NAME.to_owned(),
        )
    }

    /// Store an unsigned message row from [`WALLET`] paying gas in [`TOKEN`]
    pub async fn store_message(&self) -> MessageItem {
        let item = MessageItem::new(&SignedMessage {
            message: dummy_message(WALLET, TOKEN),
            signature: Bytes::default(),
        });
        Repository::<MessageItem>::add(&self.db, item.message_hash, &item, Self::NAME)
            .await
            .unwrap();
        item
    }

    /// Store a queued deployment of [`WALLET`], signed by its owner key
    pub async fn store_deployment(&self, ens_name: &str) -> Deployment {
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
        let deployment = Deployment::queued(request);
        Repository::<Deployment>::add(&self.db, deployment.hash, &deployment, Self::NAME)
            .await
            .unwrap();
        deployment
    }

    pub async fn get_row<T>(&self, hash: H256) -> T
    where
        T: ExecutionRecord,
        RelayerRocksDB: Repository<T>,
    {
        Repository::<T>::get(&self.db, hash, Self::NAME).await.unwrap()
    }
}

/// Send a request to `app`, with `body` as JSON if given
pub async fn send_request(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let body = match body {
        Some(json) => Body::from(serde_json::to_vec(&json).unwrap()),
        None => Body::empty(),
    };
    let request = Request::builder()
        .uri(uri)
        .method(method)
        .header(CONTENT_TYPE, "application/json")
        .body(body)
        .expect("Failed to build request");
    app.oneshot(request).await.expect("Failed to send request")
}

pub async fn parse_body_to_json<T: DeserializeOwned>(body: Body) -> T {
    let bytes = body
        .collect()
        .await
        .expect("Failed to collect body data")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("Failed to deserialize response body")
}
