use std::{collections::HashMap, sync::Arc};

use eyre::Result;
use relayer_base::{NetworkConf, Settings};
use relayer_core::{RelayerChain, RelayerError, RelayerResult};
use relayer_ethereum::EthereumRelayerChain;

/// Chain accessor and configuration of one network
#[derive(Debug, Clone)]
pub struct NetworkContext {
    pub chain: Arc<dyn RelayerChain>,
    pub conf: Arc<NetworkConf>,
}

/// Every configured network, by name
#[derive(Debug, Clone, Default)]
pub struct ChainRegistry {
    networks: HashMap<String, NetworkContext>,
}

impl ChainRegistry {
    /// Connect to every network of the settings
    pub async fn from_settings(settings: &Settings) -> Result<Self> {
        let mut registry = Self::default();
        for (network, conf) in &settings.networks {
            let chain = EthereumRelayerChain::from_conf(network, conf).await?;
            registry.insert(network, Arc::new(chain), conf.clone());
        }
        Ok(registry)
    }

    pub fn insert(&mut self, network: &str, chain: Arc<dyn RelayerChain>, conf: NetworkConf) {
        self.networks.insert(
            network.to_owned(),
            NetworkContext {
                chain,
                conf: Arc::new(conf),
            },
        );
    }

    /// The network named `network`, or `ChainNotSupported`
    pub fn get(&self, network: &str) -> RelayerResult<&NetworkContext> {
        self.networks
            .get(network)
            .ok_or_else(|| RelayerError::ChainNotSupported(network.to_owned()))
    }

    pub fn chain(&self, network: &str) -> RelayerResult<&Arc<dyn RelayerChain>> {
        self.get(network).map(|context| &context.chain)
    }

    pub fn networks(&self) -> impl Iterator<Item = &str> {
        self.networks.keys().map(String::as_str)
    }
}
