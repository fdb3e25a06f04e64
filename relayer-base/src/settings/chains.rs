use std::fmt::{Debug, Formatter};

use relayer_core::{H160, H256, U256};
use serde::Deserialize;
use url::Url;

/// A gas token accepted for refunds and deployment funding
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SupportedToken {
    /// Token contract; the zero address is the native coin
    pub address: H160,
    /// Balance a counterfactual wallet must hold in this token before the
    /// relayer deploys it
    #[serde(with = "relayer_core::types::serialize")]
    pub minimal_amount: U256,
}

/// Bytecode hashes the relayer accepts
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ContractWhitelist {
    /// Wallet implementation bytecode hashes
    #[serde(default)]
    pub wallet: Vec<H256>,
    /// Proxy bytecode hashes; messages are only relayed through these
    #[serde(default)]
    pub proxy: Vec<H256>,
}

/// Immutable configuration of one network
#[derive(Clone, Deserialize)]
pub struct NetworkConf {
    /// JSON-RPC endpoint
    pub rpc_url: Url,
    /// Chain id used to sign transactions; queried from the node when absent
    #[serde(default)]
    pub chain_id: Option<u64>,
    /// Hex encoded private key paying for every transaction on this network
    pub relayer_private_key: String,
    /// Wallet factory deploying counterfactual wallets
    pub factory_address: H160,
    /// Accepted gas tokens
    #[serde(default)]
    pub supported_tokens: Vec<SupportedToken>,
    /// Accepted bytecode
    #[serde(default)]
    pub contract_whitelist: ContractWhitelist,
    /// ENS domains wallets can be registered under, e.g. `mylogin.eth`
    #[serde(default)]
    pub ens_registrars: Vec<String>,
    /// Override of the minimum `gasLimitExecution` accepted for messages
    #[serde(default, with = "option_u256")]
    pub min_gas_limit_execution: Option<U256>,
}

impl Debug for NetworkConf {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkConf")
            .field("rpc_url", &self.rpc_url.as_str())
            .field("chain_id", &self.chain_id)
            .field("relayer_private_key", &"<redacted>")
            .field("factory_address", &self.factory_address)
            .field("supported_tokens", &self.supported_tokens)
            .field("contract_whitelist", &self.contract_whitelist)
            .field("ens_registrars", &self.ens_registrars)
            .field("min_gas_limit_execution", &self.min_gas_limit_execution)
            .finish()
    }
}

impl NetworkConf {
    /// The supported token at `address`, if any
    pub fn supported_token(&self, address: &H160) -> Option<&SupportedToken> {
        self.supported_tokens
            .iter()
            .find(|token| &token.address == address)
    }

    /// Whether `domain` is a configured ENS registrar domain
    pub fn is_ens_registrar(&self, domain: &str) -> bool {
        self.ens_registrars
            .iter()
            .any(|registrar| registrar.eq_ignore_ascii_case(domain))
    }
}

mod option_u256 {
    use relayer_core::U256;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    struct Wrapper(#[serde(with = "relayer_core::types::serialize")] U256);

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<U256>, D::Error> {
        Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|Wrapper(value)| value))
    }
}
