//! Checks run before the relayer spends gas on a message or deployment.
//! Every validator reads current on-chain state; nothing is cached.

use std::fmt::Debug;

use async_trait::async_trait;
use relayer_core::{
    recover_signer, Deployment, RelayerError, RelayerResult, UnsignedMessage, H160, U256,
};
use tracing::debug;

use crate::chains::NetworkContext;

/// Lowest `gasLimitExecution` accepted when the network does not override it
pub const DEFAULT_MIN_GAS_LIMIT_EXECUTION: u64 = 30_000;

#[async_trait]
pub trait MessageValidator: Send + Sync + Debug {
    async fn validate(&self, message: &UnsignedMessage, network: &NetworkContext)
        -> RelayerResult<()>;
}

#[async_trait]
pub trait DeploymentValidator: Send + Sync + Debug {
    async fn validate(&self, deployment: &Deployment, network: &NetworkContext)
        -> RelayerResult<()>;
}

/// Validators every message goes through before submission, cheapest first
pub fn message_validators() -> Vec<Box<dyn MessageValidator>> {
    vec![
        Box::new(GasValidator),
        Box::new(ProxyValidator),
        Box::new(TokenBalanceValidator),
        Box::new(RelayerFundsValidator),
    ]
}

/// Validators every deployment goes through, on request and again before
/// submission
pub fn deployment_validators() -> Vec<Box<dyn DeploymentValidator>> {
    vec![
        Box::new(DeploymentSignatureValidator),
        Box::new(EnsDomainValidator),
        Box::new(DeploymentFundsValidator),
    ]
}

/// The wallet's bytecode must be a whitelisted proxy
#[derive(Debug, Clone, Copy, Default)]
pub struct ProxyValidator;

#[async_trait]
impl MessageValidator for ProxyValidator {
    async fn validate(
        &self,
        message: &UnsignedMessage,
        network: &NetworkContext,
    ) -> RelayerResult<()> {
        let code_hash = network.chain.code_hash(message.from).await?;
        if network.conf.contract_whitelist.proxy.contains(&code_hash) {
            Ok(())
        } else {
            debug!(?code_hash, wallet = ?message.from, "Bytecode not whitelisted");
            Err(RelayerError::InvalidProxy)
        }
    }
}

/// The wallet must hold `gasPrice * gasLimit` of its gas token
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenBalanceValidator;

#[async_trait]
impl MessageValidator for TokenBalanceValidator {
    async fn validate(
        &self,
        message: &UnsignedMessage,
        network: &NetworkContext,
    ) -> RelayerResult<()> {
        let balance = network
            .chain
            .balance_of(message.gas_token, message.from)
            .await?;
        if balance < message.max_gas_cost() {
            return Err(RelayerError::NotEnoughToken);
        }
        Ok(())
    }
}

/// `gasLimitExecution` must cover the inner call stipend and fit in `gasLimit`
#[derive(Debug, Clone, Copy, Default)]
pub struct GasValidator;

#[async_trait]
impl MessageValidator for GasValidator {
    async fn validate(
        &self,
        message: &UnsignedMessage,
        network: &NetworkContext,
    ) -> RelayerResult<()> {
        let minimum = network
            .conf
            .min_gas_limit_execution
            .unwrap_or_else(|| U256::from(DEFAULT_MIN_GAS_LIMIT_EXECUTION));
        if message.gas_limit_execution < minimum {
            return Err(RelayerError::InsufficientGas {
                field: "gasLimitExecution",
                minimum,
            });
        }
        if message.gas_limit < message.gas_limit_execution {
            return Err(RelayerError::InsufficientGas {
                field: "gasLimit",
                minimum: message.gas_limit_execution,
            });
        }
        Ok(())
    }
}

/// The relayer itself must be able to pay `gasPrice * gasLimit` in native coin
#[derive(Debug, Clone, Copy, Default)]
pub struct RelayerFundsValidator;

#[async_trait]
impl MessageValidator for RelayerFundsValidator {
    async fn validate(
        &self,
        message: &UnsignedMessage,
        network: &NetworkContext,
    ) -> RelayerResult<()> {
        let relayer = network.chain.relayer_address();
        let balance = network.chain.balance_of(H160::zero(), relayer).await?;
        if balance < message.max_gas_cost() {
            return Err(RelayerError::RelayerUnderfunded);
        }
        Ok(())
    }
}

/// The deployment must be signed by its initial owner key
#[derive(Debug, Clone, Copy, Default)]
pub struct DeploymentSignatureValidator;

#[async_trait]
impl DeploymentValidator for DeploymentSignatureValidator {
    async fn validate(&self, deployment: &Deployment, _: &NetworkContext) -> RelayerResult<()> {
        if recover_signer(deployment.hash, &deployment.signature)? != deployment.public_key {
            return Err(RelayerError::InvalidSignature);
        }
        Ok(())
    }
}

/// The ENS name must be a label under a configured registrar domain
#[derive(Debug, Clone, Copy, Default)]
pub struct EnsDomainValidator;

#[async_trait]
impl DeploymentValidator for EnsDomainValidator {
    async fn validate(
        &self,
        deployment: &Deployment,
        network: &NetworkContext,
    ) -> RelayerResult<()> {
        match deployment.ens_parts() {
            Some((_, domain)) if network.conf.is_ens_registrar(domain) => Ok(()),
            _ => Err(RelayerError::InvalidEnsDomain(deployment.ens_name.clone())),
        }
    }
}

/// The counterfactual address must be funded with at least the minimal
/// amount of one supported token
#[derive(Debug, Clone, Copy, Default)]
pub struct DeploymentFundsValidator;

#[async_trait]
impl DeploymentValidator for DeploymentFundsValidator {
    async fn validate(
        &self,
        deployment: &Deployment,
        network: &NetworkContext,
    ) -> RelayerResult<()> {
        for token in &network.conf.supported_tokens {
            let balance = network
                .chain
                .balance_of(token.address, deployment.wallet_address)
                .await?;
            if balance >= token.minimal_amount {
                return Ok(());
            }
        }
        Err(RelayerError::NotEnoughToken)
    }
}
