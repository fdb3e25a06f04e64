use std::error::Error as StdError;

use ethers_core::types::{SignatureError, H256, U256};

/// The result of interacting with a chain.
pub type ChainResult<T> = Result<T, ChainCommunicationError>;

/// The result of any relayer operation.
pub type RelayerResult<T> = Result<T, RelayerError>;

/// A boxed error coming from a collaborator this crate does not know about.
pub type BoxedError = Box<dyn StdError + Send + Sync + 'static>;

/// ChainCommunicationError contains errors returned when attempting to
/// call a chain or dispatch a transaction
#[derive(Debug, thiserror::Error)]
pub enum ChainCommunicationError {
    /// An error with a contract call
    #[error("Contract error: {0}")]
    ContractError(#[source] BoxedError),
    /// Provider Error
    #[error("Provider error: {0}")]
    ProviderError(#[source] BoxedError),
    /// A transaction was dropped from the mempool
    #[error("Transaction dropped from mempool {0:?}")]
    TransactionDropped(H256),
    /// Any other error; does not implement `From` to prevent
    /// conflicting/absorbing other errors.
    #[error("{0}")]
    Other(#[source] BoxedError),
}

impl ChainCommunicationError {
    /// Create a chain communication error from a contract call failure
    pub fn from_contract_error<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::ContractError(Box::new(err))
    }

    /// Create a chain communication error from a provider failure
    pub fn from_provider_error<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::ProviderError(Box::new(err))
    }

    /// Create a chain communication error from any other existing error
    pub fn from_other<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::Other(Box::new(err))
    }

    /// Creates a chain communication error of the other error variant from a string
    pub fn from_other_str(err: &str) -> Self {
        Self::Other(err.to_owned().into())
    }
}

/// Every failure the relayer reports, either synchronously to API callers or
/// persisted onto a message/deployment row once execution has failed.
#[derive(Debug, thiserror::Error, strum::IntoStaticStr)]
pub enum RelayerError {
    /// The exact signature was already collected for this message
    #[error("Signature already collected")]
    DuplicatedSignature,
    /// The signer is not an authorised key of the wallet, or the signature is malformed
    #[error("Invalid signature")]
    InvalidSignature,
    /// The message already has a transaction hash
    #[error("Message already executed")]
    DuplicatedExecution,
    /// Execution requested before the wallet's signature threshold was met
    #[error("Not enough signatures, required {required}, got only {total_collected}")]
    NotEnoughSignatures {
        /// On-chain threshold
        required: u64,
        /// Distinct valid signatures collected so far
        total_collected: u64,
    },
    /// No message row for the given hash
    #[error("Message not found")]
    MessageNotFound,
    /// Generic repository lookup miss
    #[error("Could not find {0}")]
    NotFound(String),
    /// The `from` contract's bytecode is not whitelisted
    #[error("Invalid proxy")]
    InvalidProxy,
    /// The wallet cannot cover the gas it promised to refund
    #[error("Not enough tokens")]
    NotEnoughToken,
    /// A gas field of the message is below what execution needs
    #[error("Insufficient gas. {field} should be at least {minimum}")]
    InsufficientGas {
        /// Message field that is too low, e.g. `gasLimitExecution`
        field: &'static str,
        /// Lowest accepted value
        minimum: U256,
    },
    /// The network is not configured
    #[error("Chain {0} is not supported")]
    ChainNotSupported(String),
    /// The chain client returned no transaction hash for a submission
    #[error("Transaction hash not found")]
    TransactionHashNotFound,
    /// The transaction was mined with a failed status
    #[error("Transaction {0:?} reverted")]
    TransactionReverted(H256),
    /// The relayer's own account cannot pay for the transaction
    #[error("Relayer does not have enough funds to pay for gas")]
    RelayerUnderfunded,
    /// The requested ENS name is not under a configured registrar
    #[error("ENS domain {0} is not supported")]
    InvalidEnsDomain(String),
    /// Storage failure
    #[error("Database error: {0}")]
    Database(#[source] BoxedError),
    /// Chain failure
    #[error("Chain communication error: {0}")]
    Chain(#[from] ChainCommunicationError),
}

impl RelayerError {
    /// Name of the error kind, e.g. `NotEnoughToken`
    pub fn kind(&self) -> &'static str {
        self.into()
    }

    /// The string persisted on a row when execution fails, formatted as
    /// `<ErrorKind>: <message>`
    pub fn persisted_message(&self) -> String {
        format!("{}: {}", self.kind(), self)
    }

    /// Whether this error means the requested entity does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::MessageNotFound | Self::NotFound(_))
    }
}

impl From<SignatureError> for RelayerError {
    fn from(_: SignatureError) -> Self {
        Self::InvalidSignature
    }
}
