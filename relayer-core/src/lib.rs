//! Core types and interfaces of the wallet relayer: messages and their
//! hashing, the queue and repository contracts, and the chain accessor
//! every network implements.

#![forbid(unsafe_code)]

pub use ethers_core::types::{Bytes, H160, H256, U256};

pub use error::*;
pub use traits::*;
pub use types::*;

mod error;
/// Traits for chains and storage
pub mod traits;
/// Domain types
pub mod types;

/// Mocks and deterministic signers for tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
