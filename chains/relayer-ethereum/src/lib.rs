//! Ethereum implementation of the relayer's chain accessor

#![forbid(unsafe_code)]

pub use provider::*;

/// Generated contract bindings
pub mod contracts;
mod provider;
