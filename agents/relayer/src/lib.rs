//! The relayer collects owner signatures of meta-transactions for
//! counterfactual smart-contract wallets and submits them, together with
//! wallet deployments, to every configured network.

#![forbid(unsafe_code)]

pub mod authorisation;
pub mod chains;
pub mod deployment;
pub mod msg;
mod relayer;
pub mod server;

#[cfg(test)]
mod test_utils;

pub use relayer::*;
