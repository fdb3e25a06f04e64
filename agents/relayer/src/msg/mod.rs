//! Signature collection and execution of messages and deployments.
//!
//! [`pending_messages::PendingMessages`] collects signatures until a wallet's
//! threshold is met and then stages the message in the
//! [`queue::ExecutionQueue`]. The single [`worker::ExecutionWorker`] drains the
//! queue oldest first, handing every item to the first
//! [`executor::Executor`] accepting it. Executors validate, submit, wait for
//! the transaction to be mined and record the outcome on the row; the queue
//! entry is removed afterwards whatever the outcome.

pub mod executor;
pub mod hooks;
pub mod pending_messages;
pub mod queue;
pub mod status;
pub mod validators;
pub mod worker;
