pub use authorisation::*;
pub use deployment::*;
pub use item::*;
pub use message::*;
pub use packed::PackedEncoder;
pub use queue::*;
pub use tx::*;

mod authorisation;
mod deployment;
mod item;
mod message;
mod packed;
mod queue;
/// Serde helpers for wire integers
pub mod serialize;
mod tx;
