pub use chain::*;
pub use db::*;

mod chain;
mod db;
