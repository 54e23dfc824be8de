//! Minimal simulation of the Ergo UTXO set, used to replay transaction chains in tests.

mod block;
mod chain;

pub use block::Block;
pub use chain::ChainSim;
pub use chain::ChainSimError;
