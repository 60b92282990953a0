//! CLI commands for the hedging tool.

pub mod rebalance;

pub use rebalance::{run as run_rebalance, RebalanceArgs};
