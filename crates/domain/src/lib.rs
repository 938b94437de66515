//! Domain-level building blocks shared by the monitor core and its binary:
//! node identity and selectors, block-number parsing, environment
//! configuration, and telemetry wiring.

pub mod config;
pub mod model;
pub mod services;

pub use model::{
    parse_block_number, BlockNumberError, CoinKind, NetworkType, NodeEndpoint, SyncStatus,
};
