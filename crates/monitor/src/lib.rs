//! Multi-coin node monitor: per-chain RPC adapters, the `CoinMonitor`
//! contract that turns node answers into gauge values, and the polling loop
//! that drives it.

pub mod coin;
pub mod rpc;
pub mod worker;

#[cfg(test)]
mod testing;

pub use coin::{connect_monitor, CoinMonitor, EthCoin, GaugeSink};
pub use rpc::{
    ConnectionError, EthRpcClient, HttpTransport, NodeError, RpcError, RpcTransport,
    TransportOptions,
};
pub use worker::{run_from_config, run_monitor, run_tick, MonitorError, NodeGauges};
