//! Chain-agnostic monitoring contract. Each supported chain family gets one
//! `CoinMonitor` implementation; the scheduler only ever sees the trait.

use async_trait::async_trait;
use coin_monitor_domain::{CoinKind, NetworkType, NodeEndpoint};
use tracing::info;

use crate::rpc::{ConnectionError, NodeError, TransportOptions};

mod eth;

pub use eth::EthCoin;

/// Status value written when the node reports it is listening for peers.
pub const STATUS_LISTENING: f64 = 200.0;
/// Status value written when it is not.
pub const STATUS_NOT_LISTENING: f64 = 404.0;

/// Write-only single-value metric sink.
pub trait GaugeSink: Send + Sync {
    fn set(&self, value: f64);
}

impl GaugeSink for metrics::Gauge {
    fn set(&self, value: f64) {
        metrics::Gauge::set(self, value);
    }
}

#[async_trait]
pub trait CoinMonitor: Send + Sync {
    fn coin(&self) -> CoinKind;

    fn network(&self) -> NetworkType;

    /// Writes the node's current block height. Any failure is returned.
    async fn monitor_count(&self, gauge: &dyn GaugeSink) -> Result<(), NodeError>;

    /// Writes [`STATUS_LISTENING`] or [`STATUS_NOT_LISTENING`]. Any failure
    /// is returned.
    async fn monitor_status(&self, gauge: &dyn GaugeSink) -> Result<(), NodeError>;

    /// Writes `highest - current`. A failed query is logged and leaves the
    /// gauge untouched; a height that cannot be parsed is returned.
    async fn monitor_differences(&self, gauge: &dyn GaugeSink) -> Result<(), NodeError>;

    /// Readiness of the monitor itself, not of the node.
    async fn ping(&self) -> Result<(), NodeError> {
        Ok(())
    }
}

/// Builds the monitor for `coin`, establishing its RPC client.
pub fn connect_monitor(
    coin: CoinKind,
    endpoint: &NodeEndpoint,
    options: &TransportOptions,
) -> Result<Box<dyn CoinMonitor>, ConnectionError> {
    let monitor: Box<dyn CoinMonitor> = match coin {
        CoinKind::Eth => Box::new(EthCoin::connect(endpoint, options)?),
    };

    info!(
        coin = %coin,
        network = %endpoint.network(),
        url = endpoint.url(),
        "connected coin monitor"
    );
    Ok(monitor)
}
