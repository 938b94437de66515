use std::time::Duration;

use metrics::{counter, gauge, Gauge};
use thiserror::Error;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use coin_monitor_domain::{
    config::{ConfigError, MonitorConfig},
    services::telemetry::{
        TelemetryError, BLOCK_COUNT_GAUGE, BLOCK_DIFFERENCE_GAUGE, MONITOR_TICKS_COUNTER,
        NODE_STATUS_GAUGE,
    },
    CoinKind, NetworkType,
};

use crate::{
    coin::{connect_monitor, CoinMonitor, GaugeSink},
    rpc::{ConnectionError, NodeError, TransportOptions},
};

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("node error: {0}")]
    Node(#[from] NodeError),
}

/// The three per-node gauges a tick writes to.
pub struct NodeGauges<G = Gauge> {
    pub block_count: G,
    pub status: G,
    pub difference: G,
}

impl NodeGauges<Gauge> {
    /// Registers the node gauges on the global recorder, labelled by coin and
    /// network.
    pub fn register(coin: CoinKind, network: NetworkType) -> Self {
        let coin = coin.to_string();
        let network = network.to_string();
        Self {
            block_count: gauge!(
                BLOCK_COUNT_GAUGE,
                "coin" => coin.clone(),
                "network" => network.clone()
            ),
            status: gauge!(
                NODE_STATUS_GAUGE,
                "coin" => coin.clone(),
                "network" => network.clone()
            ),
            difference: gauge!(
                BLOCK_DIFFERENCE_GAUGE,
                "coin" => coin,
                "network" => network
            ),
        }
    }
}

/// Runs every monitor operation once, stopping at the first error.
pub async fn run_tick<G>(
    monitor: &dyn CoinMonitor,
    gauges: &NodeGauges<G>,
) -> Result<(), MonitorError>
where
    G: GaugeSink,
{
    let result = tick_operations(monitor, gauges).await;
    let outcome = if result.is_ok() { "ok" } else { "error" };
    counter!(MONITOR_TICKS_COUNTER, "result" => outcome).increment(1);
    result.map_err(MonitorError::from)
}

async fn tick_operations<G>(
    monitor: &dyn CoinMonitor,
    gauges: &NodeGauges<G>,
) -> Result<(), NodeError>
where
    G: GaugeSink,
{
    monitor.ping().await?;
    monitor.monitor_count(&gauges.block_count).await?;
    monitor.monitor_status(&gauges.status).await?;
    monitor.monitor_differences(&gauges.difference).await
}

/// Ticks `monitor` every `poll_interval` until an operation fails. Late
/// ticks are delayed rather than bursted to catch up.
pub async fn run_monitor<G>(
    monitor: &dyn CoinMonitor,
    gauges: &NodeGauges<G>,
    poll_interval: Duration,
) -> Result<(), MonitorError>
where
    G: GaugeSink,
{
    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if let Err(err) = run_tick(monitor, gauges).await {
            error!(
                coin = %monitor.coin(),
                network = %monitor.network(),
                error = %err,
                "monitor tick failed"
            );
            return Err(err);
        }
    }
}

/// Connects the configured node and polls it until a fatal error.
pub async fn run_from_config(config: &MonitorConfig) -> Result<(), MonitorError> {
    let options = TransportOptions {
        timeout: config.rpc_timeout(),
    };
    let monitor = connect_monitor(config.coin(), config.endpoint(), &options)?;
    let gauges = NodeGauges::register(monitor.coin(), monitor.network());

    info!(
        interval_secs = config.poll_interval().as_secs(),
        "starting node monitor"
    );
    run_monitor(monitor.as_ref(), &gauges, config.poll_interval()).await
}
