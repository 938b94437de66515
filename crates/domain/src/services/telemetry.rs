use std::{env, net::SocketAddr};

use metrics::{describe_counter, describe_gauge, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::hydrate_env_file;

/// Latest block height the node reports.
pub const BLOCK_COUNT_GAUGE: &str = "coin_node_block_count";
/// 200 while the node listens for peers, 404 otherwise.
pub const NODE_STATUS_GAUGE: &str = "coin_node_status";
/// Network-highest minus current block height.
pub const BLOCK_DIFFERENCE_GAUGE: &str = "coin_node_block_difference";
/// Scheduler passes, labelled `result="ok"|"error"`.
pub const MONITOR_TICKS_COUNTER: &str = "coin_monitor_ticks_total";

static SUBSCRIBER_INSTALLED: OnceCell<()> = OnceCell::new();
static RECORDER_INSTALLED: OnceCell<()> = OnceCell::new();

/// Logging and scrape-listener options for the monitor binary.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    log_filter: String,
    metrics_address: Option<String>,
}

impl TelemetryConfig {
    /// Reads `<PREFIX>_LOG_FILTER` (default `info`) and the optional
    /// `<PREFIX>_METRICS_ADDRESS` scrape listener.
    pub fn from_env(prefix: &str) -> Self {
        let _ = hydrate_env_file();
        let upper = prefix.trim().to_ascii_uppercase();

        let log_filter = env::var(format!("{upper}_LOG_FILTER"))
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "info".to_string());
        let metrics_address = env::var(format!("{upper}_METRICS_ADDRESS"))
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        Self {
            log_filter,
            metrics_address,
        }
    }

    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    pub fn metrics_address(&self) -> Option<&str> {
        self.metrics_address.as_deref()
    }

    fn metrics_socket(&self) -> Result<Option<SocketAddr>, TelemetryError> {
        self.metrics_address
            .as_deref()
            .map(|addr| {
                addr.parse().map_err(|err: std::net::AddrParseError| {
                    TelemetryError::InvalidMetricsAddress(addr.to_string(), err.to_string())
                })
            })
            .transpose()
    }
}

/// Installs the tracing subscriber and the Prometheus recorder once per
/// process, then describes the node gauges. With a metrics address the
/// exporter's HTTP listener is started as well; that path must run inside a
/// Tokio runtime.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    install_tracing(config)?;
    install_metrics(config)?;
    describe_monitor_metrics();
    Ok(())
}

/// Registers units and help text for every metric the monitor writes on the
/// currently active recorder.
pub fn describe_monitor_metrics() {
    describe_gauge!(
        BLOCK_COUNT_GAUGE,
        Unit::Count,
        "Current block height reported by the node"
    );
    describe_gauge!(
        NODE_STATUS_GAUGE,
        "Peer listening status of the node (200 listening, 404 not listening)"
    );
    describe_gauge!(
        BLOCK_DIFFERENCE_GAUGE,
        Unit::Count,
        "Highest known block minus the node's current block"
    );
    describe_counter!(
        MONITOR_TICKS_COUNTER,
        Unit::Count,
        "Monitor polling passes by outcome"
    );
}

fn install_tracing(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    if SUBSCRIBER_INSTALLED.get().is_some() {
        return Ok(());
    }

    let env_filter = EnvFilter::try_new(config.log_filter())
        .map_err(|err| TelemetryError::InvalidLogFilter(err.to_string()))?;

    if SUBSCRIBER_INSTALLED.set(()).is_ok() {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()
            .map_err(|err| TelemetryError::Tracing(err.to_string()))?;
    }

    Ok(())
}

fn install_metrics(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    RECORDER_INSTALLED
        .get_or_try_init(|| {
            let builder = PrometheusBuilder::new();
            match config.metrics_socket()? {
                Some(socket) => {
                    builder
                        .with_http_listener(socket)
                        .install()
                        .map_err(|err| TelemetryError::Metrics(err.to_string()))?;
                    info!(%socket, "prometheus scrape listener started");
                }
                None => {
                    builder
                        .install_recorder()
                        .map_err(|err| TelemetryError::Metrics(err.to_string()))?;
                }
            }
            Ok(())
        })
        .map(|_| ())
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log filter: {0}")]
    InvalidLogFilter(String),
    #[error("failed to install tracing subscriber: {0}")]
    Tracing(String),
    #[error("invalid metrics address `{0}`: {1}")]
    InvalidMetricsAddress(String, String),
    #[error("failed to install metrics recorder: {0}")]
    Metrics(String),
}
