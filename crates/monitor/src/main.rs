//! Monitor binary that polls one blockchain node and republishes its health
//! as Prometheus gauges.

use std::io;

use coin_monitor::{run_from_config, MonitorError};
use coin_monitor_domain::config::MonitorConfig;
use coin_monitor_domain::services::telemetry::{init_telemetry, TelemetryConfig};

#[tokio::main]
async fn main() -> io::Result<()> {
    if let Err(err) = bootstrap().await {
        eprintln!("[monitor] stopped: {err}");
        return Err(io::Error::other(err.to_string()));
    }

    Ok(())
}

async fn bootstrap() -> Result<(), MonitorError> {
    let config = MonitorConfig::load_from_env()?;
    let telemetry_config = TelemetryConfig::from_env("MONITOR");
    init_telemetry(&telemetry_config)?;
    run_from_config(&config).await
}
