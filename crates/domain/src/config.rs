//! Environment-driven configuration for the monitor binary.

use std::{env, time::Duration};

use thiserror::Error;

use crate::model::{CoinKind, NetworkType, NodeEndpoint};

const DEFAULT_POLL_INTERVAL_SECS: u64 = 15;
const DEFAULT_RPC_TIMEOUT_SECS: u64 = 10;

/// Node identity plus scheduling knobs, loaded from `.env`/process variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    coin: CoinKind,
    endpoint: NodeEndpoint,
    poll_interval: Duration,
    rpc_timeout: Duration,
}

impl MonitorConfig {
    /// Loads configuration by hydrating `.env` (if present) and reading the
    /// process variables. Missing or malformed entries surface as
    /// `ConfigError`.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        hydrate_env_file()?;

        let url = get_required_var("NODE_RPC_URL")?;
        let coin = parse_selector("NODE_COIN", CoinKind::Eth)?;
        let network = parse_selector("NODE_NETWORK", NetworkType::default())?;
        let poll_interval = get_seconds("MONITOR_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)?;
        let rpc_timeout = get_seconds("MONITOR_RPC_TIMEOUT_SECS", DEFAULT_RPC_TIMEOUT_SECS)?;

        Ok(Self {
            coin,
            endpoint: NodeEndpoint::new(url, network),
            poll_interval,
            rpc_timeout,
        })
    }

    pub fn coin(&self) -> CoinKind {
        self.coin
    }

    pub fn endpoint(&self) -> &NodeEndpoint {
        &self.endpoint
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn rpc_timeout(&self) -> Duration {
        self.rpc_timeout
    }
}

fn get_required_var(key: &'static str) -> Result<String, ConfigError> {
    get_optional_var(key).ok_or(ConfigError::MissingVar { key })
}

fn get_optional_var(key: &'static str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn parse_selector<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match get_optional_var(key) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        None => Ok(default),
    }
}

fn get_seconds(key: &'static str, default: u64) -> Result<Duration, ConfigError> {
    let seconds = match get_optional_var(key) {
        Some(value) => value
            .parse::<u64>()
            .map_err(|source| ConfigError::InvalidNumber { key, source })?,
        None => default,
    };

    if seconds == 0 {
        return Err(ConfigError::InvalidValue {
            key,
            value: "0".to_string(),
        });
    }

    Ok(Duration::from_secs(seconds))
}

pub fn hydrate_env_file() -> Result<(), ConfigError> {
    if env::var_os("COIN_MONITOR_SKIP_DOTENV").is_some() {
        return Ok(());
    }
    match dotenvy::dotenv() {
        Ok(_) => {}
        Err(dotenvy::Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(ConfigError::Dotenv { source: err }),
    }

    Ok(())
}

/// Errors emitted when `.env` hydration or environment parsing fails.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable `{key}`")]
    MissingVar { key: &'static str },
    #[error("invalid integer in `{key}`: {source}")]
    InvalidNumber {
        key: &'static str,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("unsupported value `{value}` in `{key}`")]
    InvalidValue { key: &'static str, value: String },
    #[error("failed to load .env file: {source}")]
    Dotenv {
        #[from]
        source: dotenvy::Error,
    },
}
