use async_trait::async_trait;
use coin_monitor_domain::{CoinKind, NetworkType, NodeEndpoint};
use tracing::{debug, warn};

use super::{CoinMonitor, GaugeSink, STATUS_LISTENING, STATUS_NOT_LISTENING};
use crate::rpc::{
    ConnectionError, EthRpcClient, HttpTransport, NodeError, RpcTransport, TransportOptions,
};

/// Monitor for Ethereum-style JSON-RPC nodes.
pub struct EthCoin<T = HttpTransport> {
    client: EthRpcClient<T>,
    network: NetworkType,
}

impl EthCoin<HttpTransport> {
    pub fn connect(
        endpoint: &NodeEndpoint,
        options: &TransportOptions,
    ) -> Result<Self, ConnectionError> {
        let client = EthRpcClient::connect(endpoint, options)?;
        Ok(Self::with_client(client, endpoint.network()))
    }
}

impl<T> EthCoin<T>
where
    T: RpcTransport,
{
    // The network is kept for labelling only; Ethereum method names do not
    // differ between networks.
    pub fn with_client(client: EthRpcClient<T>, network: NetworkType) -> Self {
        Self { client, network }
    }
}

#[async_trait]
impl<T> CoinMonitor for EthCoin<T>
where
    T: RpcTransport,
{
    fn coin(&self) -> CoinKind {
        CoinKind::Eth
    }

    fn network(&self) -> NetworkType {
        self.network
    }

    async fn monitor_count(&self, gauge: &dyn GaugeSink) -> Result<(), NodeError> {
        let height = self.client.block_height().await?;
        debug!(height, network = %self.network, "eth block height");
        gauge.set(height as f64);
        Ok(())
    }

    async fn monitor_status(&self, gauge: &dyn GaugeSink) -> Result<(), NodeError> {
        let listening = self.client.listening().await?;
        let status = if listening {
            STATUS_LISTENING
        } else {
            STATUS_NOT_LISTENING
        };
        gauge.set(status);
        Ok(())
    }

    async fn monitor_differences(&self, gauge: &dyn GaugeSink) -> Result<(), NodeError> {
        let status = match self.client.sync_status().await {
            Ok(status) => status,
            Err(err) => {
                warn!(
                    error = %err,
                    network = %self.network,
                    "sync status query failed, leaving difference gauge unchanged"
                );
                return Ok(());
            }
        };

        let difference = status.difference()?;
        debug!(
            current = %status.current,
            highest = %status.highest,
            difference,
            "eth sync difference"
        );
        gauge.set(difference as f64);
        Ok(())
    }
}
