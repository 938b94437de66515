use coin_monitor_domain::{parse_block_number, NodeEndpoint, SyncStatus};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::{ConnectionError, HttpTransport, NodeError, RpcError, RpcTransport, TransportOptions};

const BLOCK_NUMBER: &str = "eth_blockNumber";
const SYNCING: &str = "eth_syncing";
const NET_LISTENING: &str = "net_listening";

/// Typed accessors over the Ethereum JSON-RPC namespace.
pub struct EthRpcClient<T = HttpTransport> {
    transport: T,
}

impl EthRpcClient<HttpTransport> {
    pub fn connect(
        endpoint: &NodeEndpoint,
        options: &TransportOptions,
    ) -> Result<Self, ConnectionError> {
        HttpTransport::connect(endpoint.url(), options).map(Self::with_transport)
    }
}

impl<T> EthRpcClient<T>
where
    T: RpcTransport,
{
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    /// `eth_blockNumber`, parsed with the decimal/`0x`-hex convention.
    pub async fn block_height(&self) -> Result<i64, NodeError> {
        let raw: String = self.call(BLOCK_NUMBER).await?;
        Ok(parse_block_number(&raw)?)
    }

    pub async fn listening(&self) -> Result<bool, RpcError> {
        self.call(NET_LISTENING).await
    }

    /// Heights are returned verbatim. A node that is not syncing answers
    /// `false`; its head is then reported as both current and highest.
    pub async fn sync_status(&self) -> Result<SyncStatus, RpcError> {
        let value = self.transport.call(SYNCING, json!([])).await?;
        if value == Value::Bool(false) {
            let head: String = self.call(BLOCK_NUMBER).await?;
            return Ok(SyncStatus::new(head.clone(), head));
        }
        decode(SYNCING, value)
    }

    async fn call<R>(&self, method: &'static str) -> Result<R, RpcError>
    where
        R: DeserializeOwned,
    {
        let value = self.transport.call(method, json!([])).await?;
        decode(method, value)
    }
}

fn decode<R>(method: &str, value: Value) -> Result<R, RpcError>
where
    R: DeserializeOwned,
{
    serde_json::from_value(value).map_err(|err| RpcError::Decode {
        method: method.to_string(),
        reason: err.to_string(),
    })
}
