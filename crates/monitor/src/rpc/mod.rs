use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use coin_monitor_domain::BlockNumberError;
use reqwest::{Client, Url};
use serde_json::Value;
use thiserror::Error;

mod eth;
mod types;

pub use eth::EthRpcClient;
pub use types::{JsonRpcErrorObject, JsonRpcRequest, JsonRpcResponse};

/// Generic call primitive every chain adapter is built on.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError>;
}

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("invalid node url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("unsupported scheme `{scheme}` in node url `{url}`")]
    UnsupportedScheme { url: String, scheme: String },
    #[error("failed to build http client: {0}")]
    Client(String),
}

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("`{method}` transport failure: {reason}")]
    Transport { method: String, reason: String },
    #[error("`{method}` returned http status {status}")]
    Status { method: String, status: u16 },
    #[error("`{method}` failed on node ({code}): {message}")]
    Node {
        method: String,
        code: i64,
        message: String,
    },
    #[error("`{method}` returned an undecodable response: {reason}")]
    Decode { method: String, reason: String },
}

/// Failure of a typed node query: either the call itself failed or the node
/// answered with a height that is not an integer.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("rpc error: {0}")]
    Rpc(#[from] RpcError),
    #[error("parse error: {0}")]
    Parse(#[from] BlockNumberError),
}

/// Knobs for the transport layer. The request timeout is the only bound on
/// how long a single monitor operation may wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportOptions {
    pub timeout: Duration,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

/// JSON-RPC 2.0 over HTTP POST.
pub struct HttpTransport {
    client: Client,
    url: Url,
    next_id: AtomicU64,
}

impl HttpTransport {
    pub fn connect(url: &str, options: &TransportOptions) -> Result<Self, ConnectionError> {
        let parsed = Url::parse(url).map_err(|err| ConnectionError::InvalidUrl {
            url: url.to_string(),
            reason: err.to_string(),
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConnectionError::UnsupportedScheme {
                url: url.to_string(),
                scheme: parsed.scheme().to_string(),
            });
        }

        let client = Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|err| ConnectionError::Client(err.to_string()))?;

        Ok(Self {
            client,
            url: parsed,
            next_id: AtomicU64::new(1),
        })
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self
            .client
            .post(self.url.clone())
            .json(&request)
            .send()
            .await
            .map_err(|err| RpcError::Transport {
                method: method.to_string(),
                reason: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::Status {
                method: method.to_string(),
                status: status.as_u16(),
            });
        }

        let body: JsonRpcResponse = response.json().await.map_err(|err| RpcError::Decode {
            method: method.to_string(),
            reason: err.to_string(),
        })?;

        match body {
            JsonRpcResponse {
                error: Some(error), ..
            } => Err(RpcError::Node {
                method: method.to_string(),
                code: error.code,
                message: error.message,
            }),
            JsonRpcResponse {
                result: Some(result),
                ..
            } => Ok(result),
            _ => Err(RpcError::Decode {
                method: method.to_string(),
                reason: "response carries neither result nor error".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        matchers::{body_partial_json, method},
        Mock, MockServer, ResponseTemplate,
    };

    fn transport(server: &MockServer) -> HttpTransport {
        HttpTransport::connect(&server.uri(), &TransportOptions::default())
            .expect("transport builds")
    }

    #[test]
    fn rejects_malformed_and_foreign_urls() {
        let options = TransportOptions::default();
        assert!(matches!(
            HttpTransport::connect("not a url", &options),
            Err(ConnectionError::InvalidUrl { .. })
        ));
        assert!(matches!(
            HttpTransport::connect("ftp://node:21", &options),
            Err(ConnectionError::UnsupportedScheme { scheme, .. }) if scheme == "ftp"
        ));
        assert!(HttpTransport::connect("https://node.example:8545", &options).is_ok());
    }

    #[tokio::test]
    async fn posts_json_rpc_envelope_and_returns_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "jsonrpc": "2.0",
                "method": "eth_blockNumber",
                "params": [],
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": "0x10"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let result = transport(&server)
            .call("eth_blockNumber", json!([]))
            .await
            .expect("call succeeds");

        assert_eq!(result, json!("0x10"));
    }

    #[tokio::test]
    async fn node_error_object_becomes_rpc_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": {"code": -32601, "message": "the method net_listening does not exist"},
            })))
            .mount(&server)
            .await;

        let err = transport(&server)
            .call("net_listening", json!([]))
            .await
            .unwrap_err();

        assert!(matches!(err, RpcError::Node { code: -32601, .. }));
    }

    #[tokio::test]
    async fn http_failure_status_becomes_rpc_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = transport(&server)
            .call("eth_syncing", json!([]))
            .await
            .unwrap_err();

        assert!(matches!(err, RpcError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn non_json_rpc_body_becomes_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let err = transport(&server)
            .call("eth_blockNumber", json!([]))
            .await
            .unwrap_err();

        assert!(matches!(err, RpcError::Decode { .. }));
    }

    #[tokio::test]
    async fn unreachable_node_becomes_transport_error() {
        let transport = HttpTransport::connect("http://127.0.0.1:1", &TransportOptions::default())
            .expect("construction does not dial");
        let err = transport
            .call("eth_blockNumber", json!([]))
            .await
            .unwrap_err();

        assert!(matches!(err, RpcError::Transport { .. }));
    }
}
