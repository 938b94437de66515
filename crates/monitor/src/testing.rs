//! In-memory doubles shared by unit tests.

use std::{
    collections::{HashMap, VecDeque},
    io,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    coin::GaugeSink,
    rpc::{RpcError, RpcTransport},
};

/// Replays queued replies per method and records every call it receives.
/// A method with nothing queued fails with a transport error.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    replies: Arc<Mutex<HashMap<String, VecDeque<Result<Value, RpcError>>>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedTransport {
    pub fn reply(self, method: &str, value: Value) -> Self {
        self.push(method, Ok(value));
        self
    }

    pub fn fail(self, method: &str) -> Self {
        self.push(
            method,
            Err(RpcError::Transport {
                method: method.to_string(),
                reason: "connection refused".to_string(),
            }),
        );
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn push(&self, method: &str, reply: Result<Value, RpcError>) {
        self.replies
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default()
            .push_back(reply);
    }
}

#[async_trait]
impl RpcTransport for ScriptedTransport {
    async fn call(&self, method: &str, _params: Value) -> Result<Value, RpcError> {
        self.calls.lock().unwrap().push(method.to_string());
        self.replies
            .lock()
            .unwrap()
            .get_mut(method)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                Err(RpcError::Transport {
                    method: method.to_string(),
                    reason: "no scripted reply".to_string(),
                })
            })
    }
}

/// Gauge double that keeps every value written to it.
#[derive(Default)]
pub struct RecordingGauge {
    writes: Mutex<Vec<f64>>,
}

impl RecordingGauge {
    pub fn writes(&self) -> Vec<f64> {
        self.writes.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<f64> {
        self.writes.lock().unwrap().last().copied()
    }
}

impl GaugeSink for RecordingGauge {
    fn set(&self, value: f64) {
        self.writes.lock().unwrap().push(value);
    }
}

/// Captures formatted `tracing` output so tests can assert on log lines.
#[derive(Clone, Default)]
pub struct LogBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl LogBuffer {
    /// Routes events from the current thread into this buffer until the
    /// returned guard is dropped.
    pub fn capture(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
