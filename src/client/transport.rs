//! JSON-RPC client over a Unix socket

use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::net::UnixStream;
use tracing::debug;
use uuid::Uuid;

use crate::jsonrpc::transport::lsp_format;
use crate::jsonrpc::{JsonRpcRequest, JsonRpcResponse, LIST_FUNCTIONS, SUBMIT_FUNCTION};
use crate::functions::FunctionDefinition;
use crate::models::{ActionEvent, ActionStatus, FunctionEvent, FunctionResult};

const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// JSON-RPC client for a running soar-actions service
///
/// Opens one connection per call, using the same Content-Length framing as the
/// server.
pub struct JsonRpcClient {
    socket_path: String,
    timeout: Duration,
}

impl JsonRpcClient {
    pub fn new(socket_path: impl Into<String>) -> Self {
        Self {
            socket_path: socket_path.into(),
            timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn socket_path(&self) -> &str {
        &self.socket_path
    }

    /// Check that something is listening on the socket
    pub async fn validate_connection(&self) -> bool {
        Path::new(&self.socket_path).exists() && UnixStream::connect(&self.socket_path).await.is_ok()
    }

    /// Send one request and wait for its response. Server-side errors come back
    /// as a [`crate::jsonrpc::JsonRpcError`] inside the returned error.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        tokio::time::timeout(self.timeout, self.exchange(method, params))
            .await
            .map_err(|_| anyhow!("No response to {} within {:?}", method, self.timeout))?
    }

    async fn exchange(&self, method: &str, params: Value) -> Result<Value> {
        let request_id = Uuid::new_v4().to_string();
        let request = JsonRpcRequest::new(method, Some(params), Some(Value::String(request_id.clone())));

        let stream = UnixStream::connect(&self.socket_path)
            .await
            .with_context(|| format!("Failed to connect to socket {}", self.socket_path))?;
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        let request_json = serde_json::to_string(&request)?;
        debug!("Sending request: {}", request_json);
        lsp_format::write_message(&mut write_half, &request_json).await?;

        loop {
            let message = lsp_format::read_message(&mut reader).await?;
            let msg: Value = serde_json::from_str(&message)
                .map_err(|e| anyhow!("Failed to parse message JSON: {}", e))?;

            // Skip anything that is not a response to us
            if msg.get("method").is_some() {
                debug!("Ignoring server notification: {}", message);
                continue;
            }

            let response: JsonRpcResponse = serde_json::from_value(msg)
                .map_err(|e| anyhow!("Failed to parse response: {}", e))?;

            let response_id = response.id.as_ref().and_then(|v| v.as_str()).unwrap_or("");
            if response_id != request_id {
                return Err(anyhow!("Response ID mismatch: expected {}, got {}", request_id, response_id));
            }

            if let Some(error) = response.error {
                return Err(error.into());
            }

            return response.result.ok_or_else(|| anyhow!("Response missing both result and error"));
        }
    }

    async fn call_typed<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let result = self.call(method, params).await?;
        serde_json::from_value(result).with_context(|| format!("Unexpected result shape from {}", method))
    }

    /// Fire an action event on `channel`, e.g. `actions.addgroup`
    pub async fn fire_action(&self, channel: &str, event: &ActionEvent) -> Result<ActionStatus> {
        self.call_typed(channel, serde_json::to_value(event)?).await
    }

    pub async fn submit_function(&self, event: &FunctionEvent) -> Result<FunctionResult> {
        self.call_typed(SUBMIT_FUNCTION, serde_json::to_value(event)?).await
    }

    pub async fn function_definitions(&self) -> Result<Vec<FunctionDefinition>> {
        self.call_typed(LIST_FUNCTIONS, Value::Null).await
    }
}
