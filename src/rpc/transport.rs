use reqwest::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;

use crate::rpc::pool::Endpoint;

/// Longest upstream error body kept in a failure message.
const MAX_ERROR_BODY: usize = 256;

/// Failure of a single request against a single endpoint.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Request exceeded the per-call timeout.
    #[error("Request timeout")]
    Timeout,

    /// Failed to reach the endpoint at all.
    #[error("Connection failed: {0}")]
    Connect(String),

    /// Other network-level failure reported by the HTTP client.
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx HTTP status.
    #[error("HTTP error {0}: {1}")]
    Http(u16, String),

    /// JSON-RPC error object returned by the node.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Body could not be decoded as a JSON-RPC response or as the expected type.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The HTTP client itself could not be built.
    #[error("HTTP client setup failed: {0}")]
    Setup(String),
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: &'a Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    #[serde(default)]
    message: String,
}

/// JSON-RPC 2.0 over HTTP POST.
pub struct HttpTransport {
    client: Client,
    next_id: AtomicU64,
}

impl HttpTransport {
    /// Creates a transport whose requests are bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = ClientBuilder::new()
            .connect_timeout(timeout)
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("basewatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                tracing::error!(error = %e, "failed to build http client");
                TransportError::Setup(e.without_url().to_string())
            })?;

        Ok(Self {
            client,
            next_id: AtomicU64::new(1),
        })
    }

    /// Describes a reqwest failure without leaking the endpoint URL.
    fn map_reqwest_error(error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout
        } else if error.is_connect() {
            TransportError::Connect("connection refused or unreachable".to_string())
        } else if error.is_decode() || error.is_body() {
            TransportError::InvalidResponse("response body error".to_string())
        } else {
            TransportError::Network(error.without_url().to_string())
        }
    }

    /// Sends one request and returns the raw `result` value (`Null` when absent).
    pub async fn send(
        &self,
        endpoint: &Endpoint,
        method: &str,
        params: &Value,
    ) -> Result<Value, TransportError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self
            .client
            .post(endpoint.as_str())
            .json(&request)
            .send()
            .await
            .map_err(Self::map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let mut text = response.text().await.unwrap_or_default();
            if text.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !text.is_char_boundary(cut) {
                    cut -= 1;
                }
                text.truncate(cut);
                text.push_str("... (truncated)");
            }
            return Err(TransportError::Http(status.as_u16(), text));
        }

        let body = response.bytes().await.map_err(Self::map_reqwest_error)?;
        let envelope: RpcResponse = serde_json::from_slice(&body)
            .map_err(|e| TransportError::InvalidResponse(format!("not a JSON-RPC response: {}", e)))?;

        if let Some(err) = envelope.error {
            return Err(TransportError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        Ok(envelope.result.unwrap_or(Value::Null))
    }
}
