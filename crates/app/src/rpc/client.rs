//! JSON-RPC 2.0 client over HTTP.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use mockall::automock;
use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;
use tracing::trace;

/// Error object returned by the node.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,

    #[serde(default)]
    pub data: Option<Value>,
}

/// Errors that can occur when calling the node.
#[derive(Debug, Error)]
pub enum RpcError {
    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The node answered with a JSON-RPC error object.
    #[error("rpc error {}: {}", .0.code, .0.message)]
    Node(RpcErrorObject),

    /// The node returned a non-2xx response or an unexpected body.
    #[error("unexpected response from node: {0}")]
    UnexpectedResponse(String),
}

#[derive(Debug, Serialize)]
struct Request<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    result: Option<Value>,

    #[serde(default)]
    error: Option<RpcErrorObject>,
}

/// Sends JSON-RPC requests and returns the raw `result`.
#[automock]
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Call `method` with `params`.
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError>;
}

impl dyn RpcTransport {
    /// Call `method` and deserialize its result. A `null` result deserializes as `T` would.
    ///
    /// # Errors
    ///
    /// Returns an error on HTTP failure, a JSON-RPC error object or an unexpected body.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, RpcError> {
        let result = self.request(method, params).await?;

        serde_json::from_value(result).map_err(|error| {
            RpcError::UnexpectedResponse(format!("{method} returned an unexpected result: {error}"))
        })
    }
}

#[derive(Debug)]
pub struct RpcClient {
    url: String,
    http: Client,
    next_id: AtomicU64,
}

impl RpcClient {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http: Client::new(),
            next_id: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl RpcTransport for RpcClient {
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        trace!(id, method, %params, "rpc request");

        let response = self
            .http
            .post(&self.url)
            .json(&Request {
                jsonrpc: "2.0",
                id,
                method,
                params,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(RpcError::UnexpectedResponse(format!(
                "{method} failed with status {status}: {text}"
            )));
        }

        let parsed: Response = response.json().await?;

        if let Some(error) = parsed.error {
            return Err(RpcError::Node(error));
        }

        Ok(parsed.result.unwrap_or(Value::Null))
    }
}
