// crates/auditproof-cli/src/rpc_client.rs
//
// Lightweight JSON-RPC client that POSTs to the auditproof-daemon endpoint.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Route the daemon serves its single JSON-RPC method under.
const RPC_PATH: &str = "auditproof.rpc.AuditProofService/Call";

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Could not reach daemon: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{message} (code {code})")]
    Rpc { code: u16, message: String },

    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Mirrors the server's JsonRpcRequest envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub method: String,
    pub params: serde_json::Value,
}

/// Mirrors the server's JsonRpcResponse envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub success: bool,
    #[serde(default)]
    pub code: u16,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
}

impl JsonRpcResponse {
    /// Unwrap the envelope into its typed result.
    pub fn into_result<T: DeserializeOwned>(self) -> Result<T, CliError> {
        if !self.success {
            return Err(CliError::Rpc {
                code: self.code,
                message: self.error.unwrap_or_else(|| "Unknown error".to_string()),
            });
        }
        let value = self.result.unwrap_or(serde_json::Value::Null);
        serde_json::from_value(value).map_err(|e| CliError::Malformed(e.to_string()))
    }
}

/// Client bound to one daemon endpoint.
#[derive(Debug, Clone)]
pub struct RpcClient {
    url: String,
    client: reqwest::Client,
}

impl RpcClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            url: format!("{}/{}", endpoint.trim_end_matches('/'), RPC_PATH),
            client: reqwest::Client::new(),
        }
    }

    /// Send a JSON-RPC call to the daemon and decode its result.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, CliError> {
        let request = JsonRpcRequest {
            method: method.to_string(),
            params,
        };

        let resp = self.client.post(&self.url).json(&request).send().await?;
        let rpc_response: JsonRpcResponse = resp.json().await?;
        rpc_response.into_result()
    }
}
