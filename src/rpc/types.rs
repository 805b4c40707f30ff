//! Types for JSON-RPC integration with the ledger node and wallet provider

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// EIP-1193 error code returned when the user rejects a wallet prompt.
pub const USER_REJECTED_CODE: i64 = 4001;

/// A JSON-RPC 2.0 request envelope.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: Value,
}

impl<'a> JsonRpcRequest<'a> {
    pub fn new(id: u64, method: &'a str, params: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

/// A JSON-RPC 2.0 response envelope.
///
/// Exactly one of `result` and `error` is expected to be present. A missing `result`
/// on a successful response is legal for some methods and is surfaced as `Value::Null`.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcErrorObject>,
}

impl JsonRpcResponse {
    /// Convert the envelope into its result, mapping an error object into `RpcError::Rpc`.
    pub fn into_result(self) -> Result<Value, RpcError> {
        if let Some(error) = self.error {
            return Err(RpcError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        Ok(self.result.unwrap_or(Value::Null))
    }
}

/// Error object carried by a failed JSON-RPC response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Filter for `eth_subscribe("logs", ..)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogFilter {
    /// The emitting contract address.
    pub address: String,
    /// Topic filters; position 0 is the event signature hash.
    pub topics: Vec<String>,
}

/// An event log as delivered by the node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcLog {
    /// The address of the emitting contract.
    pub address: String,
    /// Indexed topics, hex encoded.
    pub topics: Vec<String>,
    /// Non-indexed event data, hex encoded.
    pub data: String,
    #[serde(rename = "transactionHash", default)]
    pub transaction_hash: Option<String>,
    #[serde(rename = "blockNumber", default)]
    pub block_number: Option<String>,
    /// Set when the log was retracted by a chain reorganisation.
    #[serde(default)]
    pub removed: bool,
}

/// The subset of a transaction receipt this client inspects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionReceipt {
    #[serde(rename = "transactionHash")]
    pub transaction_hash: String,
    #[serde(rename = "blockNumber", default)]
    pub block_number: Option<String>,
    /// `0x1` on success, `0x0` when execution reverted.
    #[serde(default)]
    pub status: Option<String>,
}

impl TransactionReceipt {
    pub fn succeeded(&self) -> bool {
        matches!(self.status.as_deref(), Some("0x1") | Some("0x01"))
    }

    /// Block number parsed from its hex quantity, if present and well formed.
    pub fn block_number(&self) -> Option<u64> {
        self.block_number
            .as_deref()
            .and_then(|n| u64::from_str_radix(n.trim_start_matches("0x"), 16).ok())
    }
}

/// Error types for transport and JSON-RPC operations
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("No data returned")]
    NoData,

    #[error("WebSocket error: {0}")]
    WebSocketError(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Session error: {0}")]
    SessionError(String),
}

impl RpcError {
    /// Whether the wallet reported that the user declined the request.
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, RpcError::Rpc { code, .. } if *code == USER_REJECTED_CODE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn response_error_object_maps_to_rpc_error() {
        let response: JsonRpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 7,
            "error": { "code": 4001, "message": "User rejected the request." }
        }))
        .expect("valid envelope");

        let err = response.into_result().unwrap_err();
        assert!(err.is_user_rejection());
    }

    #[test]
    fn missing_result_is_null() {
        let response: JsonRpcResponse =
            serde_json::from_value(json!({ "jsonrpc": "2.0", "id": 1, "result": null }))
                .expect("valid envelope");
        assert_eq!(response.into_result().unwrap(), Value::Null);
    }

    #[test]
    fn receipt_status_and_block_number() {
        let receipt: TransactionReceipt = serde_json::from_value(json!({
            "transactionHash": "0xabc",
            "blockNumber": "0x1b4",
            "status": "0x1"
        }))
        .expect("valid receipt");
        assert!(receipt.succeeded());
        assert_eq!(receipt.block_number(), Some(436));

        let reverted = TransactionReceipt {
            status: Some("0x0".to_string()),
            ..receipt
        };
        assert!(!reverted.succeeded());
    }
}
