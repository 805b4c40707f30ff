//!
//! JSON-RPC client for the wallet provider and ledger node.
//!
//! This module provides the `RpcTransport` seam that every wallet and contract call goes
//! through, and an HTTP implementation of it. All methods are async and designed for use
//! with Tokio.

use super::types::*;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// A request-capable connection to a wallet provider / ledger node.
#[async_trait]
pub trait RpcTransport: Send + Sync {
	/// Issue one JSON-RPC request and return its `result` value.
	async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError>;
}

/// JSON-RPC over HTTP
pub struct HttpTransport {
	/// The underlying HTTP client.
	http_client: Client,
	/// The JSON-RPC endpoint.
	url: String,
	/// Monotonic request id.
	next_id: AtomicU64,
}

impl HttpTransport {
	/// Create a new HTTP transport.
	///
	/// Only connection establishment is bounded; request duration is left to the
	/// provider, since `eth_requestAccounts` waits on a human.
	pub fn new(url: String) -> Result<Self, RpcError> {
		let http_client = Client::builder()
			.connect_timeout(Duration::from_secs(10))
			.build()?;

		Ok(Self {
			http_client,
			url,
			next_id: AtomicU64::new(1),
		})
	}
}

#[async_trait]
impl RpcTransport for HttpTransport {
	async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		let request_body = JsonRpcRequest::new(id, method, params);

		debug!("JSON-RPC request #{} {} to {}", id, method, self.url);

		let response = self
			.http_client
			.post(&self.url)
			.header("Content-Type", "application/json")
			.json(&request_body)
			.send()
			.await?;

		if !response.status().is_success() {
			return Err(RpcError::SessionError(format!(
				"HTTP error: {}",
				response.status()
			)));
		}

		let envelope: JsonRpcResponse = response.json().await?;
		envelope.into_result()
	}
}
