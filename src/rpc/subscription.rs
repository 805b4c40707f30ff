//!
//! Log subscriptions over a JSON-RPC WebSocket.
//!
//! A `LogSubscriber` opens one `eth_subscribe("logs")` subscription per call and hands back
//! a `LogSource`, which yields raw log notifications in the order the socket delivers them
//! until it is closed.

use super::types::*;
use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tracing::{debug, info};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const SUBSCRIBE_REQUEST_ID: u64 = 1;
const UNSUBSCRIBE_REQUEST_ID: u64 = 2;

/// A stream of raw log notifications.
#[async_trait]
pub trait LogSource: Send {
	/// Next notification, or `None` once the source has ended.
	async fn next_log(&mut self) -> Option<Result<RpcLog, RpcError>>;

	/// Unsubscribe and release the underlying connection.
	async fn close(&mut self) -> Result<(), RpcError>;
}

/// Opens log sources for a filter.
#[async_trait]
pub trait LogSubscriber: Send + Sync {
	async fn subscribe(&self, filter: LogFilter) -> Result<Box<dyn LogSource>, RpcError>;
}

/// `LogSubscriber` backed by a JSON-RPC WebSocket endpoint
#[derive(Clone)]
pub struct WsLogSubscriber {
	/// The WebSocket URL for real-time subscriptions.
	ws_url: String,
}

impl WsLogSubscriber {
	pub fn new(ws_url: String) -> Self {
		Self { ws_url }
	}
}

#[async_trait]
impl LogSubscriber for WsLogSubscriber {
	/// Subscribe to logs matching `filter`.
	///
	/// # Errors
	/// Returns `RpcError` if the WebSocket connection or the `eth_subscribe` call fails.
	async fn subscribe(&self, filter: LogFilter) -> Result<Box<dyn LogSource>, RpcError> {
		debug!("Attempting WebSocket connection to: {}", self.ws_url);

		let (ws_stream, response) = connect_async(self.ws_url.as_str()).await?;
		debug!(
			"WebSocket connection established, response status: {}",
			response.status()
		);
		let (mut ws_sender, mut ws_receiver) = ws_stream.split();

		let subscribe_message = JsonRpcRequest::new(
			SUBSCRIBE_REQUEST_ID,
			"eth_subscribe",
			json!(["logs", filter]),
		);
		ws_sender
			.send(Message::Text(serde_json::to_string(&subscribe_message)?))
			.await?;

		// Wait for the subscription id
		let subscription_id = loop {
			match ws_receiver.next().await {
				Some(msg) => match msg? {
					Message::Text(text) => {
						let parsed: Value = serde_json::from_str(&text)?;
						if parsed.get("id").and_then(|id| id.as_u64()) != Some(SUBSCRIBE_REQUEST_ID) {
							debug!("Ignoring message before subscription ack: {}", text);
							continue;
						}
						let envelope: JsonRpcResponse = serde_json::from_value(parsed)?;
						let result = envelope.into_result()?;
						break result
							.as_str()
							.map(str::to_string)
							.ok_or(RpcError::NoData)?;
					}
					Message::Close(_) => {
						return Err(RpcError::SessionError(
							"Connection closed during subscription handshake".to_string(),
						));
					}
					_ => continue,
				},
				None => {
					return Err(RpcError::SessionError(
						"Connection ended during subscription handshake".to_string(),
					));
				}
			}
		};

		info!("Subscribed to logs with subscription id {}", subscription_id);

		Ok(Box::new(WsLogSource {
			sender: ws_sender,
			receiver: ws_receiver,
			subscription_id,
		}))
	}
}

/// One live `eth_subscribe("logs")` subscription
pub struct WsLogSource {
	sender: SplitSink<WsStream, Message>,
	receiver: SplitStream<WsStream>,
	subscription_id: String,
}

#[async_trait]
impl LogSource for WsLogSource {
	async fn next_log(&mut self) -> Option<Result<RpcLog, RpcError>> {
		loop {
			let msg = match self.receiver.next().await? {
				Ok(msg) => msg,
				Err(e) => return Some(Err(RpcError::WebSocketError(e))),
			};

			match msg {
				Message::Text(text) => {
					let parsed: Value = match serde_json::from_str(&text) {
						Ok(parsed) => parsed,
						Err(e) => return Some(Err(RpcError::JsonError(e))),
					};

					if parsed.get("method").and_then(|m| m.as_str()) != Some("eth_subscription") {
						debug!("Ignoring non-notification message: {}", text);
						continue;
					}

					let params = parsed.get("params");
					let subscription = params
						.and_then(|p| p.get("subscription"))
						.and_then(|s| s.as_str());
					if subscription != Some(self.subscription_id.as_str()) {
						debug!("Ignoring notification for subscription {:?}", subscription);
						continue;
					}

					return match params.and_then(|p| p.get("result")) {
						Some(result) => {
							Some(serde_json::from_value(result.clone()).map_err(RpcError::JsonError))
						}
						None => Some(Err(RpcError::NoData)),
					};
				}
				Message::Close(_) => {
					debug!("Log subscription {} closed by peer", self.subscription_id);
					return None;
				}
				_ => continue,
			}
		}
	}

	async fn close(&mut self) -> Result<(), RpcError> {
		let unsubscribe_message = JsonRpcRequest::new(
			UNSUBSCRIBE_REQUEST_ID,
			"eth_unsubscribe",
			json!([self.subscription_id]),
		);
		self.sender
			.send(Message::Text(serde_json::to_string(&unsubscribe_message)?))
			.await?;
		self.sender.close().await?;

		info!("Unsubscribed from logs subscription {}", self.subscription_id);
		Ok(())
	}
}
