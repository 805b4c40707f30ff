//! JSON-RPC integration module
//!
//! This module provides the transport used for wallet and contract calls, the WebSocket
//! log subscriptions that carry live contract events, and the JSON-RPC wire types.

/// Request/response transport for wallet and contract calls
mod client;
/// Scripted transport and log sources for tests
#[cfg(test)]
pub mod mock;
/// `eth_subscribe` log subscriptions
mod subscription;
/// JSON-RPC wire types and errors
mod types;

pub use client::{HttpTransport, RpcTransport};
pub use subscription::{LogSource, LogSubscriber, WsLogSubscriber};
pub use types::*;
