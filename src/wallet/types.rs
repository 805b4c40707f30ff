use crate::rpc::RpcError;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque address of the connected wallet account
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Account(String);

impl Account {
	pub fn new(address: impl Into<String>) -> Self {
		Self(address.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for Account {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Error types for wallet discovery and connection
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
	#[error("No wallet provider found; install a wallet to continue")]
	ProviderMissing,

	#[error("Connection denied: {0}")]
	ConnectionDenied(String),

	#[error("Network error: {0}")]
	NetworkError(#[from] RpcError),
}
