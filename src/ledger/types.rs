use crate::rpc::RpcError;

use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One logged wave, as presented by the client
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct WaveEntry {
	pub address: String,
	pub timestamp: DateTime<Utc>,
	/// May be empty.
	pub message: String,
}

impl WaveEntry {
	pub fn new(
		address: impl Into<String>,
		timestamp: DateTime<Utc>,
		message: impl Into<String>,
	) -> Self {
		Self {
			address: address.into(),
			timestamp,
			message: message.into(),
		}
	}

	/// Build an entry from the contract's representation, treating the ledger
	/// timestamp as whole seconds since the Unix epoch.
	pub fn from_ledger(
		address: Address,
		timestamp: U256,
		message: String,
	) -> Result<Self, LedgerError> {
		Ok(Self {
			address: address.to_string(),
			timestamp: timestamp_from_seconds(timestamp)?,
			message,
		})
	}
}

/// Convert an on-chain `uint256` seconds value into a UTC instant.
pub fn timestamp_from_seconds(seconds: U256) -> Result<DateTime<Utc>, LedgerError> {
	let seconds = u64::try_from(seconds)
		.ok()
		.and_then(|s| i64::try_from(s).ok())
		.ok_or_else(|| LedgerError::Decode(format!("Timestamp {} out of range", seconds)))?;

	DateTime::<Utc>::from_timestamp(seconds, 0)
		.ok_or_else(|| LedgerError::Decode(format!("Timestamp {} out of range", seconds)))
}

/// A transaction included in the ledger with a successful status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
	pub hash: String,
	pub block_number: Option<u64>,
}

/// Error types for contract reads and writes
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
	#[error("Submission rejected: {0}")]
	SubmissionRejected(String),

	#[error("Network error: {0}")]
	NetworkError(#[from] RpcError),

	#[error("Confirmation failure: {0}")]
	ConfirmationFailure(String),

	#[error("Decode error: {0}")]
	Decode(String),
}
