//!
//! Contract client for the WavePortal log.
//!
//! Wraps a provider connection plus the contract's read (`getAllWaves`) and write (`wave`)
//! operations, and the confirmation wait for a submitted write.

use super::contract::{DEFAULT_CONTRACT_ADDRESS, DEFAULT_GAS_LIMIT, getAllWavesCall, waveCall};
use super::types::*;
use crate::rpc::{RpcError, RpcTransport, TransactionReceipt};
use crate::wallet::Account;

use alloy_primitives::Address;
use alloy_sol_types::SolCall;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Fixed contract parameters a `LedgerClient` is built with
#[derive(Debug, Clone)]
pub struct ContractConfig {
	/// The deployed contract address.
	pub address: Address,
	/// Gas allowance for `wave`.
	pub gas_limit: u64,
	/// How often `eth_getTransactionReceipt` is polled while awaiting confirmation.
	pub receipt_poll_interval: Duration,
}

impl Default for ContractConfig {
	fn default() -> Self {
		Self {
			address: DEFAULT_CONTRACT_ADDRESS,
			gas_limit: DEFAULT_GAS_LIMIT,
			receipt_poll_interval: Duration::from_secs(4),
		}
	}
}

/// WavePortal contract client
#[derive(Clone)]
pub struct LedgerClient {
	transport: Arc<dyn RpcTransport>,
	config: ContractConfig,
	/// The account writes are sent from. Reads work without one.
	signer: Option<Account>,
}

impl LedgerClient {
	/// Create a client bound to `signer` for write operations.
	pub fn new(
		transport: Arc<dyn RpcTransport>,
		config: ContractConfig,
		signer: Option<Account>,
	) -> Self {
		Self {
			transport,
			config,
			signer,
		}
	}

	pub fn signer(&self) -> Option<&Account> {
		self.signer.as_ref()
	}

	pub fn contract_address(&self) -> Address {
		self.config.address
	}

	/// Read the full wave log.
	///
	/// Returns the entries exactly as the contract reports them, in contract order.
	///
	/// # Errors
	/// `NetworkError` on transport or RPC failure, `Decode` if the return data is malformed.
	pub async fn fetch_all(&self) -> Result<Vec<WaveEntry>, LedgerError> {
		let call = json!({
			"to": self.config.address.to_string(),
			"data": encode_hex(&getAllWavesCall {}.abi_encode()),
		});

		let result = self
			.transport
			.request("eth_call", json!([call, "latest"]))
			.await
			.map_err(|e| {
				error!("Failed to fetch waves: {}", e);
				LedgerError::NetworkError(e)
			})?;

		let data = decode_hex_value(&result)?;
		let waves = getAllWavesCall::abi_decode_returns(&data, true)
			.map_err(|e| LedgerError::Decode(format!("Failed to decode getAllWaves: {}", e)))?
			._0;

		let entries = waves
			.into_iter()
			.map(|wave| WaveEntry::from_ledger(wave.waver, wave.timestamp, wave.message))
			.collect::<Result<Vec<_>, _>>()?;

		debug!("Fetched {} waves", entries.len());
		Ok(entries)
	}

	/// Send a `wave(message)` transaction from the bound signer.
	///
	/// # Errors
	/// `SubmissionRejected` if the signer declines or no signer is bound, `NetworkError`
	/// on transport failure.
	pub async fn submit(&self, message: &str) -> Result<TransactionHandle, LedgerError> {
		let signer = self.signer.as_ref().ok_or_else(|| {
			LedgerError::SubmissionRejected("No signing account connected".to_string())
		})?;

		let data = waveCall {
			_message: message.to_string(),
		}
		.abi_encode();

		let transaction = json!({
			"from": signer.as_str(),
			"to": self.config.address.to_string(),
			"data": encode_hex(&data),
			"gas": format!("{:#x}", self.config.gas_limit),
		});

		let result = self
			.transport
			.request("eth_sendTransaction", json!([transaction]))
			.await
			.map_err(|e| {
				if e.is_user_rejection() {
					LedgerError::SubmissionRejected(e.to_string())
				} else {
					LedgerError::NetworkError(e)
				}
			})?;

		let hash = result
			.as_str()
			.ok_or_else(|| LedgerError::Decode(format!("Expected transaction hash, got {}", result)))?
			.to_string();

		info!("Submitted wave transaction {}", hash);

		Ok(TransactionHandle {
			hash,
			transport: self.transport.clone(),
			poll_interval: self.config.receipt_poll_interval,
		})
	}
}

/// A submitted, not yet confirmed transaction
pub struct TransactionHandle {
	hash: String,
	transport: Arc<dyn RpcTransport>,
	poll_interval: Duration,
}

impl std::fmt::Debug for TransactionHandle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TransactionHandle")
			.field("hash", &self.hash)
			.field("poll_interval", &self.poll_interval)
			.finish()
	}
}

impl TransactionHandle {
	pub fn hash(&self) -> &str {
		&self.hash
	}

	/// Wait until the ledger reports the transaction included.
	///
	/// Polls for the receipt with no deadline of its own.
	///
	/// # Errors
	/// `ConfirmationFailure` if the transaction reverted, `NetworkError` if polling fails.
	pub async fn await_confirmation(&self) -> Result<Confirmation, LedgerError> {
		loop {
			let result = self
				.transport
				.request("eth_getTransactionReceipt", json!([self.hash]))
				.await?;

			if result.is_null() {
				debug!("Transaction {} not yet included", self.hash);
				tokio::time::sleep(self.poll_interval).await;
				continue;
			}

			let receipt: TransactionReceipt =
				serde_json::from_value(result).map_err(RpcError::JsonError)?;

			if !receipt.succeeded() {
				return Err(LedgerError::ConfirmationFailure(format!(
					"Transaction {} reverted",
					self.hash
				)));
			}

			return Ok(Confirmation {
				hash: self.hash.clone(),
				block_number: receipt.block_number(),
			});
		}
	}
}

fn encode_hex(bytes: &[u8]) -> String {
	format!("0x{}", hex::encode(bytes))
}

fn decode_hex_value(value: &Value) -> Result<Vec<u8>, LedgerError> {
	let raw = value
		.as_str()
		.ok_or_else(|| LedgerError::Decode(format!("Expected hex string, got {}", value)))?;

	hex::decode(raw.trim_start_matches("0x"))
		.map_err(|e| LedgerError::Decode(format!("Failed to decode hex: {}", e)))
}
