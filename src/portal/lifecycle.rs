//! Transaction lifecycle for one wave at a time.
//!
//! `TransactionLifecycle` drives a single wave from submission to confirmation, refreshes
//! the log once the wave is mined, and publishes every state change over a `watch`
//! channel. It is the only backpressure in the client: while a wave is in flight further
//! waves are rejected.

use super::store::WaveLogStore;
use super::types::{PortalError, TransactionState};
use crate::ledger::{LedgerClient, LedgerError};

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Tracks and gates the client's in-flight wave
pub struct TransactionLifecycle {
	state: watch::Sender<TransactionState>,
	in_flight: AtomicBool,
}

/// Clears the in-flight flag when a wave attempt ends.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
	fn drop(&mut self) {
		self.0.store(false, Ordering::Release);
	}
}

impl TransactionLifecycle {
	pub fn new() -> Self {
		let (state, _) = watch::channel(TransactionState::Idle);
		Self {
			state,
			in_flight: AtomicBool::new(false),
		}
	}

	pub fn state(&self) -> TransactionState {
		self.state.borrow().clone()
	}

	pub fn input_enabled(&self) -> bool {
		!self.in_flight.load(Ordering::Acquire) && self.state.borrow().input_enabled()
	}

	/// Receiver observing every published state.
	pub fn subscribe(&self) -> watch::Receiver<TransactionState> {
		self.state.subscribe()
	}

	fn transition(&self, next: TransactionState) {
		info!("Transaction state: {:?} -> {:?}", *self.state.borrow(), next);
		self.state.send_replace(next);
	}

	fn fail(&self, err: LedgerError) -> TransactionState {
		error!("Wave transaction failed: {}", err);
		let failed = TransactionState::Failed {
			reason: err.to_string(),
		};
		self.transition(failed.clone());
		failed
	}

	/// Submit `message`, wait for it to be mined, then re-seed `store` from the ledger.
	///
	/// Returns the terminal state of this attempt: `Mined` or `Failed`. Once mined and the
	/// refresh has run, the published state settles back to `Idle`.
	///
	/// # Errors
	/// `WaveInFlight` if another wave from this client has not finished yet.
	pub async fn wave(
		&self,
		ledger: &LedgerClient,
		store: &WaveLogStore,
		message: &str,
	) -> Result<TransactionState, PortalError> {
		if self
			.in_flight
			.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
			.is_err()
		{
			warn!("Rejecting wave while another is in flight");
			return Err(PortalError::WaveInFlight);
		}
		let _guard = InFlightGuard(&self.in_flight);

		if matches!(*self.state.borrow(), TransactionState::Failed { .. }) {
			self.transition(TransactionState::Idle);
		}

		let handle = match ledger.submit(message).await {
			Ok(handle) => handle,
			Err(e) => return Ok(self.fail(e)),
		};
		let hash = handle.hash().to_string();
		info!("Mining: {}", hash);
		self.transition(TransactionState::Submitted { hash: hash.clone() });

		match handle.await_confirmation().await {
			Ok(confirmation) => info!(
				"Mined: {} in block {:?}",
				confirmation.hash, confirmation.block_number
			),
			Err(e) => return Ok(self.fail(e)),
		}
		let mined = TransactionState::Mined { hash };
		self.transition(mined.clone());

		let token = store.begin_refresh();
		match ledger.fetch_all().await {
			Ok(entries) => store.replace_all_since(token, entries),
			Err(e) => error!("Failed to refresh waves after mining: {}", e),
		}

		self.transition(TransactionState::Idle);
		Ok(mined)
	}
}

impl Default for TransactionLifecycle {
	fn default() -> Self {
		Self::new()
	}
}
