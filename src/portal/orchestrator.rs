//! Portal orchestrator and integration point for all components.
//!
//! This module defines the `WavePortal`, which wires the wallet connector, the ledger
//! client, the live event subscription, the wave log store and the transaction lifecycle
//! together:
//!
//! - on mount, an already-authorized account is looked up, a ledger client is bound to it,
//!   the `NewWave` subscription is attached and the log is seeded from a bulk fetch
//! - live events are appended to the store by a background feed task
//! - a wave runs through the transaction lifecycle, which re-seeds the store once mined
//! - when the account changes the old subscription is torn down before the new client and
//!   subscription are created, so one notification never reaches two feeds

use super::events::{EventSubscription, new_wave_filter};
use super::lifecycle::TransactionLifecycle;
use super::store::WaveLogStore;
use super::types::{PortalError, TransactionState};
use crate::ledger::{ContractConfig, LedgerClient};
use crate::rpc::LogSubscriber;
use crate::wallet::{Account, WalletConnector, WalletError};

use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Background task appending live entries to the store.
struct LiveFeed {
	stop: oneshot::Sender<()>,
	task: JoinHandle<()>,
}

impl LiveFeed {
	fn start(mut subscription: EventSubscription, store: Arc<WaveLogStore>) -> Self {
		let (stop, mut stopped) = oneshot::channel();
		let task = tokio::spawn(async move {
			loop {
				tokio::select! {
					biased;
					_ = &mut stopped => break,
					entry = subscription.next_wave() => match entry {
						Some(entry) => store.append(entry),
						None => {
							info!("Live wave feed ended");
							return;
						}
					}
				}
			}
			subscription.cancel().await;
		});

		Self { stop, task }
	}

	async fn stop(self) {
		let _ = self.stop.send(());
		if let Err(e) = self.task.await {
			error!("Live wave feed task failed: {}", e);
		}
	}
}

/// Coordinates wallet, ledger, live events, store and lifecycle
pub struct WavePortal {
	connector: WalletConnector,
	subscriber: Arc<dyn LogSubscriber>,
	config: ContractConfig,
	store: Arc<WaveLogStore>,
	lifecycle: Arc<TransactionLifecycle>,
	ledger: Option<LedgerClient>,
	live: Option<LiveFeed>,
}

impl WavePortal {
	pub fn new(
		connector: WalletConnector,
		subscriber: Arc<dyn LogSubscriber>,
		config: ContractConfig,
	) -> Self {
		Self {
			connector,
			subscriber,
			config,
			store: Arc::new(WaveLogStore::new()),
			lifecycle: Arc::new(TransactionLifecycle::new()),
			ledger: None,
			live: None,
		}
	}

	pub fn store(&self) -> Arc<WaveLogStore> {
		self.store.clone()
	}

	pub fn lifecycle(&self) -> Arc<TransactionLifecycle> {
		self.lifecycle.clone()
	}

	pub fn account(&self) -> Option<&Account> {
		self.connector.account()
	}

	/// Initial load: pick up an authorized account, subscribe and seed the log.
	///
	/// # Errors
	/// `ProviderMissing` when no wallet is installed, or the error of the initial fetch.
	pub async fn mount(&mut self) -> Result<(), PortalError> {
		let account = match self.connector.check_connection().await {
			Ok(account) => account,
			Err(WalletError::ProviderMissing) => return Err(WalletError::ProviderMissing.into()),
			Err(e) => {
				error!("Failed to check wallet connection: {}", e);
				None
			}
		};

		self.bind(account).await?;
		self.refresh().await
	}

	/// Prompt for account access and rebind if the account changed.
	///
	/// A failed refresh after rebinding is logged; the account stays connected.
	pub async fn connect(&mut self) -> Result<Account, PortalError> {
		let account = self.connector.request_connection().await?;

		let bound = self.ledger.as_ref().and_then(|ledger| ledger.signer());
		if bound != Some(&account) {
			self.bind(Some(account.clone())).await?;
			if let Err(e) = self.refresh().await {
				error!("Failed to refresh waves after connecting: {}", e);
			}
		}
		Ok(account)
	}

	/// Replace the ledger client and its subscription for `account`.
	///
	/// The subscription is attached before any bulk fetch so waves emitted during it are
	/// not lost.
	async fn bind(&mut self, account: Option<Account>) -> Result<(), PortalError> {
		if let Some(live) = self.live.take() {
			info!("Tearing down live feed before rebinding");
			live.stop().await;
		}

		let provider = self.connector.provider()?;
		let ledger = LedgerClient::new(provider, self.config.clone(), account);

		match self
			.subscriber
			.subscribe(new_wave_filter(ledger.contract_address()))
			.await
		{
			Ok(source) => {
				let subscription = EventSubscription::spawn(source);
				self.live = Some(LiveFeed::start(subscription, self.store.clone()));
			}
			Err(e) => error!("Failed to subscribe to NewWave events: {}", e),
		}

		self.ledger = Some(ledger);
		Ok(())
	}

	/// Re-seed the store from a bulk fetch.
	pub async fn refresh(&self) -> Result<(), PortalError> {
		let Some(ledger) = self.ledger.as_ref() else {
			return Ok(());
		};

		let token = self.store.begin_refresh();
		let entries = ledger.fetch_all().await?;
		info!("Loaded {} waves", entries.len());
		self.store.replace_all_since(token, entries);
		Ok(())
	}

	/// Send a wave, connecting the wallet first if needed.
	///
	/// Submission and confirmation failures are reported as a `Failed` state, not an error.
	pub async fn wave(&mut self, message: &str) -> Result<TransactionState, PortalError> {
		if self.connector.account().is_none() || self.ledger.is_none() {
			self.connect().await?;
		}

		let ledger = self.ledger.as_ref().ok_or(WalletError::ProviderMissing)?;
		self.lifecycle.wave(ledger, &self.store, message).await
	}

	/// Detach the live feed and forget the connected account.
	pub async fn shutdown(&mut self) {
		if let Some(live) = self.live.take() {
			live.stop().await;
		}
		self.connector.disconnect();
	}
}
