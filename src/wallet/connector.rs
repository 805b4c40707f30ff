use super::types::{Account, WalletError};
use crate::rpc::RpcTransport;

use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Discovers the wallet provider and tracks the active account.
pub struct WalletConnector {
	provider: Option<Arc<dyn RpcTransport>>,
	account: Option<Account>,
}

impl WalletConnector {
	/// `provider` is `None` when no wallet could be discovered.
	pub fn new(provider: Option<Arc<dyn RpcTransport>>) -> Self {
		Self {
			provider,
			account: None,
		}
	}

	/// The provider handle, for building a ledger client against.
	pub fn provider(&self) -> Result<Arc<dyn RpcTransport>, WalletError> {
		self.provider.clone().ok_or(WalletError::ProviderMissing)
	}

	pub fn account(&self) -> Option<&Account> {
		self.account.as_ref()
	}

	/// Look up an already-authorized account without prompting the user.
	pub async fn check_connection(&mut self) -> Result<Option<Account>, WalletError> {
		let provider = self.provider()?;
		let accounts = provider.request("eth_accounts", json!([])).await?;

		match first_account(&accounts) {
			Some(account) => {
				info!("Found authorized account: {}", account);
				self.account = Some(account.clone());
				Ok(Some(account))
			}
			None => {
				info!("No authorized account found");
				Ok(None)
			}
		}
	}

	/// Prompt the user for account access.
	///
	/// Suspends until the user approves or rejects. On rejection the current account is
	/// left untouched.
	pub async fn request_connection(&mut self) -> Result<Account, WalletError> {
		let provider = self.provider()?;
		let accounts = provider
			.request("eth_requestAccounts", json!([]))
			.await
			.map_err(|e| {
				if e.is_user_rejection() {
					warn!("User rejected the connection request");
					WalletError::ConnectionDenied(e.to_string())
				} else {
					WalletError::NetworkError(e)
				}
			})?;

		let account = first_account(&accounts).ok_or_else(|| {
			WalletError::ConnectionDenied("Provider returned no accounts".to_string())
		})?;

		info!("Connected account: {}", account);
		self.account = Some(account.clone());
		Ok(account)
	}

	pub fn disconnect(&mut self) {
		if let Some(account) = self.account.take() {
			debug!("Disconnected account {}", account);
		}
	}
}

fn first_account(accounts: &Value) -> Option<Account> {
	accounts
		.as_array()
		.and_then(|list| list.first())
		.and_then(|account| account.as_str())
		.map(Account::new)
}
