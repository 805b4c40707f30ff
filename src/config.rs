/// Portal configuration from environment variables
///
/// Supplies the provider endpoints and the fixed contract parameters to the binary.
/// Nothing below `main` reads the environment.
use crate::ledger::ContractConfig;
use crate::ledger::contract::{DEFAULT_CONTRACT_ADDRESS, DEFAULT_GAS_LIMIT};

use alloy_primitives::Address;
use std::env;
use std::time::Duration;
use tracing::info;

const DEFAULT_POLL_MS: u64 = 4000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("Invalid value for {name}: {reason}")]
	Invalid { name: &'static str, reason: String },
}

#[derive(Clone, Debug)]
pub struct PortalConfig {
	/// HTTP JSON-RPC endpoint of the wallet provider; `None` when no wallet is installed.
	pub provider_url: Option<String>,
	/// WebSocket endpoint for live logs.
	pub ws_url: Option<String>,
	pub contract: ContractConfig,
}

impl PortalConfig {
	/// Load configuration from environment variables
	///
	/// Environment variables:
	/// - `WAVE_PORTAL_PROVIDER_URL`: wallet provider JSON-RPC endpoint (unset means no wallet)
	/// - `WAVE_PORTAL_WS_URL`: WebSocket endpoint (defaults to the provider URL with a `ws` scheme)
	/// - `WAVE_PORTAL_CONTRACT`: contract address
	/// - `WAVE_PORTAL_GAS_LIMIT`: gas allowance for `wave`
	/// - `WAVE_PORTAL_POLL_MS`: receipt poll interval in milliseconds
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| env::var(name).ok())
	}

	fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
		let provider_url = lookup("WAVE_PORTAL_PROVIDER_URL").filter(|url| !url.is_empty());

		let ws_url = lookup("WAVE_PORTAL_WS_URL")
			.filter(|url| !url.is_empty())
			.or_else(|| provider_url.as_deref().map(ws_url_for));

		let address = match lookup("WAVE_PORTAL_CONTRACT") {
			Some(raw) => raw.parse::<Address>().map_err(|e| ConfigError::Invalid {
				name: "WAVE_PORTAL_CONTRACT",
				reason: e.to_string(),
			})?,
			None => DEFAULT_CONTRACT_ADDRESS,
		};

		let gas_limit = parse_u64(&lookup, "WAVE_PORTAL_GAS_LIMIT")?.unwrap_or(DEFAULT_GAS_LIMIT);
		let poll_ms = parse_u64(&lookup, "WAVE_PORTAL_POLL_MS")?.unwrap_or(DEFAULT_POLL_MS);

		info!("Contract address: {}", address);
		match &provider_url {
			Some(url) => info!("Wallet provider: {}", url),
			None => info!("No wallet provider configured"),
		}

		Ok(Self {
			provider_url,
			ws_url,
			contract: ContractConfig {
				address,
				gas_limit,
				receipt_poll_interval: Duration::from_millis(poll_ms),
			},
		})
	}
}

fn parse_u64(
	lookup: &impl Fn(&str) -> Option<String>,
	name: &'static str,
) -> Result<Option<u64>, ConfigError> {
	lookup(name)
		.map(|raw| {
			raw.parse::<u64>().map_err(|e| ConfigError::Invalid {
				name,
				reason: e.to_string(),
			})
		})
		.transpose()
}

/// `http(s)://` → `ws(s)://`, anything else unchanged.
fn ws_url_for(http_url: &str) -> String {
	if let Some(rest) = http_url.strip_prefix("https://") {
		format!("wss://{}", rest)
	} else if let Some(rest) = http_url.strip_prefix("http://") {
		format!("ws://{}", rest)
	} else {
		http_url.to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	fn load(vars: &[(&str, &str)]) -> Result<PortalConfig, ConfigError> {
		let vars: HashMap<String, String> = vars
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		PortalConfig::from_lookup(|name| vars.get(name).cloned())
	}

	#[test]
	fn defaults_without_provider() {
		let config = load(&[]).unwrap();
		assert_eq!(config.provider_url, None);
		assert_eq!(config.ws_url, None);
		assert_eq!(config.contract.address, DEFAULT_CONTRACT_ADDRESS);
		assert_eq!(config.contract.gas_limit, 1_000_000);
		assert_eq!(config.contract.receipt_poll_interval, Duration::from_secs(4));
	}

	#[test]
	fn ws_url_derived_from_provider() {
		let config = load(&[("WAVE_PORTAL_PROVIDER_URL", "https://node.example/rpc")]).unwrap();
		assert_eq!(config.ws_url.as_deref(), Some("wss://node.example/rpc"));

		let config = load(&[
			("WAVE_PORTAL_PROVIDER_URL", "http://localhost:8545"),
			("WAVE_PORTAL_WS_URL", "ws://localhost:8546"),
		])
		.unwrap();
		assert_eq!(config.ws_url.as_deref(), Some("ws://localhost:8546"));
	}

	#[test]
	fn rejects_invalid_values() {
		assert!(load(&[("WAVE_PORTAL_GAS_LIMIT", "lots")]).is_err());
		assert!(load(&[("WAVE_PORTAL_CONTRACT", "0x1234")]).is_err());
	}
}
