mod config;
mod ledger;
mod portal;
mod rpc;
mod utils;
mod wallet;

use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use crate::config::PortalConfig;
use crate::portal::{PortalError, TransactionState, WavePortal};
use crate::rpc::{HttpTransport, RpcTransport, WsLogSubscriber};
use crate::utils::render_log;
use crate::wallet::{WalletConnector, WalletError};

#[tokio::main(flavor = "current_thread")]
async fn main() {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::from_default_env()
				.add_directive(tracing::Level::INFO.into()),
		)
		.with_target(false)
		.with_thread_ids(false)
		.with_thread_names(false)
		.with_file(false)
		.with_line_number(false)
		.with_timer(tracing_subscriber::fmt::time::time())
		.init();

	info!("Starting wave portal");

	let config = match PortalConfig::from_env() {
		Ok(config) => config,
		Err(e) => {
			error!("Failed to load configuration: {}", e);
			return;
		}
	};

	let provider: Option<Arc<dyn RpcTransport>> = match config.provider_url.clone() {
		Some(url) => match HttpTransport::new(url) {
			Ok(transport) => Some(Arc::new(transport)),
			Err(e) => {
				error!("Failed to create wallet provider client: {}", e);
				return;
			}
		},
		None => None,
	};

	let subscriber = Arc::new(WsLogSubscriber::new(config.ws_url.clone().unwrap_or_default()));
	let mut portal = WavePortal::new(WalletConnector::new(provider), subscriber, config.contract);

	match portal.mount().await {
		Ok(()) => {}
		Err(PortalError::Wallet(WalletError::ProviderMissing)) => {
			println!("Make sure you have a wallet installed, then set WAVE_PORTAL_PROVIDER_URL.");
			return;
		}
		Err(e) => error!("Failed to load the wave log: {}", e),
	}

	match portal.account() {
		Some(account) => info!("Connected account: {}", account),
		None => info!("No authorized account; the first wave will request one"),
	}

	let store = portal.store();
	let lifecycle = portal.lifecycle();
	info!("Wave log loaded with {} waves", store.len());
	println!("{}", render_log(&store.snapshot_sorted()));
	if store.is_empty() {
		println!("No waves yet. Be the first!");
	}

	let gate = lifecycle.clone();
	let renderer = tokio::spawn(async move {
		let mut changes = store.subscribe_changes();
		let mut states = lifecycle.subscribe();
		loop {
			tokio::select! {
				changed = changes.changed() => {
					if changed.is_err() {
						break;
					}
					println!("{}", render_log(&store.snapshot_sorted()));
				}
				changed = states.changed() => {
					if changed.is_err() {
						break;
					}
					let state = states.borrow_and_update().clone();
					print_state(&state);
				}
			}
		}
	});

	println!("Type a message and press enter to wave. Ctrl-C to quit.");
	let mut lines = BufReader::new(tokio::io::stdin()).lines();
	let mut input_open = true;
	while input_open {
		let message = tokio::select! {
			line = lines.next_line() => match line {
				Ok(Some(message)) => message,
				Ok(None) => break,
				Err(e) => {
					error!("Failed to read input: {}", e);
					break;
				}
			},
			_ = tokio::signal::ctrl_c() => break,
		};

		if !gate.input_enabled() {
			println!("Busy ({:?}); message discarded.", gate.state());
			continue;
		}

		// Keep draining stdin while the wave runs so lines typed meanwhile are not
		// replayed as new waves afterwards.
		let wave = portal.wave(message.trim());
		tokio::pin!(wave);
		let outcome = loop {
			tokio::select! {
				outcome = &mut wave => break Some(outcome),
				line = lines.next_line(), if input_open => match line {
					Ok(Some(_)) if gate.input_enabled() => {
						println!("Waiting for the wallet; message discarded.");
					}
					Ok(Some(_)) => println!("Busy ({:?}); message discarded.", gate.state()),
					Ok(None) => input_open = false,
					Err(e) => {
						error!("Failed to read input: {}", e);
						input_open = false;
					}
				},
				_ = tokio::signal::ctrl_c() => break None,
			}
		};

		match outcome {
			Some(Ok(state)) => info!("Wave finished: {:?}", state),
			Some(Err(PortalError::WaveInFlight)) => warn!("A wave is already in flight"),
			Some(Err(e)) => error!("Failed to wave: {}", e),
			None => break,
		}
	}

	info!("Shutting down");
	portal.shutdown().await;
	renderer.abort();
}

fn print_state(state: &TransactionState) {
	match state {
		TransactionState::Idle => println!("Ready."),
		TransactionState::Submitted { hash } => println!("Mining... {}", hash),
		TransactionState::Mined { hash } => println!("Mined -- {}", hash),
		TransactionState::Failed { reason } => println!("Wave failed: {}", reason),
	}
}
