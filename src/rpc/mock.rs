use super::*;
use crate::ledger::contract::{NewWave, Wave, getAllWavesCall};

use alloy_primitives::{Address, U256};
use alloy_sol_types::{SolCall, SolEvent};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

type RequestHook = Box<dyn Fn(&str) + Send + Sync>;

/// Transport answering each method from a queue of scripted responses.
#[derive(Default)]
pub struct MockTransport {
	responses: Mutex<HashMap<String, VecDeque<Result<Value, RpcError>>>>,
	calls: Mutex<Vec<(String, Value)>>,
	hook: Mutex<Option<RequestHook>>,
}

impl MockTransport {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push_ok(&self, method: &str, value: Value) {
		self.push(method, Ok(value));
	}

	pub fn push_err(&self, method: &str, error: RpcError) {
		self.push(method, Err(error));
	}

	fn push(&self, method: &str, response: Result<Value, RpcError>) {
		self.responses
			.lock()
			.unwrap()
			.entry(method.to_string())
			.or_default()
			.push_back(response);
	}

	/// Run `hook` with the method name before each request is answered.
	pub fn on_request(&self, hook: impl Fn(&str) + Send + Sync + 'static) {
		*self.hook.lock().unwrap() = Some(Box::new(hook));
	}

	pub fn calls(&self) -> Vec<(String, Value)> {
		self.calls.lock().unwrap().clone()
	}

	pub fn calls_to(&self, method: &str) -> Vec<Value> {
		self.calls()
			.into_iter()
			.filter(|(m, _)| m == method)
			.map(|(_, params)| params)
			.collect()
	}
}

#[async_trait]
impl RpcTransport for MockTransport {
	async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
		if let Some(hook) = self.hook.lock().unwrap().as_ref() {
			hook(method);
		}
		self.calls
			.lock()
			.unwrap()
			.push((method.to_string(), params));

		self.responses
			.lock()
			.unwrap()
			.get_mut(method)
			.and_then(|queue| queue.pop_front())
			.unwrap_or_else(|| {
				Err(RpcError::SessionError(format!(
					"no scripted response for {}",
					method
				)))
			})
	}
}

/// Log source fed through an unbounded channel.
pub struct MockLogSource {
	receiver: mpsc::UnboundedReceiver<Result<RpcLog, RpcError>>,
	closed: Arc<AtomicUsize>,
}

#[async_trait]
impl LogSource for MockLogSource {
	async fn next_log(&mut self) -> Option<Result<RpcLog, RpcError>> {
		self.receiver.recv().await
	}

	async fn close(&mut self) -> Result<(), RpcError> {
		self.closed.fetch_add(1, Ordering::SeqCst);
		Ok(())
	}
}

/// A mock source, its feeding end, and a counter of `close` calls.
pub fn mock_log_source() -> (
	mpsc::UnboundedSender<Result<RpcLog, RpcError>>,
	MockLogSource,
	Arc<AtomicUsize>,
) {
	let (sender, receiver) = mpsc::unbounded_channel();
	let closed = Arc::new(AtomicUsize::new(0));
	let source = MockLogSource {
		receiver,
		closed: closed.clone(),
	};
	(sender, source, closed)
}

/// Subscriber handing out pre-built mock sources in order.
#[derive(Default)]
pub struct MockSubscriber {
	sources: Mutex<VecDeque<MockLogSource>>,
	filters: Mutex<Vec<LogFilter>>,
}

impl MockSubscriber {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add_source(&self, source: MockLogSource) {
		self.sources.lock().unwrap().push_back(source);
	}

	pub fn filters(&self) -> Vec<LogFilter> {
		self.filters.lock().unwrap().clone()
	}
}

#[async_trait]
impl LogSubscriber for MockSubscriber {
	async fn subscribe(&self, filter: LogFilter) -> Result<Box<dyn LogSource>, RpcError> {
		self.filters.lock().unwrap().push(filter);
		match self.sources.lock().unwrap().pop_front() {
			Some(source) => Ok(Box::new(source)),
			None => Err(RpcError::SessionError("no mock source left".to_string())),
		}
	}
}

/// `eth_call` result for `getAllWaves` returning `waves`.
pub fn get_all_waves_result(waves: &[(Address, u64, &str)]) -> Value {
	let waves: Vec<Wave> = waves
		.iter()
		.map(|(waver, timestamp, message)| Wave {
			waver: *waver,
			timestamp: U256::from(*timestamp),
			message: message.to_string(),
		})
		.collect();
	json!(format!(
		"0x{}",
		hex::encode(getAllWavesCall::abi_encode_returns(&(waves,)))
	))
}

/// A `NewWave` log as the node would deliver it.
pub fn new_wave_log(contract: Address, from: Address, timestamp: u64, message: &str) -> RpcLog {
	let event = NewWave {
		from,
		timestamp: U256::from(timestamp),
		message: message.to_string(),
	};
	RpcLog {
		address: contract.to_string(),
		topics: vec![
			NewWave::SIGNATURE_HASH.to_string(),
			from.into_word().to_string(),
		],
		data: format!("0x{}", hex::encode(event.encode_data())),
		transaction_hash: Some(format!("0x{:064x}", timestamp)),
		block_number: Some("0x1".to_string()),
		removed: false,
	}
}
