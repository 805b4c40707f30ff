//! Live `NewWave` event subscription.
//!
//! An `EventSubscription` owns a background task that reads raw log notifications from a
//! `LogSource`, decodes them into `WaveEntry` values and forwards them over a channel.
//! Consumers pull entries with `next_wave`; `cancel` unsubscribes and guarantees nothing is
//! delivered afterwards. Malformed notifications are logged and dropped without ending the
//! subscription.

use crate::ledger::contract::NewWave;
use crate::ledger::{LedgerError, WaveEntry};
use crate::rpc::{LogFilter, LogSource, RpcLog};

use alloy_primitives::{Address, B256};
use alloy_sol_types::SolEvent;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Log filter selecting `NewWave` events emitted by `contract`.
pub fn new_wave_filter(contract: Address) -> LogFilter {
    LogFilter {
        address: contract.to_string(),
        topics: vec![NewWave::SIGNATURE_HASH.to_string()],
    }
}

/// Decode one raw log into a wave entry.
pub fn decode_new_wave(log: &RpcLog) -> Result<WaveEntry, LedgerError> {
    let topics = log
        .topics
        .iter()
        .map(|topic| {
            topic
                .parse::<B256>()
                .map_err(|e| LedgerError::Decode(format!("Invalid topic {}: {}", topic, e)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let data = hex::decode(log.data.trim_start_matches("0x"))
        .map_err(|e| LedgerError::Decode(format!("Failed to decode hex: {}", e)))?;

    let event = NewWave::decode_raw_log(topics, &data, true)
        .map_err(|e| LedgerError::Decode(format!("Failed to decode NewWave: {}", e)))?;

    WaveEntry::from_ledger(event.from, event.timestamp, event.message)
}

/// A live subscription to `NewWave` notifications
pub struct EventSubscription {
    receiver: mpsc::UnboundedReceiver<WaveEntry>,
    cancel: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl EventSubscription {
    /// Start forwarding notifications from `source`.
    pub fn spawn(source: Box<dyn LogSource>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let (cancel, cancelled) = oneshot::channel();
        let task = tokio::spawn(forward_notifications(source, sender, cancelled));

        Self {
            receiver,
            cancel: Some(cancel),
            task: Some(task),
        }
    }

    /// Next decoded entry, or `None` once the subscription has ended or been cancelled.
    pub async fn next_wave(&mut self) -> Option<WaveEntry> {
        self.receiver.recv().await
    }

    /// Detach from the network and wait for the forwarding task to finish.
    ///
    /// Entries already decoded but not yet consumed are discarded.
    pub async fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        self.receiver.close();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!("Event subscription task failed: {}", e);
            }
        }
        while self.receiver.try_recv().is_ok() {}
        info!("Event subscription cancelled");
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn forward_notifications(
    mut source: Box<dyn LogSource>,
    sender: mpsc::UnboundedSender<WaveEntry>,
    mut cancelled: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            biased;
            _ = &mut cancelled => {
                if let Err(e) = source.close().await {
                    warn!("Failed to close log subscription: {}", e);
                }
                return;
            }
            notification = source.next_log() => {
                match notification {
                    Some(Ok(log)) => {
                        if log.removed {
                            debug!("Skipping removed log {:?}", log.transaction_hash);
                            continue;
                        }
                        match decode_new_wave(&log) {
                            Ok(entry) => {
                                debug!("NewWave from {} at {}", entry.address, entry.timestamp);
                                if sender.send(entry).is_err() {
                                    debug!("Event receiver dropped, stopping subscription");
                                    if let Err(e) = source.close().await {
                                        warn!("Failed to close log subscription: {}", e);
                                    }
                                    return;
                                }
                            }
                            Err(e) => {
                                warn!("Dropping malformed NewWave notification: {}", e);
                            }
                        }
                    }
                    Some(Err(e)) => {
                        warn!("Dropping malformed NewWave notification: {}", e);
                    }
                    None => {
                        info!("Log subscription ended");
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::RpcError;
    use crate::rpc::mock::{mock_log_source, new_wave_log};
    use std::sync::atomic::Ordering;

    fn contract() -> Address {
        Address::repeat_byte(0x11)
    }

    #[test]
    fn decodes_new_wave_log() {
        let from = Address::repeat_byte(0xbb);
        let log = new_wave_log(contract(), from, 200, "yo");

        let entry = decode_new_wave(&log).unwrap();
        assert_eq!(entry.address, from.to_string());
        assert_eq!(entry.timestamp.timestamp(), 200);
        assert_eq!(entry.message, "yo");
    }

    #[test]
    fn rejects_log_with_foreign_signature() {
        let mut log = new_wave_log(contract(), Address::repeat_byte(0xbb), 200, "yo");
        log.topics[0] = B256::repeat_byte(0x42).to_string();

        assert!(matches!(decode_new_wave(&log), Err(LedgerError::Decode(_))));
    }

    #[test]
    fn filter_targets_contract_and_event() {
        let filter = new_wave_filter(contract());
        assert_eq!(filter.address, contract().to_string());
        assert_eq!(filter.topics, vec![NewWave::SIGNATURE_HASH.to_string()]);
    }

    #[tokio::test]
    async fn delivers_in_transport_order_and_drops_malformed() {
        let (feed, source, _closed) = mock_log_source();
        let mut subscription = EventSubscription::spawn(Box::new(source));

        let mut broken = new_wave_log(contract(), Address::repeat_byte(0xaa), 1, "x");
        broken.data = "0xzz".to_string();

        feed.send(Ok(new_wave_log(contract(), Address::repeat_byte(0xaa), 300, "first")))
            .unwrap();
        feed.send(Ok(broken)).unwrap();
        feed.send(Err(RpcError::NoData)).unwrap();
        feed.send(Ok(new_wave_log(contract(), Address::repeat_byte(0xbb), 100, "second")))
            .unwrap();

        assert_eq!(subscription.next_wave().await.unwrap().message, "first");
        assert_eq!(subscription.next_wave().await.unwrap().message, "second");

        drop(feed);
        assert!(subscription.next_wave().await.is_none());
    }

    #[tokio::test]
    async fn skips_removed_logs() {
        let (feed, source, _closed) = mock_log_source();
        let mut subscription = EventSubscription::spawn(Box::new(source));

        let mut retracted = new_wave_log(contract(), Address::repeat_byte(0xaa), 5, "gone");
        retracted.removed = true;
        feed.send(Ok(retracted)).unwrap();
        feed.send(Ok(new_wave_log(contract(), Address::repeat_byte(0xaa), 6, "kept")))
            .unwrap();

        assert_eq!(subscription.next_wave().await.unwrap().message, "kept");
    }

    #[tokio::test]
    async fn cancel_closes_source_and_stops_delivery() {
        let (feed, source, closed) = mock_log_source();
        let subscription = EventSubscription::spawn(Box::new(source));

        subscription.cancel().await;
        assert_eq!(closed.load(Ordering::SeqCst), 1);

        // the source is gone once the task has finished
        assert!(feed
            .send(Ok(new_wave_log(contract(), Address::repeat_byte(0xaa), 1, "late")))
            .is_err());
    }
}
