use crate::ledger::LedgerError;
use crate::wallet::WalletError;

/// State of the client's one in-flight wave
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionState {
    /// Nothing in flight; input enabled.
    Idle,
    /// Sent to the network, awaiting inclusion.
    Submitted { hash: String },
    /// Included; the log is being refreshed.
    Mined { hash: String },
    /// Submission or confirmation failed; input enabled for a manual retry.
    Failed { reason: String },
}

impl TransactionState {
    /// Whether the user may start a new wave.
    pub fn input_enabled(&self) -> bool {
        matches!(self, TransactionState::Idle | TransactionState::Failed { .. })
    }
}

/// Error types surfaced by the portal
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("A wave is already in flight")]
    WaveInFlight,
}
