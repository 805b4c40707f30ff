//! Ledger integration module for the WavePortal contract
//!
//! This module provides the contract bindings, the client for reading the wave log and
//! submitting waves, and the types shared with the rest of the crate.

/// Contract client and pending transaction handle
mod client;
/// Contract interface bindings
pub mod contract;
/// Wave entries, confirmations and ledger errors
mod types;

pub use client::{ContractConfig, LedgerClient};
pub use types::*;
