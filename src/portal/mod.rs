//! Wave Portal Module
//!
//! This module provides the synchronization core that reconciles the wave log from its
//! three sources: the bulk read, the client's own in-flight wave, and the live event stream.
//!
//! - `orchestrator`: The main entry point. It wires the wallet, ledger, subscription, store and lifecycle together.
//! - `events`: The live `NewWave` subscription with explicit cancel semantics.
//! - `lifecycle`: Tracks the one in-flight wave and gates input.
//! - `store`: Owns the wave log and its mutation discipline.
//! - `types`: Transaction state and portal errors.

/// Live `NewWave` notifications
pub mod events;
/// Transaction lifecycle for the in-flight wave
pub mod lifecycle;
/// Main coordinator for the portal
pub mod orchestrator;
/// The wave log store
pub mod store;
/// Shared state and error types
pub mod types;

pub use orchestrator::*;
pub use types::*;
