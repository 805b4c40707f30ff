//! Wave log store.
//!
//! This module provides the `WaveLogStore`, the single owner of the wave log. Bulk fetch
//! results replace the whole log, live events append to it, and the view reads sorted
//! copies. Every mutation bumps a version published over a `watch` channel so the view
//! knows when to re-render.
//!
//! A bulk fetch and a live event can race: an event delivered while `fetch_all` is in
//! flight would be overwritten by the fetch result if that result was read before the event
//! was included. `begin_refresh` / `replace_all_since` close that gap by re-appending live
//! entries that arrived after the refresh began and are missing from the fetch result.
//! Live entries are only retained while at least one refresh is outstanding.

use crate::ledger::WaveEntry;

use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::debug;

/// Marks the point a refresh started at, in terms of live appends.
///
/// Live appends are retained for as long as the token is alive. Dropping it without
/// calling `replace_all_since` abandons the refresh.
#[derive(Debug)]
pub struct RefreshToken<'a> {
    store: &'a WaveLogStore,
    append_seq: u64,
}

impl Drop for RefreshToken<'_> {
    fn drop(&mut self) {
        let mut state = self.store.lock();
        if let Some(pos) = state.pending.iter().position(|seq| *seq == self.append_seq) {
            state.pending.swap_remove(pos);
        }
        match state.pending.iter().min().copied() {
            Some(floor) => state.live.retain(|(seq, _)| *seq >= floor),
            None => state.live.clear(),
        }
    }
}

#[derive(Debug, Default)]
struct WaveLogState {
    /// Entries in arrival order.
    entries: Vec<WaveEntry>,
    /// Live appends made while a refresh is outstanding, tagged with their sequence number.
    live: Vec<(u64, WaveEntry)>,
    /// Start points of the outstanding refreshes.
    pending: Vec<u64>,
    /// Number of live appends ever accepted.
    append_seq: u64,
    /// Bumped on every mutation.
    version: u64,
}

/// Owner of the wave log and its mutation discipline
#[derive(Debug)]
pub struct WaveLogStore {
    state: Mutex<WaveLogState>,
    changes: watch::Sender<u64>,
}

impl WaveLogStore {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            state: Mutex::new(WaveLogState::default()),
            changes,
        }
    }

    fn lock(&self) -> MutexGuard<'_, WaveLogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &mut WaveLogState) {
        state.version += 1;
        self.changes.send_replace(state.version);
    }

    /// Swap the whole log for `entries`, kept in the order given.
    #[allow(dead_code)]
    pub fn replace_all(&self, entries: Vec<WaveEntry>) {
        let mut state = self.lock();
        debug!("Replacing wave log with {} entries", entries.len());
        state.entries = entries;
        state.live.clear();
        self.publish(&mut state);
    }

    /// Append one live entry.
    pub fn append(&self, entry: WaveEntry) {
        let mut state = self.lock();
        let seq = state.append_seq;
        state.append_seq += 1;
        if !state.pending.is_empty() {
            state.live.push((seq, entry.clone()));
        }
        state.entries.push(entry);
        self.publish(&mut state);
    }

    /// Record where a refresh starts. Take this before issuing the fetch.
    pub fn begin_refresh(&self) -> RefreshToken<'_> {
        let mut state = self.lock();
        let append_seq = state.append_seq;
        state.pending.push(append_seq);
        RefreshToken {
            store: self,
            append_seq,
        }
    }

    /// Install a fetch result that was requested at `token`.
    ///
    /// Live entries appended after `token` that the fetch result does not contain are kept,
    /// after the fetched entries, in their arrival order. Matching is by value and counts
    /// multiplicity, so a live entry the fetch already includes is not duplicated.
    pub fn replace_all_since(&self, token: RefreshToken<'_>, entries: Vec<WaveEntry>) {
        let mut state = self.lock();

        let mut unmatched: Vec<&WaveEntry> = entries.iter().collect();
        let missed: Vec<WaveEntry> = state
            .live
            .iter()
            .filter(|(seq, _)| *seq >= token.append_seq)
            .filter(|(_, entry)| {
                match unmatched.iter().position(|candidate| *candidate == entry) {
                    Some(pos) => {
                        unmatched.swap_remove(pos);
                        false
                    }
                    None => true,
                }
            })
            .map(|(_, entry)| entry.clone())
            .collect();

        if !missed.is_empty() {
            debug!(
                "Keeping {} live entries that arrived during refresh",
                missed.len()
            );
        }

        let mut merged = entries;
        merged.extend(missed);
        state.entries = merged;
        self.publish(&mut state);
        drop(state);
        drop(token);
    }

    /// Entries ordered by descending timestamp; equal timestamps keep arrival order.
    pub fn snapshot_sorted(&self) -> Vec<WaveEntry> {
        let mut snapshot = self.lock().entries.clone();
        snapshot.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        snapshot
    }

    /// Entries in arrival order.
    #[cfg(test)]
    pub fn snapshot(&self) -> Vec<WaveEntry> {
        self.lock().entries.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    pub fn version(&self) -> u64 {
        self.lock().version
    }

    /// Receiver of the store version, updated on each mutation.
    pub fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }
}

impl Default for WaveLogStore {
    fn default() -> Self {
        Self::new()
    }
}
