//! Per-(bot, symbol) state shared by the partial-close strategy
//!
//! All three maps are keyed by [`BotSymbolKey`]. Mutations are expected to
//! happen while the caller holds the key's lock from [`KeyedLocks`], so the
//! maps themselves only need shard-level synchronization.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::common::types::BotSymbolKey;

/// One async mutex per key
///
/// Holding the guard serializes guard-check, exchange call and store
/// mutation for a key while other keys proceed in parallel. An entry is
/// created for every key ever acquired; [`prune_idle`] drops the ones
/// nobody holds or waits on.
///
/// [`prune_idle`]: KeyedLocks::prune_idle
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: DashMap<BotSymbolKey, Arc<Mutex<()>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`
    pub async fn acquire(&self, key: &BotSymbolKey) -> OwnedMutexGuard<()> {
        // Clone the Arc out so no shard lock is held across the await.
        let lock = self.locks.entry(key.clone()).or_default().value().clone();
        lock.lock_owned().await
    }

    /// Drop locks that are neither held nor awaited; returns how many
    pub fn prune_idle(&self) -> usize {
        let before = self.locks.len();
        // Holders and waiters own a clone, so a count of 1 means idle.
        // Cloning happens under the shard lock, which retain also takes.
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        before.saturating_sub(self.locks.len())
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Entry-block deadlines with lazy expiry
///
/// Nothing sweeps this map in the background. An entry is dropped when it is
/// read at or after its deadline, or by an explicit [`purge_expired`] call.
///
/// [`purge_expired`]: EntryBlocks::purge_expired
#[derive(Debug, Default)]
pub struct EntryBlocks {
    blocked_until: DashMap<BotSymbolKey, DateTime<Utc>>,
}

impl EntryBlocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block entries for `key` until `until`, replacing any earlier block
    pub fn block(&self, key: BotSymbolKey, until: DateTime<Utc>) {
        self.blocked_until.insert(key, until);
    }

    /// Live deadline for `key`, removing the entry if it has expired
    pub fn blocked_until(&self, key: &BotSymbolKey, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let until = *self.blocked_until.get(key)?;
        if now >= until {
            self.blocked_until.remove_if(key, |_, v| *v <= now);
            return None;
        }
        Some(until)
    }

    pub fn is_blocked(&self, key: &BotSymbolKey, now: DateTime<Utc>) -> bool {
        self.blocked_until(key, now).is_some()
    }

    /// Drop every expired entry; returns how many were removed
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.blocked_until.len();
        self.blocked_until.retain(|_, until| *until > now);
        before.saturating_sub(self.blocked_until.len())
    }

    /// Stored entries, including expired ones not yet read
    pub fn len(&self) -> usize {
        self.blocked_until.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocked_until.is_empty()
    }
}

/// Close-signal progress for an open position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartialCloseState {
    pub close_count: u32,
    pub last_update: DateTime<Utc>,
}

/// Partial-close counters, created lazily and cleared on full close
#[derive(Debug, Default)]
pub struct CloseCounters {
    states: DashMap<BotSymbolKey, PartialCloseState>,
}

impl CloseCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current count, 0 when no state exists yet
    pub fn count(&self, key: &BotSymbolKey) -> u32 {
        self.states.get(key).map(|s| s.close_count).unwrap_or(0)
    }

    pub fn get(&self, key: &BotSymbolKey) -> Option<PartialCloseState> {
        self.states.get(key).map(|s| *s)
    }

    pub fn set(&self, key: BotSymbolKey, close_count: u32, now: DateTime<Utc>) {
        self.states.insert(
            key,
            PartialCloseState {
                close_count,
                last_update: now,
            },
        );
    }

    pub fn clear(&self, key: &BotSymbolKey) {
        self.states.remove(key);
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
