use crate::domain::clock::{Clock, elapsed_between};
use crate::domain::market::FeedMode;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Latest fetched price for a pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheEntry {
    pub price: Decimal,
    pub mode: FeedMode,
    pub fetched_at: DateTime<Utc>,
}

/// Short-lived memo of the latest fetched price per pair.
///
/// Entries expire after `ttl`. The whole cache is cleared whenever the
/// authoritative feed for a pair may have changed (session start, mode
/// toggle, pair list mutation).
///
/// Every `clear()` starts a new epoch. Writers capture [`PriceCache::epoch`]
/// before fetching and `put` drops their result if a clear happened since.
pub struct PriceCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    state: RwLock<CacheState>,
}

#[derive(Default)]
struct CacheState {
    epoch: u64,
    entries: HashMap<String, CacheEntry>,
}

impl std::fmt::Debug for PriceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriceCache")
            .field("ttl", &self.ttl)
            .field("state", &"<RwLock>")
            .finish()
    }
}

impl PriceCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            state: RwLock::new(CacheState::default()),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, CacheState> {
        match self.state.read() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, CacheState> {
        match self.state.write() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::error!("PriceCache: Lock poisoned during write, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Current epoch; capture it before an upstream fetch and hand it to `put`.
    pub fn epoch(&self) -> u64 {
        self.read().epoch
    }

    /// Cached entry for `symbol` if it is younger than the TTL.
    pub fn get(&self, symbol: &str) -> Option<CacheEntry> {
        let now = self.clock.now();
        self.read()
            .entries
            .get(symbol)
            .filter(|entry| elapsed_between(entry.fetched_at, now) < self.ttl)
            .copied()
    }

    /// Stores a price fetched during `epoch`. The entry is returned but not
    /// stored if the cache was cleared after `epoch` was captured.
    pub fn put(&self, symbol: &str, price: Decimal, mode: FeedMode, epoch: u64) -> CacheEntry {
        let entry = CacheEntry {
            price,
            mode,
            fetched_at: self.clock.now(),
        };

        let mut state = self.write();
        if state.epoch == epoch {
            state.entries.insert(symbol.to_string(), entry);
        } else {
            tracing::debug!(
                "PriceCache: Dropping {} price fetched before the last clear",
                symbol
            );
        }
        entry
    }

    pub fn clear(&self) {
        let mut state = self.write();
        if !state.entries.is_empty() {
            tracing::debug!("PriceCache: Clearing {} entries", state.entries.len());
        }
        state.entries.clear();
        state.epoch += 1;
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
