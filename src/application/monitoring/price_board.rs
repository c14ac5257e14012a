use crate::domain::market::{FeedMode, PriceQuote};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SnapshotEntry {
    pub price: Decimal,
    pub mode: FeedMode,
    pub updated_at: DateTime<Utc>,
}

/// Latest known price per configured pair, for display.
///
/// `None` means the pair is configured but no price has been obtained yet.
pub type PriceSnapshot = HashMap<String, Option<SnapshotEntry>>;

/// Display board refreshed once per tick.
///
/// A failed fetch leaves the previous value in place; pairs no longer
/// configured are dropped on the next refresh.
#[derive(Debug, Default)]
pub struct PriceBoard {
    entries: RwLock<PriceSnapshot>,
}

impl PriceBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one tick's results. `results` maps every configured symbol
    /// to the quote obtained this tick, if any.
    pub fn refresh<'a>(&self, results: impl IntoIterator<Item = (&'a str, Option<PriceQuote>)>) {
        let mut guard = match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("PriceBoard: Lock poisoned during write, recovering");
                poisoned.into_inner()
            }
        };

        let mut next = PriceSnapshot::new();
        for (symbol, quote) in results {
            let entry = match quote {
                Some(q) => Some(SnapshotEntry {
                    price: q.price,
                    mode: q.mode,
                    updated_at: q.fetched_at,
                }),
                None => guard.get(symbol).copied().flatten(),
            };
            next.insert(symbol.to_string(), entry);
        }
        *guard = next;
    }

    pub fn snapshot(&self) -> PriceSnapshot {
        match self.entries.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn get(&self, symbol: &str) -> Option<SnapshotEntry> {
        match self.entries.read() {
            Ok(guard) => guard.get(symbol).copied().flatten(),
            Err(poisoned) => poisoned.into_inner().get(symbol).copied().flatten(),
        }
    }

    pub fn clear(&self) {
        match self.entries.write() {
            Ok(mut guard) => guard.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}
