use crate::domain::repositories::NoFuturesRepository;
use anyhow::Result;
use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Pairs known to have no derivatives feed.
///
/// Append-only during normal operation. Every new entry is written through
/// to the injected repository; persistence failures are logged and the
/// in-memory knowledge is kept.
pub struct NoFuturesSet {
    pairs: RwLock<BTreeSet<String>>,
    store: Arc<dyn NoFuturesRepository>,
    // Serializes write-through so the last write always carries the newest set.
    persist_lock: Mutex<()>,
}

impl NoFuturesSet {
    /// Loads the persisted set. A load failure starts from an empty set.
    pub async fn load(store: Arc<dyn NoFuturesRepository>) -> Self {
        let pairs = match store.load().await {
            Ok(pairs) => {
                info!(
                    "NoFuturesSet: Loaded {} pairs without a derivatives feed",
                    pairs.len()
                );
                pairs
            }
            Err(e) => {
                warn!("NoFuturesSet: Failed to load persisted set, starting empty: {}", e);
                BTreeSet::new()
            }
        };
        Self::with_pairs(pairs, store)
    }

    pub fn with_pairs(pairs: BTreeSet<String>, store: Arc<dyn NoFuturesRepository>) -> Self {
        Self {
            pairs: RwLock::new(pairs),
            store,
            persist_lock: Mutex::new(()),
        }
    }

    pub fn contains(&self, symbol: &str) -> bool {
        match self.pairs.read() {
            Ok(guard) => guard.contains(symbol),
            Err(poisoned) => poisoned.into_inner().contains(symbol),
        }
    }

    /// Records `symbol` as lacking a derivatives feed. Returns `true` if it was new.
    pub async fn record(&self, symbol: &str) -> bool {
        let inserted = match self.pairs.write() {
            Ok(mut guard) => guard.insert(symbol.to_string()),
            Err(poisoned) => poisoned.into_inner().insert(symbol.to_string()),
        };

        if inserted {
            info!("NoFuturesSet: Learned that {} has no derivatives feed", symbol);
            if let Err(e) = self.persist().await {
                warn!("NoFuturesSet: Failed to persist after adding {}: {}", symbol, e);
            }
        }
        inserted
    }

    async fn persist(&self) -> Result<()> {
        let _guard = self.persist_lock.lock().await;
        let snapshot = self.snapshot_set();
        self.store.save(&snapshot).await
    }

    fn snapshot_set(&self) -> BTreeSet<String> {
        match self.pairs.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Sorted list of known pairs.
    pub fn snapshot(&self) -> Vec<String> {
        self.snapshot_set().into_iter().collect()
    }

    pub fn len(&self) -> usize {
        match self.pairs.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
