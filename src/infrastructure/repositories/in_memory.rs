//! In-Memory Repository Implementations
//!
//! Thread-safe, in-memory implementations of the repository traits defined
//! in `domain::repositories`, for tests. Nothing survives a restart; the
//! running server always persists through `infrastructure::persistence`.

use crate::domain::alerts::NotificationSettings;
use crate::domain::errors::PairConfigError;
use crate::domain::market::TradingPair;
use crate::domain::repositories::{ConfigRepository, NoFuturesRepository};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// In-memory implementation of ConfigRepository
pub struct InMemoryConfigRepository {
    pairs: RwLock<Vec<TradingPair>>,
    futures_mode: AtomicBool,
    notification: RwLock<Option<NotificationSettings>>,
}

impl InMemoryConfigRepository {
    pub fn new() -> Self {
        Self::with_pairs(Vec::new())
    }

    pub fn with_pairs(pairs: Vec<TradingPair>) -> Self {
        Self {
            pairs: RwLock::new(pairs),
            futures_mode: AtomicBool::new(false),
            notification: RwLock::new(None),
        }
    }
}

impl Default for InMemoryConfigRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigRepository for InMemoryConfigRepository {
    async fn list_pairs(&self) -> Result<Vec<TradingPair>> {
        Ok(self.pairs.read().await.clone())
    }

    async fn add_pair(&self, pair: TradingPair) -> Result<(), PairConfigError> {
        let mut pairs = self.pairs.write().await;
        if pairs.iter().any(|p| p.symbol == pair.symbol) {
            return Err(PairConfigError::DuplicatePair {
                symbol: pair.symbol,
            });
        }
        pairs.push(pair);
        Ok(())
    }

    async fn edit_pair(&self, pair: TradingPair) -> Result<(), PairConfigError> {
        let mut pairs = self.pairs.write().await;
        match pairs.iter_mut().find(|p| p.symbol == pair.symbol) {
            Some(existing) => {
                *existing = pair;
                Ok(())
            }
            None => Err(PairConfigError::PairNotFound {
                symbol: pair.symbol,
            }),
        }
    }

    async fn delete_pair(&self, symbol: &str) -> Result<(), PairConfigError> {
        let mut pairs = self.pairs.write().await;
        let before = pairs.len();
        pairs.retain(|p| p.symbol != symbol);
        if pairs.len() == before {
            return Err(PairConfigError::PairNotFound {
                symbol: symbol.to_string(),
            });
        }
        Ok(())
    }

    async fn futures_mode(&self) -> Result<bool> {
        Ok(self.futures_mode.load(Ordering::SeqCst))
    }

    async fn set_futures_mode(&self, enabled: bool) -> Result<()> {
        self.futures_mode.store(enabled, Ordering::SeqCst);
        Ok(())
    }

    async fn notification_settings(&self) -> Result<Option<NotificationSettings>> {
        Ok(self.notification.read().await.clone())
    }

    async fn set_notification_settings(&self, settings: &NotificationSettings) -> Result<()> {
        *self.notification.write().await = Some(settings.clone());
        Ok(())
    }
}

/// In-memory implementation of NoFuturesRepository.
///
/// Counts saves and can be told to fail them, so write-through behaviour is
/// observable from tests.
pub struct InMemoryNoFuturesRepository {
    stored: Mutex<BTreeSet<String>>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl InMemoryNoFuturesRepository {
    pub fn new() -> Self {
        Self::with_pairs(&[])
    }

    pub fn with_pairs(pairs: &[&str]) -> Self {
        Self {
            stored: Mutex::new(pairs.iter().map(|p| p.to_string()).collect()),
            saves: AtomicUsize::new(0),
            fail_saves: AtomicBool::new(false),
        }
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn stored(&self) -> BTreeSet<String> {
        match self.stored.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

impl Default for InMemoryNoFuturesRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NoFuturesRepository for InMemoryNoFuturesRepository {
    async fn load(&self) -> Result<BTreeSet<String>> {
        Ok(self.stored())
    }

    async fn save(&self, pairs: &BTreeSet<String>) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            anyhow::bail!("simulated write failure");
        }
        match self.stored.lock() {
            Ok(mut guard) => *guard = pairs.clone(),
            Err(poisoned) => *poisoned.into_inner() = pairs.clone(),
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_config_repository_crud() {
        let repo = InMemoryConfigRepository::new();
        let btc = TradingPair::new("BTC", None, None).unwrap();

        repo.add_pair(btc.clone()).await.unwrap();
        assert!(matches!(
            repo.add_pair(btc.clone()).await,
            Err(PairConfigError::DuplicatePair { .. })
        ));

        let missing = TradingPair::new("ETH", None, None).unwrap();
        assert!(matches!(
            repo.edit_pair(missing).await,
            Err(PairConfigError::PairNotFound { .. })
        ));

        repo.delete_pair("BTC/USDT").await.unwrap();
        assert!(repo.list_pairs().await.unwrap().is_empty());
    }
}
