//! Repository Pattern Abstractions
//!
//! The monitoring core never touches the filesystem directly. It reads and
//! mutates its configuration through these traits:
//! - `ConfigRepository`: monitored pairs, operating mode, notification target
//! - `NoFuturesRepository`: persisted set of pairs without a derivatives feed
//!
//! JSON-file implementations live in `infrastructure::persistence`, in-memory
//! ones in `infrastructure::repositories`.

use crate::domain::alerts::NotificationSettings;
use crate::domain::errors::PairConfigError;
use crate::domain::market::TradingPair;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeSet;

#[async_trait]
pub trait ConfigRepository: Send + Sync {
    /// All monitored pairs, in insertion order.
    async fn list_pairs(&self) -> Result<Vec<TradingPair>>;

    /// Adds a new pair. Fails with `DuplicatePair` if the symbol exists.
    async fn add_pair(&self, pair: TradingPair) -> Result<(), PairConfigError>;

    /// Replaces the thresholds of an existing pair.
    async fn edit_pair(&self, pair: TradingPair) -> Result<(), PairConfigError>;

    async fn delete_pair(&self, symbol: &str) -> Result<(), PairConfigError>;

    async fn futures_mode(&self) -> Result<bool>;

    async fn set_futures_mode(&self, enabled: bool) -> Result<()>;

    async fn notification_settings(&self) -> Result<Option<NotificationSettings>>;

    async fn set_notification_settings(&self, settings: &NotificationSettings) -> Result<()>;
}

#[async_trait]
pub trait NoFuturesRepository: Send + Sync {
    async fn load(&self) -> Result<BTreeSet<String>>;

    async fn save(&self, pairs: &BTreeSet<String>) -> Result<()>;
}
