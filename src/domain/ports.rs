use crate::domain::alerts::{NotificationMessage, NotificationSettings};
use crate::domain::errors::{FeedError, NotificationError};
use crate::domain::market::FeedMode;
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Upstream market-data feed able to quote a pair on the spot or derivative market.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    fn name(&self) -> &str;

    /// Last traded price for `symbol` (canonical `BASE/QUOTE`) on `mode`.
    ///
    /// Implementations must return [`FeedError::InstrumentNotFound`] only when
    /// the exchange explicitly reports that the instrument does not exist.
    async fn fetch_price(&self, symbol: &str, mode: FeedMode) -> Result<Decimal, FeedError>;
}

/// Push-notification collaborator. Delivery is best-effort.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &NotificationMessage) -> Result<(), NotificationError>;

    fn settings(&self) -> NotificationSettings;

    fn update_settings(&self, settings: NotificationSettings);
}
