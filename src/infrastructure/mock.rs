use crate::domain::alerts::{NotificationMessage, NotificationSettings};
use crate::domain::clock::Clock;
use crate::domain::errors::{FeedError, NotificationError};
use crate::domain::market::FeedMode;
use crate::domain::ports::{Notifier, PriceFeed};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::info;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Starts at 2024-01-01T00:00:00Z.
    pub fn new() -> Self {
        Self::starting_at(DateTime::from_timestamp(1_704_067_200, 0).unwrap_or_default())
    }

    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        let delta = chrono::Duration::from_std(by).unwrap_or(chrono::Duration::zero());
        let mut now = lock(&self.now);
        *now += delta;
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *lock(&self.now) = now;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *lock(&self.now)
    }
}

#[derive(Debug, Clone)]
enum Scripted {
    Price(Decimal),
    NotFound,
    Transient,
}

/// Scriptable price feed.
///
/// Every (pair, market) answers with whatever was scripted for it; anything
/// unscripted fails with a transient transport error.
#[derive(Default)]
pub struct MockPriceFeed {
    responses: Mutex<HashMap<(String, FeedMode), Scripted>>,
    calls: Mutex<Vec<(String, FeedMode)>>,
    delay: Mutex<Duration>,
}

impl MockPriceFeed {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self, symbol: &str, mode: FeedMode, response: Scripted) {
        lock(&self.responses).insert((symbol.to_string(), mode), response);
    }

    pub fn set_price(&self, symbol: &str, mode: FeedMode, price: Decimal) {
        self.script(symbol, mode, Scripted::Price(price));
    }

    /// The exchange will report that the instrument does not exist.
    pub fn set_not_found(&self, symbol: &str, mode: FeedMode) {
        self.script(symbol, mode, Scripted::NotFound);
    }

    pub fn set_transient(&self, symbol: &str, mode: FeedMode) {
        self.script(symbol, mode, Scripted::Transient);
    }

    /// Latency applied to every request.
    pub fn set_delay(&self, delay: Duration) {
        *lock(&self.delay) = delay;
    }

    pub fn call_count(&self, symbol: &str, mode: FeedMode) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|(s, m)| s == symbol && *m == mode)
            .count()
    }

    pub fn calls(&self) -> Vec<(String, FeedMode)> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl PriceFeed for MockPriceFeed {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_price(&self, symbol: &str, mode: FeedMode) -> Result<Decimal, FeedError> {
        lock(&self.calls).push((symbol.to_string(), mode));

        let delay = *lock(&self.delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let scripted = lock(&self.responses)
            .get(&(symbol.to_string(), mode))
            .cloned();
        match scripted {
            Some(Scripted::Price(price)) => Ok(price),
            Some(Scripted::NotFound) => Err(FeedError::InstrumentNotFound {
                feed: "mock".to_string(),
                instrument: format!("{} {}", symbol, mode),
            }),
            Some(Scripted::Transient) | None => Err(FeedError::Transport(format!(
                "no {} price scripted for {}",
                mode, symbol
            ))),
        }
    }
}

/// Notifier that keeps every message instead of delivering it.
pub struct RecordingNotifier {
    messages: Mutex<Vec<NotificationMessage>>,
    failing: AtomicBool,
    settings: Mutex<NotificationSettings>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
            settings: Mutex::new(NotificationSettings::default()),
        }
    }

    pub fn messages(&self) -> Vec<NotificationMessage> {
        lock(&self.messages).clone()
    }

    /// While failing, sends are rejected and nothing is recorded.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn clear(&self) {
        lock(&self.messages).clear();
    }
}

impl Default for RecordingNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: &NotificationMessage) -> Result<(), NotificationError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotificationError::Rejected {
                status: 503,
                body: "simulated outage".to_string(),
            });
        }
        info!("RecordingNotifier: {}", message);
        lock(&self.messages).push(message.clone());
        Ok(())
    }

    fn settings(&self) -> NotificationSettings {
        lock(&self.settings).clone()
    }

    fn update_settings(&self, settings: NotificationSettings) {
        *lock(&self.settings) = settings;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new();
        let start = clock.now();
        clock.advance(Duration::from_secs(10));
        assert_eq!((clock.now() - start).num_seconds(), 10);
    }

    #[tokio::test]
    async fn test_mock_feed_scripts_and_counts() {
        let feed = MockPriceFeed::new();
        feed.set_price("BTC/USDT", FeedMode::Spot, dec!(67000));
        feed.set_not_found("DOGE/USDT", FeedMode::Derivative);

        assert_eq!(feed.fetch_price("BTC/USDT", FeedMode::Spot).await, Ok(dec!(67000)));
        assert!(
            feed.fetch_price("DOGE/USDT", FeedMode::Derivative)
                .await
                .unwrap_err()
                .is_authoritative()
        );
        assert!(
            !feed.fetch_price("ETH/USDT", FeedMode::Spot)
                .await
                .unwrap_err()
                .is_authoritative()
        );
        assert_eq!(feed.call_count("BTC/USDT", FeedMode::Spot), 1);
        assert_eq!(feed.calls().len(), 3);
    }
}
