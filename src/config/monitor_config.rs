//! Monitoring cadence and alert tuning.

use super::env_or;
use crate::application::alerts::AlertEngineConfig;
use crate::application::monitoring::PollSettings;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::time::Duration;

/// Shortest accepted polling period; anything faster hammers the exchange.
pub const MIN_POLL_INTERVAL_MS: u64 = 250;

fn poll_interval_or(key: &str, default_ms: u64) -> Duration {
    let ms = env_or(key, default_ms);
    if ms < MIN_POLL_INTERVAL_MS {
        tracing::warn!(
            "MonitorEnvConfig: {}={} is below {}ms, using {}ms",
            key,
            ms,
            MIN_POLL_INTERVAL_MS,
            default_ms
        );
        return Duration::from_millis(default_ms);
    }
    Duration::from_millis(ms)
}

#[derive(Debug, Clone)]
pub struct MonitorEnvConfig {
    pub poll_interval: Duration,
    pub background_poll_interval: Duration,
    pub cache_ttl: Duration,
    pub alert_cooldown: Duration,
    pub price_window: Duration,
    /// Fractional move over `price_window` that triggers an alert (0.05 = 5%).
    pub move_threshold: Decimal,
    /// Start in futures mode when no persisted mode exists.
    pub futures_mode: bool,
}

impl Default for MonitorEnvConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(2000),
            background_poll_interval: Duration::from_millis(5000),
            cache_ttl: Duration::from_millis(2000),
            alert_cooldown: Duration::from_secs(300),
            price_window: Duration::from_secs(300),
            move_threshold: dec!(0.05),
            futures_mode: false,
        }
    }
}

impl MonitorEnvConfig {
    pub fn from_env() -> Self {
        let mut move_threshold = env_or("PERCENT_MOVE_THRESHOLD", dec!(0.05));
        if move_threshold <= Decimal::ZERO {
            tracing::warn!(
                "MonitorEnvConfig: PERCENT_MOVE_THRESHOLD must be positive, using 0.05"
            );
            move_threshold = dec!(0.05);
        }

        Self {
            poll_interval: poll_interval_or("POLL_INTERVAL_MS", 2000),
            background_poll_interval: poll_interval_or("BACKGROUND_POLL_INTERVAL_MS", 5000),
            cache_ttl: Duration::from_millis(env_or("PRICE_CACHE_TTL_MS", 2000)),
            alert_cooldown: Duration::from_secs(env_or("ALERT_COOLDOWN_SECS", 300)),
            price_window: Duration::from_secs(env_or("PRICE_WINDOW_SECS", 300)),
            move_threshold,
            futures_mode: env_or("FUTURES_MODE", false),
        }
    }

    pub fn alert_engine_config(&self) -> AlertEngineConfig {
        AlertEngineConfig {
            cooldown: self.alert_cooldown,
            window_span: self.price_window,
            move_threshold: self.move_threshold,
            ..AlertEngineConfig::default()
        }
    }

    pub fn poll_settings(&self, fetch_concurrency: usize) -> PollSettings {
        PollSettings {
            foreground: self.poll_interval,
            background: self.background_poll_interval,
            fetch_concurrency,
        }
    }
}
