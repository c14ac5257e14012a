//! Configuration module for pricewatch.
//!
//! Loads structured configuration from environment variables, organized by
//! concern: price feeds, monitoring cadence and alert tuning, notifications
//! and on-disk storage.

mod feed_config;
mod monitor_config;
mod notification_config;
mod storage_config;

pub use feed_config::FeedEnvConfig;
pub use monitor_config::MonitorEnvConfig;
pub use notification_config::NotificationEnvConfig;
pub use storage_config::StorageEnvConfig;

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

/// Which upstream exchange serves prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exchange {
    Okx,
    Binance,
    Mock,
}

impl FromStr for Exchange {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "okx" => Ok(Exchange::Okx),
            "binance" => Ok(Exchange::Binance),
            "mock" => Ok(Exchange::Mock),
            _ => anyhow::bail!(
                "Invalid PRICE_EXCHANGE: {}. Must be 'okx', 'binance', or 'mock'",
                s
            ),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub exchange: Exchange,
    pub feed: FeedEnvConfig,
    pub monitor: MonitorEnvConfig,
    pub notification: NotificationEnvConfig,
    pub storage: StorageEnvConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let exchange_str = env::var("PRICE_EXCHANGE").unwrap_or_else(|_| "okx".to_string());
        let exchange = Exchange::from_str(&exchange_str).context("Failed to load feed config")?;

        Ok(Self {
            exchange,
            feed: FeedEnvConfig::from_env(),
            monitor: MonitorEnvConfig::from_env(),
            notification: NotificationEnvConfig::from_env(),
            storage: StorageEnvConfig::from_env(),
        })
    }
}

/// Reads `key` and parses it, falling back to `default` when the variable is
/// missing or malformed.
pub(crate) fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}
