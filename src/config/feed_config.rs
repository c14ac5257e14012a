//! Price feed configuration parsing from environment variables.

use super::env_or;
use std::env;
use std::time::Duration;

/// Exchange endpoints and request behaviour.
#[derive(Debug, Clone)]
pub struct FeedEnvConfig {
    pub okx_base_url: String,
    pub binance_spot_url: String,
    pub binance_futures_url: String,
    /// Upper bound on a single upstream price request.
    pub fetch_timeout: Duration,
    pub fetch_concurrency: usize,
    /// Minimum spacing between two upstream requests of the same feed.
    pub min_request_interval: Duration,
}

impl Default for FeedEnvConfig {
    fn default() -> Self {
        Self {
            okx_base_url: "https://www.okx.com".to_string(),
            binance_spot_url: "https://api.binance.com".to_string(),
            binance_futures_url: "https://fapi.binance.com".to_string(),
            fetch_timeout: Duration::from_millis(2000),
            fetch_concurrency: 4,
            min_request_interval: Duration::from_millis(100),
        }
    }
}

impl FeedEnvConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            okx_base_url: env::var("OKX_BASE_URL").unwrap_or(defaults.okx_base_url),
            binance_spot_url: env::var("BINANCE_SPOT_URL").unwrap_or(defaults.binance_spot_url),
            binance_futures_url: env::var("BINANCE_FUTURES_URL")
                .unwrap_or(defaults.binance_futures_url),
            fetch_timeout: Duration::from_millis(env_or("FETCH_TIMEOUT_MS", 2000)),
            fetch_concurrency: env_or("FETCH_CONCURRENCY", 4usize).max(1),
            min_request_interval: Duration::from_millis(env_or("MIN_REQUEST_INTERVAL_MS", 100)),
        }
    }
}
