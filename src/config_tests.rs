use crate::config::{Config, Exchange};
use rust_decimal_macros::dec;
use std::env;
use std::sync::Mutex;
use std::sync::OnceLock;
use std::time::Duration;

// Global lock to prevent race conditions when modifying environment variables in tests
static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn get_env_lock() -> &'static Mutex<()> {
    ENV_LOCK.get_or_init(|| Mutex::new(()))
}

const KEYS: &[&str] = &[
    "PRICE_EXCHANGE",
    "FETCH_TIMEOUT_MS",
    "POLL_INTERVAL_MS",
    "BACKGROUND_POLL_INTERVAL_MS",
    "ALERT_COOLDOWN_SECS",
    "PERCENT_MOVE_THRESHOLD",
    "FUTURES_MODE",
    "NTFY_SERVER",
    "NTFY_TOPIC",
    "TRADING_CONFIG_PATH",
];

fn clear_env() {
    for key in KEYS {
        unsafe { env::remove_var(key) };
    }
}

#[test]
fn test_config_defaults() {
    let _guard = get_env_lock().lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    let config = Config::from_env().unwrap();

    assert_eq!(config.exchange, Exchange::Okx);
    assert_eq!(config.feed.fetch_timeout, Duration::from_secs(2));
    assert_eq!(config.monitor.poll_interval, Duration::from_secs(2));
    assert_eq!(config.monitor.background_poll_interval, Duration::from_secs(5));
    assert_eq!(config.monitor.alert_cooldown, Duration::from_secs(300));
    assert_eq!(config.monitor.move_threshold, dec!(0.05));
    assert!(!config.monitor.futures_mode);
    assert_eq!(config.notification.topic, "crypto_alerts");
    assert_eq!(
        config.storage.trading_config_path.to_str(),
        Some("trading_config.json")
    );
}

#[test]
fn test_config_overrides() {
    let _guard = get_env_lock().lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    unsafe {
        env::set_var("PRICE_EXCHANGE", "binance");
        env::set_var("POLL_INTERVAL_MS", "1500");
        env::set_var("PERCENT_MOVE_THRESHOLD", "0.03");
        env::set_var("FUTURES_MODE", "true");
        env::set_var("NTFY_SERVER", "https://ntfy.example.com/");
    }

    let config = Config::from_env().unwrap();

    assert_eq!(config.exchange, Exchange::Binance);
    assert_eq!(config.monitor.poll_interval, Duration::from_millis(1500));
    assert_eq!(config.monitor.alert_engine_config().move_threshold, dec!(0.03));
    assert!(config.monitor.futures_mode);
    assert_eq!(
        config.notification.settings().server,
        "https://ntfy.example.com"
    );

    clear_env();
}

#[test]
fn test_malformed_numbers_fall_back_to_defaults() {
    let _guard = get_env_lock().lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    unsafe {
        env::set_var("FETCH_TIMEOUT_MS", "soon");
        env::set_var("ALERT_COOLDOWN_SECS", "-5");
        env::set_var("PERCENT_MOVE_THRESHOLD", "-1");
    }

    let config = Config::from_env().unwrap();

    assert_eq!(config.feed.fetch_timeout, Duration::from_millis(2000));
    assert_eq!(config.monitor.alert_cooldown, Duration::from_secs(300));
    assert_eq!(config.monitor.move_threshold, dec!(0.05));

    clear_env();
}

#[test]
fn test_invalid_exchange_is_an_error() {
    let _guard = get_env_lock().lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    unsafe { env::set_var("PRICE_EXCHANGE", "kraken") };

    assert!(Config::from_env().is_err());

    clear_env();
}

#[test]
fn test_too_fast_polling_falls_back_to_defaults() {
    let _guard = get_env_lock().lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    unsafe {
        env::set_var("POLL_INTERVAL_MS", "0");
        env::set_var("BACKGROUND_POLL_INTERVAL_MS", "100");
    }

    let config = Config::from_env().unwrap();

    assert_eq!(config.monitor.poll_interval, Duration::from_secs(2));
    assert_eq!(config.monitor.background_poll_interval, Duration::from_secs(5));

    clear_env();
}
