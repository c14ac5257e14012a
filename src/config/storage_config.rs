use std::env;
use std::path::PathBuf;

/// Locations of the JSON files backing the pair list and the no-futures set.
#[derive(Debug, Clone)]
pub struct StorageEnvConfig {
    pub trading_config_path: PathBuf,
    pub no_futures_path: PathBuf,
}

impl Default for StorageEnvConfig {
    fn default() -> Self {
        Self {
            trading_config_path: PathBuf::from("trading_config.json"),
            no_futures_path: PathBuf::from("no_futures_coins.json"),
        }
    }
}

impl StorageEnvConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            trading_config_path: env::var("TRADING_CONFIG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.trading_config_path),
            no_futures_path: env::var("NO_FUTURES_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.no_futures_path),
        }
    }
}
