//! Trading configuration stored as a JSON document.
//!
//! Layout:
//! ```json
//! {
//!     "trading_pairs": ["BTC/USDT", "ETH/USDT"],
//!     "thresholds": { "BTC/USDT": { "upper": 70000.0, "lower": 60000.0 } },
//!     "ntfy_config": { "server": "https://ntfy.sh", "topic": "crypto_alerts" },
//!     "futures_mode": false
//! }
//! ```
//! A threshold of `0` means "not configured". The ntfy password is never
//! written to disk.

use super::write_atomic;
use crate::domain::alerts::NotificationSettings;
use crate::domain::errors::PairConfigError;
use crate::domain::market::{TradingPair, normalize_pair_symbol};
use crate::domain::repositories::ConfigRepository;
use anyhow::{Context, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ThresholdRecord {
    #[serde(default, with = "rust_decimal::serde::float")]
    upper: Decimal,
    #[serde(default, with = "rust_decimal::serde::float")]
    lower: Decimal,
}

impl ThresholdRecord {
    fn from_pair(pair: &TradingPair) -> Self {
        Self {
            upper: pair.upper.unwrap_or(Decimal::ZERO),
            lower: pair.lower.unwrap_or(Decimal::ZERO),
        }
    }
}

fn configured(value: Decimal) -> Option<Decimal> {
    (value > Decimal::ZERO).then_some(value)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    trading_pairs: Vec<String>,
    #[serde(default)]
    thresholds: BTreeMap<String, ThresholdRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ntfy_config: Option<NotificationSettings>,
    #[serde(default)]
    futures_mode: bool,
}

impl ConfigDocument {
    /// Normalizes symbols written by older versions and drops unreadable ones.
    fn normalized(self) -> Self {
        let mut trading_pairs: Vec<String> = Vec::with_capacity(self.trading_pairs.len());
        for raw in &self.trading_pairs {
            match normalize_pair_symbol(raw) {
                Ok(symbol) if !trading_pairs.contains(&symbol) => trading_pairs.push(symbol),
                Ok(_) => {}
                Err(e) => warn!("JsonConfigRepository: Skipping pair: {}", e),
            }
        }

        let thresholds = self
            .thresholds
            .into_iter()
            .filter_map(|(raw, record)| normalize_pair_symbol(&raw).ok().map(|s| (s, record)))
            .filter(|(symbol, _)| trading_pairs.contains(symbol))
            .collect();

        Self {
            trading_pairs,
            thresholds,
            ..self
        }
    }

    fn pair(&self, symbol: &str) -> TradingPair {
        let record = self.thresholds.get(symbol).cloned().unwrap_or_default();
        TradingPair {
            symbol: symbol.to_string(),
            upper: configured(record.upper),
            lower: configured(record.lower),
        }
    }
}

/// [`ConfigRepository`] backed by a JSON file.
///
/// The document is held in memory and rewritten atomically after every
/// mutation. A failed write rolls the in-memory document back.
pub struct JsonConfigRepository {
    path: PathBuf,
    document: Mutex<ConfigDocument>,
}

impl JsonConfigRepository {
    /// Opens `path`, creating an empty configuration file when it is missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let document = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read trading config {:?}", path))?;
            let document: ConfigDocument = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse trading config {:?}", path))?;
            document.normalized()
        } else {
            let document = ConfigDocument::default();
            write_document(&path, &document)?;
            info!("JsonConfigRepository: Created new configuration file {:?}", path);
            document
        };

        info!(
            "JsonConfigRepository: Loaded {} trading pairs from {:?}",
            document.trading_pairs.len(),
            path
        );
        Ok(Self {
            path,
            document: Mutex::new(document),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Applies `mutate` and persists; the previous document is restored on failure.
    async fn update<F>(&self, mutate: F) -> Result<(), PairConfigError>
    where
        F: FnOnce(&mut ConfigDocument) -> Result<(), PairConfigError>,
    {
        let mut document = self.document.lock().await;
        let previous = document.clone();
        mutate(&mut document)?;

        // The lock stays held across the write so file order matches mutation order.
        let path = self.path.clone();
        let snapshot = document.clone();
        let written = tokio::task::spawn_blocking(move || write_document(&path, &snapshot))
            .await
            .context("Trading config writer task failed")
            .and_then(|result| result);

        if let Err(e) = written {
            *document = previous;
            return Err(PairConfigError::Persistence(format!("{:#}", e)));
        }
        Ok(())
    }
}

fn write_document(path: &Path, document: &ConfigDocument) -> Result<()> {
    let content =
        serde_json::to_string_pretty(document).context("Failed to serialize trading config")?;
    write_atomic(path, &content)
}

#[async_trait]
impl ConfigRepository for JsonConfigRepository {
    async fn list_pairs(&self) -> Result<Vec<TradingPair>> {
        let document = self.document.lock().await;
        Ok(document
            .trading_pairs
            .iter()
            .map(|symbol| document.pair(symbol))
            .collect())
    }

    async fn add_pair(&self, pair: TradingPair) -> Result<(), PairConfigError> {
        self.update(|doc| {
            if doc.trading_pairs.contains(&pair.symbol) {
                return Err(PairConfigError::DuplicatePair {
                    symbol: pair.symbol.clone(),
                });
            }
            doc.trading_pairs.push(pair.symbol.clone());
            doc.thresholds
                .insert(pair.symbol.clone(), ThresholdRecord::from_pair(&pair));
            Ok(())
        })
        .await
    }

    async fn edit_pair(&self, pair: TradingPair) -> Result<(), PairConfigError> {
        self.update(|doc| {
            if !doc.trading_pairs.contains(&pair.symbol) {
                return Err(PairConfigError::PairNotFound {
                    symbol: pair.symbol.clone(),
                });
            }
            doc.thresholds
                .insert(pair.symbol.clone(), ThresholdRecord::from_pair(&pair));
            Ok(())
        })
        .await
    }

    async fn delete_pair(&self, symbol: &str) -> Result<(), PairConfigError> {
        self.update(|doc| {
            let before = doc.trading_pairs.len();
            doc.trading_pairs.retain(|s| s != symbol);
            if doc.trading_pairs.len() == before {
                return Err(PairConfigError::PairNotFound {
                    symbol: symbol.to_string(),
                });
            }
            doc.thresholds.remove(symbol);
            Ok(())
        })
        .await
    }

    async fn futures_mode(&self) -> Result<bool> {
        Ok(self.document.lock().await.futures_mode)
    }

    async fn set_futures_mode(&self, enabled: bool) -> Result<()> {
        self.update(|doc| {
            doc.futures_mode = enabled;
            Ok(())
        })
        .await
        .map_err(anyhow::Error::from)
    }

    async fn notification_settings(&self) -> Result<Option<NotificationSettings>> {
        Ok(self.document.lock().await.ntfy_config.clone())
    }

    async fn set_notification_settings(&self, settings: &NotificationSettings) -> Result<()> {
        self.update(|doc| {
            doc.ntfy_config = Some(settings.clone());
            Ok(())
        })
        .await
        .map_err(anyhow::Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_legacy_document_is_normalized() {
        let raw = r#"{
            "trading_pairs": ["BTC/USDT", "dot-usdt", "BTC/USDT", "??"],
            "thresholds": {
                "BTC/USDT": {"upper": 70000.0, "lower": 0},
                "DOT-USDT": {"upper": 0, "lower": 4.5},
                "GONE/USDT": {"upper": 1, "lower": 0}
            },
            "ntfy_config": {"server": "https://ntfy.sh", "topic": "crypto_alerts"}
        }"#;
        let doc: ConfigDocument = serde_json::from_str(raw).unwrap();
        let doc = doc.normalized();

        assert_eq!(doc.trading_pairs, vec!["BTC/USDT", "DOT/USDT"]);
        assert!(!doc.thresholds.contains_key("GONE/USDT"));
        assert!(!doc.futures_mode);

        let btc = doc.pair("BTC/USDT");
        assert_eq!(btc.upper, Some(dec!(70000)));
        assert_eq!(btc.lower, None);

        let dot = doc.pair("DOT/USDT");
        assert_eq!(dot.upper, None);
        assert_eq!(dot.lower, Some(dec!(4.5)));
    }

    #[test]
    fn test_unset_thresholds_are_written_as_zero() {
        let pair = TradingPair::new("ETH", Some(dec!(4000)), None).unwrap();
        let json = serde_json::to_value(ThresholdRecord::from_pair(&pair)).unwrap();
        assert_eq!(json["upper"], serde_json::json!(4000.0));
        assert_eq!(json["lower"], serde_json::json!(0.0));
    }

    #[tokio::test]
    async fn test_failed_write_rolls_back() {
        let root = std::env::temp_dir().join(format!("pricewatch-{}", uuid::Uuid::new_v4()));
        let dir = root.join("config");
        let repo = JsonConfigRepository::open(dir.join("trading_config.json")).unwrap();
        repo.add_pair(TradingPair::new("BTC", None, None).unwrap())
            .await
            .unwrap();

        // Replace the directory with a plain file so the next write fails.
        fs::remove_dir_all(&dir).unwrap();
        fs::write(&dir, "not a directory").unwrap();

        let result = repo
            .add_pair(TradingPair::new("ETH", None, None).unwrap())
            .await;
        assert!(matches!(result, Err(PairConfigError::Persistence(_))));
        let symbols: Vec<String> = repo
            .list_pairs()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.symbol)
            .collect();
        assert_eq!(symbols, vec!["BTC/USDT".to_string()]);

        let _ = fs::remove_dir_all(&root);
    }
}
