use super::write_atomic;
use crate::domain::market::normalize_pair_symbol;
use crate::domain::repositories::NoFuturesRepository;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Serialize, Deserialize)]
struct NoFuturesDocument {
    /// Older files list bare coins under `coins`; they are normalized to pairs on load.
    #[serde(default, alias = "coins")]
    pairs: Vec<String>,
    /// Informational only; older writers stored a naive local timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_updated: Option<String>,
}

/// Pairs without a derivatives feed, persisted as JSON.
pub struct JsonNoFuturesRepository {
    path: PathBuf,
}

impl JsonNoFuturesRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl NoFuturesRepository for JsonNoFuturesRepository {
    async fn load(&self) -> Result<BTreeSet<String>> {
        if !self.path.exists() {
            return Ok(BTreeSet::new());
        }

        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read {:?}", self.path))?;
        let document: NoFuturesDocument = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {:?}", self.path))?;

        Ok(document
            .pairs
            .iter()
            .filter_map(|raw| match normalize_pair_symbol(raw) {
                Ok(symbol) => Some(symbol),
                Err(e) => {
                    warn!("JsonNoFuturesRepository: Skipping entry: {}", e);
                    None
                }
            })
            .collect())
    }

    async fn save(&self, pairs: &BTreeSet<String>) -> Result<()> {
        let document = NoFuturesDocument {
            pairs: pairs.iter().cloned().collect(),
            last_updated: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
        };
        let content = serde_json::to_string_pretty(&document)
            .context("Failed to serialize no-futures set")?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, &content))
            .await
            .context("No-futures writer task failed")?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_coins_field_is_accepted() {
        let doc: NoFuturesDocument =
            serde_json::from_str(r#"{"coins": ["DOGE", "XCH"], "last_updated": "2024-05-01T12:00:00.123456"}"#)
                .unwrap();
        assert_eq!(doc.pairs, vec!["DOGE", "XCH"]);
        assert!(doc.last_updated.is_some());
    }
}
