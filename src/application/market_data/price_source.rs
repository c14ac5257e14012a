use super::fallback_learner::NoFuturesSet;
use super::price_cache::PriceCache;
use crate::domain::errors::FeedError;
use crate::domain::market::{FeedMode, PriceQuote, round_price};
use crate::domain::ports::PriceFeed;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Resolves the current price of a pair, choosing between the derivatives
/// and spot feeds and learning which pairs have no derivatives feed.
///
/// Lookup order:
/// 1. Price cache (no upstream call on a hit)
/// 2. Derivatives feed, unless spot was requested or the pair is known to lack one
/// 3. Spot feed, either directly or as fallback after an authoritative "not found"
///
/// Transient failures are returned as errors and never teach the fallback set.
pub struct PriceSourceAdapter {
    feed: Arc<dyn PriceFeed>,
    no_futures: Arc<NoFuturesSet>,
    cache: Arc<PriceCache>,
    fetch_timeout: Duration,
}

impl PriceSourceAdapter {
    pub fn new(
        feed: Arc<dyn PriceFeed>,
        no_futures: Arc<NoFuturesSet>,
        cache: Arc<PriceCache>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            feed,
            no_futures,
            cache,
            fetch_timeout,
        }
    }

    pub async fn fetch_price(
        &self,
        symbol: &str,
        want_derivative: bool,
    ) -> Result<PriceQuote, FeedError> {
        let epoch = self.cache.epoch();
        if let Some(entry) = self.cache.get(symbol)
            && entry.mode == self.expected_mode(symbol, want_derivative)
        {
            return Ok(PriceQuote {
                price: entry.price,
                mode: entry.mode,
                fetched_at: entry.fetched_at,
                from_cache: true,
            });
        }

        let (price, mode) = if want_derivative {
            self.fetch_with_fallback(symbol).await?
        } else {
            (self.fetch_from(symbol, FeedMode::Spot).await?, FeedMode::Spot)
        };

        let price = round_price(symbol, price);
        let entry = self.cache.put(symbol, price, mode, epoch);
        Ok(PriceQuote {
            price,
            mode,
            fetched_at: entry.fetched_at,
            from_cache: false,
        })
    }

    /// Market a cached price must come from to answer this request.
    fn expected_mode(&self, symbol: &str, want_derivative: bool) -> FeedMode {
        if want_derivative && !self.no_futures.contains(symbol) {
            FeedMode::Derivative
        } else {
            FeedMode::Spot
        }
    }

    async fn fetch_with_fallback(&self, symbol: &str) -> Result<(Decimal, FeedMode), FeedError> {
        if self.no_futures.contains(symbol) {
            debug!(
                "PriceSourceAdapter: {} has no derivatives feed, using spot price",
                symbol
            );
            let price = self.fetch_from(symbol, FeedMode::Spot).await?;
            return Ok((price, FeedMode::Spot));
        }

        match self.fetch_from(symbol, FeedMode::Derivative).await {
            Ok(price) => Ok((price, FeedMode::Derivative)),
            Err(e) if e.is_authoritative() => {
                info!(
                    "PriceSourceAdapter: {} reported no derivatives instrument ({}), falling back to spot",
                    symbol, e
                );
                self.no_futures.record(symbol).await;
                let price = self.fetch_from(symbol, FeedMode::Spot).await?;
                Ok((price, FeedMode::Spot))
            }
            Err(e) => Err(e),
        }
    }

    async fn fetch_from(&self, symbol: &str, mode: FeedMode) -> Result<Decimal, FeedError> {
        let result = tokio::time::timeout(self.fetch_timeout, self.feed.fetch_price(symbol, mode))
            .await
            .unwrap_or_else(|_| {
                Err(FeedError::Timeout {
                    duration_ms: self.fetch_timeout.as_millis() as u64,
                })
            });

        match result {
            Ok(price) if price > Decimal::ZERO => Ok(price),
            Ok(price) => Err(FeedError::InvalidPayload {
                instrument: symbol.to_string(),
                reason: format!("non-positive price {}", price),
            }),
            Err(e) => {
                if !e.is_authoritative() {
                    warn!(
                        "PriceSourceAdapter: {} {} fetch from {} failed: {}",
                        symbol,
                        mode,
                        self.feed.name(),
                        e
                    );
                }
                Err(e)
            }
        }
    }

    pub fn no_futures(&self) -> &Arc<NoFuturesSet> {
        &self.no_futures
    }

    pub fn cache(&self) -> &Arc<PriceCache> {
        &self.cache
    }
}
