//! Binance Market Data Feed
//!
//! Last-trade prices from the public ticker endpoints:
//! - Spot: `{spot}/api/v3/ticker/price`
//! - USD-M perpetual futures: `{futures}/fapi/v1/ticker/price`

use super::common::{ApiError, CODE_INVALID_SYMBOL, FEED_NAME, binance_symbol};
use crate::domain::errors::FeedError;
use crate::domain::market::FeedMode;
use crate::domain::ports::PriceFeed;
use crate::infrastructure::core::RequestPacer;
use crate::infrastructure::core::http_client_factory::{
    HttpClientFactory, build_url_with_query, feed_transport_error,
};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct PriceTicker {
    price: String,
}

/// Turns a raw ticker response into a price or a classified error.
///
/// Only HTTP 400 carrying code `-1121` ("Invalid symbol") is authoritative.
pub fn interpret_ticker_response(
    symbol: &str,
    status: u16,
    body: &str,
) -> Result<Decimal, FeedError> {
    match status {
        200..=299 => {
            let ticker: PriceTicker =
                serde_json::from_str(body).map_err(|e| FeedError::InvalidPayload {
                    instrument: symbol.to_string(),
                    reason: e.to_string(),
                })?;
            Decimal::from_str_exact(ticker.price.trim()).map_err(|e| FeedError::InvalidPayload {
                instrument: symbol.to_string(),
                reason: format!("unparseable price '{}': {}", ticker.price, e),
            })
        }
        418 | 429 => Err(FeedError::RateLimited {
            feed: FEED_NAME.to_string(),
        }),
        _ => match serde_json::from_str::<ApiError>(body) {
            Ok(err) if status == 400 && err.code == CODE_INVALID_SYMBOL => {
                Err(FeedError::InstrumentNotFound {
                    feed: FEED_NAME.to_string(),
                    instrument: symbol.to_string(),
                })
            }
            Ok(err) => Err(FeedError::Upstream {
                feed: FEED_NAME.to_string(),
                code: err.code.to_string(),
                message: err.msg,
            }),
            Err(_) => Err(FeedError::Http {
                feed: FEED_NAME.to_string(),
                status,
                body: body.chars().take(200).collect(),
            }),
        },
    }
}

pub struct BinancePriceFeed {
    client: ClientWithMiddleware,
    spot_url: String,
    futures_url: String,
    timeout: Duration,
    pacer: RequestPacer,
}

impl BinancePriceFeed {
    pub fn builder() -> BinancePriceFeedBuilder {
        BinancePriceFeedBuilder::default()
    }

    fn ticker_url(&self, mode: FeedMode) -> String {
        match mode {
            FeedMode::Spot => format!("{}/api/v3/ticker/price", self.spot_url),
            FeedMode::Derivative => format!("{}/fapi/v1/ticker/price", self.futures_url),
        }
    }
}

#[derive(Default)]
pub struct BinancePriceFeedBuilder {
    spot_url: Option<String>,
    futures_url: Option<String>,
    timeout: Option<Duration>,
    min_interval: Option<Duration>,
}

impl BinancePriceFeedBuilder {
    pub fn spot_url(mut self, url: impl Into<String>) -> Self {
        self.spot_url = Some(url.into());
        self
    }

    pub fn futures_url(mut self, url: impl Into<String>) -> Self {
        self.futures_url = Some(url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = Some(interval);
        self
    }

    pub fn build(self) -> BinancePriceFeed {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(2));
        let trim = |url: String| url.trim_end_matches('/').to_string();

        BinancePriceFeed {
            client: HttpClientFactory::create_feed_client(timeout),
            spot_url: trim(
                self.spot_url
                    .unwrap_or_else(|| "https://api.binance.com".to_string()),
            ),
            futures_url: trim(
                self.futures_url
                    .unwrap_or_else(|| "https://fapi.binance.com".to_string()),
            ),
            timeout,
            pacer: RequestPacer::new(self.min_interval.unwrap_or(Duration::from_millis(100))),
        }
    }
}

#[async_trait]
impl PriceFeed for BinancePriceFeed {
    fn name(&self) -> &str {
        FEED_NAME
    }

    async fn fetch_price(&self, symbol: &str, mode: FeedMode) -> Result<Decimal, FeedError> {
        let api_symbol = binance_symbol(symbol);
        let url = build_url_with_query(&self.ticker_url(mode), &[("symbol", api_symbol.as_str())]);

        self.pacer.wait().await;
        debug!("BinancePriceFeed: GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| feed_transport_error(e, self.timeout))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| FeedError::Transport(e.to_string()))?;

        interpret_ticker_response(&api_symbol, status, &body)
    }
}
