//! OKX Market Data Feed
//!
//! Last-trade prices from the public `/api/v5/market/ticker` endpoint:
//! - Spot instruments: `BASE-QUOTE`
//! - Perpetual swaps: `BASE-QUOTE-SWAP`

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

const FEED_NAME: &str = "okx";
const CODE_OK: &str = "0";
const CODE_INSTRUMENT_NOT_FOUND: &str = "51001";
const CODE_RATE_LIMITED: &str = "50011";

#[derive(Debug, Deserialize)]
struct TickerResponse {
    code: String,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Vec<Ticker>,
}

#[derive(Debug, Deserialize)]
struct Ticker {
    last: String,
}

/// OKX instrument id for a canonical `BASE/QUOTE` symbol.
pub fn okx_instrument(symbol: &str, mode: FeedMode) -> String {
    let spot = symbol.replace('/', "-");
    match mode {
        FeedMode::Spot => spot,
        FeedMode::Derivative => format!("{}-SWAP", spot),
    }
}

/// Turns a raw ticker response into a price or a classified error.
///
/// OKX reports unknown instruments with code `51001`, and occasionally with
/// code `0` and an empty data array; both are authoritative.
pub fn interpret_ticker_response(
    instrument: &str,
    status: u16,
    body: &str,
) -> Result<Decimal, FeedError> {
    if status == 429 {
        return Err(FeedError::RateLimited {
            feed: FEED_NAME.to_string(),
        });
    }

    let parsed: TickerResponse = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(e) if (200..300).contains(&status) => {
            return Err(FeedError::InvalidPayload {
                instrument: instrument.to_string(),
                reason: e.to_string(),
            });
        }
        Err(_) => {
            return Err(FeedError::Http {
                feed: FEED_NAME.to_string(),
                status,
                body: body.chars().take(200).collect(),
            });
        }
    };

    match parsed.code.as_str() {
        CODE_INSTRUMENT_NOT_FOUND => Err(FeedError::InstrumentNotFound {
            feed: FEED_NAME.to_string(),
            instrument: instrument.to_string(),
        }),
        CODE_RATE_LIMITED => Err(FeedError::RateLimited {
            feed: FEED_NAME.to_string(),
        }),
        CODE_OK if (200..300).contains(&status) => {
            let Some(ticker) = parsed.data.first() else {
                return Err(FeedError::InstrumentNotFound {
                    feed: FEED_NAME.to_string(),
                    instrument: instrument.to_string(),
                });
            };
            Decimal::from_str_exact(ticker.last.trim()).map_err(|e| FeedError::InvalidPayload {
                instrument: instrument.to_string(),
                reason: format!("unparseable last price '{}': {}", ticker.last, e),
            })
        }
        CODE_OK => Err(FeedError::Http {
            feed: FEED_NAME.to_string(),
            status,
            body: body.chars().take(200).collect(),
        }),
        code => Err(FeedError::Upstream {
            feed: FEED_NAME.to_string(),
            code: code.to_string(),
            message: parsed.msg,
        }),
    }
}

pub struct OkxPriceFeed {
    client: ClientWithMiddleware,
    base_url: String,
    timeout: Duration,
    pacer: RequestPacer,
}

impl OkxPriceFeed {
    pub fn new(base_url: impl Into<String>, timeout: Duration, min_interval: Duration) -> Self {
        Self {
            client: HttpClientFactory::create_feed_client(timeout),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            pacer: RequestPacer::new(min_interval),
        }
    }
}

#[async_trait]
impl PriceFeed for OkxPriceFeed {
    fn name(&self) -> &str {
        FEED_NAME
    }

    async fn fetch_price(&self, symbol: &str, mode: FeedMode) -> Result<Decimal, FeedError> {
        let instrument = okx_instrument(symbol, mode);
        let url = build_url_with_query(
            &format!("{}/api/v5/market/ticker", self.base_url),
            &[("instId", instrument.as_str())],
        );

        self.pacer.wait().await;
        debug!("OkxPriceFeed: GET {}", url);

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

        interpret_ticker_response(&instrument, status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_instrument_mapping() {
        assert_eq!(okx_instrument("BTC/USDT", FeedMode::Spot), "BTC-USDT");
        assert_eq!(okx_instrument("BTC/USDT", FeedMode::Derivative), "BTC-USDT-SWAP");
    }

    #[test]
    fn test_successful_ticker() {
        let body = r#"{"code":"0","msg":"","data":[{"instId":"BTC-USDT-SWAP","last":"67012.3"}]}"#;
        assert_eq!(
            interpret_ticker_response("BTC-USDT-SWAP", 200, body),
            Ok(dec!(67012.3))
        );
    }

    #[test]
    fn test_unknown_instrument_is_authoritative() {
        let body = r#"{"code":"51001","msg":"Instrument ID does not exist","data":[]}"#;
        let err = interpret_ticker_response("DOGE-USDT-SWAP", 400, body).unwrap_err();
        assert!(err.is_authoritative());

        let empty = r#"{"code":"0","msg":"","data":[]}"#;
        let err = interpret_ticker_response("DOGE-USDT-SWAP", 200, empty).unwrap_err();
        assert!(err.is_authoritative());
    }

    #[test]
    fn test_transient_failures_are_not_authoritative() {
        let rate = interpret_ticker_response("BTC-USDT", 429, "").unwrap_err();
        assert!(matches!(rate, FeedError::RateLimited { .. }));

        let busy = r#"{"code":"50011","msg":"Too Many Requests","data":[]}"#;
        assert!(!interpret_ticker_response("BTC-USDT", 200, busy).unwrap_err().is_authoritative());

        let gateway = interpret_ticker_response("BTC-USDT", 502, "<html>Bad Gateway</html>");
        assert!(matches!(gateway, Err(FeedError::Http { status: 502, .. })));

        let garbage = interpret_ticker_response("BTC-USDT", 200, "not json");
        assert!(matches!(garbage, Err(FeedError::InvalidPayload { .. })));

        let other = r#"{"code":"50001","msg":"Service temporarily unavailable","data":[]}"#;
        let err = interpret_ticker_response("BTC-USDT", 503, other).unwrap_err();
        assert!(matches!(err, FeedError::Upstream { ref code, .. } if code == "50001"));
        assert!(!err.is_authoritative());
    }
}
