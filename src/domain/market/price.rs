use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which upstream market a price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeedMode {
    Spot,
    Derivative,
}

impl std::fmt::Display for FeedMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedMode::Spot => write!(f, "spot"),
            FeedMode::Derivative => write!(f, "derivative"),
        }
    }
}

/// A price returned by the price source adapter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceQuote {
    pub price: Decimal,
    pub mode: FeedMode,
    pub fetched_at: DateTime<Utc>,
    pub from_cache: bool,
}

impl PriceQuote {
    pub fn into_sample(self, symbol: &str) -> PriceSample {
        PriceSample {
            symbol: symbol.to_string(),
            price: self.price,
            mode: self.mode,
            timestamp: self.fetched_at,
        }
    }
}

/// One observation of a pair's price, fed to the alert engine.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSample {
    pub symbol: String,
    pub price: Decimal,
    pub mode: FeedMode,
    pub timestamp: DateTime<Utc>,
}

/// Display precision: BTC pairs keep 6 decimals, everything else 3.
pub fn round_price(symbol: &str, price: Decimal) -> Decimal {
    let is_btc = symbol.split('/').next().is_some_and(|base| base == "BTC");
    if is_btc {
        price.round_dp(6)
    } else {
        price.round_dp(3)
    }
}
