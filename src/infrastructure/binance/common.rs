//! Common types and constants for Binance infrastructure

use serde::Deserialize;

pub const FEED_NAME: &str = "binance";

/// Binance error code for an unknown symbol.
pub const CODE_INVALID_SYMBOL: i64 = -1121;

/// Error body returned by both the spot and the USD-M futures APIs.
#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub code: i64,
    #[serde(default)]
    pub msg: String,
}

/// Binance symbol for a canonical `BASE/QUOTE` pair (`BTC/USDT` -> `BTCUSDT`).
pub fn binance_symbol(symbol: &str) -> String {
    symbol.replace('/', "")
}
