pub mod pair;
pub mod price;

pub use pair::{DEFAULT_QUOTE, TradingPair, normalize_pair_symbol};
pub use price::{FeedMode, PriceQuote, PriceSample, round_price};
