pub mod binance;
pub mod core;
pub mod mock;
pub mod ntfy;
pub mod okx;
pub mod persistence;
pub mod repositories;

pub use binance::BinancePriceFeed;
pub use ntfy::NtfyNotifier;
pub use okx::OkxPriceFeed;
pub use persistence::{JsonConfigRepository, JsonNoFuturesRepository};
pub use repositories::{InMemoryConfigRepository, InMemoryNoFuturesRepository};
