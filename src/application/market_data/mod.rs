// Market data access modules
pub mod fallback_learner;
pub mod price_cache;
pub mod price_source;

pub use fallback_learner::NoFuturesSet;
pub use price_cache::{CacheEntry, PriceCache};
pub use price_source::PriceSourceAdapter;
