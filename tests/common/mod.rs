#![allow(dead_code)]

use pricewatch::application::alerts::AlertEngineConfig;
use pricewatch::application::market_data::{NoFuturesSet, PriceCache, PriceSourceAdapter};
use pricewatch::application::monitoring::{PollSettings, PriceMonitor};
use pricewatch::infrastructure::mock::{ManualClock, MockPriceFeed, RecordingNotifier};
use pricewatch::infrastructure::repositories::{
    InMemoryConfigRepository, InMemoryNoFuturesRepository,
};
use std::sync::Arc;
use std::time::Duration;

pub struct Harness {
    pub monitor: Arc<PriceMonitor>,
    pub feed: Arc<MockPriceFeed>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<ManualClock>,
    pub pairs: Arc<InMemoryConfigRepository>,
    pub no_futures_store: Arc<InMemoryNoFuturesRepository>,
}

pub async fn harness(cache_ttl: Duration, futures_mode: bool) -> Harness {
    let clock = Arc::new(ManualClock::new());
    let feed = Arc::new(MockPriceFeed::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let pairs = Arc::new(InMemoryConfigRepository::new());
    let no_futures_store = Arc::new(InMemoryNoFuturesRepository::new());

    let no_futures = Arc::new(NoFuturesSet::load(no_futures_store.clone()).await);
    let cache = Arc::new(PriceCache::new(cache_ttl, clock.clone()));
    let source = Arc::new(PriceSourceAdapter::new(
        feed.clone(),
        no_futures,
        cache,
        Duration::from_secs(2),
    ));

    let monitor = Arc::new(PriceMonitor::new(
        pairs.clone(),
        source,
        notifier.clone(),
        clock.clone(),
        AlertEngineConfig::default(),
        PollSettings::default(),
        futures_mode,
    ));

    Harness {
        monitor,
        feed,
        notifier,
        clock,
        pairs,
        no_futures_store,
    }
}

/// Lets spawned ticks run without moving virtual time noticeably.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}
