use pricewatch::application::market_data::{NoFuturesSet, PriceCache, PriceSourceAdapter};
use pricewatch::domain::market::FeedMode;
use pricewatch::infrastructure::mock::{ManualClock, MockPriceFeed};
use pricewatch::infrastructure::repositories::InMemoryNoFuturesRepository;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;

struct Fixture {
    clock: Arc<ManualClock>,
    feed: Arc<MockPriceFeed>,
    adapter: PriceSourceAdapter,
}

async fn fixture(ttl: Duration) -> Fixture {
    let clock = Arc::new(ManualClock::new());
    let feed = Arc::new(MockPriceFeed::new());
    let no_futures =
        Arc::new(NoFuturesSet::load(Arc::new(InMemoryNoFuturesRepository::new())).await);
    let cache = Arc::new(PriceCache::new(ttl, clock.clone()));
    let adapter =
        PriceSourceAdapter::new(feed.clone(), no_futures, cache, Duration::from_secs(2));
    Fixture {
        clock,
        feed,
        adapter,
    }
}

#[tokio::test]
async fn test_fresh_entries_are_served_from_cache() {
    let f = fixture(Duration::from_secs(2)).await;
    f.feed.set_price("ETH/USDT", FeedMode::Spot, dec!(3500));

    let first = f.adapter.fetch_price("ETH/USDT", false).await.unwrap();
    assert!(!first.from_cache);

    f.feed.set_price("ETH/USDT", FeedMode::Spot, dec!(3600));
    f.clock.advance(Duration::from_millis(1500));
    let second = f.adapter.fetch_price("ETH/USDT", false).await.unwrap();
    assert!(second.from_cache);
    assert_eq!(second.price, dec!(3500));
    assert_eq!(second.fetched_at, first.fetched_at);
    assert_eq!(f.feed.call_count("ETH/USDT", FeedMode::Spot), 1);
}

#[tokio::test]
async fn test_expired_entries_are_refetched() {
    let f = fixture(Duration::from_secs(2)).await;
    f.feed.set_price("ETH/USDT", FeedMode::Spot, dec!(3500));
    f.adapter.fetch_price("ETH/USDT", false).await.unwrap();

    f.feed.set_price("ETH/USDT", FeedMode::Spot, dec!(3600));
    f.clock.advance(Duration::from_secs(2));
    let quote = f.adapter.fetch_price("ETH/USDT", false).await.unwrap();
    assert!(!quote.from_cache);
    assert_eq!(quote.price, dec!(3600));
    assert_eq!(f.feed.call_count("ETH/USDT", FeedMode::Spot), 2);
}

#[tokio::test]
async fn test_clear_forces_an_upstream_fetch() {
    let f = fixture(Duration::from_secs(60)).await;
    f.feed.set_price("SOL/USDT", FeedMode::Spot, dec!(150));
    f.adapter.fetch_price("SOL/USDT", false).await.unwrap();
    f.adapter.fetch_price("SOL/USDT", false).await.unwrap();
    assert_eq!(f.feed.call_count("SOL/USDT", FeedMode::Spot), 1);

    f.adapter.cache().clear();
    assert!(f.adapter.cache().is_empty());
    f.adapter.fetch_price("SOL/USDT", false).await.unwrap();
    assert_eq!(f.feed.call_count("SOL/USDT", FeedMode::Spot), 2);
}

#[tokio::test]
async fn test_failed_fetches_are_not_cached() {
    let f = fixture(Duration::from_secs(60)).await;
    f.feed.set_transient("BNB/USDT", FeedMode::Spot);
    assert!(f.adapter.fetch_price("BNB/USDT", false).await.is_err());
    assert!(f.adapter.cache().get("BNB/USDT").is_none());

    f.feed.set_price("BNB/USDT", FeedMode::Spot, dec!(600));
    let quote = f.adapter.fetch_price("BNB/USDT", false).await.unwrap();
    assert_eq!(quote.price, dec!(600));
}
