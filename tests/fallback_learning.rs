mod common;

use common::{harness, settle};
use pricewatch::application::market_data::{NoFuturesSet, PriceCache, PriceSourceAdapter};
use pricewatch::domain::errors::FeedError;
use pricewatch::domain::market::FeedMode;
use pricewatch::domain::repositories::NoFuturesRepository;
use pricewatch::infrastructure::mock::{ManualClock, MockPriceFeed};
use pricewatch::infrastructure::persistence::JsonNoFuturesRepository;
use pricewatch::infrastructure::repositories::InMemoryNoFuturesRepository;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;

async fn adapter(
    feed: Arc<MockPriceFeed>,
    store: Arc<dyn NoFuturesRepository>,
) -> PriceSourceAdapter {
    let no_futures = Arc::new(NoFuturesSet::load(store).await);
    let cache = Arc::new(PriceCache::new(Duration::ZERO, Arc::new(ManualClock::new())));
    PriceSourceAdapter::new(feed, no_futures, cache, Duration::from_secs(2))
}

#[tokio::test]
async fn test_missing_derivative_falls_back_and_is_remembered() {
    let feed = Arc::new(MockPriceFeed::new());
    feed.set_not_found("DOGE/USDT", FeedMode::Derivative);
    feed.set_price("DOGE/USDT", FeedMode::Spot, dec!(0.1523));
    let store = Arc::new(InMemoryNoFuturesRepository::new());
    let adapter = adapter(feed.clone(), store.clone()).await;

    let quote = adapter.fetch_price("DOGE/USDT", true).await.unwrap();
    assert_eq!(quote.mode, FeedMode::Spot);
    assert_eq!(quote.price, dec!(0.152));
    assert!(adapter.no_futures().contains("DOGE/USDT"));
    assert_eq!(store.save_count(), 1);

    let quote = adapter.fetch_price("DOGE/USDT", true).await.unwrap();
    assert_eq!(quote.mode, FeedMode::Spot);
    assert_eq!(feed.call_count("DOGE/USDT", FeedMode::Derivative), 1);
    assert_eq!(feed.call_count("DOGE/USDT", FeedMode::Spot), 2);
    assert_eq!(store.save_count(), 1);
}

#[tokio::test]
async fn test_learned_pairs_survive_a_restart() {
    let path = std::env::temp_dir()
        .join(format!("pricewatch-{}", uuid::Uuid::new_v4()))
        .join("no_futures_coins.json");
    let feed = Arc::new(MockPriceFeed::new());
    feed.set_not_found("XCH/USDT", FeedMode::Derivative);
    feed.set_price("XCH/USDT", FeedMode::Spot, dec!(25));

    let first = adapter(feed.clone(), Arc::new(JsonNoFuturesRepository::new(path.clone()))).await;
    first.fetch_price("XCH/USDT", true).await.unwrap();

    let second = adapter(feed.clone(), Arc::new(JsonNoFuturesRepository::new(path.clone()))).await;
    assert!(second.no_futures().contains("XCH/USDT"));
    second.fetch_price("XCH/USDT", true).await.unwrap();
    assert_eq!(feed.call_count("XCH/USDT", FeedMode::Derivative), 1);

    if let Some(dir) = path.parent() {
        let _ = std::fs::remove_dir_all(dir);
    }
}

#[tokio::test]
async fn test_transient_failures_never_teach_the_set() {
    let feed = Arc::new(MockPriceFeed::new());
    feed.set_transient("SOL/USDT", FeedMode::Derivative);
    feed.set_price("SOL/USDT", FeedMode::Spot, dec!(150));
    let store = Arc::new(InMemoryNoFuturesRepository::new());
    let adapter = adapter(feed.clone(), store.clone()).await;

    for _ in 0..5 {
        let err = adapter.fetch_price("SOL/USDT", true).await.unwrap_err();
        assert!(matches!(err, FeedError::Transport(_)));
    }
    assert!(adapter.no_futures().is_empty());
    assert_eq!(store.save_count(), 0);
    assert_eq!(feed.call_count("SOL/USDT", FeedMode::Derivative), 5);
}

#[tokio::test]
async fn test_spot_mode_ignores_the_set() {
    let feed = Arc::new(MockPriceFeed::new());
    feed.set_price("DOGE/USDT", FeedMode::Spot, dec!(0.15));
    let store = Arc::new(InMemoryNoFuturesRepository::with_pairs(&["DOGE/USDT"]));
    let adapter = adapter(feed.clone(), store).await;

    let quote = adapter.fetch_price("DOGE/USDT", false).await.unwrap();
    assert_eq!(quote.mode, FeedMode::Spot);
    assert!(feed.calls().iter().all(|(_, mode)| *mode == FeedMode::Spot));
}

#[tokio::test(start_paused = true)]
async fn test_monitor_lists_learned_pairs() {
    let h = harness(Duration::ZERO, true).await;
    h.monitor.add_pair("DOGE", None, None).await.unwrap();
    h.monitor.add_pair("BTC", None, None).await.unwrap();
    h.feed.set_not_found("DOGE/USDT", FeedMode::Derivative);
    h.feed.set_price("DOGE/USDT", FeedMode::Spot, dec!(0.15));
    h.feed.set_price("BTC/USDT", FeedMode::Derivative, dec!(67000));

    h.monitor.start().await;
    settle().await;

    assert_eq!(h.monitor.no_futures_pairs(), vec!["DOGE/USDT".to_string()]);
    assert!(h.no_futures_store.stored().contains("DOGE/USDT"));

    let snapshot = h.monitor.snapshot().await;
    assert_eq!(snapshot["DOGE/USDT"].map(|e| e.mode), Some(FeedMode::Spot));
    assert_eq!(snapshot["BTC/USDT"].map(|e| e.mode), Some(FeedMode::Derivative));

    h.monitor.stop().await;
}
