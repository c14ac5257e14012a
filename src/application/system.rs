use anyhow::{Context, Result};
use rust_decimal_macros::dec;
use std::sync::Arc;
use tracing::info;

use crate::application::market_data::{NoFuturesSet, PriceCache, PriceSourceAdapter};
use crate::application::monitoring::PriceMonitor;
use crate::config::{Config, Exchange};
use crate::domain::clock::{Clock, SystemClock};
use crate::domain::market::FeedMode;
use crate::domain::ports::{Notifier, PriceFeed};
use crate::domain::repositories::{ConfigRepository, NoFuturesRepository};
use crate::infrastructure::binance::BinancePriceFeed;
use crate::infrastructure::mock::MockPriceFeed;
use crate::infrastructure::ntfy::NtfyNotifier;
use crate::infrastructure::okx::OkxPriceFeed;
use crate::infrastructure::persistence::{JsonConfigRepository, JsonNoFuturesRepository};

pub struct Application {
    pub config: Config,
    pub feed: Arc<dyn PriceFeed>,
    pub pairs: Arc<dyn ConfigRepository>,
    pub notifier: Arc<dyn Notifier>,
    pub monitor: Arc<PriceMonitor>,
}

impl Application {
    pub async fn build(config: Config) -> Result<Self> {
        info!("Building pricewatch (exchange: {:?})...", config.exchange);

        // 1. Persistence
        let pairs: Arc<dyn ConfigRepository> = Arc::new(
            JsonConfigRepository::open(&config.storage.trading_config_path)
                .context("Failed to open trading config")?,
        );
        let no_futures_store: Arc<dyn NoFuturesRepository> = Arc::new(
            JsonNoFuturesRepository::new(config.storage.no_futures_path.clone()),
        );

        // 2. Price feed
        let feed: Arc<dyn PriceFeed> = match config.exchange {
            Exchange::Okx => {
                info!("Using OKX feed ({})", config.feed.okx_base_url);
                Arc::new(OkxPriceFeed::new(
                    config.feed.okx_base_url.clone(),
                    config.feed.fetch_timeout,
                    config.feed.min_request_interval,
                ))
            }
            Exchange::Binance => {
                info!(
                    "Using Binance feed ({}, {})",
                    config.feed.binance_spot_url, config.feed.binance_futures_url
                );
                Arc::new(
                    BinancePriceFeed::builder()
                        .spot_url(config.feed.binance_spot_url.clone())
                        .futures_url(config.feed.binance_futures_url.clone())
                        .timeout(config.feed.fetch_timeout)
                        .min_interval(config.feed.min_request_interval)
                        .build(),
                )
            }
            Exchange::Mock => {
                info!("Using mock feed");
                Arc::new(seeded_mock_feed())
            }
        };

        // 3. Notifications: persisted server/topic win over the environment,
        //    the password only ever comes from the environment.
        let mut notification = config.notification.settings();
        if let Some(persisted) = pairs
            .notification_settings()
            .await
            .context("Failed to read notification settings")?
        {
            notification.server = persisted.server;
            notification.topic = persisted.topic;
        }
        info!(
            "Notifications go to {}/{}",
            notification.server, notification.topic
        );
        let notifier: Arc<dyn Notifier> = Arc::new(NtfyNotifier::new(notification));

        // 4. Market data pipeline
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let no_futures = Arc::new(NoFuturesSet::load(no_futures_store).await);
        let cache = Arc::new(PriceCache::new(config.monitor.cache_ttl, clock.clone()));
        let source = Arc::new(PriceSourceAdapter::new(
            feed.clone(),
            no_futures,
            cache,
            config.feed.fetch_timeout,
        ));

        // 5. Monitoring core
        let futures_mode = config.monitor.futures_mode
            || pairs
                .futures_mode()
                .await
                .context("Failed to read futures mode")?;
        let monitor = Arc::new(PriceMonitor::new(
            pairs.clone(),
            source,
            notifier.clone(),
            clock,
            config.monitor.alert_engine_config(),
            config.monitor.poll_settings(config.feed.fetch_concurrency),
            futures_mode,
        ));

        Ok(Self {
            config,
            feed,
            pairs,
            notifier,
            monitor,
        })
    }
}

fn seeded_mock_feed() -> MockPriceFeed {
    let feed = MockPriceFeed::new();
    for (symbol, price) in [
        ("BTC/USDT", dec!(67000)),
        ("ETH/USDT", dec!(3500)),
        ("SOL/USDT", dec!(150)),
    ] {
        feed.set_price(symbol, FeedMode::Spot, price);
        feed.set_price(symbol, FeedMode::Derivative, price);
    }
    feed
}
