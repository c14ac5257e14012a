use super::monitor_loop::{MonitoringLoop, TickReport};
use super::price_board::{PriceBoard, PriceSnapshot};
use super::scheduler::PeriodicTask;
use super::session::{MonitoringSession, SessionStatus};
use crate::application::alerts::{AlertEngine, AlertEngineConfig, PairAlertStatus};
use crate::application::market_data::PriceSourceAdapter;
use crate::domain::alerts::{NotificationMessage, NotificationSettings};
use crate::domain::clock::Clock;
use crate::domain::errors::{NotificationError, PairConfigError};
use crate::domain::market::{FeedMode, TradingPair, normalize_pair_symbol};
use crate::domain::ports::Notifier;
use crate::domain::repositories::ConfigRepository;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct PollSettings {
    /// Tick period while the consuming UI is visible.
    pub foreground: Duration,
    /// Tick period while the consuming UI is hidden.
    pub background: Duration,
    /// Maximum number of pairs fetched concurrently within a tick.
    pub fetch_concurrency: usize,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            foreground: Duration::from_secs(2),
            background: Duration::from_secs(5),
            fetch_concurrency: 4,
        }
    }
}

/// One row of [`PriceMonitor::price_summary`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSummary {
    pub symbol: String,
    pub price: Option<Decimal>,
    pub mode: Option<FeedMode>,
    pub updated_at: Option<DateTime<Utc>>,
    pub upper: Option<Decimal>,
    pub lower: Option<Decimal>,
}

/// Monitoring core as seen by presentation layers.
///
/// Owns the session, the periodic task driving [`MonitoringLoop`] and the
/// alert engine, and routes pair-list mutations so that the price cache and
/// alert state never leak across a change of what is being monitored.
pub struct PriceMonitor {
    session: Arc<MonitoringSession>,
    pairs: Arc<dyn ConfigRepository>,
    source: Arc<PriceSourceAdapter>,
    engine: Arc<Mutex<AlertEngine>>,
    notifier: Arc<dyn Notifier>,
    board: Arc<PriceBoard>,
    clock: Arc<dyn Clock>,
    poll: PollSettings,
    looper: Arc<MonitoringLoop>,
    task: Mutex<Option<PeriodicTask>>,
}

impl PriceMonitor {
    pub fn new(
        pairs: Arc<dyn ConfigRepository>,
        source: Arc<PriceSourceAdapter>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        alert_config: AlertEngineConfig,
        poll: PollSettings,
        futures_mode: bool,
    ) -> Self {
        let session = Arc::new(MonitoringSession::new(futures_mode));
        let engine = Arc::new(Mutex::new(AlertEngine::new(alert_config, clock.clone())));
        let board = Arc::new(PriceBoard::new());
        let looper = Arc::new(MonitoringLoop::new(
            session.clone(),
            pairs.clone(),
            source.clone(),
            engine.clone(),
            notifier.clone(),
            board.clone(),
            poll.fetch_concurrency,
        ));

        Self {
            session,
            pairs,
            source,
            engine,
            notifier,
            board,
            clock,
            poll,
            looper,
            task: Mutex::new(None),
        }
    }

    fn current_period(&self) -> Duration {
        if self.session.is_visible() {
            self.poll.foreground
        } else {
            self.poll.background
        }
    }

    /// Starts monitoring. Returns `false` if it was already running.
    pub async fn start(&self) -> bool {
        let mut task = self.task.lock().await;
        if self.session.activate().is_none() {
            return false;
        }

        self.source.cache().clear();
        if let Some(previous) = task.take() {
            previous.cancel();
        }
        *task = Some(PeriodicTask::spawn(
            "price-monitor",
            self.current_period(),
            self.looper.clone(),
        ));

        info!(
            "PriceMonitor: Monitoring started ({} mode)",
            if self.session.futures_mode() { "futures" } else { "spot" }
        );
        true
    }

    /// Stops monitoring. Once this returns no further alert is dispatched
    /// for the stopped session. Returns `false` if it was not running.
    pub async fn stop(&self) -> bool {
        let mut task = self.task.lock().await;
        let was_active = {
            let _engine = self.engine.lock().await;
            self.session.deactivate()
        };

        if let Some(task) = task.take() {
            task.cancel();
        }
        if was_active {
            info!("PriceMonitor: Monitoring stopped");
        }
        was_active
    }

    /// Runs one tick immediately, outside the schedule.
    pub async fn tick_now(&self) -> TickReport {
        self.looper.run_tick().await
    }

    /// Flips spot/futures mode, clears the price cache and persists the mode.
    pub async fn toggle_mode(&self) -> bool {
        let enabled = {
            let _engine = self.engine.lock().await;
            let enabled = self.session.toggle_futures_mode();
            self.source.cache().clear();
            enabled
        };
        self.persist_mode(enabled).await;
        enabled
    }

    pub async fn set_futures_mode(&self, enabled: bool) {
        let changed = {
            let _engine = self.engine.lock().await;
            let changed = self.session.set_futures_mode(enabled);
            if changed {
                self.source.cache().clear();
            }
            changed
        };
        if changed {
            self.persist_mode(enabled).await;
        }
    }

    async fn persist_mode(&self, enabled: bool) {
        info!(
            "PriceMonitor: Switched to {} mode",
            if enabled { "futures" } else { "spot" }
        );
        if let Err(e) = self.pairs.set_futures_mode(enabled).await {
            warn!("PriceMonitor: Failed to persist futures mode: {:#}", e);
        }
    }

    /// Adapts the polling period to the consuming UI's visibility.
    pub async fn set_visible(&self, visible: bool) {
        if !self.session.set_visible(visible) {
            return;
        }
        if let Some(task) = self.task.lock().await.as_ref() {
            task.reschedule(self.current_period());
        }
    }

    pub async fn reset_alert_state(&self) {
        self.engine.lock().await.reset_all();
    }

    pub async fn reset_alert_state_for(&self, symbol: &str) -> Result<(), PairConfigError> {
        let symbol = normalize_pair_symbol(symbol)?;
        self.engine.lock().await.reset_pair(&symbol);
        info!("PriceMonitor: Alert state reset for {}", symbol);
        Ok(())
    }

    /// Latest price of every configured pair; `None` until first fetched.
    pub async fn snapshot(&self) -> PriceSnapshot {
        match self.pairs.list_pairs().await {
            Ok(pairs) => pairs
                .into_iter()
                .map(|p| {
                    let entry = self.board.get(&p.symbol);
                    (p.symbol, entry)
                })
                .collect(),
            Err(e) => {
                warn!("PriceMonitor: Failed to read pair list for snapshot: {:#}", e);
                self.board.snapshot()
            }
        }
    }

    pub fn session_status(&self) -> SessionStatus {
        self.session.status()
    }

    pub async fn list_pairs(&self) -> Result<Vec<TradingPair>> {
        self.pairs.list_pairs().await
    }

    pub async fn add_pair(
        &self,
        symbol: &str,
        upper: Option<Decimal>,
        lower: Option<Decimal>,
    ) -> Result<TradingPair, PairConfigError> {
        let pair = TradingPair::new(symbol, upper, lower)?;
        self.pairs.add_pair(pair.clone()).await?;
        self.pair_list_changed().await.forget_pair(&pair.symbol);
        info!("PriceMonitor: Added {}", pair.symbol);
        Ok(pair)
    }

    pub async fn edit_pair(
        &self,
        symbol: &str,
        upper: Option<Decimal>,
        lower: Option<Decimal>,
    ) -> Result<TradingPair, PairConfigError> {
        let pair = TradingPair::new(symbol, upper, lower)?;
        self.pairs.edit_pair(pair.clone()).await?;
        self.pair_list_changed().await.reset_pair(&pair.symbol);
        info!(
            "PriceMonitor: Updated {} (upper={:?}, lower={:?})",
            pair.symbol, pair.upper, pair.lower
        );
        Ok(pair)
    }

    pub async fn delete_pair(&self, symbol: &str) -> Result<(), PairConfigError> {
        let symbol = normalize_pair_symbol(symbol)?;
        self.pairs.delete_pair(&symbol).await?;
        self.pair_list_changed().await.forget_pair(&symbol);
        info!("PriceMonitor: Deleted {}", symbol);
        Ok(())
    }

    /// Outdates in-flight ticks and cached prices after a pair mutation.
    /// Returns the engine guard so the caller can adjust alert state before
    /// any tick evaluates again.
    async fn pair_list_changed(&self) -> MutexGuard<'_, AlertEngine> {
        let engine = self.engine.lock().await;
        self.session.invalidate();
        self.source.cache().clear();
        engine
    }

    pub async fn alert_status(&self) -> Vec<PairAlertStatus> {
        self.engine.lock().await.status()
    }

    pub fn no_futures_pairs(&self) -> Vec<String> {
        self.source.no_futures().snapshot()
    }

    pub async fn price_summary(&self) -> Result<Vec<PriceSummary>> {
        let pairs = self.pairs.list_pairs().await?;
        Ok(pairs
            .into_iter()
            .map(|pair| {
                let entry = self.board.get(&pair.symbol);
                PriceSummary {
                    price: entry.map(|e| e.price),
                    mode: entry.map(|e| e.mode),
                    updated_at: entry.map(|e| e.updated_at),
                    upper: pair.upper,
                    lower: pair.lower,
                    symbol: pair.symbol,
                }
            })
            .collect())
    }

    pub async fn send_test_notification(&self) -> Result<(), NotificationError> {
        let message = NotificationMessage::test_message(self.clock.now());
        self.notifier.send(&message).await?;
        info!("PriceMonitor: Test notification sent");
        Ok(())
    }

    /// Persists new ntfy settings and swaps them into the live notifier.
    /// A `None` password keeps the current one.
    pub async fn update_notification_config(
        &self,
        server: &str,
        topic: &str,
        password: Option<&str>,
    ) -> Result<NotificationSettings> {
        let server = server.trim().trim_end_matches('/');
        let topic = topic.trim();
        if server.is_empty() || topic.is_empty() {
            anyhow::bail!("ntfy server and topic must not be empty");
        }

        let current = self.notifier.settings();
        let settings = NotificationSettings {
            server: server.to_string(),
            topic: topic.to_string(),
            password: password.map_or(current.password, str::to_string),
        };

        self.pairs
            .set_notification_settings(&settings)
            .await
            .context("Failed to persist notification settings")?;
        self.notifier.update_settings(settings.clone());
        info!(
            "PriceMonitor: Notification target set to {}/{}",
            settings.server, settings.topic
        );
        Ok(settings)
    }

    pub fn poll_settings(&self) -> &PollSettings {
        &self.poll
    }
}
