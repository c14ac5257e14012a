use super::price_board::PriceBoard;
use super::scheduler::TickHandler;
use super::session::MonitoringSession;
use crate::application::alerts::AlertEngine;
use crate::application::market_data::PriceSourceAdapter;
use crate::domain::alerts::{FiredAlert, NotificationMessage};
use crate::domain::market::{PriceQuote, TradingPair};
use crate::domain::ports::Notifier;
use crate::domain::repositories::ConfigRepository;
use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::future::join_all;
use futures_util::stream;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Outcome of a single tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub pairs: usize,
    pub fetched: usize,
    pub failed: usize,
    pub alerts_fired: usize,
    pub alerts_delivered: usize,
    /// The session was stopped, the mode toggled or the pair list changed
    /// while the tick was running; nothing was published, evaluated or
    /// dispatched.
    pub superseded: bool,
}

/// One polling pass over every configured pair.
///
/// Prices are fetched with bounded fan-out, then published and folded into
/// the alert engine one pair at a time while holding the engine lock.
/// Alerts are dispatched under the same lock. Stop, mode changes and pair
/// mutations take that lock before changing the session, so once they
/// return no result fetched under the old state reaches the board, the
/// engine or the notifier.
pub struct MonitoringLoop {
    session: Arc<MonitoringSession>,
    pairs: Arc<dyn ConfigRepository>,
    source: Arc<PriceSourceAdapter>,
    engine: Arc<Mutex<AlertEngine>>,
    notifier: Arc<dyn Notifier>,
    board: Arc<PriceBoard>,
    concurrency: usize,
}

impl MonitoringLoop {
    pub fn new(
        session: Arc<MonitoringSession>,
        pairs: Arc<dyn ConfigRepository>,
        source: Arc<PriceSourceAdapter>,
        engine: Arc<Mutex<AlertEngine>>,
        notifier: Arc<dyn Notifier>,
        board: Arc<PriceBoard>,
        concurrency: usize,
    ) -> Self {
        Self {
            session,
            pairs,
            source,
            engine,
            notifier,
            board,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn run_tick(&self) -> TickReport {
        let mut report = TickReport::default();

        let Some(stamp) = self.session.tick_stamp() else {
            report.superseded = true;
            return report;
        };
        let want_derivative = self.session.futures_mode();

        let pairs = match self.pairs.list_pairs().await {
            Ok(pairs) => pairs,
            Err(e) => {
                error!("MonitoringLoop: Failed to read pair list: {:#}", e);
                return report;
            }
        };
        report.pairs = pairs.len();
        if pairs.is_empty() {
            debug!("MonitoringLoop: No pairs configured");
            self.board.refresh(std::iter::empty());
            return report;
        }

        let results: Vec<(TradingPair, Option<PriceQuote>)> = stream::iter(pairs)
            .map(|pair| async move {
                let quote = match self.source.fetch_price(&pair.symbol, want_derivative).await {
                    Ok(quote) => Some(quote),
                    Err(e) => {
                        debug!("MonitoringLoop: No price for {} this tick: {}", pair.symbol, e);
                        None
                    }
                };
                (pair, quote)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        report.fetched = results.iter().filter(|(_, q)| q.is_some()).count();
        report.failed = results.len() - report.fetched;

        let mut engine = self.engine.lock().await;
        if !self.session.is_current(stamp) {
            info!("MonitoringLoop: Session changed during tick, discarding results");
            report.superseded = true;
            return report;
        }

        self.board
            .refresh(results.iter().map(|(pair, quote)| (pair.symbol.as_str(), *quote)));
        if report.fetched == 0 {
            warn!(
                "MonitoringLoop: Failed to fetch any of {} pairs, will retry next tick",
                report.pairs
            );
            return report;
        }

        let fired: Vec<FiredAlert> = results
            .into_iter()
            .filter_map(|(pair, quote)| quote.map(|q| (pair, q)))
            .flat_map(|(pair, quote)| {
                let sample = quote.into_sample(&pair.symbol);
                engine.evaluate(&pair, &sample)
            })
            .collect();
        report.alerts_fired = fired.len();

        let deliveries = fired.iter().map(|alert| self.dispatch(alert));
        report.alerts_delivered = join_all(deliveries).await.into_iter().filter(|ok| *ok).count();
        drop(engine);

        report
    }

    /// Best-effort delivery; failures are logged and never retried.
    async fn dispatch(&self, alert: &FiredAlert) -> bool {
        let message = NotificationMessage::from_alert(alert);
        match self.notifier.send(&message).await {
            Ok(()) => {
                info!("MonitoringLoop: Alert sent: {}", message);
                true
            }
            Err(e) => {
                warn!(
                    "MonitoringLoop: Failed to deliver {:?} alert for {}: {}",
                    alert.kind(),
                    alert.symbol(),
                    e
                );
                false
            }
        }
    }
}

#[async_trait]
impl TickHandler for MonitoringLoop {
    async fn on_tick(&self) {
        let report = self.run_tick().await;
        debug!("MonitoringLoop: Tick complete {:?}", report);
    }
}
