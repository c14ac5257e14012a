use crate::domain::alerts::{AlertKind, AlertState, FiredAlert, MoveDirection, PriceHistoryWindow};
use crate::domain::clock::{Clock, elapsed_between};
use crate::domain::market::{PriceSample, TradingPair};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const CHECK_LOG_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct AlertEngineConfig {
    /// Minimum time between two firings of the same kind for the same pair.
    pub cooldown: Duration,
    /// Span of the rolling history window used for percent-move detection.
    pub window_span: Duration,
    /// Absolute fractional change that triggers a percent-move alert (0.05 = 5%).
    pub move_threshold: Decimal,
    /// Fraction of `window_span` the retained samples must cover before a
    /// percent move is evaluated.
    pub min_window_coverage: Decimal,
}

impl Default for AlertEngineConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(300),
            window_span: Duration::from_secs(300),
            move_threshold: dec!(0.05),
            min_window_coverage: dec!(0.9),
        }
    }
}

impl AlertEngineConfig {
    fn min_coverage(&self) -> Duration {
        let fraction = self
            .min_window_coverage
            .clamp(Decimal::ZERO, Decimal::ONE)
            .to_f64()
            .unwrap_or(1.0);
        self.window_span.mul_f64(fraction)
    }
}

/// Introspection view of one pair's alert state and history window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairAlertStatus {
    pub symbol: String,
    pub last_fired: Vec<(AlertKind, DateTime<Utc>)>,
    pub cooling_down: Vec<AlertKind>,
    pub window_len: usize,
    pub window_oldest: Option<(DateTime<Utc>, Decimal)>,
    pub window_newest: Option<(DateTime<Utc>, Decimal)>,
}

/// Decides, per pair and per tick, which alerts fire.
///
/// Owns the per-pair history windows and cooldown state. Not internally
/// synchronized: callers serialize access (the monitoring core keeps it
/// behind a mutex) so two ticks can never both pass the same cooldown gate.
pub struct AlertEngine {
    config: AlertEngineConfig,
    clock: Arc<dyn Clock>,
    histories: HashMap<String, PriceHistoryWindow>,
    states: HashMap<String, AlertState>,
    last_check_log: HashMap<String, DateTime<Utc>>,
}

impl AlertEngine {
    pub fn new(config: AlertEngineConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            histories: HashMap::new(),
            states: HashMap::new(),
            last_check_log: HashMap::new(),
        }
    }

    pub fn config(&self) -> &AlertEngineConfig {
        &self.config
    }

    /// Feeds a fresh sample for `pair` and returns the alerts that fired.
    ///
    /// Threshold and percent-move kinds are independent: several may fire in
    /// the same call, each gated by its own cooldown.
    pub fn evaluate(&mut self, pair: &TradingPair, sample: &PriceSample) -> Vec<FiredAlert> {
        let now = self.clock.now();
        let symbol = pair.symbol.as_str();

        let window = self
            .histories
            .entry(symbol.to_string())
            .or_insert_with(|| PriceHistoryWindow::new(self.config.window_span));
        window.record(sample.timestamp, sample.price);

        let mut candidates = Vec::new();

        if let Some(upper) = pair.upper
            && sample.price >= upper
        {
            candidates.push(FiredAlert::UpperBreach {
                symbol: symbol.to_string(),
                price: sample.price,
                threshold: upper,
            });
        }
        if let Some(lower) = pair.lower
            && sample.price <= lower
        {
            candidates.push(FiredAlert::LowerBreach {
                symbol: symbol.to_string(),
                price: sample.price,
                threshold: lower,
            });
        }

        if let Some(change) = window.change(self.config.min_coverage())
            && change.abs() >= self.config.move_threshold
            && let (Some((_, from)), Some((_, to))) = (window.oldest(), window.newest())
        {
            candidates.push(FiredAlert::PercentMove {
                symbol: symbol.to_string(),
                from,
                to,
                change,
                direction: if change > Decimal::ZERO {
                    MoveDirection::Up
                } else {
                    MoveDirection::Down
                },
            });
        }

        self.log_check(pair, sample, now);

        let cooldown = self.config.cooldown;
        let state = self.states.entry(symbol.to_string()).or_default();
        let mut fired = Vec::new();
        for candidate in candidates {
            let kind = candidate.kind();
            if state.is_armed(kind, now, cooldown) {
                state.stamp(kind, now);
                info!("AlertEngine: {:?} fired for {} at {}", kind, symbol, sample.price);
                fired.push(candidate);
            } else {
                debug!("AlertEngine: {:?} for {} suppressed by cooldown", kind, symbol);
            }
        }
        fired
    }

    fn log_check(&mut self, pair: &TradingPair, sample: &PriceSample, now: DateTime<Utc>) {
        if !pair.has_thresholds() {
            return;
        }
        let due = self
            .last_check_log
            .get(&pair.symbol)
            .is_none_or(|last| elapsed_between(*last, now) >= CHECK_LOG_INTERVAL);
        if due {
            debug!(
                "AlertEngine: Checking {}: price={}, upper={:?}, lower={:?}",
                pair.symbol, sample.price, pair.upper, pair.lower
            );
            self.last_check_log.insert(pair.symbol.clone(), now);
        }
    }

    /// Clears cooldown state for every pair so alerts may fire on the next tick.
    pub fn reset_all(&mut self) {
        info!("AlertEngine: Resetting alert state for {} pairs", self.states.len());
        self.states.clear();
    }

    pub fn reset_pair(&mut self, symbol: &str) {
        if let Some(state) = self.states.get_mut(symbol) {
            state.clear();
        }
    }

    /// Drops all state kept for a pair that is no longer monitored.
    pub fn forget_pair(&mut self, symbol: &str) {
        self.states.remove(symbol);
        self.histories.remove(symbol);
        self.last_check_log.remove(symbol);
    }

    pub fn state(&self, symbol: &str) -> Option<&AlertState> {
        self.states.get(symbol)
    }

    pub fn history(&self, symbol: &str) -> Option<&PriceHistoryWindow> {
        self.histories.get(symbol)
    }

    pub fn status(&self) -> Vec<PairAlertStatus> {
        let now = self.clock.now();
        let mut symbols: Vec<&String> = self.states.keys().chain(self.histories.keys()).collect();
        symbols.sort();
        symbols.dedup();

        symbols
            .into_iter()
            .map(|symbol| {
                let state = self.states.get(symbol);
                let window = self.histories.get(symbol);
                let kinds = [
                    AlertKind::UpperBreach,
                    AlertKind::LowerBreach,
                    AlertKind::PercentMove,
                ];
                PairAlertStatus {
                    symbol: symbol.clone(),
                    last_fired: kinds
                        .iter()
                        .filter_map(|k| state.and_then(|s| s.last_fired(*k)).map(|t| (*k, t)))
                        .collect(),
                    cooling_down: kinds
                        .iter()
                        .copied()
                        .filter(|k| {
                            state.is_some_and(|s| s.is_cooling_down(*k, now, self.config.cooldown))
                        })
                        .collect(),
                    window_len: window.map_or(0, |w| w.len()),
                    window_oldest: window.and_then(|w| w.oldest()),
                    window_newest: window.and_then(|w| w.newest()),
                }
            })
            .collect()
    }
}
