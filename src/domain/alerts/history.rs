use crate::domain::clock::elapsed_between;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::time::Duration;

/// Rolling window of recent prices for one pair, bounded by a time span.
///
/// Used only to compute the change from the oldest retained sample to the
/// newest one.
#[derive(Debug, Clone)]
pub struct PriceHistoryWindow {
    span: Duration,
    samples: VecDeque<(DateTime<Utc>, Decimal)>,
}

impl PriceHistoryWindow {
    pub fn new(span: Duration) -> Self {
        Self {
            span,
            samples: VecDeque::new(),
        }
    }

    /// Appends a sample and evicts everything older than the span, measured
    /// from the new sample's timestamp.
    ///
    /// Samples not newer than the current newest entry (a cached price seen
    /// twice) are ignored and `false` is returned.
    pub fn record(&mut self, timestamp: DateTime<Utc>, price: Decimal) -> bool {
        if let Some((newest_ts, _)) = self.samples.back()
            && timestamp <= *newest_ts
        {
            return false;
        }

        self.samples.push_back((timestamp, price));
        self.evict(timestamp);
        true
    }

    fn evict(&mut self, now: DateTime<Utc>) {
        while let Some((ts, _)) = self.samples.front() {
            if elapsed_between(*ts, now) > self.span {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn oldest(&self) -> Option<(DateTime<Utc>, Decimal)> {
        self.samples.front().copied()
    }

    pub fn newest(&self) -> Option<(DateTime<Utc>, Decimal)> {
        self.samples.back().copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn span(&self) -> Duration {
        self.span
    }

    /// Time between the oldest and newest retained samples.
    pub fn covered(&self) -> Duration {
        match (self.oldest(), self.newest()) {
            (Some((first, _)), Some((last, _))) => elapsed_between(first, last),
            _ => Duration::ZERO,
        }
    }

    /// Fractional change `(newest - oldest) / oldest`, available once the
    /// window holds two samples spanning at least `min_coverage`.
    pub fn change(&self, min_coverage: Duration) -> Option<Decimal> {
        if self.samples.len() < 2 || self.covered() < min_coverage {
            return None;
        }
        let (_, first) = self.oldest()?;
        let (_, last) = self.newest()?;
        if first <= Decimal::ZERO {
            return None;
        }
        Some((last - first) / first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_evicts_samples_outside_span() {
        let mut window = PriceHistoryWindow::new(Duration::from_secs(300));
        window.record(at(0), dec!(100));
        window.record(at(200), dec!(101));
        window.record(at(300), dec!(102));
        assert_eq!(window.len(), 3);

        window.record(at(301), dec!(103));
        assert_eq!(window.len(), 3);
        assert_eq!(window.oldest(), Some((at(200), dec!(101))));
    }

    #[test]
    fn test_ignores_stale_or_duplicate_samples() {
        let mut window = PriceHistoryWindow::new(Duration::from_secs(300));
        assert!(window.record(at(10), dec!(100)));
        assert!(!window.record(at(10), dec!(100)));
        assert!(!window.record(at(5), dec!(99)));
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn test_change_requires_coverage() {
        let mut window = PriceHistoryWindow::new(Duration::from_secs(300));
        window.record(at(0), dec!(100));
        window.record(at(60), dec!(110));

        assert_eq!(window.change(Duration::from_secs(270)), None);
        assert_eq!(window.change(Duration::from_secs(60)), Some(dec!(0.1)));

        window.record(at(280), dec!(95));
        assert_eq!(window.change(Duration::from_secs(270)), Some(dec!(-0.05)));
    }

    #[test]
    fn test_single_sample_has_no_change() {
        let mut window = PriceHistoryWindow::new(Duration::from_secs(300));
        window.record(at(0), dec!(100));
        assert_eq!(window.change(Duration::ZERO), None);
        assert_eq!(window.covered(), Duration::ZERO);
    }
}
