use super::kinds::AlertKind;
use crate::domain::clock::elapsed_between;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Duration;

/// Per-pair record of when each alert kind last fired.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertState {
    last_fired: BTreeMap<AlertKind, DateTime<Utc>>,
}

impl AlertState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A kind is armed when it never fired or its cooldown has fully elapsed.
    pub fn is_armed(&self, kind: AlertKind, now: DateTime<Utc>, cooldown: Duration) -> bool {
        match self.last_fired.get(&kind) {
            None => true,
            Some(fired_at) => elapsed_between(*fired_at, now) >= cooldown,
        }
    }

    pub fn stamp(&mut self, kind: AlertKind, now: DateTime<Utc>) {
        self.last_fired.insert(kind, now);
    }

    pub fn last_fired(&self, kind: AlertKind) -> Option<DateTime<Utc>> {
        self.last_fired.get(&kind).copied()
    }

    /// True while `kind` is inside its cooldown window.
    pub fn is_cooling_down(&self, kind: AlertKind, now: DateTime<Utc>, cooldown: Duration) -> bool {
        !self.is_armed(kind, now, cooldown)
    }

    pub fn clear(&mut self) {
        self.last_fired.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooldown_is_per_kind() {
        let cooldown = Duration::from_secs(300);
        let t0 = Utc::now();
        let mut state = AlertState::new();

        assert!(state.is_armed(AlertKind::UpperBreach, t0, cooldown));
        state.stamp(AlertKind::UpperBreach, t0);

        let t1 = t0 + chrono::Duration::seconds(10);
        assert!(!state.is_armed(AlertKind::UpperBreach, t1, cooldown));
        assert!(state.is_armed(AlertKind::PercentMove, t1, cooldown));
        assert!(state.is_armed(AlertKind::LowerBreach, t1, cooldown));

        let t2 = t0 + chrono::Duration::seconds(300);
        assert!(state.is_armed(AlertKind::UpperBreach, t2, cooldown));
    }

    #[test]
    fn test_clear_rearms_everything() {
        let cooldown = Duration::from_secs(300);
        let now = Utc::now();
        let mut state = AlertState::new();
        state.stamp(AlertKind::LowerBreach, now);
        assert!(state.is_cooling_down(AlertKind::LowerBreach, now, cooldown));

        state.clear();
        assert!(state.is_armed(AlertKind::LowerBreach, now, cooldown));
        assert_eq!(state.last_fired(AlertKind::LowerBreach), None);
    }
}
