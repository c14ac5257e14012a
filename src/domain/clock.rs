use chrono::{DateTime, Utc};
use std::time::Duration;

/// Source of wall-clock time for cache expiry, history windows and cooldowns.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Time elapsed from `earlier` to `now`, clamped to zero when the clock went backwards.
pub fn elapsed_between(earlier: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - earlier).to_std().unwrap_or(Duration::ZERO)
}
