use serde::Serialize;
use std::sync::RwLock;

/// Status exposed to presentation layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    pub active: bool,
    pub futures_mode: bool,
    pub visible: bool,
}

#[derive(Debug, Clone, Copy)]
struct SessionState {
    active: bool,
    futures_mode: bool,
    visible: bool,
    generation: u64,
    epoch: u64,
}

/// What a tick was started under: the session generation and the
/// configuration epoch (operating mode and pair list).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickStamp {
    generation: u64,
    epoch: u64,
}

/// Process-wide monitoring session: active flag, operating mode, UI visibility.
///
/// Every activation bumps a generation counter. A tick captures the
/// generation it started under and may only dispatch alerts while that
/// generation is still the active one, so ticks that straddle a stop (or a
/// stop followed by a quick restart) never leak side effects.
///
/// Mode changes and pair-list mutations bump a separate epoch; a tick whose
/// epoch has moved discards what it fetched.
#[derive(Debug)]
pub struct MonitoringSession {
    state: RwLock<SessionState>,
}

impl MonitoringSession {
    pub fn new(futures_mode: bool) -> Self {
        Self {
            state: RwLock::new(SessionState {
                active: false,
                futures_mode,
                visible: true,
                generation: 0,
                epoch: 0,
            }),
        }
    }

    fn read(&self) -> SessionState {
        match self.state.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn update<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        match self.state.write() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => {
                tracing::error!("MonitoringSession: Lock poisoned during write, recovering");
                f(&mut poisoned.into_inner())
            }
        }
    }

    /// Inactive -> Active. Returns the new generation, or `None` if already active.
    pub fn activate(&self) -> Option<u64> {
        self.update(|s| {
            if s.active {
                None
            } else {
                s.active = true;
                s.generation += 1;
                Some(s.generation)
            }
        })
    }

    /// Active -> Inactive. Returns `false` if the session was not active.
    pub fn deactivate(&self) -> bool {
        self.update(|s| std::mem::replace(&mut s.active, false))
    }

    /// Stamp for a tick starting now, or `None` if the session is inactive.
    pub fn tick_stamp(&self) -> Option<TickStamp> {
        let s = self.read();
        s.active.then_some(TickStamp {
            generation: s.generation,
            epoch: s.epoch,
        })
    }

    /// `true` while the session is still active under the same generation
    /// and no mode change or pair mutation happened since `stamp` was taken.
    pub fn is_current(&self, stamp: TickStamp) -> bool {
        self.tick_stamp() == Some(stamp)
    }

    /// Marks a pair-list mutation.
    pub fn invalidate(&self) {
        self.update(|s| s.epoch += 1);
    }

    pub fn is_active(&self) -> bool {
        self.read().active
    }

    pub fn futures_mode(&self) -> bool {
        self.read().futures_mode
    }

    pub fn set_futures_mode(&self, enabled: bool) -> bool {
        self.update(|s| {
            let changed = std::mem::replace(&mut s.futures_mode, enabled) != enabled;
            if changed {
                s.epoch += 1;
            }
            changed
        })
    }

    /// Flips the operating mode and returns the new value.
    pub fn toggle_futures_mode(&self) -> bool {
        self.update(|s| {
            s.futures_mode = !s.futures_mode;
            s.epoch += 1;
            s.futures_mode
        })
    }

    pub fn is_visible(&self) -> bool {
        self.read().visible
    }

    /// Returns `true` if visibility actually changed.
    pub fn set_visible(&self, visible: bool) -> bool {
        self.update(|s| std::mem::replace(&mut s.visible, visible) != visible)
    }

    pub fn status(&self) -> SessionStatus {
        let s = self.read();
        SessionStatus {
            active: s.active,
            futures_mode: s.futures_mode,
            visible: s.visible,
        }
    }
}
