use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Work executed on every scheduler tick.
#[async_trait]
pub trait TickHandler: Send + Sync + 'static {
    async fn on_tick(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Every(Duration),
    Cancelled,
}

/// Cancellable periodic task with a reschedulable period.
///
/// - Runs one tick immediately on spawn, then one tick per period.
/// - Ticks never overlap: the next period starts counting only after the
///   previous tick completed.
/// - `cancel` takes effect before the next tick; an in-flight tick finishes.
/// - `reschedule` restarts the wait with the new period.
pub struct PeriodicTask {
    name: String,
    control: watch::Sender<Control>,
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    pub fn spawn(name: impl Into<String>, period: Duration, handler: Arc<dyn TickHandler>) -> Self {
        let name = name.into();
        let (control, control_rx) = watch::channel(Control::Every(period));
        info!("PeriodicTask [{}]: Started (period {:?})", name, period);
        let handle = tokio::spawn(run(name.clone(), handler, control_rx));
        Self {
            name,
            control,
            handle,
        }
    }

    pub fn reschedule(&self, period: Duration) {
        let changed = self.control.send_if_modified(|current| match current {
            Control::Every(existing) if *existing != period => {
                *current = Control::Every(period);
                true
            }
            _ => false,
        });
        if changed {
            info!("PeriodicTask [{}]: Rescheduled to {:?}", self.name, period);
        }
    }

    pub fn cancel(&self) {
        self.control.send_replace(Control::Cancelled);
        info!("PeriodicTask [{}]: Cancelled", self.name);
    }

    pub fn period(&self) -> Option<Duration> {
        match *self.control.borrow() {
            Control::Every(period) => Some(period),
            Control::Cancelled => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancels and waits for the in-flight tick, if any, to complete.
    pub async fn shutdown(self) {
        self.cancel();
        let _ = self.handle.await;
    }
}

async fn run(name: String, handler: Arc<dyn TickHandler>, mut control: watch::Receiver<Control>) {
    'ticks: loop {
        if *control.borrow_and_update() == Control::Cancelled {
            break;
        }

        handler.on_tick().await;

        loop {
            let period = match *control.borrow_and_update() {
                Control::Every(period) => period,
                Control::Cancelled => break 'ticks,
            };

            tokio::select! {
                _ = tokio::time::sleep(period) => continue 'ticks,
                changed = control.changed() => {
                    if changed.is_err() {
                        break 'ticks;
                    }
                }
            }
        }
    }
    debug!("PeriodicTask [{}]: Loop exited", name);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter {
        ticks: AtomicUsize,
        work: Duration,
    }

    #[async_trait]
    impl TickHandler for Counter {
        async fn on_tick(&self) {
            tokio::time::sleep(self.work).await;
            self.ticks.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counter(work: Duration) -> Arc<Counter> {
        Arc::new(Counter {
            ticks: AtomicUsize::new(0),
            work,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_tick_then_periodic() {
        let handler = counter(Duration::ZERO);
        let task = PeriodicTask::spawn("test", Duration::from_secs(2), handler.clone());

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(handler.ticks.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(handler.ticks.load(Ordering::SeqCst), 2);

        task.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_next_tick() {
        let handler = counter(Duration::ZERO);
        let task = PeriodicTask::spawn("test", Duration::from_secs(2), handler.clone());
        tokio::time::sleep(Duration::from_millis(10)).await;

        task.cancel();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(handler.ticks.load(Ordering::SeqCst), 1);
        assert!(task.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_ticks_do_not_overlap() {
        let handler = counter(Duration::from_secs(5));
        let task = PeriodicTask::spawn("test", Duration::from_secs(1), handler.clone());

        // Tick 1 ends at 5s, tick 2 starts at 6s and ends at 11s.
        tokio::time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(handler.ticks.load(Ordering::SeqCst), 1);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(handler.ticks.load(Ordering::SeqCst), 2);

        task.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_changes_period() {
        let handler = counter(Duration::ZERO);
        let task = PeriodicTask::spawn("test", Duration::from_secs(2), handler.clone());
        tokio::time::sleep(Duration::from_millis(10)).await;

        task.reschedule(Duration::from_secs(5));
        assert_eq!(task.period(), Some(Duration::from_secs(5)));

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(handler.ticks.load(Ordering::SeqCst), 1);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(handler.ticks.load(Ordering::SeqCst), 2);

        task.shutdown().await;
    }
}
