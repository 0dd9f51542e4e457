//! Once-per-second driver for a running timer.

use std::future::Future;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::controller::PomodoroController;
use crate::events::Event;
use crate::ports::RunLease;

/// Why [`Ticker::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerExit {
    /// The timer stopped running on its own.
    Idle,
    /// The shutdown future resolved first. The countdown is left running.
    Interrupted,
    /// Another process took over the timer lease. Nothing was persisted
    /// after the takeover.
    LeaseLost,
}

/// Drives [`PomodoroController::tick`] while the timer runs.
///
/// `run` borrows the controller mutably for its whole duration, so two
/// tickers can never drive the same controller. Across processes sharing
/// one database, use [`Ticker::run_leased`] with a
/// [`TimerLease`](crate::storage::TimerLease).
#[derive(Debug, Clone, Copy)]
pub struct Ticker {
    period: Duration,
}

impl Default for Ticker {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(1),
        }
    }
}

impl Ticker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn run<S, F>(
        &self,
        controller: &mut PomodoroController<'_>,
        shutdown: S,
        on_event: F,
    ) -> TickerExit
    where
        S: Future<Output = ()>,
        F: FnMut(&Event),
    {
        self.drive(controller, None, shutdown, on_event).await
    }

    /// Like [`Ticker::run`], renewing `lease` before every tick. Stops
    /// without ticking once the lease is lost.
    pub async fn run_leased<S, F>(
        &self,
        controller: &mut PomodoroController<'_>,
        lease: &dyn RunLease,
        shutdown: S,
        on_event: F,
    ) -> TickerExit
    where
        S: Future<Output = ()>,
        F: FnMut(&Event),
    {
        self.drive(controller, Some(lease), shutdown, on_event).await
    }

    async fn drive<S, F>(
        &self,
        controller: &mut PomodoroController<'_>,
        lease: Option<&dyn RunLease>,
        shutdown: S,
        mut on_event: F,
    ) -> TickerExit
    where
        S: Future<Output = ()>,
        F: FnMut(&Event),
    {
        tokio::pin!(shutdown);

        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately.
        interval.tick().await;

        while controller.is_running() {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::debug!(
                        remaining_secs = controller.engine().remaining_secs(),
                        "ticker interrupted"
                    );
                    return TickerExit::Interrupted;
                }
                _ = interval.tick() => {
                    if let Some(lease) = lease {
                        match lease.renew(controller.now()) {
                            Ok(true) => {}
                            Ok(false) => {
                                tracing::warn!("timer lease taken over by another process");
                                return TickerExit::LeaseLost;
                            }
                            Err(e) => tracing::warn!(error = %e, "failed to renew timer lease"),
                        }
                    }
                    for event in controller.tick() {
                        on_event(&event);
                    }
                }
            }
        }
        TickerExit::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemorySnapshotStore;
    use crate::task::TaskStore;
    use crate::error::Result;
    use crate::timer::{IntervalType, TimerSettings};
    use chrono::{DateTime, Utc};
    use std::cell::{Cell, RefCell};

    fn one_minute_work() -> TimerSettings {
        TimerSettings {
            work_duration: 1,
            auto_start_breaks: false,
            ..TimerSettings::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn runs_until_interval_ends() {
        let store = MemorySnapshotStore::default();
        let tasks = RefCell::new(TaskStore::default());
        let mut controller =
            PomodoroController::new(&store, &tasks).with_settings(one_minute_work());
        controller.start();

        let mut events = Vec::new();
        let exit = Ticker::new()
            .run(&mut controller, std::future::pending(), |e| {
                events.push(e.clone())
            })
            .await;

        assert_eq!(exit, TickerExit::Idle);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Event::IntervalCompleted { .. }));
        assert_eq!(controller.engine().interval(), IntervalType::ShortBreak);
        assert!(!controller.is_running());
        assert_eq!(store.get().unwrap().interval, IntervalType::ShortBreak);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_leaves_timer_running() {
        let store = MemorySnapshotStore::default();
        let tasks = RefCell::new(TaskStore::default());
        let mut controller =
            PomodoroController::new(&store, &tasks).with_settings(one_minute_work());
        controller.start();

        let shutdown = tokio::time::sleep(Duration::from_millis(10_500));
        let exit = Ticker::new().run(&mut controller, shutdown, |_| {}).await;

        assert_eq!(exit, TickerExit::Interrupted);
        assert!(controller.is_running());
        assert_eq!(controller.engine().remaining_secs(), 50);
        assert_eq!(store.get().unwrap().remaining_secs, 50);
    }

    /// Lease that is taken over after a fixed number of renewals.
    struct ExpiringLease {
        renewals_left: Cell<u32>,
    }

    impl RunLease for ExpiringLease {
        fn renew(&self, _now: DateTime<Utc>) -> Result<bool> {
            let left = self.renewals_left.get();
            if left == 0 {
                return Ok(false);
            }
            self.renewals_left.set(left - 1);
            Ok(true)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn lost_lease_stops_ticking_without_persisting() {
        let store = MemorySnapshotStore::default();
        let tasks = RefCell::new(TaskStore::default());
        let mut controller =
            PomodoroController::new(&store, &tasks).with_settings(one_minute_work());
        controller.start();

        let lease = ExpiringLease {
            renewals_left: Cell::new(5),
        };
        let exit = Ticker::new()
            .run_leased(&mut controller, &lease, std::future::pending(), |_| {})
            .await;

        assert_eq!(exit, TickerExit::LeaseLost);
        assert_eq!(controller.engine().remaining_secs(), 55);
        assert_eq!(store.get().unwrap().remaining_secs, 55);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_timer_returns_immediately() {
        let store = MemorySnapshotStore::default();
        let tasks = RefCell::new(TaskStore::default());
        let mut controller = PomodoroController::new(&store, &tasks);

        let exit = Ticker::new()
            .run(&mut controller, std::future::pending(), |_| {})
            .await;
        assert_eq!(exit, TickerExit::Idle);
        assert_eq!(controller.engine().remaining_secs(), 25 * 60);
    }
}
