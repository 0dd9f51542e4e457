//! Persisted form of the timer and its rehydration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::interval::IntervalType;
use super::settings::TimerSettings;

/// Every field of the timer state, as written to storage after each
/// mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    #[serde(default)]
    pub interval: IntervalType,
    pub remaining_secs: u64,
    #[serde(default)]
    pub running: bool,
    #[serde(default)]
    pub work_sessions_completed: u32,
    #[serde(default)]
    pub selected_task_id: Option<String>,
    /// When `remaining_secs` was last brought up to date while running.
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub settings: TimerSettings,
}

/// Result of bringing a stored snapshot up to `now`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rehydration {
    pub snapshot: TimerSnapshot,
    /// The countdown hit zero while nothing was running. The completion
    /// (task credit, auto-transition) is not replayed.
    pub expired_while_suspended: bool,
}

impl TimerSnapshot {
    /// Account for the wall-clock time that passed since the snapshot was
    /// written.
    ///
    /// A running countdown with time left keeps running with the reduced
    /// remainder and a fresh `started_at`. One that ran out lands paused at
    /// zero.
    pub fn rehydrate(mut self, now: DateTime<Utc>) -> Rehydration {
        let (true, Some(started_at)) = (self.running, self.started_at) else {
            return Rehydration {
                snapshot: self,
                expired_while_suspended: false,
            };
        };

        let elapsed = u64::try_from((now - started_at).num_seconds()).unwrap_or(0);
        let remaining = self.remaining_secs.saturating_sub(elapsed);
        if remaining > 0 {
            self.remaining_secs = remaining;
            self.started_at = Some(now);
            Rehydration {
                snapshot: self,
                expired_while_suspended: false,
            }
        } else {
            self.remaining_secs = 0;
            self.running = false;
            self.started_at = None;
            Rehydration {
                snapshot: self,
                expired_while_suspended: true,
            }
        }
    }
}
