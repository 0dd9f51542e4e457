use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{CueKind, IntervalType};

/// Every state change of the timer produces an Event.
/// The CLI prints them; completion listeners receive the completion ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        interval: IntervalType,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        interval: IntervalType,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        interval: IntervalType,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResetAll {
        at: DateTime<Utc>,
    },
    IntervalSelected {
        interval: IntervalType,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TaskSelected {
        task_id: Option<String>,
        at: DateTime<Utc>,
    },
    /// A countdown reached zero.
    IntervalCompleted {
        interval: IntervalType,
        task_id: Option<String>,
        /// Whether the selected task existed and was credited.
        credited: bool,
        at: DateTime<Utc>,
    },
    /// The timer moved on to the next interval after a completion.
    IntervalAdvanced {
        from: IntervalType,
        to: IntervalType,
        work_sessions_completed: u32,
        auto_started: bool,
        cue: Option<CueKind>,
        at: DateTime<Utc>,
    },
    SettingsApplied {
        /// Breaks were disabled while a break was showing.
        forced_to_work: bool,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// State was restored from persisted storage.
    Rehydrated {
        running: bool,
        remaining_secs: u64,
        /// The countdown ran out while the process was not alive.
        expired_while_suspended: bool,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        interval: IntervalType,
        running: bool,
        remaining_secs: u64,
        total_secs: u64,
        work_sessions_completed: u32,
        long_break_interval: u32,
        selected_task_id: Option<String>,
        progress: f64,
        at: DateTime<Utc>,
    },
}
