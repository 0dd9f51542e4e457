//! Timer engine implementation.
//!
//! The engine is a plain state machine over work and break intervals. It
//! owns no threads and no clock: callers pass `now` into every mutating
//! operation and invoke [`TimerEngine::tick`] once per second while the
//! timer runs.
//!
//! ## State Transitions
//!
//! ```text
//! Work ──(expire)──> ShortBreak | LongBreak ──(expire)──> Work
//!   ^                                                       |
//!   +──────────── (expire, breaks disabled) ────────────────+
//! ```
//!
//! Each interval is further either running or paused. Expiry is split in
//! two steps, [`TimerEngine::tick`] reporting an [`Expired`] interval and
//! [`TimerEngine::complete`] performing the transition, so that the owner
//! can credit tasks and notify listeners in between.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(TimerSettings::default());
//! engine.start(Utc::now());
//! // Once per second:
//! if let Some(expired) = engine.tick(Utc::now()) {
//!     let completion = engine.complete(expired, Utc::now());
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::interval::{CueKind, IntervalType};
use super::settings::TimerSettings;
use super::snapshot::TimerSnapshot;
use crate::events::Event;

/// An interval whose countdown reached zero and is waiting to be completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expired {
    pub interval: IntervalType,
    /// Task selected when the countdown ran out.
    pub selected_task_id: Option<String>,
    pub at: DateTime<Utc>,
}

/// Outcome of [`TimerEngine::complete`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub completed: IntervalType,
    pub next: IntervalType,
    pub work_sessions_completed: u32,
    pub auto_started: bool,
    /// Cue to emit, already gated on `sound_enabled`.
    pub cue: Option<CueKind>,
    pub at: DateTime<Utc>,
}

impl Completion {
    pub fn to_event(&self) -> Event {
        Event::IntervalAdvanced {
            from: self.completed,
            to: self.next,
            work_sessions_completed: self.work_sessions_completed,
            auto_started: self.auto_started,
            cue: self.cue,
            at: self.at,
        }
    }
}

/// Core timer engine.
///
/// Invariants held after every operation:
/// - `remaining_secs` lies in `[0, settings.duration_secs(interval)]`
/// - `running` iff `started_at` is set
/// - breaks never show while `settings.disable_break` is on
#[derive(Debug, Clone, PartialEq)]
pub struct TimerEngine {
    interval: IntervalType,
    remaining_secs: u64,
    running: bool,
    work_sessions_completed: u32,
    selected_task_id: Option<String>,
    /// Wall-clock time of the last mutation while running.
    started_at: Option<DateTime<Utc>>,
    settings: TimerSettings,
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new(TimerSettings::default())
    }
}

impl TimerEngine {
    /// Create a paused engine at the start of a work interval.
    pub fn new(settings: TimerSettings) -> Self {
        Self {
            interval: IntervalType::Work,
            remaining_secs: settings.duration_secs(IntervalType::Work),
            running: false,
            work_sessions_completed: 0,
            selected_task_id: None,
            started_at: None,
            settings,
        }
    }

    /// Rebuild an engine from a snapshot, re-establishing the invariants on
    /// whatever was stored.
    pub fn restore(snapshot: TimerSnapshot) -> Self {
        let settings = snapshot.settings;
        let mut interval = snapshot.interval;
        let mut remaining_secs = snapshot.remaining_secs;
        if settings.disable_break && interval.is_break() {
            interval = IntervalType::Work;
            remaining_secs = settings.duration_secs(IntervalType::Work);
        }
        remaining_secs = remaining_secs.min(settings.duration_secs(interval));

        let started_at = snapshot
            .started_at
            .filter(|_| snapshot.running && remaining_secs > 0);

        Self {
            interval,
            remaining_secs,
            running: started_at.is_some(),
            work_sessions_completed: snapshot.work_sessions_completed,
            selected_task_id: snapshot.selected_task_id,
            started_at,
            settings,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn interval(&self) -> IntervalType {
        self.interval
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn work_sessions_completed(&self) -> u32 {
        self.work_sessions_completed
    }

    pub fn selected_task_id(&self) -> Option<&str> {
        self.selected_task_id.as_deref()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    /// Full length of the current interval in seconds.
    pub fn total_secs(&self) -> u64 {
        self.settings.duration_secs(self.interval)
    }

    /// 0.0 .. 1.0 progress within the current interval.
    pub fn progress(&self) -> f64 {
        let total = self.total_secs();
        if total == 0 {
            return 0.0;
        }
        1.0 - (self.remaining_secs as f64 / total as f64)
    }

    /// 1-based round within the current long-break cycle.
    pub fn current_round(&self) -> u32 {
        let in_work = u32::from(self.interval == IntervalType::Work);
        self.work_sessions_completed.saturating_add(in_work)
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            interval: self.interval,
            remaining_secs: self.remaining_secs,
            running: self.running,
            work_sessions_completed: self.work_sessions_completed,
            selected_task_id: self.selected_task_id.clone(),
            started_at: self.started_at,
            settings: self.settings,
        }
    }

    /// Build a full state snapshot event.
    pub fn snapshot_event(&self, now: DateTime<Utc>) -> Event {
        Event::StateSnapshot {
            interval: self.interval,
            running: self.running,
            remaining_secs: self.remaining_secs,
            total_secs: self.total_secs(),
            work_sessions_completed: self.work_sessions_completed,
            long_break_interval: self.settings.long_break_interval,
            selected_task_id: self.selected_task_id.clone(),
            progress: self.progress(),
            at: now,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start counting down. Starting a running timer changes nothing.
    ///
    /// An interval left at zero (it ran out while nothing was ticking) is
    /// refilled first, so its completion is never credited late.
    pub fn start(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.running {
            return None;
        }
        if self.remaining_secs == 0 {
            self.remaining_secs = self.total_secs();
        }
        self.running = true;
        self.started_at = Some(now);
        Some(Event::TimerStarted {
            interval: self.interval,
            remaining_secs: self.remaining_secs,
            at: now,
        })
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if !self.running {
            return None;
        }
        self.running = false;
        self.started_at = None;
        Some(Event::TimerPaused {
            interval: self.interval,
            remaining_secs: self.remaining_secs,
            at: now,
        })
    }

    /// Refill the current interval and pause. Keeps the interval type and
    /// the session count.
    pub fn reset(&mut self, now: DateTime<Utc>) -> Event {
        self.running = false;
        self.started_at = None;
        self.remaining_secs = self.total_secs();
        Event::TimerReset {
            interval: self.interval,
            remaining_secs: self.remaining_secs,
            at: now,
        }
    }

    /// Back to a fresh work interval with no completed sessions.
    pub fn reset_all(&mut self, now: DateTime<Utc>) -> Event {
        self.interval = IntervalType::Work;
        self.remaining_secs = self.total_secs();
        self.work_sessions_completed = 0;
        self.running = false;
        self.started_at = None;
        Event::TimerResetAll { at: now }
    }

    /// Switch interval kind. Ignored while running, and ignored for break
    /// kinds while breaks are disabled.
    pub fn set_type(&mut self, interval: IntervalType, now: DateTime<Utc>) -> Option<Event> {
        if self.running || (self.settings.disable_break && interval.is_break()) {
            return None;
        }
        self.interval = interval;
        self.remaining_secs = self.total_secs();
        Some(Event::IntervalSelected {
            interval,
            remaining_secs: self.remaining_secs,
            at: now,
        })
    }

    pub fn set_selected_task(&mut self, task_id: Option<String>, now: DateTime<Utc>) -> Event {
        self.selected_task_id = task_id.clone();
        Event::TaskSelected { task_id, at: now }
    }

    /// Advance the countdown by one second.
    ///
    /// Returns the expired interval when the countdown reaches zero; the
    /// timer is then paused at 0 until [`TimerEngine::complete`] runs.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<Expired> {
        if !self.running {
            return None;
        }
        if self.remaining_secs > 1 {
            self.remaining_secs -= 1;
            self.started_at = Some(now);
            return None;
        }
        self.remaining_secs = 0;
        self.running = false;
        self.started_at = None;
        Some(Expired {
            interval: self.interval,
            selected_task_id: self.selected_task_id.clone(),
            at: now,
        })
    }

    /// Transition out of an expired interval.
    pub fn complete(&mut self, expired: Expired, now: DateTime<Utc>) -> Completion {
        let settings = self.settings;
        let (next, auto_start, cue) = match expired.interval {
            IntervalType::Work => {
                self.work_sessions_completed = self.work_sessions_completed.saturating_add(1);
                if settings.disable_break {
                    // Nothing resets the count without long breaks.
                    self.work_sessions_completed = self
                        .work_sessions_completed
                        .min(settings.long_break_interval);
                    (IntervalType::Work, settings.auto_start_pomodoros, None)
                } else if self.work_sessions_completed >= settings.long_break_interval {
                    (
                        IntervalType::LongBreak,
                        settings.auto_start_breaks,
                        Some(CueKind::LongBreakStart),
                    )
                } else {
                    (
                        IntervalType::ShortBreak,
                        settings.auto_start_breaks,
                        Some(CueKind::ShortBreakStart),
                    )
                }
            }
            IntervalType::ShortBreak => (
                IntervalType::Work,
                settings.auto_start_pomodoros,
                Some(CueKind::ShortBreakEnd),
            ),
            IntervalType::LongBreak => {
                self.work_sessions_completed = 0;
                (
                    IntervalType::Work,
                    settings.auto_start_pomodoros,
                    Some(CueKind::LongBreakEnd),
                )
            }
        };

        self.interval = next;
        self.remaining_secs = self.total_secs();
        self.running = false;
        self.started_at = None;
        if auto_start {
            self.start(now);
        }

        tracing::debug!(
            from = %expired.interval,
            to = %next,
            sessions = self.work_sessions_completed,
            auto_start,
            "interval completed"
        );

        Completion {
            completed: expired.interval,
            next,
            work_sessions_completed: self.work_sessions_completed,
            auto_started: auto_start,
            cue: cue.filter(|_| settings.sound_enabled),
            at: now,
        }
    }

    /// Replace the settings, reconciling the countdown with the new durations.
    ///
    /// A paused countdown that is neither untouched nor expired keeps its
    /// remaining time (only clamped when the new duration is shorter).
    pub fn apply_settings(&mut self, settings: TimerSettings, now: DateTime<Utc>) -> Event {
        let old = std::mem::replace(&mut self.settings, settings);

        if settings.disable_break && self.interval.is_break() {
            self.interval = IntervalType::Work;
            self.remaining_secs = self.total_secs();
            self.running = false;
            self.started_at = None;
            return Event::SettingsApplied {
                forced_to_work: true,
                remaining_secs: self.remaining_secs,
                at: now,
            };
        }

        if !self.running {
            let old_full = old.duration_secs(self.interval);
            if self.remaining_secs == old_full || self.remaining_secs == 0 {
                self.remaining_secs = self.total_secs();
            }
        }
        self.remaining_secs = self.remaining_secs.min(self.total_secs());

        Event::SettingsApplied {
            forced_to_work: false,
            remaining_secs: self.remaining_secs,
            at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
    }

    /// Tick until the running interval expires, then complete it.
    fn run_out(engine: &mut TimerEngine) -> Completion {
        let mut now = t0();
        loop {
            now += chrono::Duration::seconds(1);
            if let Some(expired) = engine.tick(now) {
                return engine.complete(expired, now);
            }
        }
    }

    #[test]
    fn new_engine_is_paused_work() {
        let engine = TimerEngine::default();
        assert_eq!(engine.interval(), IntervalType::Work);
        assert_eq!(engine.remaining_secs(), 25 * 60);
        assert!(!engine.is_running());
        assert!(engine.started_at().is_none());
        assert_eq!(engine.current_round(), 1);
    }

    #[test]
    fn start_then_pause_keeps_remaining() {
        let mut engine = TimerEngine::default();
        assert!(engine.start(t0()).is_some());
        assert_eq!(engine.started_at(), Some(t0()));
        assert!(engine.pause(t0()).is_some());
        assert_eq!(engine.remaining_secs(), 25 * 60);
        assert!(engine.started_at().is_none());
    }

    #[test]
    fn start_is_idempotent() {
        let mut engine = TimerEngine::default();
        engine.start(t0());
        let later = t0() + chrono::Duration::seconds(30);
        assert!(engine.start(later).is_none());
        assert_eq!(engine.started_at(), Some(t0()));
    }

    #[test]
    fn full_work_interval_moves_to_short_break() {
        let mut engine = TimerEngine::default();
        engine.start(t0());
        let mut expired = None;
        for i in 1..=25 * 60 {
            expired = engine.tick(t0() + chrono::Duration::seconds(i));
            if i < 25 * 60 {
                assert!(expired.is_none());
            }
        }
        let expired = expired.expect("work interval should expire");
        assert_eq!(engine.remaining_secs(), 0);
        assert!(!engine.is_running());

        let completion = engine.complete(expired, t0());
        assert_eq!(completion.next, IntervalType::ShortBreak);
        assert_eq!(completion.cue, Some(CueKind::ShortBreakStart));
        assert_eq!(engine.interval(), IntervalType::ShortBreak);
        assert_eq!(engine.remaining_secs(), 5 * 60);
        assert_eq!(engine.work_sessions_completed(), 1);
        // auto_start_breaks is on by default
        assert!(engine.is_running());
    }

    #[test]
    fn fourth_work_session_earns_long_break() {
        let mut engine = TimerEngine::default();
        for round in 1..=4 {
            engine.start(t0());
            let c = run_out(&mut engine);
            if round < 4 {
                assert_eq!(c.next, IntervalType::ShortBreak);
            } else {
                assert_eq!(c.next, IntervalType::LongBreak);
                assert_eq!(c.cue, Some(CueKind::LongBreakStart));
            }
            assert_eq!(engine.work_sessions_completed(), round);
            let c = run_out(&mut engine);
            assert_eq!(c.next, IntervalType::Work);
            // auto_start_pomodoros is off by default
            assert!(!engine.is_running());
        }
        assert_eq!(engine.work_sessions_completed(), 0);
        assert_eq!(engine.remaining_secs(), 25 * 60);
    }

    #[test]
    fn lowering_long_break_interval_triggers_long_break_immediately() {
        let mut engine = TimerEngine::default();
        for _ in 0..2 {
            engine.start(t0());
            run_out(&mut engine);
            run_out(&mut engine);
        }
        assert_eq!(engine.work_sessions_completed(), 2);

        let settings = TimerSettings {
            long_break_interval: 1,
            ..TimerSettings::default()
        };
        engine.apply_settings(settings, t0());
        engine.start(t0());
        let c = run_out(&mut engine);
        assert_eq!(c.next, IntervalType::LongBreak);
    }

    #[test]
    fn disabled_breaks_always_return_to_work() {
        let settings = TimerSettings {
            disable_break: true,
            auto_start_pomodoros: true,
            ..TimerSettings::default()
        };
        let mut engine = TimerEngine::new(settings);
        engine.start(t0());
        for _ in 0..10 {
            let c = run_out(&mut engine);
            assert_eq!(c.next, IntervalType::Work);
            assert_eq!(engine.interval(), IntervalType::Work);
            assert_eq!(c.cue, None);
            assert!(engine.is_running());
        }
        assert_eq!(engine.work_sessions_completed(), settings.long_break_interval);
    }

    #[test]
    fn start_refills_interval_left_at_zero() {
        let snapshot = TimerSnapshot {
            interval: IntervalType::Work,
            remaining_secs: 0,
            running: false,
            work_sessions_completed: 1,
            selected_task_id: Some("t".into()),
            started_at: None,
            settings: TimerSettings::default(),
        };
        let mut engine = TimerEngine::restore(snapshot);
        assert!(matches!(
            engine.start(t0()),
            Some(Event::TimerStarted {
                remaining_secs: 1500,
                ..
            })
        ));
        assert!(engine.tick(t0() + chrono::Duration::seconds(1)).is_none());
        assert_eq!(engine.remaining_secs(), 25 * 60 - 1);
        assert_eq!(engine.work_sessions_completed(), 1);
    }

    #[test]
    fn sound_disabled_suppresses_cue() {
        let settings = TimerSettings {
            sound_enabled: false,
            ..TimerSettings::default()
        };
        let mut engine = TimerEngine::new(settings);
        engine.start(t0());
        let c = run_out(&mut engine);
        assert_eq!(c.cue, None);
    }

    #[test]
    fn break_end_cue_matches_break_kind() {
        let mut engine = TimerEngine::default();
        engine.set_type(IntervalType::LongBreak, t0());
        engine.start(t0());
        let c = run_out(&mut engine);
        assert_eq!(c.cue, Some(CueKind::LongBreakEnd));

        engine.set_type(IntervalType::ShortBreak, t0());
        engine.start(t0());
        let c = run_out(&mut engine);
        assert_eq!(c.cue, Some(CueKind::ShortBreakEnd));
    }

    #[test]
    fn set_type_while_running_is_ignored() {
        let mut engine = TimerEngine::default();
        engine.start(t0());
        engine.tick(t0() + chrono::Duration::seconds(1));
        let before = engine.clone();
        assert!(engine.set_type(IntervalType::LongBreak, t0()).is_none());
        assert_eq!(engine, before);
    }

    #[test]
    fn set_type_refills_duration() {
        let mut engine = TimerEngine::default();
        engine.set_type(IntervalType::LongBreak, t0());
        assert_eq!(engine.remaining_secs(), 15 * 60);
    }

    #[test]
    fn reset_keeps_type_and_sessions() {
        let mut engine = TimerEngine::default();
        engine.start(t0());
        run_out(&mut engine);
        for i in 1..=10 {
            engine.tick(t0() + chrono::Duration::seconds(i));
        }
        engine.reset(t0());
        assert_eq!(engine.interval(), IntervalType::ShortBreak);
        assert_eq!(engine.remaining_secs(), 5 * 60);
        assert_eq!(engine.work_sessions_completed(), 1);
        assert!(!engine.is_running());

        engine.reset_all(t0());
        assert_eq!(engine.interval(), IntervalType::Work);
        assert_eq!(engine.work_sessions_completed(), 0);
    }

    #[test]
    fn apply_settings_keeps_paused_countdown() {
        let mut engine = TimerEngine::default();
        engine.start(t0());
        for i in 1..=90 {
            engine.tick(t0() + chrono::Duration::seconds(i));
        }
        engine.pause(t0());
        let settings = TimerSettings {
            work_duration: 50,
            ..TimerSettings::default()
        };
        engine.apply_settings(settings, t0());
        assert_eq!(engine.remaining_secs(), 25 * 60 - 90);
    }

    #[test]
    fn apply_settings_refreshes_untouched_timer() {
        let mut engine = TimerEngine::default();
        let settings = TimerSettings {
            work_duration: 50,
            ..TimerSettings::default()
        };
        engine.apply_settings(settings, t0());
        assert_eq!(engine.remaining_secs(), 50 * 60);
    }

    #[test]
    fn apply_settings_refreshes_expired_timer() {
        let mut engine = TimerEngine::default();
        engine.start(t0());
        let expired = (1..=25 * 60).find_map(|i| engine.tick(t0() + chrono::Duration::seconds(i)));
        assert!(expired.is_some());
        assert_eq!(engine.remaining_secs(), 0);
        engine.apply_settings(TimerSettings::default(), t0());
        assert_eq!(engine.remaining_secs(), 25 * 60);
    }

    #[test]
    fn disabling_breaks_during_break_forces_work() {
        let mut engine = TimerEngine::default();
        engine.start(t0());
        run_out(&mut engine);
        assert_eq!(engine.interval(), IntervalType::ShortBreak);
        assert!(engine.is_running());

        let settings = TimerSettings {
            disable_break: true,
            ..TimerSettings::default()
        };
        let event = engine.apply_settings(settings, t0());
        assert!(matches!(
            event,
            Event::SettingsApplied {
                forced_to_work: true,
                ..
            }
        ));
        assert_eq!(engine.interval(), IntervalType::Work);
        assert_eq!(engine.remaining_secs(), 25 * 60);
        assert!(!engine.is_running());
        assert!(engine.started_at().is_none());
    }

    #[test]
    fn break_types_rejected_when_breaks_disabled() {
        let mut engine = TimerEngine::new(TimerSettings {
            disable_break: true,
            ..TimerSettings::default()
        });
        assert!(engine.set_type(IntervalType::ShortBreak, t0()).is_none());
        assert_eq!(engine.interval(), IntervalType::Work);
    }

    #[test]
    fn restore_repairs_inconsistent_snapshot() {
        let snapshot = TimerSnapshot {
            interval: IntervalType::LongBreak,
            remaining_secs: 99_999,
            running: true,
            work_sessions_completed: 2,
            selected_task_id: None,
            started_at: None,
            settings: TimerSettings {
                disable_break: true,
                ..TimerSettings::default()
            },
        };
        let engine = TimerEngine::restore(snapshot);
        assert_eq!(engine.interval(), IntervalType::Work);
        assert_eq!(engine.remaining_secs(), 25 * 60);
        assert!(!engine.is_running());
    }

    #[test]
    fn snapshot_event_reports_progress() {
        let mut engine = TimerEngine::default();
        engine.start(t0());
        for i in 1..=(25 * 60 / 2) {
            engine.tick(t0() + chrono::Duration::seconds(i));
        }
        match engine.snapshot_event(t0()) {
            Event::StateSnapshot {
                progress,
                remaining_secs,
                total_secs,
                ..
            } => {
                assert_eq!(total_secs, 25 * 60);
                assert_eq!(remaining_secs, 25 * 60 / 2);
                assert!((progress - 0.5).abs() < 1e-9);
            }
            other => panic!("Expected StateSnapshot, got {other:?}"),
        }
    }
}
