//! Single owner of the timer state.
//!
//! [`PomodoroController`] wraps a [`TimerEngine`] together with the
//! collaborators it needs when an interval ends: the task ledger that gets
//! credited, the cue sink, optional audio focus, and the snapshot store that
//! is written after every mutation. Completion listeners replace the single
//! settable callback slot: any number may be registered and all of them run,
//! in registration order, before the timer moves on to the next interval.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::events::Event;
use crate::ports::{AudioFocus, Clock, CueSink, SilentCues, SnapshotStore, SystemClock, TaskLedger};
use crate::timer::{CueKind, IntervalType, TimerEngine, TimerSettings};

/// Handle returned by [`PomodoroController::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Passed to completion listeners once per finished work interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedInterval {
    pub interval: IntervalType,
    pub task_id: Option<String>,
    /// The selected task existed and was credited.
    pub credited: bool,
    pub duration_min: u32,
    pub at: DateTime<Utc>,
}

type Listener<'a> = Box<dyn FnMut(&CompletedInterval) + 'a>;

pub struct PomodoroController<'a> {
    engine: TimerEngine,
    store: Box<dyn SnapshotStore + 'a>,
    tasks: Box<dyn TaskLedger + 'a>,
    cues: Box<dyn CueSink + 'a>,
    audio: Option<Box<dyn AudioFocus + 'a>>,
    clock: Box<dyn Clock + 'a>,
    listeners: Vec<(SubscriptionId, Listener<'a>)>,
    next_subscription: u64,
}

impl<'a> PomodoroController<'a> {
    /// Controller over a fresh engine with default settings, the system
    /// clock and silent cues. Call [`PomodoroController::hydrate`] to pick up
    /// persisted state.
    pub fn new(store: impl SnapshotStore + 'a, tasks: impl TaskLedger + 'a) -> Self {
        Self {
            engine: TimerEngine::default(),
            store: Box::new(store),
            tasks: Box::new(tasks),
            cues: Box::new(SilentCues),
            audio: None,
            clock: Box::new(SystemClock),
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'a) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_cues(mut self, cues: impl CueSink + 'a) -> Self {
        self.cues = Box::new(cues);
        self
    }

    pub fn with_audio_focus(mut self, audio: impl AudioFocus + 'a) -> Self {
        self.audio = Some(Box::new(audio));
        self
    }

    /// Start from a fresh engine using `settings` instead of the defaults.
    pub fn with_settings(mut self, settings: TimerSettings) -> Self {
        self.engine = TimerEngine::new(settings);
        self
    }

    /// Replace the in-memory state with the persisted one, brought up to the
    /// current time.
    ///
    /// Unreadable storage counts as "no prior state". An interval that ran
    /// out while nothing was running is left paused at zero; its completion
    /// is not replayed.
    pub fn hydrate(&mut self) -> Option<Event> {
        let snapshot = match self.store.load() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "could not read timer state, starting fresh");
                return None;
            }
        };

        let now = self.clock.now();
        let rehydration = snapshot.rehydrate(now);
        self.engine = TimerEngine::restore(rehydration.snapshot);
        if rehydration.expired_while_suspended {
            tracing::info!(
                interval = %self.engine.interval(),
                "interval ran out while suspended; completion not replayed"
            );
        }
        self.persist();

        Some(Event::Rehydrated {
            running: self.engine.is_running(),
            remaining_secs: self.engine.remaining_secs(),
            expired_while_suspended: rehydration.expired_while_suspended,
            at: now,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn is_running(&self) -> bool {
        self.engine.is_running()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn snapshot_event(&self) -> Event {
        self.engine.snapshot_event(self.clock.now())
    }

    // ── Listeners ────────────────────────────────────────────────────

    /// Register a listener for completed work intervals.
    pub fn subscribe(&mut self, listener: impl FnMut(&CompletedInterval) + 'a) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns whether the listener was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        let event = self.engine.start(self.clock.now())?;
        self.persist();
        Some(event)
    }

    pub fn pause(&mut self) -> Option<Event> {
        let event = self.engine.pause(self.clock.now())?;
        self.persist();
        Some(event)
    }

    pub fn reset(&mut self) -> Event {
        let event = self.engine.reset(self.clock.now());
        self.persist();
        event
    }

    pub fn reset_all(&mut self) -> Event {
        let event = self.engine.reset_all(self.clock.now());
        self.persist();
        event
    }

    pub fn set_type(&mut self, interval: IntervalType) -> Option<Event> {
        let event = self.engine.set_type(interval, self.clock.now())?;
        self.persist();
        Some(event)
    }

    pub fn set_selected_task(&mut self, task_id: Option<String>) -> Event {
        let event = self.engine.set_selected_task(task_id, self.clock.now());
        self.persist();
        event
    }

    /// Settings are expected to be validated already.
    pub fn apply_settings(&mut self, settings: TimerSettings) -> Event {
        let event = self.engine.apply_settings(settings, self.clock.now());
        self.persist();
        event
    }

    /// One second of countdown. Returns the completion events when the
    /// interval ran out.
    pub fn tick(&mut self) -> Vec<Event> {
        let now = self.clock.now();
        let Some(expired) = self.engine.tick(now) else {
            self.persist();
            return Vec::new();
        };

        let is_work = expired.interval == IntervalType::Work;
        let credited = match (&expired.selected_task_id, is_work) {
            (Some(task_id), true) => self.credit(task_id, now),
            _ => false,
        };

        let mut events = vec![Event::IntervalCompleted {
            interval: expired.interval,
            task_id: expired.selected_task_id.clone(),
            credited,
            at: now,
        }];

        if is_work {
            let completed = CompletedInterval {
                interval: expired.interval,
                task_id: expired.selected_task_id.clone(),
                credited,
                duration_min: self.engine.settings().duration_min(expired.interval),
                at: now,
            };
            for (_, listener) in self.listeners.iter_mut() {
                listener(&completed);
            }
        }

        let completion = self.engine.complete(expired, now);
        if let Some(cue) = completion.cue {
            self.emit_cue(cue);
        }
        events.push(completion.to_event());
        self.persist();
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn credit(&self, task_id: &str, now: DateTime<Utc>) -> bool {
        match self.tasks.find_task(task_id) {
            Ok(Some(_)) => match self.tasks.increment_completed_intervals(task_id, now) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(task_id, error = %e, "failed to credit task");
                    false
                }
            },
            Ok(None) => {
                tracing::debug!(task_id, "selected task no longer exists, not credited");
                false
            }
            Err(e) => {
                tracing::warn!(task_id, error = %e, "failed to look up task");
                false
            }
        }
    }

    fn emit_cue(&self, cue: CueKind) {
        let ambient_was_playing = self.audio.as_ref().is_some_and(|audio| audio.suspend());
        if let Err(e) = self.cues.emit(cue) {
            tracing::warn!(?cue, error = %e, "cue playback failed");
        }
        if ambient_was_playing {
            if let Some(audio) = &self.audio {
                audio.resume_after(cue.play_length());
            }
        }
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.engine.snapshot()) {
            tracing::warn!(error = %e, "failed to persist timer state");
        }
    }
}
