//! Collaborators the timer controller talks to.
//!
//! All of them take `&self`: the controller is the single owner of the timer
//! state and never calls a port re-entrantly, so implementations are free to
//! use whatever interior bookkeeping they need.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::error::{CueError, Result};
use crate::task::Task;
use crate::timer::{CueKind, TimerSnapshot};

/// Persistence for the timer state. Written after every mutation.
pub trait SnapshotStore {
    fn load(&self) -> Result<Option<TimerSnapshot>>;

    fn save(&self, snapshot: &TimerSnapshot) -> Result<()>;
}

/// Task store as seen by the timer: only used when a work interval completes.
pub trait TaskLedger {
    fn find_task(&self, id: &str) -> Result<Option<Task>>;

    /// Credit one completed work interval to the task.
    fn increment_completed_intervals(&self, id: &str, at: DateTime<Utc>) -> Result<()>;
}

/// Audible or visual transition cue. Fire-and-forget.
pub trait CueSink {
    fn emit(&self, cue: CueKind) -> Result<(), CueError>;
}

/// Any ambient audio that should step aside while a cue plays.
pub trait AudioFocus {
    /// Silence the ambient source. Returns whether it was playing.
    fn suspend(&self) -> bool;

    /// Bring the ambient source back once `delay` has passed.
    fn resume_after(&self, delay: Duration);
}

/// Exclusive right to tick the persisted timer, renewed before every tick.
pub trait RunLease {
    /// Refresh the lease. `Ok(false)` means another owner has taken over.
    fn renew(&self, now: DateTime<Utc>) -> Result<bool>;
}

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Cue sink that drops every cue.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentCues;

impl CueSink for SilentCues {
    fn emit(&self, _cue: CueKind) -> Result<(), CueError> {
        Ok(())
    }
}

impl<T: SnapshotStore + ?Sized> SnapshotStore for &T {
    fn load(&self) -> Result<Option<TimerSnapshot>> {
        (**self).load()
    }

    fn save(&self, snapshot: &TimerSnapshot) -> Result<()> {
        (**self).save(snapshot)
    }
}

impl<T: TaskLedger + ?Sized> TaskLedger for &T {
    fn find_task(&self, id: &str) -> Result<Option<Task>> {
        (**self).find_task(id)
    }

    fn increment_completed_intervals(&self, id: &str, at: DateTime<Utc>) -> Result<()> {
        (**self).increment_completed_intervals(id, at)
    }
}

impl<T: CueSink + ?Sized> CueSink for &T {
    fn emit(&self, cue: CueKind) -> Result<(), CueError> {
        (**self).emit(cue)
    }
}

impl<T: AudioFocus + ?Sized> AudioFocus for &T {
    fn suspend(&self) -> bool {
        (**self).suspend()
    }

    fn resume_after(&self, delay: Duration) {
        (**self).resume_after(delay)
    }
}

impl<T: RunLease + ?Sized> RunLease for &T {
    fn renew(&self, now: DateTime<Utc>) -> Result<bool> {
        (**self).renew(now)
    }
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}
