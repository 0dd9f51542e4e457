//! Pomodoro timer: interval kinds, settings, the pure state machine, its
//! persisted form, and the once-per-second driver.

mod engine;
mod interval;
mod settings;
mod snapshot;
mod ticker;

pub use engine::{Completion, Expired, TimerEngine};
pub use interval::{CueKind, IntervalType};
pub use settings::TimerSettings;
pub use snapshot::{Rehydration, TimerSnapshot};
pub use ticker::{Ticker, TickerExit};
