//! # Focus Todo Core Library
//!
//! This library provides the core logic for the Focus Todo pomodoro timer.
//! It follows a CLI-first layout: every operation is available through the
//! `focustodo` binary, which is a thin front end over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A pure state machine over work and break intervals;
//!   the caller passes `now` in and ticks it once per second
//! - **Controller**: Owns the engine together with its collaborators (task
//!   ledger, cue sink, audio focus, snapshot store) and runs the completion
//!   sequence
//! - **Storage**: SQLite-backed state and TOML-based configuration
//! - **Stats**: Focus time aggregations over the task list
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`PomodoroController`]: Single owner of the running timer
//! - [`Ticker`]: Once-per-second driver
//! - [`Database`]: Timer, task and interval persistence
//! - [`Config`]: Application configuration management

pub mod controller;
pub mod error;
pub mod events;
pub mod ports;
pub mod stats;
pub mod storage;
pub mod task;
pub mod timer;

pub use controller::{CompletedInterval, PomodoroController, SubscriptionId};
pub use error::{ConfigError, CoreError, CueError, DatabaseError, ValidationError};
pub use events::Event;
pub use ports::{
    AudioFocus, Clock, CueSink, RunLease, SilentCues, SnapshotStore, SystemClock, TaskLedger,
};
pub use storage::{Config, Database, TimerLease};
pub use task::{Project, ProjectStore, Task, TaskStore};
pub use timer::{CueKind, IntervalType, Ticker, TickerExit, TimerEngine, TimerSettings, TimerSnapshot};
