use chrono::Utc;
use clap::Subcommand;
use focustodo_core::error::CueError;
use focustodo_core::stats::format_clock;
use focustodo_core::storage::{Database, TimerLease};
use focustodo_core::{
    Config, CoreError, CueKind, CueSink, Event, IntervalType, PomodoroController, SnapshotStore,
    TaskLedger, Ticker, TickerExit, TimerEngine,
};
use std::io::Write;

use super::{print_json, resolve_id, CliResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start or resume the countdown
    Start,
    /// Pause the countdown
    Pause,
    /// Refill the current interval
    Reset,
    /// Back to a fresh work interval and zero completed sessions
    ResetAll,
    /// Switch interval kind (work, short-break, long-break)
    Type {
        kind: IntervalType,
    },
    /// Select the task credited when a work interval completes
    Select {
        /// Task ID or unique prefix
        task_id: String,
    },
    /// Clear the selected task
    Deselect,
    /// Print current timer state as JSON
    Status {
        /// One line: kind, clock and state
        #[arg(long)]
        short: bool,
    },
    /// Run the countdown in the foreground until it stops or Ctrl-C
    Run,
}

/// Rings the terminal bell and names the cue on stderr.
struct TerminalCue;

impl CueSink for TerminalCue {
    fn emit(&self, cue: CueKind) -> Result<(), CueError> {
        let mut stderr = std::io::stderr().lock();
        writeln!(stderr, "\x07{}", cue.message())?;
        stderr.flush()?;
        Ok(())
    }
}

/// Controller over the database, brought up to date and configured.
fn open_controller<'a>(db: &'a Database, config: &Config) -> PomodoroController<'a> {
    let mut ctl = PomodoroController::new(db, db).with_cues(TerminalCue);
    if let Some(Event::Rehydrated {
        expired_while_suspended: true,
        ..
    }) = ctl.hydrate()
    {
        eprintln!("{} ran out while no timer was running", ctl.engine().interval().label());
    }
    if *ctl.engine().settings() != config.timer {
        ctl.apply_settings(config.timer);
    }
    ctl.subscribe(move |done| {
        if let Err(e) =
            db.record_interval(done.task_id.as_deref(), done.interval, done.duration_min, done.at)
        {
            tracing::warn!(error = %e, "failed to record completed interval");
        }
    });
    ctl
}

fn print_event_or_status(ctl: &PomodoroController<'_>, event: Option<Event>) -> CliResult {
    match event {
        Some(event) => print_json(&event),
        None => print_json(&ctl.snapshot_event()),
    }
}

/// Current state without writing anything, for use while another process
/// drives the timer.
fn peek(db: &Database) -> Result<TimerEngine, CoreError> {
    Ok(match db.load()? {
        Some(snapshot) => TimerEngine::restore(snapshot.rehydrate(Utc::now()).snapshot),
        None => TimerEngine::default(),
    })
}

fn status_line(engine: &TimerEngine) -> String {
    let state = if engine.is_running() { "running" } else { "paused" };
    format!(
        "{} {} ({state}, round {}/{})",
        engine.interval(),
        format_clock(engine.remaining_secs()),
        engine.current_round(),
        engine.settings().long_break_interval,
    )
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

fn print_status(engine: &TimerEngine, short: bool) -> CliResult {
    if short {
        println!("{}", status_line(engine));
        Ok(())
    } else {
        print_json(&engine.snapshot_event(Utc::now()))
    }
}

/// Tick in the foreground while holding the timer lease.
fn run_foreground(ctl: &mut PomodoroController<'_>, lease: &TimerLease<'_>) -> CliResult {
    if let Some(event) = ctl.start() {
        print_json(&event)?;
    }
    eprintln!("{}", status_line(ctl.engine()));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let mut failed = None;
    let ticker = Ticker::new();
    let exit = runtime.block_on(ticker.run_leased(ctl, lease, ctrl_c(), |event| {
        if let Err(e) = print_json(event) {
            failed.get_or_insert(e.to_string());
        }
        if let Event::IntervalAdvanced { auto_started: true, .. } = event {
            eprintln!("continuing into the next interval");
        }
    }));
    if let Some(e) = failed {
        return Err(e.into());
    }

    match exit {
        TickerExit::Idle => eprintln!("{}", status_line(ctl.engine())),
        TickerExit::Interrupted => eprintln!(
            "\ninterrupted, timer keeps running: {}",
            status_line(ctl.engine())
        ),
        TickerExit::LeaseLost => return Err("another process took over the timer".into()),
    }
    Ok(())
}

pub fn run(action: TimerAction) -> CliResult {
    let config = Config::load()?;
    let db = Database::open()?;

    // Taken before hydrating, so a second runner never touches the state.
    let lease = match action {
        TimerAction::Run => Some(db.acquire_timer_lease(Utc::now())?),
        _ => None,
    };
    // Any change would be overwritten by the runner's next tick.
    if lease.is_none() && db.timer_lease_held(Utc::now())? {
        return match action {
            TimerAction::Status { short } => print_status(&peek(&db)?, short),
            _ => Err(CoreError::TimerBusy.into()),
        };
    }

    let mut ctl = open_controller(&db, &config);

    match action {
        TimerAction::Start => {
            let event = ctl.start();
            print_event_or_status(&ctl, event)?;
        }
        TimerAction::Pause => {
            let event = ctl.pause();
            print_event_or_status(&ctl, event)?;
        }
        TimerAction::Reset => print_json(&ctl.reset())?,
        TimerAction::ResetAll => print_json(&ctl.reset_all())?,
        TimerAction::Type { kind } => {
            if ctl.is_running() {
                return Err("pause the timer before switching interval".into());
            }
            if kind.is_break() && config.timer.disable_break {
                return Err("breaks are disabled".into());
            }
            let event = ctl.set_type(kind);
            print_event_or_status(&ctl, event)?;
        }
        TimerAction::Select { task_id } => {
            let tasks = db.load_tasks()?;
            let id = resolve_id("task", &task_id, tasks.tasks().iter().map(|t| t.id.as_str()))?;
            if db.find_task(&id)?.is_none() {
                return Err(format!("no task with id '{id}'").into());
            }
            print_json(&ctl.set_selected_task(Some(id)))?;
        }
        TimerAction::Deselect => print_json(&ctl.set_selected_task(None))?,
        TimerAction::Status { short } => print_status(ctl.engine(), short)?,
        TimerAction::Run => {
            if let Some(lease) = &lease {
                run_foreground(&mut ctl, lease)?;
            }
        }
    }
    Ok(())
}
