//! Focus statistics over the task list.
//!
//! Nothing here records when individual pomodoros finished. Each task's
//! focus time is `completed_pomodoros * work_duration` minutes, attributed
//! to the day the task was last updated. Day, week and month boundaries
//! follow the UTC offset of the `now` passed in; weeks start on Sunday.

mod chart;
mod format;
mod goal;
mod summary;

pub use chart::{focus_time_chart, project_distribution, Bucket, ChartRange, ProjectShare};
pub use format::{format_clock, format_minutes};
pub use goal::{focus_goal_calendar, GoalCalendar, GoalDay};
pub use summary::{summary, Summary, TopProject};

use chrono::{Datelike, FixedOffset, NaiveDate};

use crate::task::Task;

/// Bucket name for tasks without a project.
pub const UNCATEGORIZED: &str = "uncategorized";

fn focus_minutes(task: &Task, work_duration: u32) -> u64 {
    u64::from(task.completed_pomodoros) * u64::from(work_duration)
}

fn local_date(task: &Task, offset: &FixedOffset) -> NaiveDate {
    task.updated_at.with_timezone(offset).date_naive()
}

fn project_key(task: &Task) -> &str {
    task.project_id.as_deref().unwrap_or(UNCATEGORIZED)
}

/// Sunday on or before `date`.
fn week_start(date: NaiveDate) -> NaiveDate {
    date - chrono::Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}
