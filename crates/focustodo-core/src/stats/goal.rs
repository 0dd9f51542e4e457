use chrono::{Datelike, FixedOffset, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{focus_minutes, local_date};
use crate::error::ValidationError;
use crate::task::Task;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalDay {
    pub date: NaiveDate,
    pub minutes: u64,
    pub goal_met: bool,
    /// Rounded percent of the goal, capped at 100.
    pub progress: u32,
}

/// One month of daily focus time against the goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalCalendar {
    pub year: i32,
    pub month: u32,
    /// Weekday of the 1st, 0 = Sunday. Leading blank cells in a
    /// Sunday-first grid.
    pub first_weekday: u32,
    pub goal_minutes: f64,
    pub days: Vec<GoalDay>,
}

/// Focus time for every day of `year`-`month`, with days taken in
/// `offset`'s local time.
pub fn focus_goal_calendar(
    tasks: &[Task],
    work_duration: u32,
    goal_hours: f64,
    year: i32,
    month: u32,
    offset: FixedOffset,
) -> Result<GoalCalendar, ValidationError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
        ValidationError::InvalidValue {
            field: "month".into(),
            message: format!("{year}-{month} is not a calendar month"),
        }
    })?;
    if !goal_hours.is_finite() || goal_hours <= 0.0 {
        return Err(ValidationError::InvalidValue {
            field: "goal_hours".into(),
            message: format!("must be positive, got {goal_hours}"),
        });
    }
    let goal_minutes = goal_hours * 60.0;

    let mut by_date: HashMap<NaiveDate, u64> = HashMap::new();
    for task in tasks.iter().filter(|t| t.completed_pomodoros > 0) {
        *by_date.entry(local_date(task, &offset)).or_default() +=
            focus_minutes(task, work_duration);
    }

    let next_month = first.checked_add_months(Months::new(1));
    let days = first
        .iter_days()
        .take_while(|d| next_month.map_or(true, |next| *d < next))
        .map(|date| {
            let minutes = by_date.get(&date).copied().unwrap_or(0);
            let ratio = minutes as f64 / goal_minutes;
            GoalDay {
                date,
                minutes,
                goal_met: minutes as f64 >= goal_minutes,
                progress: (ratio * 100.0).round().min(100.0) as u32,
            }
        })
        .collect();

    Ok(GoalCalendar {
        year,
        month,
        first_weekday: first.weekday().num_days_from_sunday(),
        goal_minutes,
        days,
    })
}
