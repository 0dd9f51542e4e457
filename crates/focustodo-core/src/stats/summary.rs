use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{focus_minutes, local_date, project_key, week_start};
use crate::task::Task;

/// Project with the most tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopProject {
    pub id: String,
    pub count: usize,
    /// Share of all tasks, rounded percent.
    pub share: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_pomodoros: u64,
    pub total_minutes: u64,
    pub today_pomodoros: u64,
    pub today_minutes: u64,
    pub week_pomodoros: u64,
    pub week_minutes: u64,
    pub completed_tasks: usize,
    pub total_tasks: usize,
    pub active_tasks: usize,
    /// Rounded percent of tasks marked completed.
    pub completion_rate: u32,
    pub avg_pomodoros_per_task: f64,
    pub avg_minutes_per_task: f64,
    pub top_project: Option<TopProject>,
    /// Rounded percent of this week's focus time spent today.
    pub today_share_of_week: u32,
    pub tasks_by_project: BTreeMap<String, usize>,
}

fn percent(part: u64, whole: u64) -> u32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 * 100.0 / whole as f64).round() as u32
}

pub fn summary(tasks: &[Task], work_duration: u32, now: DateTime<FixedOffset>) -> Summary {
    let offset = now.timezone();
    let today = now.date_naive();
    let week = week_start(today);

    let mut total_pomodoros = 0u64;
    let mut today_pomodoros = 0u64;
    let mut week_pomodoros = 0u64;
    let mut completed_tasks = 0usize;
    // First-seen order decides ties for the top project.
    let mut per_project: Vec<(&str, usize)> = Vec::new();

    for task in tasks {
        let pomodoros = u64::from(task.completed_pomodoros);
        total_pomodoros += pomodoros;
        let day = local_date(task, &offset);
        if day >= today {
            today_pomodoros += pomodoros;
        }
        if day >= week {
            week_pomodoros += pomodoros;
        }
        if task.completed {
            completed_tasks += 1;
        }

        let key = project_key(task);
        match per_project.iter_mut().find(|(id, _)| *id == key) {
            Some((_, count)) => *count += 1,
            None => per_project.push((key, 1)),
        }
    }

    let total_tasks = tasks.len();
    let total_minutes: u64 = tasks.iter().map(|t| focus_minutes(t, work_duration)).sum();
    let minutes = |pomodoros: u64| pomodoros * u64::from(work_duration);
    let today_minutes = minutes(today_pomodoros);
    let week_minutes = minutes(week_pomodoros);

    let top_project = per_project
        .iter()
        .fold(None::<(&str, usize)>, |best, &(id, count)| match best {
            Some((_, best_count)) if count <= best_count => best,
            _ => Some((id, count)),
        })
        .map(|(id, count)| TopProject {
            id: id.to_string(),
            count,
            share: percent(count as u64, total_tasks as u64),
        });

    let (avg_pomodoros_per_task, avg_minutes_per_task) = if total_tasks == 0 {
        (0.0, 0.0)
    } else {
        (
            total_pomodoros as f64 / total_tasks as f64,
            total_minutes as f64 / total_tasks as f64,
        )
    };

    Summary {
        total_pomodoros,
        total_minutes,
        today_pomodoros,
        today_minutes,
        week_pomodoros,
        week_minutes,
        completed_tasks,
        total_tasks,
        active_tasks: total_tasks - completed_tasks,
        completion_rate: percent(completed_tasks as u64, total_tasks as u64),
        avg_pomodoros_per_task,
        avg_minutes_per_task,
        top_project,
        today_share_of_week: percent(today_minutes, week_minutes),
        tasks_by_project: per_project
            .into_iter()
            .map(|(id, count)| (id.to_string(), count))
            .collect(),
    }
}
