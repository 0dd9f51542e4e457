use chrono::{DateTime, Datelike, FixedOffset, Local};
use clap::Subcommand;
use focustodo_core::stats::{self, format_minutes, ChartRange, UNCATEGORIZED};
use focustodo_core::storage::Database;
use focustodo_core::Config;

use super::{print_json, CliResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Totals, today, this week and per-project task counts
    Summary,
    /// Focus time per day, week, month or year
    Chart {
        /// today, daily, weekly, monthly or yearly
        #[arg(long, default_value = "daily")]
        range: ChartRange,
    },
    /// Focus time per project
    Projects {
        /// today, daily, weekly, monthly or yearly
        #[arg(long, default_value = "weekly")]
        range: ChartRange,
    },
    /// Daily focus goal for a month
    Goal {
        /// Defaults to the current year
        #[arg(long)]
        year: Option<i32>,
        /// 1-12, defaults to the current month
        #[arg(long)]
        month: Option<u32>,
    },
    /// Most recent completed intervals
    Records {
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

fn local_now() -> DateTime<FixedOffset> {
    Local::now().fixed_offset()
}

fn bar(minutes: u64, max: u64) -> String {
    const WIDTH: u64 = 30;
    if max == 0 {
        return String::new();
    }
    "#".repeat(((minutes * WIDTH) / max) as usize)
}

pub fn run(action: StatsAction, json: bool) -> CliResult {
    let config = Config::load()?;
    let db = Database::open()?;
    let tasks = db.load_tasks()?;
    let projects = db.load_projects()?;
    let work_duration = config.timer.work_duration;
    let now = local_now();

    let project_name = |id: &str| -> String {
        if id == UNCATEGORIZED {
            "Uncategorized".to_string()
        } else {
            projects.name_of(id).to_string()
        }
    };

    match action {
        StatsAction::Summary => {
            let s = stats::summary(tasks.tasks(), work_duration, now);
            if json {
                return print_json(&s);
            }
            println!(
                "Total:  {} pomodoros, {}",
                s.total_pomodoros,
                format_minutes(s.total_minutes as f64)
            );
            println!(
                "Today:  {} pomodoros, {} ({}% of this week)",
                s.today_pomodoros,
                format_minutes(s.today_minutes as f64),
                s.today_share_of_week
            );
            println!(
                "Week:   {} pomodoros, {}",
                s.week_pomodoros,
                format_minutes(s.week_minutes as f64)
            );
            println!(
                "Tasks:  {}/{} completed ({}%), {} active",
                s.completed_tasks, s.total_tasks, s.completion_rate, s.active_tasks
            );
            println!(
                "Avg:    {:.1} pomodoros, {} per task",
                s.avg_pomodoros_per_task,
                format_minutes(s.avg_minutes_per_task)
            );
            if let Some(top) = &s.top_project {
                println!(
                    "Top:    {} ({} tasks, {}%)",
                    project_name(&top.id),
                    top.count,
                    top.share
                );
            }
        }
        StatsAction::Chart { range } => {
            let buckets = stats::focus_time_chart(tasks.tasks(), work_duration, range, now);
            if json {
                return print_json(&buckets);
            }
            let max = buckets.iter().map(|b| b.minutes).max().unwrap_or(0);
            for bucket in &buckets {
                let label = match range {
                    ChartRange::Monthly => bucket.start.format("%Y-%m").to_string(),
                    ChartRange::Yearly => bucket.start.format("%Y").to_string(),
                    _ => bucket.start.format("%Y-%m-%d").to_string(),
                };
                println!(
                    "{label:<10} {:>8}  {}",
                    format_minutes(bucket.minutes as f64),
                    bar(bucket.minutes, max)
                );
            }
        }
        StatsAction::Projects { range } => {
            let shares = stats::project_distribution(tasks.tasks(), work_duration, range, now);
            if json {
                return print_json(&shares);
            }
            if shares.is_empty() {
                println!("no focus time in this range");
            }
            for share in &shares {
                println!(
                    "{:<20} {:>8}  {:>5.1}%",
                    project_name(&share.project_id),
                    format_minutes(share.minutes as f64),
                    share.percent
                );
            }
        }
        StatsAction::Goal { year, month } => {
            let calendar = stats::focus_goal_calendar(
                tasks.tasks(),
                work_duration,
                config.goals.goal_hours(),
                year.unwrap_or_else(|| now.year()),
                month.unwrap_or_else(|| now.month()),
                now.timezone(),
            )?;
            if json {
                return print_json(&calendar);
            }
            println!(
                "{}-{:02}  goal {}",
                calendar.year,
                calendar.month,
                format_minutes(calendar.goal_minutes)
            );
            println!(" Su  Mo  Tu  We  Th  Fr  Sa");
            let mut line = "    ".repeat(calendar.first_weekday as usize);
            for day in &calendar.days {
                let mark = if day.goal_met { '*' } else { ' ' };
                line.push_str(&format!("{:>3}{mark}", day.date.day()));
                if day.date.weekday().num_days_from_sunday() == 6 {
                    println!("{}", line.trim_end());
                    line.clear();
                }
            }
            if !line.is_empty() {
                println!("{}", line.trim_end());
            }
            let met = calendar.days.iter().filter(|d| d.goal_met).count();
            println!("goal met on {met} of {} days (*)", calendar.days.len());
        }
        StatsAction::Records { limit } => {
            let records = db.recent_intervals(limit)?;
            if json {
                return print_json(&records);
            }
            for record in &records {
                let title = record
                    .task_id
                    .as_deref()
                    .and_then(|id| tasks.get(id))
                    .map(|t| t.title.as_str())
                    .unwrap_or("-");
                println!(
                    "{}  {:<11} {:>4}  {title}",
                    record.completed_at.with_timezone(&now.timezone()).format("%Y-%m-%d %H:%M"),
                    record.interval_type.as_str(),
                    format_minutes(f64::from(record.duration_min)),
                );
            }
        }
    }
    Ok(())
}
