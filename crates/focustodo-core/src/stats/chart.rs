use chrono::{DateTime, Datelike, Duration, FixedOffset, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{focus_minutes, local_date, project_key, week_start};
use crate::error::ValidationError;
use crate::task::Task;

/// Time span of a chart or distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartRange {
    /// Since local midnight.
    #[default]
    Today,
    /// Last 7 days.
    Daily,
    /// Last 7 Sunday-start weeks.
    Weekly,
    /// Last 7 calendar months.
    Monthly,
    /// Last 7 calendar years.
    Yearly,
}

impl fmt::Display for ChartRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChartRange::Today => "today",
            ChartRange::Daily => "daily",
            ChartRange::Weekly => "weekly",
            ChartRange::Monthly => "monthly",
            ChartRange::Yearly => "yearly",
        })
    }
}

impl FromStr for ChartRange {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "today" => Ok(ChartRange::Today),
            "daily" => Ok(ChartRange::Daily),
            "weekly" => Ok(ChartRange::Weekly),
            "monthly" => Ok(ChartRange::Monthly),
            "yearly" => Ok(ChartRange::Yearly),
            other => Err(ValidationError::InvalidValue {
                field: "range".into(),
                message: format!("expected today, daily, weekly, monthly or yearly, got '{other}'"),
            }),
        }
    }
}

/// Focus minutes of one chart column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    /// First day the bucket covers.
    pub start: NaiveDate,
    pub minutes: u64,
}

/// Focus time of one project within a range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectShare {
    pub project_id: String,
    pub minutes: u64,
    /// Percent of the range's total, unrounded.
    pub percent: f64,
}

/// Half-open `[start, end)` day ranges; `None` end means unbounded.
fn windows(range: ChartRange, today: NaiveDate) -> Vec<(NaiveDate, Option<NaiveDate>)> {
    let day = Duration::days(1);
    match range {
        ChartRange::Today => vec![(today, None)],
        ChartRange::Daily => (0..7)
            .map(|i| {
                let start = today - Duration::days(6 - i);
                (start, Some(start + day))
            })
            .collect(),
        ChartRange::Weekly => {
            let first = week_start(today) - Duration::weeks(6);
            (0..7)
                .map(|i| {
                    let start = first + Duration::weeks(i);
                    (start, Some(start + Duration::weeks(1)))
                })
                .collect()
        }
        ChartRange::Monthly => (0..7u32)
            .filter_map(|i| {
                let start = month_start(today, 6 - i)?;
                Some((start, start.checked_add_months(Months::new(1))))
            })
            .collect(),
        ChartRange::Yearly => (0..7)
            .filter_map(|i| {
                let start = NaiveDate::from_ymd_opt(today.year() - (6 - i), 1, 1)?;
                Some((start, NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)))
            })
            .collect(),
    }
}

/// First day of the month `back` months before `date`'s month.
fn month_start(date: NaiveDate, back: u32) -> Option<NaiveDate> {
    date.with_day(1)?.checked_sub_months(Months::new(back))
}

fn in_window(day: NaiveDate, (start, end): (NaiveDate, Option<NaiveDate>)) -> bool {
    day >= start && end.map_or(true, |end| day < end)
}

/// Focus minutes per bucket, oldest first.
pub fn focus_time_chart(
    tasks: &[Task],
    work_duration: u32,
    range: ChartRange,
    now: DateTime<FixedOffset>,
) -> Vec<Bucket> {
    let offset = now.timezone();
    windows(range, now.date_naive())
        .into_iter()
        .map(|window| Bucket {
            start: window.0,
            minutes: tasks
                .iter()
                .filter(|t| in_window(local_date(t, &offset), window))
                .map(|t| focus_minutes(t, work_duration))
                .sum(),
        })
        .collect()
}

/// Focus minutes per project between the start of `range` and `now`,
/// largest first. Projects without focus time are left out.
pub fn project_distribution(
    tasks: &[Task],
    work_duration: u32,
    range: ChartRange,
    now: DateTime<FixedOffset>,
) -> Vec<ProjectShare> {
    let offset = now.timezone();
    let today = now.date_naive();
    let start = match range {
        ChartRange::Today => Some(today),
        ChartRange::Daily => Some(today - Duration::days(6)),
        ChartRange::Weekly => Some(week_start(today) - Duration::weeks(6)),
        ChartRange::Monthly => month_start(today, 6),
        ChartRange::Yearly => NaiveDate::from_ymd_opt(today.year() - 6, 1, 1),
    };
    let Some(start) = start else {
        return Vec::new();
    };
    let now_utc = now.with_timezone(&Utc);

    let mut shares: Vec<ProjectShare> = Vec::new();
    for task in tasks {
        if task.updated_at > now_utc || local_date(task, &offset) < start {
            continue;
        }
        let minutes = focus_minutes(task, work_duration);
        if minutes == 0 {
            continue;
        }
        let key = project_key(task);
        match shares.iter_mut().find(|s| s.project_id == key) {
            Some(share) => share.minutes += minutes,
            None => shares.push(ProjectShare {
                project_id: key.to_string(),
                minutes,
                percent: 0.0,
            }),
        }
    }

    let total: u64 = shares.iter().map(|s| s.minutes).sum();
    for share in &mut shares {
        share.percent = share.minutes as f64 * 100.0 / total as f64;
    }
    shares.sort_by(|a, b| b.minutes.cmp(&a.minutes));
    shares
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::fixtures::{now, task};
    use crate::stats::UNCATEGORIZED;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn range_parses() {
        assert_eq!("Weekly".parse::<ChartRange>().unwrap(), ChartRange::Weekly);
        assert!("hourly".parse::<ChartRange>().is_err());
        assert_eq!(ChartRange::Monthly.to_string(), "monthly");
    }

    #[test]
    fn today_is_a_single_bucket() {
        let tasks = vec![
            task(2, None, (2026, 3, 18, 8)),
            task(5, None, (2026, 3, 17, 22)),
        ];
        let chart = focus_time_chart(&tasks, 25, ChartRange::Today, now());
        assert_eq!(
            chart,
            vec![Bucket {
                start: date(2026, 3, 18),
                minutes: 50
            }]
        );
    }

    #[test]
    fn daily_covers_last_seven_days() {
        let tasks = vec![
            task(1, None, (2026, 3, 12, 10)),
            task(1, None, (2026, 3, 11, 10)),
            task(3, None, (2026, 3, 18, 10)),
        ];
        let chart = focus_time_chart(&tasks, 25, ChartRange::Daily, now());
        assert_eq!(chart.len(), 7);
        assert_eq!(chart[0].start, date(2026, 3, 12));
        assert_eq!(chart[0].minutes, 25);
        assert_eq!(chart[6].start, date(2026, 3, 18));
        assert_eq!(chart[6].minutes, 75);
        assert_eq!(chart.iter().map(|b| b.minutes).sum::<u64>(), 100);
    }

    #[test]
    fn weekly_starts_six_weeks_before_this_sunday() {
        let tasks = vec![task(2, None, (2026, 2, 1, 10)), task(1, None, (2026, 3, 21, 10))];
        let chart = focus_time_chart(&tasks, 30, ChartRange::Weekly, now());
        assert_eq!(chart[0].start, date(2026, 2, 1));
        assert_eq!(chart[0].minutes, 60);
        assert_eq!(chart[6].start, date(2026, 3, 15));
        assert_eq!(chart[6].minutes, 30);
    }

    #[test]
    fn monthly_and_yearly_use_calendar_boundaries() {
        let tasks = vec![
            task(1, None, (2025, 9, 1, 0)),
            task(1, None, (2025, 8, 31, 23)),
            task(2, None, (2020, 1, 1, 0)),
        ];
        let monthly = focus_time_chart(&tasks, 25, ChartRange::Monthly, now());
        let starts: Vec<NaiveDate> = monthly.iter().map(|b| b.start).collect();
        assert_eq!(starts[0], date(2025, 9, 1));
        assert_eq!(starts[6], date(2026, 3, 1));
        assert_eq!(monthly[0].minutes, 25);

        let yearly = focus_time_chart(&tasks, 25, ChartRange::Yearly, now());
        assert_eq!(yearly[0].start, date(2020, 1, 1));
        assert_eq!(yearly[0].minutes, 50);
        assert_eq!(yearly[5].minutes, 50);
        assert_eq!(yearly[6].minutes, 0);
    }

    #[test]
    fn distribution_sorted_by_minutes() {
        let tasks = vec![
            task(1, Some("a"), (2026, 3, 18, 9)),
            task(3, None, (2026, 3, 16, 9)),
            task(2, Some("a"), (2026, 3, 13, 9)),
            task(9, Some("b"), (2026, 3, 1, 9)),
            task(0, Some("c"), (2026, 3, 18, 9)),
        ];
        let shares = project_distribution(&tasks, 25, ChartRange::Daily, now());
        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].project_id, "a");
        assert_eq!(shares[0].minutes, 75);
        assert_eq!(shares[1].project_id, UNCATEGORIZED);
        assert_eq!(shares[0].percent, 50.0);
    }

    #[test]
    fn distribution_excludes_future_updates() {
        let tasks = vec![task(1, Some("a"), (2026, 3, 18, 16))];
        assert!(project_distribution(&tasks, 25, ChartRange::Today, now()).is_empty());
    }
}
