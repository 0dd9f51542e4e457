use serde::{Deserialize, Serialize};

use super::interval::IntervalType;
use crate::error::ValidationError;

/// Timer configuration snapshot.
///
/// Durations are in minutes. Values are validated by [`TimerSettings::validate`]
/// before they reach the engine; the engine itself trusts its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSettings {
    #[serde(default = "default_work_duration")]
    pub work_duration: u32,
    #[serde(default = "default_short_break_duration")]
    pub short_break_duration: u32,
    #[serde(default = "default_long_break_duration")]
    pub long_break_duration: u32,
    /// Completed work intervals before a long break replaces a short one.
    #[serde(default = "default_long_break_interval")]
    pub long_break_interval: u32,
    #[serde(default = "default_true")]
    pub auto_start_breaks: bool,
    #[serde(default)]
    pub auto_start_pomodoros: bool,
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    #[serde(default)]
    pub disable_break: bool,
}

fn default_work_duration() -> u32 {
    25
}
fn default_short_break_duration() -> u32 {
    5
}
fn default_long_break_duration() -> u32 {
    15
}
fn default_long_break_interval() -> u32 {
    4
}
fn default_true() -> bool {
    true
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            work_duration: default_work_duration(),
            short_break_duration: default_short_break_duration(),
            long_break_duration: default_long_break_duration(),
            long_break_interval: default_long_break_interval(),
            auto_start_breaks: true,
            auto_start_pomodoros: false,
            sound_enabled: true,
            disable_break: false,
        }
    }
}

impl TimerSettings {
    /// Length of `interval` in minutes.
    pub fn duration_min(&self, interval: IntervalType) -> u32 {
        match interval {
            IntervalType::Work => self.work_duration,
            IntervalType::ShortBreak => self.short_break_duration,
            IntervalType::LongBreak => self.long_break_duration,
        }
    }

    /// Full length of `interval` in seconds.
    pub fn duration_secs(&self, interval: IntervalType) -> u64 {
        u64::from(self.duration_min(interval)).saturating_mul(60)
    }

    /// Reject non-positive durations and a non-positive long-break interval.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let checks = [
            ("work_duration", self.work_duration),
            ("short_break_duration", self.short_break_duration),
            ("long_break_duration", self.long_break_duration),
            ("long_break_interval", self.long_break_interval),
        ];
        for (field, value) in checks {
            if value == 0 {
                return Err(ValidationError::NotPositive { field });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classic_pomodoro() {
        let s = TimerSettings::default();
        assert_eq!(s.duration_secs(IntervalType::Work), 25 * 60);
        assert_eq!(s.duration_secs(IntervalType::ShortBreak), 5 * 60);
        assert_eq!(s.duration_secs(IntervalType::LongBreak), 15 * 60);
        assert_eq!(s.long_break_interval, 4);
        assert!(s.auto_start_breaks);
        assert!(!s.auto_start_pomodoros);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_values() {
        let s = TimerSettings {
            long_break_interval: 0,
            ..TimerSettings::default()
        };
        assert_eq!(
            s.validate(),
            Err(ValidationError::NotPositive {
                field: "long_break_interval"
            })
        );

        let s = TimerSettings {
            work_duration: 0,
            ..TimerSettings::default()
        };
        assert!(s.validate().is_err());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let s: TimerSettings = toml::from_str("work_duration = 50\ndisable_break = true").unwrap();
        assert_eq!(s.work_duration, 50);
        assert_eq!(s.short_break_duration, 5);
        assert!(s.disable_break);
        assert!(s.sound_enabled);
    }
}
