use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Kind of a timed countdown segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IntervalType {
    #[default]
    Work,
    ShortBreak,
    LongBreak,
}

impl IntervalType {
    pub fn is_break(self) -> bool {
        matches!(self, IntervalType::ShortBreak | IntervalType::LongBreak)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IntervalType::Work => "work",
            IntervalType::ShortBreak => "short_break",
            IntervalType::LongBreak => "long_break",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            IntervalType::Work => "Focus",
            IntervalType::ShortBreak => "Short Break",
            IntervalType::LongBreak => "Long Break",
        }
    }
}

impl fmt::Display for IntervalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntervalType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "work" | "focus" => Ok(IntervalType::Work),
            "short_break" | "shortbreak" | "short" => Ok(IntervalType::ShortBreak),
            "long_break" | "longbreak" | "long" => Ok(IntervalType::LongBreak),
            other => Err(ValidationError::InvalidValue {
                field: "interval".into(),
                message: format!("unknown interval type '{other}'"),
            }),
        }
    }
}

/// Audible/visual cue emitted on an interval transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CueKind {
    ShortBreakStart,
    LongBreakStart,
    ShortBreakEnd,
    LongBreakEnd,
    Generic,
}

impl CueKind {
    /// How long the cue plays. Audio focus is handed back after this.
    pub fn play_length(self) -> std::time::Duration {
        let secs = match self {
            CueKind::ShortBreakStart | CueKind::ShortBreakEnd => 3,
            CueKind::LongBreakStart | CueKind::LongBreakEnd => 5,
            CueKind::Generic => 1,
        };
        std::time::Duration::from_secs(secs)
    }

    pub fn message(self) -> &'static str {
        match self {
            CueKind::ShortBreakStart => "Short break started",
            CueKind::LongBreakStart => "Long break started",
            CueKind::ShortBreakEnd => "Short break over, back to work",
            CueKind::LongBreakEnd => "Long break over, back to work",
            CueKind::Generic => "Interval complete",
        }
    }
}
