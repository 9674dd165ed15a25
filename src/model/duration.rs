use std::fmt;

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// A non-negative span of work, kept in whole seconds.
///
/// Storage keeps the raw seconds; the wire format is `HH:MM:SS` (hours may
/// exceed 24).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkDuration(i64);

impl WorkDuration {
    pub const ZERO: WorkDuration = WorkDuration(0);

    pub fn from_seconds(seconds: i64) -> Self {
        Self(seconds.max(0))
    }

    pub fn from_hms(hours: i64, minutes: i64, seconds: i64) -> Self {
        Self::from_seconds(hours * 3600 + minutes * 60 + seconds)
    }

    /// Elapsed time from `start` to `end`, truncated to whole seconds.
    pub fn between(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self::from_seconds((end - start).num_seconds())
    }

    /// Length of a same-day time-of-day window. Zero when `end <= start`.
    pub fn of_window(start: NaiveTime, end: NaiveTime) -> Self {
        Self::from_seconds(
            end.num_seconds_from_midnight() as i64 - start.num_seconds_from_midnight() as i64,
        )
    }

    pub fn as_seconds(self) -> i64 {
        self.0
    }

    pub fn as_hours(self) -> f64 {
        self.0 as f64 / 3600.0
    }

    pub fn saturating_sub(self, other: WorkDuration) -> Self {
        Self::from_seconds(self.0 - other.0)
    }

    pub fn parse_hms(value: &str) -> Option<Self> {
        let mut parts = value.trim().split(':');
        let hours = parts.next()?.parse::<i64>().ok()?;
        let minutes = parts.next()?.parse::<i64>().ok()?;
        let seconds = parts.next()?.parse::<i64>().ok()?;
        if parts.next().is_some()
            || hours < 0
            || !(0..60).contains(&minutes)
            || !(0..60).contains(&seconds)
        {
            return None;
        }
        Some(Self::from_hms(hours, minutes, seconds))
    }
}

impl std::ops::Add for WorkDuration {
    type Output = WorkDuration;

    fn add(self, rhs: WorkDuration) -> WorkDuration {
        WorkDuration(self.0 + rhs.0)
    }
}

impl fmt::Display for WorkDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hours = self.0 / 3600;
        let minutes = (self.0 % 3600) / 60;
        let seconds = self.0 % 60;
        write!(f, "{hours:02}:{minutes:02}:{seconds:02}")
    }
}

impl Serialize for WorkDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WorkDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        WorkDuration::parse_hms(&raw)
            .ok_or_else(|| de::Error::custom(format!("expected HH:MM:SS, got {raw:?}")))
    }
}
