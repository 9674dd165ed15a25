use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, de};
use utoipa::ToSchema;

use crate::model::duration::WorkDuration;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "Morning")]
    pub shift_name: String,

    #[schema(example = "09:00:00", value_type = String, format = "time")]
    pub shift_start: NaiveTime,

    #[schema(example = "17:00:00", value_type = String, format = "time")]
    pub shift_end: NaiveTime,

    #[schema(example = "Front desk", nullable = true)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewShift {
    #[schema(example = "Morning")]
    pub shift_name: String,

    #[serde(deserialize_with = "time_of_day")]
    #[schema(example = "09:00", value_type = String)]
    pub shift_start: NaiveTime,

    #[serde(deserialize_with = "time_of_day")]
    #[schema(example = "5:00 PM", value_type = String)]
    pub shift_end: NaiveTime,

    pub description: Option<String>,
}

/// A dated binding of an employee to a shift. Shift name and times are a
/// snapshot taken when the assignment was made.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShiftAssignment {
    pub id: u64,
    pub employee_id: u64,
    pub shift_id: u64,
    pub shift_name: String,

    #[schema(value_type = String, format = "time")]
    pub shift_start: NaiveTime,

    #[schema(value_type = String, format = "time")]
    pub shift_end: NaiveTime,

    #[schema(example = "2025-01-01", value_type = String, format = "date")]
    pub from_date: NaiveDate,

    #[schema(example = "2025-01-31", value_type = String, format = "date")]
    pub to_date: NaiveDate,

    #[schema(value_type = String, format = "date-time")]
    pub assigned_at: NaiveDateTime,

    pub description: Option<String>,
}

impl ShiftAssignment {
    /// Closed-interval intersection: windows that merely touch still overlap.
    pub fn overlaps(&self, from: NaiveDate, to: NaiveDate) -> bool {
        self.from_date <= to && from <= self.to_date
    }

    pub fn is_valid_on(&self, date: NaiveDate) -> bool {
        self.from_date <= date && date <= self.to_date
    }

    /// The shift's start and end on a given calendar day.
    pub fn window_on(&self, date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
        (date.and_time(self.shift_start), date.and_time(self.shift_end))
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        let (start, end) = self.window_on(at.date());
        start <= at && at <= end
    }

    pub fn shift_length(&self) -> WorkDuration {
        WorkDuration::of_window(self.shift_start, self.shift_end)
    }
}

#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub employee_id: u64,
    pub shift_id: u64,
    pub shift_name: String,
    pub shift_start: NaiveTime,
    pub shift_end: NaiveTime,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub assigned_at: NaiveDateTime,
    pub description: Option<String>,
}

/// Accepts `HH:MM`, `HH:MM:SS` and 12-hour `h:MM AM`/`h:MM PM`.
pub fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    for format in ["%H:%M:%S", "%H:%M", "%I:%M %p", "%I:%M:%S %p"] {
        if let Ok(time) = NaiveTime::parse_from_str(value, format) {
            return Some(time);
        }
    }
    None
}

fn time_of_day<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_time_of_day(&raw).ok_or_else(|| de::Error::custom(format!("invalid time of day {raw:?}")))
}
