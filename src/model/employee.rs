use std::fmt;

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use utoipa::ToSchema;

use crate::model::duration::WorkDuration;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employeeCode": "Ats00001",
        "firstName": "John",
        "lastName": "Doe",
        "email": "john.doe@company.com",
        "profilePic": "https://cdn.example.com/john.jpg",
        "salary": 30000.0,
        "totalWorkingDays": 30,
        "weekoffSchedule": ["Sunday"],
        "shiftName": "Morning",
        "shiftStart": "09:00:00",
        "shiftEnd": "18:00:00",
        "status": "active"
    })
)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: u64,
    pub employee_code: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,

    #[schema(nullable = true)]
    pub profile_pic: Option<String>,

    /// Monthly base salary.
    pub salary: f64,

    /// Working days in one pay cycle; payroll accrues nothing while unset.
    #[schema(nullable = true)]
    pub total_working_days: Option<u32>,

    #[schema(value_type = Vec<String>)]
    pub weekoff_schedule: WeekoffSchedule,

    /// Snapshot of the most recently assigned shift.
    #[schema(nullable = true)]
    pub shift_name: Option<String>,

    #[schema(value_type = Option<String>, format = "time")]
    pub shift_start: Option<NaiveTime>,

    #[schema(value_type = Option<String>, format = "time")]
    pub shift_end: Option<NaiveTime>,

    pub status: String,
}

impl Employee {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Length of the current shift in decimal hours, zero without one.
    pub fn working_hours_per_shift(&self) -> f64 {
        match (self.shift_start, self.shift_end) {
            (Some(start), Some(end)) => WorkDuration::of_window(start, end).as_hours(),
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewEmployee {
    #[schema(example = "Ats00001")]
    pub employee_code: String,
    #[schema(example = "John")]
    pub first_name: String,
    #[schema(example = "Doe")]
    pub last_name: String,
    #[schema(example = "john@email.com", format = "email")]
    pub email: String,
    pub profile_pic: Option<String>,
    #[schema(example = 30000.0)]
    pub salary: f64,
    #[schema(example = 30)]
    pub total_working_days: Option<u32>,
    #[serde(default)]
    #[schema(value_type = Vec<String>, example = json!(["Sunday"]))]
    pub weekoff_schedule: WeekoffSchedule,
}

pub const ACTIVE: &str = "active";
pub const INACTIVE: &str = "inactive";

/// Partial update of an employee profile. Absent fields are left as they are.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeUpdate {
    #[schema(example = "John")]
    pub first_name: Option<String>,
    #[schema(example = "Doe")]
    pub last_name: Option<String>,
    #[schema(example = "john@email.com", format = "email")]
    pub email: Option<String>,
    pub profile_pic: Option<String>,
    #[schema(example = 32000.0)]
    pub salary: Option<f64>,
    #[schema(example = 26)]
    pub total_working_days: Option<u32>,
}

impl EmployeeUpdate {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.profile_pic.is_none()
            && self.salary.is_none()
            && self.total_working_days.is_none()
    }

    pub fn apply_to(&self, employee: &mut Employee) {
        if let Some(v) = &self.first_name {
            employee.first_name = v.clone();
        }
        if let Some(v) = &self.last_name {
            employee.last_name = v.clone();
        }
        if let Some(v) = &self.email {
            employee.email = v.clone();
        }
        if let Some(v) = &self.profile_pic {
            employee.profile_pic = Some(v.clone());
        }
        if let Some(v) = self.salary {
            employee.salary = v;
        }
        if let Some(v) = self.total_working_days {
            employee.total_working_days = Some(v);
        }
    }
}

#[derive(Debug, Clone)]
pub struct CurrentShift {
    pub shift_name: String,
    pub shift_start: NaiveTime,
    pub shift_end: NaiveTime,
}

/// Weekdays an employee is scheduled off. Serialized as full day names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeekoffSchedule(Vec<Weekday>);

impl WeekoffSchedule {
    pub fn new(days: impl IntoIterator<Item = Weekday>) -> Self {
        let mut out: Vec<Weekday> = Vec::new();
        for day in days {
            if !out.contains(&day) {
                out.push(day);
            }
        }
        out.sort_by_key(|d| d.num_days_from_monday());
        Self(out)
    }

    /// Parses full day names; any unknown name fails the whole schedule.
    pub fn parse<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<Self, String> {
        let mut days = Vec::new();
        for name in names {
            days.push(parse_day_name(name).ok_or_else(|| format!("invalid week-off day {name:?}"))?);
        }
        Ok(Self::new(days))
    }

    /// Reads the comma-separated storage form, skipping blanks.
    pub fn from_storage(raw: &str) -> Result<Self, String> {
        Self::parse(raw.split(',').map(str::trim).filter(|s| !s.is_empty()))
    }

    pub fn to_storage(&self) -> String {
        self.0.iter().map(|d| day_name(*d)).collect::<Vec<_>>().join(",")
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0.contains(&day)
    }
}

impl fmt::Display for WeekoffSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_storage())
    }
}

impl Serialize for WeekoffSchedule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter().map(|d| day_name(*d)))
    }
}

impl<'de> Deserialize<'de> for WeekoffSchedule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let names = Vec::<String>::deserialize(deserializer)?;
        WeekoffSchedule::parse(names.iter().map(String::as_str)).map_err(de::Error::custom)
    }
}

fn parse_day_name(name: &str) -> Option<Weekday> {
    let day = match name {
        "Monday" => Weekday::Mon,
        "Tuesday" => Weekday::Tue,
        "Wednesday" => Weekday::Wed,
        "Thursday" => Weekday::Thu,
        "Friday" => Weekday::Fri,
        "Saturday" => Weekday::Sat,
        "Sunday" => Weekday::Sun,
        _ => return None,
    };
    Some(day)
}

pub fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
