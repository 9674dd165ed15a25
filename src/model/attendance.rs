use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::model::duration::WorkDuration;

/// Shift id used by records that describe the whole day rather than a shift
/// (week-offs), so the (employee, date, shift) key still allows only one.
pub const DAY_LEVEL_SHIFT_ID: u64 = 0;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
pub enum AttendanceStatus {
    #[serde(rename = "Checked-In")]
    #[strum(serialize = "Checked-In")]
    CheckedIn,
    #[serde(rename = "P")]
    #[strum(serialize = "P")]
    Present,
    #[serde(rename = "A")]
    #[strum(serialize = "A")]
    Absent,
    #[serde(rename = "Weekoff")]
    #[strum(serialize = "Weekoff")]
    Weekoff,
    #[serde(rename = "U")]
    #[strum(serialize = "U")]
    Undertime,
}

impl AttendanceStatus {
    /// Statuses whose hours feed the payroll run.
    pub fn is_payable(self) -> bool {
        matches!(
            self,
            AttendanceStatus::Present | AttendanceStatus::Undertime | AttendanceStatus::Weekoff
        )
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: u64,
    pub employee_id: u64,
    pub name: String,

    #[schema(example = "2025-03-10", value_type = String, format = "date")]
    pub date: NaiveDate,

    pub shift_id: u64,
    pub shift_name: String,

    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_in_time: Option<NaiveDateTime>,

    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_out_time: Option<NaiveDateTime>,

    pub location: String,
    pub status: AttendanceStatus,

    #[schema(example = "08:00:00", value_type = String)]
    pub hours_worked: WorkDuration,

    #[schema(example = "00:00:00", value_type = String)]
    pub overtime_hours: WorkDuration,

    #[schema(example = "00:00:00", value_type = String)]
    pub under_time_hours: WorkDuration,
}

impl AttendanceRecord {
    pub fn is_open(&self) -> bool {
        self.check_in_time.is_some() && self.check_out_time.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub employee_id: u64,
    pub name: String,
    pub date: NaiveDate,
    pub shift_id: u64,
    pub shift_name: String,
    pub check_in_time: Option<NaiveDateTime>,
    pub location: String,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutUpdate {
    pub check_out_time: NaiveDateTime,
    pub hours_worked: WorkDuration,
    pub overtime_hours: WorkDuration,
    pub under_time_hours: WorkDuration,
    pub status: AttendanceStatus,
}
