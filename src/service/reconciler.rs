//! Attendance state per (employee, date, shift):
//!
//! ```text
//! NoRecord -> Checked-In -> P | U
//! NoRecord -> A            (absence sweep)
//! NoRecord -> Weekoff      (absence sweep, day-level)
//! ```
//!
//! Every transition out of `Checked-In` goes through [`settle`] so manual and
//! automatic checkouts compute hours the same way.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use strum_macros::{AsRefStr, Display};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::model::{
    attendance::{
        AttendanceRecord, AttendanceStatus, CheckoutUpdate, DAY_LEVEL_SHIFT_ID, NewAttendance,
    },
    duration::WorkDuration,
    employee::Employee,
    shift::ShiftAssignment,
};
use crate::service::SweepReport;
use crate::service::geocode::{GeoPoint, Geocoder, UNKNOWN_LOCATION};
use crate::store::{Store, StoreError, StoreResult};

#[derive(Debug, Clone)]
pub struct CheckIn {
    pub employee_id: u64,
    pub shift_name: String,
    pub shift_id: Option<u64>,
    pub location: GeoPoint,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr, ToSchema)]
pub enum ShiftPhase {
    #[serde(rename = "current")]
    #[strum(serialize = "current")]
    Current,
    #[serde(rename = "next")]
    #[strum(serialize = "next")]
    Next,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShiftStatus {
    pub phase: ShiftPhase,
    pub shift_id: u64,
    pub shift_name: String,
    #[schema(value_type = String, format = "time")]
    pub shift_start: NaiveTime,
    #[schema(value_type = String, format = "time")]
    pub shift_end: NaiveTime,
    #[schema(example = "Checked-In")]
    pub status: String,
}

/// Hours, overtime, undertime and final status for a checkout.
pub fn settle(
    check_in: NaiveDateTime,
    check_out: NaiveDateTime,
    shift_length: WorkDuration,
) -> CheckoutUpdate {
    let worked = WorkDuration::between(check_in, check_out);
    CheckoutUpdate {
        check_out_time: check_out,
        hours_worked: worked,
        overtime_hours: worked.saturating_sub(shift_length),
        under_time_hours: shift_length.saturating_sub(worked),
        status: if worked >= shift_length {
            AttendanceStatus::Present
        } else {
            AttendanceStatus::Undertime
        },
    }
}

pub struct AttendanceReconciler {
    store: Arc<dyn Store>,
    geocoder: Arc<dyn Geocoder>,
}

impl AttendanceReconciler {
    pub fn new(store: Arc<dyn Store>, geocoder: Arc<dyn Geocoder>) -> Self {
        Self { store, geocoder }
    }

    pub async fn check_in(&self, req: CheckIn) -> Result<AttendanceRecord, AppError> {
        req.location.validate()?;

        let employee = self.employee(req.employee_id).await?;
        let date = req.timestamp.date();

        let assignment = self
            .store
            .assignments_for(req.employee_id)
            .await?
            .into_iter()
            .find(|a| {
                a.is_valid_on(date)
                    && a.shift_name == req.shift_name
                    && req.shift_id.is_none_or(|id| id == a.shift_id)
                    && a.contains(req.timestamp)
            })
            .ok_or_else(|| AppError::not_found("No valid shift found for the current time"))?;

        if let Some(existing) = self
            .store
            .attendance(req.employee_id, date, assignment.shift_id)
            .await?
        {
            return Err(if existing.check_in_time.is_some() {
                AppError::conflict("Already checked in for this shift")
            } else {
                AppError::conflict(format!(
                    "Attendance already recorded as {} for this shift",
                    existing.status
                ))
            });
        }

        let location = match self.geocoder.reverse(req.location).await {
            Ok(label) => label,
            Err(e) => {
                tracing::warn!(error = %e, employee_id = req.employee_id, "Geocoding failed");
                UNKNOWN_LOCATION.to_string()
            }
        };

        let record = self
            .store
            .insert_attendance(&NewAttendance {
                employee_id: req.employee_id,
                name: employee.display_name(),
                date,
                shift_id: assignment.shift_id,
                shift_name: assignment.shift_name.clone(),
                check_in_time: Some(req.timestamp),
                location,
                status: AttendanceStatus::CheckedIn,
            })
            .await
            .map_err(|e| match e {
                StoreError::Duplicate => AppError::conflict("Already checked in for this shift"),
                other => AppError::from(other),
            })?;

        tracing::info!(
            employee_id = record.employee_id,
            shift_id = record.shift_id,
            date = %record.date,
            "Checked in"
        );
        Ok(record)
    }

    pub async fn check_out(
        &self,
        employee_id: u64,
        shift_id: u64,
        date: NaiveDate,
        timestamp: NaiveDateTime,
    ) -> Result<AttendanceRecord, AppError> {
        let record = self
            .store
            .attendance(employee_id, date, shift_id)
            .await?
            .filter(|r| r.check_in_time.is_some())
            .ok_or_else(|| AppError::validation("Check-In not found"))?;

        if record.check_out_time.is_some() {
            return Err(AppError::conflict("Already checked out for this shift"));
        }

        let check_in = record
            .check_in_time
            .ok_or_else(|| AppError::validation("Check-In not found"))?;
        if timestamp < check_in {
            return Err(AppError::validation(
                "Check-out time is before check-in time",
            ));
        }

        let shift_length = self.shift_length(employee_id, shift_id, date).await?;
        let update = settle(check_in, timestamp, shift_length);

        if !self.store.complete_checkout(record.id, &update).await? {
            return Err(AppError::conflict("Already checked out for this shift"));
        }

        tracing::info!(
            employee_id,
            shift_id,
            %date,
            status = %update.status,
            worked = %update.hours_worked,
            "Checked out"
        );
        Ok(apply(record, update))
    }

    /// The id of the named shift the employee holds on `date`.
    pub async fn resolve_shift_id(
        &self,
        employee_id: u64,
        shift_name: &str,
        date: NaiveDate,
    ) -> Result<u64, AppError> {
        self.store
            .assignments_for(employee_id)
            .await?
            .into_iter()
            .find(|a| a.is_valid_on(date) && a.shift_name == shift_name)
            .map(|a| a.shift_id)
            .ok_or_else(|| AppError::not_found("No valid shift found for this employee"))
    }

    /// Closes every open record whose shift has ended, at the shift end.
    pub async fn auto_checkout_sweep(&self, now: NaiveDateTime) -> Result<SweepReport, AppError> {
        let today = now.date();
        let assignments = self.store.assignments_valid_on(today).await?;
        let mut report = SweepReport::default();

        for assignment in assignments {
            let (_, shift_end) = assignment.window_on(today);
            if shift_end > now {
                continue;
            }
            report.examined += 1;

            match self.close_if_open(&assignment, today, shift_end).await {
                Ok(true) => report.changed += 1,
                Ok(false) => {}
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(
                        error = %e,
                        employee_id = assignment.employee_id,
                        shift_id = assignment.shift_id,
                        "Auto checkout failed"
                    );
                }
            }
        }

        if report.changed > 0 || report.failed > 0 {
            tracing::info!(?report, %today, "Auto checkout sweep finished");
        }
        Ok(report)
    }

    /// Marks week-offs and absences for `day`. Shifts still running at `now`
    /// are left alone, so a sweep after midnight settles the previous day in
    /// full. Existing records are never overwritten.
    pub async fn absent_sweep(
        &self,
        day: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<SweepReport, AppError> {
        let employees = self.store.employees().await?;
        let assignments = self.store.assignments_valid_on(day).await?;
        let mut report = SweepReport::default();

        for employee in &employees {
            report.examined += 1;
            let theirs: Vec<&ShiftAssignment> = assignments
                .iter()
                .filter(|a| a.employee_id == employee.id)
                .collect();

            match self.mark_day(employee, &theirs, day, now).await {
                Ok(created) => report.changed += created,
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(error = %e, employee_id = employee.id, "Absence marking failed");
                }
            }
        }

        tracing::info!(?report, %day, "Absence sweep finished");
        Ok(report)
    }

    /// The shift running at `now`, or the next one later today.
    pub async fn current_shift_status(
        &self,
        employee_id: u64,
        now: NaiveDateTime,
    ) -> Result<ShiftStatus, AppError> {
        let today = now.date();
        let mut shifts: Vec<ShiftAssignment> = self
            .store
            .assignments_for(employee_id)
            .await?
            .into_iter()
            .filter(|a| a.is_valid_on(today))
            .collect();
        if shifts.is_empty() {
            return Err(AppError::not_found("No shifts assigned to this employee"));
        }
        shifts.sort_by_key(|a| a.shift_start);

        if let Some(current) = shifts.iter().find(|a| a.contains(now)) {
            let open = self
                .store
                .attendance(employee_id, today, current.shift_id)
                .await?
                .is_some_and(|r| r.is_open());
            let status = if open {
                AttendanceStatus::CheckedIn.to_string()
            } else {
                "Not Checked-In".to_string()
            };
            return Ok(status_of(current, ShiftPhase::Current, status));
        }

        shifts
            .iter()
            .find(|a| a.shift_start > now.time())
            .map(|next| status_of(next, ShiftPhase::Next, "Not Checked-In".to_string()))
            .ok_or_else(|| AppError::not_found("No ongoing or upcoming shifts found"))
    }

    async fn employee(&self, employee_id: u64) -> Result<Employee, AppError> {
        self.store
            .employee(employee_id)
            .await?
            .ok_or_else(|| AppError::not_found("Employee not found"))
    }

    /// Prefers the assignment snapshot; falls back to the shift definition.
    async fn shift_length(
        &self,
        employee_id: u64,
        shift_id: u64,
        date: NaiveDate,
    ) -> Result<WorkDuration, AppError> {
        let snapshot = self
            .store
            .assignments_for(employee_id)
            .await?
            .into_iter()
            .find(|a| a.shift_id == shift_id && a.is_valid_on(date));
        if let Some(a) = snapshot {
            return Ok(a.shift_length());
        }

        self.store
            .shift(shift_id)
            .await?
            .map(|s| WorkDuration::of_window(s.shift_start, s.shift_end))
            .ok_or_else(|| AppError::not_found("Shift not found"))
    }

    async fn close_if_open(
        &self,
        assignment: &ShiftAssignment,
        today: NaiveDate,
        shift_end: NaiveDateTime,
    ) -> StoreResult<bool> {
        let record = self
            .store
            .attendance(assignment.employee_id, today, assignment.shift_id)
            .await?;

        let Some(record) = record.filter(|r| r.is_open()) else {
            return Ok(false);
        };
        let Some(check_in) = record.check_in_time else {
            return Ok(false);
        };

        let update = settle(check_in, shift_end, assignment.shift_length());
        self.store.complete_checkout(record.id, &update).await
    }

    async fn mark_day(
        &self,
        employee: &Employee,
        assignments: &[&ShiftAssignment],
        today: NaiveDate,
        now: NaiveDateTime,
    ) -> StoreResult<usize> {
        if employee.weekoff_schedule.contains(today.weekday()) {
            let created = self
                .insert_if_absent(NewAttendance {
                    employee_id: employee.id,
                    name: employee.display_name(),
                    date: today,
                    shift_id: DAY_LEVEL_SHIFT_ID,
                    shift_name: "N/A".to_string(),
                    check_in_time: None,
                    location: "Weekoff".to_string(),
                    status: AttendanceStatus::Weekoff,
                })
                .await?;
            return Ok(created as usize);
        }

        let mut created = 0;
        for assignment in assignments {
            let (_, shift_end) = assignment.window_on(today);
            if shift_end > now {
                continue;
            }
            let inserted = self
                .insert_if_absent(NewAttendance {
                    employee_id: employee.id,
                    name: employee.display_name(),
                    date: today,
                    shift_id: assignment.shift_id,
                    shift_name: assignment.shift_name.clone(),
                    check_in_time: None,
                    location: "N/A".to_string(),
                    status: AttendanceStatus::Absent,
                })
                .await?;
            created += inserted as usize;
        }
        Ok(created)
    }

    async fn insert_if_absent(&self, new: NewAttendance) -> StoreResult<bool> {
        if self
            .store
            .attendance(new.employee_id, new.date, new.shift_id)
            .await?
            .is_some()
        {
            return Ok(false);
        }
        match self.store.insert_attendance(&new).await {
            Ok(_) => Ok(true),
            // lost the race to another writer
            Err(StoreError::Duplicate) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

fn apply(mut record: AttendanceRecord, update: CheckoutUpdate) -> AttendanceRecord {
    record.check_out_time = Some(update.check_out_time);
    record.hours_worked = update.hours_worked;
    record.overtime_hours = update.overtime_hours;
    record.under_time_hours = update.under_time_hours;
    record.status = update.status;
    record
}

fn status_of(a: &ShiftAssignment, phase: ShiftPhase, status: String) -> ShiftStatus {
    ShiftStatus {
        phase,
        shift_id: a.shift_id,
        shift_name: a.shift_name.clone(),
        shift_start: a.shift_start,
        shift_end: a.shift_end,
        status,
    }
}
