//! Storage seams for the attendance core.
//!
//! The reconciler, validator and payroll engine only talk to these traits.
//! `MySqlStore` is the production backend; tests run against an in-memory
//! store with the same uniqueness rules.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::model::{
    attendance::{AttendanceRecord, CheckoutUpdate, NewAttendance},
    employee::{CurrentShift, Employee, EmployeeUpdate, NewEmployee, WeekoffSchedule},
    salary::{NewSalaryRecord, SalaryRecord},
    shift::{NewAssignment, NewShift, Shift, ShiftAssignment},
};

#[cfg(test)]
pub mod memory;
pub mod mysql;

pub use mysql::MySqlStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique key rejected the write.
    #[error("duplicate key")]
    Duplicate,

    #[error("stored value could not be decoded: {0}")]
    Corrupt(String),

    #[error("database error: {0}")]
    Backend(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &error {
            if db_err.is_unique_violation() {
                return StoreError::Duplicate;
            }
        }
        StoreError::Backend(error)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    async fn create_employee(&self, new: &NewEmployee) -> StoreResult<Employee>;

    async fn employee(&self, id: u64) -> StoreResult<Option<Employee>>;

    /// Active employees, ordered by id.
    async fn employees(&self) -> StoreResult<Vec<Employee>>;

    /// Every employee whatever the status, ordered by id.
    async fn all_employees(&self) -> StoreResult<Vec<Employee>>;

    /// Fails with `StoreError::Duplicate` when the new email is taken.
    async fn update_employee(&self, employee_id: u64, update: &EmployeeUpdate) -> StoreResult<()>;

    async fn set_employee_status(&self, employee_id: u64, status: &str) -> StoreResult<()>;

    async fn set_current_shift(&self, employee_id: u64, shift: &CurrentShift) -> StoreResult<()>;

    async fn set_weekoff_schedule(
        &self,
        employee_id: u64,
        schedule: &WeekoffSchedule,
    ) -> StoreResult<()>;
}

#[async_trait]
pub trait ShiftCatalog: Send + Sync {
    async fn create_shift(&self, new: &NewShift) -> StoreResult<Shift>;

    async fn shift(&self, id: u64) -> StoreResult<Option<Shift>>;

    async fn shifts(&self) -> StoreResult<Vec<Shift>>;

    async fn insert_assignment(&self, new: &NewAssignment) -> StoreResult<ShiftAssignment>;

    async fn assignments_for(&self, employee_id: u64) -> StoreResult<Vec<ShiftAssignment>>;

    /// Assignments whose validity window includes `date`.
    async fn assignments_valid_on(&self, date: NaiveDate) -> StoreResult<Vec<ShiftAssignment>>;

    async fn all_assignments(&self) -> StoreResult<Vec<ShiftAssignment>>;

    /// First assignment of the same employee that shares the shift id or the
    /// shift name and whose window intersects `[from, to]`.
    async fn find_overlapping(
        &self,
        employee_id: u64,
        shift_id: u64,
        shift_name: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Option<ShiftAssignment>>;

    async fn delete_assignments_ended_before(&self, date: NaiveDate) -> StoreResult<u64>;
}

#[async_trait]
pub trait AttendanceLedger: Send + Sync {
    /// Fails with `StoreError::Duplicate` when (employee, date, shift) exists.
    async fn insert_attendance(&self, new: &NewAttendance) -> StoreResult<AttendanceRecord>;

    async fn attendance(
        &self,
        employee_id: u64,
        date: NaiveDate,
        shift_id: u64,
    ) -> StoreResult<Option<AttendanceRecord>>;

    /// Applies a checkout only while the record is still open. Returns false
    /// when another writer closed it first.
    async fn complete_checkout(&self, id: u64, update: &CheckoutUpdate) -> StoreResult<bool>;

    async fn attendance_for_employee(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<AttendanceRecord>>;

    async fn attendance_on(&self, date: NaiveDate) -> StoreResult<Vec<AttendanceRecord>>;
}

#[async_trait]
pub trait SalaryLedger: Send + Sync {
    async fn append_salary(&self, new: &NewSalaryRecord) -> StoreResult<SalaryRecord>;

    async fn salaries_for_month(
        &self,
        employee_id: u64,
        month: u32,
        year: i32,
    ) -> StoreResult<Vec<SalaryRecord>>;
}

#[async_trait]
pub trait SweepClaims: Send + Sync {
    /// Records that `sweep` ran for `slot`. Only the first caller per
    /// (sweep, slot) gets `true`, across every worker sharing the store.
    async fn claim(&self, sweep: &str, slot: &str, at: NaiveDateTime) -> StoreResult<bool>;

    /// Forgets claims made before `cutoff` and returns how many went.
    async fn prune_claims_before(&self, cutoff: NaiveDateTime) -> StoreResult<u64>;
}

pub trait Store:
    EmployeeDirectory + ShiftCatalog + AttendanceLedger + SalaryLedger + SweepClaims
{
}

impl<T> Store for T where
    T: EmployeeDirectory + ShiftCatalog + AttendanceLedger + SalaryLedger + SweepClaims
{
}
