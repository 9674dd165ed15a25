//! In-process store used by unit and handler tests. Enforces the same unique
//! keys as the MySQL schema.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::model::{
    attendance::{AttendanceRecord, CheckoutUpdate, NewAttendance},
    duration::WorkDuration,
    employee::{ACTIVE, CurrentShift, Employee, EmployeeUpdate, NewEmployee, WeekoffSchedule},
    salary::{NewSalaryRecord, SalaryRecord},
    shift::{NewAssignment, NewShift, Shift, ShiftAssignment},
};
use crate::store::{
    AttendanceLedger, EmployeeDirectory, SalaryLedger, ShiftCatalog, StoreError, StoreResult,
    SweepClaims,
};

#[derive(Default)]
struct Tables {
    employees: Vec<Employee>,
    shifts: Vec<Shift>,
    assignments: Vec<ShiftAssignment>,
    attendance: Vec<AttendanceRecord>,
    salaries: Vec<SalaryRecord>,
    sweep_runs: HashMap<(String, String), NaiveDateTime>,
    next_id: u64,
}

impl Tables {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    failing_employee: Mutex<Option<u64>>,
    hide_attendance_once: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write touching `employee_id` fails with a backend error.
    pub fn fail_writes_for(&self, employee_id: u64) {
        *self.failing_employee.lock().unwrap() = Some(employee_id);
    }

    /// The next attendance lookup reports nothing, as if a concurrent
    /// writer inserted the row between the lookup and the insert.
    pub fn hide_next_attendance_lookup(&self) {
        self.hide_attendance_once.store(true, Ordering::SeqCst);
    }

    pub fn claimed_slots(&self) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> =
            self.tables.lock().unwrap().sweep_runs.keys().cloned().collect();
        out.sort();
        out
    }

    pub fn attendance_rows(&self) -> Vec<AttendanceRecord> {
        self.tables.lock().unwrap().attendance.clone()
    }

    pub fn salary_rows(&self) -> Vec<SalaryRecord> {
        self.tables.lock().unwrap().salaries.clone()
    }

    pub fn assignment_rows(&self) -> Vec<ShiftAssignment> {
        self.tables.lock().unwrap().assignments.clone()
    }

    fn check_writable(&self, employee_id: u64) -> StoreResult<()> {
        if *self.failing_employee.lock().unwrap() == Some(employee_id) {
            return Err(StoreError::Backend(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl EmployeeDirectory for MemoryStore {
    async fn create_employee(&self, new: &NewEmployee) -> StoreResult<Employee> {
        let mut t = self.tables.lock().unwrap();
        if t.employees
            .iter()
            .any(|e| e.employee_code == new.employee_code || e.email == new.email)
        {
            return Err(StoreError::Duplicate);
        }
        let employee = Employee {
            id: t.next_id(),
            employee_code: new.employee_code.clone(),
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
            email: new.email.clone(),
            profile_pic: new.profile_pic.clone(),
            salary: new.salary,
            total_working_days: new.total_working_days,
            weekoff_schedule: new.weekoff_schedule.clone(),
            shift_name: None,
            shift_start: None,
            shift_end: None,
            status: ACTIVE.to_string(),
        };
        t.employees.push(employee.clone());
        Ok(employee)
    }

    async fn employee(&self, id: u64) -> StoreResult<Option<Employee>> {
        let t = self.tables.lock().unwrap();
        Ok(t.employees.iter().find(|e| e.id == id).cloned())
    }

    async fn employees(&self) -> StoreResult<Vec<Employee>> {
        let t = self.tables.lock().unwrap();
        Ok(t.employees
            .iter()
            .filter(|e| e.status == ACTIVE)
            .cloned()
            .collect())
    }

    async fn all_employees(&self) -> StoreResult<Vec<Employee>> {
        Ok(self.tables.lock().unwrap().employees.clone())
    }

    async fn update_employee(&self, employee_id: u64, update: &EmployeeUpdate) -> StoreResult<()> {
        self.check_writable(employee_id)?;
        let mut t = self.tables.lock().unwrap();
        if let Some(email) = &update.email {
            if t.employees
                .iter()
                .any(|e| e.id != employee_id && &e.email == email)
            {
                return Err(StoreError::Duplicate);
            }
        }
        if let Some(e) = t.employees.iter_mut().find(|e| e.id == employee_id) {
            update.apply_to(e);
        }
        Ok(())
    }

    async fn set_employee_status(&self, employee_id: u64, status: &str) -> StoreResult<()> {
        self.check_writable(employee_id)?;
        let mut t = self.tables.lock().unwrap();
        if let Some(e) = t.employees.iter_mut().find(|e| e.id == employee_id) {
            e.status = status.to_string();
        }
        Ok(())
    }

    async fn set_current_shift(&self, employee_id: u64, shift: &CurrentShift) -> StoreResult<()> {
        self.check_writable(employee_id)?;
        let mut t = self.tables.lock().unwrap();
        if let Some(e) = t.employees.iter_mut().find(|e| e.id == employee_id) {
            e.shift_name = Some(shift.shift_name.clone());
            e.shift_start = Some(shift.shift_start);
            e.shift_end = Some(shift.shift_end);
        }
        Ok(())
    }

    async fn set_weekoff_schedule(
        &self,
        employee_id: u64,
        schedule: &WeekoffSchedule,
    ) -> StoreResult<()> {
        let mut t = self.tables.lock().unwrap();
        if let Some(e) = t.employees.iter_mut().find(|e| e.id == employee_id) {
            e.weekoff_schedule = schedule.clone();
        }
        Ok(())
    }
}

#[async_trait]
impl ShiftCatalog for MemoryStore {
    async fn create_shift(&self, new: &NewShift) -> StoreResult<Shift> {
        let mut t = self.tables.lock().unwrap();
        let shift = Shift {
            id: t.next_id(),
            shift_name: new.shift_name.clone(),
            shift_start: new.shift_start,
            shift_end: new.shift_end,
            description: new.description.clone(),
        };
        t.shifts.push(shift.clone());
        Ok(shift)
    }

    async fn shift(&self, id: u64) -> StoreResult<Option<Shift>> {
        let t = self.tables.lock().unwrap();
        Ok(t.shifts.iter().find(|s| s.id == id).cloned())
    }

    async fn shifts(&self) -> StoreResult<Vec<Shift>> {
        Ok(self.tables.lock().unwrap().shifts.clone())
    }

    async fn insert_assignment(&self, new: &NewAssignment) -> StoreResult<ShiftAssignment> {
        self.check_writable(new.employee_id)?;
        let mut t = self.tables.lock().unwrap();
        let assignment = ShiftAssignment {
            id: t.next_id(),
            employee_id: new.employee_id,
            shift_id: new.shift_id,
            shift_name: new.shift_name.clone(),
            shift_start: new.shift_start,
            shift_end: new.shift_end,
            from_date: new.from_date,
            to_date: new.to_date,
            assigned_at: new.assigned_at,
            description: new.description.clone(),
        };
        t.assignments.push(assignment.clone());
        Ok(assignment)
    }

    async fn assignments_for(&self, employee_id: u64) -> StoreResult<Vec<ShiftAssignment>> {
        let t = self.tables.lock().unwrap();
        Ok(t.assignments
            .iter()
            .filter(|a| a.employee_id == employee_id)
            .cloned()
            .collect())
    }

    async fn assignments_valid_on(&self, date: NaiveDate) -> StoreResult<Vec<ShiftAssignment>> {
        let t = self.tables.lock().unwrap();
        let mut out: Vec<ShiftAssignment> = t
            .assignments
            .iter()
            .filter(|a| a.is_valid_on(date))
            .cloned()
            .collect();
        out.sort_by_key(|a| (a.employee_id, a.shift_start));
        Ok(out)
    }

    async fn all_assignments(&self) -> StoreResult<Vec<ShiftAssignment>> {
        Ok(self.tables.lock().unwrap().assignments.clone())
    }

    async fn find_overlapping(
        &self,
        employee_id: u64,
        shift_id: u64,
        shift_name: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Option<ShiftAssignment>> {
        let t = self.tables.lock().unwrap();
        Ok(t.assignments
            .iter()
            .find(|a| {
                a.employee_id == employee_id
                    && (a.shift_id == shift_id || a.shift_name == shift_name)
                    && a.overlaps(from, to)
            })
            .cloned())
    }

    async fn delete_assignments_ended_before(&self, date: NaiveDate) -> StoreResult<u64> {
        let mut t = self.tables.lock().unwrap();
        let before = t.assignments.len();
        t.assignments.retain(|a| a.to_date >= date);
        Ok((before - t.assignments.len()) as u64)
    }
}

#[async_trait]
impl AttendanceLedger for MemoryStore {
    async fn insert_attendance(&self, new: &NewAttendance) -> StoreResult<AttendanceRecord> {
        self.check_writable(new.employee_id)?;
        let mut t = self.tables.lock().unwrap();
        if t.attendance.iter().any(|r| {
            r.employee_id == new.employee_id && r.date == new.date && r.shift_id == new.shift_id
        }) {
            return Err(StoreError::Duplicate);
        }
        let record = AttendanceRecord {
            id: t.next_id(),
            employee_id: new.employee_id,
            name: new.name.clone(),
            date: new.date,
            shift_id: new.shift_id,
            shift_name: new.shift_name.clone(),
            check_in_time: new.check_in_time,
            check_out_time: None,
            location: new.location.clone(),
            status: new.status,
            hours_worked: WorkDuration::ZERO,
            overtime_hours: WorkDuration::ZERO,
            under_time_hours: WorkDuration::ZERO,
        };
        t.attendance.push(record.clone());
        Ok(record)
    }

    async fn attendance(
        &self,
        employee_id: u64,
        date: NaiveDate,
        shift_id: u64,
    ) -> StoreResult<Option<AttendanceRecord>> {
        if self.hide_attendance_once.swap(false, Ordering::SeqCst) {
            return Ok(None);
        }
        let t = self.tables.lock().unwrap();
        Ok(t.attendance
            .iter()
            .find(|r| r.employee_id == employee_id && r.date == date && r.shift_id == shift_id)
            .cloned())
    }

    async fn complete_checkout(&self, id: u64, update: &CheckoutUpdate) -> StoreResult<bool> {
        let employee_id = {
            let t = self.tables.lock().unwrap();
            t.attendance.iter().find(|r| r.id == id).map(|r| r.employee_id)
        };
        if let Some(employee_id) = employee_id {
            self.check_writable(employee_id)?;
        }

        let mut t = self.tables.lock().unwrap();
        match t
            .attendance
            .iter_mut()
            .find(|r| r.id == id && r.check_out_time.is_none())
        {
            Some(record) => {
                record.check_out_time = Some(update.check_out_time);
                record.hours_worked = update.hours_worked;
                record.overtime_hours = update.overtime_hours;
                record.under_time_hours = update.under_time_hours;
                record.status = update.status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn attendance_for_employee(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<AttendanceRecord>> {
        let t = self.tables.lock().unwrap();
        let mut out: Vec<AttendanceRecord> = t
            .attendance
            .iter()
            .filter(|r| r.employee_id == employee_id && from <= r.date && r.date <= to)
            .cloned()
            .collect();
        out.sort_by_key(|r| (r.date, r.shift_id));
        Ok(out)
    }

    async fn attendance_on(&self, date: NaiveDate) -> StoreResult<Vec<AttendanceRecord>> {
        let t = self.tables.lock().unwrap();
        let mut out: Vec<AttendanceRecord> = t
            .attendance
            .iter()
            .filter(|r| r.date == date)
            .cloned()
            .collect();
        out.sort_by_key(|r| (r.employee_id, r.shift_id));
        Ok(out)
    }
}

#[async_trait]
impl SalaryLedger for MemoryStore {
    async fn append_salary(&self, new: &NewSalaryRecord) -> StoreResult<SalaryRecord> {
        self.check_writable(new.employee_id)?;
        let mut t = self.tables.lock().unwrap();
        let record = SalaryRecord {
            id: t.next_id(),
            employee_id: new.employee_id,
            month: new.month,
            year: new.year,
            day: new.day,
            gross_salary: new.gross_salary,
            net_salary: new.net_salary,
            base_salary: new.base_salary,
            overtime_pay: new.overtime_pay,
            undertime_deduction: new.undertime_deduction,
            total_hours_worked: new.total_hours_worked,
            total_overtime_hours: new.total_overtime_hours,
            total_undertime_hours: new.total_undertime_hours,
            total_pf: new.total_pf,
            total_esic: new.total_esic,
            created_at: new.created_at,
        };
        t.salaries.push(record.clone());
        Ok(record)
    }

    async fn salaries_for_month(
        &self,
        employee_id: u64,
        month: u32,
        year: i32,
    ) -> StoreResult<Vec<SalaryRecord>> {
        let t = self.tables.lock().unwrap();
        Ok(t.salaries
            .iter()
            .filter(|s| s.employee_id == employee_id && s.month == month && s.year == year)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SweepClaims for MemoryStore {
    async fn claim(&self, sweep: &str, slot: &str, at: NaiveDateTime) -> StoreResult<bool> {
        let mut t = self.tables.lock().unwrap();
        let key = (sweep.to_string(), slot.to_string());
        if t.sweep_runs.contains_key(&key) {
            return Ok(false);
        }
        t.sweep_runs.insert(key, at);
        Ok(true)
    }

    async fn prune_claims_before(&self, cutoff: NaiveDateTime) -> StoreResult<u64> {
        let mut t = self.tables.lock().unwrap();
        let before = t.sweep_runs.len();
        t.sweep_runs.retain(|_, claimed_at| *claimed_at >= cutoff);
        Ok((before - t.sweep_runs.len()) as u64)
    }
}
