use std::str::FromStr;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::{FromRow, MySqlPool};

use crate::model::{
    attendance::{AttendanceRecord, AttendanceStatus, CheckoutUpdate, NewAttendance},
    duration::WorkDuration,
    employee::{ACTIVE, CurrentShift, Employee, EmployeeUpdate, NewEmployee, WeekoffSchedule},
    salary::{NewSalaryRecord, SalaryRecord},
    shift::{NewAssignment, NewShift, Shift, ShiftAssignment},
};
use crate::store::{
    AttendanceLedger, EmployeeDirectory, SalaryLedger, ShiftCatalog, StoreError, StoreResult,
    SweepClaims,
};

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

// ---------- rows ----------

const EMPLOYEE_COLUMNS: &str = r#"
    id, employee_code, first_name, last_name, email, profile_pic, salary,
    total_working_days, weekoff_schedule, shift_name, shift_start, shift_end, status
"#;

#[derive(FromRow)]
struct EmployeeRow {
    id: u64,
    employee_code: String,
    first_name: String,
    last_name: String,
    email: String,
    profile_pic: Option<String>,
    salary: f64,
    total_working_days: Option<u32>,
    weekoff_schedule: String,
    shift_name: Option<String>,
    shift_start: Option<NaiveTime>,
    shift_end: Option<NaiveTime>,
    status: String,
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = StoreError;

    fn try_from(row: EmployeeRow) -> Result<Self, Self::Error> {
        Ok(Employee {
            weekoff_schedule: WeekoffSchedule::from_storage(&row.weekoff_schedule)
                .map_err(StoreError::Corrupt)?,
            id: row.id,
            employee_code: row.employee_code,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            profile_pic: row.profile_pic,
            salary: row.salary,
            total_working_days: row.total_working_days,
            shift_name: row.shift_name,
            shift_start: row.shift_start,
            shift_end: row.shift_end,
            status: row.status,
        })
    }
}

const SHIFT_COLUMNS: &str = "id, shift_name, shift_start, shift_end, description";

#[derive(FromRow)]
struct ShiftRow {
    id: u64,
    shift_name: String,
    shift_start: NaiveTime,
    shift_end: NaiveTime,
    description: Option<String>,
}

impl From<ShiftRow> for Shift {
    fn from(row: ShiftRow) -> Self {
        Shift {
            id: row.id,
            shift_name: row.shift_name,
            shift_start: row.shift_start,
            shift_end: row.shift_end,
            description: row.description,
        }
    }
}

const ASSIGNMENT_COLUMNS: &str = r#"
    id, employee_id, shift_id, shift_name, shift_start, shift_end,
    from_date, to_date, assigned_at, description
"#;

#[derive(FromRow)]
struct AssignmentRow {
    id: u64,
    employee_id: u64,
    shift_id: u64,
    shift_name: String,
    shift_start: NaiveTime,
    shift_end: NaiveTime,
    from_date: NaiveDate,
    to_date: NaiveDate,
    assigned_at: NaiveDateTime,
    description: Option<String>,
}

impl From<AssignmentRow> for ShiftAssignment {
    fn from(row: AssignmentRow) -> Self {
        ShiftAssignment {
            id: row.id,
            employee_id: row.employee_id,
            shift_id: row.shift_id,
            shift_name: row.shift_name,
            shift_start: row.shift_start,
            shift_end: row.shift_end,
            from_date: row.from_date,
            to_date: row.to_date,
            assigned_at: row.assigned_at,
            description: row.description,
        }
    }
}

const ATTENDANCE_COLUMNS: &str = r#"
    id, employee_id, name, date, shift_id, shift_name, check_in_time, check_out_time,
    location, status, hours_worked_secs, overtime_secs, undertime_secs
"#;

#[derive(FromRow)]
struct AttendanceRow {
    id: u64,
    employee_id: u64,
    name: String,
    date: NaiveDate,
    shift_id: u64,
    shift_name: String,
    check_in_time: Option<NaiveDateTime>,
    check_out_time: Option<NaiveDateTime>,
    location: String,
    status: String,
    hours_worked_secs: i64,
    overtime_secs: i64,
    undertime_secs: i64,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = StoreError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        let status = AttendanceStatus::from_str(&row.status)
            .map_err(|_| StoreError::Corrupt(format!("attendance status {:?}", row.status)))?;

        Ok(AttendanceRecord {
            id: row.id,
            employee_id: row.employee_id,
            name: row.name,
            date: row.date,
            shift_id: row.shift_id,
            shift_name: row.shift_name,
            check_in_time: row.check_in_time,
            check_out_time: row.check_out_time,
            location: row.location,
            status,
            hours_worked: WorkDuration::from_seconds(row.hours_worked_secs),
            overtime_hours: WorkDuration::from_seconds(row.overtime_secs),
            under_time_hours: WorkDuration::from_seconds(row.undertime_secs),
        })
    }
}

const SALARY_COLUMNS: &str = r#"
    id, employee_id, month, year, day, gross_salary, net_salary, base_salary,
    overtime_pay, undertime_deduction, total_hours_worked, total_overtime_hours,
    total_undertime_hours, total_pf, total_esic, created_at
"#;

#[derive(FromRow)]
struct SalaryRow {
    id: u64,
    employee_id: u64,
    month: u32,
    year: i32,
    day: u32,
    gross_salary: f64,
    net_salary: f64,
    base_salary: f64,
    overtime_pay: f64,
    undertime_deduction: f64,
    total_hours_worked: f64,
    total_overtime_hours: f64,
    total_undertime_hours: f64,
    total_pf: f64,
    total_esic: f64,
    created_at: NaiveDateTime,
}

impl From<SalaryRow> for SalaryRecord {
    fn from(row: SalaryRow) -> Self {
        SalaryRecord {
            id: row.id,
            employee_id: row.employee_id,
            month: row.month,
            year: row.year,
            day: row.day,
            gross_salary: row.gross_salary,
            net_salary: row.net_salary,
            base_salary: row.base_salary,
            overtime_pay: row.overtime_pay,
            undertime_deduction: row.undertime_deduction,
            total_hours_worked: row.total_hours_worked,
            total_overtime_hours: row.total_overtime_hours,
            total_undertime_hours: row.total_undertime_hours,
            total_pf: row.total_pf,
            total_esic: row.total_esic,
            created_at: row.created_at,
        }
    }
}

fn decode_all<R, T>(rows: Vec<R>) -> StoreResult<Vec<T>>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

// ---------- employees ----------

#[async_trait]
impl EmployeeDirectory for MySqlStore {
    async fn create_employee(&self, new: &NewEmployee) -> StoreResult<Employee> {
        let result = sqlx::query(
            r#"
            INSERT INTO employees
            (employee_code, first_name, last_name, email, profile_pic, salary,
             total_working_days, weekoff_schedule)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new.employee_code)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.email)
        .bind(&new.profile_pic)
        .bind(new.salary)
        .bind(new.total_working_days)
        .bind(new.weekoff_schedule.to_storage())
        .execute(&self.pool)
        .await?;

        Ok(Employee {
            id: result.last_insert_id(),
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
        })
    }

    async fn employee(&self, id: u64) -> StoreResult<Option<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?");
        sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Employee::try_from)
            .transpose()
    }

    async fn employees(&self) -> StoreResult<Vec<Employee>> {
        let sql = format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE status = 'active' ORDER BY id"
        );
        let rows = sqlx::query_as::<_, EmployeeRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        decode_all(rows)
    }

    async fn all_employees(&self) -> StoreResult<Vec<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY id");
        let rows = sqlx::query_as::<_, EmployeeRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        decode_all(rows)
    }

    async fn update_employee(&self, employee_id: u64, update: &EmployeeUpdate) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE employees
            SET first_name = COALESCE(?, first_name),
                last_name = COALESCE(?, last_name),
                email = COALESCE(?, email),
                profile_pic = COALESCE(?, profile_pic),
                salary = COALESCE(?, salary),
                total_working_days = COALESCE(?, total_working_days)
            WHERE id = ?
            "#,
        )
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(&update.email)
        .bind(&update.profile_pic)
        .bind(update.salary)
        .bind(update.total_working_days)
        .bind(employee_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_employee_status(&self, employee_id: u64, status: &str) -> StoreResult<()> {
        sqlx::query("UPDATE employees SET status = ? WHERE id = ?")
            .bind(status)
            .bind(employee_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_current_shift(&self, employee_id: u64, shift: &CurrentShift) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE employees
            SET shift_name = ?, shift_start = ?, shift_end = ?
            WHERE id = ?
            "#,
        )
        .bind(&shift.shift_name)
        .bind(shift.shift_start)
        .bind(shift.shift_end)
        .bind(employee_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_weekoff_schedule(
        &self,
        employee_id: u64,
        schedule: &WeekoffSchedule,
    ) -> StoreResult<()> {
        sqlx::query("UPDATE employees SET weekoff_schedule = ? WHERE id = ?")
            .bind(schedule.to_storage())
            .bind(employee_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

// ---------- shifts & assignments ----------

#[async_trait]
impl ShiftCatalog for MySqlStore {
    async fn create_shift(&self, new: &NewShift) -> StoreResult<Shift> {
        let result = sqlx::query(
            "INSERT INTO shifts (shift_name, shift_start, shift_end, description) VALUES (?, ?, ?, ?)",
        )
        .bind(&new.shift_name)
        .bind(new.shift_start)
        .bind(new.shift_end)
        .bind(&new.description)
        .execute(&self.pool)
        .await?;

        Ok(Shift {
            id: result.last_insert_id(),
            shift_name: new.shift_name.clone(),
            shift_start: new.shift_start,
            shift_end: new.shift_end,
            description: new.description.clone(),
        })
    }

    async fn shift(&self, id: u64) -> StoreResult<Option<Shift>> {
        let sql = format!("SELECT {SHIFT_COLUMNS} FROM shifts WHERE id = ?");
        let row = sqlx::query_as::<_, ShiftRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Shift::from))
    }

    async fn shifts(&self) -> StoreResult<Vec<Shift>> {
        let sql = format!("SELECT {SHIFT_COLUMNS} FROM shifts ORDER BY shift_start, id");
        let rows = sqlx::query_as::<_, ShiftRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Shift::from).collect())
    }

    async fn insert_assignment(&self, new: &NewAssignment) -> StoreResult<ShiftAssignment> {
        let result = sqlx::query(
            r#"
            INSERT INTO shift_assignments
            (employee_id, shift_id, shift_name, shift_start, shift_end,
             from_date, to_date, assigned_at, description)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.employee_id)
        .bind(new.shift_id)
        .bind(&new.shift_name)
        .bind(new.shift_start)
        .bind(new.shift_end)
        .bind(new.from_date)
        .bind(new.to_date)
        .bind(new.assigned_at)
        .bind(&new.description)
        .execute(&self.pool)
        .await?;

        Ok(ShiftAssignment {
            id: result.last_insert_id(),
            employee_id: new.employee_id,
            shift_id: new.shift_id,
            shift_name: new.shift_name.clone(),
            shift_start: new.shift_start,
            shift_end: new.shift_end,
            from_date: new.from_date,
            to_date: new.to_date,
            assigned_at: new.assigned_at,
            description: new.description.clone(),
        })
    }

    async fn assignments_for(&self, employee_id: u64) -> StoreResult<Vec<ShiftAssignment>> {
        let sql = format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM shift_assignments WHERE employee_id = ? ORDER BY from_date, shift_start"
        );
        let rows = sqlx::query_as::<_, AssignmentRow>(&sql)
            .bind(employee_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(ShiftAssignment::from).collect())
    }

    async fn assignments_valid_on(&self, date: NaiveDate) -> StoreResult<Vec<ShiftAssignment>> {
        let sql = format!(
            r#"
            SELECT {ASSIGNMENT_COLUMNS} FROM shift_assignments
            WHERE from_date <= ? AND to_date >= ?
            ORDER BY employee_id, shift_start
            "#
        );
        let rows = sqlx::query_as::<_, AssignmentRow>(&sql)
            .bind(date)
            .bind(date)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(ShiftAssignment::from).collect())
    }

    async fn all_assignments(&self) -> StoreResult<Vec<ShiftAssignment>> {
        let sql = format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM shift_assignments ORDER BY employee_id, from_date"
        );
        let rows = sqlx::query_as::<_, AssignmentRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(ShiftAssignment::from).collect())
    }

    async fn find_overlapping(
        &self,
        employee_id: u64,
        shift_id: u64,
        shift_name: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Option<ShiftAssignment>> {
        let sql = format!(
            r#"
            SELECT {ASSIGNMENT_COLUMNS} FROM shift_assignments
            WHERE employee_id = ?
            AND (shift_id = ? OR shift_name = ?)
            AND from_date <= ?
            AND to_date >= ?
            LIMIT 1
            "#
        );
        let row = sqlx::query_as::<_, AssignmentRow>(&sql)
            .bind(employee_id)
            .bind(shift_id)
            .bind(shift_name)
            .bind(to)
            .bind(from)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(ShiftAssignment::from))
    }

    async fn delete_assignments_ended_before(&self, date: NaiveDate) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM shift_assignments WHERE to_date < ?")
            .bind(date)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

// ---------- attendance ----------

#[async_trait]
impl AttendanceLedger for MySqlStore {
    async fn insert_attendance(&self, new: &NewAttendance) -> StoreResult<AttendanceRecord> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance
            (employee_id, name, date, shift_id, shift_name, check_in_time, location, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.employee_id)
        .bind(&new.name)
        .bind(new.date)
        .bind(new.shift_id)
        .bind(&new.shift_name)
        .bind(new.check_in_time)
        .bind(&new.location)
        .bind(new.status.as_ref())
        .execute(&self.pool)
        .await?;

        Ok(AttendanceRecord {
            id: result.last_insert_id(),
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
        })
    }

    async fn attendance(
        &self,
        employee_id: u64,
        date: NaiveDate,
        shift_id: u64,
    ) -> StoreResult<Option<AttendanceRecord>> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE employee_id = ? AND date = ? AND shift_id = ?"
        );
        sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(employee_id)
            .bind(date)
            .bind(shift_id)
            .fetch_optional(&self.pool)
            .await?
            .map(AttendanceRecord::try_from)
            .transpose()
    }

    async fn complete_checkout(&self, id: u64, update: &CheckoutUpdate) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET check_out_time = ?, hours_worked_secs = ?, overtime_secs = ?,
                undertime_secs = ?, status = ?
            WHERE id = ?
            AND check_out_time IS NULL
            "#,
        )
        .bind(update.check_out_time)
        .bind(update.hours_worked.as_seconds())
        .bind(update.overtime_hours.as_seconds())
        .bind(update.under_time_hours.as_seconds())
        .bind(update.status.as_ref())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn attendance_for_employee(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<AttendanceRecord>> {
        let sql = format!(
            r#"
            SELECT {ATTENDANCE_COLUMNS} FROM attendance
            WHERE employee_id = ? AND date BETWEEN ? AND ?
            ORDER BY date, shift_id
            "#
        );
        let rows = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(employee_id)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;
        decode_all(rows)
    }

    async fn attendance_on(&self, date: NaiveDate) -> StoreResult<Vec<AttendanceRecord>> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE date = ? ORDER BY employee_id, shift_id"
        );
        let rows = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(date)
            .fetch_all(&self.pool)
            .await?;
        decode_all(rows)
    }
}

// ---------- salaries ----------

#[async_trait]
impl SalaryLedger for MySqlStore {
    async fn append_salary(&self, new: &NewSalaryRecord) -> StoreResult<SalaryRecord> {
        let result = sqlx::query(
            r#"
            INSERT INTO salaries
            (employee_id, month, year, day, gross_salary, net_salary, base_salary,
             overtime_pay, undertime_deduction, total_hours_worked, total_overtime_hours,
             total_undertime_hours, total_pf, total_esic, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.employee_id)
        .bind(new.month)
        .bind(new.year)
        .bind(new.day)
        .bind(new.gross_salary)
        .bind(new.net_salary)
        .bind(new.base_salary)
        .bind(new.overtime_pay)
        .bind(new.undertime_deduction)
        .bind(new.total_hours_worked)
        .bind(new.total_overtime_hours)
        .bind(new.total_undertime_hours)
        .bind(new.total_pf)
        .bind(new.total_esic)
        .bind(new.created_at)
        .execute(&self.pool)
        .await?;

        Ok(SalaryRecord {
            id: result.last_insert_id(),
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
        })
    }

    async fn salaries_for_month(
        &self,
        employee_id: u64,
        month: u32,
        year: i32,
    ) -> StoreResult<Vec<SalaryRecord>> {
        let sql = format!(
            r#"
            SELECT {SALARY_COLUMNS} FROM salaries
            WHERE employee_id = ? AND month = ? AND year = ?
            ORDER BY day, id
            "#
        );
        let rows = sqlx::query_as::<_, SalaryRow>(&sql)
            .bind(employee_id)
            .bind(month)
            .bind(year)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(SalaryRecord::from).collect())
    }
}

// ---------- sweep coordination ----------

#[async_trait]
impl SweepClaims for MySqlStore {
    async fn claim(&self, sweep: &str, slot: &str, at: NaiveDateTime) -> StoreResult<bool> {
        let result = sqlx::query("INSERT INTO sweep_runs (sweep, slot, claimed_at) VALUES (?, ?, ?)")
            .bind(sweep)
            .bind(slot)
            .bind(at)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) => match StoreError::from(e) {
                StoreError::Duplicate => Ok(false),
                other => Err(other),
            },
        }
    }

    async fn prune_claims_before(&self, cutoff: NaiveDateTime) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM sweep_runs WHERE claimed_at < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
