use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use futures::stream::{self, StreamExt};

use crate::clock::Clock;
use crate::error::AppError;
use crate::model::{
    duration::WorkDuration,
    salary::{MonthlySalary, NewSalaryRecord, SalaryRecord},
};
use crate::service::SweepReport;
use crate::store::Store;

pub const EMPLOYER_PF_RATE: f64 = 0.125;
pub const EMPLOYEE_PF_RATE: f64 = 0.12;
pub const EMPLOYER_ESIC_RATE: f64 = 0.0325;
pub const EMPLOYEE_ESIC_RATE: f64 = 0.0075;

pub fn daily_salary(base_salary: f64, total_working_days: Option<u32>) -> f64 {
    match total_working_days {
        Some(days) if days > 0 && base_salary > 0.0 => base_salary / days as f64,
        _ => 0.0,
    }
}

pub fn hourly_salary(daily_salary: f64, working_hours_per_shift: f64) -> f64 {
    if working_hours_per_shift > 0.0 {
        daily_salary / working_hours_per_shift
    } else {
        0.0
    }
}

pub fn round_money(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Unrounded amounts for one employee-day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Accrual {
    pub daily: f64,
    pub hourly: f64,
    pub overtime_pay: f64,
    pub undertime_deduction: f64,
    pub gross: f64,
    pub employer_pf: f64,
    pub employee_pf: f64,
    pub employer_esic: f64,
    pub employee_esic: f64,
    pub net: f64,
}

pub fn accrue(
    base_salary: f64,
    total_working_days: Option<u32>,
    working_hours_per_shift: f64,
    overtime_hours: f64,
    undertime_hours: f64,
) -> Accrual {
    let daily = daily_salary(base_salary, total_working_days);
    let hourly = hourly_salary(daily, working_hours_per_shift);
    let overtime_pay = hourly * overtime_hours;
    let undertime_deduction = hourly * undertime_hours;
    let gross = daily + overtime_pay - undertime_deduction;

    let employer_pf = gross * EMPLOYER_PF_RATE;
    let employee_pf = gross * EMPLOYEE_PF_RATE;
    let employer_esic = gross * EMPLOYER_ESIC_RATE;
    let employee_esic = gross * EMPLOYEE_ESIC_RATE;

    Accrual {
        daily,
        hourly,
        overtime_pay,
        undertime_deduction,
        gross,
        employer_pf,
        employee_pf,
        employer_esic,
        employee_esic,
        net: gross - employee_pf - employee_esic,
    }
}

/// Daily salary accrual from attendance.
pub struct PayrollEngine {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    concurrency: usize,
}

impl PayrollEngine {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, concurrency: usize) -> Self {
        Self {
            store,
            clock,
            concurrency: concurrency.max(1),
        }
    }

    /// Computes and appends one salary record for the given day.
    pub async fn run_for_employee(
        &self,
        employee_id: u64,
        month: u32,
        year: i32,
        day: u32,
    ) -> Result<SalaryRecord, AppError> {
        let date = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| AppError::validation("Invalid payroll date"))?;

        let employee = self
            .store
            .employee(employee_id)
            .await?
            .ok_or_else(|| AppError::not_found("Employee not found"))?;

        let (worked, overtime, undertime) = self
            .store
            .attendance_for_employee(employee_id, date, date)
            .await?
            .iter()
            .filter(|r| r.status.is_payable())
            .fold(
                (WorkDuration::ZERO, WorkDuration::ZERO, WorkDuration::ZERO),
                |(w, o, u), r| (w + r.hours_worked, o + r.overtime_hours, u + r.under_time_hours),
            );

        let accrual = accrue(
            employee.salary,
            employee.total_working_days,
            employee.working_hours_per_shift(),
            overtime.as_hours(),
            undertime.as_hours(),
        );

        let record = self
            .store
            .append_salary(&NewSalaryRecord {
                employee_id,
                month,
                year,
                day,
                gross_salary: round_money(accrual.gross),
                net_salary: round_money(accrual.net),
                base_salary: round_money(accrual.daily),
                overtime_pay: round_money(accrual.overtime_pay),
                undertime_deduction: round_money(accrual.undertime_deduction),
                total_hours_worked: round_money(worked.as_hours()),
                total_overtime_hours: round_money(overtime.as_hours()),
                total_undertime_hours: round_money(undertime.as_hours()),
                total_pf: round_money(accrual.employer_pf + accrual.employee_pf),
                total_esic: round_money(accrual.employer_esic + accrual.employee_esic),
                created_at: self.clock.now(),
            })
            .await?;

        tracing::debug!(
            employee_id,
            %date,
            gross = record.gross_salary,
            net = record.net_salary,
            "Salary accrued"
        );
        Ok(record)
    }

    /// Runs the day's payroll for every active employee.
    pub async fn run_payroll_sweep(&self, day: NaiveDate) -> Result<SweepReport, AppError> {
        let employees = self.store.employees().await?;

        let results: Vec<(u64, Result<SalaryRecord, AppError>)> = stream::iter(employees)
            .map(|employee| async move {
                let result = self
                    .run_for_employee(employee.id, day.month(), day.year(), day.day())
                    .await;
                (employee.id, result)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut report = SweepReport::default();
        for (employee_id, result) in results {
            report.examined += 1;
            match result {
                Ok(_) => report.changed += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(error = %e, employee_id, %day, "Payroll failed");
                }
            }
        }

        tracing::info!(?report, %day, "Payroll sweep finished");
        Ok(report)
    }

    pub async fn monthly_summary(
        &self,
        employee_id: u64,
        month: u32,
        year: i32,
    ) -> Result<MonthlySalary, AppError> {
        if !(1..=12).contains(&month) {
            return Err(AppError::validation("Month must be between 1 and 12"));
        }

        let records = self
            .store
            .salaries_for_month(employee_id, month, year)
            .await?;
        if records.is_empty() {
            return Err(AppError::not_found(
                "Salary data not found for the selected month",
            ));
        }

        let sum = |f: fn(&SalaryRecord) -> f64| round_money(records.iter().map(f).sum());

        Ok(MonthlySalary {
            employee_id,
            month,
            year,
            days: records.len(),
            gross_salary: sum(|r| r.gross_salary),
            net_salary: sum(|r| r.net_salary),
            total_pf: sum(|r| r.total_pf),
            total_esic: sum(|r| r.total_esic),
        })
    }
}
