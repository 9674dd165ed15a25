use chrono::NaiveDateTime;
use serde::Serialize;
use utoipa::ToSchema;

/// Output of one payroll run for one employee and day. Runs append; a rerun
/// for the same day writes another row.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalaryRecord {
    pub id: u64,
    pub employee_id: u64,
    #[schema(example = 3)]
    pub month: u32,
    #[schema(example = 2025)]
    pub year: i32,
    #[schema(example = 10)]
    pub day: u32,
    pub gross_salary: f64,
    pub net_salary: f64,
    /// The day's share of the monthly salary.
    pub base_salary: f64,
    pub overtime_pay: f64,
    pub undertime_deduction: f64,
    pub total_hours_worked: f64,
    pub total_overtime_hours: f64,
    pub total_undertime_hours: f64,
    pub total_pf: f64,
    pub total_esic: f64,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSalaryRecord {
    pub employee_id: u64,
    pub month: u32,
    pub year: i32,
    pub day: u32,
    pub gross_salary: f64,
    pub net_salary: f64,
    pub base_salary: f64,
    pub overtime_pay: f64,
    pub undertime_deduction: f64,
    pub total_hours_worked: f64,
    pub total_overtime_hours: f64,
    pub total_undertime_hours: f64,
    pub total_pf: f64,
    pub total_esic: f64,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "employeeId": 1,
    "month": 3,
    "year": 2025,
    "days": 22,
    "grossSalary": 22000.0,
    "netSalary": 19195.0,
    "totalPf": 5390.0,
    "totalEsic": 880.0
}))]
pub struct MonthlySalary {
    pub employee_id: u64,
    pub month: u32,
    pub year: i32,
    /// Number of daily runs summed.
    pub days: usize,
    pub gross_salary: f64,
    pub net_salary: f64,
    pub total_pf: f64,
    pub total_esic: f64,
}
