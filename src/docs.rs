use crate::api::attendance::{AttendanceAction, MarkAttendance};
use crate::api::employee::WeekoffUpdate;
use crate::api::face::VerifyFace;
use crate::api::payroll::RunPayroll;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::employee::{Employee, EmployeeUpdate, NewEmployee};
use crate::model::salary::{MonthlySalary, SalaryRecord};
use crate::model::shift::{NewShift, Shift, ShiftAssignment};
use crate::service::SweepReport;
use crate::service::assignment::AssignShift;
use crate::service::geocode::GeoPoint;
use crate::service::reconciler::{ShiftPhase, ShiftStatus};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Attendance & Payroll API",
        version = "1.0.0",
        description = r#"
## Attendance and Payroll

Shift scheduling, geo-tagged check-in/check-out and daily salary accrual.

### Key Features
- **Shifts**
  - Define shifts and assign them to employees for date ranges without overlap
- **Attendance**
  - Check in and out against the assigned shift; the location is reverse-geocoded
  - Open records are closed at shift end; absences and week-offs are recorded nightly
- **Payroll**
  - One salary record per employee and day, with overtime, undertime, PF and ESIC
- **Face verification**
  - Compare a captured image with the profile picture

### Security
Every endpoint requires a **JWT Bearer** access token.
Only **Admin** or **HR** roles can manage shifts, employees and payroll;
employees act on their own records.
"#,
    ),
    paths(
        crate::api::shift::create_shift,
        crate::api::shift::list_shifts,
        crate::api::shift::assign_shift,
        crate::api::shift::list_assignments,
        crate::api::shift::employee_shifts,
        crate::api::shift::shift_status,

        crate::api::attendance::mark_attendance,
        crate::api::attendance::open_attendance,
        crate::api::attendance::weekly_attendance,
        crate::api::attendance::monthly_attendance,
        crate::api::attendance::attendance_report,
        crate::api::attendance::salary_attendance,

        crate::api::payroll::run_payroll,
        crate::api::payroll::monthly_salary,

        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::update_employee,
        crate::api::employee::deactivate_employee,
        crate::api::employee::get_weekoff,
        crate::api::employee::update_weekoff,

        crate::api::face::verify_face
    ),
    components(
        schemas(
            Shift,
            NewShift,
            ShiftAssignment,
            AssignShift,
            ShiftPhase,
            ShiftStatus,
            AttendanceRecord,
            AttendanceStatus,
            AttendanceAction,
            MarkAttendance,
            GeoPoint,
            SalaryRecord,
            MonthlySalary,
            RunPayroll,
            SweepReport,
            Employee,
            NewEmployee,
            EmployeeUpdate,
            WeekoffUpdate,
            VerifyFace
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Shift", description = "Shift definitions and assignments"),
        (name = "Attendance", description = "Check-in, check-out and attendance views"),
        (name = "Payroll", description = "Daily salary accrual and monthly totals"),
        (name = "Employee", description = "Employee directory"),
        (name = "Face", description = "Face verification"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
