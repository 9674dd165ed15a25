use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::attendance::AttendanceRecord;
use crate::service::geocode::GeoPoint;
use crate::service::reconciler::CheckIn;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
pub enum AttendanceAction {
    #[serde(rename = "Check-In")]
    CheckIn,
    #[serde(rename = "Check-Out")]
    CheckOut,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkAttendance {
    #[schema(example = 1)]
    pub employee_id: u64,

    pub location: GeoPoint,

    /// RFC 3339; the offset is the caller's wall clock.
    #[schema(example = "2025-03-10T09:05:00+05:30", value_type = String, format = "date-time")]
    pub timestamp: DateTime<FixedOffset>,

    #[serde(rename = "type")]
    pub action: AttendanceAction,

    #[schema(example = "Morning")]
    pub shift_name: String,

    /// Resolved from `shiftName` when omitted.
    #[schema(example = 3)]
    pub shift_id: Option<u64>,
}

/// Check in to, or check out of, an assigned shift
#[utoipa::path(
    post,
    path = "/api/markAttendance",
    request_body = MarkAttendance,
    responses(
        (status = 200, description = "Attendance recorded", body = Object, example = json!({
            "message": "Check-In successful",
            "attendance": {"status": "Checked-In"}
        })),
        (status = 400, description = "Invalid location or no check-in to close"),
        (status = 404, description = "No valid shift at this time"),
        (status = 409, description = "Already checked in or out"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
#[instrument(skip_all, fields(employee_id = payload.employee_id, action = ?payload.action))]
pub async fn mark_attendance(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<MarkAttendance>,
) -> Result<impl Responder, AppError> {
    let req = payload.into_inner();
    auth.require_self_or_hr(req.employee_id)?;

    let timestamp = req.timestamp.naive_local();
    let (message, record) = match req.action {
        AttendanceAction::CheckIn => {
            let record = state
                .attendance
                .check_in(CheckIn {
                    employee_id: req.employee_id,
                    shift_name: req.shift_name,
                    shift_id: req.shift_id,
                    location: req.location,
                    timestamp,
                })
                .await?;
            ("Check-In successful", record)
        }
        AttendanceAction::CheckOut => {
            req.location.validate()?;
            let date = timestamp.date();
            let shift_id = match req.shift_id {
                Some(id) => id,
                None => {
                    state
                        .attendance
                        .resolve_shift_id(req.employee_id, &req.shift_name, date)
                        .await?
                }
            };
            let record = state
                .attendance
                .check_out(req.employee_id, shift_id, date, timestamp)
                .await?;
            ("Check-Out successful", record)
        }
    };

    Ok(HttpResponse::Ok().json(json!({
        "message": message,
        "attendance": record
    })))
}

/// The caller's open records for today
#[utoipa::path(
    get,
    path = "/api/attendance",
    responses((status = 200, body = [AttendanceRecord]), (status = 403)),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn open_attendance(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let employee_id = auth.employee_id()?;
    let today = state.clock.today();

    let open: Vec<AttendanceRecord> = state
        .store
        .attendance_for_employee(employee_id, today, today)
        .await?
        .into_iter()
        .filter(|r| r.is_open())
        .collect();
    Ok(HttpResponse::Ok().json(open))
}

/// The caller's records for the current Monday-to-Sunday week
#[utoipa::path(
    get,
    path = "/api/weekly-attendance",
    responses((status = 200, body = [AttendanceRecord])),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn weekly_attendance(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let employee_id = auth.employee_id()?;
    let today = state.clock.today();
    let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
    let sunday = monday + Duration::days(6);

    let records = state
        .store
        .attendance_for_employee(employee_id, monday, sunday)
        .await?;
    Ok(HttpResponse::Ok().json(records))
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MonthQuery {
    /// `YYYY-MM`
    #[param(example = "2025-03")]
    pub month: Option<String>,
}

/// First and last day of a `YYYY-MM` month.
pub fn month_bounds(raw: &str) -> Option<(NaiveDate, NaiveDate)> {
    let (year, month) = raw.trim().split_once('-')?;
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next.pred_opt()?))
}

#[utoipa::path(
    get,
    path = "/api/monthly-attendance",
    params(MonthQuery),
    responses(
        (status = 200, body = [AttendanceRecord]),
        (status = 400, description = "Month missing or not YYYY-MM"),
        (status = 404, description = "No attendance for the month")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn monthly_attendance(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<MonthQuery>,
) -> Result<impl Responder, AppError> {
    let employee_id = auth.employee_id()?;
    let raw = query
        .month
        .as_deref()
        .ok_or_else(|| AppError::validation("Month is required in YYYY-MM format."))?;
    let (first, last) = month_bounds(raw)
        .ok_or_else(|| AppError::validation("Month is required in YYYY-MM format."))?;

    let records = state
        .store
        .attendance_for_employee(employee_id, first, last)
        .await?;
    if records.is_empty() {
        return Err(AppError::not_found(
            "No attendance data for the selected month.",
        ));
    }
    Ok(HttpResponse::Ok().json(records))
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    #[param(example = "2025-03-10", value_type = Option<String>, format = Date)]
    pub date: Option<NaiveDate>,
}

/// Every employee's records for one day
#[utoipa::path(
    get,
    path = "/api/attendance/report",
    params(ReportQuery),
    responses(
        (status = 200, body = [AttendanceRecord]),
        (status = 400, description = "Date is required"),
        (status = 404, description = "No records for the date")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn attendance_report(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<ReportQuery>,
) -> Result<impl Responder, AppError> {
    auth.require_hr_or_admin()?;
    let date = query
        .date
        .ok_or_else(|| AppError::validation("Date is required"))?;

    let records = state.store.attendance_on(date).await?;
    if records.is_empty() {
        return Err(AppError::not_found(
            "No attendance records found for the selected date",
        ));
    }
    Ok(HttpResponse::Ok().json(records))
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SalaryAttendanceQuery {
    pub employee_id: Option<u64>,
    /// Defaults to the first of the current month.
    #[param(value_type = Option<String>, format = Date)]
    pub from: Option<NaiveDate>,
    /// Defaults to today.
    #[param(value_type = Option<String>, format = Date)]
    pub to: Option<NaiveDate>,
}

/// Attendance records that feed an employee's payroll
#[utoipa::path(
    get,
    path = "/api/salary/attendance",
    params(SalaryAttendanceQuery),
    responses(
        (status = 200, body = [AttendanceRecord]),
        (status = 400, description = "employee_id is required"),
        (status = 404, description = "No attendance records found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn salary_attendance(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<SalaryAttendanceQuery>,
) -> Result<impl Responder, AppError> {
    let employee_id = query
        .employee_id
        .ok_or_else(|| AppError::validation("employee_id is required"))?;
    auth.require_self_or_hr(employee_id)?;

    let today = state.clock.today();
    let from = query.from.unwrap_or_else(|| today.with_day(1).unwrap_or(today));
    let to = query.to.unwrap_or(today);
    if to < from {
        return Err(AppError::validation("to must not be earlier than from"));
    }

    let records = state
        .store
        .attendance_for_employee(employee_id, from, to)
        .await?;
    if records.is_empty() {
        return Err(AppError::not_found("No attendance records found"));
    }
    Ok(HttpResponse::Ok().json(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;
    use crate::testing::{
        at, bearer, date, hm, seed_assignment, seed_employee, seed_shift, test_app, test_state,
    };
    use actix_web::test as actix_test;
    use serde_json::Value;

    fn mark(employee_id: u64, kind: &str, timestamp: &str) -> Value {
        json!({
            "employeeId": employee_id,
            "location": {"latitude": 12.9716, "longitude": 77.5946},
            "timestamp": timestamp,
            "type": kind,
            "shiftName": "Morning"
        })
    }

    #[test]
    fn month_bounds_cover_the_whole_month() {
        assert_eq!(
            month_bounds("2024-02"),
            Some((date(2024, 2, 1), date(2024, 2, 29)))
        );
        assert_eq!(
            month_bounds("2024-12"),
            Some((date(2024, 12, 1), date(2024, 12, 31)))
        );
        assert_eq!(month_bounds("2024-13"), None);
        assert_eq!(month_bounds("december"), None);
    }

    #[actix_web::test]
    async fn check_in_then_out_through_the_api() {
        let t = test_state(at(date(2025, 3, 10), 9, 5));
        let emp = seed_employee(&t.store, "E1", &[]).await;
        let shift = seed_shift(&t.store, "Morning", hm(9, 0), hm(17, 0)).await;
        seed_assignment(&t.store, emp.id, &shift, date(2025, 3, 1), date(2025, 3, 31)).await;
        let app = actix_test::init_service(test_app(t.clone())).await;

        let req = actix_test::TestRequest::post()
            .uri("/api/markAttendance")
            .insert_header(bearer(Role::Employee, Some(emp.id)))
            .set_json(mark(emp.id, "Check-In", "2025-03-10T09:05:00+05:30"))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let body: Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["attendance"]["status"], "Checked-In");
        assert_eq!(body["attendance"]["location"], "MG Road, Bengaluru");

        let req = actix_test::TestRequest::get()
            .uri("/api/attendance")
            .insert_header(bearer(Role::Employee, Some(emp.id)))
            .to_request();
        let open: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(open.as_array().map(Vec::len), Some(1));

        let req = actix_test::TestRequest::post()
            .uri("/api/markAttendance")
            .insert_header(bearer(Role::Employee, Some(emp.id)))
            .set_json(mark(emp.id, "Check-In", "2025-03-10T09:06:00+05:30"))
            .to_request();
        assert_eq!(actix_test::call_service(&app, req).await.status(), 409);

        let req = actix_test::TestRequest::post()
            .uri("/api/markAttendance")
            .insert_header(bearer(Role::Employee, Some(emp.id)))
            .set_json(mark(emp.id, "Check-Out", "2025-03-10T19:30:00+05:30"))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let body: Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["attendance"]["status"], "P");
        assert_eq!(body["attendance"]["hoursWorked"], "10:25:00");
        assert_eq!(body["attendance"]["underTimeHours"], "00:00:00");
    }

    #[actix_web::test]
    async fn check_out_without_check_in_is_a_bad_request() {
        let t = test_state(at(date(2025, 3, 10), 17, 0));
        let emp = seed_employee(&t.store, "E1", &[]).await;
        let shift = seed_shift(&t.store, "Morning", hm(9, 0), hm(17, 0)).await;
        seed_assignment(&t.store, emp.id, &shift, date(2025, 3, 1), date(2025, 3, 31)).await;
        let app = actix_test::init_service(test_app(t.clone())).await;

        let req = actix_test::TestRequest::post()
            .uri("/api/markAttendance")
            .insert_header(bearer(Role::Employee, Some(emp.id)))
            .set_json(mark(emp.id, "Check-Out", "2025-03-10T17:00:00+05:30"))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        let body: Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["error"], "Check-In not found");
    }

    #[actix_web::test]
    async fn employees_cannot_mark_for_someone_else() {
        let t = test_state(at(date(2025, 3, 10), 9, 5));
        let app = actix_test::init_service(test_app(t.clone())).await;

        let req = actix_test::TestRequest::post()
            .uri("/api/markAttendance")
            .insert_header(bearer(Role::Employee, Some(1)))
            .set_json(mark(2, "Check-In", "2025-03-10T09:05:00+05:30"))
            .to_request();
        assert_eq!(actix_test::call_service(&app, req).await.status(), 403);
    }

    #[actix_web::test]
    async fn report_and_monthly_views() {
        let t = test_state(at(date(2025, 3, 10), 23, 55));
        let emp = seed_employee(&t.store, "E1", &[]).await;
        let shift = seed_shift(&t.store, "Morning", hm(9, 0), hm(17, 0)).await;
        seed_assignment(&t.store, emp.id, &shift, date(2025, 3, 1), date(2025, 3, 31)).await;
        t.state
            .attendance
            .absent_sweep(date(2025, 3, 10), at(date(2025, 3, 10), 23, 55))
            .await
            .unwrap();
        let app = actix_test::init_service(test_app(t.clone())).await;

        let req = actix_test::TestRequest::get()
            .uri("/api/attendance/report?date=2025-03-10")
            .insert_header(bearer(Role::Hr, None))
            .to_request();
        let report: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(report[0]["status"], "A");

        let req = actix_test::TestRequest::get()
            .uri("/api/attendance/report?date=2025-03-11")
            .insert_header(bearer(Role::Hr, None))
            .to_request();
        assert_eq!(actix_test::call_service(&app, req).await.status(), 404);

        let req = actix_test::TestRequest::get()
            .uri("/api/monthly-attendance?month=2025-03")
            .insert_header(bearer(Role::Employee, Some(emp.id)))
            .to_request();
        let month: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(month.as_array().map(Vec::len), Some(1));

        let req = actix_test::TestRequest::get()
            .uri("/api/monthly-attendance")
            .insert_header(bearer(Role::Employee, Some(emp.id)))
            .to_request();
        assert_eq!(actix_test::call_service(&app, req).await.status(), 400);

        let req = actix_test::TestRequest::get()
            .uri(&format!("/api/salary/attendance?employee_id={}", emp.id))
            .insert_header(bearer(Role::Hr, None))
            .to_request();
        let rows: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(rows.as_array().map(Vec::len), Some(1));
    }
}
