use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, Duration, NaiveDate};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RunPayroll {
    /// Runs for every active employee when omitted.
    #[schema(example = 1)]
    pub employee_id: Option<u64>,

    /// Defaults to yesterday.
    #[schema(example = "2025-03-10", value_type = Option<String>, format = "date")]
    pub date: Option<NaiveDate>,
}

/// Accrue one day's salary from attendance
#[utoipa::path(
    post,
    path = "/api/payroll/run",
    request_body = RunPayroll,
    responses(
        (status = 201, description = "Salary record appended for one employee", body = crate::model::salary::SalaryRecord),
        (status = 200, description = "Payroll run for every active employee", body = crate::service::SweepReport),
        (status = 403),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn run_payroll(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<RunPayroll>,
) -> Result<impl Responder, AppError> {
    auth.require_hr_or_admin()?;

    let req = payload.into_inner();
    let day = req
        .date
        .unwrap_or_else(|| state.clock.today() - Duration::days(1));

    match req.employee_id {
        Some(employee_id) => {
            let record = state
                .payroll
                .run_for_employee(employee_id, day.month(), day.year(), day.day())
                .await?;
            Ok(HttpResponse::Created().json(record))
        }
        None => {
            let report = state.payroll.run_payroll_sweep(day).await?;
            Ok(HttpResponse::Ok().json(report))
        }
    }
}

/// Monthly totals of the daily salary runs
#[utoipa::path(
    get,
    path = "/api/salary/{employee_id}/{month}/{year}",
    params(
        ("employee_id", description = "Employee ID"),
        ("month", description = "1-12"),
        ("year", description = "Four-digit year")
    ),
    responses(
        (status = 200, body = crate::model::salary::MonthlySalary),
        (status = 400, description = "Month out of range"),
        (status = 404, description = "Salary data not found for the selected month")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn monthly_salary(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<(u64, u32, i32)>,
) -> Result<impl Responder, AppError> {
    let (employee_id, month, year) = path.into_inner();
    auth.require_self_or_hr(employee_id)?;

    let summary = state
        .payroll
        .monthly_summary(employee_id, month, year)
        .await?;
    Ok(HttpResponse::Ok().json(summary))
}

#[cfg(test)]
mod tests {
    use crate::model::attendance::{AttendanceStatus, NewAttendance};
    use crate::model::role::Role;
    use crate::service::assignment::AssignShift;
    use crate::service::reconciler::settle;
    use crate::store::AttendanceLedger;
    use crate::testing::{at, bearer, date, hm, seed_employee, seed_shift, test_app, test_state};
    use actix_web::test;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    #[actix_web::test]
    async fn payroll_run_then_monthly_total() {
        let t = test_state(at(date(2025, 3, 11), 0, 10));
        let emp = seed_employee(&t.store, "E1", &[]).await;
        let shift = seed_shift(&t.store, "Day", hm(9, 0), hm(18, 0)).await;
        let assignment = t
            .state
            .assignments
            .validate_and_assign(&AssignShift {
                employee_id: emp.id,
                shift_id: shift.id,
                shift_name: None,
                from_date: date(2025, 3, 1),
                to_date: date(2025, 3, 31),
                description: None,
            })
            .await
            .unwrap();

        // 09:00 to 20:00 on a nine-hour shift: two hours over
        let day = date(2025, 3, 10);
        let rec = t
            .store
            .insert_attendance(&NewAttendance {
                employee_id: emp.id,
                name: "E1 Tester".into(),
                date: day,
                shift_id: shift.id,
                shift_name: "Day".into(),
                check_in_time: Some(at(day, 9, 0)),
                location: "MG Road, Bengaluru".into(),
                status: AttendanceStatus::CheckedIn,
            })
            .await
            .unwrap();
        let update = settle(at(day, 9, 0), at(day, 20, 0), assignment.shift_length());
        t.store.complete_checkout(rec.id, &update).await.unwrap();

        let app = test::init_service(test_app(t.clone())).await;

        let req = test::TestRequest::post()
            .uri("/api/payroll/run")
            .insert_header(bearer(Role::Hr, None))
            .set_json(json!({"employeeId": emp.id}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
        let record: Value = test::read_body_json(resp).await;
        assert_eq!(record["grossSalary"], 1222.22);
        assert_eq!(record["day"], 10);

        let req = test::TestRequest::get()
            .uri(&format!("/api/salary/{}/3/2025", emp.id))
            .insert_header(bearer(Role::Employee, Some(emp.id)))
            .to_request();
        let summary: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(summary["days"], 1);
        assert_eq!(summary["grossSalary"], 1222.22);
    }

    #[actix_web::test]
    async fn sweep_without_employee_reports_counts() {
        let t = test_state(at(date(2025, 3, 11), 0, 10));
        seed_employee(&t.store, "E1", &[]).await;
        seed_employee(&t.store, "E2", &[]).await;
        let app = test::init_service(test_app(t.clone())).await;

        let req = test::TestRequest::post()
            .uri("/api/payroll/run")
            .insert_header(bearer(Role::Admin, None))
            .set_json(json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let report: Value = test::read_body_json(resp).await;
        assert_eq!(report, json!({"examined": 2, "changed": 2, "failed": 0}));
    }

    #[actix_web::test]
    async fn missing_month_is_not_found_and_others_are_forbidden() {
        let t = test_state(at(date(2025, 3, 11), 0, 10));
        let emp = seed_employee(&t.store, "E1", &[]).await;
        let app = test::init_service(test_app(t.clone())).await;

        let req = test::TestRequest::get()
            .uri(&format!("/api/salary/{}/2/2025", emp.id))
            .insert_header(bearer(Role::Hr, None))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);

        let req = test::TestRequest::get()
            .uri(&format!("/api/salary/{}/2/2025", emp.id))
            .insert_header(bearer(Role::Employee, Some(emp.id + 1)))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 403);

        let req = test::TestRequest::get()
            .uri(&format!("/api/salary/{}/13/2025", emp.id))
            .insert_header(bearer(Role::Hr, None))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);
    }
}
