use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::employee::{Employee, EmployeeUpdate, INACTIVE, NewEmployee, WeekoffSchedule};
use crate::state::AppState;

async fn find_employee(state: &AppState, employee_id: u64) -> Result<Employee, AppError> {
    state
        .store
        .employee(employee_id)
        .await?
        .ok_or_else(|| AppError::not_found("Employee not found"))
}

fn validate_email(email: &str) -> Result<(), AppError> {
    if !email.contains('@') {
        return Err(AppError::validation("email is not valid"));
    }
    Ok(())
}

fn validate_salary(salary: f64) -> Result<(), AppError> {
    if !salary.is_finite() || salary < 0.0 {
        return Err(AppError::validation("salary must be zero or more"));
    }
    Ok(())
}

fn validate_new_employee(new: &NewEmployee) -> Result<(), AppError> {
    let required = [
        ("employeeCode", &new.employee_code),
        ("firstName", &new.first_name),
        ("email", &new.email),
    ];
    if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
        return Err(AppError::validation(format!("{field} is required")));
    }
    validate_email(&new.email)?;
    validate_salary(new.salary)
}

fn validate_update(update: &EmployeeUpdate) -> Result<(), AppError> {
    if update.is_empty() {
        return Err(AppError::validation("Nothing to update"));
    }
    let required = [("firstName", &update.first_name), ("email", &update.email)];
    if let Some((field, _)) = required
        .iter()
        .find(|(_, v)| v.as_deref().is_some_and(|v| v.trim().is_empty()))
    {
        return Err(AppError::validation(format!("{field} must not be blank")));
    }
    if let Some(email) = &update.email {
        validate_email(email)?;
    }
    if let Some(salary) = update.salary {
        validate_salary(salary)?;
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = NewEmployee,
    responses(
        (status = 201, description = "Employee created", body = Employee),
        (status = 400, description = "Missing or invalid fields"),
        (status = 409, description = "Employee code or email already used")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn create_employee(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<NewEmployee>,
) -> Result<impl Responder, AppError> {
    auth.require_hr_or_admin()?;

    let new = payload.into_inner();
    validate_new_employee(&new)?;

    let employee = state.store.create_employee(&new).await?;
    info!(employee_id = employee.id, code = %employee.employee_code, "Employee created");
    Ok(HttpResponse::Created().json(employee))
}

#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}",
    params(("employee_id", description = "Employee ID")),
    responses(
        (status = 200, body = Employee),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn get_employee(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> Result<impl Responder, AppError> {
    let employee_id = path.into_inner();
    auth.require_self_or_hr(employee_id)?;

    let employee = find_employee(&state, employee_id).await?;
    Ok(HttpResponse::Ok().json(employee))
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    /// Also list deactivated employees
    #[param(example = false)]
    pub include_inactive: Option<bool>,
}

/// The employee directory, ordered by id
#[utoipa::path(
    get,
    path = "/api/employees",
    params(ListQuery),
    responses(
        (status = 200, body = [Employee]),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn list_employees(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> Result<impl Responder, AppError> {
    auth.require_hr_or_admin()?;

    let employees: Vec<Employee> = if query.include_inactive.unwrap_or(false) {
        state.store.all_employees().await?
    } else {
        state.store.employees().await?
    };
    Ok(HttpResponse::Ok().json(employees))
}

/// Change profile fields; omitted fields keep their value
#[utoipa::path(
    put,
    path = "/api/employees/{employee_id}",
    params(("employee_id", description = "Employee ID")),
    request_body = EmployeeUpdate,
    responses(
        (status = 200, description = "Employee updated", body = Employee),
        (status = 400, description = "No fields given or a field is invalid"),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Email already used")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn update_employee(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<EmployeeUpdate>,
) -> Result<impl Responder, AppError> {
    auth.require_hr_or_admin()?;
    let employee_id = path.into_inner();

    let update = payload.into_inner();
    validate_update(&update)?;
    find_employee(&state, employee_id).await?;

    state.store.update_employee(employee_id, &update).await?;
    let employee = find_employee(&state, employee_id).await?;
    info!(employee_id, "Employee updated");
    Ok(HttpResponse::Ok().json(employee))
}

/// Deactivate an employee. Records are kept; sweeps skip the employee.
#[utoipa::path(
    delete,
    path = "/api/employees/{employee_id}",
    params(("employee_id", description = "Employee ID")),
    responses(
        (status = 200, description = "Employee deactivated", body = Employee),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn deactivate_employee(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> Result<impl Responder, AppError> {
    auth.require_hr_or_admin()?;
    let employee_id = path.into_inner();

    let mut employee = find_employee(&state, employee_id).await?;
    state
        .store
        .set_employee_status(employee_id, INACTIVE)
        .await?;
    employee.status = INACTIVE.to_string();

    info!(employee_id, "Employee deactivated");
    Ok(HttpResponse::Ok().json(employee))
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeekoffUpdate {
    #[schema(value_type = Vec<String>, example = json!(["Saturday", "Sunday"]))]
    pub weekoff_schedule: WeekoffSchedule,
}

#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}/weekoff",
    params(("employee_id", description = "Employee ID")),
    responses(
        (status = 200, body = WeekoffUpdate),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn get_weekoff(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> Result<impl Responder, AppError> {
    let employee_id = path.into_inner();
    auth.require_self_or_hr(employee_id)?;

    let employee = find_employee(&state, employee_id).await?;
    Ok(HttpResponse::Ok().json(WeekoffUpdate {
        weekoff_schedule: employee.weekoff_schedule,
    }))
}

/// Replace the weekdays an employee is scheduled off
#[utoipa::path(
    put,
    path = "/api/employees/{employee_id}/weekoff",
    params(("employee_id", description = "Employee ID")),
    request_body = WeekoffUpdate,
    responses(
        (status = 200, description = "Week-off schedule updated", body = Object, example = json!({
            "message": "Week-off schedule updated",
            "weekoffSchedule": ["Saturday", "Sunday"]
        })),
        (status = 400, description = "Unknown day name"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn update_weekoff(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<WeekoffUpdate>,
) -> Result<impl Responder, AppError> {
    auth.require_hr_or_admin()?;
    let employee_id = path.into_inner();

    find_employee(&state, employee_id).await?;

    let schedule = payload.into_inner().weekoff_schedule;
    state
        .store
        .set_weekoff_schedule(employee_id, &schedule)
        .await?;

    info!(employee_id, %schedule, "Week-off schedule updated");
    Ok(HttpResponse::Ok().json(json!({
        "message": "Week-off schedule updated",
        "weekoffSchedule": schedule
    })))
}
