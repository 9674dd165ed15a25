use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use utoipa::IntoParams;

use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::shift::NewShift;
use crate::service::assignment::AssignShift;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api/shifts",
    request_body = NewShift,
    responses(
        (status = 201, description = "Shift created", body = crate::model::shift::Shift),
        (status = 400, description = "Blank name or start not before end"),
        (status = 401),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Shift"
)]
pub async fn create_shift(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<NewShift>,
) -> Result<impl Responder, AppError> {
    auth.require_hr_or_admin()?;

    let shift = state.assignments.create_shift(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(shift))
}

#[utoipa::path(
    get,
    path = "/api/shifts",
    responses((status = 200, body = [crate::model::shift::Shift])),
    security(("bearer_auth" = [])),
    tag = "Shift"
)]
pub async fn list_shifts(
    _auth: AuthUser,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let shifts = state.store.shifts().await?;
    Ok(HttpResponse::Ok().json(shifts))
}

/// Assign a shift to an employee for a date range
#[utoipa::path(
    post,
    path = "/api/assign-shift",
    request_body = AssignShift,
    responses(
        (status = 201, description = "Shift assigned", body = crate::model::shift::ShiftAssignment),
        (status = 400, description = "Invalid range or overlapping assignment", body = Object, example = json!({
            "error": "Shift Morning is already assigned to this employee from 2025-01-01 to 2025-01-10"
        })),
        (status = 404, description = "Employee or shift not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Shift"
)]
#[instrument(skip_all, fields(employee_id = payload.employee_id, shift_id = payload.shift_id))]
pub async fn assign_shift(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<AssignShift>,
) -> Result<impl Responder, AppError> {
    auth.require_hr_or_admin()?;

    let assignment = state.assignments.validate_and_assign(&payload).await?;
    Ok(HttpResponse::Created().json(json!({
        "message": "Shift assigned successfully",
        "assignment": assignment
    })))
}

#[utoipa::path(
    get,
    path = "/api/shift-assignments",
    responses((status = 200, body = [crate::model::shift::ShiftAssignment]), (status = 403)),
    security(("bearer_auth" = [])),
    tag = "Shift"
)]
pub async fn list_assignments(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    auth.require_hr_or_admin()?;

    let assignments = state.store.all_assignments().await?;
    Ok(HttpResponse::Ok().json(assignments))
}

#[utoipa::path(
    get,
    path = "/api/employee-shift/{employee_id}",
    params(("employee_id", description = "Employee ID")),
    responses(
        (status = 200, body = [crate::model::shift::ShiftAssignment]),
        (status = 404, description = "No shifts assigned")
    ),
    security(("bearer_auth" = [])),
    tag = "Shift"
)]
pub async fn employee_shifts(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> Result<impl Responder, AppError> {
    let employee_id = path.into_inner();
    auth.require_self_or_hr(employee_id)?;

    let assignments = state.store.assignments_for(employee_id).await?;
    if assignments.is_empty() {
        return Err(AppError::not_found("No shifts assigned to this employee"));
    }
    Ok(HttpResponse::Ok().json(assignments))
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ShiftStatusQuery {
    /// Defaults to the caller. HR/admin only for other employees.
    pub employee_id: Option<u64>,
}

/// The shift running now, or the next one today
#[utoipa::path(
    get,
    path = "/api/shift-status",
    params(ShiftStatusQuery),
    responses(
        (status = 200, body = crate::service::reconciler::ShiftStatus),
        (status = 404, description = "No ongoing or upcoming shifts")
    ),
    security(("bearer_auth" = [])),
    tag = "Shift"
)]
pub async fn shift_status(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<ShiftStatusQuery>,
) -> Result<impl Responder, AppError> {
    let employee_id = match query.employee_id {
        Some(id) => id,
        None => auth.employee_id()?,
    };
    auth.require_self_or_hr(employee_id)?;

    let status = state
        .attendance
        .current_shift_status(employee_id, state.clock.now())
        .await?;
    Ok(HttpResponse::Ok().json(status))
}
