use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyFace {
    #[schema(example = 1)]
    pub employee_id: u64,
    #[schema(example = "https://cdn.example.com/captures/1.jpg")]
    pub captured_image_url: String,
}

/// Compare a captured image with the employee's profile picture
#[utoipa::path(
    post,
    path = "/api/verify-face",
    request_body = VerifyFace,
    responses(
        (status = 200, description = "Face matched", body = Object, example = json!({"message": "Face matched"})),
        (status = 400, description = "Captured image missing"),
        (status = 403, description = "Face not recognized. Access denied."),
        (status = 404, description = "Employee or profile image not found"),
        (status = 502, description = "Face matching service unavailable")
    ),
    security(("bearer_auth" = [])),
    tag = "Face"
)]
pub async fn verify_face(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<VerifyFace>,
) -> Result<impl Responder, AppError> {
    auth.require_self_or_hr(payload.employee_id)?;

    if payload.captured_image_url.trim().is_empty() {
        return Err(AppError::validation("capturedImageUrl is required"));
    }

    let employee = state
        .store
        .employee(payload.employee_id)
        .await?
        .ok_or_else(|| AppError::not_found("Employee not found"))?;
    let profile = employee
        .profile_pic
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| AppError::not_found("Profile image not found"))?;

    if state
        .face
        .matches(profile, &payload.captured_image_url)
        .await?
    {
        Ok(HttpResponse::Ok().json(json!({"message": "Face matched"})))
    } else {
        tracing::info!(employee_id = payload.employee_id, "Face verification failed");
        Err(AppError::Forbidden(
            "Face not recognized. Access denied.".to_string(),
        ))
    }
}
