use crate::{
    api::{attendance, employee, face, payroll, shift},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{Resource, middleware::from_fn, web};
use anyhow::anyhow;
use std::sync::Arc;

pub type Limiter = Governor<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-peer-IP limiter allowing `requests_per_min` with an equal burst.
pub fn build_limiter(requests_per_min: u32) -> anyhow::Result<Limiter> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit of {requests_per_min}/min"))?;
    Ok(Governor::new(&cfg))
}

/// Built once at startup so every worker shares the same buckets.
#[derive(Clone)]
pub struct Limiters {
    pub protected: Arc<Limiter>,
    pub attendance: Arc<Limiter>,
}

impl Limiters {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            protected: Arc::new(build_limiter(config.rate_protected_per_min)?),
            attendance: Arc::new(build_limiter(config.rate_attendance_per_min)?),
        })
    }
}

pub fn mark_attendance_resource() -> Resource {
    web::resource("/markAttendance").route(web::post().to(attendance::mark_attendance))
}

/// Every protected endpoint except `/markAttendance`, which carries its own
/// limiter.
pub fn api_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // shifts
        .service(
            web::resource("/shifts")
                .route(web::post().to(shift::create_shift))
                .route(web::get().to(shift::list_shifts)),
        )
        .route("/assign-shift", web::post().to(shift::assign_shift))
        .route("/shift-assignments", web::get().to(shift::list_assignments))
        .route(
            "/employee-shift/{employee_id}",
            web::get().to(shift::employee_shifts),
        )
        .route("/shift-status", web::get().to(shift::shift_status))
        // attendance
        .route("/attendance", web::get().to(attendance::open_attendance))
        .route(
            "/attendance/report",
            web::get().to(attendance::attendance_report),
        )
        .route(
            "/weekly-attendance",
            web::get().to(attendance::weekly_attendance),
        )
        .route(
            "/monthly-attendance",
            web::get().to(attendance::monthly_attendance),
        )
        // payroll
        .route("/payroll/run", web::post().to(payroll::run_payroll))
        .route(
            "/salary/attendance",
            web::get().to(attendance::salary_attendance),
        )
        .route(
            "/salary/{employee_id}/{month}/{year}",
            web::get().to(payroll::monthly_salary),
        )
        // employees
        .service(
            web::resource("/employees")
                .route(web::post().to(employee::create_employee))
                .route(web::get().to(employee::list_employees)),
        )
        .service(
            web::resource("/employees/{employee_id}")
                .route(web::get().to(employee::get_employee))
                .route(web::put().to(employee::update_employee))
                .route(web::delete().to(employee::deactivate_employee)),
        )
        .service(
            web::resource("/employees/{employee_id}/weekoff")
                .route(web::get().to(employee::get_weekoff))
                .route(web::put().to(employee::update_weekoff)),
        )
        // face
        .route("/verify-face", web::post().to(face::verify_face));
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limiters: &Limiters) {
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(limiters.protected.clone()) // rate limiting
            .service(mark_attendance_resource().wrap(limiters.attendance.clone()))
            .configure(api_routes),
    );
}
