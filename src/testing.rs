//! Fixtures shared by unit and handler tests.

use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::middleware::from_fn;
use actix_web::web::{self, Data};
use actix_web::App;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use jsonwebtoken::{EncodingKey, Header, encode};

use crate::auth::middleware::auth_middleware;
use crate::clock::FixedClock;
use crate::config::Config;
use crate::model::{
    employee::{Employee, NewEmployee, WeekoffSchedule},
    role::Role,
    shift::{NewAssignment, NewShift, Shift, ShiftAssignment},
};
use crate::models::{Claims, TokenType};
use crate::service::{
    assignment::ShiftAssignments, face::FixedFaceMatcher, geocode::fake::FakeGeocoder,
    payroll::PayrollEngine, reconciler::AttendanceReconciler,
};
use crate::routes;
use crate::state::AppState;
use crate::store::memory::MemoryStore;
use crate::store::{EmployeeDirectory, ShiftCatalog};

pub const TEST_SECRET: &str = "test-secret";

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(day: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
    day.and_hms_opt(h, m, 0).unwrap()
}

pub fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// Salary 30000 over 30 working days.
pub async fn seed_employee(store: &MemoryStore, code: &str, weekoff: &[Weekday]) -> Employee {
    store
        .create_employee(&NewEmployee {
            employee_code: code.to_string(),
            first_name: code.to_string(),
            last_name: "Tester".to_string(),
            email: format!("{}@example.com", code.to_lowercase()),
            profile_pic: Some(format!("https://cdn.example.com/{code}.jpg")),
            salary: 30000.0,
            total_working_days: Some(30),
            weekoff_schedule: WeekoffSchedule::new(weekoff.iter().copied()),
        })
        .await
        .unwrap()
}

pub async fn seed_shift(store: &MemoryStore, name: &str, start: NaiveTime, end: NaiveTime) -> Shift {
    store
        .create_shift(&NewShift {
            shift_name: name.to_string(),
            shift_start: start,
            shift_end: end,
            description: None,
        })
        .await
        .unwrap()
}

/// Inserts directly, skipping the overlap check.
pub async fn seed_assignment(
    store: &MemoryStore,
    employee_id: u64,
    shift: &Shift,
    from: NaiveDate,
    to: NaiveDate,
) -> ShiftAssignment {
    store
        .insert_assignment(&NewAssignment {
            employee_id,
            shift_id: shift.id,
            shift_name: shift.shift_name.clone(),
            shift_start: shift.shift_start,
            shift_end: shift.shift_end,
            from_date: from,
            to_date: to,
            assigned_at: at(from, 0, 0),
            description: None,
        })
        .await
        .unwrap()
}

pub fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some("mysql://unused".to_string()),
        "JWT_SECRET" => Some(TEST_SECRET.to_string()),
        _ => None,
    })
    .unwrap()
}

pub fn token(role: Role, employee_id: Option<u64>) -> String {
    let claims = Claims {
        user_id: 1,
        sub: "tester".to_string(),
        role: role as u8,
        exp: 4_102_444_800, // 2100-01-01
        jti: "test".to_string(),
        token_type: TokenType::Access,
        employee_id,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn bearer(role: Role, employee_id: Option<u64>) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token(role, employee_id)))
}

#[derive(Clone)]
pub struct TestState {
    pub store: Arc<MemoryStore>,
    pub state: Data<AppState>,
    pub config: Data<Config>,
}

/// Wires every service over one in-memory store with the clock pinned to
/// `now`.
pub fn test_state(now: NaiveDateTime) -> TestState {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::new(now));
    let geocoder = Arc::new(FakeGeocoder::answering("MG Road, Bengaluru"));

    let state = AppState {
        store: store.clone(),
        assignments: Arc::new(ShiftAssignments::new(store.clone(), clock.clone())),
        attendance: Arc::new(AttendanceReconciler::new(store.clone(), geocoder)),
        payroll: Arc::new(PayrollEngine::new(store.clone(), clock.clone(), 2)),
        face: Arc::new(FixedFaceMatcher(true)),
        clock,
    };

    TestState {
        store,
        state: Data::new(state),
        config: Data::new(test_config()),
    }
}

/// The `/api` scope with authentication but without rate limiting; test
/// requests carry no peer address to key a limiter on. Takes the state by
/// value so the returned factory borrows nothing.
pub fn test_app(
    t: TestState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(t.state)
        .app_data(t.config)
        .service(
            web::scope("/api")
                .wrap(from_fn(auth_middleware))
                .service(routes::mark_attendance_resource())
                .configure(routes::api_routes),
        )
}
