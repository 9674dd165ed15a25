use std::sync::Arc;

use crate::clock::Clock;
use crate::service::{
    assignment::ShiftAssignments, face::FaceMatcher, payroll::PayrollEngine,
    reconciler::AttendanceReconciler,
};
use crate::store::Store;

/// Shared by every worker through `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub assignments: Arc<ShiftAssignments>,
    pub attendance: Arc<AttendanceReconciler>,
    pub payroll: Arc<PayrollEngine>,
    pub face: Arc<dyn FaceMatcher>,
    pub clock: Arc<dyn Clock>,
}
