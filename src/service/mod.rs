pub mod assignment;
pub mod face;
pub mod geocode;
pub mod payroll;
pub mod reconciler;

use serde::Serialize;
use utoipa::ToSchema;

/// Outcome of one batch pass. Per-entity failures are counted, not raised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub examined: usize,
    pub changed: usize,
    pub failed: usize,
}
