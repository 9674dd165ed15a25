use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::clock::Clock;
use crate::error::AppError;
use crate::model::{
    employee::CurrentShift,
    shift::{NewAssignment, NewShift, Shift, ShiftAssignment},
};
use crate::store::Store;

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignShift {
    #[schema(example = 1)]
    pub employee_id: u64,

    #[schema(example = 3)]
    pub shift_id: u64,

    /// Defaults to the shift definition's name.
    #[schema(example = "Morning")]
    pub shift_name: Option<String>,

    #[schema(example = "2025-01-01", value_type = String, format = "date")]
    pub from_date: NaiveDate,

    #[schema(example = "2025-01-31", value_type = String, format = "date")]
    pub to_date: NaiveDate,

    pub description: Option<String>,
}

/// Shift definitions and the overlap-checked assignment of employees to them.
pub struct ShiftAssignments {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

impl ShiftAssignments {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn create_shift(&self, new: NewShift) -> Result<Shift, AppError> {
        if new.shift_name.trim().is_empty() {
            return Err(AppError::validation("Shift name is required"));
        }
        if new.shift_start >= new.shift_end {
            return Err(AppError::validation(
                "Shift start must be before shift end",
            ));
        }

        let shift = self.store.create_shift(&new).await?;
        tracing::info!(shift_id = shift.id, shift_name = %shift.shift_name, "Shift created");
        Ok(shift)
    }

    pub async fn validate_and_assign(&self, req: &AssignShift) -> Result<ShiftAssignment, AppError> {
        self.store
            .employee(req.employee_id)
            .await?
            .ok_or_else(|| AppError::not_found("Employee not found"))?;

        let shift = self
            .store
            .shift(req.shift_id)
            .await?
            .ok_or_else(|| AppError::not_found("Shift not found"))?;

        let shift_name = match &req.shift_name {
            Some(name) if name.trim().is_empty() => {
                return Err(AppError::validation("Shift name must not be blank"));
            }
            Some(name) => name.trim().to_string(),
            None => shift.shift_name.clone(),
        };

        if req.to_date < req.from_date {
            return Err(AppError::validation(
                "toDate must not be earlier than fromDate",
            ));
        }

        if let Some(existing) = self
            .store
            .find_overlapping(
                req.employee_id,
                req.shift_id,
                &shift_name,
                req.from_date,
                req.to_date,
            )
            .await?
        {
            tracing::debug!(
                employee_id = req.employee_id,
                existing_id = existing.id,
                "Rejected overlapping assignment"
            );
            return Err(AppError::Overlap(format!(
                "Shift {} is already assigned to this employee from {} to {}",
                existing.shift_name, existing.from_date, existing.to_date
            )));
        }

        // snapshot first: a failure here leaves no assignment behind
        self.store
            .set_current_shift(
                req.employee_id,
                &CurrentShift {
                    shift_name: shift_name.clone(),
                    shift_start: shift.shift_start,
                    shift_end: shift.shift_end,
                },
            )
            .await?;

        let assignment = self
            .store
            .insert_assignment(&NewAssignment {
                employee_id: req.employee_id,
                shift_id: shift.id,
                shift_name,
                shift_start: shift.shift_start,
                shift_end: shift.shift_end,
                from_date: req.from_date,
                to_date: req.to_date,
                assigned_at: self.clock.now(),
                description: req.description.clone(),
            })
            .await
            .inspect_err(|e| {
                tracing::error!(
                    error = %e,
                    employee_id = req.employee_id,
                    shift_id = shift.id,
                    "Current shift updated but the assignment was not stored"
                );
            })?;

        tracing::info!(
            employee_id = assignment.employee_id,
            shift_id = assignment.shift_id,
            from = %assignment.from_date,
            to = %assignment.to_date,
            "Shift assigned"
        );
        Ok(assignment)
    }

    /// Deletes assignments whose window ended before `today`.
    pub async fn expire_assignments(&self, today: NaiveDate) -> Result<u64, AppError> {
        let removed = self.store.delete_assignments_ended_before(today).await?;
        if removed > 0 {
            tracing::info!(removed, %today, "Expired shift assignments removed");
        }
        Ok(removed)
    }
}
