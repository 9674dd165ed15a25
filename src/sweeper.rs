//! Time-driven batch passes. Each run first claims a `(sweep, slot)` row so
//! an interval executes at most once no matter how many workers tick.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter};

use crate::clock::Clock;
use crate::error::AppError;
use crate::service::{
    SweepReport, assignment::ShiftAssignments, payroll::PayrollEngine,
    reconciler::AttendanceReconciler,
};
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, EnumIter)]
pub enum SweepKind {
    #[strum(serialize = "auto-checkout")]
    AutoCheckout,
    #[strum(serialize = "absent")]
    Absent,
    #[strum(serialize = "payroll")]
    Payroll,
    #[strum(serialize = "expire-assignments")]
    ExpireAssignments,
}

/// How long claimed slots are remembered before the daily prune drops them.
const CLAIM_RETENTION_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy)]
pub struct Schedule {
    pub tick: Duration,
    pub absent_at: NaiveTime,
    pub payroll_at: NaiveTime,
}

impl SweepKind {
    /// The interval a run at `now` belongs to. Absence and payroll cover the
    /// previous day.
    pub fn slot(self, now: NaiveDateTime) -> String {
        match self {
            SweepKind::AutoCheckout => now.format("%Y-%m-%dT%H:%M").to_string(),
            SweepKind::ExpireAssignments => now.date().to_string(),
            SweepKind::Absent | SweepKind::Payroll => previous_day(now).to_string(),
        }
    }

    fn is_due(self, schedule: &Schedule, now: NaiveDateTime) -> bool {
        match self {
            SweepKind::AutoCheckout | SweepKind::ExpireAssignments => true,
            SweepKind::Absent => now.time() >= schedule.absent_at,
            SweepKind::Payroll => now.time() >= schedule.payroll_at,
        }
    }
}

fn previous_day(now: NaiveDateTime) -> NaiveDate {
    now.date().pred_opt().unwrap_or(now.date())
}

pub struct Sweeper {
    store: Arc<dyn Store>,
    attendance: Arc<AttendanceReconciler>,
    payroll: Arc<PayrollEngine>,
    assignments: Arc<ShiftAssignments>,
    clock: Arc<dyn Clock>,
    schedule: Schedule,
}

impl Sweeper {
    pub fn new(
        store: Arc<dyn Store>,
        attendance: Arc<AttendanceReconciler>,
        payroll: Arc<PayrollEngine>,
        assignments: Arc<ShiftAssignments>,
        clock: Arc<dyn Clock>,
        schedule: Schedule,
    ) -> Self {
        Self {
            store,
            attendance,
            payroll,
            assignments,
            clock,
            schedule,
        }
    }

    /// Runs `kind` for the slot containing `now` unless another worker
    /// already claimed it. Returns `None` when the slot was taken.
    pub async fn run_once(
        &self,
        kind: SweepKind,
        now: NaiveDateTime,
    ) -> Result<Option<SweepReport>, AppError> {
        let slot = kind.slot(now);
        if !self.store.claim(kind.as_ref(), &slot, now).await? {
            tracing::trace!(sweep = %kind, %slot, "Slot already claimed");
            return Ok(None);
        }

        let report = match kind {
            SweepKind::AutoCheckout => self.attendance.auto_checkout_sweep(now).await?,
            SweepKind::Absent => {
                self.attendance
                    .absent_sweep(previous_day(now), now)
                    .await?
            }
            SweepKind::Payroll => self.payroll.run_payroll_sweep(previous_day(now)).await?,
            SweepKind::ExpireAssignments => {
                let removed = self.assignments.expire_assignments(now.date()).await?;
                let cutoff = now - chrono::Duration::days(CLAIM_RETENTION_DAYS);
                let pruned = self.store.prune_claims_before(cutoff).await?;
                tracing::debug!(pruned, %cutoff, "Old sweep claims pruned");
                SweepReport {
                    examined: removed as usize,
                    changed: removed as usize,
                    failed: 0,
                }
            }
        };

        tracing::debug!(sweep = %kind, %slot, ?report, "Sweep ran");
        Ok(Some(report))
    }

    pub async fn tick(&self, now: NaiveDateTime) {
        for kind in SweepKind::iter() {
            if !kind.is_due(&self.schedule, now) {
                continue;
            }
            if let Err(e) = self.run_once(kind, now).await {
                tracing::error!(sweep = %kind, error = %e, "Sweep failed");
            }
        }
    }

    pub fn spawn(self: Arc<Self>) {
        actix_web::rt::spawn(async move {
            let mut interval = actix_web::rt::time::interval(self.schedule.tick);
            loop {
                interval.tick().await;
                self.tick(self.clock.now()).await;
            }
        });
    }
}
