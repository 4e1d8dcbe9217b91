use std::collections::BTreeMap;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::MySqlPool;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::engine::error::EngineError;
use crate::engine::lock::{self, LockPolicy};
use crate::engine::store::TimeStore;
use crate::model::overtime_pto::EmployeeOvertimePto;
use crate::model::timesheet::TimesheetDetail;
use crate::utils::date_range::previous_biweekly_window;

/// Hours per day before overtime starts.
pub const STANDARD_DAY_HOURS: f64 = 8.0;
/// Overtime hours converted into one PTO day.
pub const HOURS_PER_PTO_DAY: f64 = 16.0;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AccrualOutcome {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "2024-01-01", format = "date", value_type = String)]
    pub period_start: NaiveDate,
    #[schema(example = "2024-01-14", format = "date", value_type = String)]
    pub period_end: NaiveDate,
    /// Overtime found in the period.
    #[schema(example = 20.0)]
    pub overtime_delta: f64,
    /// PTO days granted by this run.
    #[schema(example = 1)]
    pub pto_granted_now: u32,
    pub ledger: EmployeeOvertimePto,
}

/// Absorbs float noise when the ledger lands on a 16-hour boundary.
const LEDGER_EPSILON: f64 = 1e-9;

/// Sum of `max(0, hours - 8)` per calendar day. Hours on the same day are combined first.
/// Not rounded: sub-cent overtime must reach the ledger.
pub fn overtime_delta(details: &[TimesheetDetail]) -> f64 {
    let mut per_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for d in details {
        *per_day.entry(d.work_date).or_default() += d.hours_worked;
    }
    per_day
        .values()
        .map(|hours| (hours - STANDARD_DAY_HOURS).max(0.0))
        .sum()
}

/// Adds `delta` to the ledger and converts every whole 16 hours into a PTO day.
/// Returns the number of days granted by this call. The remainder is carried at
/// full precision.
pub fn accrue(ledger: &mut EmployeeOvertimePto, delta: f64, now: DateTime<Utc>) -> u32 {
    let pending = ledger.overtime_hours + delta;
    let granted = ((pending + LEDGER_EPSILON) / HOURS_PER_PTO_DAY).floor() as u32;
    ledger.pto_granted += granted;
    let remainder = pending - HOURS_PER_PTO_DAY * granted as f64;
    ledger.overtime_hours = if remainder.abs() < LEDGER_EPSILON {
        0.0
    } else {
        remainder.max(0.0)
    };
    ledger.last_calculated = now;
    granted
}

/// Accrue overtime from every detail row of the employee in `[period_start, period_end]`.
///
/// Runs under the employee lock so the ledger is serialized with timesheet writes.
/// Not idempotent: running the same period twice counts its overtime twice.
pub async fn process_period<S>(
    store: &mut S,
    employee_id: u64,
    period_start: NaiveDate,
    period_end: NaiveDate,
    policy: &LockPolicy,
) -> Result<AccrualOutcome, EngineError>
where
    S: TimeStore + ?Sized,
{
    if period_start > period_end {
        return Err(EngineError::invalid("period_start cannot be after period_end"));
    }

    let employee = lock::acquire(store, employee_id, policy).await?;

    let details = store
        .worked_hours_between(employee.id(), period_start, period_end)
        .await?;
    let delta = overtime_delta(&details);

    let now = Utc::now();
    let (mut ledger, is_new) = match store.find_overtime_ledger(employee.id()).await? {
        Some(ledger) => (ledger, false),
        None => (EmployeeOvertimePto::empty(employee.id(), now), true),
    };

    let granted = accrue(&mut ledger, delta, now);

    if is_new {
        store.insert_overtime_ledger(&ledger).await?;
    } else {
        store.update_overtime_ledger(&ledger).await?;
    }

    info!(
        employee_id,
        %period_start,
        %period_end,
        overtime_delta = delta,
        granted,
        carried = ledger.overtime_hours,
        "Overtime accrued"
    );

    Ok(AccrualOutcome {
        employee_id,
        period_start,
        period_end,
        overtime_delta: delta,
        pto_granted_now: granted,
        ledger,
    })
}

/// Process the last completed two-week window before `today`'s week.
pub async fn process_most_recent_biweekly_period<S>(
    store: &mut S,
    employee_id: u64,
    today: NaiveDate,
    policy: &LockPolicy,
) -> Result<AccrualOutcome, EngineError>
where
    S: TimeStore + ?Sized,
{
    let (period_start, period_end) = previous_biweekly_window(today);
    process_period(store, employee_id, period_start, period_end, policy).await
}

#[derive(Debug, Default, Serialize, ToSchema)]
pub struct AccrualRunSummary {
    pub processed: u32,
    pub failed: u32,
    pub pto_granted: u32,
}

/// Batch run over every active employee, one transaction each.
/// A failing employee is logged and skipped.
pub async fn run_for_active_employees(
    pool: &MySqlPool,
    today: NaiveDate,
    policy: &LockPolicy,
) -> anyhow::Result<AccrualRunSummary> {
    let employee_ids = sqlx::query_scalar::<_, u64>("SELECT id FROM employees WHERE status = 'active' ORDER BY id")
        .fetch_all(pool)
        .await
        .context("Failed to list active employees")?;

    let mut summary = AccrualRunSummary::default();
    for employee_id in employee_ids {
        let mut tx = pool.begin().await.context("Failed to open transaction")?;
        match process_most_recent_biweekly_period(&mut tx, employee_id, today, policy).await {
            Ok(outcome) => {
                tx.commit().await.context("Failed to commit overtime accrual")?;
                summary.processed += 1;
                summary.pto_granted += outcome.pto_granted_now;
            }
            Err(e) => {
                error!(employee_id, error = %e, "Overtime accrual failed");
                summary.failed += 1;
            }
        }
    }

    info!(
        processed = summary.processed,
        failed = summary.failed,
        pto_granted = summary.pto_granted,
        "Biweekly overtime run complete"
    );
    Ok(summary)
}
