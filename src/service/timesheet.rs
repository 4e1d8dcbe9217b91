use chrono::NaiveDate;
use tracing::info;

use crate::engine::aggregator;
use crate::engine::conflict::{assert_no_leave_conflict, assert_no_leave_conflict_in_range};
use crate::engine::error::EngineError;
use crate::engine::lock::{self, LockPolicy, LockedEmployee};
use crate::engine::store::TimeStore;
use crate::model::status::TimesheetStatus;
use crate::model::timesheet::{Timesheet, TimesheetWithDetails};
use crate::utils::date_range::{is_weekday, week_bounds};

pub const MAX_HOURS_PER_DAY: f64 = 24.0;

#[derive(Debug, Clone, Copy)]
pub struct DailyEntry {
    pub work_date: NaiveDate,
    pub hours_worked: f64,
}

pub fn validate_entry(entry: &DailyEntry, today: NaiveDate) -> Result<(), EngineError> {
    if !is_weekday(entry.work_date) {
        return Err(EngineError::invalid(format!(
            "{} is a weekend day; time can only be logged Monday to Friday",
            entry.work_date
        )));
    }
    if entry.work_date > today {
        return Err(EngineError::invalid(format!(
            "{} is in the future",
            entry.work_date
        )));
    }
    if !(0.0..=MAX_HOURS_PER_DAY).contains(&entry.hours_worked) {
        return Err(EngineError::invalid(format!(
            "hours_worked must be between 0 and {MAX_HOURS_PER_DAY}"
        )));
    }
    Ok(())
}

fn check_owner(timesheet: &Timesheet, owner: Option<u64>) -> Result<(), EngineError> {
    match owner {
        Some(id) if id != timesheet.employee_id => Err(EngineError::Forbidden("Not your timesheet")),
        _ => Ok(()),
    }
}

fn ensure_editable(timesheet: &Timesheet) -> Result<(), EngineError> {
    if timesheet.status.is_editable() {
        Ok(())
    } else {
        Err(EngineError::invalid(format!(
            "Timesheet {} is {} and can no longer be changed",
            timesheet.id, timesheet.status
        )))
    }
}

async fn load_timesheet<S>(store: &mut S, timesheet_id: u64) -> Result<Timesheet, EngineError>
where
    S: TimeStore + ?Sized,
{
    store.find_timesheet(timesheet_id).await?.ok_or(EngineError::NotFound {
        entity: "timesheet",
        id: timesheet_id,
    })
}

/// Lookup-before-create: the week's timesheet, made editable, or a fresh Draft.
async fn editable_week<S>(
    store: &mut S,
    employee: &LockedEmployee,
    any_day: NaiveDate,
) -> Result<Timesheet, EngineError>
where
    S: TimeStore + ?Sized,
{
    let (week_start, week_end) = week_bounds(any_day);
    let timesheet = match store.find_timesheet_for_week(employee.id(), week_start).await? {
        Some(existing) => existing,
        None => {
            let id = store
                .insert_timesheet(employee.id(), week_start, week_end, TimesheetStatus::Draft)
                .await?;
            info!(employee_id = employee.id(), timesheet_id = id, %week_start, "Timesheet created");
            load_timesheet(store, id).await?
        }
    };

    ensure_editable(&timesheet)?;
    if timesheet.status == TimesheetStatus::Rejected {
        store
            .set_timesheet_status(timesheet.id, TimesheetStatus::Draft)
            .await?;
    }
    Ok(timesheet)
}

/// Log (or overwrite) one day's hours.
pub async fn record_daily_entry<S>(
    store: &mut S,
    employee_id: u64,
    entry: DailyEntry,
    today: NaiveDate,
    policy: &LockPolicy,
) -> Result<Timesheet, EngineError>
where
    S: TimeStore + ?Sized,
{
    validate_entry(&entry, today)?;

    let employee = lock::acquire(store, employee_id, policy).await?;
    assert_no_leave_conflict(store, &employee, entry.work_date).await?;

    let timesheet = editable_week(store, &employee, entry.work_date).await?;
    store
        .upsert_detail(timesheet.id, entry.work_date, entry.hours_worked)
        .await?;
    aggregator::recompute(store, timesheet.id).await?;

    info!(
        employee_id,
        timesheet_id = timesheet.id,
        work_date = %entry.work_date,
        hours = entry.hours_worked,
        "Daily entry recorded"
    );
    load_timesheet(store, timesheet.id).await
}

/// Fill a whole week in one request, optionally submitting it.
pub async fn create_weekly_timesheet<S>(
    store: &mut S,
    employee_id: u64,
    week_of: NaiveDate,
    entries: &[DailyEntry],
    submit: bool,
    today: NaiveDate,
    policy: &LockPolicy,
) -> Result<Timesheet, EngineError>
where
    S: TimeStore + ?Sized,
{
    let (week_start, week_end) = week_bounds(week_of);
    if entries.is_empty() {
        return Err(EngineError::invalid("At least one entry is required"));
    }
    for entry in entries {
        if entry.work_date < week_start || entry.work_date > week_end {
            return Err(EngineError::invalid(format!(
                "{} is outside the week {} to {}",
                entry.work_date, week_start, week_end
            )));
        }
        validate_entry(entry, today)?;
    }

    let employee = lock::acquire(store, employee_id, policy).await?;
    assert_no_leave_conflict_in_range(store, &employee, week_start, week_end).await?;

    let timesheet = editable_week(store, &employee, week_start).await?;
    for entry in entries {
        store
            .upsert_detail(timesheet.id, entry.work_date, entry.hours_worked)
            .await?;
    }
    let total = aggregator::recompute(store, timesheet.id).await?;

    if submit {
        store
            .set_timesheet_status(timesheet.id, TimesheetStatus::Submitted)
            .await?;
    }

    info!(
        employee_id,
        timesheet_id = timesheet.id,
        %week_start,
        entries = entries.len(),
        total,
        submit,
        "Weekly timesheet saved"
    );
    load_timesheet(store, timesheet.id).await
}

/// Hand a timesheet in for review. Leave filed since drafting is re-checked here.
pub async fn submit_timesheet<S>(
    store: &mut S,
    timesheet_id: u64,
    owner: Option<u64>,
    policy: &LockPolicy,
) -> Result<Timesheet, EngineError>
where
    S: TimeStore + ?Sized,
{
    let current = load_timesheet(store, timesheet_id).await?;
    check_owner(&current, owner)?;

    let employee = lock::acquire(store, current.employee_id, policy).await?;
    let timesheet = load_timesheet(store, timesheet_id).await?;
    if !timesheet.status.can_transition_to(TimesheetStatus::Submitted) {
        return Err(EngineError::invalid(format!(
            "Timesheet {} is {} and cannot be submitted",
            timesheet.id, timesheet.status
        )));
    }
    if store.timesheet_details(timesheet_id).await?.is_empty() {
        return Err(EngineError::invalid("Cannot submit an empty timesheet"));
    }

    assert_no_leave_conflict_in_range(
        store,
        &employee,
        timesheet.week_start_date,
        timesheet.week_end_date,
    )
    .await?;

    store
        .set_timesheet_status(timesheet_id, TimesheetStatus::Submitted)
        .await?;
    info!(employee_id = employee.id(), timesheet_id, "Timesheet submitted");
    load_timesheet(store, timesheet_id).await
}

/// Approve or reject a submitted timesheet.
pub async fn review_timesheet<S>(
    store: &mut S,
    timesheet_id: u64,
    approve: bool,
    policy: &LockPolicy,
) -> Result<Timesheet, EngineError>
where
    S: TimeStore + ?Sized,
{
    let current = load_timesheet(store, timesheet_id).await?;
    let employee = lock::acquire(store, current.employee_id, policy).await?;
    let timesheet = load_timesheet(store, timesheet_id).await?;

    let target = if approve {
        TimesheetStatus::Approved
    } else {
        TimesheetStatus::Rejected
    };
    if !timesheet.status.can_transition_to(target) {
        return Err(EngineError::invalid(format!(
            "Timesheet {} is {} and cannot become {}",
            timesheet.id, timesheet.status, target
        )));
    }

    store.set_timesheet_status(timesheet_id, target).await?;
    info!(employee_id = employee.id(), timesheet_id, status = %target, "Timesheet reviewed");
    load_timesheet(store, timesheet_id).await
}

pub async fn remove_daily_entry<S>(
    store: &mut S,
    timesheet_id: u64,
    work_date: NaiveDate,
    owner: Option<u64>,
    policy: &LockPolicy,
) -> Result<Timesheet, EngineError>
where
    S: TimeStore + ?Sized,
{
    let current = load_timesheet(store, timesheet_id).await?;
    check_owner(&current, owner)?;

    let employee = lock::acquire(store, current.employee_id, policy).await?;
    let timesheet = load_timesheet(store, timesheet_id).await?;
    ensure_editable(&timesheet)?;

    if !store.delete_detail(timesheet_id, work_date).await? {
        return Err(EngineError::invalid(format!(
            "Timesheet {timesheet_id} has no entry for {work_date}"
        )));
    }
    aggregator::recompute(store, timesheet_id).await?;

    info!(employee_id = employee.id(), timesheet_id, %work_date, "Daily entry removed");
    load_timesheet(store, timesheet_id).await
}

pub async fn get_timesheet<S>(
    store: &mut S,
    timesheet_id: u64,
    owner: Option<u64>,
) -> Result<TimesheetWithDetails, EngineError>
where
    S: TimeStore + ?Sized,
{
    let timesheet = load_timesheet(store, timesheet_id).await?;
    check_owner(&timesheet, owner)?;
    let details = store.timesheet_details(timesheet_id).await?;
    Ok(TimesheetWithDetails { timesheet, details })
}
