use chrono::NaiveDate;
use tracing::info;

use crate::engine::error::{ConflictError, ConflictKind, ConflictingRecord, EngineError};
use crate::engine::lock::LockedEmployee;
use crate::engine::store::TimeStore;
use crate::model::leave_request::LeaveApplication;
use crate::model::status::{LeaveStatus, TimesheetStatus};
use crate::model::timesheet::Timesheet;
use crate::utils::date_range::{overlaps, week_bounds};

/// Blocking leaves of `leaves` that intersect `[start, end]`.
pub fn blocking_leaves_overlapping(
    leaves: &[LeaveApplication],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<ConflictingRecord> {
    leaves
        .iter()
        .filter(|l| l.status.is_blocking())
        .filter(|l| overlaps(l.start_date, l.end_date, start, end))
        .map(|l| ConflictingRecord {
            id: l.id,
            start_date: l.start_date,
            end_date: l.end_date,
            status: l.status.to_string(),
        })
        .collect()
}

/// Blocking timesheets of `timesheets` whose week intersects `[start, end]`.
pub fn blocking_timesheets_overlapping(
    timesheets: &[Timesheet],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<ConflictingRecord> {
    timesheets
        .iter()
        .filter(|t| t.status.is_blocking())
        .filter(|t| overlaps(t.week_start_date, t.week_end_date, start, end))
        .map(|t| ConflictingRecord {
            id: t.id,
            start_date: t.week_start_date,
            end_date: t.week_end_date,
            status: t.status.to_string(),
        })
        .collect()
}

/// Rejects a timesheet entry for `work_date` when blocking leave touches its week.
pub async fn assert_no_leave_conflict<S>(
    store: &mut S,
    employee: &LockedEmployee,
    work_date: NaiveDate,
) -> Result<(), EngineError>
where
    S: TimeStore + ?Sized,
{
    let (week_start, week_end) = week_bounds(work_date);
    assert_no_leave_conflict_in_range(store, employee, week_start, week_end).await
}

/// Rejects timesheet writes spanning `[start, end]` (a whole week, or a
/// timesheet being submitted) when blocking leave overlaps it.
pub async fn assert_no_leave_conflict_in_range<S>(
    store: &mut S,
    employee: &LockedEmployee,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<(), EngineError>
where
    S: TimeStore + ?Sized,
{
    let leaves = store
        .leaves_with_status(employee.id(), &LeaveStatus::BLOCKING, start, end)
        .await?;
    let records = blocking_leaves_overlapping(&leaves, start, end);
    reject_if_any(ConflictKind::LeaveConflict, employee.id(), records)
}

/// Rejects a leave spanning `[start, end]` when a blocking timesheet week overlaps it.
pub async fn assert_no_timesheet_conflict<S>(
    store: &mut S,
    employee: &LockedEmployee,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<(), EngineError>
where
    S: TimeStore + ?Sized,
{
    let timesheets = store
        .timesheets_with_status(employee.id(), &TimesheetStatus::BLOCKING, start, end)
        .await?;
    let records = blocking_timesheets_overlapping(&timesheets, start, end);
    reject_if_any(ConflictKind::TimesheetConflict, employee.id(), records)
}

fn reject_if_any(
    kind: ConflictKind,
    employee_id: u64,
    records: Vec<ConflictingRecord>,
) -> Result<(), EngineError> {
    if records.is_empty() {
        return Ok(());
    }
    info!(employee_id, ?kind, count = records.len(), "Write rejected by date conflict");
    Err(ConflictError {
        kind,
        employee_id,
        records,
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::lock::{LockPolicy, acquire};
    use crate::engine::memory_store::{MemoryStore, date};

    async fn locked(store: &mut MemoryStore, id: u64) -> LockedEmployee {
        acquire(store, id, &LockPolicy::default()).await.unwrap()
    }

    #[actix_web::test]
    async fn submitted_leave_blocks_overlapping_week() {
        let mut store = MemoryStore::new().with_employee(1);
        let leave_id = store.seed_leave(1, "2024-01-17", "2024-01-19", LeaveStatus::Submitted);
        let emp = locked(&mut store, 1).await;

        let err = assert_no_leave_conflict_in_range(&mut store, &emp, date("2024-01-15"), date("2024-01-21"))
            .await
            .unwrap_err();
        match err {
            EngineError::Conflict(c) => {
                assert_eq!(c.kind, ConflictKind::LeaveConflict);
                assert_eq!(c.records.len(), 1);
                assert_eq!(c.records[0].id, leave_id);
                assert_eq!(c.records[0].status, "submitted");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[actix_web::test]
    async fn single_day_entry_checks_the_whole_week() {
        let mut store = MemoryStore::new().with_employee(1);
        store.seed_leave(1, "2024-01-19", "2024-01-19", LeaveStatus::HrApproved);
        let emp = locked(&mut store, 1).await;

        // Monday entry, leave on Friday of the same week
        let result = assert_no_leave_conflict(&mut store, &emp, date("2024-01-15")).await;
        assert!(matches!(result, Err(EngineError::Conflict(_))));
    }

    #[actix_web::test]
    async fn draft_and_rejected_leave_never_block() {
        let mut store = MemoryStore::new().with_employee(1);
        store.seed_leave(1, "2024-01-15", "2024-01-21", LeaveStatus::Draft);
        store.seed_leave(1, "2024-01-16", "2024-01-17", LeaveStatus::Rejected);
        let emp = locked(&mut store, 1).await;

        assert_no_leave_conflict(&mut store, &emp, date("2024-01-16")).await.unwrap();
    }

    #[actix_web::test]
    async fn adjacent_leave_does_not_block() {
        let mut store = MemoryStore::new().with_employee(1);
        store.seed_leave(1, "2024-01-08", "2024-01-12", LeaveStatus::HrApproved);
        let emp = locked(&mut store, 1).await;

        assert_no_leave_conflict(&mut store, &emp, date("2024-01-15")).await.unwrap();
    }

    #[actix_web::test]
    async fn other_employees_leave_is_ignored() {
        let mut store = MemoryStore::new().with_employee(1).with_employee(2);
        store.seed_leave(2, "2024-01-15", "2024-01-19", LeaveStatus::Submitted);
        let emp = locked(&mut store, 1).await;

        assert_no_leave_conflict(&mut store, &emp, date("2024-01-17")).await.unwrap();
    }

    #[actix_web::test]
    async fn every_blocking_timesheet_is_reported() {
        let mut store = MemoryStore::new().with_employee(1);
        let a = store.seed_timesheet(1, "2024-01-15", TimesheetStatus::Submitted);
        let b = store.seed_timesheet(1, "2024-01-22", TimesheetStatus::Approved);
        store.seed_timesheet(1, "2024-01-29", TimesheetStatus::Draft);
        let emp = locked(&mut store, 1).await;

        let err = assert_no_timesheet_conflict(&mut store, &emp, date("2024-01-19"), date("2024-02-02"))
            .await
            .unwrap_err();
        match err {
            EngineError::Conflict(c) => {
                assert_eq!(c.kind, ConflictKind::TimesheetConflict);
                let ids: Vec<u64> = c.records.iter().map(|r| r.id).collect();
                assert_eq!(ids, vec![a, b]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[actix_web::test]
    async fn leave_ending_on_week_start_blocks() {
        let mut store = MemoryStore::new().with_employee(1);
        store.seed_timesheet(1, "2024-01-15", TimesheetStatus::Approved);
        let emp = locked(&mut store, 1).await;

        let result = assert_no_timesheet_conflict(&mut store, &emp, date("2024-01-11"), date("2024-01-15")).await;
        assert!(matches!(result, Err(EngineError::Conflict(_))));

        let result = assert_no_timesheet_conflict(&mut store, &emp, date("2024-01-10"), date("2024-01-12")).await;
        assert!(result.is_ok());
    }

    #[test]
    fn pure_filter_rechecks_status() {
        let mut store = MemoryStore::new();
        store.seed_leave(1, "2024-01-15", "2024-01-16", LeaveStatus::Draft);
        store.seed_leave(1, "2024-01-15", "2024-01-16", LeaveStatus::ManagerApproved);
        let found = blocking_leaves_overlapping(&store.leaves, date("2024-01-15"), date("2024-01-21"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].status, "manager_approved");
    }
}
