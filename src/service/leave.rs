use chrono::NaiveDate;
use tracing::info;

use crate::engine::conflict::assert_no_timesheet_conflict;
use crate::engine::error::EngineError;
use crate::engine::lock::{self, LockPolicy};
use crate::engine::store::TimeStore;
use crate::model::leave_request::{LeaveApplication, LeaveType, NewLeave};
use crate::model::status::LeaveStatus;

#[derive(Debug, Clone)]
pub struct LeaveChange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub leave_type: LeaveType,
}

fn validate_range(start: NaiveDate, end: NaiveDate) -> Result<(), EngineError> {
    if start > end {
        return Err(EngineError::invalid("start_date cannot be after end_date"));
    }
    Ok(())
}

fn check_owner(leave: &LeaveApplication, owner: Option<u64>) -> Result<(), EngineError> {
    match owner {
        Some(id) if id != leave.employee_id => Err(EngineError::Forbidden("Not your leave request")),
        _ => Ok(()),
    }
}

async fn load_leave<S>(store: &mut S, leave_id: u64) -> Result<LeaveApplication, EngineError>
where
    S: TimeStore + ?Sized,
{
    store.find_leave(leave_id).await?.ok_or(EngineError::NotFound {
        entity: "leave request",
        id: leave_id,
    })
}

/// File a new leave, as Draft or directly Submitted.
pub async fn create_leave<S>(
    store: &mut S,
    employee_id: u64,
    change: LeaveChange,
    submit: bool,
    policy: &LockPolicy,
) -> Result<LeaveApplication, EngineError>
where
    S: TimeStore + ?Sized,
{
    validate_range(change.start_date, change.end_date)?;

    let employee = lock::acquire(store, employee_id, policy).await?;
    assert_no_timesheet_conflict(store, &employee, change.start_date, change.end_date).await?;

    let status = if submit {
        LeaveStatus::Submitted
    } else {
        LeaveStatus::Draft
    };
    let leave_id = store
        .insert_leave(&NewLeave {
            employee_id: employee.id(),
            start_date: change.start_date,
            end_date: change.end_date,
            leave_type: change.leave_type,
            status,
        })
        .await?;

    info!(employee_id, leave_id, %status, "Leave request created");
    load_leave(store, leave_id).await
}

/// Change dates/type of a leave that has not been approved yet.
pub async fn update_leave<S>(
    store: &mut S,
    leave_id: u64,
    owner: Option<u64>,
    change: LeaveChange,
    policy: &LockPolicy,
) -> Result<LeaveApplication, EngineError>
where
    S: TimeStore + ?Sized,
{
    validate_range(change.start_date, change.end_date)?;

    let current = load_leave(store, leave_id).await?;
    check_owner(&current, owner)?;

    let employee = lock::acquire(store, current.employee_id, policy).await?;
    // status may have moved while we waited for the lock
    let mut leave = load_leave(store, leave_id).await?;
    if !leave.status.is_editable() {
        return Err(EngineError::invalid(format!(
            "Leave request is {} and can no longer be changed",
            leave.status
        )));
    }

    assert_no_timesheet_conflict(store, &employee, change.start_date, change.end_date).await?;

    leave.start_date = change.start_date;
    leave.end_date = change.end_date;
    leave.leave_type = change.leave_type;
    store.update_leave(&leave).await?;

    info!(employee_id = employee.id(), leave_id, "Leave request updated");
    load_leave(store, leave_id).await
}

/// Move a leave along its workflow. Entering a blocking status re-checks timesheet conflicts.
pub async fn transition_leave<S>(
    store: &mut S,
    leave_id: u64,
    owner: Option<u64>,
    target: LeaveStatus,
    policy: &LockPolicy,
) -> Result<LeaveApplication, EngineError>
where
    S: TimeStore + ?Sized,
{
    let current = load_leave(store, leave_id).await?;
    check_owner(&current, owner)?;

    let employee = lock::acquire(store, current.employee_id, policy).await?;
    let mut leave = load_leave(store, leave_id).await?;

    if !leave.status.can_transition_to(target) {
        return Err(EngineError::invalid(format!(
            "Leave request cannot move from {} to {}",
            leave.status, target
        )));
    }

    if target.is_blocking() && !leave.status.is_blocking() {
        assert_no_timesheet_conflict(store, &employee, leave.start_date, leave.end_date).await?;
    }

    let from = leave.status;
    leave.status = target;
    store.update_leave(&leave).await?;

    info!(employee_id = employee.id(), leave_id, %from, to = %target, "Leave request status changed");
    load_leave(store, leave_id).await
}

pub async fn get_leave<S>(
    store: &mut S,
    leave_id: u64,
    owner: Option<u64>,
) -> Result<LeaveApplication, EngineError>
where
    S: TimeStore + ?Sized,
{
    let leave = load_leave(store, leave_id).await?;
    check_owner(&leave, owner)?;
    Ok(leave)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::engine::error::{ConflictKind, LockError};
    use crate::engine::memory_store::{MemoryStore, date};
    use crate::model::status::TimesheetStatus;

    fn change(start: &str, end: &str) -> LeaveChange {
        LeaveChange {
            start_date: date(start),
            end_date: date(end),
            leave_type: LeaveType::Annual,
        }
    }

    fn policy() -> LockPolicy {
        LockPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(1),
            max_jitter: Duration::ZERO,
        }
    }

    #[actix_web::test]
    async fn submitted_timesheet_blocks_new_leave() {
        let mut store = MemoryStore::new().with_employee(1);
        store.seed_timesheet(1, "2024-01-15", TimesheetStatus::Submitted);

        let err = create_leave(&mut store, 1, change("2024-01-17", "2024-01-19"), true, &policy())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Conflict(ref c) if c.kind == ConflictKind::TimesheetConflict));
        assert!(store.leaves.is_empty());
    }

    #[actix_web::test]
    async fn draft_timesheet_does_not_block_leave() {
        let mut store = MemoryStore::new().with_employee(1);
        store.seed_timesheet(1, "2024-01-15", TimesheetStatus::Draft);

        let leave = create_leave(&mut store, 1, change("2024-01-17", "2024-01-19"), true, &policy())
            .await
            .unwrap();
        assert_eq!(leave.status, LeaveStatus::Submitted);
        assert_eq!(store.leaves.len(), 1);
    }

    #[actix_web::test]
    async fn reversed_dates_are_rejected_before_locking() {
        let mut store = MemoryStore::new().with_employee(1);
        let err = create_leave(&mut store, 1, change("2024-01-19", "2024-01-17"), false, &policy())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Invalid(_)));
        assert_eq!(store.lock_attempts, 0);
    }

    #[actix_web::test]
    async fn lock_timeout_writes_nothing() {
        let mut store = MemoryStore::new().with_employee(1);
        store.contended_attempts = u32::MAX;

        let err = create_leave(&mut store, 1, change("2024-01-17", "2024-01-19"), true, &policy())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Lock(LockError::LockTimeout { .. })));
        assert!(store.leaves.is_empty());
    }

    #[actix_web::test]
    async fn submitting_a_draft_rechecks_conflicts() {
        let mut store = MemoryStore::new().with_employee(1);
        let leave = create_leave(&mut store, 1, change("2024-01-17", "2024-01-19"), false, &policy())
            .await
            .unwrap();
        // timesheet submitted after the draft was filed
        store.seed_timesheet(1, "2024-01-15", TimesheetStatus::Approved);

        let err = transition_leave(&mut store, leave.id, Some(1), LeaveStatus::Submitted, &policy())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)));
        assert_eq!(store.leaves[0].status, LeaveStatus::Draft);
    }

    #[actix_web::test]
    async fn approval_chain() {
        let mut store = MemoryStore::new().with_employee(1);
        let id = store.seed_leave(1, "2024-02-01", "2024-02-02", LeaveStatus::Submitted);

        let leave = transition_leave(&mut store, id, None, LeaveStatus::ManagerApproved, &policy())
            .await
            .unwrap();
        assert_eq!(leave.status, LeaveStatus::ManagerApproved);
        let leave = transition_leave(&mut store, id, None, LeaveStatus::HrApproved, &policy())
            .await
            .unwrap();
        assert_eq!(leave.status, LeaveStatus::HrApproved);

        let err = transition_leave(&mut store, id, None, LeaveStatus::Rejected, &policy())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Invalid(_)));
    }

    #[actix_web::test]
    async fn only_owner_may_edit() {
        let mut store = MemoryStore::new().with_employee(1);
        let id = store.seed_leave(1, "2024-02-01", "2024-02-02", LeaveStatus::Draft);

        let err = update_leave(&mut store, id, Some(2), change("2024-02-05", "2024-02-06"), &policy())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Forbidden(_)));

        let leave = update_leave(&mut store, id, Some(1), change("2024-02-05", "2024-02-06"), &policy())
            .await
            .unwrap();
        assert_eq!(leave.start_date, date("2024-02-05"));
    }

    #[actix_web::test]
    async fn approved_leave_is_frozen() {
        let mut store = MemoryStore::new().with_employee(1);
        let id = store.seed_leave(1, "2024-02-01", "2024-02-02", LeaveStatus::HrApproved);

        let err = update_leave(&mut store, id, None, change("2024-02-05", "2024-02-06"), &policy())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Invalid(_)));
    }

    #[actix_web::test]
    async fn updating_into_a_submitted_week_is_rejected() {
        let mut store = MemoryStore::new().with_employee(1);
        store.seed_timesheet(1, "2024-01-15", TimesheetStatus::Submitted);
        let id = store.seed_leave(1, "2024-01-08", "2024-01-12", LeaveStatus::Submitted);

        let err = update_leave(&mut store, id, Some(1), change("2024-01-12", "2024-01-15"), &policy())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)));
        assert_eq!(store.leaves[0].end_date, date("2024-01-12"));
    }
}
