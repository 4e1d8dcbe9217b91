use async_trait::async_trait;
use chrono::NaiveDate;

use crate::engine::error::StoreError;
use crate::model::{
    employee::EmployeeRecord,
    leave_request::{LeaveApplication, NewLeave},
    overtime_pto::EmployeeOvertimePto,
    status::{LeaveStatus, TimesheetStatus},
    timesheet::{Timesheet, TimesheetDetail},
};

/// Reads and writes of the timekeeping core, all scoped to one open transaction.
///
/// Only [`lock_employee`](TimeStore::lock_employee) may take a pessimistic lock;
/// callers reach it through [`crate::engine::lock::acquire`].
#[async_trait]
pub trait TimeStore: Send {
    /// Plain read, takes no lock.
    async fn find_employee(&mut self, employee_id: u64) -> Result<Option<EmployeeRecord>, StoreError>;

    /// Row-level exclusive lock held until the transaction ends.
    /// Contention is reported as [`StoreError::Contention`].
    async fn lock_employee(&mut self, employee_id: u64) -> Result<Option<EmployeeRecord>, StoreError>;

    /// Leaves in one of `statuses` whose range intersects `[start, end]`.
    async fn leaves_with_status(
        &mut self,
        employee_id: u64,
        statuses: &[LeaveStatus],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<LeaveApplication>, StoreError>;

    async fn find_leave(&mut self, leave_id: u64) -> Result<Option<LeaveApplication>, StoreError>;

    async fn insert_leave(&mut self, leave: &NewLeave) -> Result<u64, StoreError>;

    /// Persists dates, type and status of an existing leave.
    async fn update_leave(&mut self, leave: &LeaveApplication) -> Result<(), StoreError>;

    /// Timesheets in one of `statuses` whose week intersects `[start, end]`.
    async fn timesheets_with_status(
        &mut self,
        employee_id: u64,
        statuses: &[TimesheetStatus],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Timesheet>, StoreError>;

    async fn find_timesheet(&mut self, timesheet_id: u64) -> Result<Option<Timesheet>, StoreError>;

    async fn find_timesheet_for_week(
        &mut self,
        employee_id: u64,
        week_start: NaiveDate,
    ) -> Result<Option<Timesheet>, StoreError>;

    async fn insert_timesheet(
        &mut self,
        employee_id: u64,
        week_start: NaiveDate,
        week_end: NaiveDate,
        status: TimesheetStatus,
    ) -> Result<u64, StoreError>;

    async fn set_timesheet_status(
        &mut self,
        timesheet_id: u64,
        status: TimesheetStatus,
    ) -> Result<(), StoreError>;

    async fn set_timesheet_total(&mut self, timesheet_id: u64, total_hours: f64) -> Result<(), StoreError>;

    async fn timesheet_details(&mut self, timesheet_id: u64) -> Result<Vec<TimesheetDetail>, StoreError>;

    /// Insert, or overwrite the hours of the existing detail for that date.
    async fn upsert_detail(
        &mut self,
        timesheet_id: u64,
        work_date: NaiveDate,
        hours_worked: f64,
    ) -> Result<(), StoreError>;

    /// Returns false when no detail existed for that date.
    async fn delete_detail(&mut self, timesheet_id: u64, work_date: NaiveDate) -> Result<bool, StoreError>;

    /// Every detail row of the employee with `start <= work_date <= end`, regardless of timesheet status.
    async fn worked_hours_between(
        &mut self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TimesheetDetail>, StoreError>;

    async fn find_overtime_ledger(
        &mut self,
        employee_id: u64,
    ) -> Result<Option<EmployeeOvertimePto>, StoreError>;

    async fn insert_overtime_ledger(&mut self, ledger: &EmployeeOvertimePto) -> Result<(), StoreError>;

    async fn update_overtime_ledger(&mut self, ledger: &EmployeeOvertimePto) -> Result<(), StoreError>;
}
