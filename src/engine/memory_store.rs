//! In-memory [`TimeStore`] used by unit tests. Lock calls are counted and can be
//! scripted to report contention or fail outright.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};

use crate::engine::error::StoreError;
use crate::engine::store::TimeStore;
use crate::model::{
    employee::EmployeeRecord,
    leave_request::{LeaveApplication, LeaveType, NewLeave},
    overtime_pto::EmployeeOvertimePto,
    status::{LeaveStatus, TimesheetStatus},
    timesheet::{Timesheet, TimesheetDetail},
};

#[derive(Debug, Default)]
pub struct MemoryStore {
    pub employees: HashMap<u64, EmployeeRecord>,
    pub leaves: Vec<LeaveApplication>,
    pub timesheets: Vec<Timesheet>,
    pub details: Vec<TimesheetDetail>,
    pub ledgers: HashMap<u64, EmployeeOvertimePto>,
    next_id: u64,

    pub lock_attempts: u32,
    /// Number of upcoming lock calls that report contention.
    pub contended_attempts: u32,
    pub fail_lock: bool,
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Default::default()
        }
    }

    fn employee_row(id: u64, status: &str) -> EmployeeRecord {
        EmployeeRecord {
            id,
            employee_code: format!("EMP-{id:03}"),
            first_name: "Test".into(),
            last_name: format!("Employee{id}"),
            status: status.into(),
        }
    }

    pub fn with_employee(mut self, id: u64) -> Self {
        self.employees.insert(id, Self::employee_row(id, "active"));
        self
    }

    pub fn with_inactive_employee(mut self, id: u64) -> Self {
        self.employees.insert(id, Self::employee_row(id, "terminated"));
        self
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn seed_leave(&mut self, employee_id: u64, start: &str, end: &str, status: LeaveStatus) -> u64 {
        let id = self.next_id();
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        self.leaves.push(LeaveApplication {
            id,
            employee_id,
            start_date: date(start),
            end_date: date(end),
            leave_type: LeaveType::Annual,
            status,
            created_at: at,
            updated_at: at,
        });
        id
    }

    pub fn seed_timesheet(&mut self, employee_id: u64, week_start: &str, status: TimesheetStatus) -> u64 {
        let id = self.next_id();
        let start = date(week_start);
        self.timesheets.push(Timesheet {
            id,
            employee_id,
            week_start_date: start,
            week_end_date: start + chrono::Duration::days(6),
            status,
            total_hours: 0.0,
        });
        id
    }

    pub fn seed_detail(&mut self, timesheet_id: u64, work_date: &str, hours_worked: f64) {
        self.details.push(TimesheetDetail {
            timesheet_id,
            work_date: date(work_date),
            hours_worked,
        });
    }

    pub fn timesheet(&self, id: u64) -> &Timesheet {
        self.timesheets.iter().find(|t| t.id == id).expect("timesheet seeded")
    }
}

#[async_trait]
impl TimeStore for MemoryStore {
    async fn find_employee(&mut self, employee_id: u64) -> Result<Option<EmployeeRecord>, StoreError> {
        Ok(self.employees.get(&employee_id).cloned())
    }

    async fn lock_employee(&mut self, employee_id: u64) -> Result<Option<EmployeeRecord>, StoreError> {
        self.lock_attempts += 1;
        if self.fail_lock {
            return Err(StoreError::Database(sqlx::Error::PoolClosed));
        }
        if self.contended_attempts > 0 {
            self.contended_attempts -= 1;
            return Err(StoreError::Contention("lock wait timeout exceeded".into()));
        }
        Ok(self.employees.get(&employee_id).cloned())
    }

    async fn leaves_with_status(
        &mut self,
        employee_id: u64,
        statuses: &[LeaveStatus],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<LeaveApplication>, StoreError> {
        Ok(self
            .leaves
            .iter()
            .filter(|l| l.employee_id == employee_id && statuses.contains(&l.status))
            .filter(|l| l.start_date <= end && l.end_date >= start)
            .cloned()
            .collect())
    }

    async fn find_leave(&mut self, leave_id: u64) -> Result<Option<LeaveApplication>, StoreError> {
        Ok(self.leaves.iter().find(|l| l.id == leave_id).cloned())
    }

    async fn insert_leave(&mut self, leave: &NewLeave) -> Result<u64, StoreError> {
        let id = self.next_id();
        let now = Utc::now();
        self.leaves.push(LeaveApplication {
            id,
            employee_id: leave.employee_id,
            start_date: leave.start_date,
            end_date: leave.end_date,
            leave_type: leave.leave_type,
            status: leave.status,
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    async fn update_leave(&mut self, leave: &LeaveApplication) -> Result<(), StoreError> {
        if let Some(row) = self.leaves.iter_mut().find(|l| l.id == leave.id) {
            *row = LeaveApplication {
                updated_at: Utc::now(),
                ..leave.clone()
            };
        }
        Ok(())
    }

    async fn timesheets_with_status(
        &mut self,
        employee_id: u64,
        statuses: &[TimesheetStatus],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Timesheet>, StoreError> {
        Ok(self
            .timesheets
            .iter()
            .filter(|t| t.employee_id == employee_id && statuses.contains(&t.status))
            .filter(|t| t.week_start_date <= end && t.week_end_date >= start)
            .cloned()
            .collect())
    }

    async fn find_timesheet(&mut self, timesheet_id: u64) -> Result<Option<Timesheet>, StoreError> {
        Ok(self.timesheets.iter().find(|t| t.id == timesheet_id).cloned())
    }

    async fn find_timesheet_for_week(
        &mut self,
        employee_id: u64,
        week_start: NaiveDate,
    ) -> Result<Option<Timesheet>, StoreError> {
        Ok(self
            .timesheets
            .iter()
            .find(|t| t.employee_id == employee_id && t.week_start_date == week_start)
            .cloned())
    }

    async fn insert_timesheet(
        &mut self,
        employee_id: u64,
        week_start: NaiveDate,
        week_end: NaiveDate,
        status: TimesheetStatus,
    ) -> Result<u64, StoreError> {
        let id = self.next_id();
        self.timesheets.push(Timesheet {
            id,
            employee_id,
            week_start_date: week_start,
            week_end_date: week_end,
            status,
            total_hours: 0.0,
        });
        Ok(id)
    }

    async fn set_timesheet_status(
        &mut self,
        timesheet_id: u64,
        status: TimesheetStatus,
    ) -> Result<(), StoreError> {
        if let Some(t) = self.timesheets.iter_mut().find(|t| t.id == timesheet_id) {
            t.status = status;
        }
        Ok(())
    }

    async fn set_timesheet_total(&mut self, timesheet_id: u64, total_hours: f64) -> Result<(), StoreError> {
        if let Some(t) = self.timesheets.iter_mut().find(|t| t.id == timesheet_id) {
            t.total_hours = total_hours;
        }
        Ok(())
    }

    async fn timesheet_details(&mut self, timesheet_id: u64) -> Result<Vec<TimesheetDetail>, StoreError> {
        let mut rows: Vec<_> = self
            .details
            .iter()
            .filter(|d| d.timesheet_id == timesheet_id)
            .cloned()
            .collect();
        rows.sort_by_key(|d| d.work_date);
        Ok(rows)
    }

    async fn upsert_detail(
        &mut self,
        timesheet_id: u64,
        work_date: NaiveDate,
        hours_worked: f64,
    ) -> Result<(), StoreError> {
        match self
            .details
            .iter_mut()
            .find(|d| d.timesheet_id == timesheet_id && d.work_date == work_date)
        {
            Some(row) => row.hours_worked = hours_worked,
            None => self.details.push(TimesheetDetail {
                timesheet_id,
                work_date,
                hours_worked,
            }),
        }
        Ok(())
    }

    async fn delete_detail(&mut self, timesheet_id: u64, work_date: NaiveDate) -> Result<bool, StoreError> {
        let before = self.details.len();
        self.details
            .retain(|d| !(d.timesheet_id == timesheet_id && d.work_date == work_date));
        Ok(self.details.len() != before)
    }

    async fn worked_hours_between(
        &mut self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TimesheetDetail>, StoreError> {
        let sheets: Vec<u64> = self
            .timesheets
            .iter()
            .filter(|t| t.employee_id == employee_id)
            .map(|t| t.id)
            .collect();
        Ok(self
            .details
            .iter()
            .filter(|d| sheets.contains(&d.timesheet_id) && d.work_date >= start && d.work_date <= end)
            .cloned()
            .collect())
    }

    async fn find_overtime_ledger(
        &mut self,
        employee_id: u64,
    ) -> Result<Option<EmployeeOvertimePto>, StoreError> {
        Ok(self.ledgers.get(&employee_id).cloned())
    }

    async fn insert_overtime_ledger(&mut self, ledger: &EmployeeOvertimePto) -> Result<(), StoreError> {
        self.ledgers.insert(ledger.employee_id, ledger.clone());
        Ok(())
    }

    async fn update_overtime_ledger(&mut self, ledger: &EmployeeOvertimePto) -> Result<(), StoreError> {
        self.ledgers.insert(ledger.employee_id, ledger.clone());
        Ok(())
    }
}
