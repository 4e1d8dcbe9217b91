use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::mysql::MySqlDatabaseError;
use sqlx::{FromRow, MySql, Transaction};

use crate::engine::error::StoreError;
use crate::engine::store::TimeStore;
use crate::model::{
    employee::EmployeeRecord,
    leave_request::{LeaveApplication, LeaveType, NewLeave},
    overtime_pto::EmployeeOvertimePto,
    status::{LeaveStatus, TimesheetStatus},
    timesheet::{Timesheet, TimesheetDetail},
};

// MySQL server error numbers that mean "someone else holds the row".
const ER_LOCK_WAIT_TIMEOUT: u16 = 1205;
const ER_LOCK_DEADLOCK: u16 = 1213;
const ER_LOCK_NOWAIT: u16 = 3572;

/// True when the error is the store refusing a lock rather than a real failure.
pub fn is_contention(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            let by_number = db_err
                .try_downcast_ref::<MySqlDatabaseError>()
                .map(|e| {
                    matches!(
                        e.number(),
                        ER_LOCK_WAIT_TIMEOUT | ER_LOCK_DEADLOCK | ER_LOCK_NOWAIT
                    )
                })
                .unwrap_or(false);
            by_number || db_err.code().as_deref() == Some("40001")
        }
        sqlx::Error::PoolTimedOut => true,
        _ => false,
    }
}

fn lock_query_error(err: sqlx::Error) -> StoreError {
    if is_contention(&err) {
        StoreError::Contention(err.to_string())
    } else {
        StoreError::Database(err)
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn leaves_in_range_sql(statuses: usize) -> String {
    format!(
        "SELECT {LEAVE_COLUMNS} FROM leave_requests \
         WHERE employee_id = ? AND status IN ({}) AND start_date <= ? AND end_date >= ? \
         ORDER BY start_date, id",
        placeholders(statuses)
    )
}

fn timesheets_in_range_sql(statuses: usize) -> String {
    format!(
        "SELECT {TIMESHEET_COLUMNS} FROM timesheets \
         WHERE employee_id = ? AND status IN ({}) AND week_start_date <= ? AND week_end_date >= ? \
         ORDER BY week_start_date, id",
        placeholders(statuses)
    )
}

fn parse<T: FromStr>(table: &'static str, value: &str) -> Result<T, StoreError> {
    value.parse().map_err(|_| StoreError::Corrupt {
        table,
        detail: format!("unknown code '{value}'"),
    })
}

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    employee_id: u64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    leave_type: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<LeaveRow> for LeaveApplication {
    type Error = StoreError;

    fn try_from(row: LeaveRow) -> Result<Self, Self::Error> {
        Ok(LeaveApplication {
            id: row.id,
            employee_id: row.employee_id,
            start_date: row.start_date,
            end_date: row.end_date,
            leave_type: parse::<LeaveType>("leave_requests", &row.leave_type)?,
            status: parse::<LeaveStatus>("leave_requests", &row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct TimesheetRow {
    id: u64,
    employee_id: u64,
    week_start_date: NaiveDate,
    week_end_date: NaiveDate,
    status: String,
    total_hours: f64,
}

impl TryFrom<TimesheetRow> for Timesheet {
    type Error = StoreError;

    fn try_from(row: TimesheetRow) -> Result<Self, Self::Error> {
        Ok(Timesheet {
            id: row.id,
            employee_id: row.employee_id,
            week_start_date: row.week_start_date,
            week_end_date: row.week_end_date,
            status: parse::<TimesheetStatus>("timesheets", &row.status)?,
            total_hours: row.total_hours,
        })
    }
}

const LEAVE_COLUMNS: &str =
    "id, employee_id, start_date, end_date, leave_type, status, created_at, updated_at";
const TIMESHEET_COLUMNS: &str =
    "id, employee_id, week_start_date, week_end_date, status, total_hours";
const EMPLOYEE_COLUMNS: &str = "id, employee_code, first_name, last_name, status";

#[async_trait]
impl<'c> TimeStore for Transaction<'c, MySql> {
    async fn find_employee(&mut self, employee_id: u64) -> Result<Option<EmployeeRecord>, StoreError> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?");
        Ok(sqlx::query_as::<_, EmployeeRecord>(&sql)
            .bind(employee_id)
            .fetch_optional(&mut **self)
            .await?)
    }

    async fn lock_employee(&mut self, employee_id: u64) -> Result<Option<EmployeeRecord>, StoreError> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ? FOR UPDATE");
        sqlx::query_as::<_, EmployeeRecord>(&sql)
            .bind(employee_id)
            .fetch_optional(&mut **self)
            .await
            .map_err(lock_query_error)
    }

    async fn leaves_with_status(
        &mut self,
        employee_id: u64,
        statuses: &[LeaveStatus],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<LeaveApplication>, StoreError> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }
        let sql = leaves_in_range_sql(statuses.len());
        let mut query = sqlx::query_as::<_, LeaveRow>(&sql).bind(employee_id);
        for status in statuses {
            query = query.bind(status.as_ref());
        }
        query
            .bind(end)
            .bind(start)
            .fetch_all(&mut **self)
            .await?
            .into_iter()
            .map(LeaveApplication::try_from)
            .collect()
    }

    async fn find_leave(&mut self, leave_id: u64) -> Result<Option<LeaveApplication>, StoreError> {
        let sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?");
        sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(leave_id)
            .fetch_optional(&mut **self)
            .await?
            .map(LeaveApplication::try_from)
            .transpose()
    }

    async fn insert_leave(&mut self, leave: &NewLeave) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, start_date, end_date, leave_type, status)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(leave.employee_id)
        .bind(leave.start_date)
        .bind(leave.end_date)
        .bind(leave.leave_type.as_ref())
        .bind(leave.status.as_ref())
        .execute(&mut **self)
        .await?;
        Ok(result.last_insert_id())
    }

    async fn update_leave(&mut self, leave: &LeaveApplication) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE leave_requests
            SET start_date = ?, end_date = ?, leave_type = ?, status = ?, updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
        )
        .bind(leave.start_date)
        .bind(leave.end_date)
        .bind(leave.leave_type.as_ref())
        .bind(leave.status.as_ref())
        .bind(leave.id)
        .execute(&mut **self)
        .await?;
        Ok(())
    }

    async fn timesheets_with_status(
        &mut self,
        employee_id: u64,
        statuses: &[TimesheetStatus],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Timesheet>, StoreError> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }
        let sql = timesheets_in_range_sql(statuses.len());
        let mut query = sqlx::query_as::<_, TimesheetRow>(&sql).bind(employee_id);
        for status in statuses {
            query = query.bind(status.as_ref());
        }
        query
            .bind(end)
            .bind(start)
            .fetch_all(&mut **self)
            .await?
            .into_iter()
            .map(Timesheet::try_from)
            .collect()
    }

    async fn find_timesheet(&mut self, timesheet_id: u64) -> Result<Option<Timesheet>, StoreError> {
        let sql = format!("SELECT {TIMESHEET_COLUMNS} FROM timesheets WHERE id = ?");
        sqlx::query_as::<_, TimesheetRow>(&sql)
            .bind(timesheet_id)
            .fetch_optional(&mut **self)
            .await?
            .map(Timesheet::try_from)
            .transpose()
    }

    async fn find_timesheet_for_week(
        &mut self,
        employee_id: u64,
        week_start: NaiveDate,
    ) -> Result<Option<Timesheet>, StoreError> {
        let sql = format!(
            "SELECT {TIMESHEET_COLUMNS} FROM timesheets WHERE employee_id = ? AND week_start_date = ?"
        );
        sqlx::query_as::<_, TimesheetRow>(&sql)
            .bind(employee_id)
            .bind(week_start)
            .fetch_optional(&mut **self)
            .await?
            .map(Timesheet::try_from)
            .transpose()
    }

    async fn insert_timesheet(
        &mut self,
        employee_id: u64,
        week_start: NaiveDate,
        week_end: NaiveDate,
        status: TimesheetStatus,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO timesheets
                (employee_id, week_start_date, week_end_date, status, total_hours)
            VALUES (?, ?, ?, ?, 0)
            "#,
        )
        .bind(employee_id)
        .bind(week_start)
        .bind(week_end)
        .bind(status.as_ref())
        .execute(&mut **self)
        .await?;
        Ok(result.last_insert_id())
    }

    async fn set_timesheet_status(
        &mut self,
        timesheet_id: u64,
        status: TimesheetStatus,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE timesheets SET status = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
            .bind(status.as_ref())
            .bind(timesheet_id)
            .execute(&mut **self)
            .await?;
        Ok(())
    }

    async fn set_timesheet_total(&mut self, timesheet_id: u64, total_hours: f64) -> Result<(), StoreError> {
        sqlx::query("UPDATE timesheets SET total_hours = ? WHERE id = ?")
            .bind(total_hours)
            .bind(timesheet_id)
            .execute(&mut **self)
            .await?;
        Ok(())
    }

    async fn timesheet_details(&mut self, timesheet_id: u64) -> Result<Vec<TimesheetDetail>, StoreError> {
        Ok(sqlx::query_as::<_, TimesheetDetail>(
            r#"
            SELECT timesheet_id, work_date, hours_worked
            FROM timesheet_details
            WHERE timesheet_id = ?
            ORDER BY work_date
            "#,
        )
        .bind(timesheet_id)
        .fetch_all(&mut **self)
        .await?)
    }

    async fn upsert_detail(
        &mut self,
        timesheet_id: u64,
        work_date: NaiveDate,
        hours_worked: f64,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO timesheet_details (timesheet_id, work_date, hours_worked)
            VALUES (?, ?, ?)
            ON DUPLICATE KEY UPDATE hours_worked = VALUES(hours_worked)
            "#,
        )
        .bind(timesheet_id)
        .bind(work_date)
        .bind(hours_worked)
        .execute(&mut **self)
        .await?;
        Ok(())
    }

    async fn delete_detail(&mut self, timesheet_id: u64, work_date: NaiveDate) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM timesheet_details WHERE timesheet_id = ? AND work_date = ?")
            .bind(timesheet_id)
            .bind(work_date)
            .execute(&mut **self)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn worked_hours_between(
        &mut self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TimesheetDetail>, StoreError> {
        Ok(sqlx::query_as::<_, TimesheetDetail>(
            r#"
            SELECT d.timesheet_id, d.work_date, d.hours_worked
            FROM timesheet_details d
            JOIN timesheets t ON t.id = d.timesheet_id
            WHERE t.employee_id = ?
            AND d.work_date BETWEEN ? AND ?
            "#,
        )
        .bind(employee_id)
        .bind(start)
        .bind(end)
        .fetch_all(&mut **self)
        .await?)
    }

    async fn find_overtime_ledger(
        &mut self,
        employee_id: u64,
    ) -> Result<Option<EmployeeOvertimePto>, StoreError> {
        Ok(sqlx::query_as::<_, EmployeeOvertimePto>(
            r#"
            SELECT employee_id, overtime_hours, pto_granted, last_calculated
            FROM employee_overtime_pto
            WHERE employee_id = ?
            "#,
        )
        .bind(employee_id)
        .fetch_optional(&mut **self)
        .await?)
    }

    async fn insert_overtime_ledger(&mut self, ledger: &EmployeeOvertimePto) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO employee_overtime_pto
                (employee_id, overtime_hours, pto_granted, last_calculated)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(ledger.employee_id)
        .bind(ledger.overtime_hours)
        .bind(ledger.pto_granted)
        .bind(ledger.last_calculated)
        .execute(&mut **self)
        .await?;
        Ok(())
    }

    async fn update_overtime_ledger(&mut self, ledger: &EmployeeOvertimePto) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE employee_overtime_pto
            SET overtime_hours = ?, pto_granted = ?, last_calculated = ?
            WHERE employee_id = ?
            "#,
        )
        .bind(ledger.overtime_hours)
        .bind(ledger.pto_granted)
        .bind(ledger.last_calculated)
        .bind(ledger.employee_id)
        .execute(&mut **self)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_list() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?, ?, ?");
    }

    #[test]
    fn conflict_reads_are_bounded_by_date() {
        let sql = leaves_in_range_sql(3);
        assert!(sql.contains("status IN (?, ?, ?) AND start_date <= ? AND end_date >= ?"));
        let sql = timesheets_in_range_sql(2);
        assert!(sql.contains("status IN (?, ?) AND week_start_date <= ? AND week_end_date >= ?"));
    }

    #[test]
    fn pool_timeout_counts_as_contention() {
        assert!(is_contention(&sqlx::Error::PoolTimedOut));
        assert!(!is_contention(&sqlx::Error::RowNotFound));
    }

    #[test]
    fn unknown_status_code_is_corrupt() {
        let err = parse::<LeaveStatus>("leave_requests", "pending").unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { table: "leave_requests", .. }));
    }
}
